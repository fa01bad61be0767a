pub mod chat;
pub mod predict;
pub mod replay;
pub mod serve;

use std::collections::BTreeSet;
use std::path::Path;

use hexvote_core::{EngineConfig, Gateway, GatewayConfig, UserId};

/// Load the engine config, or the defaults when no path is given.
/// Exits on an unreadable or invalid file.
pub fn load_engine_config(path: Option<&str>) -> EngineConfig {
    match path {
        None => EngineConfig::default(),
        Some(p) => match EngineConfig::load(Path::new(p)) {
            Ok(config) => {
                log::info!("loaded engine config from {p}");
                config
            }
            Err(e) => {
                eprintln!("Error: cannot load engine config {p}: {e}");
                std::process::exit(1);
            }
        },
    }
}

/// Parse a comma-separated list of user ids.
pub fn parse_user_ids(list: &str) -> Result<BTreeSet<UserId>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<UserId>()
                .map_err(|_| format!("invalid user id '{s}'"))
        })
        .collect()
}

/// Build a gateway from CLI options. Exits on malformed input.
pub fn make_gateway(admin: UserId, allow: Option<&str>, config_path: Option<&str>) -> Gateway {
    let mut gateway_config = GatewayConfig::new(admin);
    if let Some(list) = allow {
        match parse_user_ids(list) {
            Ok(ids) => gateway_config.allowed_users = ids,
            Err(e) => {
                eprintln!("Error: --allow: {e}");
                std::process::exit(1);
            }
        }
    }
    Gateway::new(load_engine_config(config_path), &gateway_config)
}

/// Split an optional `@<id>` speaker prefix off a chat line.
///
/// Returns `None` for blank lines and `#` comments.
pub fn parse_line(line: &str, default_user: UserId) -> Option<Result<(UserId, &str), String>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let Some(rest) = line.strip_prefix('@') else {
        return Some(Ok((default_user, line)));
    };
    let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    Some(
        id.parse::<UserId>()
            .map(|user| (user, text.trim()))
            .map_err(|_| format!("invalid speaker prefix '@{id}'")),
    )
}
