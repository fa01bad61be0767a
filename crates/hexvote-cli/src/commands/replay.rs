//! `hexvote replay`: feed a recorded chat transcript through a fresh gateway.

use std::collections::BTreeMap;

use hexvote_core::{Gateway, Reply, UserId};

use super::{make_gateway, parse_line};

pub struct ReplayCommandConfig<'a> {
    pub path: &'a str,
    pub default_user: Option<UserId>,
    pub admin: UserId,
    pub allow: Option<&'a str>,
    pub config_path: Option<&'a str>,
    pub output_path: Option<&'a str>,
    pub quiet: bool,
}

/// Per-run tallies printed at the end.
#[derive(Debug, Default, PartialEq)]
struct ReplaySummary {
    lines: usize,
    predictions: usize,
    recorded: usize,
    /// Recorded results whose final label (override included) was right.
    hits: usize,
    errors: usize,
}

pub fn run(cfg: ReplayCommandConfig<'_>) {
    let contents = match std::fs::read_to_string(cfg.path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: cannot read {}: {e}", cfg.path);
            std::process::exit(1);
        }
    };

    let mut gateway = make_gateway(cfg.admin, cfg.allow, cfg.config_path);
    let default_user = cfg.default_user.unwrap_or(cfg.admin);

    let summary = replay(&mut gateway, &contents, default_user, |lineno, text, outcome| {
        if cfg.quiet {
            return;
        }
        match outcome {
            Ok(reply) => println!("[{lineno}] {text}\n{}", reply.render()),
            Err(e) => println!("[{lineno}] {text}\n❌ {e}"),
        }
    });

    println!();
    println!("Replayed {} messages from {}", summary.lines, cfg.path);
    println!(
        "  predictions: {}  recorded: {}  errors: {}",
        summary.predictions, summary.recorded, summary.errors
    );
    if summary.recorded > 0 {
        println!(
            "  final-label accuracy: {}/{} = {:.1}%",
            summary.hits,
            summary.recorded,
            summary.hits as f64 / summary.recorded as f64 * 100.0
        );
    }
    println!("  rules mined: {}", gateway.engine().rules().len());

    if let Some(path) = cfg.output_path {
        write_report(&gateway, path);
    }
}

/// Drive every line through `gateway`, calling `on_reply` after each.
fn replay(
    gateway: &mut Gateway,
    contents: &str,
    default_user: UserId,
    mut on_reply: impl FnMut(usize, &str, &Result<Reply, hexvote_core::EngineError>),
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    // Final label shown to each user for their pending token
    let mut shown: BTreeMap<UserId, hexvote_core::Outcome> = BTreeMap::new();

    for (idx, line) in contents.lines().enumerate() {
        let lineno = idx + 1;
        let (user, text) = match parse_line(line, default_user) {
            None => continue,
            Some(Ok(parsed)) => parsed,
            Some(Err(e)) => {
                log::warn!("line {lineno}: {e}");
                summary.errors += 1;
                continue;
            }
        };
        summary.lines += 1;

        let outcome = gateway.handle_message(user, text);
        match &outcome {
            Ok(Reply::Prediction(p)) => {
                summary.predictions += 1;
                shown.insert(user, p.label);
            }
            Ok(Reply::Recorded(actual)) => {
                summary.recorded += 1;
                if shown.remove(&user) == Some(*actual) {
                    summary.hits += 1;
                }
            }
            Ok(_) => {}
            Err(_) => summary.errors += 1,
        }
        on_reply(lineno, text, &outcome);
    }
    summary
}

fn write_report(gateway: &Gateway, path: &str) {
    let engine = gateway.engine();
    let rules: BTreeMap<String, _> = engine
        .rules()
        .iter()
        .map(|(pattern, rule)| (pattern.to_string(), *rule))
        .collect();
    let report = serde_json::json!({
        "history_len": engine.history().len(),
        "predictors": engine.stats(),
        "rules": rules,
    });

    let json = match serde_json::to_string_pretty(&report) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: cannot encode report: {e}");
            std::process::exit(1);
        }
    };
    match std::fs::write(path, json) {
        Ok(()) => println!("Report written to {path}"),
        Err(e) => {
            eprintln!("Error: cannot write {path}: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexvote_core::{EngineConfig, EngineError, GatewayConfig};

    const ZEROS: &str = "00000000000000000000000000000000";

    fn gateway() -> Gateway {
        Gateway::new(EngineConfig::default(), &GatewayConfig::new(1))
    }

    #[test]
    fn test_replay_counts_rounds() {
        let mut gw = gateway();
        let transcript = format!("# warmup\n{ZEROS}\n0\n\n{ZEROS}\n1\n1\n/stats\n");
        let summary = replay(&mut gw, &transcript, 1, |_, _, _| {});
        assert_eq!(summary.lines, 6);
        assert_eq!(summary.predictions, 2);
        assert_eq!(summary.recorded, 2);
        // The trailing "1" has no pending token
        assert_eq!(summary.errors, 1);
        assert_eq!(gw.engine().history().len(), 2);
    }

    #[test]
    fn test_replay_respects_speaker_prefix() {
        let mut gw = gateway();
        let transcript = format!("@5 {ZEROS}\n/add 5\n@5 {ZEROS}\n@5 0\n");
        let mut errors = Vec::new();
        let summary = replay(&mut gw, &transcript, 1, |lineno, _, outcome| {
            if let Err(e) = outcome {
                errors.push((lineno, e.clone()));
            }
        });
        assert_eq!(errors, vec![(1, EngineError::Unauthorized(5))]);
        assert_eq!(summary.recorded, 1);
        assert!(gw.access().is_allowed(5));
    }

    #[test]
    fn test_replay_bad_prefix_is_counted() {
        let mut gw = gateway();
        let summary = replay(&mut gw, "@x hello\n", 1, |_, _, _| {});
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.lines, 0);
    }

    #[test]
    fn test_write_report() {
        let mut gw = gateway();
        replay(&mut gw, &format!("{ZEROS}\n0\n"), 1, |_, _, _| {});
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&gw, path.to_str().unwrap());

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["history_len"], 1);
        assert_eq!(parsed["predictors"].as_array().unwrap().len(), 10);
        assert_eq!(parsed["predictors"][0]["name"], "basic");
        assert_eq!(parsed["predictors"][0]["total"], 3);
    }
}
