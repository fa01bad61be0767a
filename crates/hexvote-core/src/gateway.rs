//! Chat front door: routes raw text messages to the engine and the allow-list,
//! and renders replies as chat text.
//!
//! A message is either a command (`/start`, `/menu`, `/stats`, `/list`,
//! `/add <id>`, `/remove <id>`), a feedback bit (`0` or `1`), or a token to
//! classify. Feedback and tokens are trimmed and lowercased first.

use std::fmt::Write;

use serde::Serialize;

use crate::config::{EngineConfig, GatewayConfig};
use crate::engine::{Engine, Prediction, UserId};
use crate::error::EngineError;
use crate::gate::AccessList;
use crate::scoreboard::PredictorReport;
use crate::token::Outcome;

/// Everything the bot can say back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Reply {
    Greeting,
    Menu,
    Prediction(Prediction),
    Recorded(Outcome),
    Stats(Vec<PredictorReport>),
    Users(Vec<UserId>),
    UserAdded { user: UserId, added: bool },
    UserRemoved { user: UserId, removed: bool },
}

impl Reply {
    /// Chat text for this reply.
    pub fn render(&self) -> String {
        match self {
            Self::Greeting => {
                "🔮 Send a 32-character hex token for a High (1) / Low (0) prediction. \
                 Send 0 or 1 afterwards to report the actual result."
                    .to_string()
            }
            Self::Menu => [
                "🔧 Admin menu:",
                "  /stats            📈 predictor accuracy",
                "  /list             👥 allowed users",
                "  /add <user_id>    ➕ allow a user",
                "  /remove <user_id> 🗑️ revoke a user",
            ]
            .join("\n"),
            Self::Prediction(p) => render_prediction(p),
            Self::Recorded(o) => format!("✅ Recorded result: {}", o.label()),
            Self::Stats(rows) => render_stats(rows),
            Self::Users(users) => {
                let mut out = String::from("👥 Allowed users:");
                for u in users {
                    let _ = write!(out, "\n{u}");
                }
                out
            }
            Self::UserAdded { user, added } => {
                if *added {
                    format!("✅ Added user {user}")
                } else {
                    format!("ℹ️ User {user} was already allowed")
                }
            }
            Self::UserRemoved { user, removed } => {
                if *removed {
                    format!("🗑️ Removed user {user}")
                } else {
                    format!("ℹ️ User {user} was not on the list")
                }
            }
        }
    }
}

fn render_prediction(p: &Prediction) -> String {
    let mut out = format!(
        "👉 Prediction: {} (🎯 {:.1}%)\n",
        p.label.label(),
        p.confidence
    );
    let names: Vec<&str> = p.top3.iter().map(|v| v.predictor.name()).collect();
    let _ = writeln!(out, "📊 Top 3 predictors: {}", names.join(", "));
    for v in &p.top3 {
        let _ = writeln!(out, "  - {}: {}", v.predictor, v.label.label());
    }
    if let Some(rule) = p.override_label {
        let _ = write!(out, "\n📘 Rule-based override: {}", rule.label());
    }
    out.trim_end().to_string()
}

fn render_stats(rows: &[PredictorReport]) -> String {
    let mut out = String::from("📈 Predictor accuracy:");
    for r in rows {
        let status = if r.disabled { "❌ (disabled)" } else { "✅" };
        let _ = write!(
            out,
            "\n{status} {}: {}/{} = {:.1}%",
            r.name,
            r.correct,
            r.total,
            100.0 * r.accuracy
        );
    }
    out
}

/// Engine plus allow-list: the whole bot minus the transport.
#[derive(Debug, Clone)]
pub struct Gateway {
    engine: Engine,
    access: AccessList,
}

impl Gateway {
    pub fn new(engine_config: EngineConfig, gateway_config: &GatewayConfig) -> Self {
        Self {
            engine: Engine::new(engine_config),
            access: AccessList::new(gateway_config),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn access(&self) -> &AccessList {
        &self.access
    }

    /// Route one chat message from `user`.
    pub fn handle_message(&mut self, user: UserId, text: &str) -> Result<Reply, EngineError> {
        let msg = text.trim();
        if let Some(command) = msg.strip_prefix('/') {
            return self.handle_command(user, command);
        }
        let msg = msg.to_lowercase();
        match msg.as_str() {
            "0" => self.feedback(user, Outcome::Low),
            "1" => self.feedback(user, Outcome::High),
            token => self.submit(user, token),
        }
    }

    fn handle_command(&mut self, user: UserId, command: &str) -> Result<Reply, EngineError> {
        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();
        match name {
            "start" => Ok(Reply::Greeting),
            "menu" => {
                self.access.require_admin(user)?;
                Ok(Reply::Menu)
            }
            "stats" => self.stats(user),
            "list" => self.list_users(user),
            "add" => {
                self.access.require_admin(user)?;
                self.add_user(user, parse_user_arg("/add", arg)?)
            }
            "remove" => {
                self.access.require_admin(user)?;
                self.remove_user(user, parse_user_arg("/remove", arg)?)
            }
            other => Err(EngineError::Usage(format!(
                "unknown command /{other}; try /start, /menu, /stats, /list, /add, /remove"
            ))),
        }
    }

    /// Classify a token for an allowed user.
    pub fn submit(&mut self, user: UserId, token: &str) -> Result<Reply, EngineError> {
        self.access.authorize(user)?;
        self.engine.submit(user, token).map(Reply::Prediction)
    }

    /// Record ground truth for an allowed user's pending token.
    pub fn feedback(&mut self, user: UserId, actual: Outcome) -> Result<Reply, EngineError> {
        self.access.authorize(user)?;
        self.engine.feedback(user, actual).map(Reply::Recorded)
    }

    pub fn stats(&self, caller: UserId) -> Result<Reply, EngineError> {
        self.access.require_admin(caller)?;
        Ok(Reply::Stats(self.engine.stats()))
    }

    pub fn list_users(&self, caller: UserId) -> Result<Reply, EngineError> {
        self.access.list(caller).map(Reply::Users)
    }

    pub fn add_user(&mut self, caller: UserId, user: UserId) -> Result<Reply, EngineError> {
        let added = self.access.add(caller, user)?;
        Ok(Reply::UserAdded { user, added })
    }

    pub fn remove_user(&mut self, caller: UserId, user: UserId) -> Result<Reply, EngineError> {
        let removed = self.access.remove(caller, user)?;
        Ok(Reply::UserRemoved { user, removed })
    }
}

fn parse_user_arg(command: &str, arg: Option<&str>) -> Result<UserId, EngineError> {
    arg.and_then(|a| a.parse().ok())
        .ok_or_else(|| EngineError::Usage(format!("{command} <user_id>")))
}
