//! CLI for hexvote: ten weak voters, one decision, and a memory for streaks.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hexvote")]
#[command(about = "hexvote: ensemble high/low predictions over hex tokens, learned from feedback")]
#[command(version = hexvote_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP chat gateway
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8077")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Admin user id (always allowed, manages the allow-list)
        #[arg(long, env = "HEXVOTE_ADMIN_ID")]
        admin: i64,

        /// Comma-separated user ids allowed in addition to the admin
        #[arg(long)]
        allow: Option<String>,

        /// Engine config JSON (thresholds); defaults apply to missing fields
        #[arg(long, env = "HEXVOTE_CONFIG")]
        config: Option<String>,
    },

    /// Interactive chat session on stdin. Prefix a line with @<id> to speak as another user.
    Chat {
        /// User id the session speaks as by default (defaults to the admin)
        #[arg(long)]
        user: Option<i64>,

        /// Admin user id
        #[arg(long, env = "HEXVOTE_ADMIN_ID", default_value = "1")]
        admin: i64,

        /// Comma-separated user ids allowed in addition to the admin
        #[arg(long)]
        allow: Option<String>,

        /// Engine config JSON
        #[arg(long, env = "HEXVOTE_CONFIG")]
        config: Option<String>,
    },

    /// Replay a file of chat messages (one per line, optional @<id> prefix)
    Replay {
        /// Path to the message file
        path: String,

        /// User id for lines without an @<id> prefix (defaults to the admin)
        #[arg(long)]
        user: Option<i64>,

        /// Admin user id
        #[arg(long, env = "HEXVOTE_ADMIN_ID", default_value = "1")]
        admin: i64,

        /// Comma-separated user ids allowed in addition to the admin
        #[arg(long)]
        allow: Option<String>,

        /// Engine config JSON
        #[arg(long, env = "HEXVOTE_CONFIG")]
        config: Option<String>,

        /// Write final predictor stats and rules as JSON
        #[arg(long)]
        output: Option<String>,

        /// Only print the final summary
        #[arg(long)]
        quiet: bool,
    },

    /// Classify a single token against an empty history
    Predict {
        /// 32-character hex token
        token: String,

        /// Engine config JSON
        #[arg(long, env = "HEXVOTE_CONFIG")]
        config: Option<String>,

        /// Print the prediction as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            admin,
            allow,
            config,
        } => commands::serve::run(&host, port, admin, allow.as_deref(), config.as_deref()),
        Commands::Chat {
            user,
            admin,
            allow,
            config,
        } => commands::chat::run(user, admin, allow.as_deref(), config.as_deref()),
        Commands::Replay {
            path,
            user,
            admin,
            allow,
            config,
            output,
            quiet,
        } => commands::replay::run(commands::replay::ReplayCommandConfig {
            path: &path,
            default_user: user,
            admin,
            allow: allow.as_deref(),
            config_path: config.as_deref(),
            output_path: output.as_deref(),
            quiet,
        }),
        Commands::Predict {
            token,
            config,
            json,
        } => commands::predict::run(&token, config.as_deref(), json),
    }
}
