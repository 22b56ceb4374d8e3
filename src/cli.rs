use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rha-checkin", version, about = "Check in to events with photos")]
pub struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the events API
    #[arg(long, env = "RHA_API_URL", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RHA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account; prints the user id to verify
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "RHA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Confirm a signup with the emailed one-time password
    Verify {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        otp: String,
    },
    /// Forget the stored session token
    Logout,
    /// Upload photos and check in to an event
    Checkin {
        #[arg(long)]
        event: String,
        #[arg(long)]
        caption: String,
        /// Submit with the photos that uploaded even if some failed
        #[arg(long)]
        allow_partial: bool,
        #[arg(required = true)]
        photos: Vec<PathBuf>,
    },
}
