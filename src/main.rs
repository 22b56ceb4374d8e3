use std::process::ExitCode;
use std::sync::Arc;

use checkin_photos::{assets_from_paths, DEFAULT_PHOTO_LIMIT};
use clap::Parser;
use event_auth::{FileTokenStore, SignupRequest, TokenStore};

mod cli;
mod config;
mod error;
mod services;

use cli::{Cli, Command};
use config::AppConfig;
use error::AppError;
use services::TokenSession;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(config.token_path()));
    log::debug!("Using API at {}", config.api_base_url);

    match cli.command {
        Command::Login { email, password } => {
            services::login(&config, store.as_ref(), &email, &password).await?;
            println!("Logged in.");
        }
        Command::Signup {
            first_name,
            last_name,
            email,
            password,
        } => {
            let request = SignupRequest {
                first_name,
                last_name,
                email_id: email,
                password,
            };
            let user_id = services::signup(&config, &request).await?;
            println!(
                "Account created. Verify with: rha-checkin verify --user-id {} --otp <code>",
                user_id
            );
        }
        Command::Verify { user_id, otp } => {
            services::verify(&config, store.as_ref(), &user_id, &otp).await?;
            println!("Account verified, you are logged in.");
        }
        Command::Logout => {
            services::logout(store.as_ref())?;
            println!("Logged out.");
        }
        Command::Checkin {
            event,
            caption,
            allow_partial,
            photos,
        } => {
            let assets = assets_from_paths(&photos, DEFAULT_PHOTO_LIMIT)?;
            let draft = services::open_draft(&config, TokenSession::new(store), &event)?;
            let report = services::run_checkin(&draft, assets, &caption, allow_partial).await?;

            for failure in &report.dropped {
                println!("Left out {}: {}", failure.local_uri, failure.reason);
            }
            println!(
                "Checked in to {} with {} photo(s) (check-in {}).",
                event, report.photos, report.checkin_id
            );
        }
    }

    Ok(())
}
