use ams::app;
use ams::config::{AppConfig, DEFAULT_CONFIG_PATH};
use ams::login::hash_password;
use log::info;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // `ams hash-password <password>` prints a PHC string for the [[users]] table
    if args.get(1).map(String::as_str) == Some("hash-password") {
        let Some(password) = args.get(2) else {
            eprintln!("usage: {} hash-password <password>", args[0]);
            std::process::exit(2);
        };
        let hash = hash_password(password).map_err(|e| e.to_string())?;
        println!("{}", hash);
        return Ok(());
    }

    let config_path = args.get(1).map(String::as_str).unwrap_or(DEFAULT_CONFIG_PATH);
    let config = AppConfig::from_file(config_path)
        .map_err(|e| format!("cannot load {}: {}", config_path, e))?;

    // RUST_LOG, when set, wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    info!(
        "Starting applicant management system with {} account(s), store {:?}",
        config.users.len(),
        config.store.kind
    );
    app::run(config).await
}
