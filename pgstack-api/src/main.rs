use anyhow::anyhow;
use pgstack_api::{config::ApiConfig, startup::Application};
use pgstack_config::{load_config, shared::PgConnectionConfig};
use pgstack_telemetry::tracing::init_tracing;
use std::env;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    // Initialize tracing from the binary name
    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    // We start the runtime.
    actix_web::rt::System::new().block_on(async_main())?;

    Ok(())
}

async fn async_main() -> anyhow::Result<()> {
    let mut args = env::args();
    match args.len() {
        // Run the application server
        1 => {
            let config = load_config::<ApiConfig>()?;
            log_pg_connection_config(&config.database);
            let application = Application::build(config).await?;
            application.run_until_stopped().await?;
        }
        // Handle single command commands
        2 => {
            let command = args.nth(1).unwrap();
            match command.as_str() {
                "migrate" => {
                    let config = load_config::<ApiConfig>()?;
                    log_pg_connection_config(&config.database);
                    Application::migrate_database(config.database).await?;
                    info!("database migrated successfully");
                }
                _ => {
                    let message = format!("invalid command: {command}");
                    error!("{message}");
                    return Err(anyhow!(message));
                }
            }
        }
        _ => {
            let message = "invalid number of command line arguments";
            error!("{message}");
            return Err(anyhow!(message));
        }
    }

    Ok(())
}

fn log_pg_connection_config(config: &PgConnectionConfig) {
    info!(
        host = config.host,
        port = config.port,
        dbname = config.name,
        username = config.username,
        require_ssl = config.require_ssl,
        "pg database options",
    );
}
