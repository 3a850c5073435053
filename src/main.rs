use mango_api::{shutdown, telemetry, AppConfig, Shutdown};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            telemetry::init_tracing(None);
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    telemetry::init_tracing(Some(config.environment));
    shutdown::install_panic_hook();

    let lifecycle = Shutdown::new(config.shutdown_grace);
    match mango_api::run(config, lifecycle).await {
        Ok(outcome) => {
            tracing::info!(trigger = ?outcome.trigger, forced = outcome.forced, "exiting");
            outcome.exit_code()
        }
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            ExitCode::FAILURE
        }
    }
}
