use std::fmt::Debug;
use std::fmt::Display;

use tokio::task::JoinError;
use tour_page::configuration::get_configuration;
use tour_page::startup::Application;
use tour_page::telemetry::get_subscriber;
use tour_page::telemetry::init_subscriber;

fn report_exit(
    name: &str,
    outcome: Result<Result<(), impl Debug + Display>, JoinError>,
) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{name} exited gracefully")
        }

        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "{name} failed (inner)"
            )
        }

        Err(e) => {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "{name} failed (outer)"
            )
        }
    }
}

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // `RUST_LOG` overrides the default level
    let subscriber = get_subscriber("tour-page", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    // invalid or incomplete configuration stops us here, before binding
    let cfg = get_configuration()?;

    let server = Application::build(cfg).await?;
    tracing::info!(port = server.get_port(), "listening");

    let outcome = tokio::spawn(server.run_until_stopped()).await;
    report_exit("API", outcome);

    Ok(())
}
