use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use verrou_bench::{config::Config, runner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let (signal_tx, signal_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if signal_tx.send(()).await.is_err() {
                break;
            }
        }
    });

    runner::run(config, signal_rx).await
}
