use std::sync::Arc;
use std::time::Duration;

use zatca_sdk_sidecar::config::{AppState, Config};
use zatca_sdk_sidecar::{logger, server};

const DEFAULT_CONFIG_PATH: &str = "sidecar";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Create Tokio runtime, worker count from config or CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    let result = runtime.block_on(async_main(cfg));

    // Output readers of killed commands may still be blocked on orphaned
    // grandchildren; don't wait for them forever
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;
    let bound = listener.local_addr()?;

    for warning in cfg.warnings() {
        logger::log_warning(&warning);
    }
    logger::log_server_start(&bound, &cfg);

    let state = Arc::new(AppState::new(cfg));
    server::start_signal_handler(Arc::clone(&state.shutdown));

    server::run(listener, state).await?;
    Ok(())
}
