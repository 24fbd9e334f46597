use lakecast::{config, dataset, handler, logger, server};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::Notify;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg)?;
    let addr = cfg.get_socket_addr()?;

    // The dataset must be complete before anything listens
    let dataset = match dataset::load(&cfg.data.actual_path, &cfg.data.forecast_path) {
        Ok(dataset) => dataset,
        Err(e) => {
            logger::log_error(&format!("Failed to load dataset: {e}"));
            return Err(e.into());
        }
    };
    logger::log_dataset_loaded(&cfg.data.actual_path, &cfg.data.forecast_path, &dataset);

    let (index_page, found) = handler::page::load_index_page(&cfg.frontend.index_template);
    logger::log_index_page(&cfg.frontend.index_template, found);

    // Tokio runtime sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    let state = Arc::new(config::AppState::new(cfg, Arc::new(dataset), index_page)?);
    runtime.block_on(async_main(state, addr))
}

async fn async_main(
    state: Arc<config::AppState>,
    addr: std::net::SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &state.config);

    let shutdown = Arc::new(Notify::new());
    server::signal::start_signal_handler(Arc::clone(&shutdown))?;

    let active_connections = Arc::new(AtomicUsize::new(0));
    server::start_server_loop(listener, state, active_connections, shutdown).await?;
    Ok(())
}
