use std::process::ExitCode;

use dotenvy::dotenv;
use tokio::runtime::Runtime;
use tracing::{error, info};
use uuid::Uuid;

const SERVICE: &str = "contact_book";

/// Worker thread count: `server.worker_threads` from the config file, else
/// `TOKIO_WORKER_THREADS`, else the Tokio default (one per core).
fn worker_threads() -> Option<usize> {
    match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg.server.worker_threads,
        Err(_) => std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse().ok()),
    }
}

fn build_runtime(threads: Option<usize>) -> std::io::Result<Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(n) = threads {
        builder.worker_threads(n);
    }
    builder.build()
}

// Route panic reports into the tracing stream.
fn install_panic_hook(instance_id: Uuid) {
    std::panic::set_hook(Box::new(move |info| {
        error!(service = SERVICE, event = "panic", %instance_id, message = %info, "unhandled panic");
    }));
}

/// Serve until the server exits on its own or Ctrl+C arrives.
async fn serve_until_interrupted(instance_id: Uuid) -> ExitCode {
    let server_task = tokio::spawn(server::run());

    tokio::select! {
        joined = server_task => match joined {
            Ok(Ok(())) => {
                info!(service = SERVICE, event = "stop", %instance_id, "server stopped");
                ExitCode::SUCCESS
            }
            Ok(Err(e)) => {
                error!(service = SERVICE, event = "run_failed", error = %e, "server exited with error");
                ExitCode::FAILURE
            }
            Err(e) => {
                error!(service = SERVICE, event = "task_join_error", error = %e, "server task aborted");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            // Dropping the runtime cancels the server task and closes the pool.
            info!(service = SERVICE, event = "shutdown_signal", %instance_id, "Ctrl+C received, shutting down");
            ExitCode::SUCCESS
        }
    }
}

fn main() -> ExitCode {
    // .env has to be loaded before the subscriber reads RUST_LOG / LOG_FORMAT
    dotenv().ok();
    common::utils::logging::init_logging_from_env();

    // Tags this process in aggregated logs.
    let instance_id = Uuid::new_v4();
    install_panic_hook(instance_id);

    let threads = worker_threads();
    let rt = match build_runtime(threads) {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = SERVICE, event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = SERVICE,
        event = "start",
        %instance_id,
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        threads = threads.unwrap_or_default(),
        "contact book starting"
    );

    rt.block_on(serve_until_interrupted(instance_id))
}
