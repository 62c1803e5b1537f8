//! Server binary: bind, spawn the worker pool, run until killed.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cmdwire::Server;

#[derive(Parser, Debug)]
#[command(name = "cmdwire-server", about = "Remote command-execution server")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:5555")]
    bind: String,

    /// Number of workers in the pool.
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Depth of the dispatch queue.
    #[arg(long, default_value_t = 64)]
    queue_depth: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let server = match Server::builder()
        .workers(args.workers)
        .queue_depth(args.queue_depth)
        .start(&args.bind)
        .await
    {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, bind = %args.bind, "failed to start server");
            return ExitCode::FAILURE;
        }
    };

    tokio::select! {
        result = server.wait_for_shutdown() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "server stopped");
                return ExitCode::FAILURE;
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, shutting down");
        }
    }

    ExitCode::SUCCESS
}
