//! Demo client binary.
//!
//! Sends a request and prints the response as JSON. The `demo` subcommand
//! reproduces the classic pair: a bounded `ping` (flag chosen per OS) and
//! the arithmetic expression `(6 + 4) * 8`.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmdwire::{Client, Request, Response};

#[derive(Parser, Debug)]
#[command(name = "cmdwire-client", about = "Send commands to a cmdwire server")]
struct Args {
    /// Server address.
    #[arg(long, default_value = "127.0.0.1:5555")]
    addr: String,

    #[command(subcommand)]
    command: DemoCommand,
}

#[derive(Subcommand, Debug)]
enum DemoCommand {
    /// Run an OS command on the server.
    Os {
        /// Executable name.
        command_name: String,
        /// Arguments, passed as a vector (no shell interpretation).
        parameters: Vec<String>,
    },
    /// Evaluate an arithmetic expression on the server.
    Compute {
        /// Expression over + - * / ( ) and numbers.
        expression: String,
    },
    /// Send the example ping and math commands.
    Demo,
}

/// Ping count flag differs per OS: `-n` on Windows, `-c` elsewhere.
fn ping_request() -> Request {
    let count_flag = if cfg!(windows) { "-n" } else { "-c" };
    Request::os(
        "ping",
        vec![
            "127.0.0.1".to_string(),
            count_flag.to_string(),
            "5".to_string(),
        ],
    )
}

fn print_response(response: &Response) {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{response:?}"),
    }
}

async fn send(client: &mut Client, request: &Request) -> cmdwire::Result<()> {
    tracing::info!(command_type = %request.command_type, "sending command");
    let response = client.call(request).await?;
    print_response(&response);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut client = match Client::connect(&args.addr).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, addr = %args.addr, "failed to connect");
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        DemoCommand::Os {
            command_name,
            parameters,
        } => send(&mut client, &Request::os(command_name, parameters)).await,
        DemoCommand::Compute { expression } => {
            send(&mut client, &Request::compute(expression)).await
        }
        DemoCommand::Demo => {
            let demo = async {
                send(&mut client, &ping_request()).await?;
                println!("{}", "-".repeat(55));
                send(&mut client, &Request::compute("(6 + 4) * 8")).await
            };
            demo.await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "call failed");
            ExitCode::FAILURE
        }
    }
}
