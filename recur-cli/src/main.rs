//! Command-line front-end for the recur deferred-execution runtime.
//!
//! Every subcommand here delegates to the top-level API
//! (`schedule`/`read`/`wrrrk`) exposed by `recur-core`'s [`Recur`]
//! handle — this binary adds no orchestration logic of its own, per the
//! design doc's CLI surface.
//!
//! The demo backend wired in by [`runtime_setup::build`] is in-memory
//! and process-local, so each subcommand invocation gets a fresh,
//! unshared `Store`/`Queue` pair. `server` is the one subcommand that
//! keeps a single runtime alive across multiple logical operations
//! (HTTP requests plus an in-process worker loop); swap
//! `recur-backend-memory` for `recur-backend-pg` to get the real
//! multi-process behavior this CLI's shape is modeled on.

mod commands;
mod demo_tasks;
mod output;
mod runtime_setup;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "recur-cli")]
#[command(author, version)]
#[command(about = "CLI front-end for the recur deferred-execution runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the worker loop in-process until it idles out or Ctrl-C.
    Worker,
    /// Serve the HTTP demo (schedule/read) with an in-process worker
    /// loop draining the same runtime concurrently.
    Server {
        /// Address to bind the HTTP listener to.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,
    },
    /// Schedule the demo `fib(n)` task, drive it to completion, and
    /// print the memoized result.
    Schedule {
        /// The Fibonacci index to compute.
        n: u64,
    },
    /// Print best-effort queue metrics for a freshly built demo runtime.
    Monitor,
    /// Reset runtime-local state (a no-op for the in-memory demo
    /// backend, which never survives past the process that built it).
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    recur_core::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Worker => commands::worker::run().await,
        Commands::Server { addr } => commands::server::run(addr).await,
        Commands::Schedule { n } => commands::schedule::run(n).await,
        Commands::Monitor => commands::monitor::run().await,
        Commands::Reset => commands::reset::run().await,
    };

    if let Err(e) = &result {
        output::error(e);
    }
    result
}
