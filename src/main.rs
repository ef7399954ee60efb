mod err;
mod opt;
mod routes;
mod rules;
mod server;

use std::net::SocketAddr;

use log::info;
use structopt::StructOpt;

use crate::rules::{Bootstrap, RoutingTable};

#[global_allocator]
static ALLOC: std::alloc::System = std::alloc::System;

#[tokio::main]
async fn main() -> Result<(), err::DebugFromDisplay<err::Error>> {
    let options = opt::Options::from_args();

    env_logger::Builder::new()
        .filter_level(match options.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    Ok(run(options).await?)
}

async fn run(options: opt::Options) -> Result<(), err::Error> {
    let rules = rules::load(&options.rules, Bootstrap::Enabled).await?;
    for rule in &rules {
        info!("rule {} => {}", rule.from, rule.to);
    }
    let table: RoutingTable = rules.into_iter().collect();
    info!("{} route(s) loaded", table.len());

    let addr = SocketAddr::from(([0, 0, 0, 0], options.resolve_port()));
    let server = server::Server::bind(&addr)?;
    info!("listening on {}", server.local_addr());

    server.serve(table, shutdown_signal()).await?;
    info!("stopped");
    Ok(())
}

/// Resolves on SIGINT or, on unix, SIGTERM. Signal registration lives at the
/// process boundary; the server only sees an abstract trigger.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
