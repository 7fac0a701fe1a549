// src/bin/producer.rs

//! # Producer Binary
//!
//! Publishes `{"Name":"Producer","Message":"#<n> Hello World!"}` once per
//! interval into one of the demo topologies:
//!
//! 1.  **single** / **fan-out**: straight into `demo-queue` through the default
//!     exchange. Start one consumer or several; with several, the broker
//!     round-robins messages between them.
//! 2.  **direct** / **direct-ttl**: into `demo-direct-exchange` with routing
//!     key `account.init`, which delivers to `demo-direct-queue`.
//!
//! Publishing is fire-and-forget. The producer runs until Ctrl-C, until
//! `--max-messages` are sent, or, with `--once`, after a single un-numbered
//! greeting.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use RabbitDemos::config::producer::Args;
use RabbitDemos::config::resolve_topology;
use RabbitDemos::error::Result;
use RabbitDemos::producer_logic::{run_producer, Destination};
use RabbitDemos::session::Session;
use RabbitDemos::utils::{ctrl_c, setup_prometheus_metrics};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")); // Default to info if RUST_LOG is not set
    fmt::Subscriber::builder().with_env_filter(filter).init();

    if let Err(e) = setup_prometheus_metrics(args.metrics_port).await {
        error!("Failed to start Prometheus metrics endpoint: {}", e);
    }

    let topology = resolve_topology(args.example, args.topology_config.as_ref())?;
    let destination = Destination::for_topology(&topology);
    let settings = args.producer_settings();

    info!("Producer started.");
    info!("Example: {:?} @ {}", args.example, args.amqp_addr);
    info!(
        "Destination: exchange '{}', routing key '{}'",
        destination.exchange, destination.routing_key
    );

    let mut session = Session::connect(&args.amqp_addr).await?;
    session.declare(&topology).await?;
    session.start_running()?;

    let published = match run_producer(session.channel(), &destination, &settings, ctrl_c()).await
    {
        Ok(count) => count,
        Err(e) => {
            error!("Producer failed: {}", e);
            return Err(e);
        }
    };

    info!("Published {} message(s).", published);
    session.close("Producer finished").await?;

    Ok(())
}
