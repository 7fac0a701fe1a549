// src/bin/consumer.rs

//! # Consumer Binary
//!
//! Declares the selected demo topology, then prints every message it receives
//! from the topology's queue on its own line. Deliveries are acknowledged
//! automatically; the direct examples cap unacknowledged deliveries at 10.
//!
//! Press Enter (or Ctrl-C) to stop.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use RabbitDemos::config::consumer::Args;
use RabbitDemos::config::resolve_topology;
use RabbitDemos::consumer_logic::{consume_payloads, payload_stream, start_consumer, StdoutPrinter};
use RabbitDemos::error::Result;
use RabbitDemos::session::Session;
use RabbitDemos::utils::{keypress_or_ctrl_c, setup_prometheus_metrics};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = setup_prometheus_metrics(args.metrics_port).await {
        error!("Failed to start Prometheus metrics endpoint: {}", e);
    }

    let topology = resolve_topology(args.example, args.topology_config.as_ref())?;
    let prefetch = args.effective_prefetch();

    info!("Consumer starting.");
    info!("Consuming from queue '{}' @ {}", topology.queue, args.amqp_addr);
    info!("Prefetch count: {:?}", prefetch);

    let mut session = Session::connect(&args.amqp_addr).await?;
    session.declare(&topology).await?;

    let consumer = start_consumer(session.channel(), &topology.queue, prefetch).await?;
    session.start_running()?;
    info!("Waiting for messages. Press Enter to exit.");

    let received = match consume_payloads(
        payload_stream(consumer),
        &StdoutPrinter,
        keypress_or_ctrl_c(),
    )
    .await
    {
        Ok(count) => count,
        Err(e) => {
            error!("Consumer failed: {}", e);
            return Err(e);
        }
    };

    info!("Received {} message(s).", received);
    session.close("Consumer finished").await?;

    Ok(())
}
