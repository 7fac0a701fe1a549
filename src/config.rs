// src/config.rs

pub mod consumer;
pub mod producer;
pub mod topology;

pub use topology::{load_topology_config, Example, ExchangeConfig, ExchangeType, TopologyConfig};

use std::path::Path;

use crate::error::Result;

/// Picks the topology a binary should run with: the YAML file when one is
/// given, otherwise the preset for the selected example. The result is
/// validated either way.
pub fn resolve_topology<P: AsRef<Path>>(
    example: Example,
    topology_config: Option<P>,
) -> Result<TopologyConfig> {
    let topology = match topology_config {
        Some(path) => load_topology_config(path)?,
        None => TopologyConfig::for_example(example),
    };
    topology.validate()?;
    Ok(topology)
}
