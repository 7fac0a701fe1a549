// src/session.rs

//! One connection, one channel, held for the lifetime of a demo process.
//!
//! A session walks through `Unconnected -> Connected -> TopologyReady ->
//! Running` and ends in `Terminated`. There is no way back: a lost connection
//! is not re-established.

use std::fmt;

use lapin::{Channel, Connection};
use tracing::{debug, info, warn};

use crate::config::TopologyConfig;
use crate::error::{DemoError, Result};
use crate::topology::{declare_topology, DeclaredTopology};
use crate::utils::common::connect_rabbitmq;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unconnected,
    Connected,
    TopologyReady,
    Running,
    Terminated,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Unconnected => "Unconnected",
            LifecycleState::Connected => "Connected",
            LifecycleState::TopologyReady => "TopologyReady",
            LifecycleState::Running => "Running",
            LifecycleState::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}

impl LifecycleState {
    pub fn transition(self, to: LifecycleState) -> Result<LifecycleState> {
        use LifecycleState::*;
        let allowed = matches!(
            (self, to),
            (Unconnected, Connected)
                | (Connected, TopologyReady)
                | (TopologyReady, Running)
                | (Connected, Terminated)
                | (TopologyReady, Terminated)
                | (Running, Terminated)
        );
        if allowed {
            debug!(from = %self, to = %to, "Lifecycle transition");
            Ok(to)
        } else {
            Err(DemoError::InvalidTransition { from: self, to })
        }
    }
}

pub struct Session {
    connection: Connection,
    channel: Channel,
    state: LifecycleState,
}

impl Session {
    /// Connects to the broker and opens the session's only channel.
    pub async fn connect(addr: &str) -> Result<Self> {
        let state = LifecycleState::Unconnected;
        let connection = connect_rabbitmq(addr).await?;
        let channel = connection.create_channel().await.map_err(|e| {
            DemoError::QueueError(format!("Failed to create channel: {}", e))
        })?;
        let state = state.transition(LifecycleState::Connected)?;
        info!(channel_id = channel.id(), "Session connected");

        Ok(Session {
            connection,
            channel,
            state,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub async fn declare(&mut self, topology: &TopologyConfig) -> Result<DeclaredTopology> {
        // Check before touching the broker so a misuse doesn't half-declare.
        let next = self.state.transition(LifecycleState::TopologyReady)?;
        let declared = declare_topology(&self.channel, topology).await?;
        self.state = next;
        Ok(declared)
    }

    pub fn start_running(&mut self) -> Result<()> {
        self.state = self.state.transition(LifecycleState::Running)?;
        Ok(())
    }

    /// Closes the channel and the connection with a normal reply code.
    pub async fn close(mut self, reason: &str) -> Result<()> {
        self.state = self.state.transition(LifecycleState::Terminated)?;
        if let Err(e) = self.channel.close(200, reason).await {
            warn!(error = %e, "Failed to close channel cleanly");
        }
        self.connection.close(200, reason).await?;
        info!("Session closed: {}", reason);
        Ok(())
    }
}
