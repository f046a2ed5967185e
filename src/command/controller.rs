//! Fleet Controller
//!
//! Drives a [`Command`] against a target node and, in cluster mode, against
//! every peer of that node concurrently.
//!
//! ## Pass
//! 1. The command runs against the target node. A failure here aborts the pass.
//! 2. In cluster mode the peer list is fetched; a failure skips the fan-out
//!    but the target's own result is still reported.
//! 3. One task per peer issues the command. Results are collected and then
//!    folded into the target's response in peer-list order, so the aggregate
//!    does not depend on which peer answered first. A failed peer becomes an
//!    error entry on the aggregate and never stops the other peers.
//!
//! ## Monitor loop
//! `Armed -> Running -> (Sleeping -> Running)* -> Stopped`. Without monitor
//! mode exactly one pass runs. The sleep between passes ends early when the
//! interrupt future resolves, which stops the loop cleanly.

use super::error::CommandError;
use super::node::NodeAddr;
use super::peers::PeerDirectory;
use super::types::{AggregateResponse, Command, Reporter};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Repeat the pass every `interval` until interrupted.
    pub monitor: bool,
    pub interval: Duration,
    /// Fan out to every peer of the target node.
    pub cluster: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            monitor: false,
            interval: DEFAULT_INTERVAL,
            cluster: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Armed,
    Running,
    Sleeping,
    Stopped,
}

pub struct FleetController {
    client: reqwest::Client,
    target: NodeAddr,
    options: MonitorOptions,
    peers: Arc<dyn PeerDirectory>,
    state: watch::Sender<MonitorState>,
}

impl FleetController {
    pub fn new(
        client: reqwest::Client,
        target: NodeAddr,
        options: MonitorOptions,
        peers: Arc<dyn PeerDirectory>,
    ) -> Self {
        let (state, _) = watch::channel(MonitorState::Armed);
        Self {
            client,
            target,
            options,
            peers,
            state,
        }
    }

    pub fn target(&self) -> &NodeAddr {
        &self.target
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorState> {
        self.state.subscribe()
    }

    /// Runs the monitor loop until it finishes or `interrupt` resolves while
    /// sleeping. Returns the number of passes performed.
    pub async fn run<C, F>(
        &self,
        command: Arc<C>,
        reporter: &dyn Reporter<C::Response>,
        interrupt: F,
    ) -> usize
    where
        C: Command,
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        let mut passes = 0;

        loop {
            self.transition(MonitorState::Running);
            tracing::info!(
                "Running {} against {} (pass {})",
                command.name(),
                self.target,
                passes + 1
            );

            match self.collect(&command).await {
                Ok(response) => reporter.report(&response),
                Err(e) => {
                    tracing::error!("{} failed on {}: {}", command.name(), self.target, e);
                }
            }
            passes += 1;

            if !self.options.monitor {
                break;
            }

            self.transition(MonitorState::Sleeping);
            tokio::select! {
                _ = tokio::time::sleep(self.options.interval) => {}
                _ = &mut interrupt => {
                    tracing::info!("{} interrupted after {} passes", command.name(), passes);
                    break;
                }
            }
        }

        self.transition(MonitorState::Stopped);
        passes
    }

    /// One collection pass: target node first, then peers in cluster mode.
    pub async fn collect<C: Command>(&self, command: &Arc<C>) -> Result<C::Response, CommandError> {
        let mut response = command.send_request(&self.client, &self.target).await?;

        if self.options.cluster {
            match self.peers.peers(&self.target).await {
                Ok(peers) => {
                    let merged = self.fan_out(command, peers, &mut response).await;
                    tracing::debug!("Merged {} peer responses", merged);
                }
                Err(e) => {
                    tracing::error!("Problem generating peer list for {}: {}", self.target, e);
                }
            }
        }

        Ok(response)
    }

    /// Issues `command` against every peer concurrently and folds the
    /// results into `aggregate`. Returns how many peer responses were merged.
    pub async fn fan_out<C: Command>(
        &self,
        command: &Arc<C>,
        peers: Vec<NodeAddr>,
        aggregate: &mut C::Response,
    ) -> usize {
        let mut tasks = JoinSet::new();
        for (index, peer) in peers
            .into_iter()
            .filter(|peer| peer != &self.target)
            .enumerate()
        {
            let command = command.clone();
            let client = self.client.clone();
            tasks.spawn(async move {
                let result = command.send_request(&client, &peer).await;
                (index, peer, result)
            });
        }

        let mut completed = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => completed.push(outcome),
                Err(e) => {
                    tracing::error!("Peer task for {} did not complete: {}", command.name(), e);
                    aggregate.add_error(format!("peer task did not complete: {}", e));
                }
            }
        }
        completed.sort_by_key(|(index, _, _)| *index);

        let mut merged = 0;
        for (_, peer, result) in completed {
            match result {
                Ok(response) => {
                    aggregate.append(response);
                    merged += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "Problem hitting {} endpoint on {}: {}",
                        command.target_endpoint(),
                        peer,
                        e
                    );
                    aggregate.add_error(format!("{}: {}", peer, e));
                }
            }
        }

        merged
    }

    fn transition(&self, next: MonitorState) {
        let previous = self.state.send_replace(next);
        tracing::debug!("Monitor {:?} -> {:?}", previous, next);
    }
}
