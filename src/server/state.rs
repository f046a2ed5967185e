//! Node lifecycle state.
//!
//! `NodeServer` owns everything the control endpoints act on: the agent
//! pool, the node's own address and peers, the shutdown flag and the signal
//! that stops the HTTP listener. It is created once at startup and shared
//! with the handlers through an axum `Extension`.

use super::protocol::{
    AgentsResponse, PAUSED_MESSAGE, PeersResponse, SHUTDOWN_MESSAGE, SubmitRequest,
    UNPAUSED_MESSAGE,
};
use crate::agents::pool::AgentPool;
use crate::command::node::NodeAddr;
use crate::pipeline::content::BytesContent;
use crate::pipeline::form;
use crate::pipeline::item::WorkItem;

use anyhow::{Result, bail};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// Called with the exit code once the shutdown sequence has finished.
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

/// Pause before the shutdown sequence starts, so the acknowledgement is flushed.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

pub struct NodeServer {
    local: NodeAddr,
    peers: Vec<NodeAddr>,
    pool: Arc<AgentPool>,
    shutting_down: AtomicBool,
    stop: watch::Sender<bool>,
    exit: ExitHook,
    grace: Duration,
}

impl NodeServer {
    pub fn new(local: NodeAddr, peers: Vec<NodeAddr>, pool: Arc<AgentPool>, exit: ExitHook) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            local,
            peers,
            pool,
            shutting_down: AtomicBool::new(false),
            stop,
            exit,
            grace: SHUTDOWN_GRACE,
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn local(&self) -> &NodeAddr {
        &self.local
    }

    pub fn pool(&self) -> &Arc<AgentPool> {
        &self.pool
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Stops agents from starting new stages. Queued work is kept.
    pub fn pause(&self) -> Result<&'static str> {
        if self.is_shutting_down() {
            bail!("node {} is shutting down", self.local);
        }

        if self.pool.pause() {
            tracing::debug!("Node {} was already paused", self.local);
        }
        tracing::info!("Node {} paused", self.local);
        Ok(PAUSED_MESSAGE)
    }

    pub fn unpause(&self) -> Result<&'static str> {
        if self.is_shutting_down() {
            bail!("node {} is shutting down", self.local);
        }

        if self.pool.unpause() {
            tracing::debug!("Node {} was already running", self.local);
        }
        tracing::info!("Node {} unpaused", self.local);
        Ok(UNPAUSED_MESSAGE)
    }

    /// Acknowledges the shutdown and hands the stop sequence to a detached task.
    ///
    /// Repeated calls acknowledge again without starting a second sequence.
    pub fn begin_shutdown(self: &Arc<Self>) -> Result<&'static str> {
        let runtime = tokio::runtime::Handle::try_current()?;

        if self.shutting_down.swap(true, Ordering::SeqCst) {
            tracing::debug!("Shutdown of {} already in progress", self.local);
            return Ok(SHUTDOWN_MESSAGE);
        }

        tracing::info!("Shutdown of {} initiated", self.local);
        let server = self.clone();
        runtime.spawn(async move {
            server.shutdown_sequence().await;
        });

        Ok(SHUTDOWN_MESSAGE)
    }

    async fn shutdown_sequence(&self) {
        tokio::time::sleep(self.grace).await;

        if let Err(e) = self.pool.shutdown().await {
            tracing::debug!("Agent pool did not stop cleanly: {}", e);
        }

        if self.stop.receiver_count() == 0 {
            tracing::debug!("HTTP listener of {} was not running", self.local);
        }
        self.stop.send_replace(true);

        tracing::info!("Node {} exiting", self.local);
        (self.exit)(0);
    }

    /// Resolves once the shutdown sequence asks the HTTP listener to stop.
    pub fn stop_signal(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut stopped = self.stop.subscribe();
        async move {
            let _ = stopped.wait_for(|stop| *stop).await;
        }
    }

    pub fn agents_response(&self) -> AgentsResponse {
        AgentsResponse::for_node(self.local.host_and_port(), self.pool.snapshots())
    }

    pub fn peers_response(&self) -> PeersResponse {
        PeersResponse {
            local: self.local.host_and_port(),
            peers: self.peers.iter().map(NodeAddr::host_and_port).collect(),
        }
    }

    /// Wraps the request in a new work item and queues it on the agent pool.
    pub async fn submit(&self, request: SubmitRequest) -> Result<Uuid> {
        if self.is_shutting_down() {
            bail!("node {} is shutting down", self.local);
        }

        let mut item = WorkItem::new();
        item.set_content(Some(BytesContent::new(request.content.into_bytes())));
        item.set_filename(Some(request.filename));
        item.set_classification(request.classification);
        if request.forms.is_empty() {
            item.enqueue_current_form(form::UNKNOWN);
        }
        for form in request.forms {
            item.enqueue_current_form(form);
        }

        let internal_id = item.internal_id();
        self.pool.submit(item).await;
        Ok(internal_id)
    }
}
