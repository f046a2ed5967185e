//! Agent Pool Implementation
//!
//! Runs a fixed number of processing agents on this node. Each agent
//! repeatedly takes the next queued work item, routes it on its top current
//! form to a registered place, and requeues it until no forms remain.
//!
//! ## Responsibilities
//! - **Routing**: top current form -> place via `PlaceRegistry`.
//! - **Lineage**: children returned by a place are passed through
//!   `derive_children` before they re-enter the queue.
//! - **Pause**: while paused, no agent starts a new stage; queued work stays queued.
//! - **Shutdown**: agents stop taking work and the pool waits for in-flight items.

use super::registry::PlaceRegistry;
use super::types::{AgentSnapshot, AgentStatus, agent_name};
use crate::pipeline::form;
use crate::pipeline::hashing::ContentHasher;
use crate::pipeline::item::WorkItem;
use crate::pipeline::lineage::{SproutOptions, derive_children};

use anyhow::Result;
use dashmap::DashMap;
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinHandle;

const IDLE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub worker_count: usize,
    /// Parent parameters copied onto every sprouted child.
    pub always_copy_keys: BTreeSet<String>,
    pub nullify_file_type: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            always_copy_keys: BTreeSet::new(),
            nullify_file_type: true,
        }
    }
}

pub struct AgentPool {
    queue: Mutex<VecDeque<WorkItem>>,
    available: Notify,
    registry: Arc<PlaceRegistry>,
    hasher: Arc<dyn ContentHasher>,
    agents: DashMap<usize, AgentSnapshot>,
    paused: AtomicBool,
    stopping: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
    config: PoolConfig,
    /// Receives items once they have no forms left to route on.
    finished: Option<mpsc::UnboundedSender<WorkItem>>,
    finished_count: AtomicU64,
}

impl AgentPool {
    pub fn new(
        registry: Arc<PlaceRegistry>,
        hasher: Arc<dyn ContentHasher>,
        config: PoolConfig,
        finished: Option<mpsc::UnboundedSender<WorkItem>>,
    ) -> Arc<Self> {
        let agents = DashMap::new();
        for index in 0..config.worker_count {
            agents.insert(index, AgentSnapshot::idle(agent_name(index)));
        }

        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            registry,
            hasher,
            agents,
            paused: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
            config,
            finished,
            finished_count: AtomicU64::new(0),
        })
    }

    /// Spawns the agents and returns immediately.
    pub async fn start(self: Arc<Self>) {
        tracing::info!("Starting {} agents", self.config.worker_count);

        let mut handles = self.handles.lock().await;
        for index in 0..self.config.worker_count {
            let pool = self.clone();
            handles.push(tokio::spawn(async move {
                pool.agent_loop(index).await;
            }));
        }
    }

    pub async fn submit(&self, item: WorkItem) {
        tracing::debug!("Queued {} {:?}", item.short_name(), item.all_current_forms());
        self.queue.lock().await.push_back(item);
        self.available.notify_one();
    }

    /// Returns `true` if the pool was already paused.
    pub fn pause(&self) -> bool {
        self.paused.swap(true, Ordering::SeqCst)
    }

    /// Returns `true` if the pool was already running.
    pub fn unpause(&self) -> bool {
        let was_paused = self.paused.swap(false, Ordering::SeqCst);
        self.available.notify_waiters();
        !was_paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    pub async fn queued(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub fn finished_count(&self) -> u64 {
        self.finished_count.load(Ordering::SeqCst)
    }

    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        let mut snapshots: Vec<AgentSnapshot> = self
            .agents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    /// Stops taking new work and waits for every agent to finish its current item.
    pub async fn shutdown(&self) -> Result<()> {
        self.stopping.store(true, Ordering::SeqCst);
        self.available.notify_waiters();

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.handles.lock().await);
        tracing::info!("Waiting for {} agents to finish", handles.len());

        for handle in handles {
            handle.await?;
        }

        tracing::info!("Agent pool stopped ({} items left queued)", self.queued().await);
        Ok(())
    }

    async fn agent_loop(&self, index: usize) {
        tracing::info!("{} started", agent_name(index));

        while let Some(item) = self.next_item(index).await {
            self.process_item(index, item).await;
        }

        self.set_status(index, AgentStatus::Stopped, None, None);
        tracing::info!("{} stopped", agent_name(index));
    }

    /// Waits for the next item this agent may start, or `None` once stopping.
    async fn next_item(&self, index: usize) -> Option<WorkItem> {
        loop {
            if self.is_stopping() {
                return None;
            }

            if self.is_paused() {
                self.set_status(index, AgentStatus::Paused, None, None);
                tokio::time::sleep(IDLE_POLL).await;
                continue;
            }

            self.set_status(index, AgentStatus::Idle, None, None);
            {
                let mut queue = self.queue.lock().await;
                if !self.is_paused() {
                    if let Some(item) = queue.pop_front() {
                        return Some(item);
                    }
                }
            }

            tokio::select! {
                _ = self.available.notified() => {}
                _ = tokio::time::sleep(IDLE_POLL) => {}
            }
        }
    }

    async fn process_item(&self, index: usize, mut item: WorkItem) {
        let Some(current) = routable_form(&item) else {
            self.finish(item);
            return;
        };

        let Some(place) = self.registry.lookup(&current) else {
            tracing::warn!("No place registered for form {} on {}", current, item.short_name());
            item.pop_current_form();
            self.route_or_finish(item).await;
            return;
        };

        item.pop_current_form();
        item.append_transform_history(place.key());
        self.set_status(
            index,
            AgentStatus::Working,
            Some(place.key().to_string()),
            Some(item.short_name()),
        );

        match place.process(&mut item).await {
            Ok(children) => {
                if !children.is_empty() {
                    self.sprout(&mut item, children, place.key()).await;
                }
            }
            Err(e) => {
                tracing::error!("{} failed on {}: {}", place.key(), item.short_name(), e);
                item.add_processing_error(&format!("{}: {}", place.key(), e));
                item.push_current_form(form::ERROR);
            }
        }

        if let Some(mut agent) = self.agents.get_mut(&index) {
            agent.processed += 1;
        }
        self.route_or_finish(item).await;
    }

    async fn sprout(&self, parent: &mut WorkItem, children: Vec<WorkItem>, place_key: &str) {
        let mut slots: Vec<Option<WorkItem>> = children.into_iter().map(Some).collect();
        let options = SproutOptions {
            nullify_file_type: self.config.nullify_file_type,
            always_copy_keys: self.config.always_copy_keys.clone(),
            place_key: place_key.to_string(),
        };

        derive_children(parent, &mut slots, &options, self.hasher.as_ref());
        parent.set_num_children(parent.num_children() + slots.len());

        tracing::info!(
            "{} sprouted {} children from {}",
            place_key,
            slots.len(),
            parent.short_name()
        );

        for child in slots.into_iter().flatten() {
            self.submit(child).await;
        }
    }

    async fn route_or_finish(&self, item: WorkItem) {
        if routable_form(&item).is_some() {
            self.submit(item).await;
        } else {
            self.finish(item);
        }
    }

    fn finish(&self, item: WorkItem) {
        tracing::debug!(
            "Finished {} after {} stages",
            item.short_name(),
            item.transform_history().len()
        );
        self.finished_count.fetch_add(1, Ordering::SeqCst);
        if let Some(finished) = &self.finished {
            // receiver may already be gone during shutdown
            let _ = finished.send(item);
        }
    }

    fn set_status(
        &self,
        index: usize,
        status: AgentStatus,
        place: Option<String>,
        item: Option<String>,
    ) {
        if let Some(mut agent) = self.agents.get_mut(&index) {
            agent.status = status;
            agent.place = place;
            agent.item = item;
        }
    }
}

/// Top form of `item` unless it has none left or has reached a terminal form.
fn routable_form(item: &WorkItem) -> Option<String> {
    item.current_form()
        .filter(|current| *current != form::DONE && *current != form::ERROR)
        .map(str::to_string)
}
