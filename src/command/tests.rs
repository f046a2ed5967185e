//! Command Module Tests
//!
//! ## Test Scopes
//! - **Addressing**: node address parsing, equality and endpoint URLs.
//! - **Configuration**: client timeouts from the environment lookup.
//! - **Aggregation**: fan-out merging with failing, slow and same-labelled peers.
//! - **Monitor loop**: single pass vs repeated passes with interruption.
//!
//! *Note: commands are exercised through mock implementations; no sockets are opened.*

#[cfg(test)]
mod tests {
    use crate::agents::types::AgentSnapshot;
    use crate::command::client::{
        CONNECT_TIMEOUT_ENV, ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT,
        READ_TIMEOUT_ENV,
    };
    use crate::command::control::{ControlAction, ControlCommand, ControlResponse};
    use crate::command::controller::{FleetController, MonitorOptions, MonitorState};
    use crate::command::error::{CommandError, NodeAddrError, PeerListError};
    use crate::command::node::{NodeAddr, Scheme};
    use crate::command::peers::{PeerDirectory, StaticPeerDirectory};
    use crate::command::types::{AggregateResponse, Command, Reporter};
    use crate::server::protocol::AgentsResponse;

    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::oneshot;

    // ============================================================
    // TEST DOUBLES
    // ============================================================

    /// Answers with one idle agent per node; ports in `failing` return a 500.
    struct MockCommand {
        failing: Vec<u16>,
        max_delay_ms: u64,
        calls: AtomicUsize,
    }

    impl MockCommand {
        fn new(failing: Vec<u16>, max_delay_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                failing,
                max_delay_ms,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Command for MockCommand {
        type Response = AgentsResponse;

        fn name(&self) -> &'static str {
            "mock"
        }

        fn target_endpoint(&self) -> &'static str {
            "/agents"
        }

        async fn send_request(
            &self,
            _client: &reqwest::Client,
            node: &NodeAddr,
        ) -> Result<AgentsResponse, CommandError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if self.max_delay_ms > 0 {
                let delay = rand::random::<u64>() % (self.max_delay_ms + 1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            if self.failing.contains(&node.port) {
                return Err(CommandError::Status {
                    endpoint: node.endpoint(self.target_endpoint()),
                    status: 500,
                    body: "boom".to_string(),
                });
            }

            Ok(AgentsResponse::for_node(
                node.host_and_port(),
                vec![AgentSnapshot::idle("Agent-01")],
            ))
        }
    }

    /// Every node labels itself with the same wildcard bind address.
    struct WildcardLabelCommand;

    #[async_trait]
    impl Command for WildcardLabelCommand {
        type Response = AgentsResponse;

        fn name(&self) -> &'static str {
            "wildcard"
        }

        fn target_endpoint(&self) -> &'static str {
            "/agents"
        }

        async fn send_request(
            &self,
            _client: &reqwest::Client,
            node: &NodeAddr,
        ) -> Result<AgentsResponse, CommandError> {
            Ok(AgentsResponse::for_node(
                "0.0.0.0:8001",
                vec![AgentSnapshot::idle(format!("Agent-on-{}", node.port))],
            ))
        }
    }

    struct FailingPeerDirectory;

    #[async_trait]
    impl PeerDirectory for FailingPeerDirectory {
        async fn peers(&self, own: &NodeAddr) -> Result<Vec<NodeAddr>, PeerListError> {
            Err(PeerListError::Request(CommandError::Decode {
                endpoint: own.endpoint("/peers"),
                reason: "not json".to_string(),
            }))
        }
    }

    /// Counts reports and fires an interrupt after a given pass.
    struct CountingReporter {
        passes: AtomicUsize,
        interrupt_after: usize,
        interrupt: Mutex<Option<oneshot::Sender<()>>>,
        last: Mutex<Option<AgentsResponse>>,
    }

    impl CountingReporter {
        fn new(interrupt_after: usize, interrupt: Option<oneshot::Sender<()>>) -> Self {
            Self {
                passes: AtomicUsize::new(0),
                interrupt_after,
                interrupt: Mutex::new(interrupt),
                last: Mutex::new(None),
            }
        }
    }

    impl Reporter<AgentsResponse> for CountingReporter {
        fn report(&self, response: &AgentsResponse) {
            let pass = self.passes.fetch_add(1, Ordering::SeqCst) + 1;
            *self.last.lock().unwrap() = Some(response.clone());
            if pass == self.interrupt_after {
                if let Some(tx) = self.interrupt.lock().unwrap().take() {
                    let _ = tx.send(());
                }
            }
        }
    }

    fn local() -> NodeAddr {
        NodeAddr::new(Scheme::Http, "localhost", 8001)
    }

    fn peers(ports: &[u16]) -> Vec<NodeAddr> {
        ports
            .iter()
            .map(|port| NodeAddr::new(Scheme::Http, "localhost", *port))
            .collect()
    }

    fn controller(options: MonitorOptions, directory: Arc<dyn PeerDirectory>) -> FleetController {
        FleetController::new(reqwest::Client::new(), local(), options, directory)
    }

    fn cluster_options() -> MonitorOptions {
        MonitorOptions {
            cluster: true,
            ..MonitorOptions::default()
        }
    }

    // ============================================================
    // NODE ADDRESS TESTS
    // ============================================================

    #[test]
    fn test_node_addr_parsing() {
        let addr: NodeAddr = "node-1.example.com:8443".parse().unwrap();
        assert_eq!(addr.host, "node-1.example.com");
        assert_eq!(addr.port, 8443);
        assert_eq!(addr.scheme, Scheme::Http);

        let https = NodeAddr::parse_with_scheme("https://10.0.0.5:9000/", Scheme::Http).unwrap();
        assert_eq!(https.scheme, Scheme::Https);
        assert_eq!(https.to_string(), "10.0.0.5:9000");

        assert_eq!(
            "no-port".parse::<NodeAddr>(),
            Err(NodeAddrError::Format("no-port".to_string()))
        );
        assert_eq!(
            "host:99999".parse::<NodeAddr>(),
            Err(NodeAddrError::Port("host:99999".to_string()))
        );
        assert!(NodeAddr::parse_with_scheme("ftp://host:21", Scheme::Http).is_err());
    }

    #[test]
    fn test_node_addr_identity_ignores_scheme() {
        let plain = NodeAddr::new(Scheme::Http, "host", 8001);
        let secure = NodeAddr::new(Scheme::Https, "host", 8001);
        let other = NodeAddr::new(Scheme::Http, "host", 8002);

        assert_eq!(plain, secure);
        assert_ne!(plain, other);

        let mut set = HashSet::new();
        set.insert(plain);
        set.insert(secure);
        set.insert(other);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_node_addr_endpoint() {
        let addr = NodeAddr::new(Scheme::Https, "host", 8001);
        assert_eq!(addr.endpoint("/agents"), "https://host:8001/agents");
        assert_eq!(addr.endpoint("pause"), "https://host:8001/pause");
    }

    // ============================================================
    // CLIENT CONFIG TESTS
    // ============================================================

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::from_lookup(|_| None);

        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.read_timeout, DEFAULT_READ_TIMEOUT);
    }

    #[test]
    fn test_client_config_overrides_and_bad_values() {
        let config = ClientConfig::from_lookup(|key| match key {
            CONNECT_TIMEOUT_ENV => Some("5000".to_string()),
            READ_TIMEOUT_ENV => Some("soon".to_string()),
            _ => None,
        });

        assert_eq!(config.connect_timeout, Duration::from_millis(5000));
        assert_eq!(config.read_timeout, DEFAULT_READ_TIMEOUT);
    }

    // ============================================================
    // PEER DIRECTORY TESTS
    // ============================================================

    #[tokio::test]
    async fn test_static_directory_excludes_self_and_duplicates() {
        let mut listed = peers(&[8002, 8001, 8003, 8002]);
        listed.push(NodeAddr::new(Scheme::Https, "localhost", 8003));
        let directory = StaticPeerDirectory::new(listed);

        let result = directory.peers(&local()).await.unwrap();

        assert_eq!(result, peers(&[8002, 8003]));
    }

    // ============================================================
    // FAN-OUT TESTS
    // ============================================================

    #[tokio::test]
    async fn test_fan_out_records_failed_peer() {
        let directory = Arc::new(StaticPeerDirectory::new(peers(&[8002, 8003, 8004])));
        let controller = controller(cluster_options(), directory);
        let command = MockCommand::new(vec![8003], 0);

        let aggregate = controller.collect(&command).await.unwrap();

        let nodes: Vec<&str> = aggregate.nodes.keys().map(String::as_str).collect();
        assert_eq!(nodes, vec!["localhost:8001", "localhost:8002", "localhost:8004"]);
        assert_eq!(aggregate.errors().len(), 1);
        assert!(aggregate.errors()[0].starts_with("localhost:8003"));
        assert_eq!(command.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_fan_out_merge_count_matches_successes() {
        let controller = controller(cluster_options(), Arc::new(StaticPeerDirectory::default()));
        let command = MockCommand::new(vec![8003], 0);
        let mut aggregate = AgentsResponse::default();

        let merged = controller
            .fan_out(&command, peers(&[8002, 8003, 8004, 8001]), &mut aggregate)
            .await;

        // the target itself is never fanned out to
        assert_eq!(merged, 2);
        assert_eq!(aggregate.nodes.len(), 2);
        assert_eq!(aggregate.errors.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fan_out_is_independent_of_completion_order() {
        let directory: Arc<dyn PeerDirectory> =
            Arc::new(StaticPeerDirectory::new(peers(&[8002, 8003, 8004, 8005, 8006])));
        let controller = controller(cluster_options(), directory);

        let mut results = Vec::new();
        for _ in 0..8 {
            let command = MockCommand::new(vec![8003, 8005], 40);
            results.push(controller.collect(&command).await.unwrap());
        }

        let first = &results[0];
        assert_eq!(first.nodes.len(), 4);
        assert_eq!(first.errors.len(), 2);
        for result in &results[1..] {
            assert_eq!(result, first);
        }
    }

    #[tokio::test]
    async fn test_fan_out_keeps_agents_of_nodes_sharing_a_label() {
        // ARRANGE: three nodes that all call themselves 0.0.0.0:8001
        let directory = Arc::new(StaticPeerDirectory::new(peers(&[8002, 8003])));
        let controller = controller(cluster_options(), directory);

        // ACT
        let aggregate = controller.collect(&Arc::new(WildcardLabelCommand)).await.unwrap();

        // ASSERT: no node's agents are overwritten
        let agents: Vec<&str> = aggregate
            .nodes
            .values()
            .flatten()
            .map(|agent| agent.name.as_str())
            .collect();
        assert_eq!(agents, vec!["Agent-on-8001", "Agent-on-8002", "Agent-on-8003"]);
        assert!(aggregate.errors.is_empty());
    }

    #[tokio::test]
    async fn test_local_failure_aborts_pass() {
        let directory = Arc::new(StaticPeerDirectory::new(peers(&[8002])));
        let controller = controller(cluster_options(), directory);
        let command = MockCommand::new(vec![8001], 0);

        let result = controller.collect(&command).await;

        assert!(matches!(result, Err(CommandError::Status { status: 500, .. })));
        assert_eq!(command.calls.load(Ordering::SeqCst), 1, "peers are not contacted");
    }

    #[tokio::test]
    async fn test_peer_list_failure_keeps_local_result() {
        let controller = controller(cluster_options(), Arc::new(FailingPeerDirectory));
        let command = MockCommand::new(vec![], 0);

        let aggregate = controller.collect(&command).await.unwrap();

        assert_eq!(aggregate.nodes.len(), 1);
        assert!(aggregate.nodes.contains_key("localhost:8001"));
        assert!(aggregate.errors.is_empty());
    }

    #[tokio::test]
    async fn test_cluster_disabled_skips_peers() {
        let directory = Arc::new(StaticPeerDirectory::new(peers(&[8002, 8003])));
        let controller = controller(MonitorOptions::default(), directory);
        let command = MockCommand::new(vec![], 0);

        let aggregate = controller.collect(&command).await.unwrap();

        assert_eq!(aggregate.nodes.len(), 1);
        assert_eq!(command.calls.load(Ordering::SeqCst), 1);
    }

    // ============================================================
    // MONITOR LOOP TESTS
    // ============================================================

    #[tokio::test]
    async fn test_single_pass_without_monitor() {
        let controller = controller(MonitorOptions::default(), Arc::new(StaticPeerDirectory::default()));
        let reporter = CountingReporter::new(0, None);
        assert_eq!(controller.state(), MonitorState::Armed);

        let passes = controller
            .run(MockCommand::new(vec![], 0), &reporter, std::future::pending())
            .await;

        assert_eq!(passes, 1);
        assert_eq!(reporter.passes.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), MonitorState::Stopped);
    }

    #[tokio::test]
    async fn test_monitor_stops_cleanly_on_interrupt() {
        let options = MonitorOptions {
            monitor: true,
            interval: Duration::from_millis(10),
            cluster: false,
        };
        let controller = controller(options, Arc::new(StaticPeerDirectory::default()));
        let (tx, rx) = oneshot::channel();
        let reporter = CountingReporter::new(2, Some(tx));

        let passes = controller
            .run(MockCommand::new(vec![], 0), &reporter, async move {
                let _ = rx.await;
            })
            .await;

        assert_eq!(passes, 2);
        assert_eq!(reporter.passes.load(Ordering::SeqCst), 2);
        assert!(reporter.last.lock().unwrap().is_some());
        assert_eq!(controller.state(), MonitorState::Stopped);
    }

    #[tokio::test]
    async fn test_interrupt_during_first_pass_stops_after_it() {
        let options = MonitorOptions {
            monitor: true,
            interval: Duration::from_secs(60),
            cluster: false,
        };
        let controller = controller(options, Arc::new(StaticPeerDirectory::default()));
        let reporter = CountingReporter::new(0, None);

        // interrupt already fired before the pass starts
        let passes = tokio::time::timeout(
            Duration::from_secs(5),
            controller.run(MockCommand::new(vec![], 20), &reporter, async {}),
        )
        .await
        .unwrap();

        assert_eq!(passes, 1);
        assert_eq!(reporter.passes.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), MonitorState::Stopped);
    }

    #[tokio::test]
    async fn test_monitor_continues_after_local_failure() {
        let options = MonitorOptions {
            monitor: true,
            interval: Duration::from_millis(10),
            cluster: false,
        };
        let controller = controller(options, Arc::new(StaticPeerDirectory::default()));
        let reporter = CountingReporter::new(0, None);

        let passes = controller
            .run(
                MockCommand::new(vec![8001], 0),
                &reporter,
                tokio::time::sleep(Duration::from_millis(100)),
            )
            .await;

        assert_eq!(reporter.passes.load(Ordering::SeqCst), 0);
        assert!(passes >= 2, "failed passes do not end the loop");
    }

    // ============================================================
    // RESPONSE TESTS
    // ============================================================

    #[test]
    fn test_agents_response_render() {
        let mut response = AgentsResponse::for_node("a:1", vec![AgentSnapshot::idle("Agent-01")]);
        response.append(AgentsResponse::for_node("b:2", vec![AgentSnapshot::idle("Agent-01")]));
        response.add_error("c:3: refused".to_string());

        let rendered = response.render();

        assert!(rendered.starts_with("a:1\n  Agent-01: Idle"));
        assert!(rendered.contains("b:2\n"));
        assert!(!rendered.contains("refused"));
        assert_eq!(response.errors().to_vec(), vec!["c:3: refused".to_string()]);
    }

    #[test]
    fn test_relabel_files_agents_under_contacted_node() {
        let mut reported = AgentsResponse::for_node("0.0.0.0:8001", vec![AgentSnapshot::idle("Agent-01")]);
        reported.add_error("stale".to_string());

        let relabeled = reported.relabel("host-b:8001");

        let nodes: Vec<&str> = relabeled.nodes.keys().map(String::as_str).collect();
        assert_eq!(nodes, vec!["host-b:8001"]);
        assert_eq!(relabeled.nodes["host-b:8001"][0].name, "Agent-01");
        assert_eq!(relabeled.errors().len(), 1);
    }

    #[test]
    fn test_append_concatenates_colliding_labels() {
        let mut response = AgentsResponse::for_node("a:1", vec![AgentSnapshot::idle("Agent-01")]);

        response.append(AgentsResponse::for_node("a:1", vec![AgentSnapshot::idle("Agent-02")]));

        assert_eq!(response.nodes.len(), 1);
        assert_eq!(response.nodes["a:1"].len(), 2);
    }

    #[test]
    fn test_control_response_append() {
        let mut response = ControlResponse::default();
        response.outcomes.insert("a:1".to_string(), "server paused".to_string());
        let mut other = ControlResponse::default();
        other.outcomes.insert("b:2".to_string(), "server paused".to_string());
        other.add_error("c:3: timeout".to_string());

        response.append(other);

        assert_eq!(response.outcomes.len(), 2);
        assert_eq!(response.render(), "a:1: server paused\nb:2: server paused\n");
        assert_eq!(response.errors().len(), 1);
    }

    #[test]
    fn test_control_command_endpoints() {
        assert_eq!(ControlCommand::pause().target_endpoint(), "/pause");
        assert_eq!(ControlCommand::unpause().target_endpoint(), "/unpause");
        assert_eq!(ControlCommand::shutdown().target_endpoint(), "/shutdown");
        assert_eq!(ControlCommand::shutdown().action(), ControlAction::Shutdown);
        assert_eq!(ControlCommand::pause().name(), "pause");
    }
}
