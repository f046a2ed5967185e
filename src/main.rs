use clap::Parser;
use fleet_cluster::agents::place::DelayPlace;
use fleet_cluster::agents::pool::{AgentPool, PoolConfig};
use fleet_cluster::agents::registry::PlaceRegistry;
use fleet_cluster::command::node::{NodeAddr, Scheme};
use fleet_cluster::pipeline::form;
use fleet_cluster::pipeline::hashing::Sha2Hasher;
use fleet_cluster::server::handlers::router;
use fleet_cluster::server::state::{ExitHook, NodeServer};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fleet-node")]
#[command(about = "Runs a processing node: local agents plus the HTTP control surface")]
#[command(version)]
struct Args {
    /// Address to serve on, e.g. localhost:8001
    #[arg(long, default_value = "localhost:8001")]
    bind: NodeAddr,

    /// Peer node (host:port), may be repeated
    #[arg(long = "peer")]
    peers: Vec<NodeAddr>,

    /// Number of processing agents
    #[arg(long, default_value_t = 4)]
    workers: usize,

    #[arg(long, default_value = "http")]
    scheme: Scheme,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let local = NodeAddr::new(args.scheme, args.bind.host.clone(), args.bind.port);
    let peers: Vec<NodeAddr> = args
        .peers
        .iter()
        .map(|peer| NodeAddr::new(args.scheme, peer.host.clone(), peer.port))
        .filter(|peer| peer != &local)
        .collect();

    tracing::info!("Starting node on {}", local);
    if peers.is_empty() {
        tracing::info!("No peers configured");
    } else {
        tracing::info!("Peers: {:?}", peers.iter().map(|p| p.to_string()).collect::<Vec<_>>());
    }

    // 1. Places:
    let registry = PlaceRegistry::new();
    let delay = DelayPlace::delay_from_env();
    registry.register(Arc::new(DelayPlace::new(
        format!("DELAY.DELAY.{}://{}/DelayPlace", local.scheme, local),
        vec![form::UNKNOWN.to_string(), form::TEXT.to_string()],
        delay,
    )));
    tracing::info!("DelayPlace registered with {:?} delay", delay);

    // 2. Agents:
    let config = PoolConfig {
        worker_count: args.workers,
        ..PoolConfig::default()
    };
    let pool = AgentPool::new(registry, Arc::new(Sha2Hasher::default()), config, None);
    pool.clone().start().await;

    // 3. Node state and HTTP router:
    let exit: ExitHook = Arc::new(|code| std::process::exit(code));
    let server = Arc::new(NodeServer::new(local.clone(), peers, pool, exit));
    let stop = server.stop_signal();
    let app = router(server);

    // 4. Start HTTP server:
    tracing::info!("HTTP server listening on {}", local);
    tracing::info!("POST {} to stop the node", local.endpoint("/shutdown"));

    let listener = tokio::net::TcpListener::bind(local.host_and_port()).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(stop)
        .await?;

    Ok(())
}
