use clap::{Parser, Subcommand};
use fleet_cluster::command::agents::AgentsCommand;
use fleet_cluster::command::client::ClientConfig;
use fleet_cluster::command::control::ControlCommand;
use fleet_cluster::command::controller::{FleetController, MonitorOptions};
use fleet_cluster::command::node::{NodeAddr, Scheme};
use fleet_cluster::command::peers::HttpPeerDirectory;
use fleet_cluster::command::types::{Command, StderrReporter};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(name = "fleetctl")]
#[command(about = "Observe and control the nodes of a processing fleet")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    action: Action,

    /// Host of the node to contact first
    #[arg(long, global = true, default_value = "localhost")]
    host: String,

    #[arg(long, global = true, default_value_t = 8001)]
    port: u16,

    #[arg(long, global = true, default_value = "http")]
    scheme: Scheme,

    /// Repeat every interval until interrupted
    #[arg(long, global = true)]
    mon: bool,

    /// Seconds between passes in monitor mode
    #[arg(short, long, global = true, default_value_t = 30)]
    interval: u64,

    /// Also run against every peer of the node
    #[arg(long, global = true)]
    cluster: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Action {
    /// List the processing agents
    Agents,
    /// Stop starting new work, keeping queued items
    Pause,
    /// Resume processing
    Unpause,
    /// Finish in-flight work and stop the node
    Shutdown,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = ClientConfig::from_env().build()?;
    let target = NodeAddr::new(cli.scheme, cli.host.clone(), cli.port);
    let options = MonitorOptions {
        monitor: cli.mon,
        interval: Duration::from_secs(cli.interval.max(1)),
        cluster: cli.cluster,
    };
    let controller = FleetController::new(
        client.clone(),
        target,
        options,
        Arc::new(HttpPeerDirectory::new(client)),
    );

    // Ctrl+C listener is installed before the first pass starts.
    let interrupt = cli.mon.then(|| {
        tokio::spawn(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Could not listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
    });

    let passes = match cli.action {
        Action::Agents => run(&controller, AgentsCommand, interrupt).await,
        Action::Pause => run(&controller, ControlCommand::pause(), interrupt).await,
        Action::Unpause => run(&controller, ControlCommand::unpause(), interrupt).await,
        Action::Shutdown => run(&controller, ControlCommand::shutdown(), interrupt).await,
    };

    tracing::debug!("Finished after {} passes", passes);
    Ok(())
}

async fn run<C: Command>(
    controller: &FleetController,
    command: C,
    interrupt: Option<JoinHandle<()>>,
) -> usize {
    controller
        .run(Arc::new(command), &StderrReporter, async move {
            match interrupt {
                Some(listener) => {
                    let _ = listener.await;
                }
                None => std::future::pending::<()>().await,
            }
        })
        .await
}
