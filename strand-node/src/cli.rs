use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::{parse_address, NodeConfig};
use crate::error::NodeError;
use crate::runtime::{unix_now, ChainRuntime, Delivery};

#[derive(Parser)]
#[command(
    name = "strand",
    about = "Strand Protocol chain instance — cross-chain gauge rewards and staking",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a chain instance
    Run {
        /// Path to config file
        #[arg(short, long, default_value = "strand.toml")]
        config: String,
        /// Hex-encoded 20-byte admin address for this instance
        #[arg(long)]
        admin: String,
        /// Override the chain id from the config
        #[arg(long)]
        chain_id: Option<u32>,
    },
    /// Initialize a new instance configuration
    Init {
        /// Output directory
        #[arg(short, long, default_value = ".")]
        dir: String,
    },
}

pub async fn run(cli: Cli) -> Result<(), NodeError> {
    match cli.command {
        Command::Run {
            config,
            admin,
            chain_id,
        } => {
            let mut config = NodeConfig::load(&config)?;
            if let Some(id) = chain_id {
                config.chain_id = id;
            }
            let admin = parse_address("--admin", &admin)?;

            let mut runtime = ChainRuntime::from_config(&config, admin, unix_now())?;
            // The transport adapter feeds deliveries through this sender.
            let (deliveries, mut inbox) = mpsc::channel::<Delivery>(256);
            let _transport = deliveries;

            info!(chain_id = runtime.chain_id(), "instance running; awaiting deliveries");
            loop {
                tokio::select! {
                    delivery = inbox.recv() => {
                        let Some(delivery) = delivery else { break };
                        match runtime.handle_envelope(
                            unix_now(),
                            &delivery.from_relay,
                            &delivery.envelope,
                        ) {
                            Ok(outbound) => {
                                // Outbound envelopes go back to the transport.
                                for env in &outbound {
                                    info!(
                                        id = %hex::encode(env.id),
                                        dest = env.dest_chain,
                                        "outbound envelope produced"
                                    );
                                }
                            }
                            Err(e) => error!("envelope rejected: {}", e),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        break;
                    }
                }
            }
            Ok(())
        }
        Command::Init { dir } => {
            NodeConfig::init(&dir)?;
            info!("instance configuration initialized in {}", dir);
            Ok(())
        }
    }
}
