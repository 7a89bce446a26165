use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tether_core::{PeerId, SignalMessage, Status};
use tether_engine::{
    ChannelObserver, Engine, EngineConfig, EngineHandle, Notification, WebRtcTransport,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Drive WebRTC peer connections from the command line")]
struct Cli {
    /// Engine configuration as JSON. Missing fields take defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect two local engines to each other and wait until they are connected.
    Loopback {
        #[arg(long, default_value_t = 15)]
        timeout_secs: u64,
    },

    /// Print an offer for `to` as a signaling message.
    Offer {
        #[arg(long)]
        to: String,
    },

    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Loopback { timeout_secs } => {
            run_loopback(config, Duration::from_secs(timeout_secs)).await?
        }
        Commands::Offer { to } => run_offer(config, PeerId::from(to)).await?,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    EngineConfig::from_json(&json).with_context(|| format!("Invalid config {}", path.display()))
}

fn start_engine(config: EngineConfig) -> Result<(EngineHandle, mpsc::UnboundedReceiver<Notification>)> {
    let transport = WebRtcTransport::new().context("Failed to initialise WebRTC")?;
    let (observer, notifications) = ChannelObserver::new();
    let engine = Engine::start(config, Arc::new(transport), Arc::new(observer));
    Ok((engine, notifications))
}

async fn run_offer(config: EngineConfig, to: PeerId) -> Result<()> {
    let (engine, _notifications) = start_engine(config)?;

    engine.create_connection(&to).await?;
    let offer = engine.create_offer(&to).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&SignalMessage::Offer(offer))?
    );

    engine.shutdown().await?;
    Ok(())
}

async fn run_loopback(config: EngineConfig, timeout: Duration) -> Result<()> {
    let alice_id = PeerId::from("alice");
    let bob_id = PeerId::from("bob");

    let (alice, alice_rx) = start_engine(EngineConfig {
        local_id: alice_id.clone(),
        ..config.clone()
    })?;
    let (bob, bob_rx) = start_engine(EngineConfig {
        local_id: bob_id.clone(),
        ..config
    })?;

    alice.start_listening().await?;
    bob.start_listening().await?;
    println!("{}", "Starting loopback negotiation...".green().bold());

    alice.create_connection(&bob_id).await?;
    let offer = alice.create_offer(&bob_id).await?;
    println!("   {} offer {} -> {}", "→".cyan(), offer.from, offer.to);

    let answer = bob.set_remote_offer(&offer).await?;
    println!("   {} answer {} -> {}", "←".cyan(), answer.from, answer.to);

    alice.set_remote_answer(&answer).await?;

    // Candidates queue up in the observers until both sides have descriptions.
    let alice_forwarder = tokio::spawn(forward_candidates(alice_rx, bob.clone()));
    let bob_forwarder = tokio::spawn(forward_candidates(bob_rx, alice.clone()));

    let connected = tokio::time::timeout(timeout, async {
        let mut alice_state = alice.subscribe();
        let mut bob_state = bob.subscribe();
        alice_state
            .wait_for(|s| s.status_of(&bob_id).is_some_and(Status::is_connected))
            .await?;
        bob_state
            .wait_for(|s| s.status_of(&alice_id).is_some_and(Status::is_connected))
            .await?;
        Ok::<_, tokio::sync::watch::error::RecvError>(())
    })
    .await;

    alice.shutdown().await?;
    bob.shutdown().await?;
    alice_forwarder.abort();
    bob_forwarder.abort();

    match connected {
        Ok(Ok(())) => {
            println!("{}", "Loopback connected".green().bold());
            Ok(())
        }
        Ok(Err(e)) => bail!("Engine stopped while waiting: {}", e),
        Err(_) => bail!("Peers did not connect within {:?}", timeout),
    }
}

async fn forward_candidates(mut rx: mpsc::UnboundedReceiver<Notification>, to: EngineHandle) {
    while let Some(notification) = rx.recv().await {
        match notification {
            Notification::Signal(SignalMessage::Ice(candidate)) => {
                if let Err(e) = to.add_ice_candidate(&candidate).await {
                    warn!("Failed to forward candidate: {}", e);
                }
            }
            Notification::ConnectionState { peer_id, state, .. } => {
                println!("   {} {} is {}", "•".yellow(), peer_id, state);
            }
            other => debug!("Ignoring {:?}", other),
        }
    }
}
