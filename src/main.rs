//! Gateway config sync client.
//!
//! Loads a TOML configuration, registers a logging subscriber for every
//! config group, and runs the sync engine until SIGINT.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gateway_sync::config::load_config;
use gateway_sync::subscriber::{Subscriber, SubscriberError, SubscriberRegistry};
use gateway_sync::{ConfigGroup, SyncConfig, SyncEngine};

#[derive(Parser)]
#[command(name = "gateway-sync", about = "Gateway configuration sync client")]
struct Args {
    /// Path to the TOML configuration file. Defaults are used if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Subscriber that logs delivered data sets; stands in for the gateway's
/// real cache writers when running the client standalone.
struct LoggingSubscriber {
    name: String,
    group: ConfigGroup,
}

impl LoggingSubscriber {
    fn for_group(group: ConfigGroup) -> Arc<dyn Subscriber> {
        Arc::new(Self {
            name: format!("log-{}", group.wire_name().to_lowercase()),
            group,
        })
    }
}

impl Subscriber for LoggingSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_full_refresh(&self, items: &[Value]) -> Result<(), SubscriberError> {
        tracing::info!(group = %self.group, items = items.len(), "full refresh");
        Ok(())
    }

    fn on_incremental_update(&self, items: &[Value]) -> Result<(), SubscriberError> {
        tracing::info!(group = %self.group, items = items.len(), "incremental update");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gateway_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SyncConfig::default(),
    };

    tracing::info!(
        admin_url = %config.admin.url,
        poll_timeout_secs = config.poll.timeout_secs,
        backoff_max_ms = config.backoff.max_ms,
        "Configuration loaded"
    );

    let mut builder = SubscriberRegistry::builder();
    for group in ConfigGroup::ALL {
        builder = builder.subscribe(group, LoggingSubscriber::for_group(group));
    }

    let engine = SyncEngine::new(config, builder.build())?;
    engine.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("SIGINT received, stopping sync engine");
    engine.stop().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
