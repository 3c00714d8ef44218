use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use twilight_model::id::marker::ChannelMarker;
use twilight_model::id::Id;

use craftwatch_core::platforms::discord::DiscordPlatform;
use craftwatch_core::platforms::{PlatformAuth, PlatformIntegration};
use craftwatch_core::services::commands::{force_check_ack, parse_command, BotCommand};
use craftwatch_core::services::status_publisher::StatusPublisher;
use craftwatch_core::tasks::{spawn_status_refresh_task, RefreshScheduler};
use craftwatch_core::AppConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "craftwatch")]
#[command(author, version, about = "Craftwatch - keeps one live Minecraft status message per Discord channel")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "craftwatch.json")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)?;

    let args = Args::parse();
    let config = AppConfig::load(&args.config)?;
    info!(
        "loaded config: {} endpoints, {} status channel(s), {}s interval",
        config.endpoints.len(),
        config.status_channels.len(),
        config.refresh_interval_secs
    );

    let token = std::env::var("DISCORD_TOKEN")
        .map_err(|_| "DISCORD_TOKEN environment variable is not set")?;

    let mut discord = DiscordPlatform::new(token);
    discord.authenticate().await?;
    discord.connect().await?;
    let discord = Arc::new(discord);

    info!("waiting for the Discord session to become ready...");
    discord.wait_until_ready().await;

    let destinations: Vec<Id<ChannelMarker>> = config
        .status_channels
        .iter()
        .map(|&id| Id::new(id))
        .collect();
    let publisher = Arc::new(StatusPublisher::new(discord.clone(), destinations));
    let scheduler = Arc::new(RefreshScheduler::new(Duration::from_secs(
        config.refresh_interval_secs,
    )));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_task = spawn_status_refresh_task(
        scheduler.clone(),
        config.endpoints.clone(),
        publisher.clone(),
        shutdown_rx,
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            maybe_event = discord.next_message_event() => {
                let Some(event) = maybe_event else {
                    warn!("Discord event stream ended");
                    break;
                };
                if let Some(BotCommand::ForceCheck) = parse_command(&event.text) {
                    info!("force-check requested by {}", event.author);
                    scheduler.force();
                    let ack = force_check_ack(scheduler.interval().as_secs() as i64);
                    if let Err(e) = discord
                        .send_message(&event.channel_id.to_string(), &ack)
                        .await
                    {
                        warn!("failed to acknowledge force-check: {e}");
                    }
                }
            }
        }
    }

    // Stop the refresh loop first so teardown is not racing a cycle.
    let _ = shutdown_tx.send(true);
    let _ = refresh_task.await;

    publisher.teardown().await;
    discord.close().await;
    info!("craftwatch stopped");

    Ok(())
}
