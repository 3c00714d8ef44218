// File: src/platforms/discord/runtime.rs
//
// Discord session: one gateway shard set feeding inbound chat messages to
// the command loop, plus the HTTP client the publisher drives through the
// `StatusMessenger` seam.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use twilight_gateway::{
    self as gateway, CloseFrame, Config, Event, EventTypeFlags, Intents, MessageSender, Shard,
    StreamExt,
};
use twilight_http::client::ClientBuilder;
use twilight_http::error::ErrorType;
use twilight_http::Client as HttpClient;
use twilight_model::gateway::payload::incoming::Ready as ReadyPayload;
use twilight_model::id::marker::{ChannelMarker, MessageMarker};
use twilight_model::id::Id;

use crate::models::DisplayPayload;
use crate::platforms::{ConnectionStatus, PlatformAuth, PlatformIntegration};
use crate::services::status_publisher::StatusMessenger;
use crate::Error;

use super::embed::payload_to_embed;

/// Discord API error code for "Unknown Message" — the edit target is gone.
const API_CODE_UNKNOWN_MESSAGE: u64 = 10008;

#[derive(Debug, Clone)]
pub struct DiscordMessageEvent {
    pub channel_id: Id<ChannelMarker>,
    pub author: String,
    pub text: String,
}

/// Shard runner: drains gateway events, flips the ready watch on READY,
/// and forwards non-bot chat messages to `tx`.
async fn shard_runner(
    mut shard: Shard,
    tx: UnboundedSender<DiscordMessageEvent>,
    ready_tx: watch::Sender<bool>,
) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        match item {
            Ok(event) => match &event {
                Event::Ready(ready) => {
                    let data: &ReadyPayload = ready.as_ref();
                    info!(
                        "Shard {shard_id} => READY as {} (ID={})",
                        data.user.name, data.user.id
                    );
                    let _ = ready_tx.send(true);
                }
                Event::MessageCreate(msg) => {
                    if msg.author.bot {
                        debug!("Ignoring bot message from {}", msg.author.name);
                        continue;
                    }
                    let _ = tx.send(DiscordMessageEvent {
                        channel_id: msg.channel_id,
                        author: msg.author.name.clone(),
                        text: msg.content.clone(),
                    });
                }
                _ => {}
            },
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

pub struct DiscordPlatform {
    pub token: String,
    pub connection_status: ConnectionStatus,

    /// Inbound chat events; `None` until `connect` installs the receiver.
    pub rx: Mutex<Option<UnboundedReceiver<DiscordMessageEvent>>>,

    // Interior mutability so `close` works on a shared handle after the
    // platform has been handed to the publisher.
    shard_tasks: Mutex<Vec<JoinHandle<()>>>,
    shard_senders: std::sync::Mutex<Vec<MessageSender>>,

    pub http: Option<Arc<HttpClient>>,

    ready_tx: watch::Sender<bool>,
    ready_rx: watch::Receiver<bool>,
}

impl DiscordPlatform {
    pub fn new(token: String) -> Self {
        let (ready_tx, ready_rx) = watch::channel(false);
        Self {
            token,
            connection_status: ConnectionStatus::Disconnected,
            rx: Mutex::new(None),
            shard_tasks: Mutex::new(Vec::new()),
            shard_senders: std::sync::Mutex::new(Vec::new()),
            http: None,
            ready_tx,
            ready_rx,
        }
    }

    /// Resolves once the gateway has signalled READY. The refresh task is
    /// only started after this.
    pub async fn wait_until_ready(&self) {
        let mut rx = self.ready_rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Next inbound chat message, if the session is connected.
    pub async fn next_message_event(&self) -> Option<DiscordMessageEvent> {
        let mut guard = self.rx.lock().await;
        match guard.as_mut() {
            Some(r) => r.recv().await,
            None => None,
        }
    }

    fn http_client(&self) -> Result<&Arc<HttpClient>, Error> {
        self.http
            .as_ref()
            .ok_or_else(|| Error::Platform("Discord HTTP client not connected".into()))
    }

    /// Closes the gateway shards and waits for their runners. Usable on a
    /// shared handle, unlike [`PlatformIntegration::disconnect`].
    pub async fn close(&self) {
        let senders: Vec<MessageSender> = {
            let mut guard = self.shard_senders.lock().unwrap_or_else(|e| e.into_inner());
            guard.drain(..).collect()
        };
        for sender in senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }

        let tasks: Vec<JoinHandle<()>> = {
            let mut guard = self.shard_tasks.lock().await;
            guard.drain(..).collect()
        };
        for task in tasks {
            let _ = task.await;
        }

        let mut guard = self.rx.lock().await;
        *guard = None;
    }
}

#[async_trait]
impl PlatformAuth for DiscordPlatform {
    async fn authenticate(&mut self) -> Result<(), Error> {
        if self.token.is_empty() {
            return Err(Error::Auth("Discord token is empty".into()));
        }
        Ok(())
    }

    async fn is_authenticated(&self) -> Result<bool, Error> {
        Ok(!self.token.is_empty())
    }
}

#[async_trait]
impl PlatformIntegration for DiscordPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }

        let (tx, rx) = unbounded_channel::<DiscordMessageEvent>();
        {
            let mut guard = self.rx.lock().await;
            *guard = Some(rx);
        }

        let http_client = Arc::new(
            ClientBuilder::new()
                .token(self.token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );
        self.http = Some(http_client.clone());

        let config = Config::new(
            self.token.clone(),
            Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT,
        );

        let shards = gateway::create_recommended(&http_client, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?;

        for shard in shards {
            self.shard_senders
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(shard.sender());
            let tx_for_shard = tx.clone();
            let ready_for_shard = self.ready_tx.clone();
            let handle = tokio::spawn(async move {
                shard_runner(shard, tx_for_shard, ready_for_shard).await;
            });
            self.shard_tasks.lock().await.push(handle);
        }

        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;
        self.close().await;
        Ok(())
    }

    async fn send_message(&self, channel: &str, message: &str) -> Result<(), Error> {
        let channel_id_u64: u64 = channel
            .parse()
            .map_err(|_| Error::Platform(format!("Invalid channel ID: {channel}")))?;
        let channel_id = Id::<ChannelMarker>::new(channel_id_u64);

        self.http_client()?
            .create_message(channel_id)
            .content(message)
            .await
            .map_err(|e| Error::Platform(format!("Error sending Discord message: {e:?}")))?;

        Ok(())
    }

    async fn get_connection_status(&self) -> Result<ConnectionStatus, Error> {
        Ok(self.connection_status.clone())
    }
}

/// Maps a failed edit to `Error::UnknownMessage` when Discord reports the
/// target gone (HTTP 404 / API code 10008), so the publisher can recreate.
fn map_edit_error(err: twilight_http::Error, message_id: Id<MessageMarker>) -> Error {
    if let ErrorType::Response { error, status, .. } = err.kind() {
        let api_code = match error {
            twilight_http::api_error::ApiError::General(general) => Some(general.code),
            _ => None,
        };
        if status.get() == 404 || api_code == Some(API_CODE_UNKNOWN_MESSAGE) {
            return Error::UnknownMessage(message_id.to_string());
        }
    }
    Error::Platform(format!("Error editing Discord message: {err:?}"))
}

#[async_trait]
impl StatusMessenger for DiscordPlatform {
    async fn resolve_channel(
        &self,
        channel_id: Id<ChannelMarker>,
    ) -> Option<Id<ChannelMarker>> {
        let http = match self.http_client() {
            Ok(http) => http,
            Err(_) => return None,
        };
        match http.channel(channel_id).await {
            Ok(_) => Some(channel_id),
            Err(e) => {
                warn!("could not resolve channel {channel_id}: {e:?}");
                None
            }
        }
    }

    async fn create_status_message(
        &self,
        channel_id: Id<ChannelMarker>,
        payload: &DisplayPayload,
    ) -> Result<Id<MessageMarker>, Error> {
        let embed = payload_to_embed(payload);
        let response = self
            .http_client()?
            .create_message(channel_id)
            .embeds(&[embed])
            .await
            .map_err(|e| Error::Platform(format!("Error creating Discord message: {e:?}")))?;
        let message = response
            .model()
            .await
            .map_err(|e| Error::Platform(format!("Error parsing Discord message: {e:?}")))?;
        Ok(message.id)
    }

    async fn edit_status_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        payload: &DisplayPayload,
    ) -> Result<(), Error> {
        let embed = payload_to_embed(payload);
        self.http_client()?
            .update_message(channel_id, message_id)
            .embeds(Some(&[embed]))
            .await
            .map_err(|e| map_edit_error(e, message_id))?;
        Ok(())
    }

    async fn delete_status_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), Error> {
        self.http_client()?
            .delete_message(channel_id, message_id)
            .await
            .map_err(|e| Error::Platform(format!("Error deleting Discord message: {e:?}")))?;
        Ok(())
    }
}
