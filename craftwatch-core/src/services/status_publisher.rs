// File: src/services/status_publisher.rs
//
// Keeps at most one live status message per destination channel in sync
// with the latest cycle's payload. The platform is reached through the
// `StatusMessenger` seam so tests can script it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use twilight_model::id::marker::{ChannelMarker, MessageMarker};
use twilight_model::id::Id;

use crate::models::DisplayPayload;
use crate::Error;

/// Outbound message operations the publisher needs from the chat platform.
#[async_trait]
pub trait StatusMessenger: Send + Sync {
    /// Confirms the destination is reachable; `None` means skip it this
    /// cycle.
    async fn resolve_channel(
        &self,
        channel_id: Id<ChannelMarker>,
    ) -> Option<Id<ChannelMarker>>;

    async fn create_status_message(
        &self,
        channel_id: Id<ChannelMarker>,
        payload: &DisplayPayload,
    ) -> Result<Id<MessageMarker>, Error>;

    /// Must fail with [`Error::UnknownMessage`] when the target message no
    /// longer exists, so the publisher can fall back to creating a new one.
    async fn edit_status_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        payload: &DisplayPayload,
    ) -> Result<(), Error>;

    async fn delete_status_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), Error>;
}

/// Lifecycle of the one live message a destination may hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageState {
    #[default]
    Absent,
    Live(Id<MessageMarker>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedMessage {
    pub channel_id: Id<ChannelMarker>,
    pub state: MessageState,
}

pub struct StatusPublisher {
    messenger: Arc<dyn StatusMessenger>,
    /// Mutated only from within a cycle; cycles are serialized by the
    /// scheduler.
    tracked: Mutex<Vec<TrackedMessage>>,
}

impl StatusPublisher {
    pub fn new(
        messenger: Arc<dyn StatusMessenger>,
        destinations: Vec<Id<ChannelMarker>>,
    ) -> Self {
        let tracked = destinations
            .into_iter()
            .map(|channel_id| TrackedMessage {
                channel_id,
                state: MessageState::Absent,
            })
            .collect();
        Self {
            messenger,
            tracked: Mutex::new(tracked),
        }
    }

    /// Pushes `payload` to every destination. Per-destination failures are
    /// logged and never abort the rest of the cycle.
    pub async fn publish(&self, payload: &DisplayPayload) {
        let mut tracked = self.tracked.lock().await;
        for dest in tracked.iter_mut() {
            if self
                .messenger
                .resolve_channel(dest.channel_id)
                .await
                .is_none()
            {
                warn!(
                    "channel {} is unresolvable, skipping this cycle",
                    dest.channel_id
                );
                continue;
            }

            match dest.state {
                MessageState::Absent => match self
                    .messenger
                    .create_status_message(dest.channel_id, payload)
                    .await
                {
                    Ok(message_id) => {
                        info!(
                            "created status message {message_id} in channel {}",
                            dest.channel_id
                        );
                        dest.state = MessageState::Live(message_id);
                    }
                    Err(e) => {
                        error!(
                            "failed to create status message in channel {}: {e}",
                            dest.channel_id
                        );
                    }
                },
                MessageState::Live(message_id) => {
                    match self
                        .messenger
                        .edit_status_message(dest.channel_id, message_id, payload)
                        .await
                    {
                        Ok(()) => {}
                        Err(e) if e.is_unknown_message() => {
                            warn!(
                                "status message {message_id} in channel {} is gone, creating a replacement",
                                dest.channel_id
                            );
                            match self
                                .messenger
                                .create_status_message(dest.channel_id, payload)
                                .await
                            {
                                Ok(new_id) => dest.state = MessageState::Live(new_id),
                                Err(e) => {
                                    error!(
                                        "failed to recreate status message in channel {}: {e}",
                                        dest.channel_id
                                    );
                                    dest.state = MessageState::Absent;
                                }
                            }
                        }
                        Err(e) => {
                            // Transient failure: keep the handle, retry on
                            // the next cycle.
                            warn!(
                                "failed to edit status message {message_id} in channel {}: {e}",
                                dest.channel_id
                            );
                        }
                    }
                }
            }
        }
    }

    /// Deletes every tracked live message. Best-effort: failures are
    /// logged, never fatal.
    pub async fn teardown(&self) {
        let mut tracked = self.tracked.lock().await;
        for dest in tracked.iter_mut() {
            if let MessageState::Live(message_id) = dest.state {
                match self
                    .messenger
                    .delete_status_message(dest.channel_id, message_id)
                    .await
                {
                    Ok(()) => {
                        info!(
                            "deleted status message {message_id} in channel {}",
                            dest.channel_id
                        );
                    }
                    Err(e) => {
                        warn!(
                            "failed to delete status message {message_id} in channel {}: {e}",
                            dest.channel_id
                        );
                    }
                }
                dest.state = MessageState::Absent;
            }
        }
    }

    /// Snapshot of the tracked-message table, mainly for tests and
    /// diagnostics.
    pub async fn tracked(&self) -> Vec<TrackedMessage> {
        self.tracked.lock().await.clone()
    }
}
