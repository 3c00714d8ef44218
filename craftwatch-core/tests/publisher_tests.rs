//! tests/publisher_tests.rs
//!
//! Exercises the tracked-message lifecycle against a scripted messenger:
//! create-then-edit, the unknown-message fallback, transient failures, and
//! teardown.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use craftwatch_core::models::{ColorState, DisplayPayload};
use craftwatch_core::services::status_publisher::{
    MessageState, StatusMessenger, StatusPublisher,
};
use craftwatch_core::Error;
use twilight_model::id::marker::{ChannelMarker, MessageMarker};
use twilight_model::id::Id;

// ---------- Scripted messenger ----------

struct ScriptedMessenger {
    next_message_id: AtomicU64,
    created: Mutex<Vec<(u64, u64)>>,
    edited: Mutex<Vec<(u64, u64)>>,
    deleted: Mutex<Vec<(u64, u64)>>,
    unresolvable: Vec<u64>,
    /// Outcomes for upcoming edits; empty queue means edits succeed.
    edit_script: Mutex<VecDeque<Result<(), Error>>>,
}

impl ScriptedMessenger {
    fn new() -> Self {
        Self {
            next_message_id: AtomicU64::new(1000),
            created: Mutex::new(vec![]),
            edited: Mutex::new(vec![]),
            deleted: Mutex::new(vec![]),
            unresolvable: vec![],
            edit_script: Mutex::new(VecDeque::new()),
        }
    }

    fn with_unresolvable(mut self, channel_id: u64) -> Self {
        self.unresolvable.push(channel_id);
        self
    }

    fn script_edit(&self, outcome: Result<(), Error>) {
        self.edit_script.lock().unwrap().push_back(outcome);
    }

    fn created(&self) -> Vec<(u64, u64)> {
        self.created.lock().unwrap().clone()
    }

    fn edited(&self) -> Vec<(u64, u64)> {
        self.edited.lock().unwrap().clone()
    }

    fn deleted(&self) -> Vec<(u64, u64)> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusMessenger for ScriptedMessenger {
    async fn resolve_channel(
        &self,
        channel_id: Id<ChannelMarker>,
    ) -> Option<Id<ChannelMarker>> {
        if self.unresolvable.contains(&channel_id.get()) {
            None
        } else {
            Some(channel_id)
        }
    }

    async fn create_status_message(
        &self,
        channel_id: Id<ChannelMarker>,
        _payload: &DisplayPayload,
    ) -> Result<Id<MessageMarker>, Error> {
        let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.created.lock().unwrap().push((channel_id.get(), id));
        Ok(Id::new(id))
    }

    async fn edit_status_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
        _payload: &DisplayPayload,
    ) -> Result<(), Error> {
        self.edited
            .lock()
            .unwrap()
            .push((channel_id.get(), message_id.get()));
        match self.edit_script.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(()),
        }
    }

    async fn delete_status_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Result<(), Error> {
        self.deleted
            .lock()
            .unwrap()
            .push((channel_id.get(), message_id.get()));
        Ok(())
    }
}

fn payload() -> DisplayPayload {
    DisplayPayload {
        title: "🌐 Server Status".to_string(),
        description: "Current connection status per server".to_string(),
        color_state: ColorState::AllOnline,
        fields: vec![("Next update".to_string(), "<t:0:R>".to_string())],
        next_refresh_epoch: 0,
    }
}

fn live_id(state: MessageState) -> u64 {
    match state {
        MessageState::Live(id) => id.get(),
        MessageState::Absent => panic!("expected a live tracked message"),
    }
}

// ---------- Tests ----------

#[tokio::test]
async fn first_publish_creates_then_edits_in_place() {
    let messenger = Arc::new(ScriptedMessenger::new());
    let publisher = StatusPublisher::new(messenger.clone(), vec![Id::new(10)]);

    // 1) No tracked handle yet: exactly one message is created.
    publisher.publish(&payload()).await;
    assert_eq!(messenger.created().len(), 1);
    let (channel, message) = messenger.created()[0];
    assert_eq!(channel, 10);
    assert_eq!(live_id(publisher.tracked().await[0].state), message);

    // 2) Subsequent publishes edit that same message, never create again.
    publisher.publish(&payload()).await;
    publisher.publish(&payload()).await;
    assert_eq!(messenger.created().len(), 1);
    assert_eq!(messenger.edited(), vec![(10, message), (10, message)]);
}

#[tokio::test]
async fn stale_handle_is_replaced_by_a_new_message() {
    let messenger = Arc::new(ScriptedMessenger::new());
    let publisher = StatusPublisher::new(messenger.clone(), vec![Id::new(10)]);

    publisher.publish(&payload()).await;
    let first = live_id(publisher.tracked().await[0].state);

    // 1) Simulate external deletion: the next edit reports unknown message.
    messenger.script_edit(Err(Error::UnknownMessage(first.to_string())));
    publisher.publish(&payload()).await;

    // 2) A replacement was created and the handle swapped — no duplicates.
    assert_eq!(messenger.created().len(), 2);
    let second = live_id(publisher.tracked().await[0].state);
    assert_ne!(first, second);

    // 3) Later publishes edit the replacement.
    publisher.publish(&payload()).await;
    assert_eq!(messenger.created().len(), 2);
    assert_eq!(messenger.edited().last(), Some(&(10, second)));
}

#[tokio::test]
async fn transient_edit_failure_keeps_the_handle() {
    let messenger = Arc::new(ScriptedMessenger::new());
    let publisher = StatusPublisher::new(messenger.clone(), vec![Id::new(10)]);

    publisher.publish(&payload()).await;
    let message = live_id(publisher.tracked().await[0].state);

    // 1) Rate-limit style failure: no fallback create, handle unchanged.
    messenger.script_edit(Err(Error::Platform("rate limited".into())));
    publisher.publish(&payload()).await;
    assert_eq!(messenger.created().len(), 1);
    assert_eq!(live_id(publisher.tracked().await[0].state), message);

    // 2) The natural retry on the next cycle edits the same message.
    publisher.publish(&payload()).await;
    assert_eq!(messenger.edited().last(), Some(&(10, message)));
}

#[tokio::test]
async fn unresolvable_destination_is_skipped_without_failing_others() {
    let messenger = Arc::new(ScriptedMessenger::new().with_unresolvable(10));
    let publisher =
        StatusPublisher::new(messenger.clone(), vec![Id::new(10), Id::new(20)]);

    publisher.publish(&payload()).await;

    // Only the resolvable channel got a message.
    assert_eq!(messenger.created().len(), 1);
    assert_eq!(messenger.created()[0].0, 20);

    let tracked = publisher.tracked().await;
    assert_eq!(tracked[0].state, MessageState::Absent);
    assert!(matches!(tracked[1].state, MessageState::Live(_)));
}

#[tokio::test]
async fn teardown_deletes_every_live_message_once() {
    let messenger = Arc::new(ScriptedMessenger::new());
    let publisher =
        StatusPublisher::new(messenger.clone(), vec![Id::new(10), Id::new(20)]);

    publisher.publish(&payload()).await;
    assert_eq!(messenger.created().len(), 2);

    publisher.teardown().await;
    assert_eq!(messenger.deleted().len(), 2);
    for dest in publisher.tracked().await {
        assert_eq!(dest.state, MessageState::Absent);
    }

    // Teardown is idempotent: nothing left to delete.
    publisher.teardown().await;
    assert_eq!(messenger.deleted().len(), 2);
}
