//! Async driver for a week session
//!
//! One tokio task owns the [`WeekState`]. User commands and network
//! completions are both messages on the same channel, so every transition runs
//! to completion before the next one starts. API calls run as spawned tasks
//! that post their result back; the session decides whether the result is
//! still current.
//!
//! Observers read [`SessionSnapshot`]s from a watch channel. The snapshot is
//! published before a command is acknowledged, so a caller that awaited a
//! command never observes the state from before it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

use crate::api::WeekApi;
use crate::error::{ApiError, TransitionError};
use crate::types::{PublishedWeek, ShiftId, Week};
use crate::week::{self, WeekId};
use crate::week_state::{DeleteRequest, PublishRequest, RequestTag, SessionSnapshot, WeekState};

/// Channel buffer size for session messages
const SESSION_CHANNEL_SIZE: usize = 32;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("Week session has stopped")]
    Closed,
}

#[derive(Debug)]
enum Command {
    OpenCurrentWeek,
    SelectWeek(WeekId),
    Navigate(i64),
    Reload,
    Publish,
    RequestDelete(ShiftId),
    CancelDelete,
    ConfirmDelete,
    DeleteRow(ShiftId),
}

enum Message {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<(), TransitionError>>,
    },
    Fetched {
        tag: RequestTag,
        result: Result<Week, ApiError>,
    },
    Published {
        tag: RequestTag,
        result: Result<PublishedWeek, ApiError>,
    },
    Deleted {
        request: DeleteRequest,
        result: Result<(), ApiError>,
    },
}

/// Handle to a running week session.
#[derive(Clone)]
pub struct WeekController {
    sender: mpsc::Sender<Message>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl WeekController {
    /// Start a session task on the current tokio runtime.
    pub fn spawn(api: Arc<dyn WeekApi>) -> Self {
        Self::spawn_with_clock(api, Arc::new(Utc::now))
    }

    pub fn spawn_with_clock(api: Arc<dyn WeekApi>, clock: Clock) -> Self {
        let (sender, receiver) = mpsc::channel(SESSION_CHANNEL_SIZE);
        let (snapshot_tx, snapshot) = watch::channel(SessionSnapshot::default());

        let actor = SessionActor {
            api,
            clock,
            state: WeekState::new(),
            sender: sender.downgrade(),
            snapshot: snapshot_tx,
        };
        tokio::spawn(actor.run(receiver));

        Self { sender, snapshot }
    }

    /// Select the week containing "now".
    pub async fn open_current_week(&self) -> Result<(), ControllerError> {
        self.send(Command::OpenCurrentWeek).await
    }

    pub async fn select_week(&self, id: WeekId) -> Result<(), ControllerError> {
        self.send(Command::SelectWeek(id)).await
    }

    pub async fn navigate(&self, delta: i64) -> Result<(), ControllerError> {
        self.send(Command::Navigate(delta)).await
    }

    pub async fn reload(&self) -> Result<(), ControllerError> {
        self.send(Command::Reload).await
    }

    pub async fn publish(&self) -> Result<(), ControllerError> {
        self.send(Command::Publish).await
    }

    pub async fn request_delete(&self, id: ShiftId) -> Result<(), ControllerError> {
        self.send(Command::RequestDelete(id)).await
    }

    pub async fn cancel_delete(&self) -> Result<(), ControllerError> {
        self.send(Command::CancelDelete).await
    }

    pub async fn confirm_delete(&self) -> Result<(), ControllerError> {
        self.send(Command::ConfirmDelete).await
    }

    pub async fn delete_row(&self, id: ShiftId) -> Result<(), ControllerError> {
        self.send(Command::DeleteRow(id)).await
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Wait until no fetch, publish or delete is in flight.
    pub async fn settled(&self) -> Result<SessionSnapshot, ControllerError> {
        let mut receiver = self.snapshot.clone();
        let snapshot = receiver
            .wait_for(|s| !s.is_loading && !s.is_publishing && !s.is_deleting)
            .await
            .map_err(|_| ControllerError::Closed)?;
        Ok(snapshot.clone())
    }

    async fn send(&self, command: Command) -> Result<(), ControllerError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Message::Command { command, reply })
            .await
            .map_err(|_| ControllerError::Closed)?;
        response.await.map_err(|_| ControllerError::Closed)??;
        Ok(())
    }
}

struct SessionActor {
    api: Arc<dyn WeekApi>,
    clock: Clock,
    state: WeekState,
    // Weak so the loop ends once every handle and in-flight request is gone
    sender: mpsc::WeakSender<Message>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl SessionActor {
    async fn run(mut self, mut receiver: mpsc::Receiver<Message>) {
        while let Some(message) = receiver.recv().await {
            match message {
                Message::Command { command, reply } => {
                    let result = self.handle_command(command);
                    self.publish_snapshot();
                    // Caller may have gone away; the transition still stands
                    let _ = reply.send(result);
                }
                Message::Fetched { tag, result } => {
                    self.state.resolve_fetch(tag, result);
                    self.publish_snapshot();
                }
                Message::Published { tag, result } => {
                    self.state.resolve_publish(tag, result);
                    self.publish_snapshot();
                }
                Message::Deleted { request, result } => {
                    self.state.resolve_delete(&request, result);
                    self.publish_snapshot();
                }
            }
        }
        log::debug!("week session stopped");
    }

    fn handle_command(&mut self, command: Command) -> Result<(), TransitionError> {
        log::debug!("week session command: {:?}", command);
        let result = match command {
            Command::OpenCurrentWeek => {
                let id = week::current_week_id((self.clock)());
                let tag = self.state.select_week(id);
                self.spawn_fetch(tag);
                Ok(())
            }
            Command::SelectWeek(id) => {
                let tag = self.state.select_week(id);
                self.spawn_fetch(tag);
                Ok(())
            }
            Command::Navigate(delta) => self.state.navigate(delta).map(|tag| self.spawn_fetch(tag)),
            Command::Reload => self.state.reload().map(|tag| self.spawn_fetch(tag)),
            Command::Publish => {
                let now = (self.clock)();
                self.state
                    .begin_publish(now)
                    .map(|request| self.spawn_publish(request))
            }
            Command::RequestDelete(id) => self.state.request_delete(id),
            Command::CancelDelete => self.state.cancel_delete(),
            Command::ConfirmDelete => self.state.begin_delete().map(|request| self.spawn_delete(request)),
            Command::DeleteRow(id) => self.state.delete_row(id).map(|request| self.spawn_delete(request)),
        };

        if let Err(err) = &result {
            log::debug!("week session rejected command: {}", err);
        }
        result
    }

    fn publish_snapshot(&self) {
        self.snapshot.send_replace(self.state.snapshot());
    }

    fn spawn_fetch(&self, tag: RequestTag) {
        let Some(sender) = self.sender.upgrade() else {
            return;
        };
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            let result = api.get_week_by_id(tag.week_id).await;
            let _ = sender.send(Message::Fetched { tag, result }).await;
        });
    }

    fn spawn_publish(&self, request: PublishRequest) {
        let Some(sender) = self.sender.upgrade() else {
            return;
        };
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            let result = api.publish_week(&request.payload).await;
            let _ = sender
                .send(Message::Published {
                    tag: request.tag,
                    result,
                })
                .await;
        });
    }

    fn spawn_delete(&self, request: DeleteRequest) {
        let Some(sender) = self.sender.upgrade() else {
            return;
        };
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            let result = api.delete_shift_by_id(&request.shift_id).await;
            let _ = sender.send(Message::Deleted { request, result }).await;
        });
    }
}
