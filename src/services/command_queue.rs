//! Serial execution of mutating calls to the venue backend.
//!
//! Each command carries its idempotency key and a boxed future holding both the
//! backend call and its continuations. The worker runs commands one at a time in
//! submission order, so a position resolved inside a command is still valid when
//! the call leaves.

use futures::future::BoxFuture;
use tokio::{
    sync::{mpsc, oneshot},
    task::AbortHandle,
};
use tracing::{debug, warn};

use crate::dao::{
    models::IdempotencyKey,
    remote::{RemoteError, RemoteResult},
};

/// Backend call plus continuations, executed by the command worker.
pub type CommandWork = BoxFuture<'static, RemoteResult<()>>;

struct Command {
    label: &'static str,
    key: IdempotencyKey,
    work: CommandWork,
    reply: Option<oneshot::Sender<RemoteResult<()>>>,
}

/// Handle to the single worker draining mutating commands.
pub struct CommandQueue {
    sender: mpsc::UnboundedSender<Command>,
    worker: AbortHandle,
}

/// Receipt for a submitted command.
pub struct CommandTicket {
    /// Idempotency key sent with the command.
    pub key: IdempotencyKey,
    receiver: oneshot::Receiver<RemoteResult<()>>,
}

impl CommandTicket {
    /// Wait for the command to run and return its outcome.
    pub async fn outcome(self) -> RemoteResult<()> {
        self.receiver.await.unwrap_or_else(|err| {
            Err(RemoteError::unavailable(
                "command worker stopped before running the command".into(),
                err,
            ))
        })
    }
}

impl CommandQueue {
    /// Spawn the worker on the current runtime.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(receiver)).abort_handle();
        Self { sender, worker }
    }

    /// Enqueue `work` and return a ticket resolving to its outcome.
    pub fn submit(
        &self,
        label: &'static str,
        key: IdempotencyKey,
        work: CommandWork,
    ) -> CommandTicket {
        let (reply, receiver) = oneshot::channel();
        self.enqueue(Command {
            label,
            key,
            work,
            reply: Some(reply),
        });
        CommandTicket { key, receiver }
    }

    /// Enqueue `work` without waiting for it; the worker logs its outcome.
    pub fn dispatch(&self, label: &'static str, key: IdempotencyKey, work: CommandWork) {
        self.enqueue(Command {
            label,
            key,
            work,
            reply: None,
        });
    }

    /// Stop the worker. Commands still queued are dropped.
    pub fn shutdown(&self) {
        self.worker.abort();
    }

    fn enqueue(&self, command: Command) {
        if let Err(err) = self.sender.send(command) {
            let command = err.0;
            warn!(
                command = command.label,
                key = %command.key,
                "command worker is gone; dropping command"
            );
        }
    }
}

async fn run_worker(mut receiver: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = receiver.recv().await {
        let Command {
            label,
            key,
            work,
            reply,
        } = command;

        let outcome = work.await;
        match &outcome {
            Ok(()) => debug!(command = label, key = %key, "command succeeded"),
            Err(err) if err.is_not_found() => {
                warn!(command = label, key = %key, error = %err, "command target not found")
            }
            Err(err) => warn!(command = label, key = %key, error = %err, "command failed"),
        }

        if let Some(reply) = reply {
            let _ = reply.send(outcome);
        }
    }
}
