//! Unbounded, cancellable message queue between producers and the worker.

use crate::core::Message;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// What the worker got back from [`MessageReceiver::receive`].
#[derive(Debug)]
pub enum Received<M> {
    Message(M),
    Cancelled,
}

/// Producer half. Cheap to clone; safe to use from any thread, including
/// from inside callbacks running on the worker.
#[derive(Debug)]
pub struct MessageSender<M: Message> {
    inner: UnboundedSender<M>,
}

impl<M: Message> Clone for MessageSender<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M: Message> MessageSender<M> {
    /// Enqueue a message. Never blocks.
    ///
    /// Once the worker has stopped the message is dropped.
    pub fn send(&self, message: M) {
        if let Err(rejected) = self.inner.send(message) {
            tracing::debug!(message = ?rejected.0, "machine stopped, message dropped");
        }
    }

    /// True once the consuming side has gone away.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// Consumer half, owned by the single worker.
pub struct MessageReceiver<M: Message> {
    inner: UnboundedReceiver<M>,
    cancel: CancellationToken,
}

impl<M: Message> MessageReceiver<M> {
    /// Wait for the next message or for cancellation.
    ///
    /// Cancellation wins over queued messages: once the token is cancelled no
    /// further message is handed out. The channel can only run dry when every
    /// sender is gone, which is treated as cancellation too.
    pub async fn receive(&mut self) -> Received<M> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Received::Cancelled,
            message = self.inner.recv() => match message {
                Some(message) => Received::Message(message),
                None => Received::Cancelled,
            },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop accepting messages; anything still queued is dropped with the
    /// receiver.
    pub fn close(&mut self) {
        self.inner.close();
    }
}

/// Create a channel whose receive side observes `cancel`.
pub fn channel<M: Message>(cancel: CancellationToken) -> (MessageSender<M>, MessageReceiver<M>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        MessageSender { inner: tx },
        MessageReceiver { inner: rx, cancel },
    )
}
