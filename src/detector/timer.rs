//! Timer collaborator for the detector machine.
//!
//! The engine has no notion of time. Delayed self-messages come from a timer
//! service that calls back into the machine's queue once a delay expires.

use super::DetectorMessage;
use crate::engine::MessageSender;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

/// The detector's named timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Bounds how long the detector waits for a connection
    Connection,
    /// Bounds how long a connected detector searches for a signal
    Search,
}

/// Something that can deliver a message after a delay.
///
/// Arming a timer that is already armed restarts it. Disarming a timer that
/// is not armed does nothing.
pub trait TimerService: Send + Sync + 'static {
    fn arm(&self, timer: TimerId, delay: Duration, message: DetectorMessage);
    fn disarm(&self, timer: TimerId);
}

/// Timer service backed by its own one-worker tokio runtime.
///
/// Each armed timer is one sleeping task. Re-arming or disarming aborts the
/// task, so at most one task per [`TimerId`] is alive at a time.
pub struct ThreadTimer {
    sender: MessageSender<DetectorMessage>,
    runtime: Option<Runtime>,
    handle: Handle,
    tasks: Mutex<HashMap<TimerId, JoinHandle<()>>>,
}

impl ThreadTimer {
    pub fn new(sender: MessageSender<DetectorMessage>) -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("detector-timers")
            .enable_time()
            .build()?;
        let handle = runtime.handle().clone();
        Ok(Self {
            sender,
            runtime: Some(runtime),
            handle,
            tasks: Mutex::new(HashMap::new()),
        })
    }

    /// Number of timers whose task has not finished yet.
    pub fn pending(&self) -> usize {
        self.tasks
            .lock()
            .values()
            .filter(|task| !task.is_finished())
            .count()
    }
}

impl TimerService for ThreadTimer {
    fn arm(&self, timer: TimerId, delay: Duration, message: DetectorMessage) {
        let sender = self.sender.clone();
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!(?timer, "timer expired");
            sender.send(message);
        });

        if let Some(previous) = self.tasks.lock().insert(timer, task) {
            previous.abort();
        }
    }

    fn disarm(&self, timer: TimerId) {
        if let Some(task) = self.tasks.lock().remove(&timer) {
            task.abort();
            tracing::trace!(?timer, "timer disarmed");
        }
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        // Does not block, so the timer may be dropped inside another runtime.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Message;
    use crate::detector::DetectorMessageKind;
    use crate::engine::channel::{self, Received};
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn armed_timer_delivers_message() {
        let (tx, mut rx) = channel::channel(CancellationToken::new());
        let timers = ThreadTimer::new(tx).unwrap();

        timers.arm(TimerId::Search, Duration::from_millis(10), DetectorMessage::SearchTimeout);

        match timeout(Duration::from_secs(5), rx.receive()).await.unwrap() {
            Received::Message(message) => {
                assert_eq!(message.kind(), DetectorMessageKind::SearchTimeout)
            }
            Received::Cancelled => panic!("Expected timeout message"),
        }
    }

    #[tokio::test]
    async fn disarmed_timer_stays_silent() {
        let (tx, mut rx) = channel::channel(CancellationToken::new());
        let timers = ThreadTimer::new(tx).unwrap();

        timers.arm(
            TimerId::Connection,
            Duration::from_millis(20),
            DetectorMessage::ConnectionTimeout,
        );
        timers.disarm(TimerId::Connection);

        let waited = timeout(Duration::from_millis(150), rx.receive()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn rearming_discards_earlier_arm() {
        let (tx, mut rx) = channel::channel(CancellationToken::new());
        let timers = ThreadTimer::new(tx).unwrap();

        timers.arm(TimerId::Search, Duration::from_millis(10), DetectorMessage::Abort);
        timers.arm(TimerId::Search, Duration::from_millis(60), DetectorMessage::SearchTimeout);

        match timeout(Duration::from_secs(5), rx.receive()).await.unwrap() {
            Received::Message(message) => {
                assert_eq!(message.kind(), DetectorMessageKind::SearchTimeout)
            }
            Received::Cancelled => panic!("Expected timeout message"),
        }
    }

    #[tokio::test]
    async fn flapping_keeps_one_task_per_timer() {
        let (tx, _rx) = channel::channel(CancellationToken::new());
        let timers = ThreadTimer::new(tx).unwrap();

        for _ in 0..100 {
            timers.arm(
                TimerId::Connection,
                Duration::from_secs(60),
                DetectorMessage::ConnectionTimeout,
            );
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(timers.pending(), 1);

        timers.disarm(TimerId::Connection);
        assert_eq!(timers.pending(), 0);
    }
}
