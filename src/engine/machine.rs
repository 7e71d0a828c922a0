//! Machine façade: current state, worker lifecycle, message intake.

use crate::config::MachineConfig;
use crate::core::{Message, State, StateChange};
use crate::engine::channel::{MessageReceiver, MessageSender};
use crate::engine::dispatch::Dispatcher;
use crate::engine::error::{DispatchError, MachineError};
use crate::engine::hooks::HookRegistry;
use crate::engine::observer::Observers;
use crate::engine::table::TransitionTable;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Everything the worker takes ownership of at start.
pub(crate) struct Configured<S: State, M: Message> {
    pub(crate) table: TransitionTable<S, M>,
    pub(crate) hooks: HookRegistry<S>,
    pub(crate) receiver: MessageReceiver<M>,
}

/// A running (or startable) state machine.
///
/// Built with [`MachineBuilder`](crate::builder::MachineBuilder). All methods
/// take `&self`, so the machine can be shared across producer threads behind
/// an `Arc`. Dropping the machine disposes it.
pub struct Machine<S: State, M: Message> {
    id: Uuid,
    config: MachineConfig,
    sender: MessageSender<M>,
    cancel: CancellationToken,
    committed: Arc<RwLock<Option<S>>>,
    observers: Arc<Observers<S>>,
    configured: Mutex<Option<Configured<S, M>>>,
    worker: Mutex<Option<JoinHandle<Result<(), DispatchError>>>>,
}

impl<S: State, M: Message> Machine<S, M> {
    pub(crate) fn new(
        config: MachineConfig,
        configured: Configured<S, M>,
        sender: MessageSender<M>,
        cancel: CancellationToken,
        observers: Arc<Observers<S>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            sender,
            cancel,
            committed: Arc::new(RwLock::new(None)),
            observers,
            configured: Mutex::new(Some(configured)),
            worker: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Set the initial state and launch the dispatch worker.
    ///
    /// Messages handed to the machine before this call are already queued and
    /// are processed first. A machine starts at most once; a start that fails
    /// to launch the worker leaves the machine startable.
    pub fn start(&self, initial: S) -> Result<(), MachineError> {
        let mut configured = self.configured.lock();
        if configured.is_none() {
            return Err(MachineError::AlreadyStarted);
        }
        let runtime = tokio::runtime::Builder::new_current_thread().build()?;
        let (handoff, pickup) = oneshot::channel::<(Dispatcher<S, M>, MessageReceiver<M>)>();
        let policy = self.config.failure_policy;
        let span = tracing::info_span!("machine", id = %self.id, name = %self.config.name);

        let handle = thread::Builder::new()
            .name(self.config.worker_thread_name())
            .spawn(move || {
                let _entered = span.enter();
                runtime.block_on(async move {
                    let Ok((dispatcher, receiver)) = pickup.await else {
                        tracing::debug!("dispatch worker abandoned before start");
                        return Ok(());
                    };
                    tracing::info!(initial = dispatcher.state().name(), "dispatch worker started");
                    let result = dispatcher.run(receiver, policy).await;
                    tracing::info!(halted = result.is_err(), "dispatch worker stopped");
                    result
                })
            })?;

        // Parts move to the worker only once its thread exists.
        let Some(Configured {
            table,
            hooks,
            receiver,
        }) = configured.take()
        else {
            return Err(MachineError::AlreadyStarted);
        };
        let dispatcher = Dispatcher::new(
            table,
            hooks,
            Arc::clone(&self.observers),
            Arc::clone(&self.committed),
            initial,
        );
        *self.worker.lock() = Some(handle);
        if handoff.send((dispatcher, receiver)).is_err() {
            tracing::error!(id = %self.id, "dispatch worker exited before receiving its state");
        }
        Ok(())
    }

    /// Queue a message for the worker. Never blocks and never runs a
    /// transition on the caller's thread.
    pub fn handle_message(&self, message: M) {
        self.sender.send(message);
    }

    /// A producer handle that outlives borrows of the machine, for threads,
    /// timers, and callbacks.
    pub fn sender(&self) -> MessageSender<M> {
        self.sender.clone()
    }

    /// The latest committed state, `None` before [`start`](Self::start).
    ///
    /// May lag behind a transition that is in flight on the worker; it never
    /// shows a state that was not committed.
    pub fn current_state(&self) -> Option<S> {
        self.committed.read().clone()
    }

    /// Receive every state change committed from now on.
    pub fn subscribe(&self) -> UnboundedReceiver<StateChange<S>> {
        self.observers.subscribe()
    }

    /// Register an observer called on the worker thread after every commit.
    pub fn on_state_changed<F>(&self, observer: F)
    where
        F: Fn(&StateChange<S>) + Send + Sync + 'static,
    {
        self.observers.add(observer);
    }

    /// Ask the worker to stop. Returns immediately; safe to call repeatedly.
    ///
    /// A transition already in progress completes. Queued messages are
    /// abandoned.
    pub fn dispose(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!(id = %self.id, name = %self.config.name, "machine disposed");
            self.cancel.cancel();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// True while the worker is alive and no dispose has been requested.
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
            && self
                .worker
                .lock()
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Block until the worker exits and report why it stopped.
    ///
    /// Must not be called from a callback running on the worker itself.
    /// Joining an already joined machine returns `Ok(())`.
    pub fn join(&self) -> Result<(), MachineError> {
        // Same lock order as `start`, which stores the handle before
        // releasing `configured`.
        let handle = {
            let configured = self.configured.lock();
            let handle = self.worker.lock().take();
            match handle {
                Some(handle) => handle,
                None if configured.is_some() => return Err(MachineError::NotStarted),
                None => return Ok(()),
            }
        };
        match handle.join() {
            Ok(result) => result.map_err(MachineError::from),
            Err(_) => Err(MachineError::WorkerPanicked),
        }
    }
}

impl<S: State, M: Message> Drop for Machine<S, M> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::MachineBuilder;
    use crate::config::MachineConfig;
    use crate::core::State;
    use crate::engine::{MachineError, Transition};
    use std::thread;
    use std::time::Duration;
    use tokio::time::timeout;

    crate::state_enum! {
        enum Phase {
            Ready,
            Working,
            Done,
        }
        final: [Done]
    }

    crate::message_enum! {
        enum Cmd => CmdKind {
            Begin,
            Finish,
        }
    }

    fn machine() -> super::Machine<Phase, Cmd> {
        MachineBuilder::<Phase, Cmd>::new()
            .transition(Transition::new(Phase::Ready, CmdKind::Begin, Phase::Working))
            .unwrap()
            .transition(Transition::new(Phase::Working, CmdKind::Finish, Phase::Done))
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn current_state_is_none_before_start() {
        let machine = machine();
        assert_eq!(machine.current_state(), None);
        assert!(!machine.is_running());
    }

    #[test]
    fn start_sets_initial_state() {
        let machine = machine();
        machine.start(Phase::Ready).unwrap();

        assert_eq!(machine.current_state(), Some(Phase::Ready));
        machine.dispose();
        machine.join().unwrap();
    }

    #[test]
    fn second_start_is_rejected() {
        let machine = machine();
        machine.start(Phase::Ready).unwrap();

        assert!(matches!(
            machine.start(Phase::Working),
            Err(MachineError::AlreadyStarted)
        ));
        assert_eq!(machine.current_state(), Some(Phase::Ready));
    }

    #[test]
    fn join_before_start_is_an_error() {
        let machine = machine();
        assert!(matches!(machine.join(), Err(MachineError::NotStarted)));
    }

    #[tokio::test]
    async fn worker_thread_is_named_from_config() {
        let machine: super::Machine<Phase, Cmd> =
            MachineBuilder::<Phase, Cmd>::with_config(MachineConfig::new("phases"))
                .transition(Transition::new(Phase::Ready, CmdKind::Begin, Phase::Working))
                .unwrap()
                .build()
                .unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        machine.on_state_changed(move |_| {
            let _ = tx.send(std::thread::current().name().map(str::to_string));
        });

        machine.start(Phase::Ready).unwrap();
        machine.handle_message(Cmd::Begin);

        let name = timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(name.as_deref(), Some("phases-dispatch"));
    }

    #[tokio::test]
    async fn messages_sent_before_start_are_processed() {
        let machine = machine();
        let mut changes = machine.subscribe();
        machine.handle_message(Cmd::Begin);

        machine.start(Phase::Ready).unwrap();

        let change = timeout(Duration::from_secs(5), changes.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.pair(), (&Phase::Ready, &Phase::Working));
        assert!(!change.to.is_final());
    }

    #[test]
    fn join_racing_start_waits_for_the_worker() {
        let machine = machine();

        thread::scope(|scope| {
            scope.spawn(|| machine.start(Phase::Ready).unwrap());
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(100));
                machine.dispose();
            });

            loop {
                match machine.join() {
                    Err(MachineError::NotStarted) => thread::yield_now(),
                    other => {
                        other.unwrap();
                        break;
                    }
                }
            }
            assert!(machine.is_disposed());
            assert!(!machine.is_running());
        });
    }

    #[test]
    fn dispose_is_idempotent_and_stops_worker() {
        let machine = machine();
        machine.start(Phase::Ready).unwrap();

        machine.dispose();
        machine.dispose();

        assert!(machine.is_disposed());
        assert!(!machine.is_running());
        machine.join().unwrap();
        machine.join().unwrap();
    }
}
