//! Reference machine: a connection and signal detector.
//!
//! The detector waits for a device to connect, then searches for a signal
//! strong enough to count as found. Two timers bound the waiting: a
//! connection timer while detecting or reconnecting, and a search timer while
//! connected. Timer expiry arrives as an ordinary message, so a timeout that
//! fires after the machine has moved on simply finds no transition.
//!
//! ```text
//!  Idle ──Start──▶ Detecting ──Connected──▶ Detected ──Signal(n ≥ threshold)──▶ Found
//!                     │                      │   ▲
//!          ConnectionTimeout      Disconnected   Connected
//!                     │                      ▼   │
//!                     ▼                        Lost ──ConnectionTimeout──▶ NotFound
//!                 NotFound ◀────SearchTimeout────┘ (from Detected or Lost)
//! ```
//!
//! `Abort` returns Detecting, Detected, and Lost to Idle. `Start` restarts
//! detection from Idle, Found, or NotFound.

mod timer;

pub use timer::{ThreadTimer, TimerId, TimerService};

use crate::builder::{ConfigError, MachineBuilder};
use crate::config::MachineConfig;
use crate::engine::{Machine, MachineError, MessageSender, Transition};
use crate::{message_enum, state_enum};
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

state_enum! {
    pub enum DetectorState {
        Idle,
        Detecting,
        Detected,
        Lost,
        Found,
        NotFound,
    }
    final: [Found, NotFound]
}

message_enum! {
    pub enum DetectorMessage => DetectorMessageKind {
        Start,
        Connected,
        Disconnected,
        /// Signal strength reading, 0..=255
        Signal(u8),
        ConnectionTimeout,
        SearchTimeout,
        Abort,
    }
}

/// Tunables of the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub connection_timeout_ms: u64,
    pub search_timeout_ms: u64,
    /// Minimum signal strength that counts as found
    pub signal_threshold: u8,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            connection_timeout_ms: 5_000,
            search_timeout_ms: 10_000,
            signal_threshold: 50,
        }
    }
}

impl DetectorSettings {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }
}

/// Errors assembling a detector.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to start timer service: {0}")]
    Timers(#[from] io::Error),
}

/// The detector machine together with its timer service.
pub struct Detector<T: TimerService> {
    machine: Machine<DetectorState, DetectorMessage>,
    timers: Arc<T>,
}

impl<T: TimerService> Detector<T> {
    /// Assemble the detector. `make_timers` receives the machine's producer
    /// handle so a real timer service can deliver expiries.
    pub fn new<F>(
        config: MachineConfig,
        settings: DetectorSettings,
        make_timers: F,
    ) -> Result<Self, DetectorError>
    where
        F: FnOnce(MessageSender<DetectorMessage>) -> io::Result<T>,
    {
        let builder = MachineBuilder::with_config(config);
        let timers = Arc::new(make_timers(builder.sender())?);
        let builder = register_transitions(builder, &settings)?;
        let builder = register_hooks(builder, &settings, &timers)?;

        Ok(Self {
            machine: builder.build()?,
            timers,
        })
    }

    /// Start in [`DetectorState::Idle`].
    pub fn start(&self) -> Result<(), MachineError> {
        self.machine.start(DetectorState::Idle)
    }

    pub fn machine(&self) -> &Machine<DetectorState, DetectorMessage> {
        &self.machine
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }
}

type Builder = MachineBuilder<DetectorState, DetectorMessage>;

fn register_transitions(
    mut builder: Builder,
    settings: &DetectorSettings,
) -> Result<Builder, ConfigError> {
    use DetectorMessageKind as Kind;
    use DetectorState::*;

    let threshold = settings.signal_threshold;
    let rules = [
        (Idle, Kind::Start, Detecting),
        (Found, Kind::Start, Detecting),
        (NotFound, Kind::Start, Detecting),
        (Detecting, Kind::Connected, Detected),
        (Detecting, Kind::ConnectionTimeout, NotFound),
        (Detected, Kind::Disconnected, Lost),
        (Detected, Kind::SearchTimeout, NotFound),
        (Lost, Kind::Connected, Detected),
        (Lost, Kind::ConnectionTimeout, NotFound),
        (Lost, Kind::SearchTimeout, NotFound),
        (Detecting, Kind::Abort, Idle),
        (Detected, Kind::Abort, Idle),
        (Lost, Kind::Abort, Idle),
    ];
    for (from, on, to) in rules {
        builder.add_transition(Transition::new(from, on, to))?;
    }

    builder.add_transition(
        Transition::<DetectorState, DetectorMessage>::new(Detected, Kind::Signal, Found)
            .when(move |m| matches!(m, DetectorMessage::Signal(strength) if *strength >= threshold))
            .effect(|m| tracing::info!(message = ?m, "signal found")),
    )?;

    Ok(builder)
}

fn register_hooks<T: TimerService>(
    builder: Builder,
    settings: &DetectorSettings,
    timers: &Arc<T>,
) -> Result<Builder, ConfigError> {
    use DetectorState::*;

    let connection = settings.connection_timeout();
    let search = settings.search_timeout();
    let arm_connection = |timers: Arc<T>| {
        move |_: &DetectorState| {
            timers.arm(TimerId::Connection, connection, DetectorMessage::ConnectionTimeout)
        }
    };
    let disarm_connection =
        |timers: Arc<T>| move |_: &DetectorState| timers.disarm(TimerId::Connection);

    let search_arm = Arc::clone(timers);
    let search_disarm = Arc::clone(timers);
    let lost_leave = Arc::clone(timers);

    builder
        .on_entering(Detecting, arm_connection(Arc::clone(timers)))?
        .on_leaving(Detecting, disarm_connection(Arc::clone(timers)))?
        .on_entering(Lost, arm_connection(Arc::clone(timers)))?
        // The search keeps running through a reconnect.
        .on_entering(Detected, move |from| {
            if *from != Lost {
                search_arm.arm(TimerId::Search, search, DetectorMessage::SearchTimeout);
            }
        })?
        .on_leaving(Detected, move |to| {
            if *to != Lost {
                search_disarm.disarm(TimerId::Search);
            }
        })?
        .on_leaving(Lost, move |to| {
            lost_leave.disarm(TimerId::Connection);
            if *to != Detected {
                lost_leave.disarm(TimerId::Search);
            }
        })
}
