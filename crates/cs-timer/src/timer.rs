use cs_core::Tick;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::{TimerError, TimerResult};

struct TimerState {
    clock:        Tick,
    participants: usize,
    arrived:      usize,
    stopped:      bool,
}

/// N-party barrier around a shared tick counter.
///
/// Invariants (held under the lock): `arrived < participants` between
/// rounds, and `clock` increments exactly once per completed round.
pub struct Timer {
    id:    String,
    state: Mutex<TimerState>,
    round: Condvar,
}

impl Timer {
    /// Create a timer at `T0`.  A participant count of 0 is allowed here so
    /// the count can be fixed later with [`set_participants`][Self::set_participants];
    /// `sync` rejects it.
    pub fn new(id: impl Into<String>, participants: usize) -> Self {
        Self {
            id:    id.into(),
            state: Mutex::new(TimerState {
                clock: Tick::ZERO,
                participants,
                arrived: 0,
                stopped: false,
            }),
            round: Condvar::new(),
        }
    }

    /// Arrive at the current round and wait for the others.
    ///
    /// Returns the clock value after the round completes.
    pub fn sync(&self) -> TimerResult<Tick> {
        let mut state = self.state.lock();
        if state.stopped {
            return Err(TimerError::Stopped(self.id.clone()));
        }
        if state.participants == 0 {
            return Err(TimerError::NoParticipants(self.id.clone()));
        }
        if state.arrived >= state.participants {
            warn!(timer = %self.id, arrived = state.arrived + 1, participants = state.participants,
                  "too many arrivals in one round");
            return Err(TimerError::Oversubscribed {
                id:           self.id.clone(),
                arrived:      state.arrived + 1,
                participants: state.participants,
            });
        }

        state.arrived += 1;
        if state.arrived == state.participants {
            state.arrived = 0;
            state.clock = state.clock.next();
            trace!(timer = %self.id, clock = %state.clock, "round complete");
            self.round.notify_all();
            return Ok(state.clock);
        }

        let start = state.clock;
        self.round.wait_while(&mut state, |s| s.clock == start && !s.stopped);
        if state.clock == start {
            return Err(TimerError::Stopped(self.id.clone()));
        }
        Ok(state.clock)
    }

    /// Terminate the clock and release every blocked participant.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if !state.stopped {
            state.stopped = true;
            debug!(timer = %self.id, clock = %state.clock, waiting = state.arrived, "timer stopped");
        }
        self.round.notify_all();
    }

    /// Snapshot of the current clock.
    pub fn clock(&self) -> Tick {
        self.state.lock().clock
    }

    /// Change the participant count.  Only meaningful between rounds.
    pub fn set_participants(&self, participants: usize) {
        let mut state = self.state.lock();
        if state.arrived != 0 {
            warn!(timer = %self.id, arrived = state.arrived, "participant count changed mid-round");
        }
        state.participants = participants;
    }

    pub fn participants(&self) -> usize {
        self.state.lock().participants
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("clock", &state.clock)
            .field("participants", &state.participants)
            .field("arrived", &state.arrived)
            .field("stopped", &state.stopped)
            .finish()
    }
}
