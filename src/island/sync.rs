//! Worker synchronisation primitives
//!
//! A start barrier that releases every island worker at once and reports the
//! shared release instant, and a cancellation flag checked between epochs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    released_at: Option<Instant>,
    aborted: bool,
}

/// Generation-counted rendezvous for a fixed number of workers
#[derive(Debug)]
pub struct StartBarrier {
    parties: usize,
    state: Mutex<BarrierState>,
    condvar: Condvar,
}

impl StartBarrier {
    /// Create a barrier for `parties` workers
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            state: Mutex::new(BarrierState::default()),
            condvar: Condvar::new(),
        }
    }

    /// Block until all parties have arrived
    ///
    /// Returns the instant the last party arrived, identical for every
    /// waiter of the same generation, or `None` if the barrier was aborted.
    pub fn wait(&self) -> Option<Instant> {
        let mut state = self.state.lock();
        if state.aborted {
            return None;
        }

        let generation = state.generation;
        state.arrived += 1;
        if state.arrived >= self.parties {
            let now = Instant::now();
            state.arrived = 0;
            state.generation += 1;
            state.released_at = Some(now);
            self.condvar.notify_all();
            return Some(now);
        }

        while state.generation == generation && !state.aborted {
            self.condvar.wait(&mut state);
        }
        if state.generation == generation {
            None
        } else {
            state.released_at
        }
    }

    /// Release every waiter without a start instant
    pub fn abort(&self) {
        let mut state = self.state.lock();
        state.aborted = true;
        self.condvar.notify_all();
    }
}

/// Shared flag asking workers to stop at the next epoch boundary
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
