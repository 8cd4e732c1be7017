//! Client-side cooldown for rate-limited actions

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::debug;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

const TICK: Duration = Duration::from_secs(1);

/// Whether the guarded action may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    Ready,
    /// Disabled; seconds until it is enabled again
    Cooling(u64),
}

/// A `Ready`/`Cooling(n)` state machine with a one-second countdown.
///
/// The countdown runs on a tokio task owned by this value. It is aborted by
/// [`Cooldown::cancel`], by a restart, and on drop.
pub struct Cooldown {
    duration: Duration,
    state: Arc<watch::Sender<CooldownState>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Cooldown {
    pub fn new(duration: Duration) -> Self {
        let (state, _) = watch::channel(CooldownState::Ready);
        Self {
            duration,
            state: Arc::new(state),
            ticker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> CooldownState {
        *self.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == CooldownState::Ready
    }

    /// Seconds left, zero when ready
    pub fn remaining(&self) -> u64 {
        match self.state() {
            CooldownState::Ready => 0,
            CooldownState::Cooling(secs) => secs,
        }
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<CooldownState> {
        self.state.subscribe()
    }

    /// Enter `Cooling` for the full duration, restarting any running countdown.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = ticker.take() {
            previous.abort();
        }

        let secs = self.duration.as_secs();
        if secs == 0 {
            self.state.send_replace(CooldownState::Ready);
            return;
        }

        debug!("Cooling down for {}s", secs);
        self.state.send_replace(CooldownState::Cooling(secs));

        let state = Arc::clone(&self.state);
        *ticker = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            loop {
                ticks.tick().await;
                let mut finished = false;
                state.send_modify(|current| {
                    *current = match *current {
                        CooldownState::Cooling(secs) if secs > 1 => CooldownState::Cooling(secs - 1),
                        _ => {
                            finished = true;
                            CooldownState::Ready
                        }
                    };
                });
                if finished {
                    debug!("Cooldown finished");
                    break;
                }
            }
        }));
    }

    /// Stop the countdown and return to `Ready`
    pub fn cancel(&self) {
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = ticker.take() {
            handle.abort();
        }
        self.state.send_replace(CooldownState::Ready);
    }
}

impl Drop for Cooldown {
    fn drop(&mut self) {
        let ticker = self.ticker.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = ticker.take() {
            handle.abort();
        }
    }
}
