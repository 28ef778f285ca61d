//! Automatic phase advancement.
//!
//! At most one timer is pending. Arming for a newer (round, phase) cancels the
//! pending one first; a timer can only be cancelled while it is still sleeping.
//! Once it fires, the advance it triggers runs to completion and is rejected by
//! the engine if the round moved on in the meantime.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, SystemTime},
};

use tokio::{
    sync::{Mutex, oneshot},
    time::{Instant, sleep},
};
use tracing::{debug, info, warn};

use crate::{
    config::TimerConfig,
    services::round_engine::{AdvanceOutcome, AdvanceTrigger, RoundEngine},
    state::{round::Round, state_machine::RoundPhase},
};

/// Delay before a timer whose advance failed tries again.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// (round, phase) pair a timer is armed for; ordered like the game progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PhaseKey {
    /// Round the timer belongs to.
    pub round_id: u64,
    /// Phase the timer ends.
    pub phase: RoundPhase,
}

impl PhaseKey {
    /// Key of the state `round` is currently in.
    pub fn of(round: &Round) -> Self {
        Self {
            round_id: round.id,
            phase: round.status,
        }
    }
}

/// When the current phase is due to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDeadline {
    /// Time left on the runtime clock.
    pub remaining: Duration,
    /// Wall-clock instant the phase ends at.
    pub ends_at: SystemTime,
}

struct Armed {
    key: PhaseKey,
    generation: u64,
    deadline: Instant,
    ends_at: SystemTime,
    // Dropping the sender cancels a timer that is still sleeping.
    cancel: oneshot::Sender<()>,
}

/// Schedules one deferred advance per phase.
pub struct PhaseTimer {
    engine: Arc<RoundEngine>,
    config: TimerConfig,
    armed: Mutex<Option<Armed>>,
    next_generation: AtomicU64,
}

impl PhaseTimer {
    /// Create an idle driver; nothing is scheduled until [`PhaseTimer::arm`].
    pub fn new(engine: Arc<RoundEngine>, config: TimerConfig) -> Arc<Self> {
        Arc::new(Self {
            engine,
            config,
            armed: Mutex::new(None),
            next_generation: AtomicU64::new(0),
        })
    }

    /// Make sure a timer is pending for the phase `round` is in.
    ///
    /// Arming for the state whose timer is still pending, or for an older one,
    /// does nothing, so callers can invoke this after every operation.
    pub async fn arm(self: &Arc<Self>, round: &Round) {
        if !self.config.enabled {
            return;
        }

        let key = PhaseKey::of(round);
        let mut slot = self.armed.lock().await;
        if let Some(armed) = slot.as_ref() {
            if armed.key >= key {
                return;
            }
        }

        if let Some(previous) = slot.take() {
            debug!(round_id = previous.key.round_id, phase = ?previous.key.phase, "cancelling pending phase timer");
            drop(previous.cancel);
        }

        let delay = self.config.duration_for(key.phase);
        *slot = Some(self.schedule(key, delay));
        info!(round_id = key.round_id, phase = ?key.phase, delay_secs = delay.as_secs(), "phase timer armed");
    }

    /// Cancel the pending timer, if any. Used on shutdown.
    pub async fn disarm(&self) {
        if let Some(previous) = self.armed.lock().await.take() {
            drop(previous.cancel);
            debug!(round_id = previous.key.round_id, "phase timer disarmed");
        }
    }

    /// Deadline of the timer armed for `round`'s current phase.
    pub async fn deadline_for(&self, round: &Round) -> Option<PhaseDeadline> {
        let slot = self.armed.lock().await;
        let armed = slot.as_ref().filter(|armed| armed.key == PhaseKey::of(round))?;
        Some(PhaseDeadline {
            remaining: armed.deadline.saturating_duration_since(Instant::now()),
            ends_at: armed.ends_at,
        })
    }

    fn schedule(self: &Arc<Self>, key: PhaseKey, delay: Duration) -> Armed {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (cancel, cancelled) = oneshot::channel::<()>();

        let timer = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = sleep(delay) => {}
                _ = cancelled => return,
            }
            timer.fire(key, generation).await;
        });

        Armed {
            key,
            generation,
            deadline: Instant::now() + delay,
            ends_at: SystemTime::now() + delay,
            cancel,
        }
    }

    async fn fire(self: Arc<Self>, key: PhaseKey, generation: u64) {
        debug!(round_id = key.round_id, phase = ?key.phase, "phase timer fired");
        {
            // Nothing is pending any more; arming for this phase again must reschedule.
            let mut slot = self.armed.lock().await;
            if matches!(slot.as_ref(), Some(armed) if armed.generation == generation) {
                slot.take();
            }
        }

        let trigger = AdvanceTrigger::Timer {
            round_id: key.round_id,
            phase: key.phase,
        };

        match self.engine.advance_phase(trigger).await {
            // Another transition held the gate; it may still fail, so try again.
            Ok(AdvanceOutcome::Unchanged(round)) if PhaseKey::of(&round) == key => {
                debug!(
                    round_id = key.round_id,
                    phase = ?key.phase,
                    "transition in flight; retrying timed advance"
                );
                self.retry(key).await;
            }
            Ok(outcome) => self.arm(outcome.round()).await,
            Err(err) => {
                warn!(
                    round_id = key.round_id,
                    phase = ?key.phase,
                    error = %err,
                    "timed phase advance failed; retrying"
                );
                self.retry(key).await;
            }
        }
    }

    async fn retry(self: &Arc<Self>, key: PhaseKey) {
        let mut slot = self.armed.lock().await;
        // Only retry if nothing was armed meanwhile.
        if slot.is_none() {
            *slot = Some(self.schedule(key, RETRY_DELAY));
        }
    }
}
