use chrono::{DateTime, Duration, Utc};

use study_core::model::TimerSettings;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of one study session: `Idle → Running ⇄ Suspended → Terminated`.
///
/// `Terminated` is terminal; a new start builds a fresh machine and a fresh
/// session row, never reuses a terminated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Suspended,
    Terminated,
}

/// Outcome of one local one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// True every time the elapsed counter crosses an accrual-unit boundary;
    /// the service turns this into one counter point.
    pub accrue: bool,
}

//
// ─── MACHINE ───────────────────────────────────────────────────────────────────
//

/// Pure study-timer state machine. No I/O; every transition takes the current
/// instant from the caller so it can be driven deterministically in tests.
///
/// Elapsed time is always whole seconds. Away time during a suspension is
/// clamped to the grace period, never credited beyond it.
#[derive(Debug, Clone)]
pub struct TimerMachine {
    settings: TimerSettings,
    phase: TimerPhase,
    elapsed_secs: i64,
    suspended_at: Option<DateTime<Utc>>,
}

impl TimerMachine {
    #[must_use]
    pub fn new(settings: TimerSettings) -> Self {
        Self {
            settings,
            phase: TimerPhase::Idle,
            elapsed_secs: 0,
            suspended_at: None,
        }
    }

    /// Enter `Running` with the elapsed counter preloaded (zero for a fresh
    /// start, non-zero when recovering a live session). Valid from `Idle` or
    /// `Terminated`; a no-op otherwise.
    pub fn begin(&mut self, elapsed_secs: i64) {
        if matches!(self.phase, TimerPhase::Running | TimerPhase::Suspended) {
            return;
        }
        self.phase = TimerPhase::Running;
        self.elapsed_secs = elapsed_secs.max(0);
        self.suspended_at = None;
    }

    /// Advance the elapsed counter by one second. Only counts while `Running`.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != TimerPhase::Running {
            return TickOutcome { accrue: false };
        }
        self.elapsed_secs += 1;
        TickOutcome {
            accrue: self.elapsed_secs % i64::from(self.settings.accrual_unit_secs()) == 0,
        }
    }

    /// `Running → Suspended`, recording when the tab went away. Returns false
    /// (and does nothing) outside `Running`.
    pub fn suspend(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }
        self.phase = TimerPhase::Suspended;
        self.suspended_at = Some(now);
        true
    }

    /// `Suspended → Running`, crediting `min(away, grace)` seconds of away
    /// time to the elapsed counter. Returns the credited seconds, or `None`
    /// outside `Suspended`.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<i64> {
        if self.phase != TimerPhase::Suspended {
            return None;
        }
        let suspended_at = self.suspended_at.take()?;
        let away = (now - suspended_at).num_seconds().max(0);
        let credited = away.min(i64::from(self.settings.grace_period_secs()));
        self.elapsed_secs += credited;
        self.phase = TimerPhase::Running;
        Some(credited)
    }

    /// The instant a suspended session auto-terminates, while `Suspended`.
    #[must_use]
    pub fn grace_deadline(&self) -> Option<DateTime<Utc>> {
        self.suspended_at
            .map(|at| at + Duration::seconds(i64::from(self.settings.grace_period_secs())))
    }

    /// Whether the grace deadline has passed.
    #[must_use]
    pub fn grace_expired(&self, now: DateTime<Utc>) -> bool {
        self.grace_deadline().is_some_and(|deadline| now >= deadline)
    }

    /// `Running | Suspended → Terminated`. Returns the final elapsed seconds,
    /// or `None` if there was nothing to terminate. Clears the suspension
    /// bookkeeping so nothing fires after the session is gone.
    pub fn finalize(&mut self) -> Option<i64> {
        if !matches!(self.phase, TimerPhase::Running | TimerPhase::Suspended) {
            return None;
        }
        self.phase = TimerPhase::Terminated;
        self.suspended_at = None;
        Some(self.elapsed_secs)
    }

    #[must_use]
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> i64 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
