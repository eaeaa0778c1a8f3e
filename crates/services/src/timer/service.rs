use std::sync::Arc;

use tracing::{debug, warn};

use ledger::repository::StudySessionLedger;
use study_core::Clock;
use study_core::model::{PointCategory, StudySession, StudySessionId, TimerSettings, UserId};

use super::signals::LifecycleEvent;
use super::state::{TimerMachine, TimerPhase};
use super::suspend_store::{SuspendMarker, SuspendStore};
use crate::error::TimerError;
use crate::points::PointsAccrual;

/// Orchestrates one user's study timer: owns the pure machine and persists
/// its lifecycle through the session ledger.
///
/// Ledger failures on `start`/`terminate` leave the machine in its pre-call
/// state; failures on accrual ticks and marker writes are logged and
/// swallowed, trading a dropped credit for a surviving session.
pub struct TimerService {
    clock: Clock,
    user: UserId,
    settings: TimerSettings,
    sessions: Arc<dyn StudySessionLedger>,
    points: PointsAccrual,
    suspend_store: Arc<dyn SuspendStore>,
    machine: TimerMachine,
    session: Option<StudySession>,
}

impl TimerService {
    #[must_use]
    pub fn new(
        clock: Clock,
        user: UserId,
        settings: TimerSettings,
        sessions: Arc<dyn StudySessionLedger>,
        points: PointsAccrual,
        suspend_store: Arc<dyn SuspendStore>,
    ) -> Self {
        Self {
            clock,
            user,
            settings,
            sessions,
            points,
            suspend_store,
            machine: TimerMachine::new(settings),
            session: None,
        }
    }

    /// Start a session.
    ///
    /// If the ledger already holds an active session for this user, this is a
    /// recovery, not a fresh start, and delegates to [`Self::recover_on_mount`].
    /// The row is created before the machine transitions, so a ledger failure
    /// leaves the timer `Idle`.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::AlreadyRunning` if this instance is already
    /// running or suspended, and propagates ledger errors.
    pub async fn start(&mut self) -> Result<(), TimerError> {
        if matches!(
            self.machine.phase(),
            TimerPhase::Running | TimerPhase::Suspended
        ) {
            return Err(TimerError::AlreadyRunning);
        }
        if self.sessions.active_session(self.user).await?.is_some() {
            return self.recover_on_mount().await;
        }

        let now = self.clock.now();
        let session = StudySession::open(StudySessionId::generate(), self.user, now);
        self.sessions.create_session(&session).await?;
        self.points.touch_best_effort(self.user, now).await;

        debug!(user = %self.user, session = %session.id(), "session started");
        self.machine.begin(0);
        self.session = Some(session);
        Ok(())
    }

    /// Advance the timer by one local second.
    ///
    /// While running, every accrual-unit boundary issues a best-effort atomic
    /// counter-point credit. While suspended, this doubles as the grace
    /// deadline check: once the deadline passes the session terminates itself.
    pub async fn tick(&mut self) {
        match self.machine.phase() {
            TimerPhase::Running => {
                if self.machine.tick().accrue {
                    self.points
                        .credit_best_effort(self.user, PointCategory::Counter, 1)
                        .await;
                }
            }
            TimerPhase::Suspended => {
                if self.machine.grace_expired(self.clock.now()) {
                    if let Err(error) = self.terminate().await {
                        warn!(user = %self.user, %error, "grace-deadline termination failed");
                    }
                }
            }
            TimerPhase::Idle | TimerPhase::Terminated => {}
        }
    }

    /// Route a platform lifecycle signal to the matching transition.
    pub async fn handle_lifecycle(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Hidden | LifecycleEvent::Unload => self.suspend(),
            LifecycleEvent::Visible => self.resume().await,
        }
    }

    /// Suspend the running timer and write the durable marker. A no-op
    /// outside `Running`.
    pub fn suspend(&mut self) {
        let now = self.clock.now();
        if !self.machine.suspend(now) {
            return;
        }
        if let Some(session) = &self.session {
            let marker = SuspendMarker {
                session_id: session.id(),
                suspended_at: now,
            };
            if let Err(error) = self.suspend_store.save(&marker) {
                warn!(user = %self.user, %error, "suspend marker not persisted");
            }
        }
    }

    /// Resume a suspended timer, crediting clamped away time. Past the grace
    /// deadline the pending termination wins instead. A no-op outside
    /// `Suspended`.
    pub async fn resume(&mut self) {
        if self.machine.phase() != TimerPhase::Suspended {
            return;
        }
        let now = self.clock.now();
        if self.machine.grace_expired(now) {
            if let Err(error) = self.terminate().await {
                warn!(user = %self.user, %error, "grace-deadline termination failed");
            }
            return;
        }
        self.machine.resume(now);
        self.clear_marker();
    }

    /// Terminate the session: close the row with floor-divided points, credit
    /// the study hours, clear the durable marker. Idempotent; a second call is
    /// a no-op. A ledger failure leaves the machine in its pre-call state.
    ///
    /// # Errors
    ///
    /// Propagates the ledger error from the row update; the caller may treat
    /// it as non-fatal and retry by calling again.
    pub async fn terminate(&mut self) -> Result<(), TimerError> {
        if !matches!(
            self.machine.phase(),
            TimerPhase::Running | TimerPhase::Suspended
        ) {
            return Ok(());
        }
        let Some(session) = self.session.clone() else {
            return Ok(());
        };

        let now = self.clock.now();
        let mut closed = session;
        closed.close(
            now,
            self.machine.elapsed_secs(),
            self.settings.accrual_unit_secs(),
        );
        self.sessions.update_session(&closed).await?;

        debug!(
            user = %self.user,
            session = %closed.id(),
            duration = closed.duration_secs(),
            points = closed.points_earned(),
            "session terminated"
        );
        self.points
            .credit_hours_best_effort(self.user, closed.duration_hours())
            .await;
        self.machine.finalize();
        self.session = Some(closed);
        self.clear_marker();
        Ok(())
    }

    /// Recover timer state on mount.
    ///
    /// No active row: stay `Idle`. A stale row (older than the staleness
    /// limit) is terminated immediately. A durable suspend marker past its
    /// grace deadline terminates with only the pre-suspend time credited;
    /// within grace the away time is credited, clamped, and the timer
    /// re-enters `Running`. Otherwise the timer resumes with the elapsed
    /// counter preloaded from the row's start time.
    ///
    /// # Errors
    ///
    /// Propagates ledger errors; the machine is left untouched in that case.
    pub async fn recover_on_mount(&mut self) -> Result<(), TimerError> {
        let now = self.clock.now();
        let Some(session) = self.sessions.active_session(self.user).await? else {
            // a leftover marker without a live row is garbage
            self.clear_marker();
            return Ok(());
        };

        let marker = match self.suspend_store.load() {
            Ok(marker) => marker.filter(|m| m.session_id == session.id()),
            Err(error) => {
                warn!(user = %self.user, %error, "suspend marker unreadable");
                None
            }
        };

        let elapsed = session.elapsed_at(now);
        if elapsed > i64::from(self.settings.max_session_age_secs()) {
            return self.close_recovered(session, elapsed).await;
        }

        if let Some(marker) = marker {
            let away = (now - marker.suspended_at).num_seconds().max(0);
            let pre_suspend = (marker.suspended_at - session.start_time())
                .num_seconds()
                .max(0);
            if away >= i64::from(self.settings.grace_period_secs()) {
                // grace ran out while unloaded; only pre-suspend time counts
                return self.close_recovered(session, pre_suspend).await;
            }
            self.machine.begin(pre_suspend + away);
            self.session = Some(session);
            self.clear_marker();
            return Ok(());
        }

        self.machine.begin(elapsed);
        self.session = Some(session);
        Ok(())
    }

    async fn close_recovered(
        &mut self,
        session: StudySession,
        elapsed: i64,
    ) -> Result<(), TimerError> {
        let now = self.clock.now();
        let mut closed = session;
        closed.close(now, elapsed, self.settings.accrual_unit_secs());
        self.sessions.update_session(&closed).await?;
        self.points
            .credit_hours_best_effort(self.user, closed.duration_hours())
            .await;
        self.clear_marker();
        Ok(())
    }

    fn clear_marker(&self) {
        if let Err(error) = self.suspend_store.clear() {
            warn!(user = %self.user, %error, "suspend marker not cleared");
        }
    }

    #[must_use]
    pub fn phase(&self) -> TimerPhase {
        self.machine.phase()
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> i64 {
        self.machine.elapsed_secs()
    }

    #[must_use]
    pub fn session(&self) -> Option<&StudySession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    /// Mutable clock access, for driving a fixed clock in tests.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }
}
