//! Timer session manager: a pure state machine driven by an orchestrating
//! service that persists through the session ledger.

mod service;
mod signals;
mod state;
mod suspend_store;

pub use service::TimerService;
pub use signals::LifecycleEvent;
pub use state::{TickOutcome, TimerMachine, TimerPhase};
pub use suspend_store::{
    InMemorySuspendStore, JsonFileSuspendStore, SuspendMarker, SuspendStore, SuspendStoreError,
};
