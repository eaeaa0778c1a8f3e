/// Platform lifecycle signals, abstracted so the timer can be driven without
/// a real window: tab hidden, tab visible again, page unloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Hidden,
    Visible,
    Unload,
}
