use crate::types::{Action, PositionState, PreparedPoint};

/// Strategy trait for implementing trading rules.
///
/// A strategy only decides; the simulator owns position sizing and ignores
/// actions that are not legal in the current state (a `Buy` while holding or
/// a `Sell` while idle is treated as a hold).
pub trait Strategy: Send + Sync {
    /// Unique identifier for this strategy
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Decide what to do at `point` given the current position state
    fn decide(&self, state: PositionState, point: &PreparedPoint) -> Action;
}
