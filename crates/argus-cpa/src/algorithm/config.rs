use crate::WaitlistOrder;

/// Configuration of [`crate::CpaAlgorithm`] and the reached set it explores.
///
/// ```
/// use argus_cpa::{ReachabilityConfig, WaitlistOrder};
///
/// let config = ReachabilityConfig::builder()
///     .waitlist_order(WaitlistOrder::DepthFirst)
///     .max_iterations(1_000)
///     .build();
/// assert!(config.stop_after_first_target);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReachabilityConfig {
    pub waitlist_order: WaitlistOrder,
    /// Stop as soon as an uncovered target is found.
    pub stop_after_first_target: bool,
    /// Maximum number of waitlist pops; `None` is unbounded.
    pub max_iterations: Option<usize>,
    /// Check at runtime that every merge over-approximates the state it replaces.
    pub check_invariants: bool,
}

#[bon::bon]
impl ReachabilityConfig {
    #[builder]
    pub fn new(
        waitlist_order: Option<WaitlistOrder>,
        stop_after_first_target: Option<bool>,
        max_iterations: Option<usize>,
        check_invariants: Option<bool>,
    ) -> Self {
        Self {
            waitlist_order: waitlist_order.unwrap_or_default(),
            stop_after_first_target: stop_after_first_target.unwrap_or(true),
            max_iterations,
            check_invariants: check_invariants.unwrap_or(cfg!(debug_assertions)),
        }
    }
}

impl Default for ReachabilityConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
