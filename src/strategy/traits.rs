use crate::common::errors::Result;
use crate::strategy::types::{PriceWindow, SignalTargets};

/// Pluggable signal that picks what to hold each cycle
///
/// Strategies receive a window of closing prices and return which symbols to
/// hold long and which to hold short. Everything not selected is flat.
///
/// # Contract
///
/// - the window holds exactly [`window_len`](StrategySignal::window_len)
///   closes per symbol; anything else is `InvalidSignalInput`
/// - the long and short sets are disjoint and no larger than the requested
///   counts
/// - `compute_targets` is pure: no I/O, no state carried between cycles
///
/// # Example
///
/// ```ignore
/// struct AlwaysLongFirst;
///
/// impl StrategySignal for AlwaysLongFirst {
///     fn name(&self) -> &str { "always_long_first" }
///     fn window_len(&self) -> usize { 1 }
///
///     fn compute_targets(&self, window: &PriceWindow, _buy: usize, _sell: usize)
///         -> Result<SignalTargets>
///     {
///         window.ensure_steps(self.window_len())?;
///         let long = window.symbols().iter().take(1).cloned().collect();
///         Ok(SignalTargets::new(long, Default::default()))
///     }
/// }
/// ```
pub trait StrategySignal: Send + Sync {
    /// Name the strategy is registered under
    fn name(&self) -> &str;

    /// Number of completed buckets the strategy needs per symbol
    fn window_len(&self) -> usize;

    /// Pick long and short symbols from the price window
    fn compute_targets(
        &self,
        window: &PriceWindow,
        buy_count: usize,
        sell_count: usize,
    ) -> Result<SignalTargets>;
}

/// Boxed strategy for dynamic dispatch
pub type BoxedSignal = Box<dyn StrategySignal>;
