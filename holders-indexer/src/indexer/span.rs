//! Per-chain adaptive block-span controller.
//!
//! Remembers the last span size that succeeded for each chain and shrinks on
//! `BlockRangeTooLarge`, so a poller converges on the RPC endpoint's actual
//! limit instead of guessing it once at startup.
//!
//! Each [`ChainPoller`](super::poller) owns one [`SpanController`] instance;
//! this is never a process-global singleton, so tests can construct a fresh
//! one per case.

use dashmap::DashMap;

/// Floor below which a span is never shrunk further.
pub const MIN_SPAN: u64 = 100;

/// Maximum number of shrink-and-retry attempts per batch.
pub const MAX_SPAN_RETRIES: u32 = 4;

/// Default span ceiling when a chain has no override configured.
pub const DEFAULT_MAX_SPAN: u64 = 2000;

/// Per-chain memory of the last block span that succeeded, with a
/// shrink-on-error policy.
#[derive(Debug, Default)]
pub struct SpanController {
    last_good: DashMap<u64, u64>,
}

impl SpanController {
    /// A controller with no learned state.
    #[must_use]
    pub fn new() -> Self {
        Self { last_good: DashMap::new() }
    }

    /// `min(lastGood ?? maxSpan, maxSpan, remaining)`, floored to the
    /// smaller of [`MIN_SPAN`] and `remaining`, never zero.
    #[must_use]
    pub fn initial_span(&self, chain_id: u64, max_span: u64, remaining: u64) -> u64 {
        let candidate = self
            .last_good
            .get(&chain_id)
            .map_or(max_span, |v| *v)
            .min(max_span)
            .min(remaining);
        candidate.max(1.max(MIN_SPAN.min(remaining)))
    }

    /// `max(1, min(maxSpan, min(remaining, current/2)))`, recording the
    /// result as the new `lastGood` for `chain_id`.
    pub fn shrink(&self, chain_id: u64, current: u64, max_span: u64, remaining: u64) -> u64 {
        let shrunk = max_span.min(remaining.min(current / 2));
        let floor = 1.max(MIN_SPAN.min(remaining));
        let result = shrunk.max(floor);
        self.last_good.insert(chain_id, result);
        result
    }

    /// Record `span` as the last span that succeeded for `chain_id`.
    pub fn remember(&self, chain_id: u64, span: u64) {
        self.last_good.insert(chain_id, span);
    }

    /// The currently remembered span for `chain_id`, if any batch has
    /// succeeded yet.
    #[must_use]
    pub fn last_good(&self, chain_id: u64) -> Option<u64> {
        self.last_good.get(&chain_id).map(|v| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_span_uses_max_span_when_nothing_learned() {
        let ctrl = SpanController::new();
        assert_eq!(ctrl.initial_span(1, 2000, 10_000), 2000);
    }

    #[test]
    fn initial_span_clamps_to_remaining() {
        let ctrl = SpanController::new();
        assert_eq!(ctrl.initial_span(1, 2000, 50), 50);
    }

    #[test]
    fn initial_span_never_zero() {
        let ctrl = SpanController::new();
        assert_eq!(ctrl.initial_span(1, 2000, 0), 1);
    }

    #[test]
    fn initial_span_uses_last_good_once_learned() {
        let ctrl = SpanController::new();
        ctrl.remember(1, 500);
        assert_eq!(ctrl.initial_span(1, 2000, 10_000), 500);
    }

    #[test]
    fn shrink_halves_and_floors_at_min_span() {
        let ctrl = SpanController::new();
        let result = ctrl.shrink(1, 1000, 2000, 10_000);
        assert_eq!(result, 500);
        assert_eq!(ctrl.last_good(1), Some(500));
    }

    #[test]
    fn shrink_never_goes_below_min_span_floor() {
        let ctrl = SpanController::new();
        let result = ctrl.shrink(1, 150, 2000, 10_000);
        assert_eq!(result, MIN_SPAN);
    }

    #[test]
    fn shrink_is_monotonically_non_increasing() {
        let ctrl = SpanController::new();
        let first = ctrl.shrink(1, 1000, 2000, 10_000);
        let second = ctrl.shrink(1, first, 2000, 10_000);
        assert!(second <= first);
    }

    #[test]
    fn shrink_reaches_a_stable_floor_within_max_span_retries() {
        let ctrl = SpanController::new();
        let mut span = 1000;
        for _ in 0..MAX_SPAN_RETRIES {
            span = ctrl.shrink(1, span, 2000, 10_000);
        }
        let next = ctrl.shrink(1, span, 2000, 10_000);
        assert_eq!(next, span, "span must stabilize at its floor");
    }

    #[test]
    fn per_chain_state_is_independent() {
        let ctrl = SpanController::new();
        ctrl.remember(1, 500);
        ctrl.remember(2, 1500);
        assert_eq!(ctrl.last_good(1), Some(500));
        assert_eq!(ctrl.last_good(2), Some(1500));
    }

    #[test]
    fn worked_example_from_documentation() {
        // Poller starts with span 1000, BlockRangeTooLarge, shrinks to 500,
        // succeeds with zero logs; next batch's initial span is 500.
        let ctrl = SpanController::new();
        let shrunk = ctrl.shrink(1, 1000, 2000, 10_000);
        assert_eq!(shrunk, 500);
        ctrl.remember(1, shrunk);
        assert_eq!(ctrl.initial_span(1, 2000, 10_000), 500);
    }
}
