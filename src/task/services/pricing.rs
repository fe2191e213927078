//! Cost accounting for executor token usage.

use crate::config::Pricing;
use crate::task::domain::TokenUsage;

/// Computes the dollar cost of a task from its token counts.
///
/// Thinking tokens count toward the usage total but are not priced.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostCalculator {
    pricing: Pricing,
}

const TOKENS_PER_UNIT: f64 = 1_000_000.0;
const ROUNDING_SCALE: f64 = 1_000_000.0;

impl CostCalculator {
    /// Creates a calculator with the given per-million-token prices.
    #[must_use]
    pub const fn new(pricing: Pricing) -> Self {
        Self { pricing }
    }

    /// Computes the cost in dollars, rounded to six decimal places.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "token counts stay far below the f64 integer range"
    )]
    #[expect(clippy::float_arithmetic, reason = "dollar cost is inherently fractional")]
    pub fn cost(&self, usage: TokenUsage) -> f64 {
        let input = usage.input as f64 * self.pricing.input_per_mtok / TOKENS_PER_UNIT;
        let output = usage.output as f64 * self.pricing.output_per_mtok / TOKENS_PER_UNIT;
        ((input + output) * ROUNDING_SCALE).round() / ROUNDING_SCALE
    }
}
