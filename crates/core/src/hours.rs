use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;

/// A duration expressed in hours, rendered with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Hours(Decimal);

impl Hours {
    pub fn from_minutes(minutes: i64) -> Self {
        Hours(Decimal::from(minutes) / Decimal::from(60))
    }
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "{rounded:.2}")
    }
}
