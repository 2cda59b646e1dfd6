use serde::{Deserialize, Serialize};

/// Inclusive bounds for a UI range slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: i64,
    pub max: i64,
}

/// Used when no assessment carries a market value.
pub const MARKET_VALUE_FALLBACK: Range = Range {
    min: 0,
    max: 10_000_000,
};

/// Used when no feature row carries a building square footage.
pub const SQUARE_FOOTAGE_FALLBACK: Range = Range { min: 0, max: 20_000 };

impl Range {
    /// Fills each missing aggregate from `fallback` independently.
    pub fn from_aggregate(bounds: AggregateBounds, fallback: Range) -> Self {
        Self {
            min: bounds.min.unwrap_or(fallback.min),
            max: bounds.max.unwrap_or(fallback.max),
        }
    }
}

/// `MIN`/`MAX` as returned by storage; `None` when no non-null value exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateBounds {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// Slider bounds for the two numeric listing filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliderRanges {
    pub estimated_market_value: Range,
    pub building_sq_ft: Range,
}

impl SliderRanges {
    pub fn from_aggregates(market_value: AggregateBounds, square_footage: AggregateBounds) -> Self {
        Self {
            estimated_market_value: Range::from_aggregate(market_value, MARKET_VALUE_FALLBACK),
            building_sq_ft: Range::from_aggregate(square_footage, SQUARE_FOOTAGE_FALLBACK),
        }
    }
}
