//! Price and sustainability analysis.
//!
//! The periodic sweeper asks a [`PriceAnalyzer`] for an item's current price.
//! Implementations are expected to recover from service failures themselves
//! by returning [`PriceAnalysis::degraded`], so callers always get a
//! well-formed result; an `Err` is still handled per item by the sweeper.

/// OpenAI-compatible HTTP analyzer
pub mod openai;

pub use openai::OpenAiAnalyzer;

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Direction the price of a product is heading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    /// Rising
    Up,
    /// Falling
    Down,
    /// Flat or unknown
    #[default]
    Stable,
}

/// A cheaper or better product suggested instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    /// Product name
    pub name: String,
    /// Its price in dollars
    pub price: f64,
    /// Why it is suggested
    pub reason: String,
}

/// Market view of one product's price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAnalysis {
    /// Observed price in dollars
    pub current_price: f64,
    /// Where the price is heading
    pub trend: PriceTrend,
    /// Change relative to the previous price, positive for an increase
    pub price_change: f64,
    /// Confidence in the analysis, `0.0..=1.0`
    pub confidence: f64,
    /// Advice for the user
    pub recommendation: String,
    /// Suggested alternatives
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

impl PriceAnalysis {
    /// The neutral result used when analysis is unavailable.
    ///
    /// It echoes `current_price`, so the sweeper records no price change.
    #[must_use]
    pub fn degraded(current_price: f64) -> Self {
        Self {
            current_price,
            trend: PriceTrend::Stable,
            price_change: 0.0,
            confidence: 0.0,
            recommendation: "Unable to analyze price at this time".to_string(),
            alternatives: Vec::new(),
        }
    }
}

/// Environmental view of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SustainabilityAnalysis {
    /// 1 (worst) to 5 (most sustainable)
    pub rating: u8,
    /// Environmental considerations
    pub factors: Vec<String>,
    /// Advice for the user
    pub recommendation: String,
    /// More sustainable options
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl SustainabilityAnalysis {
    /// The neutral result used when analysis is unavailable.
    #[must_use]
    pub fn degraded() -> Self {
        Self {
            rating: 3,
            factors: vec!["Analysis unavailable".to_string()],
            recommendation: "Consider researching the product's environmental impact".to_string(),
            alternatives: Vec::new(),
        }
    }
}

/// Reflection questions used when none can be generated.
pub const DEFAULT_REFLECTION_QUESTIONS: [&str; 3] = [
    "Do you still want this item as much as when you first added it?",
    "Have your priorities changed since adding this to your wishlist?",
    "How often would you realistically use this item?",
];

/// Source of current prices for tracked items.
#[async_trait]
pub trait PriceAnalyzer: Send + Sync {
    /// Analyzes the price of a product currently tracked at `current_price`.
    async fn analyze_price(
        &self,
        name: &str,
        current_price: f64,
        product_url: Option<&str>,
    ) -> Result<PriceAnalysis>;
}
