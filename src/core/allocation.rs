//! Share allocation for a Swensen style category model.
//!
//! Turns continuous per-category fund targets into whole-share purchase
//! quantities at a safety-adjusted price, and aggregates the invested
//! totals and the unspent remainder into an [`AllocationPlan`].

use crate::core::price::PriceSource;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt::Display;
use tracing::warn;

/// One asset-class bucket of the allocation model.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub target_funds: Decimal,
    /// Proxy investment vehicle; `None` or empty means no market data.
    pub ticker: Option<String>,
}

/// How the total investable amount is determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TotalFundsPolicy {
    /// Total funds is the sum of all category targets.
    Derived,
    /// Total funds is supplied independently; the difference against the
    /// summed targets is reported but does not change allocation.
    Fixed(Decimal),
}

#[derive(Debug, Clone)]
pub struct AllocationSettings {
    /// Direct multiplier applied to the quote before the affordability
    /// check, e.g. 1.03 inflates the price by 3%.
    pub price_increase_ratio: Decimal,
    /// When true, a category whose adjusted price exceeds its target funds
    /// is skipped. When false shares are always computed (flooring to 0
    /// when unaffordable).
    pub skip_unaffordable: bool,
    pub total_funds: TotalFundsPolicy,
}

/// Planned purchase for one priced, affordable category.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationResult {
    pub category_id: String,
    pub category_name: String,
    pub ticker: String,
    pub raw_price: Decimal,
    pub adjusted_price: Decimal,
    pub shares: u64,
    /// `shares * raw_price`; purchases settle at the unadjusted quote.
    pub invested_value: Decimal,
    pub target_value: Decimal,
    /// `invested_value - target_value`.
    pub delta: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoPrice,
    PriceExceedsFunds { adjusted_price: Decimal },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoPrice => write!(f, "no price available"),
            SkipReason::PriceExceedsFunds { .. } => {
                write!(f, "price exceeds allocated funds")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkipRecord {
    pub category_id: String,
    pub reason: SkipReason,
}

/// Outcome of one allocation pass over the category model.
#[derive(Debug, Clone)]
pub struct AllocationPlan {
    pub total_funds: Decimal,
    pub total_target: Decimal,
    /// `total_funds - total_target`, reported under the fixed-total policy.
    pub mismatch: Option<Decimal>,
    pub results: Vec<AllocationResult>,
    pub skipped: Vec<SkipRecord>,
    pub total_invested: Decimal,
    /// `total_funds - total_invested`; negative is a valid, reportable
    /// state, not an error.
    pub remainder: Decimal,
}

impl AllocationPlan {
    pub fn overspent(&self) -> bool {
        self.remainder < Decimal::ZERO
    }
}

pub struct Allocator<'a> {
    prices: &'a dyn PriceSource,
    settings: &'a AllocationSettings,
}

impl<'a> Allocator<'a> {
    pub fn new(prices: &'a dyn PriceSource, settings: &'a AllocationSettings) -> Self {
        Self { prices, settings }
    }

    /// Runs one allocation pass over `categories` in declaration order.
    ///
    /// `on_progress` is invoked once per category after its price lookup
    /// completes.
    pub async fn plan(
        &self,
        categories: &[Category],
        on_progress: &(dyn Fn() + Sync),
    ) -> AllocationPlan {
        let total_target: Decimal = categories.iter().map(|c| c.target_funds).sum();
        let (total_funds, mismatch) = match self.settings.total_funds {
            TotalFundsPolicy::Derived => (total_target, None),
            TotalFundsPolicy::Fixed(amount) => (amount, Some(amount - total_target)),
        };

        let mut results = Vec::new();
        let mut skipped = Vec::new();
        let mut total_invested = Decimal::ZERO;

        for category in categories {
            let outcome = self.allocate(category).await;
            on_progress();
            match outcome {
                Ok(result) => {
                    total_invested += result.invested_value;
                    results.push(result);
                }
                Err(reason) => {
                    warn!(category = %category.id, %reason, "Skipping category");
                    skipped.push(SkipRecord {
                        category_id: category.id.clone(),
                        reason,
                    });
                }
            }
        }

        let remainder = total_funds - total_invested;
        AllocationPlan {
            total_funds,
            total_target,
            mismatch,
            results,
            skipped,
            total_invested,
            remainder,
        }
    }

    async fn allocate(&self, category: &Category) -> Result<AllocationResult, SkipReason> {
        let ticker = category.ticker.as_deref().unwrap_or("");
        let price = self
            .prices
            .resolve(ticker)
            .await
            .ok_or(SkipReason::NoPrice)?;

        let adjusted_price = price * self.settings.price_increase_ratio;
        if adjusted_price <= Decimal::ZERO {
            // A non-positive adjusted price cannot price shares.
            return Err(SkipReason::NoPrice);
        }
        if self.settings.skip_unaffordable && adjusted_price > category.target_funds {
            return Err(SkipReason::PriceExceedsFunds { adjusted_price });
        }

        // Largest whole number of shares with shares * adjusted <= target.
        let shares = (category.target_funds / adjusted_price)
            .floor()
            .to_u64()
            .unwrap_or(0);
        let invested_value = Decimal::from(shares) * price;

        Ok(AllocationResult {
            category_id: category.id.clone(),
            category_name: category.name.clone(),
            ticker: ticker.to_string(),
            raw_price: price,
            adjusted_price,
            shares,
            invested_value,
            target_value: category.target_funds,
            delta: invested_value - category.target_funds,
        })
    }
}

/// Applies the optional allow-list: with a non-empty `include`, categories
/// whose id is absent are excluded from all computation and reporting.
pub fn filter_categories(categories: Vec<Category>, include: Option<&[String]>) -> Vec<Category> {
    match include {
        Some(ids) if !ids.is_empty() => categories
            .into_iter()
            .filter(|c| ids.iter().any(|id| id == &c.id))
            .collect(),
        _ => categories,
    }
}
