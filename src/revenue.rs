//! Revenue estimation strategies.
//!
//! Most networks pay validators a commission on staking rewards, estimated from stake,
//! APR and commission rate. Networks with a bespoke payout scheme plug in their own
//! [`RevenueStrategy`] through the strategy registry.

use crate::registry::AprRange;
use crate::types::snapshot::ValidatorSnapshot;

/// Everything a strategy may use, already normalized to whole tokens and percent.
#[derive(Debug, Clone, Copy)]
pub struct RevenueInputs<'a> {
    /// `None` when the stake read failed
    pub stake_tokens: Option<f64>,
    pub apr: Option<AprRange>,
    /// percent
    pub commission: Option<f64>,
    pub price_usd: Option<f64>,
    pub snapshot: &'a ValidatorSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevenueEstimate {
    pub monthly_usd: f64,
    pub yearly_usd: f64,
}

impl RevenueEstimate {
    pub fn from_monthly(monthly_usd: f64) -> Self {
        Self { monthly_usd, yearly_usd: monthly_usd * 12.0 }
    }
}

pub trait RevenueStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when an input the formula needs is unknown.
    fn estimate(&self, inputs: &RevenueInputs<'_>) -> Option<RevenueEstimate>;
}

/// Commission earned on staking rewards:
/// `stake × avg_apr/100 / 12 × commission/100 × price` per month.
#[derive(Debug, Clone, Copy, Default)]
pub struct StakeBasedRevenue {
    /// Used when the chain does not report a commission rate
    pub fallback_commission: Option<f64>,
}

impl StakeBasedRevenue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback_commission(commission: f64) -> Self {
        Self { fallback_commission: Some(commission) }
    }
}

impl RevenueStrategy for StakeBasedRevenue {
    fn name(&self) -> &'static str {
        "stake_based"
    }

    fn estimate(&self, inputs: &RevenueInputs<'_>) -> Option<RevenueEstimate> {
        let stake = inputs.stake_tokens?;
        let apr = inputs.apr?;
        let price = inputs.price_usd?;
        let commission = inputs.commission.or(self.fallback_commission)?;

        let monthly_reward_tokens = stake * (apr.midpoint() / 100.0) / 12.0;
        let commission_tokens = monthly_reward_tokens * (commission / 100.0);
        Some(RevenueEstimate::from_monthly(commission_tokens * price))
    }
}

/// Fixed USD quota per month scaled by the reported performance rating (0..=1).
#[derive(Debug, Clone, Copy)]
pub struct PerformanceQuotaRevenue {
    pub default_quota_usd: f64,
}

impl PerformanceQuotaRevenue {
    pub fn new(default_quota_usd: f64) -> Self {
        Self { default_quota_usd }
    }
}

impl RevenueStrategy for PerformanceQuotaRevenue {
    fn name(&self) -> &'static str {
        "performance_quota"
    }

    fn estimate(&self, inputs: &RevenueInputs<'_>) -> Option<RevenueEstimate> {
        let stats = inputs.snapshot.revenue_module.as_ref()?;
        if !stats.performance_rating.is_finite() {
            return None;
        }
        let quota = stats.reward_quote_usd.unwrap_or(self.default_quota_usd);
        let rating = stats.performance_rating.clamp(0.0, 1.0);
        Some(RevenueEstimate::from_monthly(quota * rating))
    }
}
