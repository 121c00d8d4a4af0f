use serde::{Deserialize, Serialize};

use super::dataset::P99Stats;

/// Outcome of simulating a monthly call limit.
///
/// Costs are in microcents (1/1,000,000 of a dollar). `savings_microcents`
/// and `yearly_savings_microcents` are signed: a limit looser than observed
/// usage yields negative savings and is reported as such, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// The limit that was asked for.
    pub requested_limit: i64,
    /// The limit actually evaluated; differs from `requested_limit` only
    /// when the request fell outside the sampled range and was clamped.
    pub effective_limit: i64,
    /// Modeled monthly cost at the limit, in microcents.
    pub cost_at_limit_microcents: i64,
    /// Users who would hit the cap.
    pub users_affected: i64,
    /// Monthly savings vs current cost, in microcents (signed).
    pub savings_microcents: i64,
    /// Savings as a percentage of current cost (signed).
    pub savings_pct: f64,
    /// Affected users as a percentage of the total population.
    pub users_affected_pct: f64,
    /// `savings * annualization_months`, in microcents (signed).
    pub yearly_savings_microcents: i64,
}

impl SimulationResult {
    /// True when the requested limit was outside the sampled range.
    pub fn was_clamped(&self) -> bool {
        self.requested_limit != self.effective_limit
    }
}

/// One bucket row of the concentration (Pareto) view.
///
/// Percentages are recomputed from the bucket counts rather than taken from
/// the stated per-bucket shares, so cumulative rows always end at 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeShare {
    pub label: String,
    pub user_count: i64,
    /// Total cost attributed to the bucket in microcents.
    pub total_cost_microcents: i64,
    /// This bucket's share of all users (percent).
    pub user_pct: f64,
    /// This bucket's share of all cost (percent).
    pub cost_pct: f64,
    /// Share of users in this bucket and all lighter ones (percent).
    pub cumulative_user_pct: f64,
    /// Share of cost in this bucket and all lighter ones (percent).
    pub cumulative_cost_pct: f64,
}

/// Users and cost split at a call-volume boundary.
///
/// "Above" is the heavy cohort (buckets whose average calls meet the
/// boundary), "below" is everyone else. `cost_per_user_ratio` compares
/// per-user spend between the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohortSplit {
    /// Boundary in average calls per user.
    pub threshold_calls: i64,
    pub above_users: i64,
    pub above_cost_microcents: i64,
    pub above_user_pct: f64,
    pub above_cost_pct: f64,
    pub below_users: i64,
    pub below_cost_microcents: i64,
    pub below_user_pct: f64,
    pub below_cost_pct: f64,
    /// Average spend per user above the boundary, in microcents.
    pub above_cost_per_user_microcents: i64,
    /// Average spend per user below the boundary, in microcents.
    pub below_cost_per_user_microcents: i64,
    /// Per-user spend above divided by per-user spend below.
    pub cost_per_user_ratio: f64,
}

/// A named ratio between two ranks of the percentile table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileRatio {
    /// E.g. "P99 vs Median".
    pub label: String,
    pub numerator_calls: i64,
    pub denominator_calls: i64,
    pub ratio: f64,
}

/// One internal range of the top-1% cohort with recomputed shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P99BucketShare {
    pub label: String,
    pub user_count: i64,
    /// Share of the internal table's population (percent, recomputed).
    pub user_pct: f64,
    /// Total cost attributed to the range in microcents.
    pub total_cost_microcents: i64,
    /// Share of the internal table's cost (percent).
    pub cost_pct: f64,
    pub avg_calls: i64,
}

/// Deep dive into the top-1% cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P99Overview {
    /// Call count at the 99th percentile rank.
    pub threshold_calls: i64,
    /// Cohort size per the headline stats.
    pub user_count: i64,
    /// Cohort share of all users (percent).
    pub user_pct_of_total: f64,
    /// Cohort monthly cost in microcents, per the headline stats.
    pub total_cost_microcents: i64,
    /// Cohort share of all cost (percent).
    pub cost_pct_of_total: f64,
    pub buckets: Vec<P99BucketShare>,
    pub stats: P99Stats,
}
