use serde::{Deserialize, Serialize};

/// One row of the call-volume percentile table.
///
/// The table is strictly increasing in both fields: a higher rank always
/// maps to a higher per-user call count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentilePoint {
    /// Percentile rank in (0, 100].
    pub percentile: f64,
    /// Monthly LLM calls per user at this rank.
    pub llm_calls: i64,
}

/// One call-volume range of the user population, with attributed cost.
///
/// Costs are stored in microcents (1/1,000,000 of a dollar).
/// Buckets are non-overlapping, ordered ascending by call volume, and
/// together partition the entire user population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionBucket {
    /// Range label, e.g. "51-100" or "50K+".
    pub label: String,
    pub user_count: i64,
    /// Share of the total user population as stated by the source (percent).
    pub user_pct: f64,
    /// Average monthly calls per user within the range.
    pub avg_calls: i64,
    /// Total cost attributed to the bucket in microcents.
    pub total_cost_microcents: i64,
    /// Average cost per user in microcents.
    pub avg_cost_per_user_microcents: i64,
    /// Average cost per call in microcents.
    pub cost_per_call_microcents: i64,
}

/// One range of the internal distribution of the top-1% cohort.
///
/// The internal table was sampled separately from the coarse distribution
/// buckets; its population differs slightly from the cohort stated in
/// [`KeyStats`], so its sums are checked for internal consistency only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P99Bucket {
    /// Range label, e.g. "8K-10K" or "100K+".
    pub label: String,
    pub user_count: i64,
    /// Share of the internal table's own population (percent).
    pub cohort_pct: f64,
    /// Total cost attributed to the range in microcents.
    pub total_cost_microcents: i64,
    /// Average monthly calls per user within the range.
    pub avg_calls: i64,
}

/// Call-count summary statistics within the top-1% cohort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct P99Stats {
    pub min_calls: i64,
    pub p25_calls: i64,
    pub median_calls: i64,
    pub p75_calls: i64,
    pub p90_calls: i64,
    pub max_calls: i64,
}

/// One anchor of the spend-cap response curve.
///
/// `total_cost_microcents` is the modeled monthly spend if every user were
/// capped at `call_limit` calls; `users_affected` is how many users would
/// hit the cap. Anchors are sorted strictly ascending by limit, and cost
/// never decreases as the limit loosens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSample {
    pub call_limit: i64,
    /// Modeled monthly cost at this limit in microcents.
    pub total_cost_microcents: i64,
    pub users_affected: i64,
}

/// Headline statistics for the whole population.
///
/// Costs are stored in microcents (1/1,000,000 of a dollar).
/// The P99 figures describe the user cohort above the 5K-calls boundary of
/// the distribution buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyStats {
    pub total_users: i64,
    /// Total monthly cost in microcents.
    pub total_cost_microcents: i64,
    pub total_calls: i64,
    /// Average cost per call in microcents.
    pub avg_cost_per_call_microcents: i64,
    pub avg_calls_per_user: i64,
    pub median_calls: i64,
    pub max_calls: i64,
    /// Call count at the 99th percentile rank.
    pub p99_threshold_calls: i64,
    /// Users in the top-1% cohort.
    pub p99_user_count: i64,
    /// Monthly cost attributed to the top-1% cohort, in microcents.
    pub p99_total_cost_microcents: i64,
}

/// The full reference dataset: four constant tables plus headline stats.
///
/// Constructed once (embedded data or a deserialized file), validated, then
/// treated as immutable. There is no write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageDataset {
    pub percentiles: Vec<PercentilePoint>,
    pub buckets: Vec<DistributionBucket>,
    pub p99_buckets: Vec<P99Bucket>,
    pub p99_stats: P99Stats,
    pub thresholds: Vec<ThresholdSample>,
    pub key_stats: KeyStats,
}

/// Fixed constants the simulator derives savings against.
///
/// Passed explicitly so the simulator stays a pure function; both totals
/// must be strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorParams {
    /// Current unconstrained monthly cost in microcents.
    pub total_cost_current_microcents: i64,
    pub total_users: i64,
    /// Months used to annualize monthly savings.
    pub annualization_months: i64,
}
