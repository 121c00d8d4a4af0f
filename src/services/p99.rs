//! Deep dive into the top-1% cohort.
//!
//! The cohort's headline figures (size, cost, threshold) come from the key
//! stats; its internal composition comes from the dedicated P99 bucket
//! table, whose shares are recomputed against that table's own sums.

use crate::models::{P99BucketShare, P99Overview, UsageDataset};

/// Error type for the P99 deep dive
#[derive(Debug, thiserror::Error)]
pub enum P99Error {
    #[error("P99 bucket table is empty")]
    EmptyBuckets,

    #[error("P99 bucket user counts sum to zero, shares are undefined")]
    ZeroUserTotal,

    #[error("P99 bucket costs sum to zero, shares are undefined")]
    ZeroCostTotal,

    #[error("Key stats carry non-positive totals ({total_users} users, {total_cost_microcents} microcents)")]
    InvalidTotals {
        total_users: i64,
        total_cost_microcents: i64,
    },
}

/// Assemble the top-1% overview from a dataset.
pub fn p99_overview(dataset: &UsageDataset) -> Result<P99Overview, P99Error> {
    if dataset.p99_buckets.is_empty() {
        return Err(P99Error::EmptyBuckets);
    }

    let stats = &dataset.key_stats;
    if stats.total_users <= 0 || stats.total_cost_microcents <= 0 {
        return Err(P99Error::InvalidTotals {
            total_users: stats.total_users,
            total_cost_microcents: stats.total_cost_microcents,
        });
    }

    let cohort_users: i64 = dataset.p99_buckets.iter().map(|b| b.user_count).sum();
    if cohort_users == 0 {
        return Err(P99Error::ZeroUserTotal);
    }
    let cohort_cost: i64 = dataset
        .p99_buckets
        .iter()
        .map(|b| b.total_cost_microcents)
        .sum();
    if cohort_cost == 0 {
        return Err(P99Error::ZeroCostTotal);
    }

    let buckets = dataset
        .p99_buckets
        .iter()
        .map(|bucket| P99BucketShare {
            label: bucket.label.clone(),
            user_count: bucket.user_count,
            user_pct: bucket.user_count as f64 / cohort_users as f64 * 100.0,
            total_cost_microcents: bucket.total_cost_microcents,
            cost_pct: bucket.total_cost_microcents as f64 / cohort_cost as f64 * 100.0,
            avg_calls: bucket.avg_calls,
        })
        .collect();

    Ok(P99Overview {
        threshold_calls: stats.p99_threshold_calls,
        user_count: stats.p99_user_count,
        user_pct_of_total: stats.p99_user_count as f64 / stats.total_users as f64 * 100.0,
        total_cost_microcents: stats.p99_total_cost_microcents,
        cost_pct_of_total: stats.p99_total_cost_microcents as f64
            / stats.total_cost_microcents as f64
            * 100.0,
        buckets,
        stats: dataset.p99_stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::reference;

    #[test]
    fn test_overview_headline_matches_reference() {
        let overview = p99_overview(reference()).unwrap();
        assert_eq!(overview.threshold_calls, 4_996);
        assert_eq!(overview.user_count, 20_340);
        assert_eq!(overview.total_cost_microcents, 7_232_388_140_000);
        assert!((overview.user_pct_of_total - 0.9885).abs() < 1e-3);
        assert!((overview.cost_pct_of_total - 59.6995).abs() < 1e-3);
    }

    #[test]
    fn test_bucket_shares_sum_to_100() {
        let overview = p99_overview(reference()).unwrap();
        assert_eq!(overview.buckets.len(), 11);
        let user_sum: f64 = overview.buckets.iter().map(|b| b.user_pct).sum();
        let cost_sum: f64 = overview.buckets.iter().map(|b| b.cost_pct).sum();
        assert!((user_sum - 100.0).abs() < 1e-9);
        assert!((cost_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_shares_match_reference() {
        let overview = p99_overview(reference()).unwrap();
        let first = &overview.buckets[0];
        // 4,225 of 21,214 sampled users, $502,286 of $7,281,399
        assert_eq!(first.label, "5K-6K");
        assert!((first.user_pct - 19.9161).abs() < 1e-3);
        assert!((first.cost_pct - 6.8982).abs() < 1e-3);
    }

    #[test]
    fn test_summary_stats_pass_through() {
        let overview = p99_overview(reference()).unwrap();
        assert_eq!(overview.stats.min_calls, 4_937);
        assert_eq!(overview.stats.median_calls, 9_272);
        assert_eq!(overview.stats.max_calls, 225_066);
    }

    #[test]
    fn test_empty_bucket_table_rejected() {
        let mut dataset = reference().clone();
        dataset.p99_buckets.clear();
        assert!(matches!(p99_overview(&dataset), Err(P99Error::EmptyBuckets)));
    }

    #[test]
    fn test_zero_totals_rejected() {
        let mut dataset = reference().clone();
        dataset.key_stats.total_cost_microcents = 0;
        assert!(matches!(
            p99_overview(&dataset),
            Err(P99Error::InvalidTotals { .. })
        ));
    }
}
