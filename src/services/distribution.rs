//! Concentration analytics over the distribution buckets.
//!
//! Answers the "who drives the cost" questions: cumulative user and cost
//! shares walking up the call-volume buckets (the Pareto view), and a
//! two-sided split at a call-volume boundary comparing per-user spend of
//! the heavy cohort against everyone else.

use crate::models::{CohortSplit, CumulativeShare, DistributionBucket};

/// Call-volume boundary that separates the top-1% cohort in the reference
/// data: every bucket averaging 5K+ calls per user is P99 territory.
pub const P99_BOUNDARY_CALLS: i64 = 5_000;

/// Error type for distribution analytics
#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    #[error("Distribution bucket table is empty")]
    EmptyBuckets,

    #[error("Bucket user counts sum to zero, shares are undefined")]
    ZeroUserTotal,

    #[error("Bucket costs sum to zero, shares are undefined")]
    ZeroCostTotal,

    #[error("No users {side} the {threshold_calls}-call boundary")]
    EmptyCohort {
        side: &'static str,
        threshold_calls: i64,
    },

    #[error("Per-user cost below the boundary is zero, ratio is undefined")]
    ZeroBaseline,
}

/// Per-bucket and cumulative shares of users and cost, ascending by call
/// volume.
///
/// Shares are recomputed from the counts, so the final row reaches exactly
/// 100% of both users and cost.
pub fn cumulative_shares(
    buckets: &[DistributionBucket],
) -> Result<Vec<CumulativeShare>, DistributionError> {
    if buckets.is_empty() {
        return Err(DistributionError::EmptyBuckets);
    }

    let total_users: i64 = buckets.iter().map(|b| b.user_count).sum();
    if total_users == 0 {
        return Err(DistributionError::ZeroUserTotal);
    }
    let total_cost: i64 = buckets.iter().map(|b| b.total_cost_microcents).sum();
    if total_cost == 0 {
        return Err(DistributionError::ZeroCostTotal);
    }

    let mut cumulative_users = 0i64;
    let mut cumulative_cost = 0i64;
    let shares = buckets
        .iter()
        .map(|bucket| {
            cumulative_users += bucket.user_count;
            cumulative_cost += bucket.total_cost_microcents;
            CumulativeShare {
                label: bucket.label.clone(),
                user_count: bucket.user_count,
                total_cost_microcents: bucket.total_cost_microcents,
                user_pct: bucket.user_count as f64 / total_users as f64 * 100.0,
                cost_pct: bucket.total_cost_microcents as f64 / total_cost as f64 * 100.0,
                cumulative_user_pct: cumulative_users as f64 / total_users as f64 * 100.0,
                cumulative_cost_pct: cumulative_cost as f64 / total_cost as f64 * 100.0,
            }
        })
        .collect();

    Ok(shares)
}

/// Split users and cost at a call-volume boundary.
///
/// Buckets whose average calls meet `threshold_calls` form the heavy side.
/// The ratio compares per-user spend between the two sides and is computed
/// before any integer truncation of the per-user figures.
pub fn cohort_split(
    buckets: &[DistributionBucket],
    threshold_calls: i64,
) -> Result<CohortSplit, DistributionError> {
    if buckets.is_empty() {
        return Err(DistributionError::EmptyBuckets);
    }

    let mut above_users = 0i64;
    let mut above_cost = 0i64;
    let mut below_users = 0i64;
    let mut below_cost = 0i64;
    for bucket in buckets {
        if bucket.avg_calls >= threshold_calls {
            above_users += bucket.user_count;
            above_cost += bucket.total_cost_microcents;
        } else {
            below_users += bucket.user_count;
            below_cost += bucket.total_cost_microcents;
        }
    }

    if above_users == 0 {
        return Err(DistributionError::EmptyCohort {
            side: "at or above",
            threshold_calls,
        });
    }
    if below_users == 0 {
        return Err(DistributionError::EmptyCohort {
            side: "below",
            threshold_calls,
        });
    }
    if below_cost == 0 {
        return Err(DistributionError::ZeroBaseline);
    }

    let total_users = above_users + below_users;
    let total_cost = above_cost + below_cost;

    let above_per_user = above_cost as f64 / above_users as f64;
    let below_per_user = below_cost as f64 / below_users as f64;

    Ok(CohortSplit {
        threshold_calls,
        above_users,
        above_cost_microcents: above_cost,
        above_user_pct: above_users as f64 / total_users as f64 * 100.0,
        above_cost_pct: above_cost as f64 / total_cost as f64 * 100.0,
        below_users,
        below_cost_microcents: below_cost,
        below_user_pct: below_users as f64 / total_users as f64 * 100.0,
        below_cost_pct: below_cost as f64 / total_cost as f64 * 100.0,
        above_cost_per_user_microcents: above_cost / above_users,
        below_cost_per_user_microcents: below_cost / below_users,
        cost_per_user_ratio: above_per_user / below_per_user,
    })
}
