//! Spend-cap simulation over the threshold sample table.
//!
//! The sample table anchors a continuous response curve: modeled monthly
//! cost and affected-user count as a function of a per-user monthly call
//! limit. Queries at an anchor return the stored values unchanged; queries
//! between anchors interpolate linearly.
//!
//! # Algorithm
//!
//! - Find the tightest anchor pair bracketing the limit.
//! - Interpolate cost and users in f64: `lower + ratio * (upper - lower)`
//!   with `ratio = (limit - lower_limit) / (upper_limit - lower_limit)`.
//! - Cost truncates to the integer microcent; the affected-user count
//!   truncates toward zero, matching the source analysis which converted
//!   the interpolated float with a plain int cast.
//!
//! # Out-of-range queries
//!
//! A positive limit outside the sampled range clamps to the nearest anchor:
//! the curve is only trusted where it was sampled, and extrapolating above
//! the top anchor would project costs past the observed total. Non-positive
//! limits are rejected instead.

use crate::models::{SimulationResult, SimulatorParams, ThresholdSample};
use crate::pricing::{saturate_to_i64, truncate_to_i64};

/// Months used to annualize monthly savings when nothing else is configured.
pub const DEFAULT_ANNUALIZATION_MONTHS: i64 = 12;

/// Error type for spend-cap simulation
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("Invalid call limit: {0} (must be positive)")]
    InvalidLimit(i64),

    #[error("Threshold sample table is empty")]
    EmptySamples,

    #[error("Threshold sample table is not sorted strictly ascending at limit {0}")]
    UnsortedSamples(i64),

    #[error(
        "Simulator totals must be positive: total_cost_current={total_cost_current_microcents} microcents, total_users={total_users}"
    )]
    InvalidTotals {
        total_cost_current_microcents: i64,
        total_users: i64,
    },

    #[error("Annualization months must be positive, got {0}")]
    InvalidAnnualization(i64),
}

/// Simulate capping every user at `limit` monthly calls.
///
/// Pure function of its arguments: the same inputs always produce the same
/// result, and nothing is mutated, so concurrent calls are safe.
///
/// # Errors
///
/// - [`SimulatorError::InvalidLimit`] for a non-positive limit.
/// - [`SimulatorError::EmptySamples`] / [`SimulatorError::UnsortedSamples`]
///   for a malformed sample table.
/// - [`SimulatorError::InvalidTotals`] / [`SimulatorError::InvalidAnnualization`]
///   for non-positive derivation constants, which would otherwise divide by
///   zero or produce meaningless projections.
pub fn simulate(
    samples: &[ThresholdSample],
    limit: i64,
    params: &SimulatorParams,
) -> Result<SimulationResult, SimulatorError> {
    if limit <= 0 {
        return Err(SimulatorError::InvalidLimit(limit));
    }
    check_samples(samples)?;
    check_params(params)?;

    // check_samples guarantees at least one element
    let min_limit = samples[0].call_limit;
    let max_limit = samples[samples.len() - 1].call_limit;
    let effective = limit.clamp(min_limit, max_limit);
    if effective != limit {
        tracing::warn!(
            requested = limit,
            effective,
            "call limit outside sampled range, clamping to nearest anchor"
        );
    }

    let (cost_at_limit_microcents, users_affected) = value_at(samples, effective);

    let savings_microcents = saturate_to_i64(
        params.total_cost_current_microcents as i128 - cost_at_limit_microcents as i128,
    );
    let savings_pct =
        savings_microcents as f64 / params.total_cost_current_microcents as f64 * 100.0;
    let users_affected_pct = users_affected as f64 / params.total_users as f64 * 100.0;
    let yearly_savings_microcents =
        saturate_to_i64(savings_microcents as i128 * params.annualization_months as i128);

    let result = SimulationResult {
        requested_limit: limit,
        effective_limit: effective,
        cost_at_limit_microcents,
        users_affected,
        savings_microcents,
        savings_pct,
        users_affected_pct,
        yearly_savings_microcents,
    };

    tracing::debug!(
        limit,
        cost_microcents = result.cost_at_limit_microcents,
        users_affected = result.users_affected,
        savings_pct = result.savings_pct,
        "simulated spend cap"
    );

    Ok(result)
}

/// Evaluate the simulator at every anchor of the sample table.
///
/// Anchor queries are exact, so the curve reproduces the table itself plus
/// the derived savings fields, ordered ascending by limit.
pub fn savings_curve(
    samples: &[ThresholdSample],
    params: &SimulatorParams,
) -> Result<Vec<SimulationResult>, SimulatorError> {
    samples
        .iter()
        .map(|sample| simulate(samples, sample.call_limit, params))
        .collect()
}

/// Cost and affected users at a limit already clamped into the sampled
/// range. Exact anchor hits bypass interpolation entirely.
fn value_at(samples: &[ThresholdSample], limit: i64) -> (i64, i64) {
    let idx = samples.partition_point(|s| s.call_limit < limit);
    let upper = &samples[idx];
    if upper.call_limit == limit {
        return (upper.total_cost_microcents, upper.users_affected);
    }

    // Not an anchor, so the limit lies strictly between two of them
    let lower = &samples[idx - 1];
    let ratio = (limit - lower.call_limit) as f64
        / (upper.call_limit - lower.call_limit) as f64;
    let cost = lower.total_cost_microcents as f64
        + ratio * (upper.total_cost_microcents - lower.total_cost_microcents) as f64;
    let users = lower.users_affected as f64
        + ratio * (upper.users_affected - lower.users_affected) as f64;

    (truncate_to_i64(cost), truncate_to_i64(users))
}

fn check_samples(samples: &[ThresholdSample]) -> Result<(), SimulatorError> {
    if samples.is_empty() {
        return Err(SimulatorError::EmptySamples);
    }
    for pair in samples.windows(2) {
        if pair[1].call_limit <= pair[0].call_limit {
            return Err(SimulatorError::UnsortedSamples(pair[1].call_limit));
        }
    }
    Ok(())
}

fn check_params(params: &SimulatorParams) -> Result<(), SimulatorError> {
    if params.total_cost_current_microcents <= 0 || params.total_users <= 0 {
        return Err(SimulatorError::InvalidTotals {
            total_cost_current_microcents: params.total_cost_current_microcents,
            total_users: params.total_users,
        });
    }
    if params.annualization_months <= 0 {
        return Err(SimulatorError::InvalidAnnualization(
            params.annualization_months,
        ));
    }
    Ok(())
}
