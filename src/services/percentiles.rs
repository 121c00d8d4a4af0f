//! Lookups over the call-volume percentile table.
//!
//! # Algorithm
//!
//! A percentile query hits a stored anchor exactly or interpolates linearly
//! between the two bracketing anchors, truncating the interpolated call
//! count toward zero. Queries below the smallest stored percentile clamp to
//! it (same policy as the threshold simulator); percentiles outside
//! (0, 100] are rejected outright.

use crate::models::{PercentilePoint, PercentileRatio};
use crate::pricing::truncate_to_i64;

/// Error type for percentile analytics
#[derive(Debug, thiserror::Error)]
pub enum PercentileError {
    #[error("Percentile {0} is outside (0, 100]")]
    InvalidPercentile(f64),

    #[error("Percentile table is empty")]
    EmptyTable,

    #[error("Percentile table is not strictly ascending at P{0}")]
    UnsortedTable(f64),

    #[error("Percentile table has no P{0} anchor")]
    MissingAnchor(f64),

    #[error("Ratio {0:?} has a zero denominator")]
    ZeroDenominator(&'static str),
}

/// Call count at `percentile`, from the stored anchors.
///
/// Exact anchors return the stored count unchanged. `percentile` must lie
/// in (0, 100]; a query below the smallest anchor (or above the largest,
/// for tables that stop short of P100) clamps to the nearest anchor.
pub fn calls_at_percentile(
    points: &[PercentilePoint],
    percentile: f64,
) -> Result<i64, PercentileError> {
    if !(percentile > 0.0 && percentile <= 100.0) {
        return Err(PercentileError::InvalidPercentile(percentile));
    }
    check_points(points)?;

    let first = &points[0];
    let last = &points[points.len() - 1];
    let clamped = percentile.clamp(first.percentile, last.percentile);
    if clamped != percentile {
        tracing::warn!(
            percentile,
            effective = clamped,
            "percentile outside sampled range, clamping to nearest anchor"
        );
    }

    // Index of the first anchor at or above the query.
    let idx = points.partition_point(|point| point.percentile < clamped);
    let upper = &points[idx];
    if upper.percentile == clamped {
        return Ok(upper.llm_calls);
    }

    // Not an anchor, so the clamp guarantees a bracketing pair exists.
    let lower = &points[idx - 1];
    let ratio = (clamped - lower.percentile) / (upper.percentile - lower.percentile);
    let calls = lower.llm_calls as f64 + ratio * (upper.llm_calls - lower.llm_calls) as f64;
    Ok(truncate_to_i64(calls))
}

/// Condensed six-row lookup from the median to the P99.9 tail.
///
/// P75 has no stored anchor, so its call count comes out interpolated.
pub fn quick_reference(
    points: &[PercentilePoint],
) -> Result<Vec<PercentilePoint>, PercentileError> {
    [50.0, 75.0, 90.0, 95.0, 99.0, 99.9]
        .into_iter()
        .map(|percentile| {
            Ok(PercentilePoint {
                percentile,
                llm_calls: calls_at_percentile(points, percentile)?,
            })
        })
        .collect()
}

/// The headline spread ratios between high and mid percentiles.
///
/// Each row divides the call count at one anchor by another, so the table
/// must carry the P50, P90, P99, P99.9 and P100 anchors.
pub fn percentile_ratios(
    points: &[PercentilePoint],
) -> Result<Vec<PercentileRatio>, PercentileError> {
    check_points(points)?;

    let median = anchor(points, 50.0)?;
    let p90 = anchor(points, 90.0)?;
    let p99 = anchor(points, 99.0)?;
    let p999 = anchor(points, 99.9)?;
    let max = anchor(points, 100.0)?;

    Ok(vec![
        ratio_row("P99 vs Median", p99, median)?,
        ratio_row("P99 vs P90", p99, p90)?,
        ratio_row("Max vs P99", max, p99)?,
        ratio_row("P99.9 vs P99", p999, p99)?,
    ])
}

fn check_points(points: &[PercentilePoint]) -> Result<(), PercentileError> {
    if points.is_empty() {
        return Err(PercentileError::EmptyTable);
    }
    for pair in points.windows(2) {
        if pair[1].percentile <= pair[0].percentile {
            return Err(PercentileError::UnsortedTable(pair[1].percentile));
        }
    }
    Ok(())
}

fn anchor(points: &[PercentilePoint], percentile: f64) -> Result<i64, PercentileError> {
    points
        .iter()
        .find(|point| point.percentile == percentile)
        .map(|point| point.llm_calls)
        .ok_or(PercentileError::MissingAnchor(percentile))
}

fn ratio_row(
    label: &'static str,
    numerator: i64,
    denominator: i64,
) -> Result<PercentileRatio, PercentileError> {
    if denominator == 0 {
        return Err(PercentileError::ZeroDenominator(label));
    }
    Ok(PercentileRatio {
        label: label.to_string(),
        numerator_calls: numerator,
        denominator_calls: denominator,
        ratio: numerator as f64 / denominator as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::reference;

    fn point(percentile: f64, llm_calls: i64) -> PercentilePoint {
        PercentilePoint {
            percentile,
            llm_calls,
        }
    }

    #[test]
    fn test_anchor_percentiles_are_exact() {
        let points = &reference().percentiles;
        for (p, calls) in [
            (1.0, 1),
            (50.0, 59),
            (90.0, 301),
            (95.0, 626),
            (99.0, 4_864),
            (99.9, 26_196),
            (100.0, 225_066),
        ] {
            assert_eq!(calls_at_percentile(points, p).unwrap(), calls);
        }
    }

    #[test]
    fn test_interpolated_percentiles_truncate() {
        let points = &reference().percentiles;
        // P25 between P20 (22) and P30 (32): 22 + 0.5 * 10 = 27
        assert_eq!(calls_at_percentile(points, 25.0).unwrap(), 27);
        // P75 between P70 (100) and P80 (145): 100 + 0.5 * 45 = 122.5 -> 122
        assert_eq!(calls_at_percentile(points, 75.0).unwrap(), 122);
        // P85 between P80 (145) and P90 (301): 145 + 0.5 * 156 = 223
        assert_eq!(calls_at_percentile(points, 85.0).unwrap(), 223);
    }

    #[test]
    fn test_query_below_first_anchor_clamps() {
        let points = &reference().percentiles;
        assert_eq!(calls_at_percentile(points, 0.5).unwrap(), 1);
    }

    #[test]
    fn test_query_above_last_anchor_clamps() {
        let points = vec![point(50.0, 59), point(95.0, 626)];
        assert_eq!(calls_at_percentile(&points, 99.0).unwrap(), 626);
    }

    #[test]
    fn test_invalid_percentiles_rejected() {
        let points = &reference().percentiles;
        for p in [0.0, -3.0, 100.1, f64::NAN] {
            assert!(matches!(
                calls_at_percentile(points, p),
                Err(PercentileError::InvalidPercentile(_))
            ));
        }
    }

    #[test]
    fn test_empty_and_unsorted_tables_rejected() {
        assert!(matches!(
            calls_at_percentile(&[], 50.0),
            Err(PercentileError::EmptyTable)
        ));
        let shuffled = vec![point(50.0, 59), point(30.0, 32)];
        assert!(matches!(
            calls_at_percentile(&shuffled, 40.0),
            Err(PercentileError::UnsortedTable(_))
        ));
    }

    #[test]
    fn test_ratio_table_matches_reference() {
        let rows = percentile_ratios(&reference().percentiles).unwrap();
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].label, "P99 vs Median");
        assert_eq!((rows[0].numerator_calls, rows[0].denominator_calls), (4_864, 59));
        assert!((rows[0].ratio - 82.44).abs() < 0.01);

        assert_eq!(rows[1].label, "P99 vs P90");
        assert!((rows[1].ratio - 16.16).abs() < 0.01);

        assert_eq!(rows[2].label, "Max vs P99");
        assert!((rows[2].ratio - 46.27).abs() < 0.01);

        assert_eq!(rows[3].label, "P99.9 vs P99");
        assert!((rows[3].ratio - 5.39).abs() < 0.01);
    }

    #[test]
    fn test_missing_anchor_rejected() {
        let points = vec![point(50.0, 59), point(99.0, 4_864), point(100.0, 225_066)];
        assert!(matches!(
            percentile_ratios(&points),
            Err(PercentileError::MissingAnchor(p)) if p == 90.0
        ));
    }

    #[test]
    fn test_quick_reference_spans_median_to_tail() {
        let rows = quick_reference(&reference().percentiles).unwrap();
        let ranks: Vec<f64> = rows.iter().map(|row| row.percentile).collect();
        assert_eq!(ranks, vec![50.0, 75.0, 90.0, 95.0, 99.0, 99.9]);

        assert_eq!(rows[0].llm_calls, 59);
        // P75 sits halfway between the P70 (100) and P80 (145) anchors.
        assert_eq!(rows[1].llm_calls, 122);
        assert_eq!(rows[5].llm_calls, 26_196);
    }
}
