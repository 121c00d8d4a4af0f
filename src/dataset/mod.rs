//! Reference dataset, file loading, and invariant validation.
//!
//! The embedded tables reproduce the source analytics extract verbatim and
//! double as the parity fixtures for the simulator tests. An alternate
//! dataset can be supplied as a TOML or JSON file with costs in dollars;
//! amounts are converted to microcents on load and the same invariants are
//! enforced before the data is used anywhere.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::models::{
    DistributionBucket, KeyStats, P99Bucket, P99Stats, PercentilePoint, SimulatorParams,
    ThresholdSample, UsageDataset,
};
use crate::pricing::dollars_to_microcents;

/// Relative tolerance for bucket sums against the stated totals.
const SUM_TOLERANCE: f64 = 0.005;

/// Absolute tolerance (percentage points) for stated vs recomputed shares.
const PCT_TOLERANCE: f64 = 0.05;

/// Errors constructing or loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read dataset file {1}: {0}")]
    Io(std::io::Error, PathBuf),

    #[error("Failed to parse TOML dataset: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("Failed to parse JSON dataset: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Unsupported dataset format {0}: expected a .toml or .json file")]
    UnsupportedFormat(PathBuf),

    #[error("Dataset validation error: {0}")]
    Validation(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedded reference data
// ─────────────────────────────────────────────────────────────────────────────

/// (percentile, llm_calls) per rank.
const PERCENTILE_ROWS: &[(f64, i64)] = &[
    (1.0, 1),
    (5.0, 5),
    (10.0, 11),
    (20.0, 22),
    (30.0, 32),
    (40.0, 45),
    (50.0, 59),
    (60.0, 78),
    (70.0, 100),
    (80.0, 145),
    (90.0, 301),
    (95.0, 626),
    (99.0, 4_864),
    (99.5, 9_251),
    (99.9, 26_196),
    (100.0, 225_066),
];

/// (label, user_count, user_pct, avg_calls, total_cost_usd,
///  avg_cost_per_user_usd, cost_per_call_usd) per call-volume range.
const DISTRIBUTION_ROWS: &[(&str, i64, f64, i64, f64, f64, f64)] = &[
    ("1-10", 201_880, 9.81, 5, 22_561.84, 0.25, 0.0238),
    ("11-25", 290_096, 14.10, 18, 76_513.93, 0.42, 0.0149),
    ("26-50", 423_867, 20.60, 37, 168_686.03, 0.47, 0.0108),
    ("51-100", 534_221, 25.96, 73, 440_967.37, 0.88, 0.0114),
    ("101-200", 305_081, 14.83, 138, 539_024.88, 1.87, 0.0128),
    ("201-500", 178_260, 8.66, 309, 840_252.50, 4.87, 0.0153),
    ("501-1K", 54_749, 2.66, 690, 650_262.47, 12.30, 0.0172),
    ("1K-2K", 27_031, 1.31, 1_397, 687_718.49, 26.25, 0.0182),
    ("2K-5K", 22_197, 1.08, 3_177, 1_456_276.24, 66.57, 0.0207),
    ("5K-10K", 11_020, 0.54, 7_012, 1_768_262.18, 161.21, 0.0229),
    ("10K-25K", 7_089, 0.34, 15_087, 2_707_505.95, 382.74, 0.0253),
    ("25K-50K", 1_782, 0.09, 33_493, 1_705_092.18, 956.84, 0.0286),
    ("50K+", 449, 0.02, 163_447, 1_051_527.83, 2_341.93, 0.0143),
];

/// (label, user_count, cohort_pct, total_cost_usd, avg_calls) for the
/// internal distribution of the top-1% cohort.
const P99_ROWS: &[(&str, i64, f64, i64, i64)] = &[
    ("5K-6K", 4_225, 19.92, 502_286, 5_357),
    ("6K-7K", 2_695, 12.70, 397_819, 6_476),
    ("7K-8K", 2_068, 9.75, 351_818, 7_489),
    ("8K-10K", 2_906, 13.70, 609_165, 8_937),
    ("10K-15K", 4_076, 19.21, 1_212_974, 12_184),
    ("15K-20K", 1_939, 9.14, 856_041, 17_194),
    ("20K-30K", 1_757, 8.28, 1_139_426, 24_239),
    ("30K-50K", 1_100, 5.19, 1_204_497, 37_323),
    ("50K-75K", 326, 1.54, 618_632, 60_168),
    ("75K-100K", 93, 0.44, 262_967, 85_122),
    ("100K+", 29, 0.14, 125_774, 127_832),
];

/// (call_limit, total_cost_usd, users_affected) spend-cap anchors.
const THRESHOLD_ROWS: &[(i64, i64, i64)] = &[
    (100, 1_548_917, 607_658),
    (250, 2_287_654, 246_696),
    (500, 3_277_752, 124_317),
    (750, 3_745_123, 87_376),
    (1_000, 4_175_017, 69_568),
    (1_250, 4_512_456, 59_876),
    (1_500, 4_807_297, 51_948),
    (1_750, 5_078_234, 46_789),
    (2_000, 5_322_163, 42_537),
    (2_500, 5_756_789, 36_543),
    (3_000, 6_153_044, 31_713),
    (4_000, 6_798_456, 25_234),
    (5_000, 7_351_243, 20_340),
    (7_500, 8_287_654, 13_456),
    (10_000, 9_075_755, 9_320),
];

static REFERENCE: Lazy<UsageDataset> = Lazy::new(build_reference);

/// The embedded reference dataset.
///
/// Validated by construction; `check(reference())` is asserted empty in the
/// test suite.
pub fn reference() -> &'static UsageDataset {
    &REFERENCE
}

/// Simulator constants matching the reference analysis.
///
/// The source rounds its headline total ($12,114,651.89) to whole dollars
/// for the simulator's baseline, and both values are carried so each
/// surface reproduces its source exactly.
pub fn reference_params() -> SimulatorParams {
    SimulatorParams {
        total_cost_current_microcents: 12_114_652 * 1_000_000,
        total_users: 2_057_722,
        annualization_months: 12,
    }
}

fn build_reference() -> UsageDataset {
    UsageDataset {
        percentiles: PERCENTILE_ROWS
            .iter()
            .map(|&(percentile, llm_calls)| PercentilePoint {
                percentile,
                llm_calls,
            })
            .collect(),
        buckets: DISTRIBUTION_ROWS
            .iter()
            .map(
                |&(label, user_count, user_pct, avg_calls, cost, per_user, per_call)| {
                    DistributionBucket {
                        label: label.to_string(),
                        user_count,
                        user_pct,
                        avg_calls,
                        total_cost_microcents: dollars_to_microcents(cost),
                        avg_cost_per_user_microcents: dollars_to_microcents(per_user),
                        cost_per_call_microcents: dollars_to_microcents(per_call),
                    }
                },
            )
            .collect(),
        p99_buckets: P99_ROWS
            .iter()
            .map(|&(label, user_count, cohort_pct, cost, avg_calls)| P99Bucket {
                label: label.to_string(),
                user_count,
                cohort_pct,
                total_cost_microcents: cost * 1_000_000,
                avg_calls,
            })
            .collect(),
        p99_stats: P99Stats {
            min_calls: 4_937,
            p25_calls: 6_552,
            median_calls: 9_272,
            p75_calls: 15_244,
            p90_calls: 26_294,
            max_calls: 225_066,
        },
        thresholds: THRESHOLD_ROWS
            .iter()
            .map(|&(call_limit, cost, users_affected)| ThresholdSample {
                call_limit,
                total_cost_microcents: cost * 1_000_000,
                users_affected,
            })
            .collect(),
        key_stats: KeyStats {
            total_users: 2_057_722,
            total_cost_microcents: dollars_to_microcents(12_114_651.89),
            total_calls: 621_194_292,
            avg_cost_per_call_microcents: dollars_to_microcents(0.0195),
            avg_calls_per_user: 302,
            median_calls: 59,
            max_calls: 225_066,
            p99_threshold_calls: 4_996,
            p99_user_count: 20_340,
            p99_total_cost_microcents: dollars_to_microcents(7_232_388.14),
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File loading
// ─────────────────────────────────────────────────────────────────────────────

/// File schema for a user-supplied dataset. Costs are in dollars and are
/// converted to microcents on load.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDataset {
    percentiles: Vec<PercentilePoint>,
    buckets: Vec<RawBucket>,
    p99_buckets: Vec<RawP99Bucket>,
    p99_stats: P99Stats,
    thresholds: Vec<RawThresholdSample>,
    key_stats: RawKeyStats,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBucket {
    label: String,
    user_count: i64,
    user_pct: f64,
    avg_calls: i64,
    total_cost_usd: f64,
    avg_cost_per_user_usd: f64,
    cost_per_call_usd: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawP99Bucket {
    label: String,
    user_count: i64,
    cohort_pct: f64,
    total_cost_usd: f64,
    avg_calls: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThresholdSample {
    call_limit: i64,
    total_cost_usd: f64,
    users_affected: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawKeyStats {
    total_users: i64,
    total_cost_usd: f64,
    total_calls: i64,
    avg_cost_per_call_usd: f64,
    avg_calls_per_user: i64,
    median_calls: i64,
    max_calls: i64,
    p99_threshold_calls: i64,
    p99_user_count: i64,
    p99_total_cost_usd: f64,
}

impl From<RawDataset> for UsageDataset {
    fn from(raw: RawDataset) -> Self {
        UsageDataset {
            percentiles: raw.percentiles,
            buckets: raw
                .buckets
                .into_iter()
                .map(|b| DistributionBucket {
                    label: b.label,
                    user_count: b.user_count,
                    user_pct: b.user_pct,
                    avg_calls: b.avg_calls,
                    total_cost_microcents: dollars_to_microcents(b.total_cost_usd),
                    avg_cost_per_user_microcents: dollars_to_microcents(b.avg_cost_per_user_usd),
                    cost_per_call_microcents: dollars_to_microcents(b.cost_per_call_usd),
                })
                .collect(),
            p99_buckets: raw
                .p99_buckets
                .into_iter()
                .map(|b| P99Bucket {
                    label: b.label,
                    user_count: b.user_count,
                    cohort_pct: b.cohort_pct,
                    total_cost_microcents: dollars_to_microcents(b.total_cost_usd),
                    avg_calls: b.avg_calls,
                })
                .collect(),
            p99_stats: raw.p99_stats,
            thresholds: raw
                .thresholds
                .into_iter()
                .map(|t| ThresholdSample {
                    call_limit: t.call_limit,
                    total_cost_microcents: dollars_to_microcents(t.total_cost_usd),
                    users_affected: t.users_affected,
                })
                .collect(),
            key_stats: KeyStats {
                total_users: raw.key_stats.total_users,
                total_cost_microcents: dollars_to_microcents(raw.key_stats.total_cost_usd),
                total_calls: raw.key_stats.total_calls,
                avg_cost_per_call_microcents: dollars_to_microcents(
                    raw.key_stats.avg_cost_per_call_usd,
                ),
                avg_calls_per_user: raw.key_stats.avg_calls_per_user,
                median_calls: raw.key_stats.median_calls,
                max_calls: raw.key_stats.max_calls,
                p99_threshold_calls: raw.key_stats.p99_threshold_calls,
                p99_user_count: raw.key_stats.p99_user_count,
                p99_total_cost_microcents: dollars_to_microcents(
                    raw.key_stats.p99_total_cost_usd,
                ),
            },
        }
    }
}

/// Load and validate a dataset from a TOML or JSON file, chosen by
/// extension.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<UsageDataset, DatasetError> {
    let path = path.as_ref();
    let contents =
        std::fs::read_to_string(path).map_err(|e| DatasetError::Io(e, path.to_path_buf()))?;

    let dataset = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => from_toml_str(&contents)?,
        Some("json") => from_json_str(&contents)?,
        _ => return Err(DatasetError::UnsupportedFormat(path.to_path_buf())),
    };

    tracing::info!(
        path = %path.display(),
        buckets = dataset.buckets.len(),
        thresholds = dataset.thresholds.len(),
        "loaded dataset"
    );

    Ok(dataset)
}

/// Parse and validate a dataset from a TOML document.
pub fn from_toml_str(contents: &str) -> Result<UsageDataset, DatasetError> {
    let raw: RawDataset = toml::from_str(contents)?;
    let dataset = UsageDataset::from(raw);
    validate(&dataset)?;
    Ok(dataset)
}

/// Parse and validate a dataset from a JSON document.
pub fn from_json_str(contents: &str) -> Result<UsageDataset, DatasetError> {
    let raw: RawDataset = serde_json::from_str(contents)?;
    let dataset = UsageDataset::from(raw);
    validate(&dataset)?;
    Ok(dataset)
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Validate a dataset, failing on the full list of violations.
pub fn validate(dataset: &UsageDataset) -> Result<(), DatasetError> {
    let violations = check(dataset);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(DatasetError::Validation(violations.join("; ")))
    }
}

/// Collect every invariant violation in the dataset.
///
/// Returns an empty vector for a well-formed dataset. The checks mirror the
/// relationships the reference data actually satisfies: the coarse buckets
/// partition the stated totals, the 5K+ side of the buckets matches the
/// stated P99 cohort, and the threshold anchors form a sorted curve with
/// non-decreasing cost. The internal P99 table is a separate sampling and
/// is only checked for internal consistency.
pub fn check(dataset: &UsageDataset) -> Vec<String> {
    let mut violations = Vec::new();
    let stats = &dataset.key_stats;

    if stats.total_users <= 0 {
        violations.push(format!("total_users must be positive, got {}", stats.total_users));
    }
    if stats.total_cost_microcents <= 0 {
        violations.push(format!(
            "total_cost must be positive, got {} microcents",
            stats.total_cost_microcents
        ));
    }
    if stats.p99_user_count > stats.total_users {
        violations.push(format!(
            "p99_user_count {} exceeds total_users {}",
            stats.p99_user_count, stats.total_users
        ));
    }

    check_percentiles(&dataset.percentiles, &mut violations);
    check_buckets(dataset, &mut violations);
    check_p99_buckets(&dataset.p99_buckets, &mut violations);
    check_thresholds(&dataset.thresholds, &mut violations);

    violations
}

fn check_percentiles(percentiles: &[PercentilePoint], violations: &mut Vec<String>) {
    if percentiles.is_empty() {
        violations.push("percentile table is empty".to_string());
        return;
    }
    for point in percentiles {
        if point.percentile <= 0.0 || point.percentile > 100.0 {
            violations.push(format!(
                "percentile rank {} is outside (0, 100]",
                point.percentile
            ));
        }
        if point.llm_calls < 0 {
            violations.push(format!(
                "negative call count {} at P{}",
                point.llm_calls, point.percentile
            ));
        }
    }
    for pair in percentiles.windows(2) {
        if pair[1].percentile <= pair[0].percentile {
            violations.push(format!(
                "percentile ranks not strictly increasing at P{}",
                pair[1].percentile
            ));
        }
        if pair[1].llm_calls <= pair[0].llm_calls {
            violations.push(format!(
                "call counts not strictly increasing at P{}",
                pair[1].percentile
            ));
        }
    }
}

fn check_buckets(dataset: &UsageDataset, violations: &mut Vec<String>) {
    let buckets = &dataset.buckets;
    let stats = &dataset.key_stats;

    if buckets.is_empty() {
        violations.push("distribution bucket table is empty".to_string());
        return;
    }

    for bucket in buckets {
        if bucket.user_count < 0 {
            violations.push(format!(
                "bucket {:?} has negative user_count {}",
                bucket.label, bucket.user_count
            ));
        }
        if bucket.total_cost_microcents < 0 {
            violations.push(format!(
                "bucket {:?} has negative cost {} microcents",
                bucket.label, bucket.total_cost_microcents
            ));
        }
        let stated_share = bucket.user_count as f64 / stats.total_users.max(1) as f64 * 100.0;
        if (stated_share - bucket.user_pct).abs() > PCT_TOLERANCE {
            violations.push(format!(
                "bucket {:?} states {}% of users but holds {:.2}%",
                bucket.label, bucket.user_pct, stated_share
            ));
        }
    }

    for pair in buckets.windows(2) {
        if pair[1].avg_calls <= pair[0].avg_calls {
            violations.push(format!(
                "buckets not ordered by call volume at {:?}",
                pair[1].label
            ));
        }
    }

    let user_sum: i64 = buckets.iter().map(|b| b.user_count).sum();
    if relative_gap(user_sum, stats.total_users) > SUM_TOLERANCE {
        violations.push(format!(
            "bucket user counts sum to {} but total_users is {}",
            user_sum, stats.total_users
        ));
    }

    let cost_sum: i64 = buckets.iter().map(|b| b.total_cost_microcents).sum();
    if relative_gap(cost_sum, stats.total_cost_microcents) > SUM_TOLERANCE {
        violations.push(format!(
            "bucket costs sum to {} microcents but total_cost is {}",
            cost_sum, stats.total_cost_microcents
        ));
    }

    // The stated P99 cohort is the 5K+ side of the coarse buckets.
    let heavy_users: i64 = buckets
        .iter()
        .filter(|b| b.avg_calls >= 5_000)
        .map(|b| b.user_count)
        .sum();
    if relative_gap(heavy_users, stats.p99_user_count) > SUM_TOLERANCE {
        violations.push(format!(
            "5K+ buckets hold {} users but p99_user_count is {}",
            heavy_users, stats.p99_user_count
        ));
    }
    let heavy_cost: i64 = buckets
        .iter()
        .filter(|b| b.avg_calls >= 5_000)
        .map(|b| b.total_cost_microcents)
        .sum();
    if relative_gap(heavy_cost, stats.p99_total_cost_microcents) > SUM_TOLERANCE {
        violations.push(format!(
            "5K+ buckets cost {} microcents but p99_total_cost is {}",
            heavy_cost, stats.p99_total_cost_microcents
        ));
    }
}

fn check_p99_buckets(p99_buckets: &[P99Bucket], violations: &mut Vec<String>) {
    if p99_buckets.is_empty() {
        violations.push("P99 internal bucket table is empty".to_string());
        return;
    }

    let cohort_users: i64 = p99_buckets.iter().map(|b| b.user_count).sum();
    for bucket in p99_buckets {
        if bucket.user_count < 0 {
            violations.push(format!(
                "P99 bucket {:?} has negative user_count {}",
                bucket.label, bucket.user_count
            ));
        }
        if bucket.total_cost_microcents < 0 {
            violations.push(format!(
                "P99 bucket {:?} has negative cost {} microcents",
                bucket.label, bucket.total_cost_microcents
            ));
        }
        let share = bucket.user_count as f64 / cohort_users.max(1) as f64 * 100.0;
        if (share - bucket.cohort_pct).abs() > PCT_TOLERANCE {
            violations.push(format!(
                "P99 bucket {:?} states {}% of the cohort but holds {:.2}%",
                bucket.label, bucket.cohort_pct, share
            ));
        }
    }

    for pair in p99_buckets.windows(2) {
        if pair[1].avg_calls <= pair[0].avg_calls {
            violations.push(format!(
                "P99 buckets not ordered by call volume at {:?}",
                pair[1].label
            ));
        }
    }
}

fn check_thresholds(thresholds: &[ThresholdSample], violations: &mut Vec<String>) {
    if thresholds.is_empty() {
        violations.push("threshold sample table is empty".to_string());
        return;
    }

    for sample in thresholds {
        if sample.call_limit <= 0 {
            violations.push(format!(
                "threshold sample has non-positive call_limit {}",
                sample.call_limit
            ));
        }
        if sample.users_affected < 0 {
            violations.push(format!(
                "threshold sample at limit {} has negative users_affected {}",
                sample.call_limit, sample.users_affected
            ));
        }
        if sample.total_cost_microcents < 0 {
            violations.push(format!(
                "threshold sample at limit {} has negative cost {}",
                sample.call_limit, sample.total_cost_microcents
            ));
        }
    }

    for pair in thresholds.windows(2) {
        if pair[1].call_limit <= pair[0].call_limit {
            violations.push(format!(
                "threshold limits not strictly ascending at {}",
                pair[1].call_limit
            ));
        }
        if pair[1].total_cost_microcents < pair[0].total_cost_microcents {
            violations.push(format!(
                "threshold cost decreases at limit {}",
                pair[1].call_limit
            ));
        }
    }
}

/// Relative difference between an observed sum and a stated total.
fn relative_gap(observed: i64, stated: i64) -> f64 {
    if stated == 0 {
        return if observed == 0 { 0.0 } else { f64::INFINITY };
    }
    (observed - stated).abs() as f64 / stated.abs() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_dataset_is_valid() {
        let violations = check(reference());
        assert!(violations.is_empty(), "unexpected violations: {violations:?}");
    }

    #[test]
    fn test_reference_table_shapes() {
        let dataset = reference();
        assert_eq!(dataset.percentiles.len(), 16);
        assert_eq!(dataset.buckets.len(), 13);
        assert_eq!(dataset.p99_buckets.len(), 11);
        assert_eq!(dataset.thresholds.len(), 15);
    }

    #[test]
    fn test_reference_bucket_sums_are_exact() {
        let dataset = reference();
        let user_sum: i64 = dataset.buckets.iter().map(|b| b.user_count).sum();
        assert_eq!(user_sum, dataset.key_stats.total_users);

        let cost_sum: i64 = dataset.buckets.iter().map(|b| b.total_cost_microcents).sum();
        assert_eq!(cost_sum, dataset.key_stats.total_cost_microcents);
    }

    #[test]
    fn test_reference_p99_cohort_matches_heavy_buckets() {
        let dataset = reference();
        let heavy_users: i64 = dataset
            .buckets
            .iter()
            .filter(|b| b.avg_calls >= 5_000)
            .map(|b| b.user_count)
            .sum();
        assert_eq!(heavy_users, dataset.key_stats.p99_user_count);

        let heavy_cost: i64 = dataset
            .buckets
            .iter()
            .filter(|b| b.avg_calls >= 5_000)
            .map(|b| b.total_cost_microcents)
            .sum();
        assert_eq!(heavy_cost, dataset.key_stats.p99_total_cost_microcents);
    }

    #[test]
    fn test_shuffled_thresholds_rejected() {
        let mut dataset = reference().clone();
        dataset.thresholds.swap(0, 14);
        let violations = check(&dataset);
        assert!(violations.iter().any(|v| v.contains("strictly ascending")));
    }

    #[test]
    fn test_decreasing_threshold_cost_rejected() {
        let mut dataset = reference().clone();
        dataset.thresholds[3].total_cost_microcents = 0;
        let violations = check(&dataset);
        assert!(violations.iter().any(|v| v.contains("cost decreases")));
    }

    #[test]
    fn test_inflated_bucket_sum_rejected() {
        let mut dataset = reference().clone();
        dataset.buckets[0].user_count += 1_000_000;
        let violations = check(&dataset);
        assert!(violations.iter().any(|v| v.contains("user counts sum")));
    }

    #[test]
    fn test_zero_totals_rejected() {
        let mut dataset = reference().clone();
        dataset.key_stats.total_users = 0;
        dataset.key_stats.total_cost_microcents = 0;
        let violations = check(&dataset);
        assert!(violations.iter().any(|v| v.contains("total_users")));
        assert!(violations.iter().any(|v| v.contains("total_cost")));
    }

    #[test]
    fn test_empty_percentiles_rejected() {
        let mut dataset = reference().clone();
        dataset.percentiles.clear();
        let violations = check(&dataset);
        assert!(violations.iter().any(|v| v.contains("percentile table is empty")));
    }

    #[test]
    fn test_validate_joins_violations() {
        let mut dataset = reference().clone();
        dataset.thresholds.clear();
        let err = validate(&dataset).unwrap_err();
        assert!(matches!(err, DatasetError::Validation(_)));
        assert!(err.to_string().contains("threshold sample table is empty"));
    }

    #[test]
    fn test_toml_dataset_parses_dollars() {
        let doc = r#"
            [[percentiles]]
            percentile = 50.0
            llm_calls = 10

            [[percentiles]]
            percentile = 99.0
            llm_calls = 100

            [[buckets]]
            label = "1-50"
            user_count = 900
            user_pct = 90.0
            avg_calls = 10
            total_cost_usd = 90.0
            avg_cost_per_user_usd = 0.10
            cost_per_call_usd = 0.01

            [[buckets]]
            label = "5K+"
            user_count = 100
            user_pct = 10.0
            avg_calls = 5000
            total_cost_usd = 910.0
            avg_cost_per_user_usd = 9.10
            cost_per_call_usd = 0.0018

            [[p99_buckets]]
            label = "5K-6K"
            user_count = 100
            cohort_pct = 100.0
            total_cost_usd = 910.0
            avg_calls = 5000

            [p99_stats]
            min_calls = 5000
            p25_calls = 5100
            median_calls = 5200
            p75_calls = 5300
            p90_calls = 5400
            max_calls = 5500

            [[thresholds]]
            call_limit = 100
            total_cost_usd = 500.0
            users_affected = 400

            [[thresholds]]
            call_limit = 1000
            total_cost_usd = 900.0
            users_affected = 50

            [key_stats]
            total_users = 1000
            total_cost_usd = 1000.0
            total_calls = 509000
            avg_cost_per_call_usd = 0.002
            avg_calls_per_user = 509
            median_calls = 10
            max_calls = 5500
            p99_threshold_calls = 4900
            p99_user_count = 100
            p99_total_cost_usd = 910.0
        "#;

        let dataset = from_toml_str(doc).unwrap();
        assert_eq!(dataset.buckets[0].total_cost_microcents, 90_000_000);
        assert_eq!(dataset.thresholds[1].total_cost_microcents, 900_000_000);
        assert_eq!(dataset.key_stats.total_cost_microcents, 1_000_000_000);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let doc = r#"{"percentiles": [], "buckets": [], "p99_buckets": [],
            "p99_stats": {"min_calls": 0, "p25_calls": 0, "median_calls": 0,
                          "p75_calls": 0, "p90_calls": 0, "max_calls": 0},
            "thresholds": [], "key_stats": {"total_users": 1,
            "total_cost_usd": 1.0, "total_calls": 1,
            "avg_cost_per_call_usd": 1.0, "avg_calls_per_user": 1,
            "median_calls": 1, "max_calls": 1, "p99_threshold_calls": 1,
            "p99_user_count": 1, "p99_total_cost_usd": 1.0},
            "surprise": true}"#;
        assert!(matches!(
            from_json_str(doc),
            Err(DatasetError::ParseJson(_))
        ));
    }
}
