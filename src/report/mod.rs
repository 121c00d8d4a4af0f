//! Report rendering for the computed analytics.
//!
//! Renders any selection of sections as aligned text, JSON, or CSV, to a
//! writer chosen by the caller (stdout or a file). Rendering never computes
//! anything itself; every number comes from the dataset or the service
//! layer.
//!
//! JSON output carries the typed results as stored (costs in microcents,
//! named `*_microcents`). CSV output is meant for spreadsheets and carries
//! costs in dollars.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::models::{
    CohortSplit, CumulativeShare, DistributionBucket, KeyStats, P99Overview, PercentilePoint,
    PercentileRatio, SimulationResult, SimulatorParams, ThresholdSample, UsageDataset,
};
use crate::pricing::{format_count, format_dollars, format_dollars_whole, microcents_to_dollars};
use crate::services::distribution::{self, P99_BOUNDARY_CALLS};
use crate::services::{p99, percentiles, simulator};

/// Report sections, one per analysis view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Section {
    /// Headline usage and cost statistics.
    Summary,
    /// Call volume by percentile rank, with spread ratios.
    Percentiles,
    /// Users and cost by call-volume bucket.
    Distribution,
    /// Cumulative user/cost shares and the heavy-cohort split.
    Pareto,
    /// Deep dive into the top-1% cohort.
    P99,
    /// The spend-cap anchor table.
    Thresholds,
    /// Simulator results at every anchor.
    Curve,
}

impl Section {
    /// Every section, in rendering order.
    pub fn all() -> &'static [Section] {
        &[
            Section::Summary,
            Section::Percentiles,
            Section::Distribution,
            Section::Pareto,
            Section::P99,
            Section::Thresholds,
            Section::Curve,
        ]
    }

    fn name(self) -> &'static str {
        match self {
            Section::Summary => "summary",
            Section::Percentiles => "percentiles",
            Section::Distribution => "distribution",
            Section::Pareto => "pareto",
            Section::P99 => "p99",
            Section::Thresholds => "thresholds",
            Section::Curve => "curve",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Section::Summary => "Summary",
            Section::Percentiles => "Percentiles",
            Section::Distribution => "Usage distribution",
            Section::Pareto => "Cost concentration",
            Section::P99 => "Top 1% deep dive",
            Section::Thresholds => "Spend-cap anchors",
            Section::Curve => "Savings curve",
        }
    }
}

/// Output format for reports and simulation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// Aligned plain-text tables.
    #[default]
    Text,
    /// Pretty-printed JSON envelope.
    Json,
    /// Comma-separated values, one block per section.
    #[cfg(feature = "csv-export")]
    Csv,
}

/// Report rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to write {1}: {0}")]
    File(std::io::Error, PathBuf),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "csv-export")]
    #[error("Failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Simulator(#[from] simulator::SimulatorError),

    #[error(transparent)]
    Distribution(#[from] distribution::DistributionError),

    #[error(transparent)]
    Percentiles(#[from] percentiles::PercentileError),

    #[error(transparent)]
    P99(#[from] p99::P99Error),
}

/// Computed payload of one section, ready for any renderer.
enum SectionData {
    Summary(KeyStats),
    Percentiles {
        points: Vec<PercentilePoint>,
        quick: Vec<PercentilePoint>,
        ratios: Vec<PercentileRatio>,
    },
    Distribution(Vec<DistributionBucket>),
    Pareto {
        shares: Vec<CumulativeShare>,
        split: CohortSplit,
    },
    P99(P99Overview),
    Thresholds(Vec<ThresholdSample>),
    Curve(Vec<SimulationResult>),
}

/// Render the chosen sections to stdout or a file.
pub fn write_report(
    dataset: &UsageDataset,
    params: &SimulatorParams,
    sections: &[Section],
    format: ReportFormat,
    output: Option<&Path>,
) -> Result<(), ReportError> {
    match output {
        Some(path) => {
            let mut file =
                std::fs::File::create(path).map_err(|e| ReportError::File(e, path.to_path_buf()))?;
            render(dataset, params, sections, format, &mut file)?;
            tracing::info!(path = %path.display(), "report written");
            Ok(())
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            render(dataset, params, sections, format, &mut lock)
        }
    }
}

/// Render the chosen sections to a writer.
pub fn render(
    dataset: &UsageDataset,
    params: &SimulatorParams,
    sections: &[Section],
    format: ReportFormat,
    out: &mut dyn Write,
) -> Result<(), ReportError> {
    match format {
        ReportFormat::Text => render_text(dataset, params, sections, out),
        ReportFormat::Json => render_json(dataset, params, sections, out),
        #[cfg(feature = "csv-export")]
        ReportFormat::Csv => render_csv(dataset, params, sections, out),
    }
}

/// Render a single simulation result.
pub fn render_simulation(
    result: &SimulationResult,
    format: ReportFormat,
    out: &mut dyn Write,
) -> Result<(), ReportError> {
    match format {
        ReportFormat::Text => {
            writeln!(
                out,
                "Spend-cap simulation at {} calls/user/month",
                format_count(result.requested_limit)
            )?;
            if result.was_clamped() {
                writeln!(
                    out,
                    "  (limit outside the sampled range, evaluated at {})",
                    format_count(result.effective_limit)
                )?;
            }
            writeln!(out)?;
            writeln!(
                out,
                "  {:<24} {:>16}",
                "Projected monthly cost",
                format_dollars_whole(result.cost_at_limit_microcents)
            )?;
            writeln!(
                out,
                "  {:<24} {:>16}  ({:.1}% of current spend)",
                "Monthly savings",
                format_dollars_whole(result.savings_microcents),
                result.savings_pct
            )?;
            writeln!(
                out,
                "  {:<24} {:>16}",
                "Yearly savings",
                format_dollars_whole(result.yearly_savings_microcents)
            )?;
            writeln!(
                out,
                "  {:<24} {:>16}  ({:.2}% of all users)",
                "Users affected",
                format_count(result.users_affected),
                result.users_affected_pct
            )?;
            Ok(())
        }
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, result)?;
            writeln!(out)?;
            Ok(())
        }
        #[cfg(feature = "csv-export")]
        ReportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(&mut *out);
            wtr.write_record([
                "requested_limit",
                "effective_limit",
                "cost_at_limit_usd",
                "users_affected",
                "savings_usd",
                "savings_pct",
                "users_affected_pct",
                "yearly_savings_usd",
            ])?;
            wtr.write_record([
                result.requested_limit.to_string(),
                result.effective_limit.to_string(),
                format!(
                    "{:.2}",
                    microcents_to_dollars(result.cost_at_limit_microcents)
                ),
                result.users_affected.to_string(),
                format!("{:.2}", microcents_to_dollars(result.savings_microcents)),
                format!("{:.4}", result.savings_pct),
                format!("{:.4}", result.users_affected_pct),
                format!(
                    "{:.2}",
                    microcents_to_dollars(result.yearly_savings_microcents)
                ),
            ])?;
            wtr.flush()?;
            Ok(())
        }
    }
}

fn build(
    dataset: &UsageDataset,
    params: &SimulatorParams,
    section: Section,
) -> Result<SectionData, ReportError> {
    Ok(match section {
        Section::Summary => SectionData::Summary(dataset.key_stats),
        Section::Percentiles => SectionData::Percentiles {
            points: dataset.percentiles.clone(),
            quick: percentiles::quick_reference(&dataset.percentiles)?,
            ratios: percentiles::percentile_ratios(&dataset.percentiles)?,
        },
        Section::Distribution => SectionData::Distribution(dataset.buckets.clone()),
        Section::Pareto => SectionData::Pareto {
            shares: distribution::cumulative_shares(&dataset.buckets)?,
            split: distribution::cohort_split(&dataset.buckets, P99_BOUNDARY_CALLS)?,
        },
        Section::P99 => SectionData::P99(p99::p99_overview(dataset)?),
        Section::Thresholds => SectionData::Thresholds(dataset.thresholds.clone()),
        Section::Curve => SectionData::Curve(simulator::savings_curve(
            &dataset.thresholds,
            params,
        )?),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Text
// ─────────────────────────────────────────────────────────────────────────────

fn render_text(
    dataset: &UsageDataset,
    params: &SimulatorParams,
    sections: &[Section],
    out: &mut dyn Write,
) -> Result<(), ReportError> {
    writeln!(out, "LLM usage cost report")?;
    writeln!(out, "Generated at {}", chrono::Utc::now().to_rfc3339())?;

    for section in sections {
        let data = build(dataset, params, *section)?;
        writeln!(out)?;
        writeln!(out, "== {} ==", section.title())?;
        text_section(&data, out)?;
    }
    Ok(())
}

fn text_section(data: &SectionData, out: &mut dyn Write) -> Result<(), ReportError> {
    match data {
        SectionData::Summary(stats) => {
            writeln!(out, "  {:<22} {:>16}", "Total users", format_count(stats.total_users))?;
            writeln!(
                out,
                "  {:<22} {:>16}",
                "Total monthly cost",
                format_dollars(stats.total_cost_microcents)
            )?;
            writeln!(
                out,
                "  {:<22} {:>16}",
                "Total monthly calls",
                format_count(stats.total_calls)
            )?;
            writeln!(
                out,
                "  {:<22} {:>16}",
                "Avg cost per call",
                format!(
                    "${:.4}",
                    microcents_to_dollars(stats.avg_cost_per_call_microcents)
                )
            )?;
            writeln!(
                out,
                "  {:<22} {:>16}",
                "Avg calls per user",
                format_count(stats.avg_calls_per_user)
            )?;
            writeln!(
                out,
                "  {:<22} {:>16}",
                "Median calls per user",
                format_count(stats.median_calls)
            )?;
            writeln!(
                out,
                "  {:<22} {:>16}",
                "Max calls per user",
                format_count(stats.max_calls)
            )?;
            writeln!(
                out,
                "  {:<22} {:>16}",
                "P99 threshold (calls)",
                format_count(stats.p99_threshold_calls)
            )?;
            writeln!(
                out,
                "  {:<22} {:>16}",
                "P99 cohort users",
                format_count(stats.p99_user_count)
            )?;
            writeln!(
                out,
                "  {:<22} {:>16}",
                "P99 cohort cost",
                format_dollars(stats.p99_total_cost_microcents)
            )?;
        }
        SectionData::Percentiles {
            points,
            quick,
            ratios,
        } => {
            writeln!(out, "  {:<12} {:>12}", "Percentile", "Calls/user")?;
            for point in points {
                writeln!(
                    out,
                    "  {:<12} {:>12}",
                    format!("P{}", point.percentile),
                    format_count(point.llm_calls)
                )?;
            }
            writeln!(out)?;
            writeln!(out, "  Quick reference")?;
            for point in quick {
                writeln!(
                    out,
                    "  {:<12} {:>12}",
                    format!("P{}", point.percentile),
                    format_count(point.llm_calls)
                )?;
            }
            writeln!(out)?;
            writeln!(out, "  Spread ratios")?;
            for ratio in ratios {
                writeln!(
                    out,
                    "  {:<14} {:>5.0}x   ({} vs {})",
                    ratio.label,
                    ratio.ratio,
                    format_count(ratio.numerator_calls),
                    format_count(ratio.denominator_calls)
                )?;
            }
        }
        SectionData::Distribution(buckets) => {
            writeln!(
                out,
                "  {:<10} {:>9} {:>8} {:>10} {:>15} {:>11} {:>10}",
                "Range", "Users", "Users %", "Avg calls", "Total cost", "Cost/user", "Cost/call"
            )?;
            for bucket in buckets {
                writeln!(
                    out,
                    "  {:<10} {:>9} {:>7.2}% {:>10} {:>15} {:>11} {:>10}",
                    bucket.label,
                    format_count(bucket.user_count),
                    bucket.user_pct,
                    format_count(bucket.avg_calls),
                    format_dollars(bucket.total_cost_microcents),
                    format_dollars(bucket.avg_cost_per_user_microcents),
                    format!(
                        "${:.4}",
                        microcents_to_dollars(bucket.cost_per_call_microcents)
                    )
                )?;
            }
        }
        SectionData::Pareto { shares, split } => {
            writeln!(
                out,
                "  {:<10} {:>8} {:>8} {:>12} {:>11}",
                "Range", "Users %", "Cost %", "Cum users %", "Cum cost %"
            )?;
            for share in shares {
                writeln!(
                    out,
                    "  {:<10} {:>7.2}% {:>7.2}% {:>11.2}% {:>10.2}%",
                    share.label,
                    share.user_pct,
                    share.cost_pct,
                    share.cumulative_user_pct,
                    share.cumulative_cost_pct
                )?;
            }
            writeln!(out)?;
            writeln!(
                out,
                "  Split at {} calls/month:",
                format_count(split.threshold_calls)
            )?;
            writeln!(
                out,
                "    Heavy cohort: {} users ({:.2}%) spend {} ({:.2}%)",
                format_count(split.above_users),
                split.above_user_pct,
                format_dollars(split.above_cost_microcents),
                split.above_cost_pct
            )?;
            writeln!(
                out,
                "    Everyone else: {} users ({:.2}%) spend {} ({:.2}%)",
                format_count(split.below_users),
                split.below_user_pct,
                format_dollars(split.below_cost_microcents),
                split.below_cost_pct
            )?;
            writeln!(
                out,
                "    Per-user spend ratio: {:.0}x ({} vs {})",
                split.cost_per_user_ratio,
                format_dollars(split.above_cost_per_user_microcents),
                format_dollars(split.below_cost_per_user_microcents)
            )?;
        }
        SectionData::P99(overview) => {
            writeln!(
                out,
                "  Cohort: {} users ({:.2}% of all) costing {}/month ({:.2}% of spend)",
                format_count(overview.user_count),
                overview.user_pct_of_total,
                format_dollars(overview.total_cost_microcents),
                overview.cost_pct_of_total
            )?;
            writeln!(
                out,
                "  Entry threshold: {} calls/month",
                format_count(overview.threshold_calls)
            )?;
            writeln!(out)?;
            writeln!(
                out,
                "  {:<10} {:>8} {:>9} {:>15} {:>8} {:>10}",
                "Range", "Users", "Users %", "Total cost", "Cost %", "Avg calls"
            )?;
            for bucket in &overview.buckets {
                writeln!(
                    out,
                    "  {:<10} {:>8} {:>8.2}% {:>15} {:>7.2}% {:>10}",
                    bucket.label,
                    format_count(bucket.user_count),
                    bucket.user_pct,
                    format_dollars(bucket.total_cost_microcents),
                    bucket.cost_pct,
                    format_count(bucket.avg_calls)
                )?;
            }
            writeln!(out)?;
            let stats = &overview.stats;
            writeln!(
                out,
                "  Calls within cohort: min {} / P25 {} / median {} / P75 {} / P90 {} / max {}",
                format_count(stats.min_calls),
                format_count(stats.p25_calls),
                format_count(stats.median_calls),
                format_count(stats.p75_calls),
                format_count(stats.p90_calls),
                format_count(stats.max_calls)
            )?;
        }
        SectionData::Thresholds(samples) => {
            writeln!(
                out,
                "  {:<10} {:>14} {:>15}",
                "Limit", "Monthly cost", "Users affected"
            )?;
            for sample in samples {
                writeln!(
                    out,
                    "  {:<10} {:>14} {:>15}",
                    format_count(sample.call_limit),
                    format_dollars_whole(sample.total_cost_microcents),
                    format_count(sample.users_affected)
                )?;
            }
        }
        SectionData::Curve(results) => {
            writeln!(
                out,
                "  {:<8} {:>13} {:>13} {:>9} {:>10} {:>8} {:>15}",
                "Limit", "Monthly cost", "Savings", "Savings %", "Affected", "Users %", "Yearly savings"
            )?;
            for result in results {
                writeln!(
                    out,
                    "  {:<8} {:>13} {:>13} {:>8.1}% {:>10} {:>7.2}% {:>15}",
                    format_count(result.effective_limit),
                    format_dollars_whole(result.cost_at_limit_microcents),
                    format_dollars_whole(result.savings_microcents),
                    result.savings_pct,
                    format_count(result.users_affected),
                    result.users_affected_pct,
                    format_dollars_whole(result.yearly_savings_microcents)
                )?;
            }
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonEnvelope {
    generated_at: String,
    sections: serde_json::Map<String, serde_json::Value>,
}

fn render_json(
    dataset: &UsageDataset,
    params: &SimulatorParams,
    sections: &[Section],
    out: &mut dyn Write,
) -> Result<(), ReportError> {
    let mut map = serde_json::Map::new();
    for section in sections {
        let data = build(dataset, params, *section)?;
        map.insert(section.name().to_string(), json_section(&data)?);
    }

    let envelope = JsonEnvelope {
        generated_at: chrono::Utc::now().to_rfc3339(),
        sections: map,
    };
    serde_json::to_writer_pretty(&mut *out, &envelope)?;
    writeln!(out)?;
    Ok(())
}

fn json_section(data: &SectionData) -> Result<serde_json::Value, serde_json::Error> {
    match data {
        SectionData::Summary(stats) => serde_json::to_value(stats),
        SectionData::Percentiles {
            points,
            quick,
            ratios,
        } => Ok(serde_json::json!({
            "points": points,
            "quick_reference": quick,
            "ratios": ratios,
        })),
        SectionData::Distribution(buckets) => serde_json::to_value(buckets),
        SectionData::Pareto { shares, split } => Ok(serde_json::json!({
            "shares": shares,
            "split": split,
        })),
        SectionData::P99(overview) => serde_json::to_value(overview),
        SectionData::Thresholds(samples) => serde_json::to_value(samples),
        SectionData::Curve(results) => serde_json::to_value(results),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CSV
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "csv-export")]
fn render_csv(
    dataset: &UsageDataset,
    params: &SimulatorParams,
    sections: &[Section],
    out: &mut dyn Write,
) -> Result<(), ReportError> {
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        let data = build(dataset, params, *section)?;
        // Flexible: a section may stack tables of different widths.
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(&mut *out);
        csv_section(&data, &mut wtr)?;
        wtr.flush()?;
    }
    Ok(())
}

#[cfg(feature = "csv-export")]
fn csv_section(
    data: &SectionData,
    wtr: &mut csv::Writer<&mut (dyn Write + '_)>,
) -> Result<(), ReportError> {
    fn dollars(microcents: i64) -> String {
        format!("{:.2}", microcents_to_dollars(microcents))
    }
    fn pct(value: f64) -> String {
        format!("{value:.4}")
    }

    match data {
        SectionData::Summary(stats) => {
            wtr.write_record(["metric", "value"])?;
            wtr.write_record(["total_users", stats.total_users.to_string().as_str()])?;
            wtr.write_record(["total_cost_usd", dollars(stats.total_cost_microcents).as_str()])?;
            wtr.write_record(["total_calls", stats.total_calls.to_string().as_str()])?;
            wtr.write_record([
                "avg_cost_per_call_usd",
                format!(
                    "{:.4}",
                    microcents_to_dollars(stats.avg_cost_per_call_microcents)
                )
                .as_str(),
            ])?;
            wtr.write_record([
                "avg_calls_per_user",
                stats.avg_calls_per_user.to_string().as_str(),
            ])?;
            wtr.write_record(["median_calls", stats.median_calls.to_string().as_str()])?;
            wtr.write_record(["max_calls", stats.max_calls.to_string().as_str()])?;
            wtr.write_record([
                "p99_threshold_calls",
                stats.p99_threshold_calls.to_string().as_str(),
            ])?;
            wtr.write_record(["p99_user_count", stats.p99_user_count.to_string().as_str()])?;
            wtr.write_record([
                "p99_total_cost_usd",
                dollars(stats.p99_total_cost_microcents).as_str(),
            ])?;
        }
        SectionData::Percentiles {
            points,
            quick,
            ratios,
        } => {
            wtr.write_record(["percentile", "llm_calls"])?;
            for point in points {
                wtr.write_record([point.percentile.to_string(), point.llm_calls.to_string()])?;
            }
            wtr.write_record(["reference_percentile", "llm_calls"])?;
            for point in quick {
                wtr.write_record([point.percentile.to_string(), point.llm_calls.to_string()])?;
            }
            wtr.write_record(["label", "ratio"])?;
            for ratio in ratios {
                wtr.write_record([ratio.label.clone(), format!("{:.4}", ratio.ratio)])?;
            }
        }
        SectionData::Distribution(buckets) => {
            wtr.write_record([
                "range",
                "users",
                "user_pct",
                "avg_calls",
                "total_cost_usd",
                "avg_cost_per_user_usd",
                "cost_per_call_usd",
            ])?;
            for bucket in buckets {
                wtr.write_record([
                    bucket.label.clone(),
                    bucket.user_count.to_string(),
                    pct(bucket.user_pct),
                    bucket.avg_calls.to_string(),
                    dollars(bucket.total_cost_microcents),
                    dollars(bucket.avg_cost_per_user_microcents),
                    format!(
                        "{:.4}",
                        microcents_to_dollars(bucket.cost_per_call_microcents)
                    ),
                ])?;
            }
        }
        SectionData::Pareto { shares, split } => {
            wtr.write_record([
                "range",
                "users",
                "total_cost_usd",
                "user_pct",
                "cost_pct",
                "cumulative_user_pct",
                "cumulative_cost_pct",
            ])?;
            for share in shares {
                wtr.write_record([
                    share.label.clone(),
                    share.user_count.to_string(),
                    dollars(share.total_cost_microcents),
                    pct(share.user_pct),
                    pct(share.cost_pct),
                    pct(share.cumulative_user_pct),
                    pct(share.cumulative_cost_pct),
                ])?;
            }
            wtr.write_record([
                "threshold_calls",
                "above_users",
                "above_cost_usd",
                "above_user_pct",
                "above_cost_pct",
                "below_users",
                "below_cost_usd",
                "cost_per_user_ratio",
            ])?;
            wtr.write_record([
                split.threshold_calls.to_string(),
                split.above_users.to_string(),
                dollars(split.above_cost_microcents),
                pct(split.above_user_pct),
                pct(split.above_cost_pct),
                split.below_users.to_string(),
                dollars(split.below_cost_microcents),
                format!("{:.4}", split.cost_per_user_ratio),
            ])?;
        }
        SectionData::P99(overview) => {
            wtr.write_record([
                "range",
                "users",
                "user_pct",
                "total_cost_usd",
                "cost_pct",
                "avg_calls",
            ])?;
            for bucket in &overview.buckets {
                wtr.write_record([
                    bucket.label.clone(),
                    bucket.user_count.to_string(),
                    pct(bucket.user_pct),
                    dollars(bucket.total_cost_microcents),
                    pct(bucket.cost_pct),
                    bucket.avg_calls.to_string(),
                ])?;
            }
        }
        SectionData::Thresholds(samples) => {
            wtr.write_record(["call_limit", "total_cost_usd", "users_affected"])?;
            for sample in samples {
                wtr.write_record([
                    sample.call_limit.to_string(),
                    dollars(sample.total_cost_microcents),
                    sample.users_affected.to_string(),
                ])?;
            }
        }
        SectionData::Curve(results) => {
            wtr.write_record([
                "call_limit",
                "total_cost_usd",
                "savings_usd",
                "savings_pct",
                "users_affected",
                "users_affected_pct",
                "yearly_savings_usd",
            ])?;
            for result in results {
                wtr.write_record([
                    result.effective_limit.to_string(),
                    dollars(result.cost_at_limit_microcents),
                    dollars(result.savings_microcents),
                    pct(result.savings_pct),
                    result.users_affected.to_string(),
                    pct(result.users_affected_pct),
                    dollars(result.yearly_savings_microcents),
                ])?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{reference, reference_params};
    use crate::services::simulator::simulate;

    fn render_to_string(sections: &[Section], format: ReportFormat) -> String {
        let mut buf = Vec::new();
        render(
            reference(),
            &reference_params(),
            sections,
            format,
            &mut buf,
        )
        .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_report_covers_all_sections() {
        let text = render_to_string(Section::all(), ReportFormat::Text);

        for section in Section::all() {
            assert!(
                text.contains(&format!("== {} ==", section.title())),
                "missing section {:?}",
                section
            );
        }
        assert!(text.contains("$12,114,651.89"));
        assert!(text.contains("2,057,722"));
        assert!(text.contains("Quick reference"));
        // curve rows are anchor-exact
        assert!(text.contains("$3,277,752"));
    }

    #[test]
    fn test_text_pareto_names_the_heavy_cohort() {
        let text = render_to_string(&[Section::Pareto], ReportFormat::Text);

        assert!(text.contains("Split at 5,000 calls/month"));
        assert!(text.contains("20,340 users"));
        assert!(text.contains("148x"));
    }

    #[test]
    fn test_json_report_parses_back() {
        let text = render_to_string(Section::all(), ReportFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert!(value["generated_at"].is_string());
        let sections = value["sections"].as_object().unwrap();
        assert_eq!(sections.len(), Section::all().len());
        assert_eq!(sections["summary"]["total_users"], 2_057_722);
        assert_eq!(
            sections["curve"][2]["cost_at_limit_microcents"],
            3_277_752_000_000i64
        );
        assert_eq!(sections["thresholds"][0]["call_limit"], 100);
        // P75 is interpolated, the other quick-reference rows are anchors
        assert_eq!(
            sections["percentiles"]["quick_reference"][1]["llm_calls"],
            122
        );
    }

    #[cfg(feature = "csv-export")]
    #[test]
    fn test_csv_thresholds_parse_back() {
        let text = render_to_string(&[Section::Thresholds], ReportFormat::Csv);
        let mut reader = csv::Reader::from_reader(text.as_bytes());

        let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 15);
        assert_eq!(&rows[0][0], "100");
        assert_eq!(&rows[0][1], "1548917.00");
        assert_eq!(&rows[14][2], "9320");
    }

    #[cfg(feature = "csv-export")]
    #[test]
    fn test_csv_renders_every_section() {
        let text = render_to_string(Section::all(), ReportFormat::Csv);

        for header in [
            "metric,value",
            "percentile,llm_calls",
            "reference_percentile,llm_calls",
            "label,ratio",
            "range,users,user_pct,avg_calls",
            "threshold_calls,above_users",
            "range,users,user_pct,total_cost_usd",
            "call_limit,total_cost_usd,users_affected",
            "call_limit,total_cost_usd,savings_usd",
        ] {
            assert!(text.contains(header), "missing csv header {header}");
        }
    }

    #[cfg(feature = "csv-export")]
    #[test]
    fn test_csv_multiple_sections_are_separated() {
        let text = render_to_string(
            &[Section::Thresholds, Section::Distribution],
            ReportFormat::Csv,
        );

        assert!(text.contains("call_limit,total_cost_usd,users_affected"));
        assert!(text.contains("range,users,user_pct"));
        assert!(text.contains("\n\n"), "sections should be blank-line separated");
    }

    #[test]
    fn test_simulation_text_mentions_clamp() {
        let result = simulate(&reference().thresholds, 20_000, &reference_params()).unwrap();
        let mut buf = Vec::new();
        render_simulation(&result, ReportFormat::Text, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("20,000"));
        assert!(text.contains("evaluated at 10,000"));
        assert!(text.contains("$9,075,755"));
    }

    #[test]
    fn test_simulation_json_round_trips() {
        let result = simulate(&reference().thresholds, 1_500, &reference_params()).unwrap();
        let mut buf = Vec::new();
        render_simulation(&result, ReportFormat::Json, &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["cost_at_limit_microcents"], 4_807_297_000_000i64);
        assert_eq!(value["users_affected"], 51_948);
    }
}
