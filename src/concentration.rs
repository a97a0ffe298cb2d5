//! Concentration ("Pareto/80-20") analysis.
//!
//! For each period (or a single implicit `TOTAL` period) the analyzer sums a
//! value column per group, orders groups by summed value descending with the
//! group key ascending as tie-break, and reports the minimal top slice whose
//! cumulative share stays within each requested threshold. Results are fully
//! deterministic: identical input yields byte-identical output.

use std::collections::BTreeMap;

use itertools::Itertools as _;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::Settings,
    data::{Cell, Column, Dataset},
    error::CoreError,
};

const TOTAL_PERIOD: &str = "TOTAL";
const NON_POSITIVE_TOTAL: &str = "Total value is non-positive; cannot compute concentration";

/// Validated analysis request. Thresholds must already be deduplicated, sorted
/// ascending, and within 1..=100 — the caller boundary owns that contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub group_by: String,
    pub value_column: String,
    pub period_key_column: Option<String>,
    pub thresholds: Vec<u32>,
}

/// Statistics for a single cumulative-share threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdStat {
    pub count: usize,
    pub value: f64,
    pub percentage: f64,
    pub sample_entities: Vec<String>,
}

/// One ranked row of a period's head sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeadRow {
    pub rank: usize,
    pub entity: String,
    pub value: f64,
    pub cumulative_value: f64,
    pub cumulative_percentage: f64,
}

/// Complete result for one period. A period either carries full statistics or
/// an `error` explaining why it could not be computed; never a partial mix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodConcentration {
    pub period: String,
    pub total_entities: usize,
    pub total_value: f64,
    pub concentration: BTreeMap<u32, ThresholdStat>,
    pub head_sample: Vec<HeadRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PeriodConcentration {
    fn failed(period: &str, error: String) -> Self {
        Self {
            period: period.to_string(),
            total_entities: 0,
            total_value: 0.0,
            concentration: BTreeMap::new(),
            head_sample: Vec::new(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodSummary {
    pub period: String,
    pub total_entities: usize,
    pub total_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub analysis_type: String,
    pub periods_analyzed: usize,
    pub thresholds: Vec<u32>,
    pub total_input_rows: usize,
    pub periods: Vec<PeriodSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConcentrationData {
    pub periods: BTreeMap<String, PeriodConcentration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

/// Echo of the inputs an analysis ran with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameters {
    pub group_by: String,
    pub value_column: String,
    pub period_key_column: Option<String>,
    pub thresholds: Vec<u32>,
    pub analysis_type: String,
}

/// One audited computation step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub step: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub metrics: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogEntry {
    fn completed(step: &str, period: Option<&str>) -> Self {
        Self {
            step: step.to_string(),
            status: "completed".to_string(),
            period: period.map(str::to_string),
            metrics: BTreeMap::new(),
            error: None,
        }
    }

    fn failed(step: &str, period: &str, error: &str) -> Self {
        Self {
            step: step.to_string(),
            status: "failed".to_string(),
            period: Some(period.to_string()),
            metrics: BTreeMap::new(),
            error: Some(error.to_string()),
        }
    }

    fn with_metric(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metrics.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConcentrationResult {
    pub data: ConcentrationData,
    pub parameters: Parameters,
    pub computation_log: Vec<LogEntry>,
    pub formulas: BTreeMap<String, String>,
}

/// Runs concentration analysis over a dataset. Periods are computed
/// independently: a period that fails records an error entry and does not
/// abort its siblings.
pub fn analyze(
    dataset: &Dataset,
    request: &AnalysisRequest,
    settings: &Settings,
) -> Result<ConcentrationResult, CoreError> {
    let group_column = dataset.require_column(&request.group_by)?;
    let value_column = dataset.require_column(&request.value_column)?;
    let period_column = match &request.period_key_column {
        Some(name) => Some(dataset.require_column(name)?),
        None => None,
    };
    debug_assert!(
        request.thresholds.windows(2).all(|w| w[0] < w[1])
            && request.thresholds.iter().all(|t| (1..=100).contains(t)),
        "thresholds must arrive sorted, unique, and in 1..=100"
    );

    let row_count = dataset.row_count();
    let all_rows: Vec<usize> = (0..row_count).collect();
    let mut log = Vec::new();
    let mut periods = BTreeMap::new();
    let mut summary = None;

    let analysis_type = if period_column.is_some() {
        "multi_period"
    } else {
        "single_period"
    };

    if let Some(period_column) = period_column {
        let mut rows_by_period: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for row in 0..row_count {
            if let Some(cell) = period_column.values[row].as_ref() {
                rows_by_period
                    .entry(cell.as_display())
                    .or_default()
                    .push(row);
            }
        }
        let period_labels: Vec<String> = rows_by_period.keys().cloned().collect();
        log.push(
            LogEntry::completed("period_identification", None)
                .with_metric("periods_found", serde_json::json!(period_labels.len()))
                .with_metric("periods", serde_json::json!(period_labels)),
        );

        for (label, rows) in &rows_by_period {
            let outcome = compute_period(
                label,
                rows,
                group_column,
                value_column,
                &request.thresholds,
                settings,
                &mut log,
            );
            periods.insert(label.clone(), outcome);
        }
        let total = compute_period(
            TOTAL_PERIOD,
            &all_rows,
            group_column,
            value_column,
            &request.thresholds,
            settings,
            &mut log,
        );
        periods.insert(TOTAL_PERIOD.to_string(), total);

        let period_summaries: Vec<PeriodSummary> = period_labels
            .iter()
            .filter_map(|label| periods.get(label))
            .map(|p| PeriodSummary {
                period: p.period.clone(),
                total_entities: p.total_entities,
                total_value: p.total_value,
            })
            .collect();
        summary = Some(RunSummary {
            analysis_type: analysis_type.to_string(),
            periods_analyzed: periods.len(),
            thresholds: request.thresholds.clone(),
            total_input_rows: row_count,
            periods: period_summaries,
        });
    } else {
        let outcome = compute_period(
            TOTAL_PERIOD,
            &all_rows,
            group_column,
            value_column,
            &request.thresholds,
            settings,
            &mut log,
        );
        periods.insert(TOTAL_PERIOD.to_string(), outcome);
    }

    debug!(
        "Concentration analysis over {} period(s), {} threshold(s)",
        periods.len(),
        request.thresholds.len()
    );

    Ok(ConcentrationResult {
        data: ConcentrationData { periods, summary },
        parameters: Parameters {
            group_by: request.group_by.clone(),
            value_column: request.value_column.clone(),
            period_key_column: request.period_key_column.clone(),
            thresholds: request.thresholds.clone(),
            analysis_type: analysis_type.to_string(),
        },
        computation_log: log,
        formulas: document_formulas(request, &request.thresholds),
    })
}

/// Aggregates and ranks one period's rows, turning failures into a period
/// error entry instead of propagating them.
fn compute_period(
    period: &str,
    rows: &[usize],
    group_column: &Column,
    value_column: &Column,
    thresholds: &[u32],
    settings: &Settings,
    log: &mut Vec<LogEntry>,
) -> PeriodConcentration {
    let mut groups: BTreeMap<String, f64> = BTreeMap::new();
    for &row in rows {
        let Some(group_cell) = group_column.values[row].as_ref() else {
            continue;
        };
        let entry = groups.entry(group_cell.as_display()).or_insert(0.0);
        match value_column.values[row].as_ref() {
            None => {}
            Some(Cell::Number(v)) => *entry += v,
            Some(_) => {
                let error = format!(
                    "Value column '{}' contains non-numeric data",
                    value_column.name
                );
                log.push(LogEntry::failed("aggregation", period, &error));
                return PeriodConcentration::failed(period, error);
            }
        }
    }

    log.push(
        LogEntry::completed("aggregation", Some(period))
            .with_metric("rows", serde_json::json!(rows.len()))
            .with_metric("groups", serde_json::json!(groups.len())),
    );

    let total_value: f64 = groups.values().sum();
    if total_value <= 0.0 {
        log.push(LogEntry::failed(
            "concentration_calculation",
            period,
            NON_POSITIVE_TOTAL,
        ));
        return PeriodConcentration::failed(period, NON_POSITIVE_TOTAL.to_string());
    }

    // Deterministic ranking: value descending, group key ascending on ties.
    let ranked: Vec<(String, f64)> = groups
        .into_iter()
        .sorted_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect();

    let mut cumulative = Vec::with_capacity(ranked.len());
    let mut running = 0.0;
    for (entity, value) in &ranked {
        running += value;
        cumulative.push((entity.clone(), *value, running, running / total_value * 100.0));
    }

    let mut concentration = BTreeMap::new();
    for &threshold in thresholds {
        let mut count = cumulative
            .iter()
            .take_while(|(_, _, _, pct)| *pct <= threshold as f64 + 1e-9)
            .count();
        // Every threshold reports at least the top group, even when that group
        // alone exceeds it.
        if count == 0 {
            count = 1;
        }
        let (_, _, cum_value, cum_pct) = cumulative[count - 1];
        concentration.insert(
            threshold,
            ThresholdStat {
                count,
                value: cum_value,
                percentage: round2(cum_pct),
                sample_entities: cumulative
                    .iter()
                    .take(count.min(settings.entity_sample_limit))
                    .map(|(entity, _, _, _)| entity.clone())
                    .collect(),
            },
        );
    }

    let head_sample: Vec<HeadRow> = cumulative
        .iter()
        .take(settings.head_sample_limit)
        .enumerate()
        .map(|(idx, (entity, value, cum_value, cum_pct))| HeadRow {
            rank: idx + 1,
            entity: entity.clone(),
            value: *value,
            cumulative_value: *cum_value,
            cumulative_percentage: round2(*cum_pct),
        })
        .collect();

    log.push(
        LogEntry::completed("concentration_calculation", Some(period))
            .with_metric("thresholds", serde_json::json!(thresholds.len())),
    );

    PeriodConcentration {
        period: period.to_string(),
        total_entities: ranked.len(),
        total_value,
        concentration,
        head_sample,
        error: None,
    }
}

fn document_formulas(request: &AnalysisRequest, thresholds: &[u32]) -> BTreeMap<String, String> {
    let mut formulas = BTreeMap::new();
    formulas.insert(
        "aggregation".to_string(),
        format!(
            "Sum of '{}' grouped by '{}'",
            request.value_column, request.group_by
        ),
    );
    formulas.insert(
        "sorting".to_string(),
        "Order groups by summed value descending, tie-broken by group key ascending".to_string(),
    );
    formulas.insert(
        "cumulative_percentage".to_string(),
        "cumulative_value / total_value * 100".to_string(),
    );
    for threshold in thresholds {
        formulas.insert(
            format!("top_{threshold}"),
            format!("Count entities where cumulative percentage <= {threshold}% of total (minimum one entity)"),
        );
    }
    formulas
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::default()
    }

    fn request(thresholds: &[u32]) -> AnalysisRequest {
        AnalysisRequest {
            group_by: "entity".to_string(),
            value_column: "revenue".to_string(),
            period_key_column: None,
            thresholds: thresholds.to_vec(),
        }
    }

    fn number_column(name: &str, values: &[f64]) -> Column {
        Column::new(
            name,
            values.iter().map(|v| Some(Cell::Number(*v))).collect(),
        )
    }

    fn five_entity_dataset() -> Dataset {
        Dataset::new(vec![
            Column::from_text("entity", &["A", "B", "C", "D", "E"]),
            number_column("revenue", &[100.0, 80.0, 60.0, 40.0, 20.0]),
        ])
    }

    #[test]
    fn single_period_scenario_matches_cumulative_rule() {
        let result = analyze(&five_entity_dataset(), &request(&[10, 20, 50]), &settings())
            .expect("analyze");

        assert_eq!(result.parameters.analysis_type, "single_period");
        let total = &result.data.periods["TOTAL"];
        assert_eq!(total.total_entities, 5);
        assert!((total.total_value - 300.0).abs() < 1e-9);

        // A alone is 33.33%: above 10 and 20, so the at-least-one rule applies;
        // adding B would push past 50, so top_50 is also A alone.
        for threshold in [10, 20, 50] {
            let stat = &total.concentration[&threshold];
            assert_eq!(stat.count, 1);
            assert!((stat.value - 100.0).abs() < 1e-9);
            assert!((stat.percentage - 33.33).abs() < 0.1);
            assert_eq!(stat.sample_entities, vec!["A".to_string()]);
        }
    }

    #[test]
    fn threshold_100_includes_every_entity() {
        let dataset = Dataset::new(vec![
            Column::from_text("entity", &["A", "B", "C"]),
            number_column("revenue", &[100.0, 50.0, 25.0]),
        ]);
        let result = analyze(&dataset, &request(&[10, 20, 100]), &settings()).expect("analyze");
        let top_100 = &result.data.periods["TOTAL"].concentration[&100];
        assert_eq!(top_100.count, 3);
        assert!((top_100.value - 175.0).abs() < 1e-9);
        assert!((top_100.percentage - 100.0).abs() < 0.1);
    }

    #[test]
    fn ties_break_by_entity_ascending() {
        let dataset = Dataset::new(vec![
            Column::from_text("entity", &["B", "A", "C"]),
            number_column("revenue", &[100.0, 100.0, 50.0]),
        ]);
        let result = analyze(&dataset, &request(&[10, 20, 50]), &settings()).expect("analyze");
        let head = &result.data.periods["TOTAL"].head_sample;
        assert_eq!(head[0].entity, "A");
        assert_eq!(head[1].entity, "B");
        assert_eq!(head[2].entity, "C");
    }

    #[test]
    fn analysis_is_deterministic_across_runs() {
        let dataset = five_entity_dataset();
        let first = analyze(&dataset, &request(&[10, 20, 50]), &settings()).expect("analyze");
        let second = analyze(&dataset, &request(&[10, 20, 50]), &settings()).expect("analyze");
        assert_eq!(first.data, second.data);
        assert_eq!(first.computation_log, second.computation_log);
    }

    #[test]
    fn multi_period_computes_each_period_and_total() {
        let dataset = Dataset::new(vec![
            Column::from_text("period_key", &["2023-Q1", "2023-Q1", "2023-Q2", "2023-Q2"]),
            Column::from_text("entity", &["A", "B", "A", "C"]),
            number_column("revenue", &[100.0, 50.0, 120.0, 80.0]),
        ]);
        let mut req = request(&[10, 20, 50]);
        req.period_key_column = Some("period_key".to_string());
        let result = analyze(&dataset, &req, &settings()).expect("analyze");

        assert_eq!(result.parameters.analysis_type, "multi_period");
        let q1 = &result.data.periods["2023-Q1"];
        assert_eq!(q1.total_entities, 2);
        assert!((q1.total_value - 150.0).abs() < 1e-9);
        let q2 = &result.data.periods["2023-Q2"];
        assert_eq!(q2.total_entities, 2);
        assert!((q2.total_value - 200.0).abs() < 1e-9);
        let total = &result.data.periods["TOTAL"];
        assert_eq!(total.total_entities, 3);
        assert!((total.total_value - 350.0).abs() < 1e-9);

        let summary = result.data.summary.as_ref().expect("summary");
        assert_eq!(summary.analysis_type, "multi_period");
        assert_eq!(summary.periods_analyzed, 3);
        assert_eq!(summary.total_input_rows, 4);
        assert_eq!(summary.periods.len(), 2);
    }

    #[test]
    fn periods_are_visited_in_sorted_order() {
        let dataset = Dataset::new(vec![
            Column::from_text("period_key", &["2023-Q3", "2023-Q1", "2023-Q2"]),
            Column::from_text("entity", &["A", "B", "C"]),
            number_column("revenue", &[100.0, 80.0, 60.0]),
        ]);
        let mut req = request(&[10, 20, 50]);
        req.period_key_column = Some("period_key".to_string());
        let result = analyze(&dataset, &req, &settings()).expect("analyze");

        let identification = result
            .computation_log
            .iter()
            .find(|entry| entry.step == "period_identification")
            .expect("identification step");
        assert_eq!(
            identification.metrics["periods"],
            serde_json::json!(["2023-Q1", "2023-Q2", "2023-Q3"])
        );
        assert_eq!(
            identification.metrics["periods_found"],
            serde_json::json!(3)
        );
    }

    #[test]
    fn zero_and_negative_values_rank_below_positives() {
        let dataset = Dataset::new(vec![
            Column::from_text("entity", &["A", "B", "C", "D"]),
            number_column("revenue", &[100.0, 0.0, -20.0, 50.0]),
        ]);
        let result = analyze(&dataset, &request(&[10, 20, 50]), &settings()).expect("analyze");
        let total = &result.data.periods["TOTAL"];
        assert!((total.total_value - 130.0).abs() < 1e-9);
        let order: Vec<&str> = total.head_sample.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(order, vec!["A", "D", "B", "C"]);
    }

    #[test]
    fn non_positive_totals_fail_the_period_only() {
        let all_negative = Dataset::new(vec![
            Column::from_text("entity", &["A", "B", "C"]),
            number_column("revenue", &[-100.0, -50.0, -25.0]),
        ]);
        let result = analyze(&all_negative, &request(&[10, 20, 50]), &settings()).expect("analyze");
        assert_eq!(
            result.data.periods["TOTAL"].error.as_deref(),
            Some(NON_POSITIVE_TOTAL)
        );
        assert!(!result.computation_log.is_empty());

        let sums_to_zero = Dataset::new(vec![
            Column::from_text("entity", &["A", "B", "C", "D"]),
            number_column("revenue", &[100.0, 50.0, -75.0, -75.0]),
        ]);
        let result = analyze(&sums_to_zero, &request(&[10, 20, 50]), &settings()).expect("analyze");
        assert_eq!(
            result.data.periods["TOTAL"].error.as_deref(),
            Some(NON_POSITIVE_TOTAL)
        );
    }

    #[test]
    fn failed_period_does_not_abort_siblings() {
        let dataset = Dataset::new(vec![
            Column::from_text("period_key", &["2023-Q1", "2023-Q1", "2023-Q2", "2023-Q2"]),
            Column::from_text("entity", &["A", "B", "A", "B"]),
            Column::new(
                "revenue",
                vec![
                    Some(Cell::Number(100.0)),
                    Some(Cell::Number(-100.0)),
                    Some(Cell::Number(120.0)),
                    Some(Cell::Number(80.0)),
                ],
            ),
        ]);
        let mut req = request(&[10, 20, 50]);
        req.period_key_column = Some("period_key".to_string());
        let result = analyze(&dataset, &req, &settings()).expect("analyze");

        assert!(result.data.periods["2023-Q1"].error.is_some());
        assert!(result.data.periods["2023-Q2"].error.is_none());
        assert!((result.data.periods["2023-Q2"].total_value - 200.0).abs() < 1e-9);
    }

    #[test]
    fn non_numeric_value_data_logs_failure_with_period() {
        let dataset = Dataset::new(vec![
            Column::from_text("entity", &["A", "B"]),
            Column::new(
                "revenue",
                vec![
                    Some(Cell::Number(100.0)),
                    Some(Cell::Text("invalid".to_string())),
                ],
            ),
        ]);
        let result = analyze(&dataset, &request(&[10, 20, 50]), &settings()).expect("analyze");
        let failures: Vec<&LogEntry> = result
            .computation_log
            .iter()
            .filter(|entry| entry.status == "failed")
            .collect();
        assert!(!failures.is_empty());
        assert_eq!(failures[0].period.as_deref(), Some("TOTAL"));
        assert!(result.data.periods["TOTAL"].error.is_some());
    }

    #[test]
    fn single_entity_saturates_every_threshold() {
        let dataset = Dataset::new(vec![
            Column::from_text("entity", &["A"]),
            number_column("revenue", &[500.0]),
        ]);
        let result = analyze(&dataset, &request(&[5, 25, 75]), &settings()).expect("analyze");
        let total = &result.data.periods["TOTAL"];
        for threshold in [5, 25, 75] {
            let stat = &total.concentration[&threshold];
            assert_eq!(stat.count, 1);
            assert!((stat.value - 500.0).abs() < 1e-9);
            assert!((stat.percentage - 100.0).abs() < 1e-9);
            assert_eq!(stat.sample_entities, vec!["A".to_string()]);
        }
    }

    #[test]
    fn extreme_thresholds_respect_prefix_rule() {
        let dataset = Dataset::new(vec![
            Column::from_text("entity", &["A", "B", "C", "D"]),
            number_column("revenue", &[1000.0, 100.0, 50.0, 10.0]),
        ]);
        let result = analyze(&dataset, &request(&[1, 99]), &settings()).expect("analyze");
        let concentration = &result.data.periods["TOTAL"].concentration;

        // A alone is 86.2% — far above 1%, but the minimum-one rule keeps it.
        let top_1 = &concentration[&1];
        assert_eq!(top_1.count, 1);
        assert!((top_1.value - 1000.0).abs() < 1e-9);

        // A+B is 94.8% <= 99, A+B+C is 99.1% > 99.
        let top_99 = &concentration[&99];
        assert_eq!(top_99.count, 2);
    }

    #[test]
    fn empty_dataset_reports_period_error() {
        let dataset = Dataset::new(vec![
            Column::from_text("entity", &[]),
            Column::from_text("revenue", &[]),
        ]);
        let result = analyze(&dataset, &request(&[10, 20, 50]), &settings()).expect("analyze");
        assert!(result.data.periods["TOTAL"].error.is_some());
    }

    #[test]
    fn missing_columns_are_contract_errors() {
        let dataset = five_entity_dataset();
        let mut req = request(&[10]);
        req.group_by = "nonexistent".to_string();
        let err = analyze(&dataset, &req, &settings()).unwrap_err();
        assert!(err.to_string().contains("nonexistent"));
    }

    #[test]
    fn computation_log_records_each_step() {
        let result = analyze(&five_entity_dataset(), &request(&[10, 20, 50]), &settings())
            .expect("analyze");
        let steps: Vec<&str> = result
            .computation_log
            .iter()
            .map(|entry| entry.step.as_str())
            .collect();
        assert!(steps.contains(&"aggregation"));
        assert!(steps.contains(&"concentration_calculation"));
    }

    #[test]
    fn formulas_document_every_quantity() {
        let result =
            analyze(&five_entity_dataset(), &request(&[10, 20, 50]), &settings()).expect("analyze");
        for key in [
            "aggregation",
            "sorting",
            "cumulative_percentage",
            "top_10",
            "top_20",
            "top_50",
        ] {
            assert!(result.formulas.contains_key(key), "missing formula {key}");
        }
    }

    #[test]
    fn head_sample_is_bounded_and_cumulative() {
        let entities: Vec<String> = (0..50).map(|i| format!("Entity_{i:02}")).collect();
        let entity_refs: Vec<&str> = entities.iter().map(String::as_str).collect();
        let values: Vec<f64> = (0..50).map(|i| 1000.0 - i as f64).collect();
        let dataset = Dataset::new(vec![
            Column::from_text("entity", &entity_refs),
            number_column("revenue", &values),
        ]);
        let result = analyze(&dataset, &request(&[10, 20, 50]), &settings()).expect("analyze");
        let head = &result.data.periods["TOTAL"].head_sample;
        assert_eq!(head.len(), 20);
        assert_eq!(head[0].rank, 1);
        assert!(head[0].cumulative_percentage <= head[19].cumulative_percentage);
    }

    #[test]
    fn identical_values_order_entities_lexicographically() {
        let entities: Vec<String> = (0..50).map(|i| format!("Entity_{i:02}")).collect();
        let entity_refs: Vec<&str> = entities.iter().map(String::as_str).collect();
        let dataset = Dataset::new(vec![
            Column::from_text("entity", &entity_refs),
            number_column("revenue", &vec![100.0; 50]),
        ]);
        let result = analyze(&dataset, &request(&[10, 20, 50]), &settings()).expect("analyze");
        let head = &result.data.periods["TOTAL"].head_sample;
        for (idx, row) in head.iter().enumerate() {
            assert_eq!(row.entity, format!("Entity_{idx:02}"));
        }
    }
}
