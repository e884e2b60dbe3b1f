use crate::schema::{CostCategory, Month, RecordTable};
use std::collections::BTreeMap;

/// Summed cost per category. All four fixed categories are always present;
/// categories with no records carry a zero sum.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    sums: BTreeMap<CostCategory, f64>,
}

impl CategorySummary {
    pub fn get(&self, category: CostCategory) -> f64 {
        self.sums.get(&category).copied().unwrap_or(0.0)
    }

    /// Iterates the four categories in their fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (CostCategory, f64)> + '_ {
        self.sums.iter().map(|(c, v)| (*c, *v))
    }

    pub fn total(&self) -> f64 {
        self.sums.values().sum()
    }
}

/// The headline quality-cost indicators.
///
/// COGQ is the cost of good quality (Prevention + Appraisal), COPQ the cost
/// of poor quality (Internal + External Failure); total is their sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiSnapshot {
    pub cogq: f64,
    pub copq: f64,
    pub total: f64,
}

/// Month-ordered (month, summed cost) pairs; months with no records are
/// omitted rather than zero-filled.
pub type MonthlyTrend = Vec<(Month, f64)>;

/// Sums cost per category over the whole table. Categories absent from the
/// table yield a zero entry, never a missing key.
pub fn summarize_by_category(table: &RecordTable) -> CategorySummary {
    let mut sums: BTreeMap<CostCategory, f64> =
        CostCategory::ALL.iter().map(|c| (*c, 0.0)).collect();
    for record in table {
        *sums.entry(record.category).or_insert(0.0) += record.cost;
    }
    CategorySummary { sums }
}

/// Derives the KPI snapshot from a category summary. Cost values are used
/// as-is; there is no normalization or currency conversion.
pub fn compute_kpis(summary: &CategorySummary) -> KpiSnapshot {
    let cogq = summary.get(CostCategory::Prevention) + summary.get(CostCategory::Appraisal);
    let copq =
        summary.get(CostCategory::InternalFailure) + summary.get(CostCategory::ExternalFailure);
    KpiSnapshot {
        cogq,
        copq,
        total: cogq + copq,
    }
}

/// Groups by month, sums cost, and reindexes into the fixed Jan..Dec order.
/// Absent months are dropped from the series instead of shown as zero, so
/// the trend line never implies that a zero cost was recorded.
pub fn monthly_trend(table: &RecordTable) -> MonthlyTrend {
    let mut by_month: BTreeMap<Month, f64> = BTreeMap::new();
    for record in table {
        *by_month.entry(record.month).or_insert(0.0) += record.cost;
    }
    Month::ALL
        .iter()
        .filter_map(|m| by_month.get(m).map(|total| (*m, *total)))
        .collect()
}

/// Exact-match filter used for single-month reporting.
pub fn select_month(table: &RecordTable, month: Month) -> RecordTable {
    RecordTable::from_records(
        table
            .iter()
            .filter(|r| r.month == month)
            .cloned()
            .collect(),
    )
}

/// The last `n` entries of the monthly trend, in month order. This is the
/// tail of whatever months are present, not a window relative to "now".
pub fn recent_trend(table: &RecordTable, n: usize) -> MonthlyTrend {
    let trend = monthly_trend(table);
    let skip = trend.len().saturating_sub(n);
    trend.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CostRecord;

    fn sample_table() -> RecordTable {
        RecordTable::from_records(vec![
            CostRecord::new(Month::Jan, CostCategory::Prevention, 100.0, "x"),
            CostRecord::new(Month::Jan, CostCategory::Appraisal, 50.0, "y"),
            CostRecord::new(Month::Feb, CostCategory::InternalFailure, 30.0, "z"),
        ])
    }

    #[test]
    fn test_summary_has_all_four_keys_and_sums_to_total() {
        let summary = summarize_by_category(&sample_table());
        assert_eq!(summary.iter().count(), 4);
        assert_eq!(summary.get(CostCategory::Prevention), 100.0);
        assert_eq!(summary.get(CostCategory::Appraisal), 50.0);
        assert_eq!(summary.get(CostCategory::InternalFailure), 30.0);
        assert_eq!(summary.get(CostCategory::ExternalFailure), 0.0);
        assert_eq!(summary.total(), 180.0);
    }

    #[test]
    fn test_empty_table_summary_is_all_zeros() {
        let summary = summarize_by_category(&RecordTable::new());
        assert_eq!(summary.iter().count(), 4);
        for (_, sum) in summary.iter() {
            assert_eq!(sum, 0.0);
        }
    }

    #[test]
    fn test_kpis_match_reference_scenario() {
        let summary = summarize_by_category(&sample_table());
        let kpis = compute_kpis(&summary);
        assert_eq!(kpis.cogq, 150.0);
        assert_eq!(kpis.copq, 30.0);
        assert_eq!(kpis.total, 180.0);
        assert_eq!(kpis.cogq + kpis.copq, kpis.total);
    }

    #[test]
    fn test_monthly_trend_orders_and_omits_absent_months() {
        let trend = monthly_trend(&sample_table());
        assert_eq!(trend, vec![(Month::Jan, 150.0), (Month::Feb, 30.0)]);

        // Insertion order of the table does not matter.
        let reversed = RecordTable::from_records(vec![
            CostRecord::new(Month::Dec, CostCategory::Prevention, 5.0, "a"),
            CostRecord::new(Month::Mar, CostCategory::Appraisal, 7.0, "b"),
        ]);
        assert_eq!(
            monthly_trend(&reversed),
            vec![(Month::Mar, 7.0), (Month::Dec, 5.0)]
        );
    }

    #[test]
    fn test_select_month_filters_exactly() {
        let jan = select_month(&sample_table(), Month::Jan);
        assert_eq!(jan.len(), 2);
        assert!(jan.iter().all(|r| r.month == Month::Jan));

        let apr = select_month(&sample_table(), Month::Apr);
        assert!(apr.is_empty());
    }

    #[test]
    fn test_recent_trend_takes_tail_in_month_order() {
        let table = RecordTable::from_records(vec![
            CostRecord::new(Month::Jan, CostCategory::Prevention, 1.0, "a"),
            CostRecord::new(Month::Feb, CostCategory::Prevention, 2.0, "b"),
            CostRecord::new(Month::Mar, CostCategory::Prevention, 3.0, "c"),
            CostRecord::new(Month::Apr, CostCategory::Prevention, 4.0, "d"),
        ]);
        assert_eq!(
            recent_trend(&table, 3),
            vec![(Month::Feb, 2.0), (Month::Mar, 3.0), (Month::Apr, 4.0)]
        );
        assert_eq!(recent_trend(&table, 10).len(), 4);
    }
}
