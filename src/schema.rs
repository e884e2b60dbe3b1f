use crate::error::{QualityCostError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Calendar months in the short form used by the persisted CSV (`Jan`..`Dec`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    /// All months in calendar order. Trend series are reindexed against this.
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }

    /// 0-based position in the calendar year (Jan = 0, Dec = 11).
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    pub fn parse(s: &str) -> Result<Self> {
        Month::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| {
                QualityCostError::Schema(format!(
                    "unknown month '{}': expected one of Jan..Dec",
                    s.trim()
                ))
            })
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four fixed TQM cost categories.
///
/// Serialized names match the persisted CSV tokens, including the spaces in
/// the failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CostCategory {
    Prevention,
    Appraisal,
    #[serde(rename = "Internal Failure")]
    InternalFailure,
    #[serde(rename = "External Failure")]
    ExternalFailure,
}

impl CostCategory {
    pub const ALL: [CostCategory; 4] = [
        CostCategory::Prevention,
        CostCategory::Appraisal,
        CostCategory::InternalFailure,
        CostCategory::ExternalFailure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CostCategory::Prevention => "Prevention",
            CostCategory::Appraisal => "Appraisal",
            CostCategory::InternalFailure => "Internal Failure",
            CostCategory::ExternalFailure => "External Failure",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        CostCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| {
                QualityCostError::Schema(format!(
                    "unknown category '{}': expected Prevention, Appraisal, Internal Failure or External Failure",
                    s.trim()
                ))
            })
    }
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One quality-cost line item. Identity is structural: two records are the
/// same row when all four fields match exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct CostRecord {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: Month,

    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: CostCategory,

    #[serde(rename = "Cost")]
    #[tabled(rename = "Cost")]
    pub cost: f64,

    #[serde(rename = "Description")]
    #[tabled(rename = "Description")]
    pub description: String,
}

impl CostRecord {
    pub fn new(
        month: Month,
        category: CostCategory,
        cost: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            month,
            category,
            cost,
            description: description.into(),
        }
    }

    /// Boundary validation, run once at ingestion. Cost must be a finite,
    /// non-negative amount.
    pub fn validate(&self) -> Result<()> {
        if !self.cost.is_finite() {
            return Err(QualityCostError::Schema(format!(
                "cost for '{}' is not a finite number",
                self.description
            )));
        }
        if self.cost < 0.0 {
            return Err(QualityCostError::Schema(format!(
                "cost {} for '{}' is negative",
                self.cost, self.description
            )));
        }
        Ok(())
    }
}

/// Ordered record table. Insertion order is preserved for first occurrences;
/// field-wise identical rows are collapsed to one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordTable {
    records: Vec<CostRecord>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from rows, collapsing duplicates (first occurrence wins).
    pub fn from_records(rows: Vec<CostRecord>) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.push_dedup(row);
        }
        table
    }

    pub fn records(&self) -> &[CostRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, record: &CostRecord) -> bool {
        self.records.iter().any(|r| r == record)
    }

    /// Appends a record unless an identical row already exists. Exact-row
    /// equality also collapses legitimately distinct entries that happen to
    /// share all four fields, matching the persisted-data semantics.
    ///
    /// Returns `true` if the record was inserted.
    pub fn push_dedup(&mut self, record: CostRecord) -> bool {
        if self.contains(&record) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CostRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a RecordTable {
    type Item = &'a CostRecord;
    type IntoIter = std::slice::Iter<'a, CostRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
