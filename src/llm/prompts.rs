//! Prompt templates for the insight endpoints.
//!
//! Construction is deterministic string templating over the aggregates,
//! with no randomness and no network, so every template is unit-testable on
//! its own. The completion temperature is the only stochastic knob and
//! lives with the client call sites.

use crate::aggregate::{CategorySummary, KpiSnapshot, MonthlyTrend};
use crate::schema::{CostCategory, Month};
use std::fmt::Write;

/// Temperature used for improvement-suggestion completions.
pub const SUGGESTION_TEMPERATURE: f64 = 0.6;

/// Temperature used for monthly-report completions.
pub const REPORT_TEMPERATURE: f64 = 0.7;

/// One-line rendering of the four category sums, embedded in both prompts.
pub fn summary_text(summary: &CategorySummary) -> String {
    format!(
        "Prevention: ₹{:.0}, Appraisal: ₹{:.0}, Internal Failure: ₹{:.0}, External Failure: ₹{:.0}.",
        summary.get(CostCategory::Prevention),
        summary.get(CostCategory::Appraisal),
        summary.get(CostCategory::InternalFailure),
        summary.get(CostCategory::ExternalFailure),
    )
}

/// The TQM-consultant prompt asking for cost-reduction suggestions.
pub fn build_suggestion_prompt(summary: &CategorySummary) -> String {
    format!(
        "You are a professional Total Quality Management (TQM) consultant reviewing this company's cost data:\n\
         {}\n\n\
         Based on this information, write 3-4 short, data-driven recommendations to help management\n\
         reduce total quality cost next month. Your response should:\n\
         - Be concise (under 120 words total)\n\
         - Sound professional and personalized, not generic\n\
         - Reflect TQM principles like continuous improvement, prevention focus, and customer satisfaction\n\
         - Mention specific cost trends if relevant (e.g., if prevention cost is low, recommend increasing it)\n\n\
         Format the response in clean bullet points with short reasoning for each suggestion.",
        summary_text(summary)
    )
}

/// The Quality-Manager prompt asking for a short monthly report.
///
/// Embeds the selected month's total, the tail of the monthly trend, and the
/// COGQ/COPQ/total snapshot.
pub fn build_report_prompt(
    month: Month,
    month_total: f64,
    kpis: &KpiSnapshot,
    trend: &MonthlyTrend,
) -> String {
    let mut trend_text = String::new();
    for (m, total) in trend {
        let _ = writeln!(trend_text, "{}: ₹{:.0}", m, total);
    }

    format!(
        "You are a Quality Manager preparing a report for {month}.\n\
         Based on this data:\n\
         Report for {month}:\n\
         Total Quality Cost = ₹{month_total:.0}\n\n\
         Recent {n}-month trend:\n\
         {trend_text}\
         COGQ = ₹{cogq:.0}, COPQ = ₹{copq:.0}, Total = ₹{total:.0}.\n\n\
         Write a short (around 150 words) report highlighting:\n\
         - This month's quality cost performance\n\
         - Trend compared to previous months\n\
         - Recommendations for improvement next month\n\
         Keep it professional, concise, and insights-focused.",
        month = month,
        month_total = month_total,
        n = trend.len(),
        trend_text = trend_text,
        cogq = kpis.cogq,
        copq = kpis.copq,
        total = kpis.total,
    )
}
