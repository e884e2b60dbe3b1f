//! # Quality Cost Monitor
//!
//! A single-user dashboard core for Total Quality Management (TQM) cost
//! tracking: a CSV-backed table of quality-cost records, COGQ/COPQ KPI
//! aggregation, chart rendering, AI-generated improvement insights and a
//! monthly PDF report export.
//!
//! ## Core Concepts
//!
//! - **CostRecord**: one line item (month, category, cost, description);
//!   identity is structural and duplicate rows collapse to one
//! - **COGQ**: cost of good quality (Prevention + Appraisal sums)
//! - **COPQ**: cost of poor quality (Internal + External Failure sums)
//! - **Session**: explicit per-session context holding the table and the
//!   artifacts cached between interactions (KPI chart, generated texts)
//!
//! ## Example
//!
//! ```rust,ignore
//! use quality_cost_monitor::*;
//!
//! let mut session = Session::open("quality_data.csv")?;
//! session.add_record(Month::Jan, CostCategory::Prevention, 100.0, "training")?;
//!
//! if let Some(view) = session.dashboard()? {
//!     println!("total quality cost: {}", view.kpis.total);
//! }
//!
//! let client = CompletionClient::from_env();
//! session.generate_report(&client, Month::Jan)?;
//! let pdf_path = session.export_report()?;
//! ```

pub mod aggregate;
pub mod charts;
pub mod error;
pub mod ingestion;
pub mod llm;
pub mod report;
pub mod schema;
pub mod session;
pub mod store;
pub mod util;

pub use aggregate::{
    compute_kpis, monthly_trend, recent_trend, select_month, summarize_by_category,
    CategorySummary, KpiSnapshot, MonthlyTrend,
};
pub use charts::{
    category_breakdown, kpi_comparison, monthly_trend_chart, render_bar_png, render_line_png,
    render_pie_png, BarChart, LineChart, PieChart, DEFAULT_CHART_SIZE,
};
pub use error::{QualityCostError, Result};
pub use ingestion::{add_record, merge_upload};
pub use llm::{
    build_report_prompt, build_suggestion_prompt, CompletionClient, COMPLETION_MODEL,
    REPORT_TEMPERATURE, SUGGESTION_TEMPERATURE,
};
pub use report::{build_report, REPORT_FILE_NAME};
pub use schema::{CostCategory, CostRecord, Month, RecordTable};
pub use session::{DashboardView, Session, EMPTY_STATE_MESSAGE};
pub use store::{RecordStore, CSV_HEADER};
