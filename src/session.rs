use crate::aggregate::{
    compute_kpis, monthly_trend, recent_trend, select_month, summarize_by_category,
    CategorySummary, KpiSnapshot, MonthlyTrend,
};
use crate::charts::{
    category_breakdown, kpi_comparison, monthly_trend_chart, render_bar_png, render_line_png,
    render_pie_png, DEFAULT_CHART_SIZE,
};
use crate::error::{QualityCostError, Result};
use crate::ingestion;
use crate::llm::{
    build_report_prompt, build_suggestion_prompt, CompletionClient, REPORT_TEMPERATURE,
    SUGGESTION_TEMPERATURE,
};
use crate::report::{build_report, REPORT_FILE_NAME};
use crate::schema::{CostCategory, Month, RecordTable};
use crate::store::RecordStore;
use log::info;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Shown whenever a view is requested against an empty table.
pub const EMPTY_STATE_MESSAGE: &str =
    "No data available. Please upload or add some records first.";

const KPI_CHART_FILE: &str = "kpi_chart.png";
const BREAKDOWN_CHART_FILE: &str = "category_breakdown.png";
const TREND_CHART_FILE: &str = "monthly_trend.png";

/// Everything the dashboard view presents for a non-empty table.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub summary: CategorySummary,
    pub kpis: KpiSnapshot,
    pub trend: MonthlyTrend,
    pub kpi_chart: PathBuf,
    pub breakdown_chart: PathBuf,
    pub trend_chart: PathBuf,
}

/// Session-scoped context: the record store, the in-memory table (single
/// source of truth while the process runs) and the artifacts cached between
/// interactions (the rasterized KPI chart and the generated texts).
///
/// This is an explicit context object rather than a process singleton, so
/// multiple sessions could coexist later without redesign. Interactions run
/// to completion one at a time; there is no locking because there is no
/// concurrent access within a session.
pub struct Session {
    store: RecordStore,
    table: RecordTable,
    artifact_dir: PathBuf,
    kpi_chart: Option<PathBuf>,
    suggestions: Option<String>,
    report: Option<String>,
}

impl Session {
    /// Loads the persisted table (empty if the file does not exist yet).
    /// A load failure here is the one fatal error of the application.
    pub fn open(data_path: impl Into<PathBuf>) -> Result<Self> {
        let store = RecordStore::new(data_path);
        let table = store.load()?;
        let artifact_dir = store
            .path()
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        info!("session opened with {} records", table.len());
        Ok(Self {
            store,
            table,
            artifact_dir,
            kpi_chart: None,
            suggestions: None,
            report: None,
        })
    }

    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    pub fn suggestions(&self) -> Option<&str> {
        self.suggestions.as_deref()
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn kpi_chart(&self) -> Option<&Path> {
        self.kpi_chart.as_deref()
    }

    /// Months that currently have records, in calendar order. The report
    /// selector only offers these.
    pub fn available_months(&self) -> Vec<Month> {
        monthly_trend(&self.table)
            .into_iter()
            .map(|(month, _)| month)
            .collect()
    }

    /// Merges an uploaded CSV file into the table and persists the result
    /// before returning. Returns the number of newly added rows.
    pub fn upload_file(&mut self, path: &Path) -> Result<usize> {
        let file = fs::File::open(path)?;
        self.upload(file)
    }

    /// Reader-based variant of [`Session::upload_file`]. A schema error
    /// leaves both the in-memory table and the persisted file untouched.
    pub fn upload<R: Read>(&mut self, reader: R) -> Result<usize> {
        let merged = ingestion::merge_upload(&self.table, reader)?;
        let added = merged.len() - self.table.len();
        self.store.save(&merged)?;
        self.table = merged;
        Ok(added)
    }

    /// Adds one manually entered record and persists the result. Returns
    /// `false` when the record was an exact duplicate and nothing changed.
    pub fn add_record(
        &mut self,
        month: Month,
        category: CostCategory,
        cost: f64,
        description: impl Into<String>,
    ) -> Result<bool> {
        let updated = ingestion::add_record(&self.table, month, category, cost, description)?;
        let added = updated.len() > self.table.len();
        self.store.save(&updated)?;
        self.table = updated;
        Ok(added)
    }

    /// Computes the KPI view and renders all three dashboard charts. The KPI
    /// comparison chart path is cached for the report exporter. Returns
    /// `None` for an empty table so the caller can show the empty state
    /// instead of plotting nothing.
    pub fn dashboard(&mut self) -> Result<Option<DashboardView>> {
        if self.table.is_empty() {
            return Ok(None);
        }

        let summary = summarize_by_category(&self.table);
        let kpis = compute_kpis(&summary);
        let trend = monthly_trend(&self.table);

        let kpi_chart = self.artifact_dir.join(KPI_CHART_FILE);
        render_bar_png(&kpi_comparison(&kpis), &kpi_chart, DEFAULT_CHART_SIZE)?;

        let breakdown_chart = self.artifact_dir.join(BREAKDOWN_CHART_FILE);
        render_pie_png(
            &category_breakdown(&summary),
            &breakdown_chart,
            DEFAULT_CHART_SIZE,
        )?;

        let trend_chart = self.artifact_dir.join(TREND_CHART_FILE);
        render_line_png(
            &monthly_trend_chart(&trend),
            &trend_chart,
            DEFAULT_CHART_SIZE,
        )?;

        self.kpi_chart = Some(kpi_chart.clone());
        Ok(Some(DashboardView {
            summary,
            kpis,
            trend,
            kpi_chart,
            breakdown_chart,
            trend_chart,
        }))
    }

    /// Requests improvement suggestions for the current category summary.
    /// The cached text is cleared before the call, so a failed interaction
    /// leaves no stale insight behind. Returns `None` for an empty table.
    pub fn generate_suggestions(
        &mut self,
        client: &CompletionClient,
    ) -> Result<Option<&str>> {
        if self.table.is_empty() {
            return Ok(None);
        }
        self.suggestions = None;

        let prompt = build_suggestion_prompt(&summarize_by_category(&self.table));
        let text = client.request_completion(&prompt, SUGGESTION_TEMPERATURE)?;
        self.suggestions = Some(text);
        Ok(self.suggestions.as_deref())
    }

    /// Requests the monthly report text for one of the available months.
    /// Returns `None` for an empty table; a month without records is a
    /// schema error naming the valid choices.
    pub fn generate_report(
        &mut self,
        client: &CompletionClient,
        month: Month,
    ) -> Result<Option<&str>> {
        if self.table.is_empty() {
            return Ok(None);
        }

        let month_table = select_month(&self.table, month);
        if month_table.is_empty() {
            return Err(QualityCostError::Schema(format!(
                "no records for {}; available months: {}",
                month,
                self.available_months()
                    .iter()
                    .map(Month::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        self.report = None;

        let kpis = compute_kpis(&summarize_by_category(&self.table));
        let month_total: f64 = month_table.iter().map(|r| r.cost).sum();
        let trend = recent_trend(&self.table, 3);

        let prompt = build_report_prompt(month, month_total, &kpis, &trend);
        let text = client.request_completion(&prompt, REPORT_TEMPERATURE)?;
        self.report = Some(text);
        Ok(self.report.as_deref())
    }

    /// Assembles the PDF from the cached chart and report text and writes it
    /// to the fixed file name next to the data file. Fails with a
    /// missing-prerequisite directive when either artifact is absent; in
    /// that case no file is produced.
    pub fn export_report(&self) -> Result<PathBuf> {
        let kpis = compute_kpis(&summarize_by_category(&self.table));
        let bytes = build_report(&kpis, self.report.as_deref(), self.kpi_chart.as_deref())?;

        let out_path = self.artifact_dir.join(REPORT_FILE_NAME);
        fs::write(&out_path, &bytes)?;
        info!("exported report to {}", out_path.display());
        Ok(out_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_data_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "qcm_session_{}_{}",
            std::process::id(),
            name
        ))
    }

    fn session_in(dir_name: &str) -> Session {
        let dir = temp_data_path(dir_name);
        fs::create_dir_all(&dir).unwrap();
        Session::open(dir.join("quality_data.csv")).unwrap()
    }

    #[test]
    fn test_add_record_persists_synchronously() {
        let mut session = session_in("persist");
        session
            .add_record(Month::Jan, CostCategory::Prevention, 100.0, "training")
            .unwrap();

        let reloaded = RecordStore::new(session.store.path()).load().unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.records()[0].cost, 100.0);
    }

    #[test]
    fn test_failed_upload_leaves_table_and_file_unchanged() {
        let mut session = session_in("failed_upload");
        session
            .add_record(Month::Jan, CostCategory::Prevention, 100.0, "training")
            .unwrap();
        let before = fs::read(session.store.path()).unwrap();

        let bad = "Month,Category,Amount\nJan,Prevention,100\n";
        assert!(session.upload(bad.as_bytes()).is_err());

        assert_eq!(session.table().len(), 1);
        assert_eq!(fs::read(session.store.path()).unwrap(), before);
    }

    #[test]
    fn test_dashboard_on_empty_table_is_empty_state() {
        let mut session = session_in("empty_dashboard");
        assert!(session.dashboard().unwrap().is_none());
        assert!(session.kpi_chart().is_none());
    }

    #[test]
    fn test_llm_failure_leaves_no_stale_state_and_table_untouched() {
        let mut session = session_in("llm_failure");
        session
            .add_record(Month::Jan, CostCategory::Prevention, 100.0, "training")
            .unwrap();
        let before = fs::read(session.store.path()).unwrap();

        let client = CompletionClient::new(None, "http://127.0.0.1:9/v1");
        let err = session.generate_suggestions(&client).unwrap_err();
        assert!(matches!(err, QualityCostError::ExternalService(_)));
        assert!(session.suggestions().is_none());
        assert_eq!(fs::read(session.store.path()).unwrap(), before);
    }

    #[test]
    fn test_generate_report_rejects_month_without_records() {
        let mut session = session_in("bad_month");
        session
            .add_record(Month::Jan, CostCategory::Prevention, 100.0, "training")
            .unwrap();

        let client = CompletionClient::new(None, "http://127.0.0.1:9/v1");
        let err = session.generate_report(&client, Month::Jul).unwrap_err();
        assert!(matches!(err, QualityCostError::Schema(_)));
        assert!(err.to_string().contains("Jan"));
    }

    #[test]
    fn test_export_without_prerequisites_writes_nothing() {
        let mut session = session_in("no_prereq");
        session
            .add_record(Month::Jan, CostCategory::Prevention, 100.0, "training")
            .unwrap();

        let err = session.export_report().unwrap_err();
        assert!(matches!(err, QualityCostError::MissingPrerequisite(_)));
        assert!(!session.artifact_dir.join(REPORT_FILE_NAME).exists());
    }

    #[test]
    fn test_available_months_in_calendar_order() {
        let mut session = session_in("months");
        for (month, cost) in [(Month::Mar, 10.0), (Month::Jan, 5.0), (Month::Dec, 1.0)] {
            session
                .add_record(month, CostCategory::Appraisal, cost, "check")
                .unwrap();
        }
        assert_eq!(
            session.available_months(),
            vec![Month::Jan, Month::Mar, Month::Dec]
        );
    }

    #[test]
    fn test_upload_merges_and_dedups_against_existing() {
        let mut session = session_in("upload_merge");
        session
            .add_record(Month::Jan, CostCategory::Prevention, 100.0, "training")
            .unwrap();

        let upload = "\
Month,Category,Cost,Description
Jan,Prevention,100.0,training
Feb,External Failure,25.0,warranty claim
";
        let added = session.upload(upload.as_bytes()).unwrap();
        assert_eq!(added, 1);
        assert_eq!(session.table().len(), 2);
    }
}
