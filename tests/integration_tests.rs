use quality_cost_monitor::*;
use std::fs;
use std::path::PathBuf;

fn test_workspace(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("qcm_it_{}_{}", std::process::id(), name));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn seed_reference_records(session: &mut Session) {
    session
        .add_record(Month::Jan, CostCategory::Prevention, 100.0, "x")
        .unwrap();
    session
        .add_record(Month::Jan, CostCategory::Appraisal, 50.0, "y")
        .unwrap();
    session
        .add_record(Month::Feb, CostCategory::InternalFailure, 30.0, "z")
        .unwrap();
}

#[test]
fn test_reference_scenario_through_session() {
    let dir = test_workspace("reference");
    let mut session = Session::open(dir.join("quality_data.csv")).unwrap();
    seed_reference_records(&mut session);

    let view = session.dashboard().unwrap().expect("table is not empty");
    assert_eq!(view.kpis.cogq, 150.0);
    assert_eq!(view.kpis.copq, 30.0);
    assert_eq!(view.kpis.total, 180.0);
    assert_eq!(view.trend, vec![(Month::Jan, 150.0), (Month::Feb, 30.0)]);

    for chart in [&view.kpi_chart, &view.breakdown_chart, &view.trend_chart] {
        let bytes = fs::read(chart).unwrap();
        assert_eq!(&bytes[1..4], b"PNG", "{} is not a PNG", chart.display());
    }
    assert_eq!(session.kpi_chart(), Some(view.kpi_chart.as_path()));
}

#[test]
fn test_persisted_file_survives_process_restart() {
    let dir = test_workspace("restart");
    let data_path = dir.join("quality_data.csv");

    {
        let mut session = Session::open(&data_path).unwrap();
        seed_reference_records(&mut session);
    }

    // A fresh session sees what the previous one persisted.
    let session = Session::open(&data_path).unwrap();
    assert_eq!(session.table().len(), 3);
    let kpis = compute_kpis(&summarize_by_category(session.table()));
    assert_eq!(kpis.total, 180.0);

    // Repeated no-op persistence does not drift the file.
    let store = RecordStore::new(&data_path);
    let first = fs::read(&data_path).unwrap();
    store.save(&store.load().unwrap()).unwrap();
    store.save(&store.load().unwrap()).unwrap();
    assert_eq!(fs::read(&data_path).unwrap(), first);
}

#[test]
fn test_upload_file_with_wrong_schema_changes_nothing() {
    let dir = test_workspace("bad_upload");
    let mut session = Session::open(dir.join("quality_data.csv")).unwrap();
    seed_reference_records(&mut session);
    let persisted_before = fs::read(dir.join("quality_data.csv")).unwrap();

    let upload_path = dir.join("upload.csv");
    fs::write(&upload_path, "Month,Category,Amount\nJan,Prevention,100\n").unwrap();

    let err = session.upload_file(&upload_path).unwrap_err();
    assert!(matches!(err, QualityCostError::Schema(_)));
    assert!(err.to_string().contains("Cost"));

    assert_eq!(session.table().len(), 3);
    assert_eq!(
        fs::read(dir.join("quality_data.csv")).unwrap(),
        persisted_before
    );
}

#[test]
fn test_upload_file_merges_and_dedups() -> anyhow::Result<()> {
    let dir = test_workspace("good_upload");
    let mut session = Session::open(dir.join("quality_data.csv"))?;
    seed_reference_records(&mut session);

    let upload_path = dir.join("upload.csv");
    fs::write(
        &upload_path,
        "Month,Category,Cost,Description\n\
         Jan,Prevention,100.0,x\n\
         Mar,External Failure,75.0,\"warranty, batch 7\"\n",
    )?;

    let added = session.upload_file(&upload_path)?;
    assert_eq!(added, 1);
    assert_eq!(session.table().len(), 4);

    // The quoted comma survives the persistence round trip.
    let reloaded = Session::open(dir.join("quality_data.csv"))?;
    let last = &reloaded.table().records()[3];
    assert_eq!(last.description, "warranty, batch 7");
    assert_eq!(last.category, CostCategory::ExternalFailure);
    Ok(())
}

#[test]
fn test_pdf_export_happy_path() -> anyhow::Result<()> {
    let dir = test_workspace("pdf");
    let mut session = Session::open(dir.join("quality_data.csv"))?;
    seed_reference_records(&mut session);

    let view = session.dashboard()?.expect("table is not empty");
    let kpis = view.kpis;

    let insight = "Prevention spend of ₹100 is paying off; keep investing.\n\
                   • Increase appraisal sampling on line 2.";
    let bytes = build_report(&kpis, Some(insight), Some(view.kpi_chart.as_path()))?;
    assert!(bytes.starts_with(b"%PDF"));
    assert!(bytes.len() > 1000);
    Ok(())
}

#[test]
fn test_export_before_generating_report_is_directed_to_prior_step() {
    let dir = test_workspace("premature_export");
    let mut session = Session::open(dir.join("quality_data.csv")).unwrap();
    seed_reference_records(&mut session);

    // Chart exists (dashboard visited) but no report text yet.
    session.dashboard().unwrap();
    let err = session.export_report().unwrap_err();
    assert!(matches!(err, QualityCostError::MissingPrerequisite(_)));
    assert!(!dir.join(REPORT_FILE_NAME).exists());

    // Neither artifact: still a prerequisite error, still no file.
    let mut fresh = Session::open(dir.join("quality_data2.csv")).unwrap();
    fresh
        .add_record(Month::Jan, CostCategory::Prevention, 1.0, "a")
        .unwrap();
    let err = fresh.export_report().unwrap_err();
    assert!(matches!(err, QualityCostError::MissingPrerequisite(_)));
}

#[test]
fn test_llm_failure_is_inline_and_leaves_data_untouched() {
    let dir = test_workspace("llm_down");
    let mut session = Session::open(dir.join("quality_data.csv")).unwrap();
    seed_reference_records(&mut session);
    let persisted_before = fs::read(dir.join("quality_data.csv")).unwrap();

    // Port 9 (discard) never answers; the failure reason must surface.
    let client = CompletionClient::new(Some("key".to_string()), "http://127.0.0.1:9/v1");
    let err = session.generate_report(&client, Month::Jan).unwrap_err();
    assert!(matches!(err, QualityCostError::ExternalService(_)));
    assert!(!err.to_string().is_empty());

    assert!(session.report().is_none());
    assert_eq!(session.table().len(), 3);
    assert_eq!(
        fs::read(dir.join("quality_data.csv")).unwrap(),
        persisted_before
    );
}

#[test]
fn test_summary_properties_hold_for_mixed_table() {
    let table = RecordTable::from_records(vec![
        CostRecord::new(Month::May, CostCategory::ExternalFailure, 12.25, "claim"),
        CostRecord::new(Month::May, CostCategory::Prevention, 80.0, "poka-yoke"),
        CostRecord::new(Month::Sep, CostCategory::Appraisal, 41.5, "audit"),
        CostRecord::new(Month::Feb, CostCategory::InternalFailure, 7.0, "scrap"),
    ]);

    let summary = summarize_by_category(&table);
    let total: f64 = table.iter().map(|r| r.cost).sum();
    assert!((summary.total() - total).abs() < f64::EPSILON);
    assert_eq!(summary.iter().count(), 4);
    assert!(summary.iter().all(|(_, sum)| sum >= 0.0));

    let kpis = compute_kpis(&summary);
    assert!((kpis.cogq + kpis.copq - kpis.total).abs() < f64::EPSILON);

    let trend = monthly_trend(&table);
    assert_eq!(
        trend.iter().map(|(m, _)| *m).collect::<Vec<_>>(),
        vec![Month::Feb, Month::May, Month::Sep]
    );
}
