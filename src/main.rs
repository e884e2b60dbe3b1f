// Entry point and high-level CLI flow.
//
// One menu action per interaction, each running to completion before the
// next is accepted: upload, add record, dashboard view, AI suggestions,
// monthly report and PDF export. Errors are reported inline and the menu
// keeps running; only a failure to load the data file at startup is fatal.

use quality_cost_monitor::{
    CompletionClient, CostCategory, Month, QualityCostError, Session, EMPTY_STATE_MESSAGE,
};
use quality_cost_monitor::util::format_currency;
use std::io::{self, Write};
use std::path::Path;
use tabled::{settings::Style, Table};

const DATA_FILE: &str = "quality_data.csv";
const RECORD_PREVIEW_ROWS: usize = 10;

/// Read a single line of input after printing a prompt.
fn read_input(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Handle option [1]: merge an uploaded CSV file into the table.
fn handle_upload(session: &mut Session) {
    let path = read_input("Path to CSV file: ");
    if path.is_empty() {
        println!("No file given.\n");
        return;
    }
    match session.upload_file(Path::new(&path)) {
        Ok(added) => println!(
            "File uploaded and merged successfully! ({} new records, {} total)\n",
            added,
            session.table().len()
        ),
        Err(e) => println!("Upload failed: {}\n", e),
    }
}

/// Handle option [2]: add a manually entered record.
///
/// The entry surface enforces a non-negative cost before the record is
/// handed to the ingestion layer.
fn handle_add_record(session: &mut Session) {
    let month = match Month::parse(&read_input("Month (Jan..Dec): ")) {
        Ok(m) => m,
        Err(e) => {
            println!("{}\n", e);
            return;
        }
    };
    let category = match CostCategory::parse(&read_input(
        "Category (Prevention / Appraisal / Internal Failure / External Failure): ",
    )) {
        Ok(c) => c,
        Err(e) => {
            println!("{}\n", e);
            return;
        }
    };
    let cost = match read_input("Cost: ").parse::<f64>() {
        Ok(c) if c >= 0.0 => c,
        Ok(_) => {
            println!("Cost must be non-negative.\n");
            return;
        }
        Err(_) => {
            println!("Cost must be a number.\n");
            return;
        }
    };
    let description = read_input("Description: ");

    match session.add_record(month, category, cost, description) {
        Ok(true) => println!("Record added successfully!\n"),
        Ok(false) => println!("Identical record already present; nothing added.\n"),
        Err(e) => println!("Failed to add record: {}\n", e),
    }
}

/// Handle option [3]: KPIs, charts and a record preview.
fn handle_dashboard(session: &mut Session) {
    match session.dashboard() {
        Ok(None) => println!("{}\n", EMPTY_STATE_MESSAGE),
        Ok(Some(view)) => {
            println!("Key Quality Performance Indicators");
            println!(
                "  Cost of Good Quality (COGQ): Rs.{}",
                format_currency(view.kpis.cogq)
            );
            println!(
                "  Cost of Poor Quality (COPQ): Rs.{}",
                format_currency(view.kpis.copq)
            );
            println!(
                "  Total Quality Cost:          Rs.{}",
                format_currency(view.kpis.total)
            );
            println!();

            println!("Cost by category:");
            for (category, sum) in view.summary.iter() {
                println!("  {}: Rs.{}", category, format_currency(sum));
            }
            println!();

            println!("Monthly trend:");
            for (month, total) in &view.trend {
                println!("  {}: Rs.{}", month, format_currency(*total));
            }
            println!();

            preview_records(session);
            println!("Charts written:");
            println!("  {}", view.kpi_chart.display());
            println!("  {}", view.breakdown_chart.display());
            println!("  {}\n", view.trend_chart.display());
        }
        Err(e) => println!("Dashboard failed: {}\n", e),
    }
}

fn preview_records(session: &Session) {
    let records: Vec<_> = session
        .table()
        .iter()
        .take(RECORD_PREVIEW_ROWS)
        .cloned()
        .collect();
    let table_str = Table::new(records).with(Style::markdown()).to_string();
    println!("{}", table_str);
    if session.table().len() > RECORD_PREVIEW_ROWS {
        println!(
            "({} more records in {})",
            session.table().len() - RECORD_PREVIEW_ROWS,
            DATA_FILE
        );
    }
    println!();
}

/// Handle option [4]: AI improvement suggestions for the current summary.
fn handle_suggestions(session: &mut Session, client: &CompletionClient) {
    println!("Generating AI suggestions...");
    match session.generate_suggestions(client) {
        Ok(None) => println!("{}\n", EMPTY_STATE_MESSAGE),
        Ok(Some(text)) => println!("\n{}\n", text),
        Err(e) => println!("Error: {}\n", e),
    }
}

/// Handle option [5]: generate the monthly report text.
fn handle_report(session: &mut Session, client: &CompletionClient) {
    let available = session.available_months();
    if available.is_empty() {
        println!("{}\n", EMPTY_STATE_MESSAGE);
        return;
    }
    let names: Vec<&str> = available.iter().map(Month::as_str).collect();
    println!("Months with data: {}", names.join(", "));
    let month = match Month::parse(&read_input("Month for the report: ")) {
        Ok(m) => m,
        Err(e) => {
            println!("{}\n", e);
            return;
        }
    };

    println!("Generating monthly report...");
    match session.generate_report(client, month) {
        Ok(None) => println!("{}\n", EMPTY_STATE_MESSAGE),
        Ok(Some(text)) => println!("\nMonthly report generated successfully!\n\n{}\n", text),
        Err(e) => println!("Error generating report: {}\n", e),
    }
}

/// Handle option [6]: assemble and write the PDF.
fn handle_export(session: &Session) {
    match session.export_report() {
        Ok(path) => println!("Report exported to {}\n", path.display()),
        Err(e @ QualityCostError::MissingPrerequisite(_)) => println!("{}\n", e),
        Err(e) => println!("Export failed: {}\n", e),
    }
}

fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let mut session = match Session::open(DATA_FILE) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Failed to load {}: {}", DATA_FILE, e);
            std::process::exit(1);
        }
    };
    let client = CompletionClient::from_env();

    println!("Smart Quality Cost Monitoring Dashboard");
    println!("Analyze, track, and improve your quality costs using TQM principles & AI insights.\n");

    loop {
        println!("[1] Upload CSV data");
        println!("[2] Add record");
        println!("[3] Dashboard & KPIs");
        println!("[4] AI suggestions");
        println!("[5] Generate monthly report");
        println!("[6] Export PDF report");
        println!("[0] Exit\n");
        match read_input("Enter choice: ").as_str() {
            "1" => handle_upload(&mut session),
            "2" => handle_add_record(&mut session),
            "3" => handle_dashboard(&mut session),
            "4" => handle_suggestions(&mut session, &client),
            "5" => handle_report(&mut session, &client),
            "6" => handle_export(&session),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter a number between 0 and 6.\n"),
        }
    }
}
