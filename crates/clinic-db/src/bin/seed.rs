//! # Demo Data Seeder
//!
//! Populates a database with a few months of clinic activity and prints the
//! dashboard figures for the current month.
//!
//! ## Usage
//! ```bash
//! # Use the configured database (clinic.toml / CLINIC_DATABASE_PATH)
//! cargo run -p clinic-db --bin seed
//!
//! # Specify database path
//! cargo run -p clinic-db --bin seed -- --db ./data/clinic.db
//!
//! # Only print the report
//! cargo run -p clinic-db --bin seed -- --report
//! ```
//!
//! ## Generated Data
//! For each of the last three months:
//! - Procedures through every payment method, entered the way the procedure
//!   form does it (so expected collection dates are projected)
//! - Rent, salaries, supplies and personal expenses
//! - One owner compensation record

use chrono::{Datelike, NaiveDate};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use clinic_core::expenses::{monthly_result, summarize_compensation, summarize_expenses};
use clinic_core::forms::{NewCompensation, NewExpense};
use clinic_core::period::{chart_month_label, first_day_of_month, today, DateRange, YearMonth};
use clinic_core::ranking::{rank_procedures, top_n, RankingTotals};
use clinic_core::receivable::ProcedureDraft;
use clinic_core::revenue::{
    group_receivables_by_method, monthly_revenue_series, summarize_pending_receivables,
    summarize_revenue,
};
use clinic_core::Money;
use clinic_db::repository::defaults;
use clinic_db::{ClinicConfig, Database};

/// Patients the demo procedures are spread across.
const PATIENTS: &[&str] = &[
    "Ana Beatriz Lima",
    "Carlos Eduardo Souza",
    "Fernanda Oliveira",
    "João Pedro Santos",
    "Mariana Costa",
    "Rafael Almeida",
    "Juliana Ferreira",
    "Lucas Martins",
];

/// Monthly expenses: (category id, description, centavos, day of month).
const EXPENSES: &[(&str, &str, i64, u32)] = &[
    (defaults::CATEGORY_RENT, "Aluguel do consultório", 450000, 5),
    (defaults::CATEGORY_SALARIES, "Secretária", 280000, 5),
    (defaults::CATEGORY_SUPPLIES, "Material descartável", 62000, 12),
    (defaults::CATEGORY_LAB, "Laboratório parceiro", 95000, 20),
    (defaults::CATEGORY_PERSONAL, "Plano de saúde familiar", 120000, 25),
];

fn init_tracing(config: &ClinicConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},sqlx=warn", config.logging.filter)));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut report_only = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--report" | "-r" => report_only = true,
            "--help" | "-h" => {
                println!("Clinic demo data seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: configured path)");
                println!("  -r, --report       Print the dashboard report without seeding");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = ClinicConfig::load_or_default(None);
    if let Some(path) = db_path {
        config.database.path = path;
    }
    init_tracing(&config);

    info!(path = %config.database.path.display(), "Opening database");
    let db = Database::new(config.to_db_config()).await?;

    if !report_only {
        let current = YearMonth::current();
        let existing = db.procedures().list_in_range(&current.bounds()).await?;
        if existing.is_empty() {
            seed(&db, current).await?;
        } else {
            warn!(count = existing.len(), "Current month already has procedures, skipping seed");
        }
    }

    report(&db, &config).await?;
    db.close().await;
    Ok(())
}

// =============================================================================
// Seeding
// =============================================================================

async fn seed(db: &Database, current: YearMonth) -> Result<(), Box<dyn std::error::Error>> {
    let methods = db.catalog().payment_methods().await?;
    let types = db.catalog().procedure_types().await?;
    if methods.is_empty() || types.is_empty() {
        return Err("default catalog is missing".into());
    }

    let last_day = today().day();
    let mut procedures = 0usize;

    for back in (0..3).rev() {
        let month = current.offset(-back);
        let days_in_month = if back == 0 { last_day } else { 28 };

        for n in 0..18usize {
            let day = (n as u32 * 3) % days_in_month + 1;
            let Some(service_date) = NaiveDate::from_ymd_opt(month.year, month.month, day) else {
                continue;
            };

            let mut draft = ProcedureDraft::new(service_date);
            draft.new_patient(PATIENTS[(n + back as usize) % PATIENTS.len()]);
            draft.select_procedure_type(&types[n % types.len()]);
            draft.select_payment_method(methods[(n * 7 + back as usize) % methods.len()].clone());
            if draft.amount().is_zero() {
                draft.set_amount(Money::from_centavos(15000));
            }

            let saved = db.procedures().insert(draft.into_new_procedure()?).await?;
            procedures += 1;

            // Older months are mostly settled.
            if back > 0 && n % 4 != 0 {
                let collected_on = saved.expected_collection_date.unwrap_or(saved.service_date);
                db.procedures().confirm_collection(&saved.id, Some(collected_on)).await?;
            }
        }

        for (category_id, description, cents, day) in EXPENSES {
            let Some(first) = first_day_of_month(month.year, month.month) else {
                continue;
            };
            let expense_date = first
                .with_day((*day).min(days_in_month))
                .unwrap_or(first);

            db.expenses()
                .insert(NewExpense {
                    category_id: category_id.to_string(),
                    description: description.to_string(),
                    amount: Money::from_centavos(*cents),
                    expense_date,
                    payment_method: Some("pix".to_string()),
                    recurring: true,
                    notes: None,
                })
                .await?;
        }

        db.compensation()
            .insert(NewCompensation {
                competency: month.to_string(),
                amount: Money::from_centavos(1_000_000),
                payment_date: None,
                notes: None,
            })
            .await?;
    }

    info!(procedures = procedures, "Demo data seeded");
    Ok(())
}

// =============================================================================
// Report
// =============================================================================

async fn report(db: &Database, config: &ClinicConfig) -> Result<(), Box<dyn std::error::Error>> {
    let current = YearMonth::current();
    let month = current.bounds();

    let revenue = summarize_revenue(&db.procedures().revenue_inputs(&month).await?, None);
    let expenses = summarize_expenses(&db.expenses().summary_inputs(&month).await?, None);
    let ranking = rank_procedures(&db.procedures().ranking_inputs(Some(&month)).await?, None);
    let receivables = db.procedures().pending_receivables(None).await?;
    let compensation = summarize_compensation(&db.compensation().list_for_year(current.year).await?);

    println!();
    println!("Dashboard: {}", current.label());
    println!("==============================");
    println!("Revenue:         {} ({} procedures)", revenue.total, revenue.count);
    println!("  Immediate:     {}", revenue.immediate);
    println!("  Card:          {}", revenue.card);
    println!("  Insurance:     {}", revenue.insurance);
    println!("  Collected:     {}", revenue.collected);
    println!("  Pending:       {}", revenue.pending);
    println!("Expenses:        {}", expenses.total);
    println!("  Fixed:         {}", expenses.fixed);
    println!("  Variable:      {}", expenses.variable);
    println!("  Personal:      {}", expenses.personal);
    println!("Result:          {}", monthly_result(&revenue, &expenses));
    println!(
        "Owner comp. {}: {} ({} records)",
        current.year, compensation.total, compensation.count
    );

    println!();
    println!("Top procedures");
    for entry in top_n(&ranking, config.dashboard.ranking_top_n) {
        println!(
            "  {:<20} {:>3}x  {:>14}  avg {}",
            entry.name,
            entry.count,
            entry.total.to_string(),
            entry.average_ticket()
        );
    }
    let totals = RankingTotals::of(&ranking);
    println!("  {} procedures, {}", totals.count, totals.total);

    println!();
    let pending = summarize_pending_receivables(&receivables);
    println!("Receivables: {} ({} pending)", pending.total, pending.count);
    for group in group_receivables_by_method(&receivables) {
        println!("  {:<20} {:>3}  {}", group.payment_method, group.items.len(), group.total);
    }

    println!();
    println!("Revenue evolution");
    let chart_start = current.offset(1 - config.dashboard.chart_months as i32);
    let chart_range = DateRange {
        start: chart_start.bounds().start,
        end: month.end.clone(),
    };
    let series = monthly_revenue_series(&db.procedures().revenue_inputs(&chart_range).await?);
    for point in series {
        println!("  {:<7} {}", chart_month_label(point.period), point.total);
    }

    Ok(())
}
