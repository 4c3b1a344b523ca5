//! CLI administration tool for appointment-service.
//!
//! Manages the holiday calendar, inspects schedules and appointment counts,
//! and performs database checks without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Close a date range for booking
//! cargo run --bin admin -- holiday add --name "New Year" --start 2027-01-01
//!
//! # List upcoming holidays (or every holiday with --all)
//! cargo run --bin admin -- holiday list
//!
//! # Remove a holiday
//! cargo run --bin admin -- holiday remove 4
//!
//! # Show weekly schedules
//! cargo run --bin admin -- schedule list
//!
//! # Appointment counts per status
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (or `DB_*` components): PostgreSQL connection string

use appointment_service::application::services::{CrudService, HolidayHooks};
use appointment_service::config::Config;
use appointment_service::domain::entities::{Holiday, HolidayDraft};
use appointment_service::domain::filter::{FilterLimits, FilterRequest, SortDirection};
use appointment_service::domain::repositories::{AppointmentRepository, ReadRepository};
use appointment_service::domain::scheduling;
use appointment_service::infrastructure::persistence::{
    PgAppointmentRepository, PgHolidayRepository, PgScheduleRepository,
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing appointment-service.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage the holiday calendar
    Holiday {
        #[command(subcommand)]
        action: HolidayAction,
    },

    /// Inspect weekly schedules
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Show appointment statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Holiday subcommands.
#[derive(Subcommand)]
enum HolidayAction {
    /// Add a holiday (dates are inclusive, YYYY-MM-DD)
    Add {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        start: Option<NaiveDate>,

        /// Defaults to the start date
        #[arg(short, long)]
        end: Option<NaiveDate>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List holidays
    List {
        /// Include past holidays
        #[arg(short, long)]
        all: bool,
    },

    /// Remove a holiday by id
    Remove { id: i64 },
}

/// Schedule subcommands.
#[derive(Subcommand)]
enum ScheduleAction {
    /// List active schedules
    List {
        /// Include inactive schedules
        #[arg(short, long)]
        all: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Holiday { action } => handle_holiday_action(action, &pool).await?,
        Commands::Schedule { action } => handle_schedule_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

fn holiday_service(pool: &PgPool) -> CrudService<Holiday> {
    let repo = Arc::new(PgHolidayRepository::new(Arc::new(pool.clone())));
    CrudService::new(
        repo.clone(),
        Arc::new(HolidayHooks::new(repo)),
        FilterLimits::default(),
    )
}

/// Dispatches holiday commands.
async fn handle_holiday_action(action: HolidayAction, pool: &PgPool) -> Result<()> {
    let service = holiday_service(pool);

    match action {
        HolidayAction::Add {
            name,
            start,
            end,
            yes,
        } => add_holiday(&service, name, start, end, yes).await?,
        HolidayAction::List { all } => list_holidays(&service, all).await?,
        HolidayAction::Remove { id } => remove_holiday(&service, id).await?,
    }

    Ok(())
}

/// Adds a holiday with interactive prompts for missing values.
///
/// Goes through the same validation and overlap check as the API.
async fn add_holiday(
    service: &CrudService<Holiday>,
    name: Option<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "📅 Add Holiday".bright_blue().bold());
    println!();

    let name = match name {
        Some(n) => n,
        None => Input::new().with_prompt("Name").interact_text()?,
    };

    let start_date = match start {
        Some(d) => d,
        None => Input::<NaiveDate>::new()
            .with_prompt("Start date (YYYY-MM-DD)")
            .interact_text()?,
    };
    let end_date = end.unwrap_or(start_date);

    println!();
    println!("  Name:  {}", name.cyan());
    println!("  From:  {}", start_date.to_string().bright_white());
    println!("  To:    {}", end_date.to_string().bright_white());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Add this holiday?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let holiday = service
        .create(HolidayDraft {
            name,
            start_date,
            end_date,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to add holiday: {}", e))?;

    println!(
        "{} {}",
        "✅ Holiday added with id".green().bold(),
        holiday.id.to_string().bright_white().bold()
    );

    Ok(())
}

/// Lists holidays ordered by start date.
///
/// # Output Format
///
/// ```text
///   ID  Name                           From         To
///   ─────────────────────────────────────────────────────────
///   1   New Year                       2027-01-01   2027-01-01
/// ```
async fn list_holidays(service: &CrudService<Holiday>, all: bool) -> Result<()> {
    println!("{}", "📋 Holidays".bright_blue().bold());
    println!();

    let mut request = FilterRequest::page(1, service.limits().max_page_size)
        .with_sort("start_date", SortDirection::Asc);
    if !all {
        request = request.with_scope("upcoming");
    }

    let page = service
        .search(&request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list holidays: {}", e))?;

    if page.items.is_empty() {
        println!("{}", "  No holidays found".yellow());
        return Ok(());
    }

    println!(
        "  {:<4} {:<30} {:<12} {:<12}",
        "ID".bright_white().bold(),
        "Name".bright_white().bold(),
        "From".bright_white().bold(),
        "To".bright_white().bold()
    );
    println!("  {}", "─".repeat(60).bright_black());

    for holiday in &page.items {
        println!(
            "  {:<4} {:<30} {:<12} {:<12}",
            holiday.id.to_string().bright_black(),
            holiday.name.cyan(),
            holiday.start_date.to_string(),
            holiday.end_date.to_string()
        );
    }

    println!();
    println!(
        "  Total: {}",
        page.total_items.to_string().bright_white().bold()
    );

    Ok(())
}

/// Soft-deletes a holiday after confirmation.
async fn remove_holiday(service: &CrudService<Holiday>, id: i64) -> Result<()> {
    let holiday = service
        .get(id)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!(
        "  Holiday: {} ({} – {})",
        holiday.name.cyan(),
        holiday.start_date,
        holiday.end_date
    );

    let confirmed = Confirm::new()
        .with_prompt("Remove this holiday?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    service
        .delete(id, Some(holiday.row_version))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to remove holiday: {}", e))?;

    println!("{}", "✅ Holiday removed".green().bold());
    Ok(())
}

/// Dispatches schedule commands.
async fn handle_schedule_action(action: ScheduleAction, pool: &PgPool) -> Result<()> {
    let repo = PgScheduleRepository::new(Arc::new(pool.clone()));

    match action {
        ScheduleAction::List { all } => {
            println!("{}", "🗓  Schedules".bright_blue().bold());
            println!();

            let mut request = FilterRequest::page(1, FilterLimits::default().max_page_size);
            if !all {
                request = request.with_scope("active").with_scope("current");
            }

            let page = repo
                .search(&request)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list schedules: {}", e))?;

            if page.items.is_empty() {
                println!("{}", "  No schedules found".yellow());
                return Ok(());
            }

            for schedule in &page.items {
                let status = if schedule.is_active {
                    "ACTIVE".green()
                } else {
                    "INACTIVE".red()
                };

                let day = format!(
                    "{} {}",
                    scheduling::iso_from_weekday(schedule.day_of_week),
                    schedule.day_of_week
                );

                println!(
                    "  {:<4} {:<6} {}-{}  {:>3} min x {:<3} {}",
                    schedule.id.to_string().bright_black(),
                    day.cyan(),
                    schedule.start_time.format("%H:%M"),
                    schedule.end_time.format("%H:%M"),
                    schedule.slot_minutes,
                    schedule.capacity,
                    status
                );
            }

            println!();
            println!(
                "  Total: {}",
                page.total_items.to_string().bright_white().bold()
            );
        }
    }

    Ok(())
}

/// Displays appointment counts per status.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let repo = PgAppointmentRepository::new(Arc::new(pool.clone()));
    let counts = repo
        .count_by_status()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load statistics: {}", e))?;

    let beneficiaries: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM beneficiaries WHERE is_deleted = FALSE")
            .fetch_one(pool)
            .await?;

    println!(
        "  Beneficiaries:  {}",
        beneficiaries.to_string().bright_green().bold()
    );

    let total: i64 = counts.iter().map(|(_, n)| n).sum();
    for (status, count) in &counts {
        println!(
            "  {:<15} {}",
            format!("{}:", status),
            count.to_string().bright_green().bold()
        );
    }
    println!(
        "  Appointments:   {}",
        total.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
