//! `shiftweek`: inspect and publish scheduler weeks from the terminal.
//!
//! Usage:
//!   shiftweek current
//!   shiftweek window 2814
//!   shiftweek show --offset 1
//!   shiftweek publish --week 2814
//!   shiftweek delete <shift-id> --week 2814

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};

use shiftweek_lib::config::{ClientConfig, API_TOKEN_ENV, API_URL_ENV};
use shiftweek_lib::week::{current_week_id, window_of, WeekId};
use shiftweek_lib::{HttpWeekApi, PhaseKind, SessionSnapshot, ShiftId, WeekController};

#[derive(Parser)]
#[command(name = "shiftweek")]
#[command(version)]
#[command(about = "View and publish shift weeks", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.shiftweek/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current week id and its date range
    Current,

    /// Print the window of a week id
    Window {
        #[arg(allow_negative_numbers = true)]
        id: WeekId,
    },

    /// Fetch a week and list its shifts
    Show {
        #[command(flatten)]
        target: WeekTarget,
    },

    /// Publish a week
    Publish {
        #[command(flatten)]
        target: WeekTarget,
    },

    /// Delete a shift from a week
    Delete {
        shift_id: String,

        #[command(flatten)]
        target: WeekTarget,
    },
}

#[derive(clap::Args)]
struct WeekTarget {
    /// Week id (defaults to the current week)
    #[arg(short, long, allow_negative_numbers = true)]
    week: Option<WeekId>,

    /// Weeks to move from the selected week
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    offset: i64,
}

impl WeekTarget {
    fn resolve(&self) -> WeekId {
        self.week
            .unwrap_or_else(|| current_week_id(Utc::now()))
            .shift(self.offset)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Current => print_window(current_week_id(Utc::now())),
        Commands::Window { id } => print_window(id),
        command => run_remote(cli.config, command),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_window(id: WeekId) -> Result<(), String> {
    let window = window_of(id).ok_or_else(|| format!("Week {} is out of range", id))?;
    println!("week:  {}", id);
    println!("range: {}", window.range_label());
    println!("start: {}", window.start_date.to_rfc3339());
    println!("end:   {}", window.end_date.to_rfc3339());
    Ok(())
}

fn run_remote(config_path: Option<PathBuf>, command: Commands) -> Result<(), String> {
    let config = match config_path {
        Some(path) => ClientConfig::load(&path).map(|mut config| {
            config.apply_overrides(
                std::env::var(API_URL_ENV).ok(),
                std::env::var(API_TOKEN_ENV).ok(),
            );
            config
        }),
        None => ClientConfig::load_default(),
    }
    .map_err(|e| e.to_string())?;
    let api = HttpWeekApi::new(&config).map_err(|e| e.to_string())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {}", e))?;

    runtime.block_on(async move {
        let controller = WeekController::spawn(Arc::new(api));
        match command {
            Commands::Show { target } => {
                let snapshot = open_week(&controller, target.resolve()).await?;
                print_week(&snapshot);
                Ok(())
            }
            Commands::Publish { target } => publish(&controller, target.resolve()).await,
            Commands::Delete { shift_id, target } => {
                delete(&controller, target.resolve(), ShiftId::new(shift_id)).await
            }
            Commands::Current | Commands::Window { .. } => Ok(()),
        }
    })
}

async fn open_week(controller: &WeekController, id: WeekId) -> Result<SessionSnapshot, String> {
    controller.select_week(id).await.map_err(|e| e.to_string())?;
    let snapshot = controller.settled().await.map_err(|e| e.to_string())?;
    if snapshot.phase == PhaseKind::Failed {
        return Err(snapshot.error_message);
    }
    Ok(snapshot)
}

async fn publish(controller: &WeekController, id: WeekId) -> Result<(), String> {
    open_week(controller, id).await?;
    controller.publish().await.map_err(|e| e.to_string())?;

    let snapshot = controller.settled().await.map_err(|e| e.to_string())?;
    if !snapshot.error_message.is_empty() {
        return Err(snapshot.error_message);
    }
    print_week(&snapshot);
    Ok(())
}

async fn delete(controller: &WeekController, id: WeekId, shift_id: ShiftId) -> Result<(), String> {
    let snapshot = open_week(controller, id).await?;
    let row = snapshot
        .rows
        .iter()
        .find(|r| r.id == shift_id)
        .ok_or_else(|| format!("Shift {} is not in week {}", shift_id, id))?;
    if !snapshot.can_modify_row(row) {
        return Err(format!("Shift {} is published and cannot be deleted", shift_id));
    }

    controller
        .delete_row(shift_id.clone())
        .await
        .map_err(|e| e.to_string())?;
    let snapshot = controller.settled().await.map_err(|e| e.to_string())?;
    if !snapshot.error_message.is_empty() {
        return Err(snapshot.error_message);
    }
    println!("Deleted shift {}", shift_id);
    Ok(())
}

fn print_week(snapshot: &SessionSnapshot) {
    let Some(week) = &snapshot.current_week else {
        return;
    };
    let label = snapshot.range_label().unwrap_or_default();
    let status = match (snapshot.is_published(), week.published_at) {
        (true, Some(at)) => format!("published {}", at.format("%Y-%m-%d %H:%M UTC")),
        (true, None) => "published".to_string(),
        (false, _) => "draft".to_string(),
    };
    println!("Week {} ({}) [{}]", week.id, label, status);

    if snapshot.rows.is_empty() {
        println!("  no shifts");
        return;
    }
    for row in &snapshot.rows {
        println!(
            "  {}  {}-{}  {:<24} {}{}",
            row.date,
            row.start_time.format("%H:%M"),
            row.end_time.format("%H:%M"),
            row.name,
            row.id,
            if snapshot.can_modify_row(row) { "" } else { "  (locked)" }
        );
    }
}
