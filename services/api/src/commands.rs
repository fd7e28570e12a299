use crate::infra::{open_service, parse_date, parse_gender, parse_scope};
use chrono::{NaiveDate, Utc};
use clap::Args;
use recruit_desk::config::AppConfig;
use recruit_desk::error::AppError;
use recruit_desk::workflows::recruiting::{
    BodyCompEvaluator, BodyCompResult, DashboardSummary, ExportScope, Gender, ImportSummary,
    Measurements,
};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Height in inches
    #[arg(long)]
    pub(crate) height: f64,
    /// Weight in pounds
    #[arg(long)]
    pub(crate) weight: f64,
    /// Age in years (defaults to 18 when omitted)
    #[arg(long)]
    pub(crate) age: Option<f64>,
    /// male, female, m or f
    #[arg(long, value_parser = parse_gender)]
    pub(crate) gender: Option<Gender>,
    /// Neck circumference in inches
    #[arg(long)]
    pub(crate) neck: Option<f64>,
    /// Waist circumference in inches
    #[arg(long)]
    pub(crate) waist: Option<f64>,
    /// Hip circumference in inches
    #[arg(long)]
    pub(crate) hip: Option<f64>,
}

/// Flags shared by commands that open the persisted desk.
#[derive(Args, Debug, Default)]
pub(crate) struct StoreArgs {
    /// Override the configured data directory
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SummaryArgs {
    /// Reporting date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// full or weekly
    #[arg(long, value_parser = parse_scope, default_value = "full")]
    pub(crate) scope: ExportScope,
    /// Write to this file instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// JSON export to merge
    pub(crate) input: PathBuf,
    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let measurements = Measurements {
        height: Some(args.height),
        weight: Some(args.weight),
        age: args.age,
        gender: args.gender,
        neck: args.neck,
        waist: args.waist,
        hip: args.hip,
    };
    let result = BodyCompEvaluator::default().evaluate(&measurements);
    println!("{}", evaluation_line(&result));
    Ok(())
}

pub(crate) fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = open_service(&config.storage, args.store.data_dir);
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());

    let summary = service
        .store()
        .read(|state| DashboardSummary::build(state, today));
    for line in summary_lines(&summary) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = open_service(&config.storage, args.store.data_dir);
    let payload = service.export(args.scope)?;

    match args.output {
        Some(path) => {
            fs::write(&path, payload)?;
            println!("Export written to {}", path.display());
        }
        None => println!("{payload}"),
    }
    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let payload = fs::read_to_string(&args.input)?;
    let config = AppConfig::load()?;
    let mut service = open_service(&config.storage, args.store.data_dir);

    let summary = service.import(&payload, Utc::now())?;
    for line in import_lines(&summary) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn run_reset(args: StoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let mut service = open_service(&config.storage, args.data_dir);
    service.reset();
    println!("Desk reset to seed data");
    Ok(())
}

fn evaluation_line(result: &BodyCompResult) -> String {
    format!("{}: {}", result.status.label(), result.message)
}

fn summary_lines(summary: &DashboardSummary) -> Vec<String> {
    let mut lines = vec![
        format!("Recruiting dashboard as of {}", summary.as_of),
        format!(
            "Applicants: {} total, {} enlisted",
            summary.total_applicants, summary.enlisted
        ),
        format!(
            "Annual goal: {}/{} ({:.0}%), {}",
            summary.goal.enlisted,
            summary.goal.goal,
            summary.goal.percent,
            summary.goal.remaining_label
        ),
        "\nPipeline".to_string(),
    ];
    lines.extend(
        summary
            .stage_breakdown
            .iter()
            .map(|entry| format!("- {}: {}", entry.stage_label, entry.count)),
    );

    lines.push(format!("\nUpcoming events ({})", summary.upcoming_count));
    if summary.upcoming_events.is_empty() {
        lines.push("- none scheduled".to_string());
    }
    lines.extend(
        summary
            .upcoming_events
            .iter()
            .map(|event| format!("- [{}] {} ({})", event.category_label, event.title, event.meta)),
    );

    let idle: Vec<_> = summary
        .aging
        .iter()
        .filter(|entry| entry.days_idle != Some(0))
        .collect();
    if !idle.is_empty() {
        lines.push("\nFollow-up".to_string());
        lines.extend(idle.into_iter().map(|entry| match entry.days_idle {
            Some(days) => format!("- {}: {} ({days} days idle)", entry.name, entry.level_label),
            None => format!("- {}: {} (no recorded activity)", entry.name, entry.level_label),
        }));
    }

    if !summary.body_composition.is_empty() {
        lines.push("\nBody composition".to_string());
        lines.extend(
            summary
                .body_composition
                .iter()
                .map(|entry| format!("- {}: {}", entry.name, entry.status_label)),
        );
    }
    lines
}

fn import_lines(summary: &ImportSummary) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Applicants: {} added, {} updated",
            summary.applicants.added, summary.applicants.updated
        ),
        format!(
            "Events: {} added, {} updated",
            summary.events.added, summary.events.updated
        ),
        format!(
            "Checklist documents: {} added, {} updated",
            summary.checklist.added, summary.checklist.updated
        ),
    ];
    if summary.settings_updated {
        lines.push("Settings merged".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruit_desk::workflows::recruiting::{seed_state, BodyCompStatus, MergeCounts};

    #[test]
    fn evaluation_line_names_status_and_reason() {
        let result = BodyCompResult {
            status: BodyCompStatus::Within,
            message: "Within weight standards".to_string(),
        };
        assert_eq!(
            evaluation_line(&result),
            "Within standards: Within weight standards"
        );
    }

    #[test]
    fn summary_lists_every_pipeline_stage() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date");
        let state = seed_state(Utc::now());
        let summary = DashboardSummary::build(&state, today);

        let lines = summary_lines(&summary);
        assert_eq!(lines[0], "Recruiting dashboard as of 2026-10-18");
        assert!(lines[1].starts_with("Applicants: 2 total"));
        let stage_lines = lines
            .iter()
            .filter(|line| line.starts_with("- ") && line.contains(": "))
            .count();
        assert!(stage_lines >= summary.stage_breakdown.len());
    }

    #[test]
    fn import_lines_mention_settings_only_when_merged() {
        let mut summary = ImportSummary {
            applicants: MergeCounts {
                updated: 1,
                added: 2,
            },
            ..ImportSummary::default()
        };
        let lines = import_lines(&summary);
        assert_eq!(lines[0], "Applicants: 2 added, 1 updated");
        assert_eq!(lines.len(), 3);

        summary.settings_updated = true;
        assert_eq!(import_lines(&summary).last().map(String::as_str), Some("Settings merged"));
    }
}
