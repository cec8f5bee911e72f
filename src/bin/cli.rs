use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use release_schedule::{
    CriticalPathReport, InMemoryPlanStore, PlanAnalyzer, PlanId, PlanStore, ReleaseProgress,
    ResourceLoad, ScheduleAnalysis, WindowPolicy, load_allocations_from_csv,
    load_snapshot_from_json, logging,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "release-schedule", version, about = "Release plan schedule analysis")]
struct Cli {
    /// JSON snapshot with plans, kits, tasks, dependencies and allocations.
    #[arg(long, env = "RELEASE_SCHEDULE_PLAN_FILE")]
    plan_file: PathBuf,

    /// Extra allocations to load (task_id,user_id,allocation_percentage,start_date,end_date).
    #[arg(long)]
    allocations_csv: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Zero-slack tasks of a plan and their summed duration.
    CriticalPath {
        #[arg(long)]
        plan: PlanId,
    },
    /// Earliest/latest times and slack for every task of a plan.
    Schedule {
        #[arg(long)]
        plan: PlanId,
    },
    /// Share of kits marked done.
    Progress {
        #[arg(long)]
        plan: PlanId,
    },
    /// Daily allocation load of one user.
    ResourceLoad {
        #[arg(long)]
        user: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// Only count days inside [start, end].
        #[arg(long)]
        clip: bool,
    },
}

const DEFAULT_LOG_LEVEL: &str = "info";

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<String> {
    let snapshot = load_snapshot_from_json(&cli.plan_file)?;
    let mut store = InMemoryPlanStore::from_snapshot(snapshot)?;
    if let Some(path) = &cli.allocations_csv {
        for allocation in load_allocations_from_csv(path)? {
            store.insert_allocation(allocation)?;
        }
    }
    let analyzer = PlanAnalyzer::new(&store);

    match cli.command {
        Command::CriticalPath { plan } => {
            let report = analyzer.critical_path(plan)?;
            render(cli.format, &report, render_critical_path)
        }
        Command::Schedule { plan } => {
            let analysis = analyzer.schedule(plan)?;
            render(cli.format, &analysis, render_schedule)
        }
        Command::Progress { plan } => {
            let progress = analyzer.progress(plan)?;
            render(cli.format, &progress, render_progress)
        }
        Command::ResourceLoad {
            user,
            start,
            end,
            clip,
        } => {
            let policy = if clip {
                WindowPolicy::Clipped
            } else {
                WindowPolicy::Unclipped
            };
            let load = analyzer.resource_load(&user, start, end, Some(policy))?;
            render(cli.format, &load, render_resource_load)
        }
    }
}

fn render<T: Serialize>(format: OutputFormat, value: &T, text: fn(&T) -> String) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Text => Ok(text(value)),
    }
}

fn render_critical_path(report: &CriticalPathReport) -> String {
    let mut lines: Vec<String> = report
        .critical_path
        .iter()
        .map(|task| {
            format!(
                "{:>6}  {:<24} {} -> {} ({}h)",
                task.subtask_id,
                task.title,
                task.start_date,
                task.end_date,
                task.duration_hours.unwrap_or(0)
            )
        })
        .collect();
    lines.push(format!("total_duration={}", report.total_duration));
    lines.join("\n")
}

fn render_schedule(analysis: &ScheduleAnalysis) -> String {
    let mut lines = vec![analysis.summary().to_cli_summary()];
    for task in &analysis.tasks {
        lines.push(format!(
            "{:>6}  {:<24} ES={} EF={} LS={} LF={} slack={}h{}",
            task.task_id,
            task.title,
            task.earliest_start,
            task.earliest_finish,
            task.latest_start,
            task.latest_finish,
            task.slack_hours,
            if task.is_critical { " *" } else { "" }
        ));
    }
    lines.join("\n")
}

fn render_progress(progress: &ReleaseProgress) -> String {
    match &progress.details {
        Some(details) => format!(
            "progress={}% ({}/{} kits done)",
            progress.progress_percentage, details.completed_kits, details.total_kits
        ),
        None => format!("progress={}%", progress.progress_percentage),
    }
}

fn render_resource_load(load: &ResourceLoad) -> String {
    let mut lines: Vec<String> = load
        .daily_load
        .iter()
        .map(|(day, pct)| format!("{day}  {pct}%"))
        .collect();
    lines.push(format!(
        "user={} average={:.1} max={}",
        load.user_id, load.average_load, load.max_load
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_falls_back_to_info() {
        let cli = Cli::try_parse_from([
            "release-schedule",
            "--plan-file",
            "plan.json",
            "progress",
            "--plan",
            "1",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "info");
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
