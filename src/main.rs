use clap::{Args, Parser, Subcommand};
use honor_roll::config::AppConfig;
use honor_roll::error::AppError;
use honor_roll::telemetry;
use honor_roll::workflows::honors::demo::DemoCampus;
use honor_roll::workflows::honors::{
    AcademicLevel, BatchReport, BatchScope, CriteriaSnapshot, SchoolYear,
};
use tracing::info;

const DEFAULT_SCHOOL_YEAR: &str = "2024-2025";

#[derive(Parser, Debug)]
#[command(
    name = "Honor Roll",
    about = "Evaluate students against configured honor criteria from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run honor batches against the seeded demo campus (default command)
    Demo(DemoArgs),
    /// Print the criteria snapshot each level would be evaluated with
    Criteria(CriteriaArgs),
}

#[derive(Args, Debug, Default)]
struct DemoArgs {
    /// Academic level to evaluate (all levels when omitted)
    #[arg(long, value_parser = parse_level)]
    level: Option<AcademicLevel>,
    /// School year in YYYY-YYYY form
    #[arg(long, value_parser = parse_school_year)]
    school_year: Option<SchoolYear>,
    /// Restrict the batch to a single grading period
    #[arg(long)]
    period: Option<String>,
    /// Override the configured worker count
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Args, Debug, Default)]
struct CriteriaArgs {
    /// Academic level to describe (all levels when omitted)
    #[arg(long, value_parser = parse_level)]
    level: Option<AcademicLevel>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Demo(DemoArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    info!(?config.environment, workers = config.engine.workers, "honor roll starting");

    match command {
        Command::Demo(args) => {
            let reports = run_demo(&config, args).await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Command::Criteria(args) => {
            let snapshots = describe_criteria(&config, args).await?;
            println!("{}", serde_json::to_string_pretty(&snapshots)?);
        }
    }
    Ok(())
}

fn parse_level(raw: &str) -> Result<AcademicLevel, String> {
    raw.parse::<AcademicLevel>().map_err(|err| err.to_string())
}

fn parse_school_year(raw: &str) -> Result<SchoolYear, String> {
    SchoolYear::parse(raw).map_err(|err| err.to_string())
}

fn levels(requested: Option<AcademicLevel>) -> Vec<AcademicLevel> {
    match requested {
        Some(level) => vec![level],
        None => AcademicLevel::ALL.to_vec(),
    }
}

async fn run_demo(config: &AppConfig, args: DemoArgs) -> Result<Vec<BatchReport>, AppError> {
    let school_year = match args.school_year {
        Some(year) => year,
        None => SchoolYear::parse(DEFAULT_SCHOOL_YEAR)?,
    };
    let workers = args.workers.unwrap_or(config.engine.workers);

    let campus = DemoCampus::seed(school_year)?;
    let service = campus.service(config.engine.options, workers);

    let mut reports = Vec::new();
    for level in levels(args.level) {
        let mut scope = BatchScope::new(level, school_year);
        if let Some(period) = args.period.as_deref() {
            scope = scope.for_period(period);
        }
        reports.push(service.run(scope).await?);
    }
    Ok(reports)
}

async fn describe_criteria(
    config: &AppConfig,
    args: CriteriaArgs,
) -> Result<Vec<CriteriaSnapshot>, AppError> {
    let school_year = SchoolYear::parse(DEFAULT_SCHOOL_YEAR)?;
    let campus = DemoCampus::seed(school_year)?;
    let service = campus.service(config.engine.options, config.engine.workers);

    let mut snapshots = Vec::new();
    for level in levels(args.level) {
        snapshots.push(service.criteria_snapshot(level).await?);
    }
    Ok(snapshots)
}
