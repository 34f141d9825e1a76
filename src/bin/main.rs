//! Worklens CLI - run the HR dashboard pipeline from a terminal
//!
//! Usage:
//!   worklens reports
//!   worklens dimensions
//!   worklens values <column>
//!   worklens render <report> [--filter col=val]... [--param key=val]... [--user name]
//!   worklens serve [--port 3000]          (requires the `ui` feature)
//!
//! Examples:
//!   worklens --data hr/data render workforce_overview --filter company=Acme
//!   worklens render talent_profile --param employee_id=1042
//!   worklens values band

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worklens::config::Settings;
use worklens::dashboard::{CycleOutcome, Dashboard, Request};
use worklens::filter::{group_title, parse_filter_arg};
use worklens::report::{Params, ReportIdentifier, TextSurface};

#[derive(Parser)]
#[command(name = "worklens")]
#[command(about = "Worklens - HR analytics dashboard with pluggable reports")]
#[command(version)]
struct Cli {
    /// Path to a worklens.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides the config file)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Report directory (overrides the config file)
    #[arg(long, global = true)]
    reports: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available reports
    Reports,

    /// List filter dimensions by group
    Dimensions,

    /// List the distinct values of a column in the primary dataset
    Values {
        /// Column name
        column: String,
    },

    /// Render one report to the terminal
    Render {
        /// Report identifier
        report: String,

        /// Filter selection as column=value (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// Report parameter as key=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// User to sign in as
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Start the web API
    #[cfg(feature = "ui")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match load_settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Reports => cmd_reports(&settings),
        Commands::Dimensions => cmd_dimensions(&settings),
        Commands::Values { column } => cmd_values(&settings, &column),
        Commands::Render {
            report,
            filters,
            params,
            user,
        } => cmd_render(&settings, report, &filters, &params, &user),
        #[cfg(feature = "ui")]
        Commands::Serve { port } => cmd_serve(settings, port),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

fn load_settings(cli: &Cli) -> Result<Settings, worklens::config::SettingsError> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };
    if let Some(dir) = &cli.data {
        settings.data.dir = dir.display().to_string();
    }
    if let Some(dir) = &cli.reports {
        settings.reports.dir = dir.display().to_string();
    }
    Ok(settings)
}

fn build_dashboard(settings: &Settings) -> Option<Dashboard> {
    match Dashboard::from_settings(settings) {
        Ok(d) => Some(d),
        Err(e) => {
            eprintln!("Error: {}", e);
            None
        }
    }
}

fn cmd_reports(settings: &Settings) -> ExitCode {
    let Some(dashboard) = build_dashboard(settings) else {
        return ExitCode::FAILURE;
    };

    if let Some(error) = dashboard.discovery_error() {
        eprintln!("Warning: {}", error);
    }

    let ids = dashboard.dispatcher().registry().identifiers();
    if ids.is_empty() {
        println!("No reports available.");
    } else {
        println!("Reports:");
        for id in ids {
            println!("  - {}", id);
        }
    }
    ExitCode::SUCCESS
}

fn cmd_dimensions(settings: &Settings) -> ExitCode {
    let mut current_group: Option<&str> = None;
    let dimensions = settings.filter_dimensions();
    for dim in &dimensions {
        if current_group != Some(dim.group.as_str()) {
            if current_group.is_some() {
                println!();
            }
            println!("{}:", group_title(&dim.group));
            current_group = Some(dim.group.as_str());
        }
        println!("  - {} ({})", dim.label, dim.column);
    }
    ExitCode::SUCCESS
}

fn cmd_values(settings: &Settings, column: &str) -> ExitCode {
    let Some(dashboard) = build_dashboard(settings) else {
        return ExitCode::FAILURE;
    };

    let data = match dashboard.load_data() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let Some(dataset) = data.get(dashboard.primary_dataset()) else {
        eprintln!(
            "Error: dataset '{}' not found in {}",
            dashboard.primary_dataset(),
            dashboard.data_dir().display()
        );
        return ExitCode::FAILURE;
    };
    if !dataset.has_column(column) {
        eprintln!("Error: column '{}' not found", column);
        return ExitCode::FAILURE;
    }

    for value in dashboard.filter_engine().distinct_values(dataset, column) {
        println!("{}", value);
    }
    ExitCode::SUCCESS
}

fn cmd_render(
    settings: &Settings,
    report: String,
    filters: &[String],
    params: &[String],
    user: &str,
) -> ExitCode {
    let Some(dashboard) = build_dashboard(settings) else {
        return ExitCode::FAILURE;
    };

    if !dashboard
        .dispatcher()
        .registry()
        .contains(&ReportIdentifier::from(report.as_str()))
    {
        eprintln!("Error: unknown report '{}'", report);
        return ExitCode::FAILURE;
    }

    let mut session = dashboard.new_session();
    if let Err(e) = dashboard.authenticator().login(&mut session, user) {
        eprintln!("Login failed: {}", e);
        return ExitCode::FAILURE;
    }

    for arg in filters {
        let applied = parse_filter_arg(arg).and_then(|(column, value)| {
            dashboard
                .filter_engine()
                .select(session.selection_mut(), &column, value)
        });
        if let Err(e) = applied {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let mut report_params = Params::new();
    for arg in params {
        let Some((key, value)) = arg.split_once('=') else {
            eprintln!("Error: parameter must be key=value: {}", arg);
            return ExitCode::FAILURE;
        };
        report_params.insert(key.trim().to_string(), value.to_string());
    }
    let request = Request::from_params(report_params).with("report", report);

    let mut surface = TextSurface::new();
    let result = dashboard.run_cycle(&mut session, &request, &mut surface);
    print!("{}", surface.as_str());

    match result {
        Ok(CycleOutcome::Completed {
            failure: None,
            report: Some(_),
            ..
        }) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "ui")]
fn cmd_serve(settings: Settings, port: u16) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(worklens::web::serve(settings, port)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
