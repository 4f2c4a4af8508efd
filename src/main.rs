//! CLI entry point for the enrollment insights tool.
//!
//! Loads an enrollment table, applies the year/program/category filter given
//! on the command line and prints indicators, aggregates, insights or a
//! per-program drilldown. The filtered rows can also be exported.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use enrollment_insights::analytics::{
    category_by_year, compute_insights, compute_kpis, program_drilldown, sex_shares_by_year,
    totals_by_year,
};
use enrollment_insights::{
    cache::TableCache,
    config::{Settings, parse_delimiter},
    filter::{FilterParams, filter},
    loader::Encoding,
    output::{
        export_view_to_path, render_drilldown, render_insights, render_kpis, to_json,
        write_aggregate_csv,
    },
    records::RecordTable,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "enrollment_insights")]
#[command(about = "Aggregates, indicators and insights over university enrollment tables", long_about = None)]
struct Cli {
    /// Enrollment table to load (overrides ENROLLMENT_DATA_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    data: Option<PathBuf>,

    /// Field delimiter of the table (overrides ENROLLMENT_CSV_DELIMITER)
    #[arg(long, global = true)]
    delimiter: Option<String>,

    /// Character encoding of the table: latin1 or utf8 (overrides ENROLLMENT_CSV_ENCODING)
    #[arg(long, global = true)]
    encoding: Option<Encoding>,

    #[command(subcommand)]
    command: Commands,
}

/// Filter shared by every subcommand. Anything left out selects everything.
#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// First origin year to include
    #[arg(long)]
    year_min: Option<i32>,

    /// Last origin year to include
    #[arg(long)]
    year_max: Option<i32>,

    /// Program to include (repeatable)
    #[arg(long = "program", value_name = "PROGRAM")]
    programs: Vec<String>,

    /// Admission category to include (repeatable)
    #[arg(long = "category", value_name = "CATEGORY")]
    categories: Vec<String>,
}

impl FilterArgs {
    fn resolve(&self, table: &RecordTable) -> Result<FilterParams> {
        let mut params = FilterParams::all(table);
        if let Some(year_min) = self.year_min {
            params.year_min = year_min;
        }
        if let Some(year_max) = self.year_max {
            params.year_max = year_max;
        }
        if !self.programs.is_empty() {
            params.programs = self.programs.iter().cloned().collect();
        }
        if !self.categories.is_empty() {
            params.categories = self.categories.iter().cloned().collect();
        }
        params.validate()?;
        Ok(params)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TextFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TableFormat {
    Csv,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Axis {
    Year,
    Sex,
    Category,
}

#[derive(Subcommand)]
enum Commands {
    /// Headline indicators: total, change vs previous year, female share, largest category
    Summary {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, value_enum, default_value_t = TextFormat::Text)]
        format: TextFormat,
    },
    /// Enrollments grouped by year, by sex or by admission category
    Aggregate {
        #[command(flatten)]
        filter: FilterArgs,

        /// Grouping axis
        #[arg(long, value_enum, default_value_t = Axis::Year)]
        by: Axis,

        /// Report shares of each year instead of counts (sex and category only)
        #[arg(long, default_value_t = false)]
        share: bool,

        #[arg(long, value_enum, default_value_t = TableFormat::Csv)]
        format: TableFormat,
    },
    /// Top growing and declining programs and category participation shift
    Insights {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, value_enum, default_value_t = TextFormat::Text)]
        format: TextFormat,
    },
    /// History and latest-year breakdown of a single program
    Drilldown {
        /// Program to break down
        #[arg(value_name = "PROGRAM")]
        name: String,

        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, value_enum, default_value_t = TextFormat::Text)]
        format: TextFormat,
    },
    /// Write the filtered rows, with every source column, to a CSV file
    ///
    /// The file is comma-separated UTF-8; load it back with
    /// `--delimiter , --encoding utf8`.
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// CSV file to write
        #[arg(short, long, default_value = "filtered.csv")]
        output: PathBuf,
    },
    /// List the years, programs and categories available for filtering
    Options,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let mut settings = Settings::from_env()?;
    let _file_guard = init_tracing(&settings.log_file_path)?;

    let cli = Cli::parse();

    if let Some(data) = cli.data {
        settings.data_path = data;
    }
    if let Some(delimiter) = cli.delimiter.as_deref() {
        settings.load.delimiter = parse_delimiter(delimiter)?;
    }
    if let Some(encoding) = cli.encoding {
        settings.load.encoding = encoding;
    }

    let mut cache = TableCache::new();
    let table = cache
        .get_or_load(&settings.data_path, settings.load)
        .with_context(|| format!("failed to load {}", settings.data_path.display()))?;

    if table.is_empty() {
        warn!(path = %settings.data_path.display(), "Enrollment table has no rows");
    }

    match cli.command {
        Commands::Summary { filter: args, format } => {
            let params = args.resolve(&table)?;
            let view = filter(&table, &params)?;
            let kpis = compute_kpis(&view);
            info!(rows = view.len(), total = kpis.total, "Indicators computed");

            match format {
                TextFormat::Text => print!("{}", render_kpis(&kpis)),
                TextFormat::Json => println!("{}", to_json(&params, view.len(), &kpis)?),
            }
        }
        Commands::Aggregate {
            filter: args,
            by,
            share,
            format,
        } => {
            let params = args.resolve(&table)?;
            let view = filter(&table, &params)?;
            let rows = match by {
                Axis::Year => {
                    if share {
                        warn!("--share has no effect on yearly totals");
                    }
                    totals_by_year(&view)
                }
                Axis::Sex => sex_shares_by_year(&view, share),
                Axis::Category => category_by_year(&view, share),
            };
            info!(rows = view.len(), groups = rows.len(), axis = ?by, share, "Aggregated");

            match format {
                TableFormat::Csv => write_aggregate_csv(&rows, std::io::stdout().lock())?,
                TableFormat::Json => println!("{}", to_json(&params, view.len(), &rows)?),
            }
        }
        Commands::Insights { filter: args, format } => {
            let params = args.resolve(&table)?;
            let view = filter(&table, &params)?;
            let insights = compute_insights(&view);
            info!(
                rows = view.len(),
                first_year = ?insights.first_year,
                last_year = ?insights.last_year,
                "Insights computed"
            );

            match format {
                TextFormat::Text => print!("{}", render_insights(&insights)),
                TextFormat::Json => println!("{}", to_json(&params, view.len(), &insights)?),
            }
        }
        Commands::Drilldown {
            name,
            filter: args,
            format,
        } => {
            let params = args.resolve(&table)?;
            let view = filter(&table, &params)?;
            let Some(drill) = program_drilldown(&view, &name) else {
                warn!(program = %name, "Program has no rows for the selected filters");
                println!("No data for '{name}'. Available: {}", view.programs().join(", "));
                return Ok(());
            };

            match format {
                TextFormat::Text => print!("{}", render_drilldown(&drill)),
                TextFormat::Json => println!("{}", to_json(&params, view.len(), &drill)?),
            }
        }
        Commands::Export {
            filter: args,
            output,
        } => {
            let params = args.resolve(&table)?;
            let view = filter(&table, &params)?;
            export_view_to_path(&output, &view)
                .with_context(|| format!("failed to export to {}", output.display()))?;
            println!("Exported {} rows to {}.", view.len(), output.display());
        }
        Commands::Options => {
            match table.year_bounds() {
                Some((min, max)) => println!("Years: {min}-{max}"),
                None => println!("Years: none"),
            }
            println!("Programs:");
            for program in table.programs() {
                println!("  {program}");
            }
            println!("Categories:");
            for category in table.categories() {
                println!("  {category}");
            }
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
///
/// The returned guard flushes the file writer when dropped.
fn init_tracing(log_file_path: &Path) -> Result<WorkerGuard> {
    let log_dir = log_file_path.parent().unwrap_or(Path::new("logs"));
    let log_file_name = log_file_path
        .file_name()
        .unwrap_or(OsStr::new("enrollment_insights.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}
