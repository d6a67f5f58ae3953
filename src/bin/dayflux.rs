//! Dayflux CLI - Command-line interface for the Dayflux dashboard engine
//!
//! Commands:
//! - summary: Period averages, day-of-week pattern and monthly figures
//! - day: Daily view of one date
//! - weeks: Calendar weeks, or a weekly trend for one category
//! - distribution: Hourly occurrence rates of a category
//! - stats: Average, busiest and lightest day of a category
//! - calendar: Calendar markers of one month
//! - split: Weekday vs. weekend comparison of a category
//! - correlate: Correlations of a category with every other category
//! - snapshot: Full analytics document for a category
//! - validate: Validate a dataset against the category template
//! - template: Print the effective configuration

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use chrono::Datelike;
use dayflux::aggregate::{TimeRange, WEEKDAY_LABELS};
use dayflux::calendar::CalendarEvent;
use dayflux::context::{MetricChange, OutdoorIntensity};
use dayflux::encoder::{
    FailedDay, NamedActivityStats, NamedCorrelation, NamedDistribution, NamedPeriodAverage,
    NamedSplit, SnapshotEncoder,
};
use dayflux::normalizer::parse_date;
use dayflux::pipeline::DashboardProcessor;
use dayflux::sample::sample_days;
use dayflux::schema::{DatasetFormat, RawDay, RawDayAdapter, ValidationReport};
use dayflux::types::{NamedHours, QualityFlag};
use dayflux::{ComputeError, DashboardConfig, DAYFLUX_VERSION};

/// Dayflux - Daily activity dashboard engine
#[derive(Parser)]
#[command(name = "dayflux")]
#[command(version = DAYFLUX_VERSION)]
#[command(about = "Aggregate daily activity intervals into dashboard statistics", long_about = None)]
struct Cli {
    /// Dataset file (use - for stdin); the built-in sample week when omitted
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Dataset layout
    #[arg(long, global = true, default_value = "auto")]
    input_format: InputFormat,

    /// Dashboard config JSON (categories, roles, goals)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Period averages, day-of-week pattern and monthly figures
    Summary {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Daily view of one date
    Day {
        /// Date to show (YYYY-MM-DD); the last recorded day when omitted
        date: Option<String>,
    },

    /// Calendar weeks, or the weekly trend of one category
    Weeks {
        /// Show the weekly average of this category only
        #[arg(long)]
        category: Option<String>,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Hourly occurrence rates of a category
    Distribution {
        /// Category name
        category: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Average, busiest and lightest day of a category
    Stats {
        /// Category name
        category: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Calendar markers of one month
    Calendar {
        /// Month to show (YYYY-MM); the month of the last recorded day when omitted
        month: Option<String>,

        /// Only list these categories (repeatable); sleep and outdoor markers always show
        #[arg(long = "category")]
        categories: Vec<String>,
    },

    /// Weekday vs. weekend comparison of a category
    Split {
        /// Category name
        category: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Correlations of a category with every other category
    Correlate {
        /// Category name
        category: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Full analytics document for a category
    Snapshot {
        /// Category name
        category: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Validate a dataset against the category template
    Validate,

    /// Print the effective configuration
    Template,
}

#[derive(Args, Clone, Default)]
struct RangeArgs {
    /// Only days within N days of the reference date
    #[arg(long, conflicts_with = "since")]
    last_days: Option<u32>,

    /// Only days on or after this date (YYYY-MM-DD)
    #[arg(long)]
    since: Option<String>,

    /// Reference date for --last-days; the last recorded day when omitted
    #[arg(long)]
    reference: Option<String>,
}

impl RangeArgs {
    fn apply(&self, processor: &mut DashboardProcessor) -> Result<TimeRange, ComputeError> {
        if let Some(reference) = &self.reference {
            processor.set_reference_date(parse_date(reference)?);
        }
        Ok(match (&self.since, self.last_days) {
            (Some(since), _) => TimeRange::Since(parse_date(since)?),
            (None, Some(n)) => TimeRange::LastDays(n),
            (None, None) => TimeRange::All,
        })
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Detect the layout from the content
    Auto,
    /// Object keyed by date
    Object,
    /// Array of day records
    Array,
    /// Newline-delimited day records
    Ndjson,
}

impl From<InputFormat> for DatasetFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Auto => DatasetFormat::Auto,
            InputFormat::Object => DatasetFormat::Object,
            InputFormat::Array => DatasetFormat::Array,
            InputFormat::Ndjson => DatasetFormat::Ndjson,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable report
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: Option<LevelFilter>) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level, rust_log.as_deref()))
        .with_writer(io::stderr)
        .init();
}

/// `--log-level` scopes to this crate; otherwise `RUST_LOG` directives are used as written
fn log_filter(level: Option<LevelFilter>, rust_log: Option<&str>) -> EnvFilter {
    let target = env!("CARGO_PKG_NAME").replace('-', "_");
    if let Some(level) = level {
        return EnvFilter::new(format!("{target}={level}"));
    }
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(format!("{target}=warn")))
}

fn run(cli: Cli) -> Result<(), DayfluxCliError> {
    let config = load_config(cli.config.as_deref())?;
    let raw_days = load_raw_days(cli.input.as_deref(), cli.input_format)?;
    let format = cli.format;

    match cli.command {
        Commands::Validate => return cmd_validate(&raw_days, &config, format),
        Commands::Template => return cmd_template(&config, format),
        _ => {}
    }

    let mut processor = DashboardProcessor::new(&raw_days, config)?;
    info!(
        days = processor.days().len(),
        failed = processor.failures().len(),
        "dataset loaded"
    );

    match cli.command {
        Commands::Summary { range } => cmd_summary(&mut processor, &range, format),
        Commands::Day { date } => cmd_day(&processor, date.as_deref(), format),
        Commands::Weeks { category, range } => {
            cmd_weeks(&mut processor, category.as_deref(), &range, format)
        }
        Commands::Distribution { category, range } => {
            cmd_distribution(&mut processor, &category, &range, format)
        }
        Commands::Stats { category, range } => cmd_stats(&mut processor, &category, &range, format),
        Commands::Calendar { month, categories } => {
            cmd_calendar(&processor, month.as_deref(), &categories, format)
        }
        Commands::Split { category, range } => cmd_split(&mut processor, &category, &range, format),
        Commands::Correlate { category, range } => {
            cmd_correlate(&mut processor, &category, &range, format)
        }
        Commands::Snapshot { category, range } => {
            cmd_snapshot(&mut processor, &category, &range, format)
        }
        Commands::Validate | Commands::Template => Ok(()),
    }
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig, DayfluxCliError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            Ok(DashboardConfig::from_json(&fs::read_to_string(path)?)?)
        }
        None => Ok(DashboardConfig::default()),
    }
}

fn load_raw_days(
    input: Option<&Path>,
    format: InputFormat,
) -> Result<Vec<RawDay>, DayfluxCliError> {
    let input_data = match input {
        None => {
            debug!("no input given, using the sample week");
            return Ok(sample_days()?);
        }
        Some(path) if path.to_string_lossy() == "-" => {
            if atty::is(atty::Stream::Stdin) {
                return Err(DayfluxCliError::StdinIsTerminal);
            }
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        Some(path) => fs::read_to_string(path)?,
    };

    Ok(RawDayAdapter::parse(&input_data, format.into())?)
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Serialize)]
struct SummaryOutput {
    range: TimeRange,
    reference_date: String,
    first_date: String,
    last_date: String,
    period_average: NamedPeriodAverage,
    day_of_week: Vec<DayOfWeekOutput>,
    months: Vec<dayflux::types::MonthlySummary>,
    failed_days: Vec<FailedDay>,
}

#[derive(Serialize)]
struct DayOfWeekOutput {
    label: &'static str,
    day_count: usize,
    average_hours: Vec<NamedHours>,
}

fn cmd_summary(
    processor: &mut DashboardProcessor,
    range: &RangeArgs,
    format: OutputFormat,
) -> Result<(), DayfluxCliError> {
    let range = range.apply(processor)?;
    let summary = processor.summary(range)?;
    let template = &processor.config().categories;

    let output = SummaryOutput {
        range: summary.range,
        reference_date: summary.reference_date.to_string(),
        first_date: summary.first_date.to_string(),
        last_date: summary.last_date.to_string(),
        period_average: NamedPeriodAverage::new(&summary.period_average, template),
        day_of_week: summary
            .day_of_week
            .iter()
            .map(|p| DayOfWeekOutput {
                label: p.label,
                day_count: p.day_count,
                average_hours: p.average_hours.named(template),
            })
            .collect(),
        months: summary.months,
        failed_days: failed_days(processor),
    };

    emit(&output, format, |o| {
        let mut out = String::new();
        out.push_str("Dashboard Summary\n");
        out.push_str("=================\n");
        out.push_str(&format!(
            "Range:        {} .. {} ({} days)\n",
            o.first_date, o.last_date, o.period_average.day_count
        ));
        out.push_str(&format!(
            "Avg sleep:    {:.1} h\n",
            o.period_average.average_sleep_hours
        ));
        out.push_str(&format!(
            "Avg outdoor:  {:.0} min\n",
            o.period_average.average_outdoor_minutes
        ));
        out.push_str("\nAverage hours per category:\n");
        out.push_str(&render_hours(&o.period_average.average_hours));
        out.push_str("\nDay of week:\n");
        for pattern in &o.day_of_week {
            let busiest = pattern
                .average_hours
                .iter()
                .filter(|h| h.hours > 0.0)
                .map(|h| format!("{} {:.1}", h.name, h.hours))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "  {}  {} day(s)  {}\n",
                pattern.label, pattern.day_count, busiest
            ));
        }
        out.push_str("\nMonths:\n");
        for month in &o.months {
            out.push_str(&format!(
                "  {}  {} days  sleep {:.1} h  outdoor {:.0} min\n",
                month.month, month.total_days, month.average_sleep_hours, month.average_outdoor_minutes
            ));
        }
        out.push_str(&render_failed_days(&o.failed_days));
        out
    })
}

#[derive(Serialize)]
struct DayOutput {
    date: String,
    label: &'static str,
    is_weekend: bool,
    previous_date: Option<String>,
    sleep_hours: u32,
    outdoor_minutes: u32,
    outdoor_intensity: OutdoorIntensity,
    sleep_change: MetricChange,
    outdoor_change: MetricChange,
    sleep_goal_pct: f64,
    outdoor_goal_pct: f64,
    categories: Vec<CategoryChangeOutput>,
    week: Vec<WeekRowOutput>,
    quality_flags: Vec<QualityFlag>,
}

#[derive(Serialize)]
struct CategoryChangeOutput {
    name: String,
    color: String,
    hours: f64,
    change_pct: Option<f64>,
}

#[derive(Serialize)]
struct WeekRowOutput {
    date: String,
    label: &'static str,
    is_selected: bool,
    hours: Vec<NamedHours>,
}

fn cmd_day(
    processor: &DashboardProcessor,
    date: Option<&str>,
    format: OutputFormat,
) -> Result<(), DayfluxCliError> {
    let date = match date {
        Some(date) => parse_date(date)?,
        None => processor.last_date().ok_or(ComputeError::EmptyDataset)?,
    };
    let context = processor.context(date)?;
    let template = &processor.config().categories;

    let output = DayOutput {
        date: context.day.date.to_string(),
        label: WEEKDAY_LABELS[usize::from(context.day.day_of_week)],
        is_weekend: context.day.is_weekend,
        previous_date: context.previous_date.map(|d| d.to_string()),
        sleep_hours: context.day.sleep_hours,
        outdoor_minutes: context.day.outdoor_minutes,
        outdoor_intensity: context.outdoor_intensity,
        sleep_change: context.sleep_change,
        outdoor_change: context.outdoor_change,
        sleep_goal_pct: context.goal_progress.sleep_pct,
        outdoor_goal_pct: context.goal_progress.outdoor_pct,
        categories: template
            .iter()
            .zip(&context.category_changes)
            .map(|((_, category), change)| CategoryChangeOutput {
                name: category.name.clone(),
                color: category.color.clone(),
                hours: change.current,
                change_pct: change.change_pct,
            })
            .collect(),
        week: context
            .week
            .iter()
            .map(|row| WeekRowOutput {
                date: row.date.to_string(),
                label: row.label,
                is_selected: row.is_selected,
                hours: row.hours.named(template),
            })
            .collect(),
        quality_flags: context.day.quality_flags.clone(),
    };

    emit(&output, format, |o| {
        let mut out = String::new();
        out.push_str(&format!("{} ({})\n", o.date, o.label));
        out.push_str("=================\n");
        out.push_str(&format!(
            "Sleep:    {} h{}  ({:.0}% of goal)\n",
            o.sleep_hours,
            render_change(&o.sleep_change),
            o.sleep_goal_pct
        ));
        out.push_str(&format!(
            "Outdoor:  {} min{}  ({:.0}% of goal, {:?})\n",
            o.outdoor_minutes,
            render_change(&o.outdoor_change),
            o.outdoor_goal_pct,
            o.outdoor_intensity
        ));
        if let Some(previous) = &o.previous_date {
            out.push_str(&format!("Compared with {previous}\n"));
        }
        out.push_str("\nCategories:\n");
        for category in &o.categories {
            let change = category
                .change_pct
                .map(|c| format!("  ({c:+.0}%)"))
                .unwrap_or_default();
            out.push_str(&format!(
                "  {:<12} {:>4.0} h{}\n",
                category.name, category.hours, change
            ));
        }
        out.push_str("\nWeek:\n");
        for row in &o.week {
            let marker = if row.is_selected { "*" } else { " " };
            let total: f64 = row.hours.iter().map(|h| h.hours).sum();
            out.push_str(&format!("  {marker} {} {}  {:.0} h\n", row.label, row.date, total));
        }
        if !o.quality_flags.is_empty() {
            out.push_str("\nQuality flags:\n");
            for flag in &o.quality_flags {
                out.push_str(&format!("  - {flag:?}\n"));
            }
        }
        out
    })
}

#[derive(Serialize)]
struct WeekOutput {
    start_date: String,
    end_date: String,
    day_count: usize,
    average_sleep_hours: f64,
    average_outdoor_minutes: f64,
    average_hours: Vec<NamedHours>,
}

fn cmd_weeks(
    processor: &mut DashboardProcessor,
    category: Option<&str>,
    range: &RangeArgs,
    format: OutputFormat,
) -> Result<(), DayfluxCliError> {
    let range = range.apply(processor)?;

    if let Some(name) = category {
        let id = processor.category(name)?;
        let trend = processor.weekly_trend(id, range);
        return emit(&trend, format, |points| {
            let mut out = format!("Weekly trend: {name}\n");
            out.push_str("=================\n");
            for point in points {
                out.push_str(&format!(
                    "  {}  {} day(s)  {:.1} h\n",
                    point.label, point.day_count, point.average_hours
                ));
            }
            out
        });
    }

    let template = &processor.config().categories;
    let weeks: Vec<WeekOutput> = processor
        .weeks(range)
        .iter()
        .map(|w| WeekOutput {
            start_date: w.start_date.to_string(),
            end_date: w.end_date.to_string(),
            day_count: w.member_days.len(),
            average_sleep_hours: w.average_sleep_hours,
            average_outdoor_minutes: w.average_outdoor_minutes,
            average_hours: w.average_hours.named(template),
        })
        .collect();

    emit(&weeks, format, |weeks| {
        let mut out = String::from("Calendar Weeks\n==============\n");
        for week in weeks {
            out.push_str(&format!(
                "\n{} .. {} ({} days)  sleep {:.1} h  outdoor {:.0} min\n",
                week.start_date,
                week.end_date,
                week.day_count,
                week.average_sleep_hours,
                week.average_outdoor_minutes
            ));
            out.push_str(&render_hours(&week.average_hours));
        }
        out
    })
}

fn cmd_distribution(
    processor: &mut DashboardProcessor,
    category: &str,
    range: &RangeArgs,
    format: OutputFormat,
) -> Result<(), DayfluxCliError> {
    let range = range.apply(processor)?;
    let id = processor.category(category)?;
    let template = processor.config().categories.clone();
    let output = NamedDistribution::new(processor.distribution(id, range), &template);

    emit(&output, format, |d| {
        let mut out = format!("Hourly distribution: {} ({} days)\n", d.category, d.days_considered);
        out.push_str("=================\n");
        for (hour, rate) in d.rates.iter().enumerate() {
            let bar = "#".repeat((rate / 5.0).round() as usize);
            out.push_str(&format!("  {hour:02}:00 {rate:>6.1}% {bar}\n"));
        }
        if let Some(peak) = d.peak_hour {
            out.push_str(&format!("\nPeak hour: {peak:02}:00\n"));
        }
        out
    })
}

fn cmd_stats(
    processor: &mut DashboardProcessor,
    category: &str,
    range: &RangeArgs,
    format: OutputFormat,
) -> Result<(), DayfluxCliError> {
    let range = range.apply(processor)?;
    let id = processor.category(category)?;
    let output = NamedActivityStats::new(
        &processor.activity_stats(id, range),
        &processor.config().categories,
    );

    emit(&output, format, |s| {
        let mut out = format!("Activity stats: {} ({} days)\n", s.category, s.day_count);
        out.push_str("=================\n");
        out.push_str(&format!(
            "Average: {:.1} h/day (weekday {:.1} h | weekend {:.1} h)\n",
            s.average_hours, s.weekday_average_hours, s.weekend_average_hours
        ));
        match s.max_day {
            Some(day) => out.push_str(&format!("Most:    {} h on {}\n", day.hours, day.date)),
            None => out.push_str("Most:    no data\n"),
        }
        match s.min_day {
            Some(day) => out.push_str(&format!("Least:   {} h on {}\n", day.hours, day.date)),
            None => out.push_str("Least:   no data\n"),
        }
        if let Some(peak) = s.peak_hour {
            out.push_str(&format!(
                "Peak:    {:02}:00 ({:.1}% of days)\n",
                peak.hour, peak.occurrence_rate
            ));
        }
        out
    })
}

#[derive(Serialize)]
struct CalendarDayOutput {
    date: String,
    events: Vec<CalendarEventOutput>,
}

#[derive(Serialize)]
struct CalendarEventOutput {
    kind: &'static str,
    label: String,
    color: String,
    hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minutes: Option<u32>,
}

fn cmd_calendar(
    processor: &DashboardProcessor,
    month: Option<&str>,
    categories: &[String],
    format: OutputFormat,
) -> Result<(), DayfluxCliError> {
    let first_of_month = match month {
        Some(month) => parse_date(&format!("{month}-01"))?,
        None => processor.reference_date(),
    };
    let filters = categories
        .iter()
        .map(|name| processor.category(name))
        .collect::<Result<Vec<_>, _>>()?;
    let template = &processor.config().categories;

    let output: Vec<CalendarDayOutput> = processor
        .calendar_month(first_of_month.year(), first_of_month.month())?
        .iter()
        .map(|day| CalendarDayOutput {
            date: day.date.to_string(),
            events: day
                .filtered(&filters)
                .into_iter()
                .map(|event| {
                    let (kind, label, hours, minutes) = match event {
                        CalendarEvent::Activity {
                            category, hours, ..
                        } => (
                            "activity",
                            template.name(*category).unwrap_or_default().to_string(),
                            Some(*hours),
                            None,
                        ),
                        CalendarEvent::Sleep { status, hours, .. } => (
                            "sleep",
                            status.as_str().to_string(),
                            Some(f64::from(*hours)),
                            None,
                        ),
                        CalendarEvent::Outdoor { minutes, .. } => {
                            ("outdoor", "outdoor".to_string(), None, Some(*minutes))
                        }
                    };
                    CalendarEventOutput {
                        kind,
                        label,
                        color: event.color().to_string(),
                        hidden: event.is_hidden(),
                        hours,
                        minutes,
                    }
                })
                .collect(),
        })
        .collect();

    emit(&output, format, |days| {
        let mut out = format!("Calendar {}\n", first_of_month.format("%Y-%m"));
        out.push_str("=================\n");
        for day in days {
            let labels: Vec<String> = day
                .events
                .iter()
                .map(|e| match (e.hours, e.minutes) {
                    (_, Some(minutes)) => format!("{} {minutes} min", e.label),
                    (Some(hours), None) => format!("{} {hours} h", e.label),
                    (None, None) => e.label.clone(),
                })
                .collect();
            out.push_str(&format!("  {}  {}\n", day.date, labels.join(", ")));
        }
        out
    })
}

fn cmd_split(
    processor: &mut DashboardProcessor,
    category: &str,
    range: &RangeArgs,
    format: OutputFormat,
) -> Result<(), DayfluxCliError> {
    let range = range.apply(processor)?;
    let id = processor.category(category)?;
    let output = NamedSplit::new(&processor.split(id, range), &processor.config().categories);

    emit(&output, format, |s| {
        let hours_of = |average: &NamedPeriodAverage| {
            average
                .average_hours
                .iter()
                .find(|h| h.name == s.category)
                .map(|h| h.hours)
                .unwrap_or(0.0)
        };
        let mut out = format!("Weekday vs. weekend: {}\n", s.category);
        out.push_str("=================\n");
        out.push_str(&format!(
            "Weekday ({} days): {:.1} h\n",
            s.weekday.day_count,
            hours_of(&s.weekday)
        ));
        out.push_str(&format!(
            "Weekend ({} days): {:.1} h\n",
            s.weekend.day_count,
            hours_of(&s.weekend)
        ));
        out.push_str(&format!("Weekend excess:    {:+.1} h\n", s.weekend_excess_hours));
        out
    })
}

fn cmd_correlate(
    processor: &mut DashboardProcessor,
    category: &str,
    range: &RangeArgs,
    format: OutputFormat,
) -> Result<(), DayfluxCliError> {
    let range = range.apply(processor)?;
    let id = processor.category(category)?;
    let template = processor.config().categories.clone();
    let output: Vec<NamedCorrelation> = processor
        .correlations(id, range)
        .iter()
        .map(|entry| NamedCorrelation::new(entry, &template))
        .collect();

    emit(&output, format, |entries| {
        let mut out = format!("Correlations with {category}\n");
        out.push_str("=================\n");
        for entry in entries {
            out.push_str(&format!(
                "  {:<12} r = {:>5.2}  avg {:.1} h\n",
                entry.category, entry.pearson_coefficient, entry.average_hours
            ));
        }
        out
    })
}

fn cmd_snapshot(
    processor: &mut DashboardProcessor,
    category: &str,
    range: &RangeArgs,
    format: OutputFormat,
) -> Result<(), DayfluxCliError> {
    let range = range.apply(processor)?;
    let id = processor.category(category)?;
    let snapshot = SnapshotEncoder::new().encode(processor, id, range)?;

    // The snapshot is a machine document; text falls back to pretty JSON
    let format = match format {
        OutputFormat::Text => OutputFormat::JsonPretty,
        other => other,
    };
    emit(&snapshot, format, |_| String::new())
}

fn cmd_validate(
    raw_days: &[RawDay],
    config: &DashboardConfig,
    format: OutputFormat,
) -> Result<(), DayfluxCliError> {
    let report = ValidationReport::build(raw_days, &config.categories);

    emit(&report, format, |r| {
        let mut out = String::new();
        out.push_str("Validation Report\n");
        out.push_str("=================\n");
        out.push_str(&format!("Schema:       {}\n", r.schema_version));
        out.push_str(&format!("Total days:   {}\n", r.total_days));
        out.push_str(&format!("Valid days:   {}\n", r.valid_days));
        out.push_str(&format!("Invalid days: {}\n", r.invalid_days));
        out.push_str(&format!("Warnings:     {}\n", r.warning_count));

        if !r.days.is_empty() {
            out.push_str("\nIssues:\n");
            for day in &r.days {
                for error in &day.errors {
                    out.push_str(&format!("  [ERR]  {} (index {}): {}\n", day.date, day.index, error));
                }
                for warning in &day.warnings {
                    out.push_str(&format!("  [WARN] {} (index {}): {}\n", day.date, day.index, warning));
                }
            }
        }
        out
    })?;

    if report.is_valid() {
        Ok(())
    } else {
        Err(DayfluxCliError::ValidationFailed(report.invalid_days))
    }
}

fn cmd_template(config: &DashboardConfig, format: OutputFormat) -> Result<(), DayfluxCliError> {
    emit(config, format, |c| {
        let mut out = String::from("Categories\n==========\n");
        for (id, category) in c.categories.iter() {
            out.push_str(&format!("  {:>2}  {:<12} {}\n", id.index(), category.name, category.color));
        }
        out.push_str("\nRoles:\n");
        out.push_str(&format!("  sleep    {}\n", c.roles.sleep));
        out.push_str(&format!("  outdoor  {}\n", c.roles.outdoor));
        out.push_str(&format!("  leisure  {}\n", c.roles.leisure));
        out.push_str("\nGoals:\n");
        out.push_str(&format!("  sleep    {} h\n", c.goals.optimal_sleep_hours));
        out.push_str(&format!("  outdoor  {} min\n", c.goals.optimal_outdoor_minutes));
        out.push_str(&format!(
            "\nReconciliation tolerance: {} h\n",
            c.reconciliation_tolerance_hours
        ));
        out
    })
}

// Helper functions

fn emit<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
    text: impl FnOnce(&T) -> String,
) -> Result<(), DayfluxCliError> {
    match format {
        OutputFormat::Text => print!("{}", text(value)),
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn failed_days(processor: &DashboardProcessor) -> Vec<FailedDay> {
    processor
        .failures()
        .iter()
        .map(|f| FailedDay {
            date: f.date.clone(),
            reason: f.error.to_string(),
        })
        .collect()
}

fn render_hours(hours: &[NamedHours]) -> String {
    hours
        .iter()
        .map(|h| format!("  {:<12} {:>5.1} h\n", h.name, h.hours))
        .collect()
}

fn render_change(change: &MetricChange) -> String {
    change
        .change_pct
        .map(|c| format!(" ({c:+.0}%)"))
        .unwrap_or_default()
}

fn render_failed_days(failed: &[FailedDay]) -> String {
    if failed.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nSkipped days:\n");
    for day in failed {
        out.push_str(&format!("  - {}: {}\n", day.date, day.reason));
    }
    out
}

// Error types

#[derive(Debug)]
enum DayfluxCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    StdinIsTerminal,
    ValidationFailed(usize),
}

impl From<io::Error> for DayfluxCliError {
    fn from(e: io::Error) -> Self {
        DayfluxCliError::Io(e)
    }
}

impl From<ComputeError> for DayfluxCliError {
    fn from(e: ComputeError) -> Self {
        DayfluxCliError::Compute(e)
    }
}

impl From<serde_json::Error> for DayfluxCliError {
    fn from(e: serde_json::Error) -> Self {
        DayfluxCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<DayfluxCliError> for CliError {
    fn from(e: DayfluxCliError) -> Self {
        match e {
            DayfluxCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            DayfluxCliError::Compute(e) => compute_error(e),
            DayfluxCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            DayfluxCliError::StdinIsTerminal => CliError {
                code: "STDIN_IS_TERMINAL".to_string(),
                message: "Expected a dataset on stdin".to_string(),
                hint: Some("Pipe a dataset into dayflux or pass --input <file>".to_string()),
            },
            DayfluxCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} days failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

fn compute_error(e: ComputeError) -> CliError {
    let (code, hint) = match &e {
        ComputeError::MissingData { .. } => (
            "MISSING_DATA",
            "Pick a recorded date; the summary command lists the covered range",
        ),
        ComputeError::UnknownCategory(_) => (
            "UNKNOWN_CATEGORY",
            "Run 'dayflux template' to list the configured categories",
        ),
        ComputeError::EmptyDataset => (
            "NO_DATA",
            "Ensure the input has at least one valid day inside the selected range",
        ),
        ComputeError::InvalidTemplate(_) => (
            "INVALID_CONFIG",
            "Check categories, roles and goals in the config file",
        ),
        ComputeError::InvalidHour { .. } | ComputeError::DateParseError(_) => (
            "INVALID_INPUT",
            "Run 'dayflux validate' for details",
        ),
        ComputeError::ParseError(_) | ComputeError::JsonError(_) => (
            "PARSE_ERROR",
            "Ensure input matches the dayflux.raw_day.v1 layouts",
        ),
        ComputeError::EncodingError(_) => ("ENCODING_ERROR", "Report this as a bug"),
    };

    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}
