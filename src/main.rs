//! gazemap - eye-tracking fixation analysis from the command line
//!
//! Loads a `;`-separated fixation export once and prints one query result:
//! filtered rows, KPIs, or the data behind each dashboard plot.
//!
//! # Usage
//!
//! ```bash
//! # Dataset overview
//! gazemap --data fixations.csv overview
//!
//! # Antwerpen rows of two participants, in scanpath order, as CSV
//! gazemap --data fixations.csv --format csv rows --city Antwerpen --user p1 --user p3 --ordered
//!
//! # KPIs for tasks between 5 and 30 seconds
//! gazemap --data fixations.csv kpi --min 5 --max 30
//! ```
//!
//! # Environment Variables
//!
//! - `GAZEMAP_CONFIG`: Path to a TOML config file
//! - `GAZEMAP_DATA`: Fixation export to load (same as `--data`)
//! - `RUST_LOG`: Logging level (default: info). Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gazemap::acquisition::fixation_csv as cols;
use gazemap::analysis::{
    build_color_map, catalog, density_grid, duration_distribution, scanpaths, task_duration_histogram, BoxSummary,
    ColorMap, DatasetCatalog, DensityGrid, GroupMetric, Histogram, Scanpath,
};
use gazemap::types::{
    Condition, DurationTarget, FilterSpec, GreyLabel, KpiReport, KpiValue, UserSelection,
};
use gazemap::config::validation;
use gazemap::{FixationTable, GazeConfig, Pipeline};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "gazemap")]
#[command(about = "Eye-tracking fixation aggregation and query tool")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides GAZEMAP_CONFIG and ./gazemap.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Fixation export to load (default: [data] path from the config)
    #[arg(long, global = true, env = "GAZEMAP_DATA", value_name = "PATH")]
    data: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cities, maps, participants and per-city counts of the whole dataset
    Overview,

    /// Filtered fixation rows with their group summaries
    Rows {
        #[command(flatten)]
        filter: FilterArgs,
        /// Sort by fixation index within each participant/stimulus group
        #[arg(long)]
        ordered: bool,
    },

    /// Participant, duration and saccade KPIs per condition
    Kpi {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Ordered gaze paths per participant and stimulus
    Scanpath {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Fixation density grid over the stimulus image
    Heatmap {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Box-plot summaries per city and condition
    Distribution {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = MetricArg::Task)]
        metric: MetricArg,
    },

    /// Task-duration histogram per condition
    Histogram {
        #[command(flatten)]
        filter: FilterArgs,
        /// Bin count (default: [histogram] bins from the config)
        #[arg(long)]
        bins: Option<usize>,
    },

    /// Legend color assigned to every participant
    Colors,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Keep rows of this city (all its maps)
    #[arg(long, conflicts_with = "map")]
    city: Option<String>,

    /// Keep rows of this exact map variant, e.g. Antwerpen_S1
    #[arg(long)]
    map: Option<String>,

    /// Keep rows of one condition: color or grey
    #[arg(long, value_parser = parse_condition)]
    condition: Option<Condition>,

    /// Keep rows of these participants (repeatable; "All" keeps everyone)
    #[arg(long = "user")]
    users: Vec<String>,

    /// Lower duration bound (inclusive)
    #[arg(long)]
    min: Option<f64>,

    /// Upper duration bound (inclusive)
    #[arg(long)]
    max: Option<f64>,

    /// Field the bounds apply to (default: [filter] duration_target)
    #[arg(long, value_enum)]
    duration_target: Option<TargetArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TargetArg {
    /// Group task duration, seconds
    Task,
    /// Single fixation duration, milliseconds
    Fixation,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MetricArg {
    Task,
    AvgFixation,
}

fn parse_condition(raw: &str) -> Result<Condition, String> {
    Condition::parse(raw).ok_or_else(|| format!("unknown condition '{raw}' (expected color or grey)"))
}

impl FilterArgs {
    /// Build the query, falling back to the config's duration defaults.
    fn to_spec(&self, config: &GazeConfig) -> Result<FilterSpec> {
        let mut spec = FilterSpec::all();

        if let Some(city) = &self.city {
            spec = spec.city(city.clone());
        } else if let Some(map) = &self.map {
            spec = spec.map(map.clone());
        }
        if let Some(condition) = self.condition {
            spec = spec.condition(condition);
        }
        spec = spec.users(UserSelection::from_values(&self.users));

        let target = self.duration_target.map(|t| match t {
            TargetArg::Task => DurationTarget::Task,
            TargetArg::Fixation => DurationTarget::Fixation,
        });
        let bounds = config.filter.overridden_by(target, self.min, self.max);
        let errors = validation::filter_bound_errors(&bounds);
        anyhow::ensure!(errors.is_empty(), "invalid duration bounds: {}", errors.join("; "));
        if let Some(range) = bounds.duration_range() {
            spec = spec.duration(range);
        }

        Ok(spec)
    }
}

// ============================================================================
// Output
// ============================================================================

const NO_DATA: &str = "No data for the current selection.";

/// Writes query results to stdout in the selected format.
struct Printer {
    format: OutputFormat,
    grey: GreyLabel,
}

impl Printer {
    fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, value).context("Failed to write JSON")?;
        writeln!(out)?;
        Ok(())
    }

    fn csv(&self, header: &[&str], records: impl IntoIterator<Item = Vec<String>>) -> Result<()> {
        let mut writer = csv::Writer::from_writer(io::stdout().lock());
        writer.write_record(header)?;
        for record in records {
            writer.write_record(&record)?;
        }
        writer.flush().context("Failed to write CSV")?;
        Ok(())
    }

    fn label(&self, condition: Condition) -> &'static str {
        condition.label(self.grey)
    }

    fn overview(&self, overview: &DatasetCatalog) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.json(overview),
            OutputFormat::Csv => self.csv(
                &["city", "fixations", "users"],
                overview.cities.iter().map(|city| {
                    vec![
                        city.clone(),
                        overview.fixations_per_city.get(city).copied().unwrap_or(0).to_string(),
                        overview.users_per_city.get(city).copied().unwrap_or(0).to_string(),
                    ]
                }),
            ),
            OutputFormat::Text => {
                println!("Fixations:   {}", overview.rows);
                println!("Cities:      {}", overview.cities.join(", "));
                println!("City maps:   {}", overview.city_maps.join(", "));
                println!("Users:       {}", overview.users.join(", "));
                for (condition, users) in &overview.users_by_condition {
                    println!("  {:<10} {} users", self.label(*condition), users.len());
                }
                for (condition, bounds) in &overview.task_duration_bounds {
                    println!(
                        "  {:<10} task duration {:.2}-{:.2} s",
                        self.label(*condition),
                        bounds.min,
                        bounds.max
                    );
                }
                println!();
                println!("{:<24} {:>10} {:>6}", "City", "Fixations", "Users");
                for city in &overview.cities {
                    println!(
                        "{:<24} {:>10} {:>6}",
                        city,
                        overview.fixations_per_city.get(city).copied().unwrap_or(0),
                        overview.users_per_city.get(city).copied().unwrap_or(0)
                    );
                }
                Ok(())
            }
        }
    }

    fn rows(&self, table: &FixationTable) -> Result<()> {
        let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        match self.format {
            OutputFormat::Json => self.json(&table.to_rows()),
            OutputFormat::Csv => self.csv(
                &[
                    cols::COL_USER,
                    cols::COL_CITY_MAP,
                    cols::COL_CITY,
                    cols::COL_DESCRIPTION,
                    cols::COL_TIMESTAMP,
                    cols::COL_STIMULUS,
                    cols::COL_FIXATION_INDEX,
                    cols::COL_FIXATION_DURATION,
                    cols::COL_MAPPED_X,
                    cols::COL_MAPPED_Y,
                    cols::COL_NORMALIZED_X,
                    cols::COL_SACCADE_LENGTH,
                    "FixationDuration_aggregated",
                    "FixationDuration_avg",
                ],
                table.iter().map(|r| {
                    vec![
                        r.user.clone(),
                        r.city_map.clone(),
                        r.city.clone(),
                        self.label(r.condition).to_string(),
                        r.timestamp.clone().unwrap_or_default(),
                        r.stimulus_name.clone().unwrap_or_default(),
                        r.fixation_index.to_string(),
                        r.fixation_duration.to_string(),
                        r.mapped_x.to_string(),
                        r.mapped_y.to_string(),
                        opt(r.normalized_x),
                        opt(r.saccade_length),
                        r.task_duration_aggregated.to_string(),
                        r.avg_fixation_duration.to_string(),
                    ]
                }),
            ),
            OutputFormat::Text => {
                if table.is_empty() {
                    println!("{NO_DATA}");
                    return Ok(());
                }
                println!(
                    "{:<10} {:<18} {:<6} {:>5} {:>9} {:>8} {:>8} {:>9} {:>9}",
                    "User", "CityMap", "Cond", "Idx", "Dur[ms]", "X", "Y", "Task[s]", "Avg[s]"
                );
                for r in table {
                    println!(
                        "{:<10} {:<18} {:<6} {:>5} {:>9.0} {:>8.1} {:>8.1} {:>9.3} {:>9.3}",
                        r.user,
                        r.city_map,
                        self.label(r.condition),
                        r.fixation_index,
                        r.fixation_duration,
                        r.mapped_x,
                        r.mapped_y,
                        r.task_duration_aggregated,
                        r.avg_fixation_duration
                    );
                }
                println!("{} rows", table.len());
                Ok(())
            }
        }
    }

    fn kpis(&self, report: &KpiReport) -> Result<()> {
        let fmt = |v: &KpiValue| v.as_option().map(|x| format!("{x:.2}")).unwrap_or_default();
        match self.format {
            OutputFormat::Json => self.json(report),
            OutputFormat::Csv => self.csv(
                &[
                    "condition",
                    "participants",
                    "avg_task_duration_s",
                    "fixation_points",
                    "avg_saccade_length",
                    "avg_fixation_duration_s",
                ],
                report.iter().map(|k| {
                    vec![
                        self.label(k.condition).to_string(),
                        k.participants.to_string(),
                        fmt(&k.avg_task_duration),
                        k.fixation_points.to_string(),
                        fmt(&k.avg_saccade_length),
                        fmt(&k.avg_fixation_duration),
                    ]
                }),
            ),
            OutputFormat::Text => {
                let (c, g) = (report.color(), report.grey());
                println!("{:<32} {:>10} {:>10}", "KPI", self.label(Condition::Color), self.label(Condition::Grey));
                println!("{:<32} {:>10} {:>10}", "Participants", c.participants, g.participants);
                println!(
                    "{:<32} {:>10} {:>10}",
                    format!("{} [s]", gazemap::ConditionKpis::AVG_TASK_DURATION),
                    c.avg_task_duration.to_string(),
                    g.avg_task_duration.to_string()
                );
                println!(
                    "{:<32} {:>10} {:>10}",
                    gazemap::ConditionKpis::FIXATION_POINTS,
                    c.fixation_points,
                    g.fixation_points
                );
                println!(
                    "{:<32} {:>10} {:>10}",
                    gazemap::ConditionKpis::AVG_SACCADE_LENGTH,
                    c.avg_saccade_length.to_string(),
                    g.avg_saccade_length.to_string()
                );
                println!(
                    "{:<32} {:>10} {:>10}",
                    format!("{} [s]", gazemap::ConditionKpis::AVG_FIXATION_DURATION),
                    c.avg_fixation_duration.to_string(),
                    g.avg_fixation_duration.to_string()
                );
                Ok(())
            }
        }
    }

    fn scanpaths(&self, paths: &[Scanpath]) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.json(paths),
            OutputFormat::Csv => self.csv(
                &["user", "city_map", "condition", "color", "fixation_index", "x", "y", "duration_ms"],
                paths.iter().flat_map(|p| {
                    p.points.iter().map(move |pt| {
                        vec![
                            p.user.clone(),
                            p.city_map.clone(),
                            self.label(p.condition).to_string(),
                            p.color.clone().unwrap_or_default(),
                            pt.fixation_index.to_string(),
                            pt.x.to_string(),
                            pt.y.to_string(),
                            pt.duration_ms.to_string(),
                        ]
                    })
                }),
            ),
            OutputFormat::Text => {
                if paths.is_empty() {
                    println!("{NO_DATA}");
                    return Ok(());
                }
                for p in paths {
                    println!(
                        "{} / {} / {} [{}]: {} fixations",
                        p.user,
                        p.city_map,
                        self.label(p.condition),
                        p.color.as_deref().unwrap_or("-"),
                        p.points.len()
                    );
                    let trail: Vec<String> = p.points.iter().map(|pt| format!("({:.0},{:.0})", pt.x, pt.y)).collect();
                    println!("  {}", trail.join(" -> "));
                }
                Ok(())
            }
        }
    }

    fn grid(&self, grid: &DensityGrid) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.json(grid),
            OutputFormat::Csv => self.csv(
                &["y_bin", "x_bin", "count"],
                grid.counts.iter().enumerate().flat_map(|(y, row)| {
                    row.iter()
                        .enumerate()
                        .map(move |(x, count)| vec![y.to_string(), x.to_string(), count.to_string()])
                }),
            ),
            OutputFormat::Text => {
                if grid.total == 0 {
                    println!("{NO_DATA}");
                    return Ok(());
                }
                println!(
                    "{}x{} bins over {:.0}x{:.0} px: {} fixations, {} outside",
                    grid.spec.bins_x, grid.spec.bins_y, grid.spec.width, grid.spec.height, grid.total, grid.clipped
                );
                let width = grid.max_count.to_string().len();
                for row in &grid.counts {
                    let cells: Vec<String> = row.iter().map(|c| format!("{c:>width$}")).collect();
                    println!("{}", cells.join(" "));
                }
                Ok(())
            }
        }
    }

    fn distribution(&self, metric: GroupMetric, boxes: &[BoxSummary]) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.json(boxes),
            OutputFormat::Csv => self.csv(
                &["city", "condition", "count", "min", "q1", "median", "q3", "max", "mean"],
                boxes.iter().map(|b| {
                    vec![
                        b.city.clone(),
                        self.label(b.condition).to_string(),
                        b.count.to_string(),
                        b.min.to_string(),
                        b.q1.to_string(),
                        b.median.to_string(),
                        b.q3.to_string(),
                        b.max.to_string(),
                        b.mean.to_string(),
                    ]
                }),
            ),
            OutputFormat::Text => {
                if boxes.is_empty() {
                    println!("{NO_DATA}");
                    return Ok(());
                }
                println!("{}", metric.label());
                println!(
                    "{:<18} {:<6} {:>5} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
                    "City", "Cond", "N", "Min", "Q1", "Median", "Q3", "Max", "Mean"
                );
                for b in boxes {
                    println!(
                        "{:<18} {:<6} {:>5} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
                        b.city,
                        self.label(b.condition),
                        b.count,
                        b.min,
                        b.q1,
                        b.median,
                        b.q3,
                        b.max,
                        b.mean
                    );
                }
                Ok(())
            }
        }
    }

    fn histograms(&self, hists: &[Histogram]) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.json(hists),
            OutputFormat::Csv => self.csv(
                &["condition", "bin_start", "bin_end", "count"],
                hists.iter().flat_map(|h| {
                    h.counts.iter().enumerate().map(move |(i, count)| {
                        vec![
                            self.label(h.condition).to_string(),
                            h.bin_edges[i].to_string(),
                            h.bin_edges[i + 1].to_string(),
                            count.to_string(),
                        ]
                    })
                }),
            ),
            OutputFormat::Text => {
                if hists.iter().all(|h| h.total == 0) {
                    println!("{NO_DATA}");
                    return Ok(());
                }
                for h in hists {
                    println!("{} ({} tasks)", self.label(h.condition), h.total);
                    for (i, count) in h.counts.iter().enumerate() {
                        println!(
                            "  {:>8.2} - {:>8.2} s  {:>4}  {}",
                            h.bin_edges[i],
                            h.bin_edges[i + 1],
                            count,
                            "#".repeat(*count)
                        );
                    }
                }
                Ok(())
            }
        }
    }

    fn colors(&self, colors: &ColorMap) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.json(colors),
            OutputFormat::Csv => self.csv(
                &["user", "color"],
                colors.iter().map(|(u, c)| vec![u.to_string(), c.to_string()]),
            ),
            OutputFormat::Text => {
                if colors.is_empty() {
                    println!("{NO_DATA}");
                }
                for (user, color) in colors.iter() {
                    println!("{user:<16} {color}");
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    let config = GazeConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    let data_path = args
        .data
        .clone()
        .or_else(|| config.data.path.clone())
        .context("No fixation data given: pass --data, set GAZEMAP_DATA or [data] path in the config")?;

    let pipeline = Pipeline::load(&data_path, config.csv_options())
        .with_context(|| format!("Failed to load fixation data from {}", data_path.display()))?;
    info!(rows = pipeline.table().len(), "Fixation data ready");

    let printer = Printer {
        format: args.format,
        grey: config.conditions.grey_label,
    };
    let prefer_normalized = config.grid_spec().x_source == gazemap::analysis::XSource::Normalized;

    match &args.command {
        Command::Overview => printer.overview(&catalog(pipeline.table())),
        Command::Rows { filter, ordered } => {
            let spec = filter.to_spec(&config)?;
            let rows = if *ordered {
                pipeline.query_ordered(&spec)
            } else {
                pipeline.query(&spec)
            };
            printer.rows(&rows)
        }
        Command::Kpi { filter } => printer.kpis(&pipeline.kpis(&filter.to_spec(&config)?)),
        Command::Scanpath { filter } => {
            let colors = build_color_map(pipeline.table().users(), &config.palette.colors);
            let view = pipeline.query(&filter.to_spec(&config)?);
            printer.scanpaths(&scanpaths(&view, &colors, prefer_normalized))
        }
        Command::Heatmap { filter } => {
            let view = pipeline.query(&filter.to_spec(&config)?);
            printer.grid(&density_grid(&view, config.grid_spec()))
        }
        Command::Distribution { filter, metric } => {
            let metric = match metric {
                MetricArg::Task => GroupMetric::TaskDuration,
                MetricArg::AvgFixation => GroupMetric::AvgFixationDuration,
            };
            let view = pipeline.query(&filter.to_spec(&config)?);
            printer.distribution(metric, &duration_distribution(&view, metric))
        }
        Command::Histogram { filter, bins } => {
            let bins = bins.unwrap_or(config.histogram.bins);
            validation::check_histogram_bins("--bins", bins).map_err(anyhow::Error::msg)?;
            let view = pipeline.query(&filter.to_spec(&config)?);
            printer.histograms(&task_duration_histogram(&view, bins))
        }
        Command::Colors => printer.colors(&build_color_map(pipeline.table().users(), &config.palette.colors)),
    }
}
