use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use vaxstat_analytics::age::{breakthrough_age_density, cases_by_age_group};
use vaxstat_analytics::booster::{combination_matrix, eligibility, eligibility_series};
use vaxstat_analytics::density::density_batch;
use vaxstat_analytics::doses::weekly_doses;
use vaxstat_analytics::national::{NormalisationOptions, normalised_series};
use vaxstat_analytics::{
    BoosterPipeline, DateIndex, Denominators, EffectivenessSeries, RatePipeline,
};
use vaxstat_core::{Metric, Policy};
use vaxstat_store::{DataPaths, Dataset, DatasetLoader, load_policy};

mod display;

#[derive(Parser)]
#[command(name = "vaxstat")]
#[command(about = "Breakthrough infection and death rates by vaccination status", long_about = None)]
struct Cli {
    /// Root of the covid19-public data checkout
    #[arg(long, value_name = "DIR", env = "VAXSTAT_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// JSON policy override (lags, suppressions, eligibility windows)
    #[arg(long, value_name = "FILE")]
    policy: Option<PathBuf>,

    /// Region whose population is the denominator
    #[arg(long, default_value = "Malaysia")]
    region: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Cases,
    Deaths,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Cases => Metric::Cases,
            MetricArg::Deaths => Metric::Deaths,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Dataset(DatasetCommands),
    /// National cases, hospital load and deaths as a percentage of a past peak
    National {
        #[arg(long, default_value_t = 7)]
        moving_average: usize,
        #[arg(long, default_value_t = 7)]
        shift_hospitals: usize,
        #[arg(long, default_value_t = 21)]
        shift_deaths: usize,
        /// First date to print
        #[arg(long)]
        from: Option<NaiveDate>,
    },
}

/// Subcommands that need the linelists and vaccination tables loaded.
#[derive(Subcommand)]
enum DatasetCommands {
    /// Daily rates per 100,000 by vaccination status, with effectiveness
    Rates {
        #[arg(long, value_enum, default_value = "cases")]
        metric: MetricArg,
        #[arg(long)]
        start: NaiveDate,
        /// Defaults to the latest linelist date
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value_t = 7)]
        moving_average: usize,
    },
    /// Daily event counts by vaccination status
    Status {
        #[arg(long, value_enum, default_value = "cases")]
        metric: MetricArg,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Share of recent deaths versus share of population, by status
    DeathSummary {
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value_t = 14)]
        past_n_days: u32,
    },
    /// Age distribution of breakthrough deaths per brand
    AgeDensity {
        /// Print bin counts instead of densities
        #[arg(long)]
        frequency: bool,
    },
    /// Daily cases per age group
    AgeGroups {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value_t = 3)]
        bin_size: u32,
        #[arg(long, default_value_t = 7)]
        moving_average: usize,
    },
    /// Weekly doses administered by brand
    Doses {
        /// Express each week as shares of its total
        #[arg(long)]
        percentage: bool,
    },
    /// Booster combination analyses
    Booster {
        #[command(subcommand)]
        command: BoosterCommands,
    },
}

#[derive(Subcommand)]
enum BoosterCommands {
    /// Events and mean denominator per combination over a period
    Summary {
        #[arg(long, value_enum, default_value = "deaths")]
        metric: MetricArg,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Daily rates per combination
    Rates {
        #[arg(long, value_enum, default_value = "cases")]
        metric: MetricArg,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value_t = 7)]
        moving_average: usize,
    },
    /// Population eligible for a booster versus boosted
    Eligibility {
        /// Print one date as a card instead of the full table
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Primary brand by booster brand matrix on the latest date
    Combos,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("vaxstat v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let policy = match &cli.policy {
        Some(path) => {
            load_policy(path).with_context(|| format!("loading policy {}", path.display()))?
        }
        None => Policy::default(),
    };
    let loader = DatasetLoader::new(DataPaths::new(&cli.data_dir));

    match cli.command {
        Commands::National {
            moving_average,
            shift_hospitals,
            shift_deaths,
            from,
        } => {
            let days = loader
                .load_national()
                .context("loading national series")?;
            let defaults = NormalisationOptions::default();
            let options = NormalisationOptions {
                from: from.or(defaults.from),
                moving_average,
                shift_hospitals,
                shift_deaths,
                ..defaults
            };
            let series = normalised_series(&days, &options).context("normalising to peak")?;
            display::print_batch(&series.to_record_batch()?)
        }
        Commands::Dataset(command) => {
            let dataset = loader
                .load()
                .with_context(|| format!("loading dataset from {}", cli.data_dir.display()))?;
            run(command, &dataset, &policy, &cli.region)
        }
    }
}

/// `end`, or the latest event date in either linelist.
fn end_or_latest(dataset: &Dataset, end: Option<NaiveDate>) -> anyhow::Result<NaiveDate> {
    match end.or_else(|| dataset.last_updated()) {
        Some(date) => Ok(date),
        None => bail!("no --end given and the linelists are empty"),
    }
}

fn rate_pipeline<'a>(
    dataset: &'a Dataset,
    policy: &'a Policy,
    region: &str,
    metric: Metric,
) -> anyhow::Result<RatePipeline<'a>> {
    let denominators = Denominators::for_region(&dataset.vaccination, &dataset.population, region)
        .with_context(|| format!("population for {region}"))?;
    Ok(RatePipeline::new(
        metric,
        dataset.linelist(metric),
        denominators,
        policy,
    ))
}

fn run(
    command: DatasetCommands,
    dataset: &Dataset,
    policy: &Policy,
    region: &str,
) -> anyhow::Result<()> {
    match command {
        DatasetCommands::Rates {
            metric,
            start,
            end,
            moving_average,
        } => {
            let metric = Metric::from(metric);
            let end = end_or_latest(dataset, end)?;
            let rates = rate_pipeline(dataset, policy, region, metric)?
                .compute(start, end, moving_average)
                .with_context(|| format!("computing {metric} rates"))?;
            if !rates.gaps.is_empty() {
                tracing::warn!(gaps = rates.gaps.len(), "denominators missing on some dates");
            }
            println!("=== {metric} per 100,000 ===");
            display::print_batch(&rates.rates.to_record_batch()?)?;

            let effectiveness =
                EffectivenessSeries::from_rates(&rates).context("computing effectiveness")?;
            println!("=== Apparent effectiveness against {metric} (%) ===");
            display::print_batch(&effectiveness.to_record_batch()?)
        }
        DatasetCommands::Status { metric, start, end } => {
            let metric = Metric::from(metric);
            let end = end_or_latest(dataset, end)?;
            let table = rate_pipeline(dataset, policy, region, metric)?
                .status_table(start, end)
                .with_context(|| format!("counting {metric} by status"))?;
            display::print_batch(&table.to_record_batch()?)
        }
        DatasetCommands::DeathSummary { end, past_n_days } => {
            let end = end_or_latest(dataset, end)?;
            let summary = rate_pipeline(dataset, policy, region, Metric::Deaths)?
                .status_summary(end, past_n_days)
                .context("summarising deaths")?;
            display::print_status_summary(&summary);
            Ok(())
        }
        DatasetCommands::AgeDensity { frequency } => {
            let profiles = breakthrough_age_density(&dataset.deaths, policy, !frequency)
                .context("estimating age density")?;
            for profile in &profiles {
                println!(
                    "=== {} (n = {}, bins of {}) ===",
                    profile.brand, profile.sample_size, profile.bins_res
                );
                display::print_batch(&density_batch(&profile.points)?)?;
            }
            Ok(())
        }
        DatasetCommands::AgeGroups {
            start,
            end,
            bin_size,
            moving_average,
        } => {
            let end = end_or_latest(dataset, end)?;
            let index = DateIndex::new(&dataset.cases);
            let series = cases_by_age_group(&index, start, end, bin_size, moving_average)
                .context("grouping cases by age")?;
            display::print_batch(&series.to_record_batch()?)
        }
        DatasetCommands::Doses { percentage } => {
            let series =
                weekly_doses(&dataset.vaccination, percentage).context("summing weekly doses")?;
            display::print_batch(&series.to_record_batch()?)
        }
        DatasetCommands::Booster { command } => run_booster(command, dataset, policy),
    }
}

fn run_booster(
    command: BoosterCommands,
    dataset: &Dataset,
    policy: &Policy,
) -> anyhow::Result<()> {
    let pipeline = |metric: Metric| {
        BoosterPipeline::new(metric, dataset.linelist(metric), &dataset.boosters, policy)
    };

    match command {
        BoosterCommands::Summary { metric, start, end } => {
            let metric = Metric::from(metric);
            let end = end_or_latest(dataset, end)?;
            let rates = pipeline(metric)
                .summary(start, end)
                .with_context(|| format!("summarising {metric} by combination"))?;
            display::print_booster_summary(metric, start, end, &rates);
            Ok(())
        }
        BoosterCommands::Rates {
            metric,
            start,
            end,
            moving_average,
        } => {
            let metric = Metric::from(metric);
            let end = end_or_latest(dataset, end)?;
            let rates = pipeline(metric)
                .combo_rates(start, end, moving_average)
                .with_context(|| format!("computing {metric} rates by combination"))?;
            display::print_batch(&rates.rates.to_record_batch()?)
        }
        BoosterCommands::Eligibility { date: Some(date) } => {
            let Some(e) = eligibility(&dataset.vaccination, policy, date) else {
                bail!("{date} is outside the vaccination table");
            };
            display::print_eligibility(&e);
            Ok(())
        }
        BoosterCommands::Eligibility { date: None } => {
            let series = eligibility_series(&dataset.vaccination, policy)
                .context("computing booster eligibility")?;
            display::print_batch(&series.to_record_batch()?)
        }
        BoosterCommands::Combos => {
            let Some(matrix) = combination_matrix(&dataset.boosters) else {
                bail!("booster combination table is empty");
            };
            display::print_combo_matrix(&matrix);
            Ok(())
        }
    }
}
