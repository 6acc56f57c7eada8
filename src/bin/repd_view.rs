use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use repdscraper::{
    config::Config,
    history::AccumulatedStore,
    process::{self, Normalizer},
    schema::CanonicalRecord,
    view::{consent_trend, export_csv, Filter, FilterOptions, Summary},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter, summarise and export the accumulated REPD dataset.
#[derive(Debug, Parser)]
#[command(name = "repd_view")]
struct Args {
    /// Read this raw extract instead of the accumulated dataset.
    #[arg(long)]
    extract: Option<PathBuf>,

    /// Start from the dashboard defaults (solar PV, all regions, full ranges).
    #[arg(long)]
    defaults: bool,

    /// Technology type to keep; repeatable.
    #[arg(long = "tech")]
    technologies: Vec<String>,

    /// Region to keep; repeatable.
    #[arg(long = "region")]
    regions: Vec<String>,

    #[arg(long)]
    min_capacity: Option<f64>,
    #[arg(long)]
    max_capacity: Option<f64>,

    #[arg(long)]
    from_year: Option<i32>,
    #[arg(long)]
    to_year: Option<i32>,

    /// List the selectable values of each filter and exit.
    #[arg(long)]
    options: bool,

    /// Write the filtered rows to a timestamped CSV in the export directory.
    #[arg(long)]
    export: bool,
}

fn load_records(args: &Args, cfg: &Config) -> Result<Vec<CanonicalRecord>> {
    match &args.extract {
        Some(path) => {
            let table = process::load_extract(path, cfg.encoding)?;
            Ok(Normalizer::new(cfg.field_aliases()).normalize(&table).records)
        }
        None => Ok(AccumulatedStore::new(&cfg.accumulated_file).load()?),
    }
}

/// Combine CLI bounds with the current range, falling back to the data's
/// domain for a missing side. A lone bound over an empty domain spans itself.
fn range<T: PartialOrd + Copy>(
    lo: Option<T>,
    hi: Option<T>,
    domain: Option<(T, T)>,
    current: Option<(T, T)>,
) -> Option<(T, T)> {
    let base = current.or(domain);
    match (lo, hi) {
        (None, None) => current,
        (Some(l), Some(h)) => Some((l, h)),
        (Some(l), None) => Some((l, base.map_or(l, |(_, dhi)| dhi))),
        (None, Some(h)) => Some((base.map_or(h, |(dlo, _)| dlo), h)),
    }
}

fn build_filter(args: &Args, opts: &FilterOptions) -> Result<Filter> {
    let mut filter = if args.defaults {
        opts.default_filter()
    } else {
        Filter::default()
    };
    if !args.technologies.is_empty() {
        filter.technologies = Some(args.technologies.iter().cloned().collect());
    }
    if !args.regions.is_empty() {
        filter.regions = Some(args.regions.iter().cloned().collect());
    }
    filter.capacity = range(
        args.min_capacity,
        args.max_capacity,
        opts.capacity,
        filter.capacity,
    );
    filter.years = range(args.from_year, args.to_year, opts.years, filter.years);

    if let Some((lo, hi)) = filter.capacity {
        if lo > hi {
            bail!("capacity range {}..{} is empty", lo, hi);
        }
    }
    if let Some((lo, hi)) = filter.years {
        if lo > hi {
            bail!("year range {}..{} is empty", lo, hi);
        }
    }
    Ok(filter)
}

fn fmt_opt(v: Option<f64>, places: usize) -> String {
    v.map(|x| format!("{:.*}", places, x))
        .unwrap_or_else(|| "n/a".to_string())
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(env).with_writer(std::io::stderr).init();

    let args = Args::parse();
    let cfg = Config::load()?;
    let records = load_records(&args, &cfg).context("loading dataset")?;
    let opts = FilterOptions::from_records(&records);

    if args.options {
        println!("Technology types: {}", opts.technologies.join(", "));
        println!("Regions: {}", opts.regions.join(", "));
        match opts.capacity {
            Some((lo, hi)) => println!("Installed capacity (MW): {} .. {}", lo, hi),
            None => println!("Installed capacity (MW): n/a"),
        }
        match opts.years {
            Some((lo, hi)) => println!("Application year: {} .. {}", lo, hi),
            None => println!("Application year: n/a"),
        }
        return Ok(());
    }

    let filter = build_filter(&args, &opts)?;
    let rows = filter.apply(&records);
    info!(matched = rows.len(), of = records.len(), "filtered");

    let summary = Summary::of(&rows);
    println!("{} projects match your filters.", summary.count);
    println!(
        "Avg. consent time (days): {}",
        fmt_opt(summary.mean_consent_days, 1)
    );
    println!(
        "Median consent time (days): {}",
        fmt_opt(summary.median_consent_days, 1)
    );
    println!(
        "Max consent time (days): {}",
        fmt_opt(summary.max_consent_days.map(|d| d as f64), 0)
    );
    if summary.negative_consent > 0 {
        println!(
            "Warning: {} projects granted before submission (negative consent time)",
            summary.negative_consent
        );
    }

    let trend = consent_trend(&rows);
    if trend.is_empty() {
        println!("No data available for the selected filters.");
    } else {
        println!("\napplication_year,mean_consent_days");
        for (year, mean) in trend {
            println!("{},{:.1}", year, mean);
        }
    }

    if args.export {
        let path = export_csv(&rows, &cfg.export_dir, Local::now().naive_local())?;
        println!("\nExported {} rows to {}", rows.len(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_bounds_fill_from_domain() {
        assert_eq!(range(Some(10.0), None, Some((0.0, 50.0)), None), Some((10.0, 50.0)));
        assert_eq!(range(None, Some(2020), Some((2001, 2024)), None), Some((2001, 2020)));
        assert_eq!(range::<i32>(None, None, Some((1, 2)), None), None);
        assert_eq!(range(None, None, Some((1, 2)), Some((1, 1))), Some((1, 1)));
    }

    #[test]
    fn explicit_bounds_survive_empty_domain() {
        assert_eq!(range(Some(2022), Some(2020), None, None), Some((2022, 2020)));
        assert_eq!(range(Some(5.0), None, None, None), Some((5.0, 5.0)));
        assert_eq!(range(None, Some(7), None, None), Some((7, 7)));
    }

    #[test]
    fn cli_flags_override_defaults() {
        let args = Args::parse_from(["repd_view", "--defaults", "--tech", "Wind Onshore"]);
        let opts = FilterOptions {
            technologies: vec!["Solar Photovoltaics".into(), "Wind Onshore".into()],
            regions: vec!["Wales".into()],
            capacity: Some((0.0, 10.0)),
            years: Some((2010, 2020)),
        };
        let filter = build_filter(&args, &opts).unwrap();
        assert_eq!(filter.technologies, Some(["Wind Onshore".to_string()].into()));
        assert_eq!(filter.regions, Some(["Wales".to_string()].into()));
        assert_eq!(filter.years, Some((2010, 2020)));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let args = Args::parse_from(["repd_view", "--from-year", "2022", "--to-year", "2020"]);
        assert!(build_filter(&args, &FilterOptions::default()).is_err());

        let args = Args::parse_from(["repd_view", "--min-capacity", "50", "--max-capacity", "10"]);
        assert!(build_filter(&args, &FilterOptions::default()).is_err());
    }

    #[test]
    fn explicit_range_kept_without_any_data() {
        let args = Args::parse_from(["repd_view", "--from-year", "2015", "--to-year", "2020"]);
        let filter = build_filter(&args, &FilterOptions::default()).unwrap();
        assert_eq!(filter.years, Some((2015, 2020)));
        assert_eq!(filter.capacity, None);
    }
}
