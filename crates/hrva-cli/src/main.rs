use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hrva_lib::{
    config::HrvConfig,
    detectors::{clean_rr_intervals, CleaningReport, EctopicRule},
    io::{csv as csv_io, text as text_io},
    metrics::{
        band_powers, extract_features, hrv_geometric, hrv_nonlinear, hrv_time, power_spectrum,
        FeatureGroup, FeatureMap, HrvFrequency, SampleQuality,
    },
    signal::RRSeries,
    HrvError,
};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "hrva",
    version,
    about = "HRVA: RR-interval cleaning and heart rate variability features"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the intervals come from and how to analyse them.
#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Interval file in ms (stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Read intervals from this CSV column instead of one value per line
    #[arg(long)]
    csv_column: Option<String>,
    /// TOML configuration; defaults apply to every missing field
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Range + ectopic filtering with interpolation of rejected beats
    Clean {
        #[command(flatten)]
        io: InputArgs,
        /// Ectopic rule (malik, kamath, karlsson, acar, custom)
        #[arg(long)]
        method: Option<String>,
    },
    /// Time-domain HRV of NN intervals
    HrvTime {
        #[command(flatten)]
        io: InputArgs,
    },
    /// Frequency-domain HRV (Welch or Lomb-Scargle PSD)
    HrvPsd {
        #[command(flatten)]
        io: InputArgs,
        /// Also print the (frequency, power) pairs
        #[arg(long)]
        points: bool,
    },
    /// Histogram features (triangular index, TINN)
    HrvGeometric {
        #[command(flatten)]
        io: InputArgs,
    },
    /// Nonlinear HRV metrics (Poincaré, SampEn, DFA)
    HrvNonlinear {
        #[command(flatten)]
        io: InputArgs,
    },
    /// Every feature group in one flat map
    Features {
        #[command(flatten)]
        io: InputArgs,
        /// Clean the raw intervals before extracting features
        #[arg(long)]
        clean: bool,
        /// Ectopic rule used with --clean
        #[arg(long)]
        method: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Clean { io, method } => cmd_clean(&io, method.as_deref())?,
        Commands::HrvTime { io } => cmd_hrv_time(&io)?,
        Commands::HrvPsd { io, points } => cmd_hrv_psd(&io, points)?,
        Commands::HrvGeometric { io } => cmd_hrv_geometric(&io)?,
        Commands::HrvNonlinear { io } => cmd_hrv_nonlinear(&io)?,
        Commands::Features { io, clean, method } => cmd_features(&io, clean, method.as_deref())?,
    }
    Ok(())
}

fn read_samples(input: Option<&Path>, csv_column: Option<&str>) -> Result<Vec<f64>> {
    match (input, csv_column) {
        (Some(path), Some(column)) => csv_io::read_rr_column(path, column),
        (Some(path), None) => text_io::read_rr_series(path),
        (None, Some(column)) => csv_io::parse_rr_column(io::stdin().lock(), column),
        (None, None) => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_rr_series(&buf)
        }
    }
}

fn load_config(args: &InputArgs, method: Option<&str>) -> Result<HrvConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            log::info!("loading configuration from {}", path.display());
            HrvConfig::load(path)?
        }
        None => HrvConfig::default(),
    };
    if let Some(name) = method {
        cfg.filter.ectopic = name
            .parse::<EctopicRule>()
            .with_context(|| format!("invalid --method '{name}'"))?;
    }
    Ok(cfg)
}

fn rr_series_from_input(args: &InputArgs) -> Result<RRSeries> {
    let rr = read_samples(args.input.as_deref(), args.csv_column.as_deref())?;
    Ok(RRSeries::new(rr))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[derive(Serialize)]
struct CleanOutput<'a> {
    #[serde(flatten)]
    report: &'a CleaningReport,
    quality: SampleQuality,
}

fn cmd_clean(args: &InputArgs, method: Option<&str>) -> Result<()> {
    let cfg = load_config(args, method)?;
    let raw = read_samples(args.input.as_deref(), args.csv_column.as_deref())?;
    let report = clean_rr_intervals(&raw, &cfg.filter)?;
    let quality = SampleQuality::assess(&report, &cfg.quality);
    print_json(&CleanOutput {
        report: &report,
        quality,
    })
}

fn cmd_hrv_time(args: &InputArgs) -> Result<()> {
    let rr = rr_series_from_input(args)?;
    print_json(&hrv_time(&rr)?)
}

#[derive(Serialize)]
struct PsdOutput {
    #[serde(flatten)]
    bands: HrvFrequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    points: Option<Vec<[f64; 2]>>,
}

fn cmd_hrv_psd(args: &InputArgs, points: bool) -> Result<()> {
    let cfg = load_config(args, None)?;
    let rr = rr_series_from_input(args)?;
    let frequency = &cfg.features.frequency;
    let psd = power_spectrum(&rr, frequency)?;
    print_json(&PsdOutput {
        bands: band_powers(&psd, frequency),
        points: points.then(|| psd.points()),
    })
}

fn cmd_hrv_geometric(args: &InputArgs) -> Result<()> {
    let cfg = load_config(args, None)?;
    let rr = rr_series_from_input(args)?;
    print_json(&hrv_geometric(&rr, &cfg.features.geometric)?)
}

fn cmd_hrv_nonlinear(args: &InputArgs) -> Result<()> {
    let cfg = load_config(args, None)?;
    let rr = rr_series_from_input(args)?;
    print_json(&hrv_nonlinear(&rr, &cfg.features.nonlinear)?)
}

#[derive(Serialize)]
struct FeaturesOutput {
    features: FeatureMap,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    failures: BTreeMap<FeatureGroup, HrvError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<SampleQuality>,
}

fn cmd_features(args: &InputArgs, clean: bool, method: Option<&str>) -> Result<()> {
    let cfg = load_config(args, method)?;
    let raw = read_samples(args.input.as_deref(), args.csv_column.as_deref())?;
    let (nn, quality) = if clean {
        let report = clean_rr_intervals(&raw, &cfg.filter)?;
        let quality = SampleQuality::assess(&report, &cfg.quality);
        (report.nn, Some(quality))
    } else {
        (RRSeries::new(raw), None)
    };
    let report = extract_features(&nn, &cfg.features);
    print_json(&FeaturesOutput {
        features: report.features,
        failures: report.failures,
        quality,
    })
}
