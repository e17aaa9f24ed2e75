use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use stseg_lib::{
    analyzer::{Analyzer, AnalyzerConfig},
    classifier::NearestCentroid,
    detectors::peaks::find_peaks,
    io::{text as text_io, wfdb as wfdb_io},
    metrics::st::{classify_abnormal, extract_st, sustained_abnormality},
    preprocess::{bandpass_filter, min_max_normalize, BandpassConfig},
    segment::{segment_beats, stratified_split, LabeledWindows, SplitRatios},
    signal::{Events, TimeSeries, Window},
    smoothing,
};
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "stseg",
    version,
    about = "ST-segment abnormality analysis for single-lead ECG recordings"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the signal comes from: newline-delimited samples (stdin or file)
/// or a WFDB header/data pair.
#[derive(Args)]
struct SignalInput {
    /// Sampling rate for text input (WFDB records carry their own)
    #[arg(long, default_value_t = 360.0)]
    fs: f64,
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    wfdb_header: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    wfdb_lead: usize,
}

#[derive(Args)]
struct AnalyzerFlags {
    /// TOML file with analyzer settings; overrides the flags below
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 0.2)]
    elevation_thresh: f64,
    #[arg(long, default_value_t = -0.1)]
    depression_thresh: f64,
    #[arg(long, default_value_t = 8)]
    persistence_threshold: usize,
    #[arg(long, default_value_t = 0.08)]
    st_duration_fraction: f64,
    #[arg(long, default_value_t = 0.5)]
    min_peak_distance_fraction: f64,
    #[arg(long, default_value_t = 360)]
    chunk_length: usize,
    #[arg(long, default_value_t = 5)]
    smooth_window: usize,
    #[arg(long, default_value_t = 2)]
    smooth_poly_order: usize,
}

impl AnalyzerFlags {
    fn resolve(&self) -> Result<AnalyzerConfig> {
        if let Some(path) = &self.config {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            return toml::from_str(&text)
                .with_context(|| format!("bad analyzer config {}", path.display()));
        }
        Ok(AnalyzerConfig {
            elevation_thresh: self.elevation_thresh,
            depression_thresh: self.depression_thresh,
            persistence_threshold: self.persistence_threshold,
            st_duration_fraction: self.st_duration_fraction,
            min_peak_distance_fraction: self.min_peak_distance_fraction,
            chunk_length: self.chunk_length,
            smooth_window: self.smooth_window,
            smooth_poly_order: self.smooth_poly_order,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Full analysis: chunk classification plus the sustained-ST verdict
    Analyze {
        #[command(flatten)]
        signal: SignalInput,
        #[command(flatten)]
        flags: AnalyzerFlags,
        /// CSV of per-class centroid waveforms, one row per class
        #[arg(long)]
        centroids: PathBuf,
        /// Feed the signal in as-is instead of min-max normalizing it
        #[arg(long, default_value_t = false)]
        raw: bool,
        /// Bandpass-filter (0.5-50 Hz) before normalizing
        #[arg(long, default_value_t = false)]
        bandpass: bool,
    },
    /// Detect R-peaks and print their sample indices
    FindPeaks {
        #[command(flatten)]
        signal: SignalInput,
        #[arg(long, default_value_t = 0.5)]
        min_peak_distance_fraction: f64,
    },
    /// Per-beat ST values, smoothed series, abnormality flags, and verdict
    StSeries {
        #[command(flatten)]
        signal: SignalInput,
        #[command(flatten)]
        flags: AnalyzerFlags,
    },
    /// Cut labeled beat windows from an annotated record into a CSV
    Segment {
        #[command(flatten)]
        signal: SignalInput,
        /// Beat annotations: WFDB .atr or text `<index> <symbol>` lines
        #[arg(long)]
        annotations: PathBuf,
        /// Samples on each side of the beat (window is twice this)
        #[arg(long, default_value_t = 360)]
        half_width: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Stratified train/val/test partition of a segment CSV
    SplitDataset {
        #[arg(long)]
        segments: PathBuf,
        #[arg(long, default_value_t = 0.3)]
        test_size: f64,
        #[arg(long, default_value_t = 0.5)]
        val_size: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            signal,
            flags,
            centroids,
            raw,
            bandpass,
        } => cmd_analyze(&signal, &flags, &centroids, raw, bandpass)?,
        Commands::FindPeaks {
            signal,
            min_peak_distance_fraction,
        } => cmd_find_peaks(&signal, min_peak_distance_fraction)?,
        Commands::StSeries { signal, flags } => cmd_st_series(&signal, &flags)?,
        Commands::Segment {
            signal,
            annotations,
            half_width,
            out,
        } => cmd_segment(&signal, &annotations, half_width, &out)?,
        Commands::SplitDataset {
            segments,
            test_size,
            val_size,
            seed,
            out_dir,
        } => cmd_split_dataset(&segments, test_size, val_size, seed, &out_dir)?,
    }
    Ok(())
}

fn load_time_series(input: &SignalInput) -> Result<TimeSeries> {
    if let Some(header) = &input.wfdb_header {
        return wfdb_io::load_lead(header, input.wfdb_lead);
    }
    let data = match &input.input {
        Some(path) => text_io::read_samples(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_samples(&buf)?
        }
    };
    Ok(TimeSeries { fs: input.fs, data })
}

fn cmd_analyze(
    signal: &SignalInput,
    flags: &AnalyzerFlags,
    centroids: &Path,
    raw: bool,
    bandpass: bool,
) -> Result<()> {
    let mut ts = load_time_series(signal)?;
    if bandpass {
        ts = bandpass_filter(&ts, &BandpassConfig::default());
    }
    if !raw {
        ts = min_max_normalize(&ts);
    }
    let classifier = NearestCentroid::from_csv_path(centroids)?;
    let analyzer = Analyzer::new(classifier, flags.resolve()?)?;
    let result = analyzer.analyze(&ts)?;
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

fn cmd_find_peaks(signal: &SignalInput, min_peak_distance_fraction: f64) -> Result<()> {
    let ts = load_time_series(signal)?;
    let min_distance = (min_peak_distance_fraction * ts.fs).round().max(1.0) as usize;
    let events = find_peaks(&ts, min_distance);
    println!("{}", serde_json::to_string(&events)?);
    Ok(())
}

#[derive(Serialize)]
struct StReport {
    beat_indices: Vec<usize>,
    values: Vec<f64>,
    smoothed: Vec<f64>,
    flags: Vec<bool>,
    sustained_st_abnormality: bool,
}

fn cmd_st_series(signal: &SignalInput, flags: &AnalyzerFlags) -> Result<()> {
    let ts = load_time_series(signal)?;
    let cfg = flags.resolve()?;
    cfg.validate()?;
    let min_distance = (cfg.min_peak_distance_fraction * ts.fs).round().max(1.0) as usize;
    let events = find_peaks(&ts, min_distance);
    let st = extract_st(&ts, &events, cfg.st_duration_fraction);
    let (smoothed, abnormal, sustained) = if st.len() >= cfg.smooth_window {
        let smoothed = smoothing::savgol_smooth(&st.values, cfg.smooth_window, cfg.smooth_poly_order)?;
        let abnormal = classify_abnormal(&smoothed, cfg.elevation_thresh, cfg.depression_thresh);
        let sustained = sustained_abnormality(&abnormal, cfg.persistence_threshold);
        (smoothed, abnormal, sustained)
    } else {
        (Vec::new(), Vec::new(), false)
    };
    let report = StReport {
        beat_indices: st.beat_indices,
        values: st.values,
        smoothed,
        flags: abnormal,
        sustained_st_abnormality: sustained,
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn cmd_segment(
    signal: &SignalInput,
    annotations: &Path,
    half_width: usize,
    out: &Path,
) -> Result<()> {
    let ts = load_time_series(signal)?;
    let (events, symbols) = load_annotations(annotations)?;
    let set = segment_beats(&ts, &events, &symbols, half_width);
    if set.is_empty() {
        anyhow::bail!("no beat fits a window of half-width {}", half_width);
    }
    write_segments_csv(out, &set)?;
    println!(
        "{}",
        serde_json::json!({
            "windows": set.len(),
            "window_length": 2 * half_width,
            "out": out,
        })
    );
    Ok(())
}

fn cmd_split_dataset(
    segments: &Path,
    test_size: f64,
    val_size: f64,
    seed: u64,
    out_dir: &Path,
) -> Result<()> {
    let set = read_segments_csv(segments)?;
    let split = stratified_split(
        &set,
        SplitRatios {
            test_size,
            val_size,
        },
        seed,
    )?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    for (name, part) in [
        ("train.csv", &split.train),
        ("val.csv", &split.val),
        ("test.csv", &split.test),
    ] {
        write_segments_csv(&out_dir.join(name), part)?;
    }
    println!(
        "{}",
        serde_json::json!({
            "train": split.train.len(),
            "val": split.val.len(),
            "test": split.test.len(),
        })
    );
    Ok(())
}

fn load_annotations(path: &Path) -> Result<(Events, Vec<char>)> {
    let is_atr = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("atr"))
        .unwrap_or(false);
    if is_atr {
        wfdb_io::load_beat_annotations(path)
    } else {
        text_io::read_beat_annotations(path)
    }
}

/// One window per row: label symbol first, then the samples.
fn write_segments_csv(path: &Path, set: &LabeledWindows) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for (window, &label) in set.windows.iter().zip(&set.labels) {
        let mut row = vec![label.to_string()];
        row.extend(window.samples.iter().map(|v| v.to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_segments_csv(path: &Path) -> Result<LabeledWindows> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut set = LabeledWindows::default();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("bad segment row {}", row + 1))?;
        let mut fields = record.iter();
        let label = fields
            .next()
            .and_then(|s| s.chars().next())
            .with_context(|| format!("row {} has no label", row + 1))?;
        let samples: Vec<f64> = fields
            .map(|field| {
                field
                    .parse::<f64>()
                    .with_context(|| format!("row {}: '{}' is not f64", row + 1, field))
            })
            .collect::<Result<_>>()?;
        set.labels.push(label);
        set.windows.push(Window { start: 0, samples });
    }
    if set.is_empty() {
        anyhow::bail!("segment file {} is empty", path.display());
    }
    Ok(set)
}
