use std::{
    env,
    ffi::OsString,
    path::PathBuf,
    process::Command,
    sync::Arc,
};

use clap::{Parser, ValueEnum};
use colored::Colorize;
use framegrab::{
    Collaborators, DEFAULT_MIN_WIDTH, FfmpegLogLevel, ProgressCallback, ProgressInfo, RunConfig,
    RunPlan, ShardWorker, TimestampUnit,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record};

const CLI_AFTER_HELP: &str = "Examples:\n  framegrab --cameras-dir RealEstate10K --videos-dir frames --mode test --ntasks 4\n  framegrab --cameras-dir RealEstate10K --videos-dir frames --shard-index 2 --progress";

#[derive(Debug, Parser)]
#[command(
    name = "framegrab",
    version,
    about = "Download source videos and extract the frames listed in camera metadata files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Metadata root; files are read from <CAMERAS_DIR>/<MODE>/*.txt.
    #[arg(long)]
    cameras_dir: PathBuf,

    /// Output root; frames are written to <VIDEOS_DIR>/<MODE>/<sequence>/.
    #[arg(long)]
    videos_dir: PathBuf,

    /// Dataset split (train, test).
    #[arg(long, default_value = "train")]
    mode: String,

    /// Number of shards.
    #[arg(long, default_value_t = 8, value_parser = positive_count)]
    ntasks: usize,

    /// Worker threads for sources with several sequences.
    #[arg(long, default_value_t = 8, value_parser = positive_count)]
    cpus_per_task: usize,

    /// Accepted for compatibility; shards always run one after another.
    #[arg(long)]
    parallel: bool,

    /// Run only this shard, in this process.
    #[arg(long)]
    shard_index: Option<usize>,

    /// Unit of the timestamps in metadata files.
    #[arg(long, value_enum, default_value_t = UnitArg::Millis)]
    timestamp_unit: UnitArg,

    /// Images are halved only while half their width stays at or above this.
    #[arg(long, default_value_t = DEFAULT_MIN_WIDTH)]
    min_width: u32,

    /// Directory for failed_videos_<mode>_<shard>.txt.
    #[arg(long, default_value = ".")]
    failure_log_dir: PathBuf,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<FfmpegLogLevel>,

    /// Show debug logging.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar per shard.
    #[arg(long)]
    progress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum UnitArg {
    Millis,
    Micros,
}

impl From<UnitArg> for TimestampUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Millis => TimestampUnit::Milliseconds,
            UnitArg::Micros => TimestampUnit::Microseconds,
        }
    }
}

fn positive_count(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(count) => Ok(count),
        Err(error) => Err(error.to_string()),
    }
}

impl Cli {
    /// Arguments for the child process running shard `shard_index`.
    fn child_arguments(&self, shard_index: usize) -> Vec<OsString> {
        let mut arguments: Vec<OsString> = vec![
            "--cameras-dir".into(),
            self.cameras_dir.clone().into(),
            "--videos-dir".into(),
            self.videos_dir.clone().into(),
            "--mode".into(),
            self.mode.clone().into(),
            "--ntasks".into(),
            self.ntasks.to_string().into(),
            "--cpus-per-task".into(),
            self.cpus_per_task.to_string().into(),
            "--timestamp-unit".into(),
            unit_name(self.timestamp_unit).into(),
            "--min-width".into(),
            self.min_width.to_string().into(),
            "--failure-log-dir".into(),
            self.failure_log_dir.clone().into(),
        ];
        if let Some(level) = self.log_level {
            arguments.push("--log-level".into());
            arguments.push(level.name().into());
        }
        if self.verbose {
            arguments.push("--verbose".into());
        }
        if self.progress {
            arguments.push("--progress".into());
        }
        arguments.push("--shard-index".into());
        arguments.push(shard_index.to_string().into());
        arguments
    }

    fn run_config(&self) -> RunConfig {
        RunConfig::new(&self.videos_dir, self.mode.as_str())
            .with_workers(self.cpus_per_task)
            .with_min_width(self.min_width)
            .with_timestamp_unit(self.timestamp_unit.into())
            .with_failure_log_dir(self.failure_log_dir.clone())
    }
}

fn unit_name(unit: UnitArg) -> &'static str {
    match unit {
        UnitArg::Millis => "millis",
        UnitArg::Micros => "micros",
    }
}

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let label = match record.level() {
            Level::Error => "error:".red().bold(),
            Level::Warn => "warning:".yellow().bold(),
            Level::Info => "info:".cyan().bold(),
            Level::Debug | Level::Trace => "debug:".dimmed(),
        };
        eprintln!("{label} {}", record.args());
    }

    fn flush(&self) {}
}

fn install_logger(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });
    }
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(shard_index: usize) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{prefix} {spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        bar.set_prefix(format!("shard {shard_index}"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_length(info.total);
        self.bar.set_position(info.current);
        if let Some(source) = &info.source {
            self.bar.set_message(source.clone());
        }
    }
}

fn run_shard(cli: &Cli, shard_index: usize) -> Result<(), Box<dyn std::error::Error>> {
    let shard = RunPlan::load(&cli.cameras_dir, &cli.mode, cli.ntasks)?.into_shard(shard_index)?;

    let mut config = cli.run_config();
    let progress = if cli.progress {
        let progress = Arc::new(TerminalProgress::new(shard_index)?);
        config = config.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    let collaborators = Collaborators::system()?;
    let worker = ShardWorker::new(&collaborators, &config, shard_index)?;
    let report = worker.run(&shard)?;

    if let Some(progress) = progress {
        progress.bar.finish_and_clear();
    }

    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "shard {shard_index}: {} of {} sources done, {} frames extracted, {} downsampled",
            report.completed_groups,
            shard.len(),
            report.frames.extracted,
            report.frames.downsampled
        )
        .green()
    );
    if !report.failed_sequences.is_empty() {
        println!(
            "{} {} sequence(s) listed in {}",
            "failed:".yellow().bold(),
            report.failed_sequences.len(),
            config.failure_log_path(shard_index).display()
        );
    }
    Ok(())
}

fn run_all_shards(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let plan = RunPlan::load(&cli.cameras_dir, &cli.mode, cli.ntasks)?;
    log::info!(
        "{} sequences from {} sources in {} shards",
        plan.sequence_count,
        plan.group_count,
        plan.shards.len()
    );

    let executable = env::current_exe()?;
    let mut failed_shards = Vec::new();
    for shard_index in 0..cli.ntasks {
        log::info!("Starting shard {}/{}", shard_index + 1, cli.ntasks);
        let status = Command::new(&executable)
            .args(cli.child_arguments(shard_index))
            .status()?;
        if !status.success() {
            log::error!("Shard {shard_index} exited with {status}");
            failed_shards.push(shard_index.to_string());
        }
    }

    if !failed_shards.is_empty() {
        return Err(format!("shard(s) {} failed", failed_shards.join(", ")).into());
    }
    println!(
        "{} {}",
        "success:".green().bold(),
        format!("all {} shards finished", cli.ntasks).green()
    );
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    install_logger(cli.verbose);

    if let Some(level) = cli.log_level {
        framegrab::set_ffmpeg_log_level(level);
    }
    if cli.parallel {
        log::warn!("--parallel has no effect; shards run one after another");
    }

    match cli.shard_index {
        Some(shard_index) => run_shard(&cli, shard_index),
        None => run_all_shards(&cli),
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
