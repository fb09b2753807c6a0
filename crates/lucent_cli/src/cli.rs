use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use lucent_renderer::{ImageFormat, ScheduleStrategy};

/// Log levels accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Ppm,
    Png,
}

impl From<Format> for ImageFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Ppm => ImageFormat::Ppm,
            Format::Png => ImageFormat::Png,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    Serial,
    ThreadQueue,
    Buckets,
}

impl From<Strategy> for ScheduleStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Serial => ScheduleStrategy::Serial,
            Strategy::ThreadQueue => ScheduleStrategy::ThreadQueue,
            Strategy::Buckets => ScheduleStrategy::Buckets,
        }
    }
}

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "lucent")]
#[command(about = "Renders every camera of a JSON scene with a Whitted-style ray tracer")]
pub struct Args {
    /// Scene description (JSON)
    pub scene: PathBuf,

    /// Render configuration (JSON); defaults enable everything
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory the images are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Worker threads (0 = one per core)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Override the scheduling strategy from the config
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Override the output format from the config
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,

    /// Set the logging level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["lucent", "scene.json"]).unwrap();
        assert_eq!(args.scene, PathBuf::from("scene.json"));
        assert_eq!(args.config, None);
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.threads, None);
        assert_eq!(args.log_level, LogLevel::Info);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "lucent",
            "scenes/cornell.json",
            "--config",
            "fast.json",
            "--output-dir",
            "out",
            "-j",
            "6",
            "--strategy",
            "thread-queue",
            "--format",
            "png",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("fast.json")));
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert_eq!(args.threads, Some(6));
        assert_eq!(args.strategy.map(ScheduleStrategy::from), Some(ScheduleStrategy::ThreadQueue));
        assert_eq!(args.format.map(ImageFormat::from), Some(ImageFormat::Png));
        assert_eq!(LevelFilter::from(args.log_level), LevelFilter::Debug);
    }

    #[test]
    fn test_scene_is_required() {
        assert!(Args::try_parse_from(["lucent"]).is_err());
    }
}
