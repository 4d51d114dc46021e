use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// Log target prefix of every module in this crate
pub const CRATE_TARGET: &str = "reddit_digest";

pub struct LogConfig {
    /// Console level for this crate; dependencies stay at warn or quieter
    pub level: LevelFilter,
    /// Directory for the per-run log file, none for console only
    pub log_dir: Option<PathBuf>,
}

/// One file per run date: `<dir>/reddit-digest-YYYY-MM-DD.log`
pub fn run_log_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("reddit-digest-{}.log", date.format("%Y-%m-%d")))
}

/// Crate name of a foreign target, none for our own modules.
fn origin(target: &str) -> Option<&str> {
    let krate = target.split("::").next().unwrap_or(target);
    (krate != CRATE_TARGET).then_some(krate)
}

/// clap value parser for `--log-level`.
pub fn parse_level(level: &str) -> Result<LevelFilter, String> {
    level
        .parse()
        .map_err(|_| format!("unknown log level `{}` (off, error, warn, info, debug, trace)", level))
}

/// Install the global logger. Returns the log file path when one was opened.
pub fn init(config: &LogConfig, date: NaiveDate) -> Result<Option<PathBuf>> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::BrightBlack);

    let console = fern::Dispatch::new()
        .format(move |out, message, record| {
            let time = Local::now().format("%H:%M:%S");
            let level = colors.color(record.level());
            match origin(record.target()) {
                Some(krate) => out.finish(format_args!("{} {} ({}) {}", time, level, krate, message)),
                None => out.finish(format_args!("{} {} {}", time, level, message)),
            }
        })
        .level(config.level.min(LevelFilter::Warn))
        .level_for(CRATE_TARGET, config.level)
        .chain(io::stdout());

    let mut dispatch = fern::Dispatch::new().chain(console);

    let path = match &config.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let path = run_log_path(dir, date);
            let file = fern::log_file(&path).with_context(|| format!("Failed to open log file {}", path.display()))?;

            dispatch = dispatch.chain(
                fern::Dispatch::new()
                    .format(|out, message, record| {
                        out.finish(format_args!(
                            "{} {:<5} {} {}",
                            Local::now().to_rfc3339(),
                            record.level(),
                            record.target(),
                            message
                        ))
                    })
                    .level(LevelFilter::Info)
                    .level_for(CRATE_TARGET, LevelFilter::Debug)
                    .chain(file),
            );
            Some(path)
        }
        None => None,
    };

    dispatch.apply()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_path_is_dated() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(
            run_log_path(Path::new("logs"), date),
            PathBuf::from("logs/reddit-digest-2026-10-16.log")
        );
    }

    #[test]
    fn test_origin_tags_foreign_targets_only() {
        assert_eq!(origin("reddit_digest"), None);
        assert_eq!(origin("reddit_digest::pipeline"), None);
        assert_eq!(origin("reqwest::connect"), Some("reqwest"));
        assert_eq!(origin("hyper"), Some("hyper"));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Ok(LevelFilter::Debug));
        assert_eq!(parse_level("off"), Ok(LevelFilter::Off));
        assert!(parse_level("loud").unwrap_err().contains("loud"));
    }
}
