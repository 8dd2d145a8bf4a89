//! Command-line interface handling for the Meridian world server.
//!
//! Every option here overrides the matching setting of the configuration
//! file; anything not given on the command line comes from the file.

use clap::{Arg, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the level description
    pub level_path: Option<PathBuf>,
    /// Optional override for the navigation grid
    pub navgrid_path: Option<PathBuf>,
    /// Optional override for the tick interval in milliseconds
    pub tick_interval_ms: Option<u64>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
}

impl CliArgs {
    /// Parses command line arguments using clap.
    ///
    /// Exits the process with a usage message when an argument is invalid,
    /// e.g. a tick interval that is not a number.
    pub fn parse() -> Self {
        Self::parse_from(std::env::args_os())
    }

    /// Parses the given argument list; the first item is the program name.
    pub fn parse_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::command().get_matches_from(args);

        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("config.toml")),
            level_path: matches.get_one::<String>("level").map(PathBuf::from),
            navgrid_path: matches.get_one::<String>("navgrid").map(PathBuf::from),
            tick_interval_ms: matches.get_one::<u64>("tick-interval").copied(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }

    fn command() -> Command {
        Command::new("Meridian World Server")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Authoritative world simulation: octree interest management, NPC combat, fixed-rate ticks")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("config.toml"),
            )
            .arg(
                Arg::new("level")
                    .long("level")
                    .value_name("FILE")
                    .help("Level description (JSON)"),
            )
            .arg(
                Arg::new("navgrid")
                    .long("navgrid")
                    .value_name("FILE")
                    .help("Navigation grid export (JSON)"),
            )
            .arg(
                Arg::new("tick-interval")
                    .short('t')
                    .long("tick-interval")
                    .value_name("MS")
                    .help("Simulation tick interval in milliseconds")
                    .value_parser(clap::value_parser!(u64)),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_arguments() {
        let args = CliArgs::parse_from(["meridian"]);
        assert_eq!(args.config_path, PathBuf::from("config.toml"));
        assert!(args.level_path.is_none());
        assert!(args.tick_interval_ms.is_none());
        assert!(!args.json_logs);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let args = CliArgs::parse_from([
            "meridian",
            "-c",
            "prod.toml",
            "--level",
            "levels/forest.json",
            "--navgrid",
            "levels/forest.nav.json",
            "-t",
            "50",
            "--log-level",
            "debug",
            "--json-logs",
        ]);
        assert_eq!(args.config_path, PathBuf::from("prod.toml"));
        assert_eq!(args.level_path, Some(PathBuf::from("levels/forest.json")));
        assert_eq!(args.navgrid_path, Some(PathBuf::from("levels/forest.nav.json")));
        assert_eq!(args.tick_interval_ms, Some(50));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
    }
}
