use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::ARTISAN_VERSION;

#[derive(Parser, Debug)]
#[clap(version = ARTISAN_VERSION)]
pub struct Cli {
    /// Logging verbosity [OFF, ERROR, WARN, INFO, DEBUG, TRACE]
    #[arg(global = true, short, long, default_value_t = LevelFilter::Info)]
    pub verbosity: LevelFilter,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Document formats for ring snapshots
#[derive(clap::ValueEnum, Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the swift-ring-builder commands that apply a rule file to a ring
    ///
    /// Commands are printed one per line unless they are executed. When executed, the ring is
    /// rebalanced afterwards, or only written when nothing but metadata changed.
    Apply {
        /// Rule file describing the desired ring
        #[clap(short, long)]
        rule: PathBuf,

        /// Ring snapshot as produced by the parse command
        #[clap(short, long, required_unless_present = "builder")]
        input: Option<PathBuf>,

        /// Builder file of the ring; read when no snapshot is given
        #[clap(short, long)]
        builder: Option<PathBuf>,

        /// Only check whether the ring matches the rule file; exits with 1 if it does not
        #[clap(short, long, conflicts_with = "execute")]
        check: bool,

        /// Execute the generated commands against the builder file
        #[clap(short, long, requires = "builder")]
        execute: bool,

        /// Assume yes for every confirmation
        #[clap(short, long)]
        yes: bool,

        /// File to write the commands to instead of stdout
        #[clap(short, long, conflicts_with = "execute")]
        output: Option<PathBuf>,

        /// Do not rebalance or write the ring after executing the commands
        #[clap(long, requires = "execute")]
        no_rebalance: bool,
    },

    /// Bootstrap a rule file from an existing ring
    Convert {
        /// Ring snapshot as produced by the parse command
        #[clap(short, long, required_unless_present = "builder")]
        input: Option<PathBuf>,

        /// Builder file of the ring; read when no snapshot is given
        #[clap(short, long)]
        builder: Option<PathBuf>,

        /// Port shared by most nodes; nodes using another port declare it explicitly
        #[clap(long)]
        base_port: Option<u64>,

        /// Size in TB of a disk with weight 100
        #[clap(long)]
        base_size: Option<f64>,

        /// File to write the rule file to instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert the report of swift-ring-builder, or a builder file, into a ring snapshot
    Parse {
        /// File containing the report; read from stdin when omitted
        #[clap(index = 1, conflicts_with = "builder")]
        file: Option<PathBuf>,

        /// Builder file to decode instead of a report
        #[clap(short, long)]
        builder: Option<PathBuf>,

        /// Format of the snapshot
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,

        /// File to write the snapshot to instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Apply { .. } => "apply",
            Commands::Convert { .. } => "convert",
            Commands::Parse { .. } => "parse",
        }
    }
}

impl Display for Commands {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::parse_from([
            "swift-ring-artisan",
            "apply",
            "-r",
            "rules.yaml",
            "-b",
            "object.builder",
            "-e",
            "-y",
            "-v",
            "debug",
        ]);
        assert_eq!(cli.verbosity, LevelFilter::Debug);
        match cli.command {
            Commands::Apply {
                rule,
                input,
                builder,
                check,
                execute,
                yes,
                no_rebalance,
                ..
            } => {
                assert_eq!(rule, PathBuf::from("rules.yaml"));
                assert_eq!(input, None);
                assert_eq!(builder, Some(PathBuf::from("object.builder")));
                assert!(!check);
                assert!(execute);
                assert!(yes);
                assert!(!no_rebalance);
            }
            command => panic!("Unexpected command {command}"),
        }
    }

    #[test]
    fn test_parse_rejects_invalid_combinations() {
        // A ring source is required
        assert!(Cli::try_parse_from(["swift-ring-artisan", "apply", "-r", "rules.yaml"]).is_err());
        // Executing needs a builder file
        assert!(Cli::try_parse_from([
            "swift-ring-artisan",
            "apply",
            "-r",
            "rules.yaml",
            "-i",
            "ring.yaml",
            "-e"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["swift-ring-artisan", "parse", "report.txt", "-b", "x"]).is_err());
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::parse_from(["swift-ring-artisan", "parse"]);
        assert_eq!(cli.verbosity, LevelFilter::Info);
        assert_eq!(cli.command.name(), "parse");
        match cli.command {
            Commands::Parse { file, format, .. } => {
                assert_eq!(file, None);
                assert_eq!(format, OutputFormat::Yaml);
            }
            command => panic!("Unexpected command {command}"),
        }
    }
}
