//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;
use clap::error::ErrorKind;

use crate::config::DEFAULT_OUTPUT;

const USAGE: &str = "\
Usage: termrec [-o <path>]

Record an interactive shell session with timing information.

Options:
  -o, --output-to <path>  Write the recording to <path> [default: terminal.record]
  -h, --help              Print this help and exit
";

/// Parsed command line.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "termrec",
    about = "Record an interactive shell session with timing information",
    disable_version_flag = true,
    override_usage = "termrec [-o <path>]"
)]
pub struct Cli {
    /// Write the recording to this path.
    #[arg(
        short = 'o',
        long = "output-to",
        value_name = "path",
        default_value = DEFAULT_OUTPUT
    )]
    pub output: PathBuf,
}

/// What the binary should do after parsing.
#[derive(Debug)]
pub enum Command {
    /// Record to the given output.
    Record(Cli),
    /// Print usage to standard error and exit 1.
    Help,
}

impl Cli {
    /// Parse `args`, which include the program name.
    ///
    /// Help requests are returned as [`Command::Help`]; other parse failures
    /// are returned as clap errors.
    pub fn parse_command<I, T>(args: I) -> Result<Command, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) => Ok(Command::Record(cli)),
            Err(e) if e.kind() == ErrorKind::DisplayHelp => Ok(Command::Help),
            Err(e) => Err(e),
        }
    }

    /// Usage text shown for `-h`.
    #[must_use]
    pub const fn usage() -> &'static str {
        USAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(args: &[&str]) -> Cli {
        match Cli::parse_command(args).unwrap() {
            Command::Record(cli) => cli,
            Command::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn default_output() {
        assert_eq!(record(&["termrec"]).output, PathBuf::from("terminal.record"));
    }

    #[test]
    fn short_and_long_output() {
        assert_eq!(record(&["termrec", "-o", "a.rec"]).output, PathBuf::from("a.rec"));
        assert_eq!(
            record(&["termrec", "--output-to", "b.rec"]).output,
            PathBuf::from("b.rec")
        );
        assert_eq!(
            record(&["termrec", "--output-to=c.rec"]).output,
            PathBuf::from("c.rec")
        );
    }

    #[test]
    fn help_is_reported() {
        assert!(matches!(Cli::parse_command(["termrec", "-h"]), Ok(Command::Help)));
        assert!(matches!(Cli::parse_command(["termrec", "--help"]), Ok(Command::Help)));
        assert!(Cli::usage().contains("--output-to"));
    }

    #[test]
    fn unknown_flags_rejected() {
        let err = Cli::parse_command(["termrec", "--verbose"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);

        assert!(Cli::parse_command(["termrec", "-o"]).is_err());
        assert!(Cli::parse_command(["termrec", "extra"]).is_err());
        assert!(Cli::parse_command(["termrec", "-V"]).is_err());
    }
}
