//! CLI surface (spec.md §6: "specified only because tests exercise it").
//! Parsed with `clap`'s derive API rather than hand-rolled `std::env::args`
//! scanning, matching the pack's other binaries.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sof", about = "Run SOF programs.", disable_version_flag = true)]
pub struct Cli {
    /// Print version information and exit.
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Enable debug logging (tracing at DEBUG level) to stderr.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Run only the preprocessor and print the cleaned source.
    #[arg(short = 'p', long = "preprocess-only")]
    pub preprocess_only: bool,

    /// Skip the preprocessing pass entirely.
    #[arg(short = 'P', long = "skip-preprocess")]
    pub skip_preprocess: bool,

    /// Run an inline program instead of (or in addition to) file arguments.
    #[arg(short = 'c', long = "command")]
    pub command: Option<String>,

    /// Source files to run, in order.
    pub files: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_command_and_debug_flag() {
        let cli = Cli::parse_from(["sof", "-d", "-c", "1 2 +"]);
        assert!(cli.debug);
        assert_eq!(cli.command.as_deref(), Some("1 2 +"));
        assert!(cli.files.is_empty());
    }

    #[test]
    fn parses_file_list() {
        let cli = Cli::parse_from(["sof", "a.sof", "b.sof"]);
        assert_eq!(cli.files, vec![PathBuf::from("a.sof"), PathBuf::from("b.sof")]);
    }

    #[test]
    fn preprocess_flags_are_mutually_informative_not_enforced() {
        let cli = Cli::parse_from(["sof", "-p", "-P", "x.sof"]);
        assert!(cli.preprocess_only);
        assert!(cli.skip_preprocess);
    }
}
