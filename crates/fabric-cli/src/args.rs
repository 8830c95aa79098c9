//! Command-line argument definitions for the Fabric CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the source units, the document to render,
//! where the output goes, and override parts of the loaded configuration.

use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for the Fabric document renderer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Fabric files, or directories scanned recursively for `*.fabric` files
    #[arg(required = true, help = "Input files or directories")]
    pub inputs: Vec<PathBuf>,

    /// Name of the document to render
    #[arg(short, long)]
    pub document: String,

    /// Output file; the rendered lines go to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Directory file-reading plugins resolve relative paths against
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Abort the render after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "fabric",
            "docs",
            "extra.fabric",
            "--document",
            "report",
            "-o",
            "out.md",
            "--base-dir",
            "data",
            "--timeout-ms",
            "500",
        ])
        .unwrap();

        assert_eq!(
            args.inputs,
            [PathBuf::from("docs"), PathBuf::from("extra.fabric")]
        );
        assert_eq!(args.document, "report");
        assert_eq!(args.output, Some(PathBuf::from("out.md")));
        assert_eq!(args.base_dir, Some(PathBuf::from("data")));
        assert_eq!(args.timeout_ms, Some(500));
        assert_eq!(args.log_level, "info");
        assert!(args.config.is_none());
    }

    #[test]
    fn test_document_is_required() {
        assert!(Args::try_parse_from(["fabric", "docs"]).is_err());
    }

    #[test]
    fn test_inputs_are_required() {
        assert!(Args::try_parse_from(["fabric", "--document", "report"]).is_err());
    }
}
