// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use quizcut_core::types::{BackendKind, ImageFormatKind, PaperSize};

#[derive(Debug, Parser)]
#[command(
    name = "quizcut",
    version,
    about = "Split scanned exam pages into one image per question, and bind questions into a practice book"
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Segment page images into per-question crops.
    Split(SplitArgs),
    /// Lay question images out on paper-sized pages and write a PDF.
    Book(BookArgs),
    /// Print the default configuration as JSON, or write it to a file.
    Config {
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Page images, or directories of page images (taken in file-name order).
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory receiving the question images.
    #[arg(short, long)]
    pub out: PathBuf,

    /// File name prefix for exported questions.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Page number assigned to the first input page.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub first_page: u32,

    /// Recognition backend: ocrs, tesseract or disabled. Omit to pick the best available.
    #[arg(long, value_parser = parse_backend)]
    pub backend: Option<BackendKind>,

    /// Recognition language (Tesseract code, e.g. chi_sim, eng).
    #[arg(long)]
    pub lang: Option<String>,

    /// Directory holding the ocrs model files.
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Pages processed at once (0 = all cores).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Per-page recognition timeout in seconds (0 disables the limit).
    #[arg(long)]
    pub ocr_timeout: Option<u64>,

    /// Output image format: jpeg or png.
    #[arg(long, value_parser = parse_format)]
    pub format: Option<ImageFormatKind>,

    /// JSON configuration file; flags override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Do not write manifest.json into the output directory.
    #[arg(long)]
    pub no_manifest: bool,
}

#[derive(Debug, Args)]
pub struct BookArgs {
    /// Directory of question images (taken in file-name order).
    pub input_dir: PathBuf,

    /// PDF file to write.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Paper size: a4, a3, a5, letter, legal, tabloid, or WIDTHxHEIGHT in mm.
    #[arg(long, value_parser = parse_paper)]
    pub paper: Option<PaperSize>,

    /// Page density in dots per inch.
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Questions stacked on each page.
    #[arg(long)]
    pub per_page: Option<usize>,

    /// Horizontal shift of each stack from the page centre, in pixels.
    #[arg(long)]
    pub offset_x: Option<u32>,

    /// Distance of each stack from the top edge, in pixels.
    #[arg(long)]
    pub offset_y: Option<u32>,

    /// PDF title.
    #[arg(long)]
    pub title: Option<String>,

    /// JSON configuration file; flags override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn parse_backend(s: &str) -> Result<BackendKind, String> {
    s.parse().map_err(|err: quizcut_core::QuizcutError| err.to_string())
}

fn parse_format(s: &str) -> Result<ImageFormatKind, String> {
    s.parse().map_err(|err: quizcut_core::QuizcutError| err.to_string())
}

fn parse_paper(s: &str) -> Result<PaperSize, String> {
    s.parse().map_err(|err: quizcut_core::QuizcutError| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn split_flags_parse() {
        let cli = Cli::parse_from([
            "quizcut", "-v", "split", "scans/", "extra.png", "--out", "q", "--backend", "none",
            "--format", "png", "--first-page", "5", "--no-manifest",
        ]);
        assert_eq!(cli.verbose, 1);
        let Command::Split(args) = cli.command else {
            panic!("expected split");
        };
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.backend, Some(BackendKind::Disabled));
        assert_eq!(args.format, Some(ImageFormatKind::Png));
        assert_eq!(args.first_page, 5);
        assert!(args.no_manifest);
    }

    #[test]
    fn page_zero_is_rejected() {
        assert!(
            Cli::try_parse_from(["quizcut", "split", "a.png", "--out", "q", "--first-page", "0"])
                .is_err()
        );
    }

    #[test]
    fn book_flags_parse() {
        let cli = Cli::parse_from([
            "quizcut", "book", "questions", "-o", "book.pdf", "--paper", "letter", "--per-page", "3",
        ]);
        let Command::Book(args) = cli.command else {
            panic!("expected book");
        };
        assert_eq!(args.paper, Some(PaperSize::Letter));
        assert_eq!(args.per_page, Some(3));
        assert_eq!(args.offset_y, None);
    }
}
