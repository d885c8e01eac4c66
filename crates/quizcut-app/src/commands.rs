// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use quizcut_core::AppConfig;
use quizcut_document::page::{is_image_file, list_images};
use quizcut_document::{
    BatchRunner, BookComposer, PageSegmenter, PageSource, PdfWriter, SegmentExporter,
    build_recognizer,
};
use tracing::{info, warn};

use crate::cli::{BookArgs, SplitArgs};

/// Load the configuration file if one was given, otherwise the defaults.
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

/// Expand files and directories into numbered pages, in argument order.
fn collect_pages(inputs: &[PathBuf], first_page: u32) -> Result<Vec<PageSource>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = list_images(input)
                .with_context(|| format!("failed to list {}", input.display()))?;
            if found.is_empty() {
                warn!(dir = %input.display(), "No page images in directory");
            }
            paths.extend(found);
        } else if input.is_file() {
            if !is_image_file(input) {
                warn!(file = %input.display(), "Unrecognised extension; trying to decode anyway");
            }
            paths.push(input.clone());
        } else {
            bail!("input {} does not exist", input.display());
        }
    }
    if paths.is_empty() {
        bail!("no page images found in the given inputs");
    }

    paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| {
            let number = u32::try_from(i)
                .ok()
                .and_then(|i| first_page.checked_add(i))
                .context("page number overflow")?;
            Ok(PageSource::file(path, number))
        })
        .collect()
}

fn apply_split_overrides(config: &mut AppConfig, args: &SplitArgs) {
    if let Some(prefix) = &args.prefix {
        config.export.prefix = prefix.clone();
    }
    if let Some(format) = args.format {
        config.export.format = format;
    }
    if args.no_manifest {
        config.export.write_manifest = false;
    }
    if let Some(backend) = args.backend {
        config.recognition.backend = Some(backend);
    }
    if let Some(lang) = &args.lang {
        config.recognition.language = lang.clone();
    }
    if let Some(dir) = &args.model_dir {
        config.recognition.model_dir = Some(dir.clone());
    }
    if let Some(jobs) = args.jobs {
        config.batch.max_concurrent_pages = jobs;
    }
    if let Some(secs) = args.ocr_timeout {
        config.batch.recognition_timeout_secs = (secs > 0).then_some(secs);
    }
}

/// `quizcut split`
pub async fn split(args: SplitArgs) -> Result<ExitCode> {
    let mut config = load_config(args.config.as_deref())?;
    apply_split_overrides(&mut config, &args);
    config.validate().context("invalid configuration")?;

    // Everything that can fail for the whole run fails here, before any page.
    let segmenter = PageSegmenter::new(&config.segmenter)?;
    let recognizer = build_recognizer(&config.recognition)?;
    let pages = collect_pages(&args.inputs, args.first_page)?;

    let runner = BatchRunner::new(
        segmenter,
        SegmentExporter::new(config.export.clone()),
        recognizer,
        config.batch.clone(),
    );

    let stop = runner.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing pages in flight");
            stop.stop();
        }
    });

    let report = runner.run(pages, &args.out).await;

    if config.export.write_manifest {
        std::fs::create_dir_all(&args.out)
            .with_context(|| format!("failed to create {}", args.out.display()))?;
        report.write_manifest(&args.out)?;
    }

    println!(
        "{} question(s) from {} page(s) written to {}",
        report.question_count(),
        report.pages.len(),
        args.out.display()
    );
    if report.degraded_pages() > 0 {
        println!(
            "{} page(s) were split without recognized text and may be over-merged",
            report.degraded_pages()
        );
    }
    for failure in &report.failures {
        match &failure.source {
            Some(source) => eprintln!("page {} ({}): {}", failure.page, source.display(), failure.error),
            None => eprintln!("page {}: {}", failure.page, failure.error),
        }
    }
    if report.skipped > 0 {
        eprintln!("{} page(s) not processed after interrupt", report.skipped);
    }

    Ok(if report.has_failures() || report.skipped > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// `quizcut book`
pub async fn book(args: BookArgs) -> Result<ExitCode> {
    let mut config = load_config(args.config.as_deref())?;
    let book = &mut config.book;
    if let Some(paper) = args.paper {
        book.paper_size = paper;
    }
    if let Some(dpi) = args.dpi {
        book.dpi = dpi;
    }
    if let Some(per_page) = args.per_page {
        book.questions_per_page = per_page;
    }
    if let Some(x) = args.offset_x {
        book.offset_x = x;
    }
    if let Some(y) = args.offset_y {
        book.offset_y = y;
    }
    if let Some(title) = &args.title {
        book.title = title.clone();
    }
    let book = config.book.clone();
    let composer = BookComposer::new(book.clone()).context("invalid book layout")?;

    let input_dir = args.input_dir.clone();
    let output = args.output.clone();
    let pages = tokio::task::spawn_blocking(move || -> Result<usize> {
        let pages = composer.compose_dir(&input_dir)?;
        let mut writer = PdfWriter::new(book.paper_size, book.dpi);
        writer.set_title(book.title);
        writer.write_pages_to_file(&pages, &output)?;
        Ok(pages.len())
    })
    .await
    .context("book worker failed")??;

    info!(pages, output = %args.output.display(), "Book written");
    println!("{} page(s) written to {}", pages, args.output.display());
    Ok(ExitCode::SUCCESS)
}

/// `quizcut config`
pub fn config(output: Option<&Path>) -> Result<ExitCode> {
    let config = AppConfig::default();
    match output {
        Some(path) => {
            config
                .save(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Default configuration written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(ExitCode::SUCCESS)
}
