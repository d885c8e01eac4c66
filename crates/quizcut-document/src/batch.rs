// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch runner: segment and export many pages concurrently.
//
// Pages share nothing mutable. A semaphore bounds how many are in flight, the
// CPU-heavy stages run on the blocking pool, and the recognition call is put
// under a timeout. A failing page is recorded and the batch moves on.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use quizcut_core::config::BatchConfig;
use quizcut_core::error::{QuizcutError, Result};
use quizcut_core::types::RecognizedBox;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::export::SegmentExporter;
use crate::ocr::TextRecognizer;
use crate::page::Page;
use crate::pipeline::PageSegmenter;
use crate::report::{BatchReport, PageFailure, PageReport};

/// One unit of work for the batch runner.
#[derive(Debug, Clone)]
pub enum PageSource {
    /// A page image on disk, decoded by the worker.
    File { path: PathBuf, number: u32 },
    /// An already-decoded page.
    Decoded(Page),
}

impl PageSource {
    pub fn file(path: impl Into<PathBuf>, number: u32) -> Self {
        Self::File {
            path: path.into(),
            number,
        }
    }

    pub fn number(&self) -> u32 {
        match self {
            Self::File { number, .. } => *number,
            Self::Decoded(page) => page.number(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Decoded(_) => None,
        }
    }
}

/// Cloneable flag that stops a running batch from submitting further pages.
///
/// Pages already in flight run to completion.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Shared, read-only state handed to every page worker.
struct Worker {
    segmenter: PageSegmenter,
    exporter: SegmentExporter,
    recognizer: Arc<dyn TextRecognizer>,
    /// Bounds recognition calls, including ones whose page already gave up.
    recognition_slots: Arc<Semaphore>,
    recognition_timeout: Option<Duration>,
    out_dir: PathBuf,
}

/// Runs the page pipeline over a list of pages with bounded concurrency.
pub struct BatchRunner {
    segmenter: PageSegmenter,
    exporter: SegmentExporter,
    recognizer: Arc<dyn TextRecognizer>,
    config: BatchConfig,
    stop: StopHandle,
}

impl BatchRunner {
    pub fn new(
        segmenter: PageSegmenter,
        exporter: SegmentExporter,
        recognizer: Arc<dyn TextRecognizer>,
        config: BatchConfig,
    ) -> Self {
        Self {
            segmenter,
            exporter,
            recognizer,
            config,
            stop: StopHandle::default(),
        }
    }

    /// Handle that can stop this runner from another task or a signal handler.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Number of pages processed at once.
    pub fn concurrency(&self) -> usize {
        match self.config.max_concurrent_pages {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }

    /// Process every page and export its questions into `out_dir`.
    ///
    /// Never fails as a whole: per-page errors end up in
    /// [`BatchReport::failures`], in page order like the successes.
    #[instrument(skip_all, fields(pages = pages.len(), out = %out_dir.display()))]
    pub async fn run(&self, pages: Vec<PageSource>, out_dir: &Path) -> BatchReport {
        let started_at = Utc::now();
        let total = pages.len();
        let permits = self.concurrency();
        let semaphore = Arc::new(Semaphore::new(permits));
        let worker = Arc::new(Worker {
            segmenter: self.segmenter.clone(),
            exporter: self.exporter.clone(),
            recognizer: Arc::clone(&self.recognizer),
            recognition_slots: Arc::new(Semaphore::new(permits)),
            recognition_timeout: self.config.recognition_timeout_secs.map(Duration::from_secs),
            out_dir: out_dir.to_path_buf(),
        });

        info!(
            total,
            concurrency = permits,
            backend = %self.recognizer.backend(),
            "Batch started"
        );

        let mut tasks = JoinSet::new();
        let mut submitted = 0usize;
        for source in pages {
            // Wait for a free slot before deciding, so a stop issued while
            // waiting is honoured.
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            if self.stop.is_stopped() {
                info!(submitted, remaining = total - submitted, "Stop requested; no further pages submitted");
                break;
            }

            let number = source.number();
            let path = source.path().map(Path::to_path_buf);
            let worker = Arc::clone(&worker);
            tasks.spawn(async move {
                let outcome = worker.process(source).await;
                drop(permit);
                (number, path, outcome)
            });
            submitted += 1;
        }

        let mut reports = Vec::with_capacity(submitted);
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, _, Ok(report))) => reports.push(report),
                Ok((page, source, Err(err))) => {
                    warn!(page, error = %err, "Page failed");
                    failures.push(PageFailure {
                        page,
                        source,
                        error: err.to_string(),
                    });
                }
                Err(err) => warn!(error = %err, "Page task aborted"),
            }
        }
        reports.sort_by_key(|r| r.page);
        failures.sort_by_key(|f| f.page);

        let report = BatchReport {
            backend: self.recognizer.backend(),
            started_at,
            finished_at: Utc::now(),
            pages: reports,
            failures,
            skipped: total - submitted,
        };
        info!(
            pages = report.pages.len(),
            failed = report.failures.len(),
            skipped = report.skipped,
            questions = report.question_count(),
            "Batch finished"
        );
        report
    }
}

impl Worker {
    #[instrument(skip_all, fields(page = source.number()))]
    async fn process(self: Arc<Self>, source: PageSource) -> Result<PageReport> {
        let path = source.path().map(Path::to_path_buf);
        let page = Arc::new(match source {
            PageSource::File { path, number } => {
                blocking(move || Page::open(&path, number)).await?
            }
            PageSource::Decoded(page) => page,
        });

        let candidates = {
            let (worker, page) = (Arc::clone(&self), Arc::clone(&page));
            blocking(move || worker.segmenter.candidates(&page)).await?
        };

        let (boxes, degraded) = self.recognize(Arc::clone(&page)).await;
        let segments = self.segmenter.refine(&page, &candidates, &boxes);
        debug!(
            candidates = candidates.len(),
            questions = segments.len(),
            boxes = boxes.len(),
            "Page refined"
        );

        let outputs = {
            let (worker, page, segments) = (Arc::clone(&self), Arc::clone(&page), segments.clone());
            blocking(move || worker.exporter.export(&page, &segments, &worker.out_dir)).await?
        };

        Ok(PageReport {
            page: page.number(),
            source: path,
            width: page.width(),
            height: page.height(),
            candidates: candidates.len(),
            segments,
            boxes: boxes.len(),
            degraded,
            outputs,
        })
    }

    /// Recognize the page, treating an error or timeout as "no text".
    ///
    /// The timeout covers waiting for a recognition slot as well as the call.
    /// A timed-out call keeps running on the blocking pool and keeps its slot
    /// until it returns; only its result is discarded.
    async fn recognize(&self, page: Arc<Page>) -> (Vec<RecognizedBox>, bool) {
        let recognizer = Arc::clone(&self.recognizer);
        let slots = Arc::clone(&self.recognition_slots);
        let call = async move {
            let slot = slots
                .acquire_owned()
                .await
                .map_err(|err| QuizcutError::Worker(err.to_string()))?;
            tokio::task::spawn_blocking(move || {
                let result = recognizer.recognize(page.image());
                drop(slot);
                result
            })
            .await
            .map_err(|err| QuizcutError::Worker(err.to_string()))?
        };

        let outcome = match self.recognition_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(timeout_secs = limit.as_secs(), "Recognition timed out; refining without text");
                    return (Vec::new(), true);
                }
            },
            None => call.await,
        };

        match outcome {
            Ok(boxes) => (boxes, false),
            Err(err) => {
                warn!(error = %err, "Recognition failed; refining without text");
                (Vec::new(), true)
            }
        }
    }
}

/// Run a CPU-bound closure on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| QuizcutError::Worker(err.to_string()))?
}
