//! Crawl dispatcher - hands frontier pages to idle workers
//!
//! The dispatcher owns the worker pool and is the only place that knows which
//! workers are idle. Its loop:
//! 1. While an idle worker and an unvisited page both exist, assign one to the other
//! 2. Stop once the frontier is exhausted and every live worker is idle
//! 3. Otherwise wait for the next worker event
//!
//! A worker inserts the links it found before it reports itself idle, so when
//! the last busy worker's report arrives, everything it discovered is already
//! in the frontier. The check in step 2 therefore never misses work, and the
//! wait in step 3 always has a busy worker that will wake it.

use crate::crawler::fetcher::{AbandonReason, Fetcher};
use crate::crawler::worker::{CrawlContext, CycleOutcome, Worker, WorkerEvent, WorkerHandle};
use crate::frontier::Frontier;
use crate::output::{CrawlSummary, FindingCounts};
use crate::page::Page;
use crate::{Result, SweepError};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Pages between two progress log lines
const PROGRESS_INTERVAL: usize = 50;

/// Running totals of cycle outcomes
#[derive(Debug, Default)]
struct Tally {
    visited: usize,
    completed: usize,
    fetched: usize,
    abandoned_permanent: usize,
    abandoned_after_retries: usize,
    abandoned_unclassified: usize,
    panicked: usize,
}

impl Tally {
    fn record(&mut self, outcome: CycleOutcome) {
        self.completed += 1;
        match outcome {
            CycleOutcome::Fetched { .. } => self.fetched += 1,
            CycleOutcome::Abandoned(AbandonReason::Permanent) => self.abandoned_permanent += 1,
            CycleOutcome::Abandoned(AbandonReason::RetriesExhausted) => {
                self.abandoned_after_retries += 1
            }
            CycleOutcome::Abandoned(AbandonReason::Unclassified) => {
                self.abandoned_unclassified += 1
            }
            CycleOutcome::Panicked => self.panicked += 1,
        }
    }
}

/// Owns the worker pool and drives a crawl to completion
pub struct Dispatcher<F: Fetcher> {
    context: Arc<CrawlContext<F>>,
    workers: Vec<WorkerHandle>,
    events: mpsc::UnboundedReceiver<WorkerEvent>,
    idle: VecDeque<usize>,
    live: usize,
}

impl<F: Fetcher> Dispatcher<F> {
    /// Spawns `pool_size` workers, all idle
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `context` - Fetcher, scanners and analysers shared by every worker
    /// * `pool_size` - Number of workers; must be at least 1
    ///
    /// # Returns
    ///
    /// * `Ok(Dispatcher)` - The pool is running and waiting for work
    /// * `Err(SweepError::InvalidPoolSize)` - `pool_size` was zero
    pub fn initialize(context: CrawlContext<F>, pool_size: usize) -> Result<Self> {
        if pool_size == 0 {
            return Err(SweepError::InvalidPoolSize(pool_size));
        }

        let context = Arc::new(context);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let workers: Vec<WorkerHandle> = (0..pool_size)
            .map(|id| Worker::spawn(id, Arc::clone(&context), events_tx.clone()))
            .collect();

        tracing::debug!("Spawned {} workers", pool_size);

        Ok(Self {
            context,
            workers,
            events: events_rx,
            idle: (0..pool_size).collect(),
            live: pool_size,
        })
    }

    /// Number of workers the pool was started with
    pub fn pool_size(&self) -> usize {
        self.workers.len()
    }

    pub fn frontier(&self) -> &Frontier {
        self.context.frontier()
    }

    /// The shared crawl context
    pub fn context(&self) -> &Arc<CrawlContext<F>> {
        &self.context
    }

    /// Crawls everything reachable from `root_url`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The frontier is exhausted and every worker is idle
    /// * `Err(SweepError::InvalidRoot)` - The root is not an HTTP(S) URL; nothing was dispatched
    /// * `Err(SweepError::WorkerPoolLost)` - Every worker stopped before the crawl finished
    pub async fn crawl(mut self, root_url: &str) -> Result<CrawlSummary> {
        let root = Page::parse(root_url).map_err(|source| SweepError::InvalidRoot {
            url: root_url.to_string(),
            source,
        })?;

        let started_at = Utc::now();
        tracing::info!(
            "Starting crawl of {} with {} workers",
            root,
            self.pool_size()
        );

        self.frontier().insert(root.clone());

        let mut tally = Tally::default();
        let result = self.run_loop(&mut tally).await;
        let finished_at = Utc::now();

        let summary = self.summarize(&root, &tally, started_at, finished_at);
        self.shutdown().await;
        result?;

        tracing::info!(
            "Crawl finished: {} pages discovered, {} fetched, {} abandoned in {:.1}s",
            summary.discovered,
            summary.fetched,
            summary.abandoned(),
            summary.duration().num_milliseconds() as f64 / 1000.0
        );

        Ok(summary)
    }

    async fn run_loop(&mut self, tally: &mut Tally) -> Result<()> {
        // Pages handed back by workers that stopped before taking them
        let mut pending: VecDeque<Page> = VecDeque::new();

        loop {
            // Step 1: Pair idle workers with waiting pages
            while let Some(worker) = self.idle.pop_front() {
                let next = pending
                    .pop_front()
                    .or_else(|| self.context.frontier().poll_unvisited());

                let Some(page) = next else {
                    self.idle.push_front(worker);
                    break;
                };

                match self.workers[worker].assign(page) {
                    Ok(()) => tally.visited += 1,
                    Err(page) => {
                        tracing::warn!("Worker {} stopped; reassigning {}", worker, page);
                        self.live -= 1;
                        pending.push_back(page);
                    }
                }
            }

            if self.live == 0 {
                return Err(SweepError::WorkerPoolLost(self.pool_size()));
            }

            // Step 2: Finished when nothing waits and nobody works
            if pending.is_empty()
                && self.idle.len() == self.live
                && self.context.frontier().is_exhausted()
            {
                return Ok(());
            }

            // Step 3: Wait for a worker to finish its cycle
            match self.events.recv().await {
                Some(WorkerEvent::Idle {
                    worker,
                    page,
                    outcome,
                }) => {
                    tracing::trace!("Worker {} finished {}: {:?}", worker, page, outcome);
                    tally.record(outcome);
                    self.idle.push_back(worker);

                    if tally.completed % PROGRESS_INTERVAL == 0 {
                        tracing::info!(
                            "Progress: {} pages processed, {} discovered, {} waiting",
                            tally.completed,
                            self.context.frontier().discovered_count(),
                            self.context.frontier().unvisited_count()
                        );
                    }
                }
                None => return Err(SweepError::WorkerPoolLost(self.pool_size())),
            }
        }
    }

    fn summarize(
        &self,
        root: &Page,
        tally: &Tally,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> CrawlSummary {
        let frontier = self.context.frontier();
        CrawlSummary {
            root_url: root.canonical().to_string(),
            pool_size: self.pool_size(),
            discovered: frontier.discovered_count(),
            unvisited: frontier.unvisited_count(),
            visited: tally.visited,
            fetched: tally.fetched,
            abandoned_permanent: tally.abandoned_permanent,
            abandoned_after_retries: tally.abandoned_after_retries,
            abandoned_unclassified: tally.abandoned_unclassified,
            panicked: tally.panicked,
            findings: FindingCounts::default(),
            started_at,
            finished_at,
        }
    }

    /// Closes every assignment channel and waits for the workers to stop
    async fn shutdown(self) {
        let Dispatcher {
            workers, events, ..
        } = self;
        drop(events);

        for worker in workers {
            worker.shutdown().await;
        }
    }
}
