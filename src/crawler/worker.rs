//! Crawl workers
//!
//! A worker is a long-lived tokio task that owns one assignment channel. It
//! waits for a page, runs one crawl cycle on it, reports itself idle to the
//! dispatcher and waits again. It never polls: between cycles it is parked
//! on its channel.
//!
//! One cycle:
//! 1. Fetch the page, retrying transient failures
//! 2. Parse it and run every scanner over it
//! 3. Insert the links found into the frontier as one batch
//! 4. Run every analyser
//! 5. Report the outcome, whatever it was
//!
//! Links are inserted before the idle report is sent. The dispatcher relies
//! on this ordering to decide that the crawl is over.

use crate::crawler::fetcher::{fetch_with_retry, AbandonReason, FetchOutcome, Fetcher};
use crate::frontier::Frontier;
use crate::page::{Document, Page};
use crate::policy::{scan_all, LinkScanner, PageAnalyser};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default number of attempts per page
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Lifecycle of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for a page
    Idle,

    /// Holding a page it has not started on yet
    Assigned,

    /// Fetching, scanning or analysing
    Processing,
}

impl WorkerState {
    /// Moves to `next`, rejecting anything but
    /// `Idle -> Assigned -> Processing -> Idle`
    pub fn transition(self, next: WorkerState) -> Result<WorkerState, WorkerError> {
        match (self, next) {
            (WorkerState::Idle, WorkerState::Assigned)
            | (WorkerState::Assigned, WorkerState::Processing)
            | (WorkerState::Processing, WorkerState::Idle) => Ok(next),
            (from, to) => Err(WorkerError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Idle => "idle",
            WorkerState::Assigned => "assigned",
            WorkerState::Processing => "processing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkerError {
    #[error("Invalid worker state transition: {from} -> {to}")]
    InvalidTransition { from: WorkerState, to: WorkerState },
}

/// What one crawl cycle achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The page was fetched; `links_added` pages were new to the frontier
    Fetched { links_added: usize },

    /// The page was given up on
    Abandoned(AbandonReason),

    /// Scanning or analysis panicked; the page is not retried
    Panicked,
}

/// Sent by a worker when it has finished a cycle and is ready for more work
#[derive(Debug)]
pub enum WorkerEvent {
    Idle {
        worker: usize,
        page: Page,
        outcome: CycleOutcome,
    },
}

/// Everything a worker needs to process pages, shared by the whole pool
pub struct CrawlContext<F> {
    frontier: Arc<Frontier>,
    fetcher: F,
    scanners: Vec<Box<dyn LinkScanner>>,
    analysers: Vec<Box<dyn PageAnalyser>>,
    max_attempts: u32,
}

impl<F: Fetcher> CrawlContext<F> {
    /// Creates a context with an empty frontier and no scanners or analysers
    pub fn new(fetcher: F) -> Self {
        Self {
            frontier: Arc::new(Frontier::new()),
            fetcher,
            scanners: Vec::new(),
            analysers: Vec::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Shares `frontier` with whoever else holds it, such as link filters
    pub fn with_frontier(mut self, frontier: Arc<Frontier>) -> Self {
        self.frontier = frontier;
        self
    }

    pub fn with_scanner(mut self, scanner: Box<dyn LinkScanner>) -> Self {
        self.scanners.push(scanner);
        self
    }

    pub fn with_analyser(mut self, analyser: Box<dyn PageAnalyser>) -> Self {
        self.analysers.push(analyser);
        self
    }

    /// Sets the number of fetch attempts per page
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Runs one crawl cycle on `page`
    pub async fn run_cycle(&self, page: &Page) -> CycleOutcome {
        match fetch_with_retry(&self.fetcher, page, self.max_attempts).await {
            FetchOutcome::Fetched { body, .. } => CycleOutcome::Fetched {
                links_added: self.process(page, &body),
            },
            FetchOutcome::Abandoned(reason) => CycleOutcome::Abandoned(reason),
        }
    }

    /// Scans and analyses a fetched page
    ///
    /// The parsed document lives only inside this call.
    ///
    /// # Returns
    ///
    /// The number of linked pages that were new to the frontier
    pub fn process(&self, page: &Page, body: &str) -> usize {
        let document = Document::parse(body);

        let links = scan_all(&self.scanners, page, &document);
        let found = links.len();
        let added = self.frontier.insert_all(links);
        tracing::debug!("{}: {} links found, {} new", page, found, added);

        for analyser in &self.analysers {
            tracing::trace!("Running {} analyser on {}", analyser.name(), page);
            analyser.analyse(page, &document);
        }

        added
    }
}

/// Dispatcher-side handle of a spawned worker
#[derive(Debug)]
pub struct WorkerHandle {
    id: usize,
    assignments: mpsc::Sender<Page>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Hands a page to an idle worker
    ///
    /// # Returns
    ///
    /// The page back if the worker can no longer take it
    pub fn assign(&self, page: Page) -> Result<(), Page> {
        self.assignments.try_send(page).map_err(|e| e.into_inner())
    }

    /// Closes the assignment channel and waits for the task to end
    pub async fn shutdown(self) {
        let WorkerHandle {
            id,
            assignments,
            task,
        } = self;
        drop(assignments);

        if let Err(e) = task.await {
            tracing::error!("Worker {} ended abnormally: {}", id, e);
        }
    }
}

/// A pool member processing one page at a time
pub struct Worker<F> {
    id: usize,
    state: WorkerState,
    context: Arc<CrawlContext<F>>,
    assignments: mpsc::Receiver<Page>,
    events: mpsc::UnboundedSender<WorkerEvent>,
}

impl<F: Fetcher> Worker<F> {
    /// Spawns a worker task, idle from the start
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        id: usize,
        context: Arc<CrawlContext<F>>,
        events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> WorkerHandle {
        let (assign_tx, assign_rx) = mpsc::channel(1);
        let worker = Worker {
            id,
            state: WorkerState::Idle,
            context,
            assignments: assign_rx,
            events,
        };

        WorkerHandle {
            id,
            assignments: assign_tx,
            task: tokio::spawn(worker.run()),
        }
    }

    async fn run(mut self) {
        while let Some(page) = self.assignments.recv().await {
            self.set_state(WorkerState::Assigned);
            self.set_state(WorkerState::Processing);

            let outcome = run_contained(self.id, Arc::clone(&self.context), page.clone()).await;

            // Clear the assignment whatever happened
            self.set_state(WorkerState::Idle);

            let event = WorkerEvent::Idle {
                worker: self.id,
                page,
                outcome,
            };
            if self.events.send(event).is_err() {
                break;
            }
        }

        tracing::trace!("Worker {} stopped", self.id);
    }

    fn set_state(&mut self, next: WorkerState) {
        match self.state.transition(next) {
            Ok(state) => {
                tracing::trace!("Worker {}: {} -> {}", self.id, self.state, state);
                self.state = state;
            }
            Err(e) => tracing::error!("Worker {}: {}", self.id, e),
        }
    }
}

/// Runs a cycle in its own task so that a panic ends the cycle, not the worker
async fn run_contained<F: Fetcher>(id: usize, context: Arc<CrawlContext<F>>, page: Page) -> CycleOutcome {
    let task = tokio::spawn(async move { context.run_cycle(&page).await });

    match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Worker {} cycle failed: {}", id, e);
            CycleOutcome::Panicked
        }
    }
}
