//! The crawl frontier
//!
//! This module holds every page discovered during a crawl:
//! - A set of canonical identities that only ever grows, so a page that has
//!   already been dispatched is never queued again
//! - A FIFO queue of pages that have not been dispatched yet
//!
//! Both structures live behind one mutex. Every operation takes the lock once,
//! so a batch insert is never observed half applied.

use crate::page::Page;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct FrontierState {
    /// Every canonical identity ever inserted
    discovered: HashSet<String>,

    /// Pages waiting to be dispatched, oldest first
    unvisited: VecDeque<Page>,
}

impl FrontierState {
    fn insert(&mut self, page: Page) -> bool {
        if self.discovered.contains(page.canonical()) {
            return false;
        }

        self.discovered.insert(page.canonical().to_string());
        self.unvisited.push_back(page);
        true
    }
}

/// Thread-safe repository of discovered and unvisited pages
///
/// Shared between the dispatcher, which polls it, and every worker, which
/// feeds it the links it finds.
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state
    ///
    /// Every operation finishes its mutation before releasing the guard, so
    /// the state behind a poisoned lock is still consistent and is reused.
    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a page if its canonical identity has not been seen before
    ///
    /// # Returns
    ///
    /// `true` if the page was new and has been queued, `false` if it was a
    /// duplicate and nothing changed
    pub fn insert(&self, page: Page) -> bool {
        self.lock().insert(page)
    }

    /// Inserts a batch of pages under a single lock acquisition
    ///
    /// # Returns
    ///
    /// The number of pages that were new and have been queued
    pub fn insert_all<I>(&self, pages: I) -> usize
    where
        I: IntoIterator<Item = Page>,
    {
        let mut state = self.lock();
        let mut added = 0;
        for page in pages {
            if state.insert(page) {
                added += 1;
            }
        }
        added
    }

    /// Removes and returns the oldest unvisited page
    ///
    /// Returns `None` when nothing is waiting.
    pub fn poll_unvisited(&self) -> Option<Page> {
        self.lock().unvisited.pop_front()
    }

    /// Returns true if no page is waiting to be dispatched
    ///
    /// An exhausted frontier does not mean the crawl is over: a worker that is
    /// still processing may insert more pages.
    pub fn is_exhausted(&self) -> bool {
        self.lock().unvisited.is_empty()
    }

    /// Returns true if a page with this canonical identity was ever inserted
    pub fn contains(&self, canonical: &str) -> bool {
        self.lock().discovered.contains(canonical)
    }

    /// Number of distinct pages ever inserted
    pub fn discovered_count(&self) -> usize {
        self.lock().discovered.len()
    }

    /// Number of pages waiting to be dispatched
    pub fn unvisited_count(&self) -> usize {
        self.lock().unvisited.len()
    }
}
