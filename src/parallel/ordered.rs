//! Order-restoring result stream over out-of-order chunk completions

use std::collections::BTreeMap;

use crossbeam::channel::Receiver;

use super::error::{ParallelError, Result};
use super::runner::ChunkOutcome;

/// Lazily yields one result per work item, in input order.
///
/// Workers report whole chunks in whatever order they finish. Chunks that
/// arrive ahead of their turn are parked until every earlier chunk has been
/// yielded. A chunk failure is yielded right after that chunk's successful
/// prefix, and the stream ends there.
pub struct OrderedResults<R> {
    rx: Receiver<ChunkOutcome<R>>,
    total_chunks: usize,
    next_seq: usize,
    parked: BTreeMap<usize, ChunkOutcome<R>>,
    ready: std::vec::IntoIter<R>,
    failure: Option<ParallelError>,
    done: bool,
}

impl<R> OrderedResults<R> {
    pub fn new(rx: Receiver<ChunkOutcome<R>>, total_chunks: usize) -> Self {
        Self {
            rx,
            total_chunks,
            next_seq: 0,
            parked: BTreeMap::new(),
            ready: Vec::new().into_iter(),
            failure: None,
            done: false,
        }
    }

    /// Number of chunks received early and waiting for their turn
    pub fn parked(&self) -> usize {
        self.parked.len()
    }

    /// Block until the chunk with the next sequence number is available
    fn next_chunk(&mut self) -> Result<ChunkOutcome<R>> {
        if let Some(outcome) = self.parked.remove(&self.next_seq) {
            return Ok(outcome);
        }
        loop {
            match self.rx.recv() {
                Ok(outcome) if outcome.seq == self.next_seq => return Ok(outcome),
                Ok(outcome) => {
                    tracing::trace!(seq = outcome.seq, waiting_for = self.next_seq, "parking early chunk");
                    self.parked.insert(outcome.seq, outcome);
                }
                Err(_) => {
                    return Err(ParallelError::Disconnected {
                        outstanding: self.total_chunks - self.next_seq,
                    });
                }
            }
        }
    }
}

impl<R> Iterator for OrderedResults<R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(result) = self.ready.next() {
                return Some(Ok(result));
            }
            if let Some(failure) = self.failure.take() {
                self.done = true;
                return Some(Err(failure));
            }
            if self.done || self.next_seq >= self.total_chunks {
                return None;
            }

            match self.next_chunk() {
                Ok(outcome) => {
                    self.next_seq += 1;
                    self.ready = outcome.results.into_iter();
                    self.failure = outcome.failure;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<R> std::iter::FusedIterator for OrderedResults<R> {}
