use std::any::Any;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};

use super::error::{ParallelError, Result};
use super::task::Task;
use super::work::{Chunk, WorkItem};

/// Results of evaluating one chunk.
///
/// `results` holds the successful prefix of the chunk in order; `failure`, when
/// present, belongs to the item right after that prefix.
#[derive(Debug)]
pub struct ChunkOutcome<R> {
    pub seq: usize,
    pub results: Vec<R>,
    pub failure: Option<ParallelError>,
}

impl<R> ChunkOutcome<R> {
    pub fn complete(seq: usize, results: Vec<R>) -> Self {
        Self {
            seq,
            results,
            failure: None,
        }
    }

    pub fn failed(seq: usize, results: Vec<R>, failure: ParallelError) -> Self {
        Self {
            seq,
            results,
            failure: Some(failure),
        }
    }

    /// Flatten into per-item results, the failure last
    pub fn into_results(self) -> impl Iterator<Item = Result<R>> {
        self.results
            .into_iter()
            .map(Ok)
            .chain(self.failure.map(Err))
    }
}

/// Evaluates a whole chunk on the worker that received it
pub trait ChunkRunner<P>: Sync {
    type Output: Send;

    fn run_chunk(&self, chunk: Chunk<P>) -> ChunkOutcome<Self::Output>;
}

/// Applies a [`Task`] to every item of the chunk, stopping at the first failure
pub struct PerItem<'a, T> {
    task: &'a T,
}

impl<'a, T> PerItem<'a, T> {
    pub fn new(task: &'a T) -> Self {
        Self { task }
    }
}

impl<P, T: Task<P>> ChunkRunner<P> for PerItem<'_, T> {
    type Output = T::Output;

    fn run_chunk(&self, chunk: Chunk<P>) -> ChunkOutcome<T::Output> {
        let mut results = Vec::with_capacity(chunk.items.len());
        for WorkItem { index, payload } in chunk.items {
            match guarded(index, || self.task.run(payload)) {
                Ok(output) => results.push(output),
                Err(failure) => return ChunkOutcome::failed(chunk.seq, results, failure),
            }
        }
        ChunkOutcome::complete(chunk.seq, results)
    }
}

/// Builds fresh state once per chunk, then threads it through every item.
///
/// The state never leaves the worker that built it.
pub struct PerChunkSetup<'a, S, F, St, R> {
    setup: &'a S,
    task: &'a F,
    _marker: PhantomData<fn() -> (St, R)>,
}

impl<'a, S, F, St, R> PerChunkSetup<'a, S, F, St, R> {
    pub fn new(setup: &'a S, task: &'a F) -> Self {
        Self {
            setup,
            task,
            _marker: PhantomData,
        }
    }
}

impl<P, S, F, St, R> ChunkRunner<P> for PerChunkSetup<'_, S, F, St, R>
where
    S: Fn() -> anyhow::Result<St> + Sync,
    F: Fn(&mut St, P) -> anyhow::Result<R> + Sync,
    R: Send,
{
    type Output = R;

    fn run_chunk(&self, chunk: Chunk<P>) -> ChunkOutcome<R> {
        let first = chunk.first_index().unwrap_or_default();
        let mut state = match panic::catch_unwind(AssertUnwindSafe(|| (self.setup)())) {
            Ok(Ok(state)) => state,
            Ok(Err(source)) => {
                let failure = ParallelError::Setup {
                    index: first,
                    source,
                };
                return ChunkOutcome::failed(chunk.seq, Vec::new(), failure);
            }
            Err(payload) => {
                let failure = ParallelError::Panic {
                    index: first,
                    message: panic_message(payload.as_ref()),
                };
                return ChunkOutcome::failed(chunk.seq, Vec::new(), failure);
            }
        };

        let mut results = Vec::with_capacity(chunk.items.len());
        for WorkItem { index, payload } in chunk.items {
            match guarded(index, || (self.task)(&mut state, payload)) {
                Ok(output) => results.push(output),
                Err(failure) => return ChunkOutcome::failed(chunk.seq, results, failure),
            }
        }
        ChunkOutcome::complete(chunk.seq, results)
    }
}

/// Run one item, turning both errors and panics into a positioned failure
fn guarded<R>(index: usize, f: impl FnOnce() -> anyhow::Result<R>) -> Result<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(ParallelError::Task { index, source }),
        Err(payload) => Err(ParallelError::Panic {
            index,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
