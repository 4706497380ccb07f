use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{Receiver, Sender, unbounded};
use indicatif::ProgressBar;

use super::error::{ParallelError, Result};
use super::ordered::OrderedResults;
use super::progress::ProgressView;
use super::runner::{ChunkOutcome, ChunkRunner};
use super::work::Chunk;

/// A fixed-size set of worker threads scoped to one dispatch call.
///
/// Workers only exist inside [`WorkerPool::run`]; every one of them is joined
/// before `run` returns, whether the dispatch succeeded or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    size: usize,
}

/// Context for worker threads to avoid too many function parameters
struct WorkerContext<'a, P, C: ChunkRunner<P>> {
    worker_id: usize,
    work_rx: Receiver<Chunk<P>>,
    result_tx: Sender<ChunkOutcome<C::Output>>,
    shutdown: &'a AtomicBool,
    runner: &'a C,
    progress: Option<ProgressBar>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(ParallelError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Evaluate every chunk on the pool and collect the results in input order.
    ///
    /// All chunks are queued up front. Results are drained through
    /// [`OrderedResults`], wrapped by the progress view when one is given, and
    /// the first failure in input order ends the drain.
    pub fn run<P, C>(
        &self,
        chunks: Vec<Chunk<P>>,
        runner: &C,
        progress: Option<&ProgressView>,
    ) -> Result<Vec<C::Output>>
    where
        P: Send,
        C: ChunkRunner<P>,
    {
        let total_chunks = chunks.len();
        if total_chunks == 0 {
            return Ok(Vec::new());
        }
        let total_items: usize = chunks.iter().map(Chunk::len).sum();

        // Never start more workers than there are chunks to hand out
        let spawned = self.size.min(total_chunks);
        tracing::debug!(
            workers = spawned,
            chunks = total_chunks,
            items = total_items,
            "starting worker pool"
        );

        let (work_tx, work_rx) = unbounded::<Chunk<P>>();
        let (result_tx, result_rx) = unbounded::<ChunkOutcome<C::Output>>();
        for chunk in chunks {
            work_tx
                .send(chunk)
                .map_err(|_| ParallelError::Disconnected {
                    outstanding: total_chunks,
                })?;
        }
        // Workers stop once the queue is drained
        drop(work_tx);

        let shutdown = AtomicBool::new(false);

        let outcome = crossbeam::thread::scope(|s| -> Result<Vec<C::Output>> {
            for worker_id in 0..spawned {
                let ctx = WorkerContext {
                    worker_id,
                    work_rx: work_rx.clone(),
                    result_tx: result_tx.clone(),
                    shutdown: &shutdown,
                    runner,
                    progress: progress.and_then(|view| view.worker_bar(worker_id)),
                };

                let spawn = s
                    .builder()
                    .name(format!("parallelize-worker-{worker_id}"))
                    .spawn(move |_| worker_loop(ctx));
                if let Err(source) = spawn {
                    shutdown.store(true, Ordering::SeqCst);
                    return Err(ParallelError::Spawn {
                        worker: worker_id,
                        source,
                    });
                }
            }

            // Only workers hold senders now, so the stream ends if they all exit
            drop(result_tx);

            let stream = OrderedResults::new(result_rx, total_chunks);
            let collected = match progress {
                Some(view) => view.track(stream).collect::<Result<Vec<_>>>(),
                None => stream.collect::<Result<Vec<_>>>(),
            };

            if collected.is_err() {
                shutdown.store(true, Ordering::SeqCst);
            }
            collected
        })
        .map_err(|_| ParallelError::Teardown)?;

        tracing::debug!(workers = spawned, ok = outcome.is_ok(), "worker pool joined");
        outcome
    }
}

fn worker_loop<P, C: ChunkRunner<P>>(ctx: WorkerContext<'_, P, C>) {
    tracing::trace!(worker = ctx.worker_id, "worker started");
    let mut completed = 0usize;

    while let Ok(chunk) = ctx.work_rx.recv() {
        if ctx.shutdown.load(Ordering::SeqCst) {
            break;
        }

        let outcome = ctx.runner.run_chunk(chunk);
        completed += outcome.results.len();
        if let Some(bar) = &ctx.progress {
            bar.inc(outcome.results.len() as u64);
        }

        if ctx.result_tx.send(outcome).is_err() {
            break; // Collector dropped
        }
    }

    if let Some(bar) = &ctx.progress {
        bar.finish();
    }
    tracing::trace!(worker = ctx.worker_id, completed, "worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::runner::PerItem;
    use crate::parallel::work::{expand, into_chunks};
    use std::time::Duration;

    #[test]
    fn test_zero_workers_rejected() {
        let err = WorkerPool::new(0).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_pool_preserves_order_with_uneven_work() {
        // Earlier items sleep longest so they finish last
        let task = |x: u64| -> anyhow::Result<u64> {
            std::thread::sleep(Duration::from_millis(20 - x * 2));
            Ok(x * 10)
        };
        let pool = WorkerPool::new(4).unwrap();
        let results = pool
            .run(into_chunks(expand(0..8u64), 1), &PerItem::new(&task), None)
            .unwrap();
        assert_eq!(results, vec![0, 10, 20, 30, 40, 50, 60, 70]);
    }

    #[test]
    fn test_pool_with_larger_chunks() {
        let task = |x: usize| -> anyhow::Result<usize> { Ok(x + 100) };
        let pool = WorkerPool::new(3).unwrap();
        let results = pool
            .run(into_chunks(expand(0..10usize), 4), &PerItem::new(&task), None)
            .unwrap();
        assert_eq!(results, (100..110).collect::<Vec<_>>());
    }

    #[test]
    fn test_pool_empty_input() {
        let task = |x: u8| -> anyhow::Result<u8> { Ok(x) };
        let pool = WorkerPool::new(2).unwrap();
        let results = pool
            .run(into_chunks(expand(Vec::<u8>::new()), 1), &PerItem::new(&task), None)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_pool_reports_first_failure_in_order() {
        // Item 5 fails fast, item 2 fails slowly; item 2 still wins
        let task = |x: u64| -> anyhow::Result<u64> {
            match x {
                2 => {
                    std::thread::sleep(Duration::from_millis(30));
                    anyhow::bail!("slow failure")
                }
                5 => anyhow::bail!("fast failure"),
                _ => Ok(x),
            }
        };
        let pool = WorkerPool::new(4).unwrap();
        let err = pool
            .run(into_chunks(expand(0..8u64), 1), &PerItem::new(&task), None)
            .unwrap_err();
        assert_eq!(err.index(), Some(2));
        assert!(err.to_string().contains("slow failure"));
    }
}
