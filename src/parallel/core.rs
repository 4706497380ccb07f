use serde::{Deserialize, Serialize};

use super::error::{ParallelError, Result};
use super::pool::WorkerPool;
use super::progress::{ProgressMode, ProgressView};
use super::runner::{ChunkRunner, PerChunkSetup, PerItem};
use super::task::Task;
use super::work::{WorkItem, expand, expand_indexed, into_chunks};

/// Configuration for one dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Worker count (`None` = number of logical CPUs, detected when the pool starts)
    pub workers: Option<usize>,
    /// Work items handed to a worker at a time (default 1)
    pub chunk_size: usize,
    /// Progress display (default off)
    pub progress: ProgressMode,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: None,
            chunk_size: 1,
            progress: ProgressMode::Off,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(ParallelError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(ParallelError::Config(
                "chunk size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Execution strategy enum for choosing between pooled and sequential evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Evaluate on the calling thread, in order
    Sequential,
    /// Evaluate on a pool of worker threads
    Pool { workers: usize },
}

impl ExecutionStrategy {
    /// Pool strategy for `workers`, or for every logical CPU when unspecified
    pub fn pool(workers: Option<usize>) -> Self {
        ExecutionStrategy::Pool {
            workers: workers.unwrap_or_else(num_cpus::get),
        }
    }

    pub fn workers(&self) -> usize {
        match self {
            ExecutionStrategy::Sequential => 1,
            ExecutionStrategy::Pool { workers } => *workers,
        }
    }
}

/// Distributes a task over work items and collects results in input order.
///
/// ```
/// use parallelize::parallel::{DispatchConfig, Dispatcher};
///
/// let dispatcher = Dispatcher::new(DispatchConfig {
///     workers: Some(2),
///     ..DispatchConfig::default()
/// })?;
/// let squares = dispatcher.map(vec![1, 2, 3, 4, 5], |x: i64| Ok(x * x))?;
/// assert_eq!(squares, vec![1, 4, 9, 16, 25]);
/// # Ok::<(), parallelize::parallel::ParallelError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: DispatchConfig,
    sequential: bool,
}

impl Dispatcher {
    /// Pooled dispatcher; fails on invalid configuration before any worker exists
    pub fn new(config: DispatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sequential: false,
        })
    }

    /// Dispatcher that evaluates on the calling thread with the same ordering
    /// and failure semantics as the pool
    pub fn sequential(config: DispatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sequential: true,
        })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Resolve the strategy for one call; the CPU count is read here, not earlier
    pub fn strategy(&self) -> ExecutionStrategy {
        if self.sequential {
            ExecutionStrategy::Sequential
        } else {
            ExecutionStrategy::pool(self.config.workers)
        }
    }

    /// Apply `task` to every element
    pub fn map<T, R, F>(&self, items: Vec<T>, task: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> anyhow::Result<R> + Sync,
    {
        self.run(expand(items), &task)
    }

    /// Apply `task` to every `(element, position)` pair
    pub fn map_indexed<T, R, F>(&self, items: Vec<T>, task: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn((T, usize)) -> anyhow::Result<R> + Sync,
    {
        self.run(expand_indexed(items), &task)
    }

    /// Apply `task` with state built by `setup` once per chunk, inside the worker.
    ///
    /// State is never shared between chunks or workers.
    pub fn map_with_setup<T, S, St, F, R>(&self, items: Vec<T>, setup: S, task: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        S: Fn() -> anyhow::Result<St> + Sync,
        F: Fn(&mut St, T) -> anyhow::Result<R> + Sync,
    {
        let runner = PerChunkSetup::new(&setup, &task);
        self.execute(expand(items), &runner)
    }

    /// Apply a [`Task`] to expanded work items, showing progress per the config
    pub fn run<P, K>(&self, items: Vec<WorkItem<P>>, task: &K) -> Result<Vec<K::Output>>
    where
        P: Send,
        K: Task<P>,
    {
        self.execute(items, &PerItem::new(task))
    }

    /// Apply a [`Task`] to expanded work items, reporting into a caller-owned view
    pub fn dispatch<P, K>(
        &self,
        items: Vec<WorkItem<P>>,
        task: &K,
        progress: Option<&ProgressView>,
    ) -> Result<Vec<K::Output>>
    where
        P: Send,
        K: Task<P>,
    {
        self.execute_with(items, &PerItem::new(task), progress)
    }

    fn execute<P, C>(&self, items: Vec<WorkItem<P>>, runner: &C) -> Result<Vec<C::Output>>
    where
        P: Send,
        C: ChunkRunner<P>,
    {
        let strategy = self.strategy();
        let view = ProgressView::new(self.config.progress, items.len(), strategy.workers());
        let outcome = self.execute_with(items, runner, view.as_ref());
        if let Some(view) = &view {
            view.finish();
        }
        outcome
    }

    fn execute_with<P, C>(
        &self,
        items: Vec<WorkItem<P>>,
        runner: &C,
        progress: Option<&ProgressView>,
    ) -> Result<Vec<C::Output>>
    where
        P: Send,
        C: ChunkRunner<P>,
    {
        let strategy = self.strategy();
        let total = items.len();
        let chunks = into_chunks(items, self.config.chunk_size);
        tracing::debug!(
            ?strategy,
            items = total,
            chunk_size = self.config.chunk_size,
            "dispatching work"
        );

        let outcome = match strategy {
            ExecutionStrategy::Sequential => {
                let worker_bar = progress.and_then(|view| view.worker_bar(0));
                let results = chunks.into_iter().flat_map(|chunk| {
                    let outcome = runner.run_chunk(chunk);
                    if let Some(bar) = &worker_bar {
                        bar.inc(outcome.results.len() as u64);
                    }
                    outcome.into_results()
                });
                match progress {
                    Some(view) => view.track(results).collect::<Result<Vec<_>>>(),
                    None => results.collect::<Result<Vec<_>>>(),
                }
            }
            ExecutionStrategy::Pool { workers } => {
                WorkerPool::new(workers)?.run(chunks, runner, progress)
            }
        };

        if let Err(err) = &outcome {
            tracing::warn!(error = %err, "dispatch failed");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn pooled(workers: usize) -> Dispatcher {
        Dispatcher::new(DispatchConfig {
            workers: Some(workers),
            ..DispatchConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = DispatchConfig::default();
        assert_eq!(config.workers, None);
        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.progress, ProgressMode::Off);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let zero_workers = DispatchConfig {
            workers: Some(0),
            ..DispatchConfig::default()
        };
        assert!(Dispatcher::new(zero_workers).unwrap_err().is_config());

        let zero_chunk = DispatchConfig {
            chunk_size: 0,
            ..DispatchConfig::default()
        };
        assert!(Dispatcher::sequential(zero_chunk).unwrap_err().is_config());
    }

    #[test]
    fn test_strategy_resolution() {
        assert_eq!(pooled(3).strategy(), ExecutionStrategy::Pool { workers: 3 });

        let auto = Dispatcher::new(DispatchConfig::default()).unwrap();
        assert_eq!(auto.strategy().workers(), num_cpus::get());

        let sequential = Dispatcher::sequential(DispatchConfig::default()).unwrap();
        assert_eq!(sequential.strategy(), ExecutionStrategy::Sequential);
    }

    #[test]
    fn test_squares_with_two_workers() {
        let results = pooled(2).map(vec![1, 2, 3, 4, 5], |x: i64| Ok(x * x)).unwrap();
        assert_eq!(results, vec![1, 4, 9, 16, 25]);
    }

    #[test]
    fn test_indexed_strings() {
        let results = pooled(2)
            .map_indexed(vec!["a", "b", "c"], |(s, i)| Ok(format!("{i}:{s}")))
            .unwrap();
        assert_eq!(results, vec!["0:a", "1:b", "2:c"]);
    }

    #[test]
    fn test_division_by_zero_fails_whole_call() {
        let err = pooled(2)
            .map(vec![1, 0, 3], |x: i32| {
                anyhow::ensure!(x != 0, "division by zero");
                Ok(10 / x)
            })
            .unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn test_single_worker_matches_sequential() {
        let items: Vec<u64> = (0..25).collect();
        let task = |x: u64| -> anyhow::Result<u64> {
            std::thread::sleep(Duration::from_millis((x * 7919) % 4));
            Ok(x * 3 + 1)
        };

        let sequential = Dispatcher::sequential(DispatchConfig::default())
            .unwrap()
            .map(items.clone(), task)
            .unwrap();
        let single = pooled(1).map(items.clone(), task).unwrap();
        let expected: Vec<u64> = items.iter().map(|x| x * 3 + 1).collect();

        assert_eq!(sequential, expected);
        assert_eq!(single, expected);
    }

    #[test]
    fn test_sequential_stops_at_first_failure() {
        let calls = AtomicUsize::new(0);
        let err = Dispatcher::sequential(DispatchConfig::default())
            .unwrap()
            .map(vec![1, 2, 3, 4], |x: u32| {
                calls.fetch_add(1, Ordering::SeqCst);
                anyhow::ensure!(x != 2, "two is not allowed");
                Ok(x)
            })
            .unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_setup_once_per_chunk() {
        let setups = AtomicUsize::new(0);
        let dispatcher = Dispatcher::new(DispatchConfig {
            workers: Some(2),
            chunk_size: 3,
            ..DispatchConfig::default()
        })
        .unwrap();

        let results = dispatcher
            .map_with_setup(
                (0..10).collect::<Vec<u32>>(),
                || {
                    setups.fetch_add(1, Ordering::SeqCst);
                    Ok(0u32)
                },
                |count: &mut u32, x: u32| {
                    *count += 1;
                    Ok((x, *count))
                },
            )
            .unwrap();

        // 10 items in chunks of 3 -> 4 chunks, each with its own counter
        assert_eq!(setups.load(Ordering::SeqCst), 4);
        let counters: Vec<u32> = results.iter().map(|(_, count)| *count).collect();
        assert_eq!(counters, vec![1, 2, 3, 1, 2, 3, 1, 2, 3, 1]);
        let values: Vec<u32> = results.iter().map(|(x, _)| *x).collect();
        assert_eq!(values, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_dispatch_reports_progress_into_view() {
        let view = ProgressView::with_draw_target(
            ProgressMode::PerWorker,
            12,
            3,
            ProgressDrawTarget::hidden(),
        )
        .unwrap();

        let task = |x: usize| -> anyhow::Result<usize> { Ok(x * 2) };
        let results = pooled(3).dispatch(expand(0..12usize), &task, Some(&view)).unwrap();

        assert_eq!(results.len(), 12);
        assert_eq!(view.completed(), 12);
        let per_worker: u64 = (0..3)
            .filter_map(|id| view.worker_bar(id))
            .map(|bar| bar.position())
            .sum();
        assert_eq!(per_worker, 12);
    }

    #[test]
    fn test_progress_does_not_change_results() {
        let items: Vec<u32> = (0..40).collect();
        let task = |x: u32| -> anyhow::Result<u32> { Ok(x.pow(2)) };

        let view =
            ProgressView::with_draw_target(ProgressMode::Overall, 40, 4, ProgressDrawTarget::hidden())
                .unwrap();
        let with_progress = pooled(4).dispatch(expand(items.clone()), &task, Some(&view)).unwrap();
        let without = pooled(4).map(items, task).unwrap();

        assert_eq!(with_progress, without);
        assert_eq!(view.completed(), 40);
    }
}
