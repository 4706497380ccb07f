//! Order-preserving parallel map
//!
//! This module distributes a per-element task across a pool of worker threads
//! and hands the results back in exactly the order of the input, no matter in
//! which order the workers finish.
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Task Expansion**: Tags every input element with its position, optionally
//!   injecting that position into the payload ([`work`])
//! - **Resource Discovery**: Sizes the pool with `num_cpus::get()` when no worker
//!   count is given
//! - **Dispatch**: Queues contiguous chunks for a scoped pool of crossbeam workers
//!   ([`pool`])
//! - **Ordered Collection**: Restores input order from out-of-order chunk
//!   completions ([`ordered`])
//! - **Progress**: Optional indicatif bars that advance as results are collected
//!   ([`progress`])
//!
//! ## What This Module Does NOT Do:
//! - **Retries**: A single failing item fails the whole call
//! - **Partial Results**: Nothing is returned from a failed call
//! - **Timeouts**: Workers run each task to completion
//!
//! # Data Flow
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ input Vec<T> │──▶│ expand /       │──▶│ into_chunks  │──▶│ work channel │
//! │              │   │ expand_indexed │   │ (chunk_size) │   │ (all queued) │
//! └──────────────┘   └────────────────┘   └──────────────┘   └──────┬───────┘
//!                                                                   │
//!                    ┌──────────────┬───────────────┬───────────────┘
//!                    ▼              ▼               ▼
//!               [worker 0]     [worker 1]      [worker N]    (crossbeam scope)
//!                    │              │               │
//!                    └──────────────┴───────┬───────┘
//!                                           ▼  ChunkOutcome { seq, .. }
//!                               ┌───────────────────────┐
//!                               │ OrderedResults        │──▶ progress ──▶ Vec<R>
//!                               │ (parks early chunks)  │
//!                               └───────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use parallelize::parallel::{DispatchConfig, Dispatcher, ProgressMode};
//!
//! let dispatcher = Dispatcher::new(DispatchConfig {
//!     workers: Some(4),
//!     chunk_size: 1,
//!     progress: ProgressMode::Off,
//! })?;
//!
//! let lengths = dispatcher.map(vec!["a", "bb", "ccc"], |s: &str| Ok(s.len()))?;
//! assert_eq!(lengths, vec![1, 2, 3]);
//!
//! let labels = dispatcher.map_indexed(vec!["a", "b", "c"], |(s, i)| Ok(format!("{i}:{s}")))?;
//! assert_eq!(labels, vec!["0:a", "1:b", "2:c"]);
//! # Ok::<(), parallelize::parallel::ParallelError>(())
//! ```

pub mod core;
pub mod error;
pub mod ordered;
pub mod pool;
pub mod progress;
pub mod runner;
pub mod task;
pub mod work;
pub mod wrapper;

// Re-export main types for easier access
pub use self::core::{DispatchConfig, Dispatcher, ExecutionStrategy};
pub use error::{ParallelError, Result};
pub use progress::{ProgressMode, ProgressView};
pub use task::Task;
pub use work::{WorkItem, expand, expand_indexed};
pub use wrapper::{Parallelized, parallelize};
