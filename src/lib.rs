//! # parallelize - order-preserving parallel map
//!
//! Wrap a per-element function so it is applied to a whole sequence across a
//! pool of worker threads, with the results returned in input order.
//!
//! ## Features
//!
//! - **Order fidelity**: results line up with the input no matter which worker
//!   finishes first
//! - **Index injection**: tasks can receive `(element, position)` pairs
//! - **Progress**: optional overall and per-worker progress bars
//! - **Fail fast**: the first failing element (in input order) fails the call
//!   and stops the pool
//!
//! ## Quick Start
//!
//! ```rust
//! use parallelize::parallelize;
//!
//! let squares = parallelize(|x: u64| -> anyhow::Result<u64> { Ok(x * x) })
//!     .workers(2)
//!     .into_fn();
//!
//! assert_eq!(squares(vec![1, 2, 3, 4, 5])?, vec![1, 4, 9, 16, 25]);
//! # Ok::<(), parallelize::ParallelError>(())
//! ```
//!
//! The `parallelize` binary exposes the same dispatcher for shell commands:
//!
//! ```bash
//! seq 1 100 | parallelize run -j 8 --progress overall -- sh -c 'expensive {}'
//! ```

pub mod cli;
pub mod config;
pub mod parallel;

pub use config::{ParallelizeConfig, Settings};
pub use parallel::{
    DispatchConfig, Dispatcher, ParallelError, Parallelized, ProgressMode, Task, parallelize,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
