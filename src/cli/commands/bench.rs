use std::hint::black_box;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use clap::Args;

use crate::cli::Output;
use crate::config::{ParallelizeConfig, SettingsOverrides};
use crate::parallel::{DispatchConfig, Dispatcher, ProgressMode};

#[derive(Args)]
pub struct BenchArgs {
    /// Upper bound of each sum of squares
    #[arg(long, default_value_t = 1_000_000)]
    pub size: u64,

    /// Number of identical work items
    #[arg(long, default_value_t = 32)]
    pub tasks: usize,

    /// Number of worker threads for the pooled run
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Items handed to a worker at a time
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Progress display on stderr for the pooled run
    #[arg(long, value_enum)]
    pub progress: Option<ProgressMode>,
}

/// Sum of `i * i` for `i` in `0..n`
pub fn sum_of_squares(n: u64) -> u128 {
    (0..n)
        .map(|i| {
            let i = u128::from(black_box(i));
            i * i
        })
        .sum()
}

fn timed(dispatcher: &Dispatcher, inputs: &[u64]) -> Result<(Vec<u128>, Duration)> {
    let start = Instant::now();
    let results = dispatcher.map(inputs.to_vec(), |n: u64| -> anyhow::Result<u128> {
        Ok(sum_of_squares(n))
    })?;
    Ok((results, start.elapsed()))
}

pub fn execute(args: BenchArgs, output: &Output, custom_config: Option<&str>) -> Result<()> {
    let overrides = SettingsOverrides {
        workers: args.workers,
        chunk_size: args.chunk_size,
        progress: args.progress,
        ..SettingsOverrides::default()
    };
    let settings = ParallelizeConfig::load(custom_config, Some(overrides))?.settings()?;

    let quiet_config = DispatchConfig {
        progress: ProgressMode::Off,
        ..settings.dispatch_config()
    };
    let mut pooled_config = settings.dispatch_config();
    if output.is_quiet() {
        pooled_config.progress = ProgressMode::Off;
    }

    let sequential = Dispatcher::sequential(quiet_config.clone())?;
    let single = Dispatcher::new(DispatchConfig {
        workers: Some(1),
        ..quiet_config
    })?;
    let pooled = Dispatcher::new(pooled_config)?;
    let workers = pooled.strategy().workers();

    let inputs = vec![args.size; args.tasks];
    output.header(&format!(
        "Sum of squares below {} over {} task(s)",
        args.size, args.tasks
    ));

    let (expected, sequential_time) = timed(&sequential, &inputs)?;
    let (single_results, single_time) = timed(&single, &inputs)?;
    let (pooled_results, pooled_time) = timed(&pooled, &inputs)?;

    if single_results != expected || pooled_results != expected {
        output.error("pooled results differ from the sequential run");
        bail!("benchmark results do not match");
    }

    output.table_row("sequential", &format!("{sequential_time:.2?}"));
    output.table_row("1 worker", &format!("{single_time:.2?}"));
    output.table_row(&format!("{workers} worker(s)"), &format!("{pooled_time:.2?}"));

    let speedup = sequential_time.as_secs_f64() / pooled_time.as_secs_f64().max(f64::EPSILON);
    output.table_row("speedup", &format!("{speedup:.2}x"));
    output.success("all runs produced identical results");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_of_squares() {
        assert_eq!(sum_of_squares(0), 0);
        assert_eq!(sum_of_squares(4), 14);
        assert_eq!(sum_of_squares(1_000_000), 333_332_833_333_500_000);
    }
}
