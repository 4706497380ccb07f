/// The per-item computation evaluated by the pool's workers.
///
/// Every closure `Fn(P) -> anyhow::Result<R> + Sync` is a `Task<P>`. Implement
/// the trait on a struct when the computation needs explicit state; workers
/// share that state by reference for the duration of one dispatch.
///
/// ```
/// use parallelize::parallel::Task;
///
/// struct Scale {
///     factor: u64,
/// }
///
/// impl Task<u64> for Scale {
///     type Output = u64;
///
///     fn run(&self, value: u64) -> anyhow::Result<u64> {
///         Ok(value * self.factor)
///     }
/// }
///
/// assert_eq!(Scale { factor: 3 }.run(2).unwrap(), 6);
/// ```
pub trait Task<P>: Sync {
    type Output: Send;

    fn run(&self, payload: P) -> anyhow::Result<Self::Output>;
}

impl<P, R, F> Task<P> for F
where
    F: Fn(P) -> anyhow::Result<R> + Sync,
    R: Send,
{
    type Output = R;

    fn run(&self, payload: P) -> anyhow::Result<R> {
        self(payload)
    }
}
