/// Tuning knobs for one executor instance.
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    /// Buffer capacity of the lifecycle/diagnostic event bus. Slow
    /// subscribers past this depth observe a lagged stream, not lost jobs.
    pub event_capacity: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
        }
    }
}
