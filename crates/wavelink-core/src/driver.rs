//! Periodic retry driver.
//!
//! Replaces a platform periodic timer: an async task that calls
//! [`Engine::tick`] on a fixed period for the engine's lifetime. Spawn
//! [`RetryDriver::run`] on any runtime; abort or drop the task to stop
//! ticking.

use std::{sync::Arc, time::Duration};

use tokio::time::MissedTickBehavior;
use tracing::trace;

use crate::{engine::Engine, env::Environment, phy::PhyAdapter};

/// Default tick period. 100 ms keeps retry latency close to the configured
/// timeout; anything up to 400 ms is acceptable.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(100);

/// Periodic task driving [`Engine::tick`].
pub struct RetryDriver<P, E>
where
    P: PhyAdapter,
    E: Environment,
{
    engine: Arc<Engine<P, E>>,
    period: Duration,
}

impl<P, E> RetryDriver<P, E>
where
    P: PhyAdapter,
    E: Environment,
{
    /// Create a driver ticking `engine` at [`DEFAULT_TICK_PERIOD`].
    pub fn new(engine: Arc<Engine<P, E>>) -> Self {
        Self::with_period(engine, DEFAULT_TICK_PERIOD)
    }

    /// Create a driver with an explicit period.
    pub fn with_period(engine: Arc<Engine<P, E>>, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Tick forever. Runs until the task is dropped or aborted.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.period);
        // A stalled tick (long PHY transmission) must not burst afterwards
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            trace!("retry tick");
            self.engine.tick();
        }
    }
}

impl<P, E> std::fmt::Debug for RetryDriver<P, E>
where
    P: PhyAdapter,
    E: Environment,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryDriver").field("period", &self.period).finish()
    }
}
