//! Runtime configuration for a simulation run

use num_bigint::BigUint;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use super::error::Rejection;
use super::world::World;

/// How a run is executed. The result never depends on these settings.
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    /// Worker threads for the per-phase fan-out; `None` uses rayon's global
    /// pool.
    pub threads: Option<usize>,
}

impl SimConfig {
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads: Some(threads),
        }
    }

    /// A dedicated pool when a thread count is configured
    pub fn thread_pool(&self) -> Result<Option<ThreadPool>, ThreadPoolBuildError> {
        self.threads
            .map(|threads| {
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("rail-sim-{i}"))
                    .build()
            })
            .transpose()
    }

    /// Simulate `world` on the configured pool
    pub fn run(
        &self,
        world: &mut World,
    ) -> Result<Result<BigUint, Rejection>, ThreadPoolBuildError> {
        Ok(match self.thread_pool()? {
            Some(pool) => pool.install(|| world.simulate()),
            None => world.simulate(),
        })
    }
}
