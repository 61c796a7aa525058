use crate::{AgentId, SplitMix64};

/// One external step supplied by the host.
///
/// `time_seconds` is the host clock at this tick; time-based decorators
/// (cooldowns, time limits, service intervals) read it instead of summing
/// `dt_seconds` themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
    pub time_seconds: f64,
    pub seed: u64,
}

impl TickContext {
    /// Fixed-step context: tick `tick` at `tick * dt_seconds`.
    pub fn fixed(tick: u64, dt_seconds: f32) -> Self {
        Self {
            tick,
            dt_seconds,
            time_seconds: tick as f64 * dt_seconds as f64,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn rng_for_agent<A: AgentId>(&self, agent: A, stream: u64) -> SplitMix64 {
        SplitMix64::for_stream(self.seed, agent.stable_id(), stream)
    }
}
