//! Dispatching rules that pick the next block from the queue.
//!
//! A learning agent plugs in through the same `Policy` trait; these rules are the
//! baselines it is compared against.

use super::environment::AssemblyEnv;
use crate::core::errors::AssemblyError;
use crate::core::types::SimTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait Policy {
    fn name(&self) -> &str;

    /// Choose an index into `env.queue()` given the current observation
    fn select(&mut self, env: &AssemblyEnv, state: &[SimTime]) -> Result<usize, AssemblyError>;
}

/// Always admit the head of the queue (the shuffled arrival order)
#[derive(Debug, Default, Clone)]
pub struct FirstInQueue;

impl Policy for FirstInQueue {
    fn name(&self) -> &str {
        "first_in_queue"
    }

    fn select(&mut self, env: &AssemblyEnv, _state: &[SimTime]) -> Result<usize, AssemblyError> {
        if env.queue_len() == 0 {
            return Err(AssemblyError::EmptyQueue);
        }
        Ok(0)
    }
}

/// Uniformly random admission, the exploration baseline
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn select(&mut self, env: &AssemblyEnv, _state: &[SimTime]) -> Result<usize, AssemblyError> {
        match env.queue_len() {
            0 => Err(AssemblyError::EmptyQueue),
            len => Ok(self.rng.gen_range(0..len)),
        }
    }
}

/// Admit the block with the least total work first
#[derive(Debug, Default, Clone)]
pub struct ShortestProcessingTime;

impl Policy for ShortestProcessingTime {
    fn name(&self) -> &str {
        "shortest_processing_time"
    }

    fn select(&mut self, env: &AssemblyEnv, _state: &[SimTime]) -> Result<usize, AssemblyError> {
        argmin(env.queue().iter().map(|block| Ok(block.total_work())))
    }
}

/// Greedy on the reward: admit the block whose predicted lead time grows least
#[derive(Debug, Default, Clone)]
pub struct MinForecast;

impl Policy for MinForecast {
    fn name(&self) -> &str {
        "min_forecast"
    }

    fn select(&mut self, env: &AssemblyEnv, _state: &[SimTime]) -> Result<usize, AssemblyError> {
        argmin((0..env.queue_len()).map(|i| env.preview(i).map(|forecast| forecast.completion())))
    }
}

/// Index of the smallest score, first one on ties
fn argmin<I>(scores: I) -> Result<usize, AssemblyError>
where
    I: Iterator<Item = Result<SimTime, AssemblyError>>,
{
    let mut best: Option<(usize, SimTime)> = None;
    for (i, score) in scores.enumerate() {
        let score = score?;
        if best.map_or(true, |(_, b)| score < b) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i).ok_or(AssemblyError::EmptyQueue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::config::AssemblyConfig;
    use crate::core::entity::Entity;

    fn env() -> AssemblyEnv {
        let blocks = vec![
            Entity::new("long", vec![5.0, 5.0]),
            Entity::new("short", vec![1.0, 0.0]),
            Entity::new("mid", vec![2.0, 2.0]),
        ];
        let mut env = AssemblyEnv::new(AssemblyConfig::new(2, 3), blocks).unwrap();
        env.reset_with_seed(0).unwrap();
        env
    }

    fn position(env: &AssemblyEnv, id: &str) -> usize {
        env.queue().iter().position(|b| b.id() == id).unwrap()
    }

    #[test]
    fn test_shortest_processing_time_picks_least_work() {
        let env = env();
        let state = env.state();
        assert_eq!(ShortestProcessingTime.select(&env, &state).unwrap(), position(&env, "short"));
    }

    #[test]
    fn test_min_forecast_picks_smallest_completion() {
        let env = env();
        let state = env.state();
        assert_eq!(MinForecast.select(&env, &state).unwrap(), position(&env, "short"));
    }

    #[test]
    fn test_random_policy_stays_in_queue_and_is_seeded() {
        let env = env();
        let state = env.state();
        let mut a = RandomPolicy::new(3);
        let mut b = RandomPolicy::new(3);
        for _ in 0..20 {
            let pick = a.select(&env, &state).unwrap();
            assert!(pick < env.queue_len());
            assert_eq!(pick, b.select(&env, &state).unwrap());
        }
    }

    #[test]
    fn test_argmin_prefers_first_on_ties() {
        let scores = vec![Ok(2.0), Ok(1.0), Ok(1.0)];
        assert_eq!(argmin(scores.into_iter()).unwrap(), 1);
        assert_eq!(argmin(std::iter::empty()).unwrap_err(), AssemblyError::EmptyQueue);
    }
}
