use super::config::AssemblyConfig;
use super::environment::AssemblyEnv;
use super::policy::Policy;
use crate::core::config::ConcurrencyMode;
use crate::core::entity::Entity;
use crate::core::errors::AssemblyError;
use crate::core::types::SimTime;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scalar results of one finished episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub run_id: Uuid,
    pub seed: u64,
    pub policy: String,
    pub steps: usize,
    pub total_reward: f64,
    /// Realized lead time: last arrival at the sink
    pub lead_time: SimTime,
    /// Lead time predicted after the final admission
    pub predicted_lead_time: SimTime,
    /// Mean admission-to-completion time per block
    pub mean_block_lead_time: Option<SimTime>,
}

/// Aggregate over a batch of episodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub episodes: usize,
    pub mean_reward: f64,
    pub mean_lead_time: SimTime,
    pub best_lead_time: SimTime,
    pub worst_lead_time: SimTime,
}

impl EvaluationReport {
    pub fn from_summaries(summaries: &[EpisodeSummary]) -> Option<Self> {
        if summaries.is_empty() {
            return None;
        }
        let count = summaries.len() as f64;
        let lead_times = summaries.iter().map(|s| s.lead_time);
        Some(Self {
            episodes: summaries.len(),
            mean_reward: summaries.iter().map(|s| s.total_reward).sum::<f64>() / count,
            mean_lead_time: lead_times.clone().sum::<SimTime>() / count,
            best_lead_time: lead_times.clone().fold(SimTime::INFINITY, SimTime::min),
            worst_lead_time: lead_times.fold(SimTime::NEG_INFINITY, SimTime::max),
        })
    }
}

/// Play one full episode with `policy`, shuffling the backlog with `seed`
pub fn run_episode<P: Policy + ?Sized>(
    env: &mut AssemblyEnv,
    policy: &mut P,
    seed: u64,
) -> Result<EpisodeSummary, AssemblyError> {
    let mut state = env.reset_with_seed(seed)?;
    let mut total_reward = 0.0;
    let mut steps = 0;

    loop {
        let action = policy.select(env, &state)?;
        let outcome = env.step(action)?;
        total_reward += outcome.reward;
        steps += 1;
        state = outcome.state;
        if outcome.done {
            break;
        }
    }

    let sink = env.engine().sink();
    let summary = EpisodeSummary {
        run_id: env.engine().monitor().run_id(),
        seed,
        policy: policy.name().to_string(),
        steps,
        total_reward,
        lead_time: sink.last_arrival(),
        predicted_lead_time: env.lead_time(),
        mean_block_lead_time: sink.mean_lead_time(),
    };
    info!(
        "[Rollout] {} seed {}: lead time {:.3} (predicted {:.3}), reward {:.3}",
        summary.policy, seed, summary.lead_time, summary.predicted_lead_time, summary.total_reward
    );
    Ok(summary)
}

/// Run one episode per seed, each on its own environment.
///
/// Episodes share nothing, so with `ConcurrencyMode::Rayon` they run in parallel.
/// Summaries come back in the order of `seeds` either way.
pub fn evaluate<P, F>(
    config: &AssemblyConfig,
    backlog: &[Entity],
    seeds: &[u64],
    make_policy: F,
) -> Result<Vec<EpisodeSummary>, AssemblyError>
where
    P: Policy,
    F: Fn(u64) -> P + Sync,
{
    config.validate()?;
    let run = |seed: &u64| -> Result<EpisodeSummary, AssemblyError> {
        let mut env = AssemblyEnv::new(config.clone(), backlog.to_vec())?;
        let mut policy = make_policy(*seed);
        run_episode(&mut env, &mut policy, *seed)
    };

    match (config.concurrency_mode, config.thread_pool_size) {
        (ConcurrencyMode::Sequential, _) => seeds.iter().map(run).collect(),
        (ConcurrencyMode::Rayon, None) => seeds.par_iter().map(run).collect(),
        (ConcurrencyMode::Rayon, Some(threads)) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| AssemblyError::Configuration(format!("failed to build thread pool: {}", e)))?;
            pool.install(|| seeds.par_iter().map(run).collect())
        }
    }
}
