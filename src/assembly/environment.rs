use super::config::AssemblyConfig;
use super::prediction::{predict_lead_time, LeadTimeForecast};
use crate::core::entity::Entity;
use crate::core::errors::AssemblyError;
use crate::core::simulation_engine::SimulationEngine;
use crate::core::types::SimTime;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Result of one `step`
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub state: Vec<SimTime>,
    pub reward: f64,
    pub done: bool,
}

/// Episodic sequencing environment over one production line.
///
/// Each action picks which queued block enters the first station next. The
/// environment then advances the line until that block has left the first station
/// and rewards the action with the growth of the predicted lead time.
pub struct AssemblyEnv {
    config: AssemblyConfig,
    pristine_backlog: Vec<Entity>,
    backlog: VecDeque<Entity>,
    queue: Vec<Entity>,
    engine: SimulationEngine,
    forecast: LeadTimeForecast,
    lead_time: SimTime,
    time: SimTime,
    tau: SimTime,
    blocks_put: u64,
    rng: StdRng,
}

impl AssemblyEnv {
    /// Build an environment over `inbound_blocks`. Call `reset` before the first `step`.
    pub fn new(config: AssemblyConfig, inbound_blocks: Vec<Entity>) -> Result<Self, AssemblyError> {
        config.validate()?;
        config.validate_backlog(&inbound_blocks)?;

        let engine = SimulationEngine::new(&config.line)?;
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(
            "[Assembly] {} stations, queue of {}, {} blocks",
            config.num_stations(),
            config.queue_capacity,
            inbound_blocks.len()
        );

        Ok(Self {
            forecast: LeadTimeForecast::zeros(config.num_stations()),
            pristine_backlog: inbound_blocks,
            backlog: VecDeque::new(),
            queue: Vec::with_capacity(config.queue_capacity),
            engine,
            lead_time: 0.0,
            time: 0.0,
            tau: 0.0,
            blocks_put: 0,
            rng,
            config,
        })
    }

    /// Start a new episode using the environment's own generator for the shuffle
    pub fn reset(&mut self) -> Result<Vec<SimTime>, AssemblyError> {
        let mut rng = std::mem::replace(&mut self.rng, StdRng::seed_from_u64(0));
        let state = self.reset_with(&mut rng);
        self.rng = rng;
        state
    }

    /// Start a new episode with a freshly seeded shuffle
    pub fn reset_with_seed(&mut self, seed: u64) -> Result<Vec<SimTime>, AssemblyError> {
        self.reset_with(&mut StdRng::seed_from_u64(seed))
    }

    /// Start a new episode, shuffling the backlog with `rng`.
    ///
    /// Rebuilds the line, restores every block from the pristine backlog and refills
    /// the queue. Any episode in progress is abandoned.
    pub fn reset_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<SimTime>, AssemblyError> {
        self.engine = SimulationEngine::new(&self.config.line)?;

        let mut backlog = self.pristine_backlog.clone();
        for block in &mut backlog {
            block.reset_progress();
        }
        backlog.shuffle(rng);
        self.backlog = backlog.into();
        self.queue.clear();
        self.refill_queue();

        self.forecast = LeadTimeForecast::zeros(self.config.num_stations());
        self.lead_time = 0.0;
        self.time = 0.0;
        self.tau = 0.0;
        self.blocks_put = 0;

        debug!(
            "[Assembly] Reset run {} with queue {:?}",
            self.engine.monitor().run_id(),
            self.queue.iter().map(Entity::id).collect::<Vec<_>>()
        );
        Ok(self.state())
    }

    /// Admit `queue[action]` to the line and advance the simulation.
    ///
    /// Invalid actions are rejected before anything changes.
    pub fn step(&mut self, action: usize) -> Result<StepOutcome, AssemblyError> {
        if self.queue.is_empty() {
            return Err(AssemblyError::EmptyQueue);
        }
        if action >= self.queue.len() {
            return Err(AssemblyError::InvalidAction {
                action,
                queue_len: self.queue.len(),
            });
        }

        let block = self.queue.remove(action);
        let durations = block.durations().to_vec();
        if let Some(refused) = self.engine.inject(block)? {
            return Err(AssemblyError::invariant(format!(
                "first station refused block {} although every earlier block had left it",
                refused.id()
            )));
        }
        self.blocks_put += 1;

        let target = self.blocks_put;
        self.engine.run_until(|engine| engine.stations()[0].parts_sent() == target)?;
        self.engine.drain_current_instant()?;

        self.forecast = predict_lead_time(&durations, &self.forecast)?;
        let done = self.blocks_put == self.num_blocks() as u64;
        self.refill_queue();

        let predicted = self.forecast.completion();
        let reward = predicted - self.lead_time;
        let now = self.engine.now();
        self.lead_time = predicted;
        self.tau = now - self.time;
        self.time = now;
        let state = self.state();

        debug!(
            "[Assembly] Step {} t={:.3} predicted lead time {:.3} reward {:.3}",
            self.blocks_put, now, predicted, reward
        );

        if done {
            let finished_at = self.engine.run()?;
            info!(
                "[Assembly] Episode finished: {} blocks completed at t={:.3} (predicted {:.3})",
                self.engine.sink().parts_received(),
                finished_at,
                predicted
            );
        }

        Ok(StepOutcome { state, reward, done })
    }

    /// Predictions that would follow from admitting `queue[index]` next.
    /// Leaves the episode untouched.
    pub fn preview(&self, index: usize) -> Result<LeadTimeForecast, AssemblyError> {
        let block = self.queue.get(index).ok_or(AssemblyError::InvalidAction {
            action: index,
            queue_len: self.queue.len(),
        })?;
        predict_lead_time(block.durations(), &self.forecast)
    }

    /// Observation vector: per-station gap between predicted departure and the
    /// current time, followed by the duration table of every queue slot (zero
    /// padded for empty slots)
    pub fn state(&self) -> Vec<SimTime> {
        let n = self.config.num_stations();
        let mut state = vec![0.0; self.config.state_size()];

        for (gap, predicted) in state[..n].iter_mut().zip(self.forecast.part_transfers()) {
            *gap = predicted - self.time;
        }
        for (row, block) in state[n..].chunks_mut(n).zip(&self.queue) {
            row.copy_from_slice(block.durations());
        }
        state
    }

    fn refill_queue(&mut self) {
        while self.queue.len() < self.config.queue_capacity {
            match self.backlog.pop_front() {
                Some(block) => self.queue.push(block),
                None => break,
            }
        }
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    pub fn queue(&self) -> &[Entity] {
        &self.queue
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.engine.now()
    }

    /// Simulated time that passed during the last step
    pub fn tau(&self) -> SimTime {
        self.tau
    }

    /// Predicted lead time after the last admission
    pub fn lead_time(&self) -> SimTime {
        self.lead_time
    }

    pub fn forecast(&self) -> &LeadTimeForecast {
        &self.forecast
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn state_size(&self) -> usize {
        self.config.state_size()
    }

    pub fn action_size(&self) -> usize {
        self.config.action_size()
    }

    pub fn num_blocks(&self) -> usize {
        self.pristine_backlog.len()
    }

    pub fn blocks_put(&self) -> u64 {
        self.blocks_put
    }

    /// Blocks not yet admitted, queued or still in the backlog
    pub fn blocks_remaining(&self) -> usize {
        self.queue.len() + self.backlog.len()
    }

    pub fn is_done(&self) -> bool {
        self.blocks_put == self.num_blocks() as u64
    }
}
