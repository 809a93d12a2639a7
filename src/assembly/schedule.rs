use crate::core::entity::Entity;
use crate::core::errors::AssemblyError;
use crate::core::types::SimTime;
use rand::Rng;
use rand_distr::{Bernoulli, Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Generator for panel-block schedules when no recorded schedule is at hand.
///
/// Durations are normally distributed, rounded to one decimal and clamped to
/// `min_duration`; each step is skipped (duration zero) with `skip_probability`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSchedule {
    pub num_blocks: usize,
    pub num_stations: usize,
    pub mean_duration: SimTime,
    pub std_dev: SimTime,
    pub min_duration: SimTime,
    pub skip_probability: f64,
}

impl SyntheticSchedule {
    pub fn new(num_blocks: usize, num_stations: usize) -> Self {
        Self {
            num_blocks,
            num_stations,
            ..Self::default()
        }
    }

    pub fn with_durations(mut self, mean: SimTime, std_dev: SimTime) -> Self {
        self.mean_duration = mean;
        self.std_dev = std_dev;
        self
    }

    pub fn with_skip_probability(mut self, probability: f64) -> Self {
        self.skip_probability = probability;
        self
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Entity>, AssemblyError> {
        let durations = Normal::new(self.mean_duration, self.std_dev)
            .map_err(|e| AssemblyError::Configuration(format!("invalid duration distribution: {}", e)))?;
        let skip = Bernoulli::new(self.skip_probability)
            .map_err(|e| AssemblyError::Configuration(format!("invalid skip probability: {}", e)))?;

        let blocks = (0..self.num_blocks)
            .map(|i| {
                let table = (0..self.num_stations)
                    .map(|_| {
                        if skip.sample(rng) {
                            0.0
                        } else {
                            let d: SimTime = durations.sample(rng);
                            ((d * 10.0).round() / 10.0).max(self.min_duration)
                        }
                    })
                    .collect();
                Entity::new(format!("PB{:03}", i), table)
            })
            .collect();
        Ok(blocks)
    }
}

impl Default for SyntheticSchedule {
    fn default() -> Self {
        Self {
            num_blocks: 70,
            num_stations: 7,
            mean_duration: 4.0,
            std_dev: 1.5,
            min_duration: 0.5,
            skip_probability: 0.15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_blocks_fit_the_line() {
        let schedule = SyntheticSchedule::new(20, 4);
        let blocks = schedule.generate(&mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(blocks.len(), 20);
        assert_eq!(blocks[3].id(), "PB003");
        for block in &blocks {
            assert_eq!(block.num_steps(), 4);
            assert!(block
                .durations()
                .iter()
                .all(|d| *d == 0.0 || *d >= schedule.min_duration));
        }
    }

    #[test]
    fn test_generation_is_seeded() {
        let schedule = SyntheticSchedule::default();
        let a = schedule.generate(&mut StdRng::seed_from_u64(5)).unwrap();
        let b = schedule.generate(&mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_skip_probability_extremes() {
        let never = SyntheticSchedule::new(5, 3).with_skip_probability(0.0);
        let always = SyntheticSchedule::new(5, 3).with_skip_probability(1.0);
        let mut rng = StdRng::seed_from_u64(2);

        assert!(never.generate(&mut rng).unwrap().iter().all(|b| b.durations().iter().all(|d| *d > 0.0)));
        assert!(always.generate(&mut rng).unwrap().iter().all(|b| b.total_work() == 0.0));
        assert!(SyntheticSchedule::new(5, 3).with_skip_probability(1.5).generate(&mut rng).is_err());
        assert!(SyntheticSchedule::new(5, 3).with_durations(4.0, -1.0).generate(&mut rng).is_err());
    }
}
