use super::errors::AssemblyError;
use super::types::{EntityId, SimTime};
use serde::{Deserialize, Serialize};

/// A panel block travelling down the line.
///
/// Carries one service duration per station and a cursor pointing at the next
/// processing step. A cursor equal to the number of steps means the block has
/// finished every station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    durations: Vec<SimTime>,
    #[serde(default)]
    step: usize,
    #[serde(default)]
    admitted_at: Option<SimTime>,
}

impl Entity {
    /// Create a block with its per-station duration table
    pub fn new(id: impl Into<EntityId>, durations: Vec<SimTime>) -> Self {
        Self {
            id: id.into(),
            durations,
            step: 0,
            admitted_at: None,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn durations(&self) -> &[SimTime] {
        &self.durations
    }

    pub fn num_steps(&self) -> usize {
        self.durations.len()
    }

    /// Index of the next processing step
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.durations.len()
    }

    /// Service time for a given processing step
    pub fn duration(&self, step: usize) -> Result<SimTime, AssemblyError> {
        self.durations
            .get(step)
            .copied()
            .ok_or_else(|| AssemblyError::OutOfSteps {
                entity: self.id.clone(),
                step,
                steps: self.durations.len(),
            })
    }

    /// Service time for the step the cursor points at
    pub fn current_duration(&self) -> Result<SimTime, AssemblyError> {
        self.duration(self.step)
    }

    /// Sum of all service times, ignoring blocking
    pub fn total_work(&self) -> SimTime {
        self.durations.iter().sum()
    }

    /// Move the cursor past the current step.
    ///
    /// Fails once the block has already completed its last step.
    pub fn advance(&mut self) -> Result<(), AssemblyError> {
        if self.is_finished() {
            return Err(AssemblyError::OutOfSteps {
                entity: self.id.clone(),
                step: self.step,
                steps: self.durations.len(),
            });
        }
        self.step += 1;
        Ok(())
    }

    /// Rewind to the first step and forget any admission time
    pub fn reset_progress(&mut self) {
        self.step = 0;
        self.admitted_at = None;
    }

    pub fn admitted_at(&self) -> Option<SimTime> {
        self.admitted_at
    }

    pub(crate) fn mark_admitted(&mut self, time: SimTime) {
        self.admitted_at = Some(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_lookup() {
        let block = Entity::new("A", vec![2.0, 0.0, 3.0]);
        assert_eq!(block.duration(0).unwrap(), 2.0);
        assert_eq!(block.duration(1).unwrap(), 0.0);
        assert_eq!(block.total_work(), 5.0);
        assert!(matches!(
            block.duration(3),
            Err(AssemblyError::OutOfSteps { step: 3, steps: 3, .. })
        ));
    }

    #[test]
    fn test_advance_until_finished() {
        let mut block = Entity::new("A", vec![1.0, 1.0]);
        block.advance().unwrap();
        assert_eq!(block.current_duration().unwrap(), 1.0);
        block.advance().unwrap();
        assert!(block.is_finished());

        let err = block.advance().unwrap_err();
        assert!(matches!(err, AssemblyError::OutOfSteps { step: 2, steps: 2, .. }));
        assert_eq!(err.to_string(), "block A has no processing step 2 (defines 2)");
        assert_eq!(block.step(), 2);
    }

    #[test]
    fn test_reset_progress() {
        let mut block = Entity::new("A", vec![1.0, 1.0]);
        block.advance().unwrap();
        block.mark_admitted(4.0);
        block.reset_progress();
        assert_eq!(block.step(), 0);
        assert_eq!(block.admitted_at(), None);
    }
}
