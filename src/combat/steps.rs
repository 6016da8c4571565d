//! Combo step table.
//!
//! Each step of a combo carries its own damage and hit sphere geometry.
//! Steps are authored once and looked up by 1-based index, the same index the
//! animator reports when it confirms a step.

use serde::{Deserialize, Serialize};

/// A single attack in a combo chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboStep {
    pub damage: i32,
    pub hit_radius: f32,
    /// Distance along the attacker's forward axis
    pub hit_forward_offset: f32,
    /// Height above the attacker's origin
    pub hit_height: f32,
}

impl ComboStep {
    pub const fn new(damage: i32, hit_radius: f32, hit_forward_offset: f32, hit_height: f32) -> Self {
        Self {
            damage,
            hit_radius,
            hit_forward_offset,
            hit_height,
        }
    }
}

/// Ordered, immutable list of combo steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComboTable {
    steps: Vec<ComboStep>,
}

impl ComboTable {
    pub fn new(steps: Vec<ComboStep>) -> Self {
        Self { steps }
    }

    pub fn step_count(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step by 1-based index; `None` for 0 or anything past the last step
    pub fn get(&self, step: u32) -> Option<&ComboStep> {
        if step == 0 {
            return None;
        }
        self.steps.get(step as usize - 1)
    }

    /// Clamp an animator-reported index into `1..=step_count` (0 for an empty table)
    pub fn clamp_step(&self, step: u32) -> u32 {
        if self.steps.is_empty() {
            return 0;
        }
        step.clamp(1, self.step_count())
    }

    pub fn steps(&self) -> &[ComboStep] {
        &self.steps
    }
}

impl Default for ComboTable {
    fn default() -> Self {
        Self::new(vec![
            ComboStep::new(1, 0.35, 0.90, 1.0),
            ComboStep::new(1, 0.40, 0.95, 1.0),
            ComboStep::new(2, 0.45, 1.05, 1.0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_has_three_steps() {
        let table = ComboTable::default();
        assert_eq!(table.step_count(), 3);
        assert_eq!(table.get(3).unwrap().damage, 2, "Finisher should hit harder");
    }

    #[test]
    fn test_lookup_is_one_based() {
        let table = ComboTable::default();
        assert!(table.get(0).is_none());
        assert!(table.get(1).is_some());
        assert!(table.get(4).is_none());
    }

    #[test]
    fn test_reach_grows_along_the_chain() {
        let table = ComboTable::default();
        let steps = table.steps();
        assert!(steps[0].hit_forward_offset < steps[2].hit_forward_offset);
        assert!(steps[0].hit_radius < steps[2].hit_radius);
    }

    #[test]
    fn test_clamp_step() {
        let table = ComboTable::default();
        assert_eq!(table.clamp_step(0), 1);
        assert_eq!(table.clamp_step(2), 2);
        assert_eq!(table.clamp_step(9), 3);
        assert_eq!(ComboTable::new(Vec::new()).clamp_step(5), 0);
    }

    #[test]
    fn test_table_serializes_as_plain_list() {
        let table = ComboTable::new(vec![ComboStep::new(4, 0.5, 1.0, 1.2)]);
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.starts_with('['), "Table should serialize as a list: {json}");
    }
}
