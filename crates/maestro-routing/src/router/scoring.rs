//! Weighted scoring nodes.

use maestro_core::{Priority, TaskKind};
use serde::{Deserialize, Serialize};

use crate::catalog::Model;

/// Weight of the task fitness node. Identical for every priority mode.
pub const TASK_FIT_WEIGHT: f64 = 0.3;

/// Quality, speed and cost weights for one priority mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    /// Weight of the quality node
    pub quality: f64,
    /// Weight of the speed node
    pub speed: f64,
    /// Weight of the cost node
    pub cost: f64,
}

impl WeightProfile {
    /// Fixed weight table keyed by priority mode.
    #[must_use]
    pub const fn for_priority(priority: Priority) -> Self {
        let (quality, speed, cost) = match priority {
            Priority::Speed => (0.3, 0.5, 0.2),
            Priority::Quality => (0.55, 0.25, 0.2),
            Priority::Cost => (0.25, 0.25, 0.5),
            Priority::Balanced => (0.4, 0.35, 0.25),
        };
        Self {
            quality,
            speed,
            cost,
        }
    }
}

/// A single scoring dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Dimension name (`task_fit`, `quality`, `speed` or `cost`)
    pub name: String,
    /// Weight applied to the normalized score
    pub weight: f64,
    /// Rating divided by ten, in `[0, 1]`
    pub score: f64,
    /// Human-readable justification
    pub reason: String,
}

impl Node {
    fn new(name: &str, weight: f64, rating: u8, reason: String) -> Self {
        Self {
            name: name.to_owned(),
            weight,
            score: f64::from(rating) / 10.0,
            reason,
        }
    }

    /// This node's share of the aggregate score.
    #[must_use]
    pub fn contribution(&self) -> f64 {
        self.weight * self.score
    }
}

/// Builds the four scoring nodes for a model.
pub(super) fn score_nodes(
    model: &Model,
    task: TaskKind,
    priority: Priority,
    default_fit: u8,
) -> Vec<Node> {
    let profile = WeightProfile::for_priority(priority);
    let fit = model.fit_for(task, default_fit);

    vec![
        Node::new("task_fit", TASK_FIT_WEIGHT, fit, format!("{task} fitness {fit}/10")),
        Node::new(
            "quality",
            profile.quality,
            model.quality,
            format!("quality {}/10", model.quality),
        ),
        Node::new(
            "speed",
            profile.speed,
            model.speed,
            format!("speed {}/10", model.speed),
        ),
        Node::new(
            "cost",
            profile.cost,
            model.cost,
            format!("cost efficiency {}/10", model.cost),
        ),
    ]
}

/// Compact justification, e.g. `fit=8 q=7 s=9 c=9`.
pub(super) fn why(model: &Model, task: TaskKind, default_fit: u8) -> String {
    format!(
        "fit={} q={} s={} c={}",
        model.fit_for(task, default_fit),
        model.quality,
        model.speed,
        model.cost
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_never_touch_task_fit() {
        let model = Model::new("m", "p", 1).with_fit(TaskKind::Code, 9);
        for priority in [
            Priority::Speed,
            Priority::Quality,
            Priority::Cost,
            Priority::Balanced,
        ] {
            let nodes = score_nodes(&model, TaskKind::Code, priority, 6);
            assert_eq!(nodes.len(), 4);
            assert_eq!(nodes[0].name, "task_fit");
            assert!((nodes[0].weight - TASK_FIT_WEIGHT).abs() < f64::EPSILON);
            assert!((nodes[0].score - 0.9).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_profile_weights_sum_to_one() {
        for priority in [
            Priority::Speed,
            Priority::Quality,
            Priority::Cost,
            Priority::Balanced,
        ] {
            let profile = WeightProfile::for_priority(priority);
            assert!((profile.quality + profile.speed + profile.cost - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_contribution_and_why() {
        let model = Model::new("m", "p", 1).with_ratings(7, 9, 9);
        let nodes = score_nodes(&model, TaskKind::Extract, Priority::Speed, 6);
        assert!((nodes[2].contribution() - 0.45).abs() < 1e-12);
        assert_eq!(why(&model, TaskKind::Extract, 6), "fit=6 q=7 s=9 c=9");
    }
}
