//! Conversion funnels over pre-aggregated step counts.
//!
//! Step order is whatever the caller supplies; nothing here sorts or
//! validates that later steps are smaller than earlier ones.

use serde::{Deserialize, Serialize};

use crate::math::safe_divide;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStepInput {
    pub step: String,
    pub started: u64,
    pub completed: u64,
    /// Mean seconds spent on the step.
    #[serde(default)]
    pub avg_time: f64,
}

impl FunnelStepInput {
    pub fn new(step: impl Into<String>, started: u64, completed: u64) -> Self {
        Self {
            step: step.into(),
            started,
            completed,
            avg_time: 0.0,
        }
    }

    pub fn with_avg_time(mut self, avg_time: f64) -> Self {
        self.avg_time = avg_time;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStep {
    pub step: String,
    pub started: u64,
    pub completed: u64,
    /// `(started - completed) / started`, within `[0, 1]`.
    pub drop_off_rate: f64,
    pub avg_time: f64,
    /// `completed` relative to the first step's `started`.
    pub conversion_rate_from_start: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelResults {
    pub total_entered: u64,
    pub total_converted: u64,
    pub final_conversion_rate: f64,
    pub steps: Vec<FunnelStep>,
}

/// Share of `started` that did not complete. `0.0` when nobody started or
/// when `completed` exceeds `started`.
pub fn drop_off_rate(started: u64, completed: u64) -> f64 {
    let dropped = started.saturating_sub(completed);
    safe_divide(dropped as f64, started as f64).clamp(0.0, 1.0)
}

pub fn calculate_funnel(steps: &[FunnelStepInput]) -> FunnelResults {
    let total_entered = steps.first().map(|step| step.started).unwrap_or(0);
    let total_converted = steps.last().map(|step| step.completed).unwrap_or(0);

    let steps: Vec<FunnelStep> = steps
        .iter()
        .map(|input| FunnelStep {
            step: input.step.clone(),
            started: input.started,
            completed: input.completed,
            drop_off_rate: drop_off_rate(input.started, input.completed),
            avg_time: input.avg_time,
            conversion_rate_from_start: safe_divide(input.completed as f64, total_entered as f64),
        })
        .collect();

    FunnelResults {
        total_entered,
        total_converted,
        final_conversion_rate: safe_divide(total_converted as f64, total_entered as f64),
        steps,
    }
}
