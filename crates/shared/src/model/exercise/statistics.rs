//! Per exercise statistics derived from a user's logs. Nothing here is
//! stored; everything is recomputed on request.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{model::ExerciseLog, types::ExerciseId};

/// Estimates the weight that could be lifted for a single rep from a set of
/// `reps` at `weight_g`. Implementations must be deterministic and monotonic
/// in both arguments, and return 0 when either is 0.
pub trait OneRepMaxFormula: fmt::Debug + Send + Sync {
    fn name(&self) -> FormulaName;
    fn estimate(&self, weight_g: u32, reps: u32) -> u32;
}

/// `w * (1 + r / 30)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Epley;

impl OneRepMaxFormula for Epley {
    fn name(&self) -> FormulaName {
        FormulaName::Epley
    }

    fn estimate(&self, weight_g: u32, reps: u32) -> u32 {
        match (weight_g, reps) {
            (0, _) | (_, 0) => 0,
            (w, 1) => w,
            (w, r) => (f64::from(w) * (1.0 + f64::from(r) / 30.0)).round() as u32,
        }
    }
}

/// `w * r^0.1`
#[derive(Debug, Clone, Copy, Default)]
pub struct Lombardi;

impl OneRepMaxFormula for Lombardi {
    fn name(&self) -> FormulaName {
        FormulaName::Lombardi
    }

    fn estimate(&self, weight_g: u32, reps: u32) -> u32 {
        match (weight_g, reps) {
            (0, _) | (_, 0) => 0,
            (w, r) => (f64::from(w) * f64::from(r).powf(0.1)).round() as u32,
        }
    }
}

/// Selects a formula by name, for configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaName {
    #[default]
    Epley,
    Lombardi,
}

impl FormulaName {
    pub fn formula(&self) -> &'static dyn OneRepMaxFormula {
        match self {
            FormulaName::Epley => &Epley,
            FormulaName::Lombardi => &Lombardi,
        }
    }
}

impl fmt::Display for FormulaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaName::Epley => f.write_str("epley"),
            FormulaName::Lombardi => f.write_str("lombardi"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown one rep max formula {0:?}, expected epley or lombardi")]
pub struct UnknownFormula(String);

impl FromStr for FormulaName {
    type Err = UnknownFormula;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "epley" => Ok(FormulaName::Epley),
            "lombardi" => Ok(FormulaName::Lombardi),
            _ => Err(UnknownFormula(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseStatistics {
    pub exercise: ExerciseId,
    pub formula: FormulaName,
    pub estimated_one_rep_max_g: u32,
    pub max_weight_g: u32,
    pub max_reps: u32,
    pub max_seconds: u32,
    pub max_distance_m: u32,
    pub logged_sets: u64,
}

impl ExerciseStatistics {
    /// Fold every set of `logs` into maxima. No logs gives all zeros.
    pub fn aggregate(
        exercise: ExerciseId,
        logs: &[ExerciseLog],
        formula: &dyn OneRepMaxFormula,
    ) -> Self {
        let empty = Self {
            exercise,
            formula: formula.name(),
            estimated_one_rep_max_g: 0,
            max_weight_g: 0,
            max_reps: 0,
            max_seconds: 0,
            max_distance_m: 0,
            logged_sets: 0,
        };

        logs.iter()
            .flat_map(|log| log.sets.iter())
            .fold(empty, |mut stats, set| {
                let weight = set.weight_g.unwrap_or(0);
                let reps = set.reps.unwrap_or(0);
                stats.estimated_one_rep_max_g =
                    stats.estimated_one_rep_max_g.max(formula.estimate(weight, reps));
                stats.max_weight_g = stats.max_weight_g.max(weight);
                stats.max_reps = stats.max_reps.max(reps);
                stats.max_seconds = stats.max_seconds.max(set.seconds.unwrap_or(0));
                stats.max_distance_m = stats.max_distance_m.max(set.distance_m.unwrap_or(0));
                stats.logged_sets += 1;
                stats
            })
    }
}
