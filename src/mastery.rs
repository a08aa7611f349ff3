use serde::{Deserialize, Serialize};

/// Assumed exposures per assignment when no vocabulary/repetition counts are
/// configured.
pub const DEFAULT_REQUIRED_EXPOSURES: u32 = 50;

/// Weighting of the mastery formula. The 70/20/10 split is a tuning choice,
/// so it is carried as a value rather than literals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MasteryWeights {
    pub accuracy_weight: f64,
    pub completion_points: u32,
    pub effort_cap: u32,
}

impl Default for MasteryWeights {
    fn default() -> Self {
        Self {
            accuracy_weight: 70.0,
            completion_points: 20,
            effort_cap: 10,
        }
    }
}

/// Aggregated session statistics, read-only input to the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionMetrics {
    pub sessions_count: u32,
    pub words_attempted: u32,
    pub words_correct: u32,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Grade {
    #[strum(serialize = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Inclusive lower bounds: 97 A+, 90 A, 80 B, 70 C, 60 D, else F.
    pub fn for_score(score: u32) -> Self {
        match score {
            97..=u32::MAX => Grade::APlus,
            90..=96 => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

/// Derived 0-100 quality metric. Recomputed on demand; never authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct MasteryScore {
    pub total: u32,
    pub accuracy_component: f64,
    pub completion_component: u32,
    pub effort_component: u32,
    pub grade: Grade,
}

/// Blend accuracy, completion, and session count into a bounded score.
pub fn compute_mastery_score(metrics: &SessionMetrics, weights: &MasteryWeights) -> MasteryScore {
    let accuracy_component = if metrics.words_attempted > 0 {
        (metrics.words_correct as f64 / metrics.words_attempted as f64) * weights.accuracy_weight
    } else {
        0.0
    };

    let completion_component = if metrics.is_completed {
        weights.completion_points
    } else {
        0
    };

    let effort_component = metrics.sessions_count.min(weights.effort_cap);

    let raw = accuracy_component + completion_component as f64 + effort_component as f64;
    let total = (raw.round() as i64).clamp(0, 100) as u32;

    MasteryScore {
        total,
        accuracy_component,
        completion_component,
        effort_component,
        grade: Grade::for_score(total),
    }
}

/// Linear progress percentage, deliberately decoupled from accuracy: effort
/// alone moves it forward, and only external completion pushes it to 100.
pub fn progress_percent(
    words_attempted: u32,
    vocabulary_count: Option<u32>,
    repetitions_required: Option<u32>,
    is_completed: bool,
) -> u32 {
    if is_completed {
        return 100;
    }

    let required = match (vocabulary_count, repetitions_required) {
        (Some(vocab), Some(reps)) if vocab * reps > 0 => vocab * reps,
        _ => DEFAULT_REQUIRED_EXPOSURES,
    };

    let pct = (words_attempted as f64 / required as f64 * 100.0).round() as u32;
    pct.min(99)
}
