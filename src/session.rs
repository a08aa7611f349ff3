use crate::battle::Outcome;
use crate::profile::{AttemptRecord, ProfileDb};
use crate::question::Question;
use chrono::Local;

/// Result summary shown after a battle.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub attempted: u32,
    pub correct: u32,
    pub accuracy: f64,
    pub mean_response_ms: f64,
    pub response_std_dev_ms: f64,
}

/// Collects the attempts of one play session before they are flushed to the
/// profile store in a single batch.
#[derive(Debug)]
pub struct DuelSession {
    pub assignment: String,
    pub session_id: String,
    attempts: Vec<AttemptRecord>,
}

impl DuelSession {
    pub fn new(assignment: &str) -> Self {
        let session_id = format!("{}-{}", assignment, Local::now().format("%Y%m%d%H%M%S%3f"));
        Self {
            assignment: assignment.to_string(),
            session_id,
            attempts: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        question: &Question,
        answer: &str,
        outcome: Outcome,
        response_time_ms: u64,
    ) {
        self.attempts.push(AttemptRecord {
            assignment: self.assignment.clone(),
            session_id: self.session_id.clone(),
            infinitive: question.infinitive.clone(),
            tense: question.tense.clone(),
            subject: question.subject.clone(),
            answer: answer.to_string(),
            was_correct: outcome == Outcome::Correct,
            response_time_ms,
            timestamp: Local::now(),
        });
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    pub fn summary(&self) -> SessionSummary {
        let attempted = self.attempts.len() as u32;
        let correct = self.attempts.iter().filter(|a| a.was_correct).count() as u32;
        let accuracy = if attempted > 0 {
            (correct as f64 / attempted as f64) * 100.0
        } else {
            0.0
        };

        let times: Vec<f64> = self
            .attempts
            .iter()
            .map(|a| a.response_time_ms as f64)
            .collect();

        SessionSummary {
            attempted,
            correct,
            accuracy,
            mean_response_ms: mean(&times).unwrap_or(0.0),
            response_std_dev_ms: std_dev(&times).unwrap_or(0.0),
        }
    }

    /// Persist all collected attempts in one transaction.
    pub fn flush(&self, db: &mut ProfileDb) -> rusqlite::Result<()> {
        db.record_attempts_batch(&self.attempts)
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    match data.len() {
        positive if positive > 0 => Some(sum / positive as f64),
        _ => None,
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;
                    diff * diff
                })
                .sum::<f64>()
                / count as f64;
            Some(variance.sqrt())
        }
        _ => None,
    }
}
