use serde::{Deserialize, Serialize};

/// Cumulative experience required to reach each level (index 0 = level 1).
/// Levels past the table stay at the cap.
pub const LEVEL_EXPERIENCE: [u32; 10] = [0, 100, 250, 450, 700, 1000, 1350, 1700, 2500, 3500];

/// Persistent player progression, loaded at session start and saved on every
/// mutation by the profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlayerStats {
    pub experience: u32,
    pub wins: u32,
    pub losses: u32,
    pub answers_total: u32,
    pub answers_correct: u32,
    pub current_win_streak: u32,
    pub longest_win_streak: u32,
}

impl PlayerStats {
    /// Level derived from the experience threshold table, 1-based.
    pub fn level(&self) -> u32 {
        LEVEL_EXPERIENCE
            .iter()
            .rposition(|threshold| self.experience >= *threshold)
            .map(|idx| idx as u32 + 1)
            .unwrap_or(1)
    }

    /// Experience still needed for the next level, or `None` at the cap.
    pub fn experience_to_next_level(&self) -> Option<u32> {
        LEVEL_EXPERIENCE
            .get(self.level() as usize)
            .map(|next| next - self.experience)
    }

    /// Lifetime answer accuracy in percent.
    pub fn accuracy(&self) -> f64 {
        if self.answers_total == 0 {
            0.0
        } else {
            (self.answers_correct as f64 / self.answers_total as f64) * 100.0
        }
    }

    pub fn record_answer(&mut self, correct: bool) {
        self.answers_total += 1;
        if correct {
            self.answers_correct += 1;
        }
    }

    /// Apply a finished battle: win/loss counters, streaks, earned XP.
    pub fn record_battle(&mut self, won: bool, experience_gained: u32) {
        self.experience += experience_gained;
        if won {
            self.wins += 1;
            self.current_win_streak += 1;
            self.longest_win_streak = self.longest_win_streak.max(self.current_win_streak);
        } else {
            self.losses += 1;
            self.current_win_streak = 0;
        }
    }
}
