use crate::language::Opponent;
use crate::player::PlayerStats;
use crate::question::{Question, QuestionGenerator};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PLAYER_MAX_HEALTH: u32 = 100;

/// Only the most recent entries are kept for display.
pub const BATTLE_LOG_CAP: usize = 10;

/// Balance constants for damage rolls and experience awards. These are
/// product-tuning values, so they ride in the config file instead of being
/// hard-coded at the call sites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BattleTuning {
    pub correct_damage_min: u32,
    pub correct_damage_max: u32,
    pub incorrect_damage_min: u32,
    pub incorrect_damage_max: u32,
    pub answer_experience: u32,
    pub victory_experience: u32,
}

impl Default for BattleTuning {
    fn default() -> Self {
        Self {
            correct_damage_min: 15,
            correct_damage_max: 40,
            incorrect_damage_min: 10,
            incorrect_damage_max: 30,
            answer_experience: 10,
            victory_experience: 50,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum BattlePhase {
    NotStarted,
    InProgress,
    Won,
    Lost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// What a single submitted answer did, for the UI and the attempt log.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub outcome: Outcome,
    pub damage: u32,
    pub correct_answer: String,
}

#[derive(Debug, Error)]
pub enum BattleError {
    #[error("opponent must have positive max health")]
    InvalidOpponent,
    #[error(transparent)]
    Question(#[from] crate::question::QuestionError),
}

/// Mutable per-battle state. Created on start, kept as a terminal snapshot
/// for the results screen until `reset`.
#[derive(Debug, Clone)]
pub struct BattleState {
    pub phase: BattlePhase,
    pub opponent: Option<Opponent>,
    pub player_health: u32,
    pub opponent_health: u32,
    pub current_question: Option<Question>,
    pub log: Vec<String>,
    pub experience_gained: u32,
    settled: bool,
}

impl Default for BattleState {
    fn default() -> Self {
        Self {
            phase: BattlePhase::NotStarted,
            opponent: None,
            player_health: PLAYER_MAX_HEALTH,
            opponent_health: 0,
            current_question: None,
            log: Vec::new(),
            experience_gained: 0,
            settled: false,
        }
    }
}

/// Drives one battle: answer resolution, damage, phase transitions.
pub struct Battle {
    pub tuning: BattleTuning,
    generator: QuestionGenerator,
    pub state: BattleState,
}

impl Battle {
    pub fn new(generator: QuestionGenerator, tuning: BattleTuning) -> Self {
        Self {
            tuning,
            generator,
            state: BattleState::default(),
        }
    }

    pub fn generator(&self) -> &QuestionGenerator {
        &self.generator
    }

    /// Initialize health and log, generate the first question, and enter
    /// `InProgress`.
    pub fn start(&mut self, opponent: Opponent, rng: &mut impl Rng) -> Result<(), BattleError> {
        if opponent.max_health == 0 {
            return Err(BattleError::InvalidOpponent);
        }

        let question = self.generator.generate(rng)?;
        self.state = BattleState {
            phase: BattlePhase::InProgress,
            player_health: PLAYER_MAX_HEALTH,
            opponent_health: opponent.max_health,
            current_question: Some(question),
            log: Vec::new(),
            experience_gained: 0,
            opponent: Some(opponent),
            settled: false,
        };

        let name = self.opponent_name();
        self.push_log(format!("{name} enters the arena!"));
        Ok(())
    }

    /// Resolve a submitted answer against the current question.
    ///
    /// Returns `None` when there is nothing to resolve (battle not in
    /// progress, or no active question). Duplicate UI events land here, so
    /// the wrong-phase case is a silent no-op rather than an error.
    pub fn submit_answer(&mut self, answer: &str, rng: &mut impl Rng) -> Option<AnswerResult> {
        if self.state.phase != BattlePhase::InProgress {
            return None;
        }
        let question = self.state.current_question.take()?;

        let result = if answer == question.correct_answer {
            let damage = rng.gen_range(self.tuning.correct_damage_min..=self.tuning.correct_damage_max);
            self.state.opponent_health = self.state.opponent_health.saturating_sub(damage);
            self.state.experience_gained += self.tuning.answer_experience;

            let name = self.opponent_name();
            self.push_log(format!(
                "Correct! \"{answer}\" hits {name} for {damage} damage."
            ));

            if self.state.opponent_health == 0 {
                self.state.phase = BattlePhase::Won;
                self.state.experience_gained += self.tuning.victory_experience;
                self.push_log(format!("{name} is defeated!"));
            }

            AnswerResult {
                outcome: Outcome::Correct,
                damage,
                correct_answer: question.correct_answer,
            }
        } else {
            let damage =
                rng.gen_range(self.tuning.incorrect_damage_min..=self.tuning.incorrect_damage_max);
            self.state.player_health = self.state.player_health.saturating_sub(damage);

            self.push_log(format!(
                "Wrong! The correct answer was \"{}\". You take {damage} damage.",
                question.correct_answer
            ));

            if self.state.player_health == 0 {
                self.state.phase = BattlePhase::Lost;
                self.push_log("You collapse. The battle is lost.".to_string());
            }

            AnswerResult {
                outcome: Outcome::Incorrect,
                damage,
                correct_answer: question.correct_answer,
            }
        };

        if self.state.phase == BattlePhase::InProgress {
            match self.generator.generate(rng) {
                Ok(next) => self.state.current_question = Some(next),
                Err(_) => {
                    // Out of challenges counts as a win, matching the game's
                    // "all challenges complete" behavior.
                    self.state.opponent_health = 0;
                    self.state.phase = BattlePhase::Won;
                    self.state.experience_gained += self.tuning.victory_experience;
                    self.push_log("No challenges left. Victory by exhaustion!".to_string());
                }
            }
        }

        Some(result)
    }

    /// The answer timer expired without input. Modeled as an incorrect empty
    /// answer; the library itself keeps no timer.
    pub fn time_expired(&mut self, rng: &mut impl Rng) -> Option<AnswerResult> {
        self.submit_answer("", rng)
    }

    /// Apply the terminal result to persistent player stats. Idempotent per
    /// battle so duplicate UI events cannot double-count.
    pub fn finish(&mut self, stats: &mut PlayerStats) {
        if self.state.settled {
            return;
        }
        let won = match self.state.phase {
            BattlePhase::Won => true,
            BattlePhase::Lost => false,
            _ => return,
        };
        stats.record_battle(won, self.state.experience_gained);
        self.state.settled = true;
    }

    /// Drop the terminal snapshot and return to `NotStarted`.
    pub fn reset(&mut self) {
        self.state = BattleState::default();
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state.phase, BattlePhase::Won | BattlePhase::Lost)
    }

    fn opponent_name(&self) -> String {
        self.state
            .opponent
            .as_ref()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "The opponent".to_string())
    }

    fn push_log(&mut self, entry: String) {
        if self.state.log.len() == BATTLE_LOG_CAP {
            self.state.log.remove(0);
        }
        self.state.log.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{LeagueTable, VerbPool};
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_battle(tuning: BattleTuning) -> Battle {
        let pool = VerbPool::load("spanish");
        let league = LeagueTable::load().by_id("bronze").unwrap().clone();
        Battle::new(QuestionGenerator::new(pool, league), tuning)
    }

    fn test_opponent(max_health: u32) -> Opponent {
        Opponent {
            id: "dummy".to_string(),
            name: "Dummy".to_string(),
            max_health,
            difficulty_tier: 1,
        }
    }

    /// Tuning with collapsed damage ranges so outcomes are deterministic.
    fn fixed_tuning(correct: u32, incorrect: u32) -> BattleTuning {
        BattleTuning {
            correct_damage_min: correct,
            correct_damage_max: correct,
            incorrect_damage_min: incorrect,
            incorrect_damage_max: incorrect,
            ..BattleTuning::default()
        }
    }

    #[test]
    fn test_start_initializes_state() {
        let mut battle = test_battle(BattleTuning::default());
        let mut rng = StdRng::seed_from_u64(1);

        battle.start(test_opponent(80), &mut rng).unwrap();

        assert_eq!(battle.state.phase, BattlePhase::InProgress);
        assert_eq!(battle.state.player_health, PLAYER_MAX_HEALTH);
        assert_eq!(battle.state.opponent_health, 80);
        assert!(battle.state.current_question.is_some());
        assert_eq!(battle.state.log.len(), 1);
    }

    #[test]
    fn test_start_rejects_zero_health_opponent() {
        let mut battle = test_battle(BattleTuning::default());
        let mut rng = StdRng::seed_from_u64(1);

        assert_matches!(
            battle.start(test_opponent(0), &mut rng),
            Err(BattleError::InvalidOpponent)
        );
        assert_eq!(battle.state.phase, BattlePhase::NotStarted);
    }

    #[test]
    fn test_correct_answer_damages_opponent_within_range() {
        let mut battle = test_battle(BattleTuning::default());
        let mut rng = StdRng::seed_from_u64(2);
        battle.start(test_opponent(1000), &mut rng).unwrap();

        for _ in 0..20 {
            let before = battle.state.opponent_health;
            let answer = battle
                .state
                .current_question
                .as_ref()
                .unwrap()
                .correct_answer
                .clone();
            let result = battle.submit_answer(&answer, &mut rng).unwrap();

            assert_eq!(result.outcome, Outcome::Correct);
            assert!((15..=40).contains(&result.damage));
            assert!(battle.state.opponent_health < before);
            assert_eq!(battle.state.player_health, PLAYER_MAX_HEALTH);
            if battle.state.phase != BattlePhase::InProgress {
                break;
            }
        }
    }

    #[test]
    fn test_incorrect_answer_damages_player_and_reveals_correct() {
        let mut battle = test_battle(BattleTuning::default());
        let mut rng = StdRng::seed_from_u64(3);
        battle.start(test_opponent(100), &mut rng).unwrap();

        let expected = battle
            .state
            .current_question
            .as_ref()
            .unwrap()
            .correct_answer
            .clone();
        let result = battle.submit_answer("definitely wrong", &mut rng).unwrap();

        assert_eq!(result.outcome, Outcome::Incorrect);
        assert!((10..=30).contains(&result.damage));
        assert_eq!(result.correct_answer, expected);
        assert!(battle.state.player_health < PLAYER_MAX_HEALTH);
        assert_eq!(battle.state.opponent_health, 100);
        // Pedagogical reveal lands in the log
        assert!(battle
            .state
            .log
            .iter()
            .any(|l| l.contains(&expected)));
    }

    #[test]
    fn test_five_fixed_hits_win_the_battle() {
        let mut battle = test_battle(fixed_tuning(20, 10));
        let mut rng = StdRng::seed_from_u64(4);
        battle.start(test_opponent(100), &mut rng).unwrap();

        for i in 0..5 {
            assert_eq!(battle.state.phase, BattlePhase::InProgress, "hit {i}");
            let answer = battle
                .state
                .current_question
                .as_ref()
                .unwrap()
                .correct_answer
                .clone();
            battle.submit_answer(&answer, &mut rng).unwrap();
        }

        assert_eq!(battle.state.phase, BattlePhase::Won);
        assert_eq!(battle.state.opponent_health, 0);
        // 5 answers worth of XP plus the victory bonus
        assert_eq!(battle.state.experience_gained, 5 * 10 + 50);

        let mut stats = PlayerStats::default();
        battle.finish(&mut stats);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.current_win_streak, 1);
        assert_eq!(stats.longest_win_streak, 1);
        assert_eq!(stats.experience, 100);
    }

    #[test]
    fn test_player_defeat() {
        let mut battle = test_battle(fixed_tuning(20, 25));
        let mut rng = StdRng::seed_from_u64(5);
        battle.start(test_opponent(1000), &mut rng).unwrap();

        for _ in 0..4 {
            battle.submit_answer("nope", &mut rng);
        }

        assert_eq!(battle.state.phase, BattlePhase::Lost);
        assert_eq!(battle.state.player_health, 0);

        let mut stats = PlayerStats::default();
        stats.current_win_streak = 3;
        battle.finish(&mut stats);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.current_win_streak, 0);
    }

    #[test]
    fn test_health_never_goes_negative() {
        let mut battle = test_battle(fixed_tuning(90, 90));
        let mut rng = StdRng::seed_from_u64(6);
        battle.start(test_opponent(100), &mut rng).unwrap();

        battle.submit_answer("nope", &mut rng);
        battle.submit_answer("nope", &mut rng);
        assert_eq!(battle.state.player_health, 0);
        assert_eq!(battle.state.phase, BattlePhase::Lost);
    }

    #[test]
    fn test_submit_before_start_is_noop() {
        let mut battle = test_battle(BattleTuning::default());
        let mut rng = StdRng::seed_from_u64(7);

        assert!(battle.submit_answer("hablo", &mut rng).is_none());
        assert_eq!(battle.state.phase, BattlePhase::NotStarted);
    }

    #[test]
    fn test_submit_after_terminal_is_noop() {
        let mut battle = test_battle(fixed_tuning(100, 10));
        let mut rng = StdRng::seed_from_u64(8);
        battle.start(test_opponent(50), &mut rng).unwrap();

        let answer = battle
            .state
            .current_question
            .as_ref()
            .unwrap()
            .correct_answer
            .clone();
        battle.submit_answer(&answer, &mut rng).unwrap();
        assert_eq!(battle.state.phase, BattlePhase::Won);

        // Double-click after the battle ended
        assert!(battle.submit_answer(&answer, &mut rng).is_none());
        assert_eq!(battle.state.phase, BattlePhase::Won);
    }

    #[test]
    fn test_time_expired_counts_as_incorrect() {
        let mut battle = test_battle(fixed_tuning(20, 10));
        let mut rng = StdRng::seed_from_u64(9);
        battle.start(test_opponent(100), &mut rng).unwrap();

        let result = battle.time_expired(&mut rng).unwrap();
        assert_eq!(result.outcome, Outcome::Incorrect);
        assert_eq!(battle.state.player_health, 90);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut battle = test_battle(fixed_tuning(100, 10));
        let mut rng = StdRng::seed_from_u64(10);
        battle.start(test_opponent(50), &mut rng).unwrap();

        let answer = battle
            .state
            .current_question
            .as_ref()
            .unwrap()
            .correct_answer
            .clone();
        battle.submit_answer(&answer, &mut rng).unwrap();

        let mut stats = PlayerStats::default();
        battle.finish(&mut stats);
        battle.finish(&mut stats);
        assert_eq!(stats.wins, 1);
    }

    #[test]
    fn test_log_is_capped() {
        let mut battle = test_battle(fixed_tuning(1, 1));
        let mut rng = StdRng::seed_from_u64(11);
        battle.start(test_opponent(1000), &mut rng).unwrap();

        for _ in 0..30 {
            battle.submit_answer("nope", &mut rng);
        }
        assert_eq!(battle.state.log.len(), BATTLE_LOG_CAP);
    }

    #[test]
    fn test_reset_clears_terminal_snapshot() {
        let mut battle = test_battle(fixed_tuning(100, 10));
        let mut rng = StdRng::seed_from_u64(12);
        battle.start(test_opponent(50), &mut rng).unwrap();
        let answer = battle
            .state
            .current_question
            .as_ref()
            .unwrap()
            .correct_answer
            .clone();
        battle.submit_answer(&answer, &mut rng).unwrap();
        assert!(battle.is_terminal());

        battle.reset();
        assert_eq!(battle.state.phase, BattlePhase::NotStarted);
        assert!(battle.state.current_question.is_none());
        assert!(battle.state.log.is_empty());
    }
}
