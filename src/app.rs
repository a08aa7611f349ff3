use crate::battle::{Battle, BattleError, BattlePhase, Outcome};
use crate::config::Config;
use crate::language::{LeagueTable, Opponent, VerbPool};
use crate::mastery::{compute_mastery_score, progress_percent, MasteryScore, SessionMetrics};
use crate::player::PlayerStats;
use crate::profile::ProfileDb;
use crate::question::QuestionGenerator;
use crate::session::{DuelSession, SessionSummary};
use crate::TICK_RATE_MS;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::SystemTime;
use thiserror::Error;

/// Assumed repetitions per verb when estimating required exposures for the
/// progress percentage.
const REPETITIONS_PER_VERB: u32 = 3;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown league '{0}'")]
    UnknownLeague(String),
    #[error(transparent)]
    Battle(#[from] BattleError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    Fighting,
    Results,
}

/// Top-level game state driven by the event loop: one battle at a time plus
/// the persistent profile around it.
pub struct App {
    pub state: AppState,
    pub battle: Battle,
    pub stats: PlayerStats,
    pub session: DuelSession,
    pub league_id: String,
    pub league_name: String,
    pub assignment: String,
    pub time_limit_secs: Option<u64>,
    pub seconds_remaining: Option<f64>,
    pub question_started_at: Option<SystemTime>,
    pub summary: Option<SessionSummary>,
    pub mastery: Option<MasteryScore>,
    pub progress: Option<u32>,
    config: Config,
    eligible_verbs: u32,
    opponents: Vec<Opponent>,
    db: Option<ProfileDb>,
}

impl App {
    pub fn new(config: Config, db: Option<ProfileDb>, rng: &mut impl Rng) -> Result<Self, AppError> {
        let pool = VerbPool::load(&config.language);
        let table = LeagueTable::load();

        let stats = db
            .as_ref()
            .and_then(|d| d.load_stats().ok())
            .unwrap_or_default();

        let league = match &config.league {
            Some(id) => table
                .by_id(id)
                .ok_or_else(|| AppError::UnknownLeague(id.clone()))?,
            None => table.for_level(stats.level()),
        }
        .clone();

        let eligible_verbs = pool
            .verbs
            .iter()
            .filter(|v| league.allows_category(&v.category))
            .count() as u32;

        let assignment = format!("{}-{}", config.language, league.id);
        let opponents = league.opponents.clone();
        let league_id = league.id.clone();
        let league_name = league.name.clone();

        let generator = QuestionGenerator::new(pool, league);
        let battle = Battle::new(generator, config.tuning.clone());

        let mut app = Self {
            state: AppState::Fighting,
            battle,
            stats,
            session: DuelSession::new(&assignment),
            league_id,
            league_name,
            assignment,
            time_limit_secs: config.time_limit_secs,
            seconds_remaining: None,
            question_started_at: None,
            summary: None,
            mastery: None,
            progress: None,
            config,
            eligible_verbs,
            opponents,
            db,
        };
        app.begin_battle(rng)?;
        Ok(app)
    }

    fn begin_battle(&mut self, rng: &mut impl Rng) -> Result<(), AppError> {
        let opponent = self
            .opponents
            .choose(rng)
            .cloned()
            .expect("league has opponents");
        self.battle.start(opponent, rng)?;
        self.state = AppState::Fighting;
        self.summary = None;
        self.mastery = None;
        self.progress = None;
        self.arm_question_timer();
        Ok(())
    }

    /// Start a fresh battle in the same league, keeping the profile.
    pub fn rematch(&mut self, rng: &mut impl Rng) -> Result<(), AppError> {
        self.battle.reset();
        self.session = DuelSession::new(&self.assignment);
        self.begin_battle(rng)
    }

    fn arm_question_timer(&mut self) {
        self.seconds_remaining = self.time_limit_secs.map(|s| s as f64);
        self.question_started_at = Some(SystemTime::now());
    }

    /// Advance the per-question countdown. An exhausted timer resolves the
    /// round as an empty (incorrect) answer.
    pub fn on_tick(&mut self, rng: &mut impl Rng) {
        if self.state != AppState::Fighting {
            return;
        }
        if let Some(remaining) = self.seconds_remaining {
            let remaining = remaining - (TICK_RATE_MS as f64 / 1000.0);
            self.seconds_remaining = Some(remaining);
            if remaining <= 0.0 {
                self.resolve_answer("", rng);
            }
        }
    }

    /// The player picked one of the displayed options.
    pub fn select_option(&mut self, index: usize, rng: &mut impl Rng) {
        if self.state != AppState::Fighting {
            return;
        }
        let Some(answer) = self
            .battle
            .state
            .current_question
            .as_ref()
            .and_then(|q| q.options.get(index))
            .cloned()
        else {
            return;
        };
        self.resolve_answer(&answer, rng);
    }

    fn resolve_answer(&mut self, answer: &str, rng: &mut impl Rng) {
        let Some(question) = self.battle.state.current_question.clone() else {
            return;
        };
        let Some(result) = self.battle.submit_answer(answer, rng) else {
            return;
        };

        let response_time_ms = self
            .question_started_at
            .and_then(|t| t.elapsed().ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        self.session
            .record(&question, answer, result.outcome, response_time_ms);
        self.stats.record_answer(result.outcome == Outcome::Correct);

        if self.battle.is_terminal() {
            self.conclude_battle();
        } else {
            self.arm_question_timer();
        }
    }

    fn conclude_battle(&mut self) {
        let won = self.battle.state.phase == BattlePhase::Won;
        self.battle.finish(&mut self.stats);

        if let Some(db) = self.db.as_mut() {
            let _ = self.session.flush(db);
            let _ = db.save_stats(&self.stats);
            if won {
                let _ = db.mark_completed(&self.assignment);
            }
        }

        let summary = self.session.summary();
        let metrics = match self.db.as_ref() {
            Some(db) => db
                .metrics_for(&self.assignment)
                .unwrap_or_else(|_| self.local_metrics(&summary)),
            None => self.local_metrics(&summary),
        };

        self.mastery = Some(compute_mastery_score(&metrics, &self.config.weights));
        self.progress = Some(progress_percent(
            metrics.words_attempted,
            Some(self.eligible_verbs),
            Some(REPETITIONS_PER_VERB),
            metrics.is_completed,
        ));
        self.summary = Some(summary);
        self.seconds_remaining = None;
        self.state = AppState::Results;
    }

    /// Without a profile store the score falls back to this session alone.
    fn local_metrics(&self, summary: &SessionSummary) -> SessionMetrics {
        SessionMetrics {
            sessions_count: 1,
            words_attempted: summary.attempted,
            words_correct: summary.correct,
            is_completed: false,
        }
    }
}
