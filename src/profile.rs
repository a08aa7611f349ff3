use crate::mastery::SessionMetrics;
use crate::player::PlayerStats;
use chrono::{DateTime, Local};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::PathBuf;

/// One answered question, as persisted in the attempt log.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub assignment: String,
    pub session_id: String,
    pub infinitive: String,
    pub tense: String,
    pub subject: String,
    pub answer: String,
    pub was_correct: bool,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Local>,
}

/// Local profile database: the player row plus the attempt log that session
/// metrics are aggregated from.
#[derive(Debug)]
pub struct ProfileDb {
    conn: Connection,
}

impl ProfileDb {
    /// Open (and if needed create) the on-disk profile database.
    pub fn new() -> Result<Self> {
        let db_path = Self::get_db_path().unwrap_or_else(|| PathBuf::from("verbduel_profile.db"));
        Self::with_path(db_path)
    }

    /// Open a database at an explicit path, creating parent directories.
    pub fn with_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(path.as_ref())?;
        Self::from_connection(conn)
    }

    /// In-memory database for tests and throwaway sessions.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS player (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                experience INTEGER NOT NULL,
                wins INTEGER NOT NULL,
                losses INTEGER NOT NULL,
                answers_total INTEGER NOT NULL,
                answers_correct INTEGER NOT NULL,
                current_win_streak INTEGER NOT NULL,
                longest_win_streak INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                assignment TEXT NOT NULL,
                session_id TEXT NOT NULL,
                infinitive TEXT NOT NULL,
                tense TEXT NOT NULL,
                subject TEXT NOT NULL,
                answer TEXT NOT NULL,
                was_correct BOOLEAN NOT NULL,
                response_time_ms INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_attempts_assignment ON attempts(assignment)",
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS assignment_state (
                assignment TEXT PRIMARY KEY,
                completed BOOLEAN NOT NULL DEFAULT 0
            )
            "#,
            [],
        )?;

        Ok(ProfileDb { conn })
    }

    /// Database file path under $HOME/.local/state/verbduel
    fn get_db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("verbduel");
            Some(state_dir.join("profile.db"))
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", "verbduel") {
            Some(proj_dirs.data_local_dir().join("profile.db"))
        } else {
            None
        }
    }

    /// Load player stats, defaulting when no profile exists yet.
    pub fn load_stats(&self) -> Result<PlayerStats> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT experience, wins, losses, answers_total, answers_correct,
                       current_win_streak, longest_win_streak
                FROM player WHERE id = 1
                "#,
                [],
                |row| {
                    Ok(PlayerStats {
                        experience: row.get(0)?,
                        wins: row.get(1)?,
                        losses: row.get(2)?,
                        answers_total: row.get(3)?,
                        answers_correct: row.get(4)?,
                        current_win_streak: row.get(5)?,
                        longest_win_streak: row.get(6)?,
                    })
                },
            )
            .optional()?;

        Ok(row.unwrap_or_default())
    }

    pub fn save_stats(&self, stats: &PlayerStats) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO player
            (id, experience, wins, losses, answers_total, answers_correct,
             current_win_streak, longest_win_streak)
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                stats.experience,
                stats.wins,
                stats.losses,
                stats.answers_total,
                stats.answers_correct,
                stats.current_win_streak,
                stats.longest_win_streak,
            ],
        )?;
        Ok(())
    }

    pub fn record_attempt(&self, attempt: &AttemptRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO attempts
            (assignment, session_id, infinitive, tense, subject, answer,
             was_correct, response_time_ms, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                attempt.assignment,
                attempt.session_id,
                attempt.infinitive,
                attempt.tense,
                attempt.subject,
                attempt.answer,
                attempt.was_correct,
                attempt.response_time_ms,
                attempt.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Record a whole session's attempts in one transaction.
    pub fn record_attempts_batch(&mut self, attempts: &[AttemptRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;

        for attempt in attempts {
            tx.execute(
                r#"
                INSERT INTO attempts
                (assignment, session_id, infinitive, tense, subject, answer,
                 was_correct, response_time_ms, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    attempt.assignment,
                    attempt.session_id,
                    attempt.infinitive,
                    attempt.tense,
                    attempt.subject,
                    attempt.answer,
                    attempt.was_correct,
                    attempt.response_time_ms,
                    attempt.timestamp.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Aggregate the attempt log into scoring input for one assignment.
    pub fn metrics_for(&self, assignment: &str) -> Result<SessionMetrics> {
        let (sessions_count, words_attempted, words_correct): (u32, u32, u32) =
            self.conn.query_row(
                r#"
                SELECT
                    COUNT(DISTINCT session_id),
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN was_correct THEN 1 ELSE 0 END), 0)
                FROM attempts
                WHERE assignment = ?1
                "#,
                [assignment],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let is_completed: bool = self
            .conn
            .query_row(
                "SELECT completed FROM assignment_state WHERE assignment = ?1",
                [assignment],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(false);

        Ok(SessionMetrics {
            sessions_count,
            words_attempted,
            words_correct,
            is_completed,
        })
    }

    pub fn mark_completed(&self, assignment: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO assignment_state (assignment, completed) VALUES (?1, 1)
            ON CONFLICT(assignment) DO UPDATE SET completed = 1
            "#,
            [assignment],
        )?;
        Ok(())
    }

    /// Assignments with at least one recorded attempt, for the report view.
    pub fn known_assignments(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT assignment FROM attempts ORDER BY assignment")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut assignments = Vec::new();
        for row in rows {
            assignments.push(row?);
        }
        Ok(assignments)
    }
}
