// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds CLI parsing and terminal setup.
pub mod app;
pub mod battle;
pub mod config;
pub mod language;
pub mod mastery;
pub mod player;
pub mod profile;
pub mod question;
pub mod runtime;
pub mod session;
pub mod ui;

pub use app::{App, AppState};

pub const TICK_RATE_MS: u64 = 100;
