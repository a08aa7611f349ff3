use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};
use verbduel::{
    app::{App, AppState},
    config::{Config, ConfigStore, FileConfigStore},
    mastery::{compute_mastery_score, progress_percent},
    profile::ProfileDb,
    runtime::{CrosstermEventSource, DuelEvent, Runner},
    TICK_RATE_MS,
};

/// terminal conjugation battler: answer verb forms to win duels
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal verb-conjugation battler. Pick the right form before the timer runs out to damage your opponent; wrong answers cost you health. Progress and mastery are tracked per language and league."
)]
pub struct Cli {
    /// language to practice
    #[clap(short = 'l', long, value_enum)]
    language: Option<SupportedLanguage>,

    /// force a league instead of selecting one by level
    #[clap(short = 'g', long)]
    league: Option<String>,

    /// seconds allowed per question
    #[clap(short = 's', long)]
    time_limit: Option<u64>,

    /// disable the per-question timer
    #[clap(long)]
    no_timer: bool,

    /// print mastery and progress for every tracked assignment and exit
    #[clap(long)]
    mastery: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum SupportedLanguage {
    Spanish,
    French,
    German,
}

impl Cli {
    /// Layer CLI flags over the saved config.
    fn apply_to(&self, config: &mut Config) {
        if let Some(language) = self.language {
            config.language = language.to_string().to_lowercase();
        }
        if self.league.is_some() {
            config.league = self.league.clone();
        }
        if let Some(secs) = self.time_limit {
            config.time_limit_secs = Some(secs);
        }
        if self.no_timer {
            config.time_limit_secs = None;
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut config = FileConfigStore::new().load();
    cli.apply_to(&mut config);

    if cli.mastery {
        return print_mastery_report(&config);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let db = ProfileDb::new().ok();
    let mut app = App::new(config, db, &mut rand::thread_rng())?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );
    let mut rng = rand::thread_rng();

    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            DuelEvent::Tick => {
                app.on_tick(&mut rng);
            }
            DuelEvent::Resize => {}
            DuelEvent::Key(key) => match key.code {
                KeyCode::Esc => break,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::Char(c) => match app.state {
                    AppState::Fighting => {
                        if let Some(digit) = c.to_digit(10) {
                            if digit >= 1 {
                                app.select_option(digit as usize - 1, &mut rng);
                            }
                        }
                    }
                    AppState::Results => match c {
                        'r' => app.rematch(&mut rng)?,
                        'q' => break,
                        _ => {}
                    },
                },
                _ => {}
            },
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

/// Headless report over every assignment with recorded attempts.
fn print_mastery_report(config: &Config) -> Result<(), Box<dyn Error>> {
    let db = ProfileDb::new()?;
    let assignments = db.known_assignments()?;

    if assignments.is_empty() {
        println!("no attempts recorded yet");
        return Ok(());
    }

    for assignment in assignments {
        let metrics = db.metrics_for(&assignment)?;
        let score = compute_mastery_score(&metrics, &config.weights);
        let progress = progress_percent(metrics.words_attempted, None, None, metrics.is_completed);

        println!(
            "{assignment}: mastery {} ({})   progress {progress}%   {}/{} correct over {} session(s)",
            score.total,
            score.grade,
            metrics.words_correct,
            metrics.words_attempted,
            metrics.sessions_count,
        );
    }

    Ok(())
}
