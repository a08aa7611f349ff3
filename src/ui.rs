use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppState};
use crate::battle::{BattlePhase, PLAYER_MAX_HEALTH};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Fighting => render_fight(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_fight(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(1), // padding
            Constraint::Length(1), // player health
            Constraint::Length(1), // opponent health
            Constraint::Length(1), // timer
            Constraint::Length(4), // question card
            Constraint::Length(5), // options
            Constraint::Min(1),    // battle log
        ])
        .split(area);

    let state = &app.battle.state;

    let header = Paragraph::new(Span::styled(
        format!(
            "{}   lvl {}   {} xp",
            app.league_name,
            app.stats.level(),
            app.stats.experience
        ),
        bold_style,
    ))
    .alignment(Alignment::Center);
    header.render(chunks[0], buf);

    let player_gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green))
        .label(format!("you {}/{}", state.player_health, PLAYER_MAX_HEALTH))
        .ratio(f64::from(state.player_health) / f64::from(PLAYER_MAX_HEALTH));
    player_gauge.render(chunks[2], buf);

    if let Some(opponent) = &state.opponent {
        let ratio = if opponent.max_health > 0 {
            f64::from(state.opponent_health) / f64::from(opponent.max_health)
        } else {
            0.0
        };
        let opponent_gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Red))
            .label(format!(
                "{} {}/{}",
                opponent.name, state.opponent_health, opponent.max_health
            ))
            .ratio(ratio);
        opponent_gauge.render(chunks[3], buf);
    }

    if let Some(remaining) = app.seconds_remaining {
        let timer = Paragraph::new(Span::styled(
            format!("{:.1}", remaining.max(0.0)),
            dim_style.patch(bold_style),
        ))
        .alignment(Alignment::Center);
        timer.render(chunks[4], buf);
    }

    if let Some(question) = &state.current_question {
        let card = Paragraph::new(vec![
            Line::from(Span::styled(
                format!("{} ({})", question.infinitive, question.translation),
                bold_style,
            )),
            Line::from(Span::styled(
                format!("{} tense", question.tense),
                dim_style,
            )),
            Line::from(""),
            Line::from(Span::raw(format!("{} ____", question.subject))),
        ])
        .alignment(Alignment::Center);
        card.render(chunks[5], buf);

        // Pad options to the widest so the column stays aligned
        let widest = question
            .options
            .iter()
            .map(|o| o.width())
            .max()
            .unwrap_or(0);
        let lines: Vec<Line> = question
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                Line::from(vec![
                    Span::styled(format!("({}) ", i + 1), dim_style),
                    Span::raw(format!("{option:widest$}")),
                ])
            })
            .collect();
        let options = Paragraph::new(lines).alignment(Alignment::Center);
        options.render(chunks[6], buf);
    }

    let log_lines: Vec<Line> = state
        .log
        .iter()
        .rev()
        .map(|entry| Line::from(Span::styled(format!("› {entry}"), dim_style)))
        .collect();
    let log = Paragraph::new(log_lines).wrap(Wrap { trim: true });
    log.render(chunks[7], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // verdict
            Constraint::Length(1), // session line
            Constraint::Length(1), // response times
            Constraint::Length(1), // lifetime line
            Constraint::Length(1), // padding
            Constraint::Length(1), // mastery
            Constraint::Length(1), // progress gauge
            Constraint::Min(1),    // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let won = app.battle.state.phase == BattlePhase::Won;
    let verdict = Paragraph::new(Span::styled(
        if won { "Victory!" } else { "Defeat" },
        bold_style.fg(if won { Color::Green } else { Color::Red }),
    ))
    .alignment(Alignment::Center);
    verdict.render(chunks[0], buf);

    if let Some(summary) = &app.summary {
        let session_line = Paragraph::new(Span::styled(
            format!(
                "{}/{} correct   {:.0}% acc   +{} xp",
                summary.correct,
                summary.attempted,
                summary.accuracy,
                app.battle.state.experience_gained
            ),
            bold_style,
        ))
        .alignment(Alignment::Center);
        session_line.render(chunks[1], buf);

        let times = Paragraph::new(Span::styled(
            format!(
                "{:.0}ms avg response   {:.0}ms sd",
                summary.mean_response_ms, summary.response_std_dev_ms
            ),
            italic_style,
        ))
        .alignment(Alignment::Center);
        times.render(chunks[2], buf);
    }

    let lifetime = Paragraph::new(Span::raw(format!(
        "lifetime: {}W/{}L   streak {} (best {})   {:.0}% acc",
        app.stats.wins,
        app.stats.losses,
        app.stats.current_win_streak,
        app.stats.longest_win_streak,
        app.stats.accuracy()
    )))
    .alignment(Alignment::Center);
    lifetime.render(chunks[3], buf);

    if let Some(mastery) = &app.mastery {
        let mastery_line = Paragraph::new(Span::styled(
            format!("mastery {} ({})", mastery.total, mastery.grade),
            bold_style.fg(Color::Cyan),
        ))
        .alignment(Alignment::Center);
        mastery_line.render(chunks[5], buf);
    }

    if let Some(progress) = app.progress {
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan))
            .label(format!("progress {progress}%"))
            .ratio(f64::from(progress.min(100)) / 100.0);
        gauge.render(chunks[6], buf);
    }

    let legend = Paragraph::new(Span::styled("(r)ematch / (esc)ape", italic_style))
        .alignment(Alignment::Center);
    legend.render(chunks[8], buf);
}
