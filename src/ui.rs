pub mod leaderboard;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use crate::{
    app::App, leaderboard::Submission, platform::Platform, session::SessionStatus,
    store::ComparisonKey,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Status line describing what happened to the round's score
pub fn submission_line(submission: &Submission, key: ComparisonKey) -> (String, Color) {
    match submission {
        Submission::Recorded { previous: None } => {
            ("First score on the board!".to_string(), Color::Green)
        }
        Submission::Recorded {
            previous: Some(prev),
        } => (
            format!(
                "New personal best! (was {} taps, {:.2} taps/s)",
                prev.best_taps, prev.best_tps
            ),
            Color::Green,
        ),
        Submission::NotPersonalBest { best } => (
            match key {
                ComparisonKey::Taps => format!("Personal best stands at {} taps", best.best_taps),
                ComparisonKey::Tps => {
                    format!("Personal best stands at {:.2} taps/s", best.best_tps)
                }
            },
            Color::Gray,
        ),
        Submission::SkippedNoIdentity => (
            "Playing anonymously: set --player to save scores".to_string(),
            Color::Gray,
        ),
        Submission::StorageFailed => (
            "Leaderboard unavailable, this round was not saved".to_string(),
            Color::Red,
        ),
    }
}

impl<P: Platform> Widget for &App<P> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let session = &self.session;
        let player_id = self.context.player_id();

        if !self.context.accepts_input() {
            Paragraph::new(Span::styled("Loading...", dim_bold_style))
                .alignment(Alignment::Center)
                .render(area, buf);
            return;
        }

        match session.status() {
            SessionStatus::Idle => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .horizontal_margin(HORIZONTAL_MARGIN)
                    .vertical_margin(VERTICAL_MARGIN)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Length(2),
                        Constraint::Min(4),
                        Constraint::Length(1),
                    ])
                    .split(area);

                Paragraph::new(Span::styled(
                    "FC TAP",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ))
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center)
                .render(chunks[0], buf);

                let who = player_id
                    .as_deref()
                    .map(|id| format!("playing as {}", id))
                    .unwrap_or_else(|| "playing anonymously".to_string());
                Paragraph::new(vec![
                    Line::from(Span::styled(
                        format!(
                            "Press SPACE and tap any key as fast as you can for {} seconds",
                            session.round_secs()
                        ),
                        bold_style,
                    )),
                    Line::from(Span::styled(who, italic_style)),
                ])
                .alignment(Alignment::Center)
                .render(chunks[1], buf);

                leaderboard::render_leaderboard(
                    self.context.top(),
                    self.context.comparison_key(),
                    player_id.as_deref(),
                    chunks[2],
                    buf,
                );

                Paragraph::new(Span::styled("(space) start / (esc)ape", italic_style))
                    .render(chunks[3], buf);
            }
            SessionStatus::Running => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .horizontal_margin(HORIZONTAL_MARGIN)
                    .constraints([
                        Constraint::Percentage(30),
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Length(2),
                        Constraint::Min(0),
                        Constraint::Length(1),
                    ])
                    .split(area);

                let total = session.round_secs().max(1);
                let ratio = session.seconds_remaining() as f64 / total as f64;
                Gauge::default()
                    .block(Block::default().borders(Borders::ALL).title("time left"))
                    .gauge_style(Style::default().fg(if session.seconds_remaining() <= 3 {
                        Color::Red
                    } else {
                        Color::Green
                    }))
                    .ratio(ratio.clamp(0.0, 1.0))
                    .label(format!("{}s", session.seconds_remaining()))
                    .render(chunks[1], buf);

                Paragraph::new(Span::styled(
                    format!("{} taps", session.tap_count()),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ))
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);

                if let Some(warning) = session.warning() {
                    Paragraph::new(Span::styled(
                        format!("⚠ {}", warning),
                        Style::default().fg(Color::Yellow),
                    ))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .render(chunks[3], buf);
                }

                Paragraph::new(Span::styled(
                    "tap any key! / (backspace) abandon / (esc)ape",
                    italic_style,
                ))
                .render(chunks[5], buf);
            }
            SessionStatus::Finished => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .horizontal_margin(HORIZONTAL_MARGIN)
                    .vertical_margin(VERTICAL_MARGIN)
                    .constraints([
                        Constraint::Length(3), // headline
                        Constraint::Length(1), // rank message
                        Constraint::Length(1), // warning
                        Constraint::Length(1), // submission
                        Constraint::Min(4),    // leaderboard
                        Constraint::Length(1), // legend
                    ])
                    .split(area);

                if let Some(outcome) = session.outcome() {
                    Paragraph::new(Span::styled(
                        format!(
                            "{} taps   {:.2} taps/s   rank: {}",
                            outcome.tap_count, outcome.taps_per_second, outcome.rank.name
                        ),
                        bold_style,
                    ))
                    .block(Block::default().borders(Borders::ALL).title("results"))
                    .alignment(Alignment::Center)
                    .render(chunks[0], buf);

                    Paragraph::new(Span::styled(
                        outcome.rank.message.clone(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::ITALIC),
                    ))
                    .alignment(Alignment::Center)
                    .render(chunks[1], buf);

                    if let Some(warning) = outcome.warning.as_ref() {
                        Paragraph::new(Span::styled(
                            format!("⚠ {}", warning),
                            Style::default().fg(Color::Yellow),
                        ))
                        .alignment(Alignment::Center)
                        .render(chunks[2], buf);
                    }
                }

                if let Some(submission) = self.last_submission.as_ref() {
                    let (text, color) =
                        submission_line(submission, self.context.comparison_key());
                    Paragraph::new(Span::styled(text, Style::default().fg(color)))
                        .alignment(Alignment::Center)
                        .render(chunks[3], buf);
                }

                leaderboard::render_leaderboard(
                    self.context.top(),
                    self.context.comparison_key(),
                    player_id.as_deref(),
                    chunks[4],
                    buf,
                );

                let legend = if self.shared {
                    "(r)etry / (backspace) menu / (esc)ape   shared!"
                } else {
                    "(r)etry / (s)hare / (backspace) menu / (esc)ape"
                };
                Paragraph::new(Span::styled(legend, italic_style)).render(chunks[5], buf);
            }
        }
    }
}
