use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::store::{ComparisonKey, ScoreRecord};

pub struct LeaderboardRowData<'a> {
    pub position: usize,
    pub record: &'a ScoreRecord,
    pub is_player: bool,
}

pub fn format_recorded_at(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn medal_color(position: usize) -> Color {
    match position {
        1 => Color::Yellow,
        2 => Color::Gray,
        3 => Color::Rgb(205, 127, 50),
        _ => Color::White,
    }
}

/// Pure presenter for one leaderboard row
pub fn present_row(data: &LeaderboardRowData) -> Row<'static> {
    let mut name = data.record.player_id.clone();
    if data.record.flagged {
        // flagged rounds stay on the board, marked
        name.push_str(" ⚠");
    }

    let row_style = if data.is_player {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(format!("#{}", data.position)).style(
            Style::default()
                .fg(medal_color(data.position))
                .add_modifier(Modifier::BOLD),
        ),
        Cell::from(name),
        Cell::from(data.record.best_taps.to_string()),
        Cell::from(format!("{:.2}", data.record.best_tps)),
        Cell::from(format_recorded_at(&data.record.recorded_at)),
    ])
    .style(row_style)
}

/// Top-N table; the player's own row is highlighted
pub fn render_leaderboard(
    records: &[ScoreRecord],
    key: ComparisonKey,
    player_id: Option<&str>,
    area: Rect,
    buf: &mut Buffer,
) {
    let title = format!("Leaderboard (by {})", key);

    if records.is_empty() {
        Paragraph::new("No scores yet. Finish a round to claim the top spot!")
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .render(area, buf);
        return;
    }

    let header = Row::new(vec!["Pos", "Player", "Taps", "Taps/s", "Set"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            present_row(&LeaderboardRowData {
                position: i + 1,
                record,
                is_player: player_id == Some(record.player_id.as_str()),
            })
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Min(12),
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(16),
    ];

    Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(2)
        .render(area, buf);
}
