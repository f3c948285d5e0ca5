use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Gauge, Paragraph, Row, Table};

use crate::app::episode::truncate;
use crate::app::progress::Progress;
use crate::app::tracker::{EpisodeRow, TrackerView};

use super::{TreeRow, TuiState};

const ACCENT: Color = Color::Rgb(110, 170, 255);
const MUTED: Color = Color::Rgb(185, 195, 210);
const WATCHED: Color = Color::Rgb(130, 210, 150);

pub(super) fn draw_tui(
    frame: &mut Frame,
    view: &TrackerView,
    rows: &[TreeRow],
    state: &mut TuiState,
) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let episode_rows = view
        .sagas
        .iter()
        .flat_map(|saga| saga.arcs.iter())
        .map(|arc| arc.episodes.len())
        .sum::<usize>();
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "ARCTRACK",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            format!("{} sagas", view.sagas.len()),
            Style::default().fg(MUTED),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            format!("{episode_rows} episodes"),
            Style::default().fg(MUTED),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            format!("{} watched", view.overall.watched),
            Style::default().fg(Color::Yellow),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Dashboard"));
    frame.render_widget(header, chunks[0]);

    let table_rows = rows
        .iter()
        .map(|row| tree_row(view, *row))
        .collect::<Vec<_>>();
    let table = Table::new(table_rows, [Constraint::Min(30), Constraint::Length(16)])
        .header(
            Row::new(vec!["Saga / Arc / Episode", "Progress"])
                .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        )
        .block(panel_block("Tracker"))
        .row_highlight_style(
            Style::default()
                .bg(ACCENT)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, chunks[1], &mut state.table_state);

    let selected = state
        .table_state
        .selected()
        .and_then(|idx| rows.get(idx))
        .copied();
    let (title, progress) = selected_progress(view, selected);
    frame.render_widget(progress_gauge(title, progress), chunks[2]);
    frame.render_widget(
        progress_gauge("Overall".to_string(), view.overall),
        chunks[3],
    );

    let status_widget = Paragraph::new(Line::from(vec![
        Span::styled(state.status.clone(), status_style(&state.status)),
        Span::styled(
            "   ↑/↓ move  →/← open/close  Enter open/toggle  Space watched  q quit",
            Style::default().fg(MUTED),
        ),
    ]))
    .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[4]);
}

fn tree_row(view: &TrackerView, row: TreeRow) -> Row<'static> {
    match row {
        TreeRow::Saga(saga_idx) => {
            let saga = &view.sagas[saga_idx];
            Row::new(vec![
                Cell::from(format!("{} {}", fold_marker(saga.expanded), saga.name)),
                Cell::from(progress_cell(saga.progress)),
            ])
            .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        }
        TreeRow::Arc(saga_idx, arc_idx) => {
            let arc = &view.sagas[saga_idx].arcs[arc_idx];
            Row::new(vec![
                Cell::from(format!("  {} {}", fold_marker(arc.expanded), arc.name)),
                Cell::from(progress_cell(arc.progress)),
            ])
            .style(Style::default().fg(Color::Rgb(230, 235, 242)))
        }
        TreeRow::Episode(saga_idx, arc_idx, ep_idx) => {
            let episode = &view.sagas[saga_idx].arcs[arc_idx].episodes[ep_idx];
            let style = if episode.checked {
                Style::default().fg(WATCHED)
            } else {
                Style::default().fg(MUTED)
            };
            Row::new(vec![
                Cell::from(episode_line(episode)),
                Cell::from(""),
            ])
            .style(style)
        }
    }
}

fn episode_line(episode: &EpisodeRow) -> String {
    let check = if episode.checked { "[x]" } else { "[ ]" };
    format!("      {check} {}", truncate(&episode.label(), 80))
}

fn selected_progress(view: &TrackerView, selected: Option<TreeRow>) -> (String, Progress) {
    match selected {
        Some(TreeRow::Saga(saga_idx)) => {
            let saga = &view.sagas[saga_idx];
            (saga.name.clone(), saga.progress)
        }
        Some(TreeRow::Arc(saga_idx, arc_idx) | TreeRow::Episode(saga_idx, arc_idx, _)) => {
            let arc = &view.sagas[saga_idx].arcs[arc_idx];
            (arc.name.clone(), arc.progress)
        }
        None => ("Selection".to_string(), Progress::default()),
    }
}

fn fold_marker(expanded: bool) -> &'static str {
    if expanded { "▾" } else { "▸" }
}

fn progress_cell(progress: Progress) -> String {
    format!(
        "{:>4} {:>4}/{:<4}",
        progress.label(),
        progress.watched,
        progress.total
    )
}

fn progress_gauge(title: String, progress: Progress) -> Gauge<'static> {
    Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
                .title(truncate(&title, 48)),
        )
        .gauge_style(
            Style::default()
                .fg(Color::Rgb(130, 190, 255))
                .bg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .label(format!(
            "{} ({}/{})",
            progress.label(),
            progress.watched,
            progress.total
        ))
        .ratio(progress.ratio())
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("WARN:") {
        Style::default().fg(Color::Yellow)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}
