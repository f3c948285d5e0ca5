mod actions;
mod render;
mod session;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;
use tracing::{error, info};

use super::catalog::CatalogOrigin;
use super::tracker::{Expansion, Tracker, TrackerView};
use super::watch::WatchStore;

use self::actions::{KeyOutcome, handle_key, status_info, status_warn};
use self::render::draw_tui;
use self::session::TuiSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TreeRow {
    Saga(usize),
    Arc(usize, usize),
    Episode(usize, usize, usize),
}

pub(super) fn visible_rows(view: &TrackerView) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    for (saga_idx, saga) in view.sagas.iter().enumerate() {
        rows.push(TreeRow::Saga(saga_idx));
        if !saga.expanded {
            continue;
        }
        for (arc_idx, arc) in saga.arcs.iter().enumerate() {
            rows.push(TreeRow::Arc(saga_idx, arc_idx));
            if !arc.expanded {
                continue;
            }
            for ep_idx in 0..arc.episodes.len() {
                rows.push(TreeRow::Episode(saga_idx, arc_idx, ep_idx));
            }
        }
    }
    rows
}

pub(super) struct TuiState {
    pub(super) tracker: Tracker,
    pub(super) expansion: Expansion,
    pub(super) table_state: TableState,
    pub(super) status: String,
}

impl TuiState {
    pub(super) fn new(tracker: Tracker) -> Self {
        let status = match tracker.origin() {
            CatalogOrigin::Fallback { reason } => {
                status_warn(&format!("Catalog unavailable ({reason}); showing fallback list."))
            }
            CatalogOrigin::Remote { .. } => {
                let unclassified = tracker.grouping().unclassified.len();
                if unclassified > 0 {
                    status_info(&format!(
                        "Ready. {unclassified} episode(s) are outside every known arc."
                    ))
                } else {
                    status_info("Ready.")
                }
            }
        };
        let mut table_state = TableState::default();
        table_state.select((!tracker.grouping().sagas.is_empty()).then_some(0));
        Self {
            tracker,
            expansion: Expansion::default(),
            table_state,
            status,
        }
    }

    pub(super) fn view(&self) -> TrackerView {
        self.tracker.view(&self.expansion)
    }

    pub(super) fn selected_row(&self, rows: &[TreeRow]) -> Option<TreeRow> {
        self.table_state
            .selected()
            .and_then(|idx| rows.get(idx))
            .copied()
    }

    pub(super) fn select_row(&mut self, rows: &[TreeRow], target: TreeRow) {
        if let Some(idx) = rows.iter().position(|row| *row == target) {
            self.table_state.select(Some(idx));
        }
    }
}

pub(crate) fn run_tui(tracker: Tracker, store: &dyn WatchStore) -> Result<()> {
    let mut session = TuiSession::enter().inspect_err(|err| {
        error!(error = %err, "unable to take over the terminal; tracker not rendered");
    })?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;
    info!("tracker rendered");

    let mut state = TuiState::new(tracker);

    loop {
        let view = state.view();
        let rows = visible_rows(&view);
        terminal.draw(|frame| draw_tui(frame, &view, &rows, &mut state))?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match handle_key(&mut state, store, &view, &rows, key.code) {
            KeyOutcome::Continue => {}
            KeyOutcome::Quit => break,
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}
