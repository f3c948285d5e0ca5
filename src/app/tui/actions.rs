use crossterm::event::KeyCode;

use crate::app::tracker::TrackerView;
use crate::app::watch::WatchStore;

use super::{TreeRow, TuiState, visible_rows};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum KeyOutcome {
    Continue,
    Quit,
}

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_warn(msg: &str) -> String {
    format!("WARN: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

pub(super) fn handle_key(
    state: &mut TuiState,
    store: &dyn WatchStore,
    view: &TrackerView,
    rows: &[TreeRow],
    code: KeyCode,
) -> KeyOutcome {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return KeyOutcome::Quit,
        KeyCode::Up | KeyCode::Char('k') => {
            if let Some(selected) = state.table_state.selected() {
                state.table_state.select(Some(selected.saturating_sub(1)));
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if let Some(selected) = state.table_state.selected()
                && !rows.is_empty()
            {
                let next = (selected + 1).min(rows.len() - 1);
                state.table_state.select(Some(next));
            }
        }
        KeyCode::Right | KeyCode::Char('l') => {
            if let Some(row) = state.selected_row(rows) {
                set_expanded(state, view, row, true);
            }
        }
        KeyCode::Left | KeyCode::Char('h') => {
            if let Some(row) = state.selected_row(rows) {
                collapse_or_ascend(state, view, row);
            }
        }
        KeyCode::Enter => match state.selected_row(rows) {
            Some(row @ TreeRow::Episode(..)) => toggle_episode(state, store, view, row),
            Some(row) => toggle_expanded(state, view, row),
            None => {}
        },
        KeyCode::Char(' ') => match state.selected_row(rows) {
            Some(row @ TreeRow::Episode(..)) => toggle_episode(state, store, view, row),
            Some(TreeRow::Arc(saga_idx, arc_idx)) => {
                toggle_arc(state, store, view, saga_idx, arc_idx)
            }
            Some(TreeRow::Saga(_)) => {
                state.status = status_info("Select an arc or an episode to change watch state.");
            }
            None => {}
        },
        _ => {}
    }
    KeyOutcome::Continue
}

fn toggle_expanded(state: &mut TuiState, view: &TrackerView, row: TreeRow) {
    match row {
        TreeRow::Saga(saga_idx) => state.expansion.toggle_saga(&view.sagas[saga_idx].name),
        TreeRow::Arc(saga_idx, arc_idx) => {
            let saga = &view.sagas[saga_idx];
            state.expansion.toggle_arc(&saga.name, &saga.arcs[arc_idx].name);
        }
        TreeRow::Episode(..) => {}
    }
}

fn set_expanded(state: &mut TuiState, view: &TrackerView, row: TreeRow, expanded: bool) {
    match row {
        TreeRow::Saga(saga_idx) => state.expansion.set_saga(&view.sagas[saga_idx].name, expanded),
        TreeRow::Arc(saga_idx, arc_idx) => {
            let saga = &view.sagas[saga_idx];
            state
                .expansion
                .set_arc(&saga.name, &saga.arcs[arc_idx].name, expanded);
        }
        TreeRow::Episode(..) => {}
    }
}

fn collapse_or_ascend(state: &mut TuiState, view: &TrackerView, row: TreeRow) {
    let parent = match row {
        TreeRow::Saga(saga_idx) if view.sagas[saga_idx].expanded => {
            set_expanded(state, view, row, false);
            return;
        }
        TreeRow::Saga(_) => return,
        TreeRow::Arc(saga_idx, arc_idx) if view.sagas[saga_idx].arcs[arc_idx].expanded => {
            set_expanded(state, view, row, false);
            return;
        }
        TreeRow::Arc(saga_idx, _) => TreeRow::Saga(saga_idx),
        TreeRow::Episode(saga_idx, arc_idx, _) => TreeRow::Arc(saga_idx, arc_idx),
    };
    let rows = visible_rows(view);
    state.select_row(&rows, parent);
}

fn toggle_episode(
    state: &mut TuiState,
    store: &dyn WatchStore,
    view: &TrackerView,
    row: TreeRow,
) {
    let TreeRow::Episode(saga_idx, arc_idx, ep_idx) = row else {
        return;
    };
    let Some(episode) = view.sagas[saga_idx].arcs[arc_idx].episodes.get(ep_idx) else {
        return;
    };
    state.status = match state.tracker.toggle(store, episode.id) {
        Ok(true) => status_info(&format!("Episode {} marked watched.", episode.id)),
        Ok(false) => status_info(&format!("Episode {} marked unwatched.", episode.id)),
        Err(err) => status_error(&format!("Could not save episode {}: {err:#}", episode.id)),
    };
}

fn toggle_arc(
    state: &mut TuiState,
    store: &dyn WatchStore,
    view: &TrackerView,
    saga_idx: usize,
    arc_idx: usize,
) {
    let saga = &view.sagas[saga_idx];
    let arc = &saga.arcs[arc_idx];
    let watched = arc.progress.watched < arc.progress.total;
    state.status = match state
        .tracker
        .set_arc_watched(store, &saga.name, &arc.name, watched)
    {
        Ok(changed) => {
            let verb = if watched { "watched" } else { "unwatched" };
            status_info(&format!("{}: {changed} episode(s) marked {verb}.", arc.name))
        }
        Err(err) => status_error(&format!("Could not save {}: {err:#}", arc.name)),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::arcs::ArcTable;
    use crate::app::catalog::CatalogOrigin;
    use crate::app::episode::Episode;
    use crate::app::tracker::Tracker;
    use crate::app::watch::MemoryWatchStore;

    fn state(store: &MemoryWatchStore) -> TuiState {
        let table = ArcTable::builtin().expect("builtin table");
        let episodes = [1, 2, 3, 4, 64]
            .into_iter()
            .map(|id| Episode::new(id, format!("Ep {id}"), id))
            .collect::<Vec<_>>();
        let tracker = Tracker::from_episodes(
            &episodes,
            CatalogOrigin::Remote { pages: 1 },
            store,
            &table,
        )
        .expect("tracker");
        TuiState::new(tracker)
    }

    fn press(state: &mut TuiState, store: &MemoryWatchStore, code: KeyCode) -> KeyOutcome {
        let view = state.view();
        let rows = visible_rows(&view);
        handle_key(state, store, &view, &rows, code)
    }

    #[test]
    fn starts_collapsed_on_first_saga() {
        let store = MemoryWatchStore::new();
        let state = state(&store);
        let view = state.view();
        assert_eq!(
            visible_rows(&view),
            vec![TreeRow::Saga(0), TreeRow::Saga(1)]
        );
        assert_eq!(state.table_state.selected(), Some(0));
        assert_eq!(state.status, "INFO: Ready.");
    }

    #[test]
    fn expanding_reveals_arcs_then_episodes() {
        let store = MemoryWatchStore::new();
        let mut state = state(&store);
        press(&mut state, &store, KeyCode::Right);
        press(&mut state, &store, KeyCode::Down);
        press(&mut state, &store, KeyCode::Enter);

        let rows = visible_rows(&state.view());
        assert_eq!(
            rows,
            vec![
                TreeRow::Saga(0),
                TreeRow::Arc(0, 0),
                TreeRow::Episode(0, 0, 0),
                TreeRow::Episode(0, 0, 1),
                TreeRow::Episode(0, 0, 2),
                TreeRow::Arc(0, 1),
                TreeRow::Saga(1),
            ]
        );
    }

    #[test]
    fn space_on_episode_persists_and_updates_progress() {
        let store = MemoryWatchStore::new();
        let mut state = state(&store);
        press(&mut state, &store, KeyCode::Right);
        press(&mut state, &store, KeyCode::Down);
        press(&mut state, &store, KeyCode::Right);
        press(&mut state, &store, KeyCode::Down);
        press(&mut state, &store, KeyCode::Char(' '));

        assert!(store.get(1).expect("read"));
        let view = state.view();
        assert!(view.sagas[0].arcs[0].episodes[0].checked);
        assert_eq!(view.sagas[0].arcs[0].progress.label(), "33%");
        assert_eq!(view.overall.watched, 1);
        assert_eq!(state.status, "INFO: Episode 1 marked watched.");

        press(&mut state, &store, KeyCode::Char(' '));
        assert!(!store.get(1).expect("read"));
        assert_eq!(state.view().overall.watched, 0);
    }

    #[test]
    fn space_on_arc_marks_whole_arc_then_clears_it() {
        let store = MemoryWatchStore::new();
        let mut state = state(&store);
        press(&mut state, &store, KeyCode::Right);
        press(&mut state, &store, KeyCode::Down);
        press(&mut state, &store, KeyCode::Char(' '));

        let view = state.view();
        assert_eq!(view.sagas[0].arcs[0].progress.label(), "100%");
        assert!((1..=3).all(|id| store.get(id).expect("read")));

        press(&mut state, &store, KeyCode::Char(' '));
        assert_eq!(state.view().sagas[0].arcs[0].progress.watched, 0);
    }

    #[test]
    fn left_from_episode_jumps_to_arc() {
        let store = MemoryWatchStore::new();
        let mut state = state(&store);
        press(&mut state, &store, KeyCode::Right);
        press(&mut state, &store, KeyCode::Down);
        press(&mut state, &store, KeyCode::Right);
        press(&mut state, &store, KeyCode::Down);
        press(&mut state, &store, KeyCode::Down);
        press(&mut state, &store, KeyCode::Left);
        assert_eq!(state.table_state.selected(), Some(1));

        press(&mut state, &store, KeyCode::Left);
        assert_eq!(
            visible_rows(&state.view()),
            vec![
                TreeRow::Saga(0),
                TreeRow::Arc(0, 0),
                TreeRow::Arc(0, 1),
                TreeRow::Saga(1)
            ]
        );
    }

    #[test]
    fn quit_keys_end_the_loop() {
        let store = MemoryWatchStore::new();
        let mut state = state(&store);
        assert_eq!(press(&mut state, &store, KeyCode::Char('q')), KeyOutcome::Quit);
        assert_eq!(press(&mut state, &store, KeyCode::Esc), KeyOutcome::Quit);
        assert_eq!(
            press(&mut state, &store, KeyCode::Down),
            KeyOutcome::Continue
        );
    }
}
