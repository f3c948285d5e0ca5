use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use anyhow::Result;

use super::grouping::Grouping;

pub(crate) const WATCHED_VALUE: &str = "true";
pub(crate) const UNWATCHED_VALUE: &str = "false";

pub(crate) fn episode_key(id: u32) -> String {
    format!("episode-{id}")
}

pub(crate) fn parse_watched(raw: Option<&str>) -> bool {
    raw == Some(WATCHED_VALUE)
}

pub(crate) fn watched_value(watched: bool) -> &'static str {
    if watched {
        WATCHED_VALUE
    } else {
        UNWATCHED_VALUE
    }
}

/// Persistent per-episode watched flag. Missing keys read as unwatched.
pub(crate) trait WatchStore {
    fn get(&self, id: u32) -> Result<bool>;
    fn set(&self, id: u32, watched: bool) -> Result<()>;
}

#[derive(Debug, Default)]
pub(crate) struct MemoryWatchStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryWatchStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn raw(&self, id: u32) -> Option<String> {
        self.values.borrow().get(&episode_key(id)).cloned()
    }
}

impl WatchStore for MemoryWatchStore {
    fn get(&self, id: u32) -> Result<bool> {
        Ok(parse_watched(
            self.values.borrow().get(&episode_key(id)).map(String::as_str),
        ))
    }

    fn set(&self, id: u32, watched: bool) -> Result<()> {
        self.values
            .borrow_mut()
            .insert(episode_key(id), watched_value(watched).to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WatchSnapshot {
    watched: HashSet<u32>,
}

impl WatchSnapshot {
    pub(crate) fn load(grouping: &Grouping, store: &dyn WatchStore) -> Result<Self> {
        let mut watched = HashSet::new();
        for episode in grouping.episodes() {
            if !watched.contains(&episode.id) && store.get(episode.id)? {
                watched.insert(episode.id);
            }
        }
        Ok(Self { watched })
    }

    #[cfg(test)]
    pub(crate) fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            watched: ids.into_iter().collect(),
        }
    }

    pub(crate) fn is_watched(&self, id: u32) -> bool {
        self.watched.contains(&id)
    }

    pub(crate) fn set(&mut self, id: u32, watched: bool) {
        if watched {
            self.watched.insert(id);
        } else {
            self.watched.remove(&id);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.watched.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::arcs::ArcTable;
    use crate::app::episode::Episode;
    use crate::app::grouping::group_episodes;

    #[test]
    fn key_format_is_prefixed_episode_id() {
        assert_eq!(episode_key(428), "episode-428");
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryWatchStore::new();
        assert!(!store.get(7).expect("read missing"));

        store.set(7, true).expect("write true");
        assert!(store.get(7).expect("read true"));
        assert_eq!(store.raw(7).as_deref(), Some("true"));

        store.set(7, false).expect("write false");
        assert!(!store.get(7).expect("read false"));
        assert_eq!(store.raw(7).as_deref(), Some("false"));
    }

    #[test]
    fn unexpected_values_read_as_unwatched() {
        assert!(!parse_watched(None));
        assert!(!parse_watched(Some("")));
        assert!(!parse_watched(Some("TRUE")));
        assert!(parse_watched(Some("true")));
    }

    #[test]
    fn snapshot_loads_only_rendered_episodes() {
        let table = ArcTable::builtin().expect("builtin table");
        let grouping = group_episodes(
            &[Episode::new(1, "One", 1), Episode::new(2, "Two", 2)],
            &table,
        );
        let store = MemoryWatchStore::new();
        store.set(2, true).expect("write");
        store.set(99, true).expect("write");

        let snapshot = WatchSnapshot::load(&grouping, &store).expect("load snapshot");
        assert!(!snapshot.is_watched(1));
        assert!(snapshot.is_watched(2));
        assert!(!snapshot.is_watched(99));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn snapshot_set_toggles_membership() {
        let mut snapshot = WatchSnapshot::from_ids([3]);
        snapshot.set(4, true);
        snapshot.set(3, false);
        assert!(snapshot.is_watched(4));
        assert!(!snapshot.is_watched(3));
    }
}
