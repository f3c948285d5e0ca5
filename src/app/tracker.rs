use std::collections::HashSet;

use anyhow::{Result, bail};
use tracing::{debug, info};

use super::arcs::ArcTable;
use super::catalog::{CatalogOrigin, CatalogSource, load_episodes};
use super::episode::Episode;
use super::grouping::{Grouping, group_episodes};
use super::progress::{Progress, ProgressReport, aggregate};
use super::watch::{WatchSnapshot, WatchStore};

#[derive(Debug, Clone)]
pub(crate) struct Tracker {
    grouping: Grouping,
    snapshot: WatchSnapshot,
    report: ProgressReport,
    origin: CatalogOrigin,
}

impl Tracker {
    pub(crate) fn build(
        source: &mut dyn CatalogSource,
        store: &dyn WatchStore,
        table: &ArcTable,
    ) -> Result<Self> {
        let loaded = load_episodes(source);
        Self::from_episodes(&loaded.episodes, loaded.origin, store, table)
    }

    pub(crate) fn from_episodes(
        episodes: &[Episode],
        origin: CatalogOrigin,
        store: &dyn WatchStore,
        table: &ArcTable,
    ) -> Result<Self> {
        let grouping = group_episodes(episodes, table);
        info!(
            sagas = grouping.sagas.len(),
            rendered = grouping.rendered_episode_count(),
            unclassified = grouping.unclassified.len(),
            "episodes grouped"
        );
        let snapshot = WatchSnapshot::load(&grouping, store)?;
        let report = aggregate(&grouping, &snapshot);
        Ok(Self {
            grouping,
            snapshot,
            report,
            origin,
        })
    }

    pub(crate) fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    pub(crate) fn report(&self) -> &ProgressReport {
        &self.report
    }

    pub(crate) fn origin(&self) -> &CatalogOrigin {
        &self.origin
    }

    #[cfg(test)]
    pub(crate) fn is_watched(&self, id: u32) -> bool {
        self.snapshot.is_watched(id)
    }

    pub(crate) fn toggle(&mut self, store: &dyn WatchStore, id: u32) -> Result<bool> {
        let watched = !self.snapshot.is_watched(id);
        self.set_watched(store, id, watched)?;
        Ok(watched)
    }

    pub(crate) fn set_watched(
        &mut self,
        store: &dyn WatchStore,
        id: u32,
        watched: bool,
    ) -> Result<()> {
        if !self.grouping.contains_episode(id) {
            bail!("no rendered episode with id {id}");
        }
        store.set(id, watched)?;
        self.snapshot.set(id, watched);
        self.report = aggregate(&self.grouping, &self.snapshot);
        debug!(id, watched, overall = %self.report.overall.label(), "watch state changed");
        Ok(())
    }

    pub(crate) fn set_arc_watched(
        &mut self,
        store: &dyn WatchStore,
        saga: &str,
        arc: &str,
        watched: bool,
    ) -> Result<usize> {
        let Some(grouped) = self
            .grouping
            .saga(saga)
            .and_then(|grouped_saga| grouped_saga.arc(arc))
        else {
            bail!("no rendered arc `{arc}` in saga `{saga}`");
        };
        let ids = grouped
            .episodes
            .iter()
            .map(|episode| episode.id)
            .filter(|id| self.snapshot.is_watched(*id) != watched)
            .collect::<Vec<_>>();
        let mut changed = 0;
        let mut outcome = Ok(());
        for id in &ids {
            if let Err(err) = store.set(*id, watched) {
                outcome = Err(err);
                break;
            }
            self.snapshot.set(*id, watched);
            changed += 1;
        }
        // Report must match the snapshot even after a partial write.
        self.report = aggregate(&self.grouping, &self.snapshot);
        debug!(saga, arc, watched, changed, "arc watch state changed");
        outcome.map(|()| changed)
    }

    pub(crate) fn view(&self, expansion: &Expansion) -> TrackerView {
        let sagas = self
            .grouping
            .sagas
            .iter()
            .zip(&self.report.sagas)
            .map(|(saga, saga_progress)| SagaView {
                name: saga.name.clone(),
                expanded: expansion.is_saga_expanded(&saga.name),
                progress: saga_progress.progress,
                arcs: saga
                    .arcs
                    .iter()
                    .zip(&saga_progress.arcs)
                    .map(|(arc, arc_progress)| ArcView {
                        name: arc.name.clone(),
                        expanded: expansion.is_arc_expanded(&saga.name, &arc.name),
                        progress: arc_progress.progress,
                        episodes: arc
                            .episodes
                            .iter()
                            .map(|episode| EpisodeRow {
                                id: episode.id,
                                title: episode.title.clone(),
                                checked: self.snapshot.is_watched(episode.id),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        TrackerView {
            sagas,
            overall: self.report.overall,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Expansion {
    sagas: HashSet<String>,
    arcs: HashSet<(String, String)>,
}

impl Expansion {
    pub(crate) fn is_saga_expanded(&self, saga: &str) -> bool {
        self.sagas.contains(saga)
    }

    pub(crate) fn is_arc_expanded(&self, saga: &str, arc: &str) -> bool {
        self.arcs.contains(&(saga.to_string(), arc.to_string()))
    }

    pub(crate) fn toggle_saga(&mut self, saga: &str) {
        if !self.sagas.remove(saga) {
            self.sagas.insert(saga.to_string());
        }
    }

    pub(crate) fn toggle_arc(&mut self, saga: &str, arc: &str) {
        let key = (saga.to_string(), arc.to_string());
        if !self.arcs.remove(&key) {
            self.arcs.insert(key);
        }
    }

    pub(crate) fn set_saga(&mut self, saga: &str, expanded: bool) {
        if expanded != self.is_saga_expanded(saga) {
            self.toggle_saga(saga);
        }
    }

    pub(crate) fn set_arc(&mut self, saga: &str, arc: &str, expanded: bool) {
        if expanded != self.is_arc_expanded(saga, arc) {
            self.toggle_arc(saga, arc);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrackerView {
    pub(crate) sagas: Vec<SagaView>,
    pub(crate) overall: Progress,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SagaView {
    pub(crate) name: String,
    pub(crate) expanded: bool,
    pub(crate) progress: Progress,
    pub(crate) arcs: Vec<ArcView>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ArcView {
    pub(crate) name: String,
    pub(crate) expanded: bool,
    pub(crate) progress: Progress,
    pub(crate) episodes: Vec<EpisodeRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EpisodeRow {
    pub(crate) id: u32,
    pub(crate) title: String,
    pub(crate) checked: bool,
}

impl EpisodeRow {
    pub(crate) fn label(&self) -> String {
        format!("Episode {}: {}", self.id, self.title)
    }
}
