use std::ops::Add;

use super::grouping::Grouping;
use super::watch::WatchSnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Progress {
    pub(crate) watched: usize,
    pub(crate) total: usize,
}

impl Progress {
    pub(crate) fn new(watched: usize, total: usize) -> Self {
        Self { watched, total }
    }

    /// Unrounded percentage; an empty group reports 0.
    pub(crate) fn percentage(self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let value = self.watched as f64 / self.total as f64 * 100.0;
        if value.is_finite() { value } else { 0.0 }
    }

    pub(crate) fn ratio(self) -> f64 {
        (self.percentage() / 100.0).clamp(0.0, 1.0)
    }

    pub(crate) fn rounded(self) -> u32 {
        self.percentage().round() as u32
    }

    pub(crate) fn label(self) -> String {
        format!("{}%", self.rounded())
    }

    pub(crate) fn detail(self) -> String {
        format!("{}/{} ({})", self.watched, self.total, self.label())
    }
}

impl Add for Progress {
    type Output = Progress;

    fn add(self, other: Progress) -> Progress {
        Progress {
            watched: self.watched + other.watched,
            total: self.total + other.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ArcProgress {
    pub(crate) name: String,
    pub(crate) progress: Progress,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SagaProgress {
    pub(crate) name: String,
    pub(crate) progress: Progress,
    pub(crate) arcs: Vec<ArcProgress>,
}

impl SagaProgress {
    #[cfg(test)]
    pub(crate) fn arc(&self, name: &str) -> Option<&ArcProgress> {
        self.arcs.iter().find(|arc| arc.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ProgressReport {
    pub(crate) sagas: Vec<SagaProgress>,
    pub(crate) overall: Progress,
}

impl ProgressReport {
    #[cfg(test)]
    pub(crate) fn saga(&self, name: &str) -> Option<&SagaProgress> {
        self.sagas.iter().find(|saga| saga.name == name)
    }
}

/// Recomputes every level from the leaf state. Saga and overall figures are
/// summed counts, not averages of child percentages.
pub(crate) fn aggregate(grouping: &Grouping, snapshot: &WatchSnapshot) -> ProgressReport {
    let mut overall = Progress::default();
    let sagas = grouping
        .sagas
        .iter()
        .map(|saga| {
            let arcs = saga
                .arcs
                .iter()
                .map(|arc| {
                    let watched = arc
                        .episodes
                        .iter()
                        .filter(|episode| snapshot.is_watched(episode.id))
                        .count();
                    ArcProgress {
                        name: arc.name.clone(),
                        progress: Progress::new(watched, arc.episodes.len()),
                    }
                })
                .collect::<Vec<_>>();
            let progress = arcs
                .iter()
                .fold(Progress::default(), |sum, arc| sum + arc.progress);
            overall = overall + progress;
            SagaProgress {
                name: saga.name.clone(),
                progress,
                arcs,
            }
        })
        .collect();

    ProgressReport { sagas, overall }
}
