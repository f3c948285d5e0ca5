use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

const BUILTIN_TABLE: &str = include_str!("../../data/arcs.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "(u32, u32)")]
pub(crate) struct EpisodeRange {
    pub(crate) low: u32,
    pub(crate) high: u32,
}

impl From<(u32, u32)> for EpisodeRange {
    fn from((low, high): (u32, u32)) -> Self {
        Self { low, high }
    }
}

impl EpisodeRange {
    pub(crate) fn contains(self, id: u32) -> bool {
        self.low <= id && id <= self.high
    }

    fn intersects(self, other: EpisodeRange) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

impl fmt::Display for EpisodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ArcDefinition {
    pub(crate) name: String,
    pub(crate) ranges: Vec<EpisodeRange>,
}

impl ArcDefinition {
    pub(crate) fn covers(&self, id: u32) -> bool {
        self.ranges.iter().any(|range| range.contains(id))
    }

    pub(crate) fn episode_span(&self) -> u32 {
        self.ranges
            .iter()
            .map(|range| range.high - range.low + 1)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct SagaDefinition {
    pub(crate) name: String,
    pub(crate) arcs: Vec<ArcDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArcMatch<'a> {
    pub(crate) saga: &'a str,
    pub(crate) arc: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ArcOverlap {
    pub(crate) first: String,
    pub(crate) second: String,
    pub(crate) range: EpisodeRange,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ArcTableError {
    #[error("arc table is not valid JSON: {0}")]
    Parse(String),
    #[error("arc table defines no sagas")]
    Empty,
    #[error("saga #{index} has an empty name")]
    UnnamedSaga { index: usize },
    #[error("duplicate saga name `{saga}`")]
    DuplicateSaga { saga: String },
    #[error("saga `{saga}` defines no arcs")]
    SagaWithoutArcs { saga: String },
    #[error("saga `{saga}` has an arc with an empty name")]
    UnnamedArc { saga: String },
    #[error("duplicate arc `{arc}` in saga `{saga}`")]
    DuplicateArc { saga: String, arc: String },
    #[error("arc `{arc}` in saga `{saga}` has no episode ranges")]
    ArcWithoutRanges { saga: String, arc: String },
    #[error("arc `{arc}` in saga `{saga}` has inverted range {low}-{high}")]
    InvertedRange {
        saga: String,
        arc: String,
        low: u32,
        high: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ArcTable {
    sagas: Vec<SagaDefinition>,
}

impl ArcTable {
    pub(crate) fn builtin() -> Result<Self, ArcTableError> {
        Self::from_json(BUILTIN_TABLE)
    }

    pub(crate) fn from_json(raw: &str) -> Result<Self, ArcTableError> {
        let table: ArcTable =
            serde_json::from_str(raw).map_err(|err| ArcTableError::Parse(err.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    #[cfg(test)]
    pub(crate) fn from_sagas(sagas: Vec<SagaDefinition>) -> Result<Self, ArcTableError> {
        let table = Self { sagas };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), ArcTableError> {
        if self.sagas.is_empty() {
            return Err(ArcTableError::Empty);
        }

        let mut saga_names = HashSet::new();
        for (index, saga) in self.sagas.iter().enumerate() {
            if saga.name.trim().is_empty() {
                return Err(ArcTableError::UnnamedSaga { index });
            }
            if !saga_names.insert(saga.name.as_str()) {
                return Err(ArcTableError::DuplicateSaga {
                    saga: saga.name.clone(),
                });
            }
            if saga.arcs.is_empty() {
                return Err(ArcTableError::SagaWithoutArcs {
                    saga: saga.name.clone(),
                });
            }

            let mut arc_names = HashSet::new();
            for arc in &saga.arcs {
                if arc.name.trim().is_empty() {
                    return Err(ArcTableError::UnnamedArc {
                        saga: saga.name.clone(),
                    });
                }
                if !arc_names.insert(arc.name.as_str()) {
                    return Err(ArcTableError::DuplicateArc {
                        saga: saga.name.clone(),
                        arc: arc.name.clone(),
                    });
                }
                if arc.ranges.is_empty() {
                    return Err(ArcTableError::ArcWithoutRanges {
                        saga: saga.name.clone(),
                        arc: arc.name.clone(),
                    });
                }
                if let Some(range) = arc.ranges.iter().find(|range| range.low > range.high) {
                    return Err(ArcTableError::InvertedRange {
                        saga: saga.name.clone(),
                        arc: arc.name.clone(),
                        low: range.low,
                        high: range.high,
                    });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn sagas(&self) -> &[SagaDefinition] {
        &self.sagas
    }

    pub(crate) fn arc_count(&self) -> usize {
        self.sagas.iter().map(|saga| saga.arcs.len()).sum()
    }

    /// Every (saga, arc) whose ranges cover `id`, in table order.
    pub(crate) fn classify(&self, id: u32) -> Vec<ArcMatch<'_>> {
        self.sagas
            .iter()
            .flat_map(|saga| {
                saga.arcs
                    .iter()
                    .filter(move |arc| arc.covers(id))
                    .map(move |arc| ArcMatch {
                        saga: &saga.name,
                        arc: &arc.name,
                    })
            })
            .collect()
    }

    fn ranges(&self) -> impl Iterator<Item = (&str, EpisodeRange)> {
        self.sagas.iter().flat_map(|saga| {
            saga.arcs
                .iter()
                .flat_map(|arc| arc.ranges.iter().map(move |range| (arc.name.as_str(), *range)))
        })
    }

    pub(crate) fn first_covered(&self) -> Option<u32> {
        self.ranges().map(|(_, range)| range.low).min()
    }

    pub(crate) fn last_covered(&self) -> Option<u32> {
        self.ranges().map(|(_, range)| range.high).max()
    }

    pub(crate) fn overlaps(&self) -> Vec<ArcOverlap> {
        let ranges = self.ranges().collect::<Vec<_>>();
        let mut out = Vec::new();
        for (idx, (first, left)) in ranges.iter().enumerate() {
            for (second, right) in &ranges[idx + 1..] {
                if left.intersects(*right) {
                    out.push(ArcOverlap {
                        first: first.to_string(),
                        second: second.to_string(),
                        range: EpisodeRange {
                            low: left.low.max(right.low),
                            high: left.high.min(right.high),
                        },
                    });
                }
            }
        }
        out
    }

    pub(crate) fn gaps(&self) -> Vec<EpisodeRange> {
        let mut ranges = self.ranges().map(|(_, range)| range).collect::<Vec<_>>();
        ranges.sort_by_key(|range| (range.low, range.high));

        let mut gaps = Vec::new();
        let mut covered_to: Option<u32> = None;
        for range in ranges {
            if let Some(end) = covered_to
                && range.low > end.saturating_add(1)
            {
                gaps.push(EpisodeRange {
                    low: end + 1,
                    high: range.low - 1,
                });
            }
            covered_to = Some(covered_to.map_or(range.high, |end| end.max(range.high)));
        }
        gaps
    }
}
