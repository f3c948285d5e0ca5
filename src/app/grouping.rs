use super::arcs::ArcTable;
use super::episode::Episode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GroupedArc {
    pub(crate) name: String,
    pub(crate) episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GroupedSaga {
    pub(crate) name: String,
    pub(crate) arcs: Vec<GroupedArc>,
}

impl GroupedSaga {
    pub(crate) fn arc(&self, name: &str) -> Option<&GroupedArc> {
        self.arcs.iter().find(|arc| arc.name == name)
    }

    pub(crate) fn episode_count(&self) -> usize {
        self.arcs.iter().map(|arc| arc.episodes.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Grouping {
    pub(crate) sagas: Vec<GroupedSaga>,
    pub(crate) unclassified: Vec<Episode>,
}

impl Grouping {
    pub(crate) fn saga(&self, name: &str) -> Option<&GroupedSaga> {
        self.sagas.iter().find(|saga| saga.name == name)
    }

    pub(crate) fn rendered_episode_count(&self) -> usize {
        self.sagas.iter().map(GroupedSaga::episode_count).sum()
    }

    pub(crate) fn episodes(&self) -> impl Iterator<Item = &Episode> {
        self.sagas
            .iter()
            .flat_map(|saga| saga.arcs.iter())
            .flat_map(|arc| arc.episodes.iter())
    }

    pub(crate) fn contains_episode(&self, id: u32) -> bool {
        self.episodes().any(|episode| episode.id == id)
    }
}

pub(crate) fn group_episodes(episodes: &[Episode], table: &ArcTable) -> Grouping {
    let mut sagas: Vec<GroupedSaga> = Vec::new();
    let mut unclassified = Vec::new();

    for episode in episodes {
        let matches = table.classify(episode.id);
        if matches.is_empty() {
            unclassified.push(episode.clone());
            continue;
        }

        for found in matches {
            let saga_idx = match sagas.iter().position(|saga| saga.name == found.saga) {
                Some(idx) => idx,
                None => {
                    let idx = insertion_index(&sagas, found.saga, table);
                    sagas.insert(
                        idx,
                        GroupedSaga {
                            name: found.saga.to_string(),
                            arcs: Vec::new(),
                        },
                    );
                    idx
                }
            };
            let saga = &mut sagas[saga_idx];

            match saga.arcs.iter_mut().find(|arc| arc.name == found.arc) {
                Some(arc) => arc.episodes.push(episode.clone()),
                None => saga.arcs.push(GroupedArc {
                    name: found.arc.to_string(),
                    episodes: vec![episode.clone()],
                }),
            }
        }
    }

    Grouping {
        sagas,
        unclassified,
    }
}

fn insertion_index(sagas: &[GroupedSaga], saga_name: &str, table: &ArcTable) -> usize {
    let table_position = |name: &str| {
        table
            .sagas()
            .iter()
            .position(|saga| saga.name == name)
            .unwrap_or(usize::MAX)
    };
    let target = table_position(saga_name);
    sagas
        .iter()
        .position(|saga| table_position(&saga.name) > target)
        .unwrap_or(sagas.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::arcs::{ArcDefinition, EpisodeRange, SagaDefinition};

    fn episodes(ids: impl IntoIterator<Item = u32>) -> Vec<Episode> {
        ids.into_iter()
            .map(|id| Episode::new(id, format!("Title {id}"), id))
            .collect()
    }

    fn names(grouping: &Grouping) -> Vec<(String, Vec<String>)> {
        grouping
            .sagas
            .iter()
            .map(|saga| {
                (
                    saga.name.clone(),
                    saga.arcs.iter().map(|arc| arc.name.clone()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn groups_episodes_by_saga_and_arc() {
        let table = ArcTable::builtin().expect("builtin table");
        let grouping = group_episodes(&episodes([1, 2, 3, 4, 64]), &table);

        assert_eq!(
            names(&grouping),
            vec![
                (
                    "East Blue Saga".to_string(),
                    vec!["Romance Dawn Arc".to_string(), "Orange Town Arc".to_string()]
                ),
                (
                    "Alabasta Saga".to_string(),
                    vec!["Whiskey Peak Arc".to_string()]
                ),
            ]
        );
        let romance = grouping
            .saga("East Blue Saga")
            .and_then(|saga| saga.arc("Romance Dawn Arc"))
            .expect("romance dawn grouped");
        assert_eq!(
            romance.episodes.iter().map(|ep| ep.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(grouping.unclassified.is_empty());
        assert_eq!(grouping.rendered_episode_count(), 5);
    }

    #[test]
    fn preserves_input_order_within_arc() {
        let table = ArcTable::builtin().expect("builtin table");
        let grouping = group_episodes(&episodes([3, 1, 2]), &table);
        let arc = &grouping.sagas[0].arcs[0];
        assert_eq!(
            arc.episodes.iter().map(|ep| ep.id).collect::<Vec<_>>(),
            vec![3, 1, 2]
        );
    }

    #[test]
    fn saga_order_follows_table_not_input() {
        let table = ArcTable::builtin().expect("builtin table");
        let grouping = group_episodes(&episodes([64, 1]), &table);
        assert_eq!(grouping.sagas[0].name, "East Blue Saga");
        assert_eq!(grouping.sagas[1].name, "Alabasta Saga");
    }

    #[test]
    fn arc_order_is_first_match_order() {
        let table = ArcTable::builtin().expect("builtin table");
        let grouping = group_episodes(&episodes([426, 422, 430]), &table);
        let saga = grouping.saga("Summit War Saga").expect("summit war grouped");
        assert_eq!(
            saga.arcs.iter().map(|arc| arc.name.as_str()).collect::<Vec<_>>(),
            vec!["Little East Blue Arc (Filler)", "Impel Down Arc"]
        );
        assert_eq!(
            saga.arc("Impel Down Arc")
                .map(|arc| arc.episodes.iter().map(|ep| ep.id).collect::<Vec<_>>()),
            Some(vec![422, 430])
        );
    }

    #[test]
    fn unmapped_episodes_are_kept_aside() {
        let table = ArcTable::builtin().expect("builtin table");
        let grouping = group_episodes(&episodes([336, 1, 2000]), &table);
        assert_eq!(
            grouping.unclassified.iter().map(|ep| ep.id).collect::<Vec<_>>(),
            vec![336, 2000]
        );
        assert_eq!(grouping.rendered_episode_count(), 1);
        assert!(!grouping.contains_episode(336));
    }

    #[test]
    fn sagas_without_matches_are_omitted() {
        let table = ArcTable::builtin().expect("builtin table");
        let grouping = group_episodes(&episodes([1]), &table);
        assert_eq!(grouping.sagas.len(), 1);
        assert!(grouping.saga("Alabasta Saga").is_none());

        let empty = group_episodes(&[], &table);
        assert_eq!(empty, Grouping::default());
    }

    #[test]
    fn overlapping_arcs_receive_the_same_episode() {
        let table = ArcTable::from_sagas(vec![SagaDefinition {
            name: "Saga".to_string(),
            arcs: vec![
                ArcDefinition {
                    name: "First".to_string(),
                    ranges: vec![EpisodeRange { low: 1, high: 5 }],
                },
                ArcDefinition {
                    name: "Second".to_string(),
                    ranges: vec![EpisodeRange { low: 5, high: 9 }],
                },
            ],
        }])
        .expect("valid table");
        let grouping = group_episodes(&episodes([5]), &table);
        let saga = &grouping.sagas[0];
        assert_eq!(saga.arcs.len(), 2);
        assert_eq!(saga.arcs[0].episodes[0].id, 5);
        assert_eq!(saga.arcs[1].episodes[0].id, 5);
        assert_eq!(grouping.rendered_episode_count(), 2);
    }

    #[test]
    fn grouping_is_idempotent() {
        let table = ArcTable::builtin().expect("builtin table");
        let input = episodes((1..=1100).rev());
        let first = group_episodes(&input, &table);
        let second = group_episodes(&input, &table);
        assert_eq!(first, second);
    }
}
