//! Aggregation engine
//!
//! Pure functions from the record store (plus a week and country selection)
//! to the derived shape each view draws. Nothing here mutates the store or
//! fails: empty or partial input yields an empty result.
//!
//! The `"Global"` pseudo-region resolves to real `Global` chart rows when the
//! dataset has them for the week; otherwise it stands for every country at
//! once, with a track's rank taken as its best (minimum) rank anywhere.

use crate::config::GLOBAL_REGION;
use crate::records::{AudioFeatures, ChartRecord, RecordStore};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Region name → most common genre for the week
pub type TopGenreMap = BTreeMap<String, String>;

/// A region joined with its genre for the selected week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionAnnotation {
    pub name: String,
    /// `None` when the region did not chart that week
    pub top_genre: Option<String>,
}

/// One song's rank in two countries for the same week
///
/// At least one rank is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedRankRow {
    pub track_name: String,
    pub rank_in_country1: Option<u32>,
    pub rank_in_country2: Option<u32>,
    pub genre: String,
}

impl PairedRankRow {
    /// Absolute rank difference, when the song charted in both countries
    pub fn rank_delta(&self) -> Option<u32> {
        match (self.rank_in_country1, self.rank_in_country2) {
            (Some(a), Some(b)) => Some(a.abs_diff(b)),
            _ => None,
        }
    }
}

/// Mean audio-feature vector for one genre in one country
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreAggregate {
    pub genre: String,
    pub averaged_features: AudioFeatures,
    pub source_country: String,
    /// Records the mean was taken over
    pub record_count: usize,
}

/// A song's chart position on one week of the timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankPoint {
    pub week: String,
    /// 1-based timeline position
    pub week_number: usize,
    pub rank: u32,
}

/// A song's rank history in one country, ascending by week
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankTrajectory {
    pub track_name: String,
    pub genre: String,
    pub points: Vec<RankPoint>,
}

/// A track's rank within one country (or Global) for a week
#[derive(Debug, Clone)]
struct TrackRank<'a> {
    track_name: &'a str,
    rank: u32,
    genre: &'a str,
}

/// Count items by key, preserving first-seen key order
fn count_first_seen<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for key in keys {
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    counts
}

/// Whether `Global` is synthesized for this week rather than read from real rows
fn is_synthetic_global(store: &RecordStore, week: &str, country: &str) -> bool {
    country == GLOBAL_REGION && !store.has_records(week, GLOBAL_REGION)
}

/// Records of one country for a week; synthetic Global yields the whole week
fn country_records<'a>(store: &'a RecordStore, week: &str, country: &str) -> Vec<&'a ChartRecord> {
    let records = store.records_for_week(week);
    if is_synthetic_global(store, week, country) {
        return records;
    }
    records.into_iter().filter(|r| r.country == country).collect()
}

/// Per-track ranks for a country and week, ascending by rank
fn country_ranks<'a>(store: &'a RecordStore, week: &str, country: &str) -> Vec<TrackRank<'a>> {
    let mut ranks: Vec<TrackRank<'a>> = Vec::new();

    if is_synthetic_global(store, week, country) {
        let mut index: HashMap<&str, usize> = HashMap::new();
        for record in store.records_for_week(week) {
            match index.get(record.track_name.as_str()) {
                Some(&i) => ranks[i].rank = ranks[i].rank.min(record.rank),
                None => {
                    index.insert(&record.track_name, ranks.len());
                    ranks.push(TrackRank {
                        track_name: &record.track_name,
                        rank: record.rank,
                        genre: &record.artist_genre,
                    });
                }
            }
        }
    } else {
        ranks = country_records(store, week, country)
            .into_iter()
            .map(|r| TrackRank {
                track_name: &r.track_name,
                rank: r.rank,
                genre: &r.artist_genre,
            })
            .collect();
    }

    // Stable: synthetic Global ties keep first-seen order
    ranks.sort_by_key(|t| t.rank);
    ranks
}

/// Most common genre per country for a week
///
/// Ties go to the genre encountered first in input order. Countries without
/// records that week are absent from the map.
pub fn top_genre_by_region(store: &RecordStore, week: &str) -> TopGenreMap {
    let mut by_country: Vec<(&str, Vec<&str>)> = Vec::new();
    for record in store.records_for_week(week) {
        let genre = record.artist_genre.as_str();
        match by_country.iter_mut().find(|(c, _)| *c == record.country) {
            Some((_, genres)) => genres.push(genre),
            None => by_country.push((record.country.as_str(), vec![genre])),
        }
    }

    let mut result = TopGenreMap::new();
    for (country, genres) in by_country {
        let mut best: Option<(&str, usize)> = None;
        for (genre, count) in count_first_seen(genres.into_iter()) {
            if best.map_or(true, |(_, n)| count > n) {
                best = Some((genre, count));
            }
        }
        if let Some((genre, _)) = best {
            result.insert(country.to_string(), genre.to_string());
        }
    }
    result
}

/// Every geometry region with its top genre for the week, in geometry order
///
/// Built fresh from [`top_genre_by_region`] each call, so no annotation from a
/// previous week can survive.
pub fn annotate_regions(store: &RecordStore, week: &str) -> Vec<RegionAnnotation> {
    let mut top = top_genre_by_region(store, week);
    store
        .regions()
        .iter()
        .map(|region| RegionAnnotation {
            name: region.name.clone(),
            top_genre: top.remove(&region.name),
        })
        .collect()
}

/// A country's songs ranked `n` or better for a week, ascending by rank
///
/// An unknown country or week yields an empty list.
pub fn top_n_ranked_songs(store: &RecordStore, week: &str, country: &str, n: u32) -> Vec<ChartRecord> {
    let mut songs: Vec<ChartRecord> = store
        .records_for_week(week)
        .into_iter()
        .filter(|r| r.country == country && r.rank <= n)
        .cloned()
        .collect();
    songs.sort_by_key(|r| r.rank);
    songs
}

/// Songs charting in either country, with their rank in each
///
/// Rows follow country A's ranking, then songs only in country B by B's
/// ranking. `country_b` may be `"Global"`.
pub fn paired_rank_rows(store: &RecordStore, week: &str, country_a: &str, country_b: &str) -> Vec<PairedRankRow> {
    let mut rows: Vec<PairedRankRow> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for track in country_ranks(store, week, country_a) {
        index.insert(track.track_name, rows.len());
        rows.push(PairedRankRow {
            track_name: track.track_name.to_string(),
            rank_in_country1: Some(track.rank),
            rank_in_country2: None,
            genre: track.genre.to_string(),
        });
    }

    for track in country_ranks(store, week, country_b) {
        match index.get(track.track_name) {
            Some(&i) => rows[i].rank_in_country2 = Some(track.rank),
            None => {
                index.insert(track.track_name, rows.len());
                rows.push(PairedRankRow {
                    track_name: track.track_name.to_string(),
                    rank_in_country1: None,
                    rank_in_country2: Some(track.rank),
                    genre: track.genre.to_string(),
                });
            }
        }
    }

    rows
}

/// The two regions a slope comparison is drawn between
///
/// A single selected country is compared against `"Global"`; with nothing
/// selected there is no comparison.
pub fn comparison_pair(countries: &[String]) -> Option<(&str, &str)> {
    match countries {
        [] => None,
        [only] => Some((only.as_str(), GLOBAL_REGION)),
        [first, second, ..] => Some((first.as_str(), second.as_str())),
    }
}

/// Mean audio features of each country's most common genres for a week
///
/// For each country in order: genres are ranked by record count, descending,
/// ties by first appearance; the top `top_genre_count` are averaged over every
/// record of that genre.
pub fn average_features_by_genre(
    store: &RecordStore,
    week: &str,
    countries: &[String],
    top_genre_count: usize,
) -> Vec<GenreAggregate> {
    let mut aggregates = Vec::new();

    for country in countries {
        let records = country_records(store, week, country);
        let mut genres = count_first_seen(records.iter().map(|r| r.artist_genre.as_str()));
        genres.sort_by(|a, b| b.1.cmp(&a.1));

        for (genre, _) in genres.into_iter().take(top_genre_count) {
            let matching: Vec<&ChartRecord> = records
                .iter()
                .copied()
                .filter(|r| r.artist_genre == genre)
                .collect();
            if matching.is_empty() {
                continue;
            }

            let mut sums = AudioFeatures::new();
            for record in &matching {
                for (name, value) in &record.audio_features {
                    *sums.entry(name.clone()).or_insert(0.0) += value;
                }
            }
            let count = matching.len() as f64;
            let averaged_features = sums.into_iter().map(|(name, sum)| (name, sum / count)).collect();

            aggregates.push(GenreAggregate {
                genre: genre.to_string(),
                averaged_features,
                source_country: country.clone(),
                record_count: matching.len(),
            });
        }
    }

    aggregates
}

/// Rank history of the given tracks in one country across every week
///
/// Tracks that never charted there are left out.
pub fn rank_trajectories(store: &RecordStore, country: &str, tracks: &[String]) -> Vec<RankTrajectory> {
    let records = store.records_for_country(country);

    tracks
        .iter()
        .filter_map(|track| {
            let by_week: HashMap<&str, &ChartRecord> = records
                .iter()
                .filter(|r| r.track_name == *track)
                .map(|r| (r.week.as_str(), *r))
                .collect();
            let first = records.iter().find(|r| r.track_name == *track)?;

            let points = store
                .all_weeks()
                .iter()
                .enumerate()
                .filter_map(|(i, week)| {
                    by_week.get(week.as_str()).map(|r| RankPoint {
                        week: week.clone(),
                        week_number: i + 1,
                        rank: r.rank,
                    })
                })
                .collect();

            Some(RankTrajectory {
                track_name: track.clone(),
                genre: first.artist_genre.clone(),
                points,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::tests::{row, store};
    use std::collections::BTreeSet;

    const W1: &str = "2022-06-16";
    const W2: &str = "2022-06-23";

    fn two_country_store() -> RecordStore {
        store(
            &[
                row(W1, "Canada", 1, "As It Was", "pop", 0.5),
                row(W1, "Canada", 2, "Jimmy Cooks", "rap", 0.5),
                row(W1, "Canada", 3, "Wait For U", "rap", 0.5),
                row(W1, "United States", 1, "Wait For U", "rap", 0.5),
                row(W1, "United States", 2, "Me Porto Bonito", "reggaeton", 0.5),
                row(W1, "United States", 3, "As It Was", "pop", 0.5),
                row(W2, "Canada", 1, "Jimmy Cooks", "rap", 0.5),
                row(W2, "Canada", 2, "As It Was", "pop", 0.5),
            ],
            &["Canada", "United States", "Mexico"],
        )
    }

    #[test]
    fn test_top_genre_picks_max_count() {
        let s = two_country_store();
        let top = top_genre_by_region(&s, W1);
        assert_eq!(top.get("Canada").map(String::as_str), Some("rap"));
        // 1 rap, 1 reggaeton, 1 pop: first seen wins
        assert_eq!(top.get("United States").map(String::as_str), Some("rap"));
        assert!(!top.contains_key("Mexico"));
    }

    #[test]
    fn test_top_genre_tie_goes_to_first_seen() {
        let s = store(
            &[
                row(W1, "Chile", 1, "A", "latin", 0.5),
                row(W1, "Chile", 2, "B", "pop", 0.5),
                row(W1, "Chile", 3, "C", "pop", 0.5),
                row(W1, "Chile", 4, "D", "latin", 0.5),
            ],
            &["Chile"],
        );
        assert_eq!(top_genre_by_region(&s, W1).get("Chile").map(String::as_str), Some("latin"));
    }

    #[test]
    fn test_annotations_recomputed_per_week() {
        let s = two_country_store();
        let w1 = annotate_regions(&s, W1);
        assert_eq!(w1.len(), 3);
        assert_eq!(w1[1].top_genre.as_deref(), Some("rap"));

        let w2 = annotate_regions(&s, W2);
        assert_eq!(w2[0].name, "Canada");
        assert!(w2[0].top_genre.is_some());
        assert_eq!(w2[1].name, "United States");
        assert_eq!(w2[1].top_genre, None);
        assert!(annotate_regions(&s, "2030-01-01").iter().all(|a| a.top_genre.is_none()));
    }

    #[test]
    fn test_top_n_sorted_and_bounded() {
        let s = two_country_store();
        let top2 = top_n_ranked_songs(&s, W1, "Canada", 2);
        assert_eq!(top2.len(), 2);
        assert_eq!(top2[0].rank, 1);
        assert_eq!(top2[1].rank, 2);

        for week in s.all_weeks() {
            for country in ["Canada", "United States"] {
                for n in 1..=5 {
                    let songs = top_n_ranked_songs(&s, week, country, n);
                    assert!(songs.len() <= n as usize);
                    assert!(songs.iter().all(|r| r.rank <= n));
                    assert!(songs.windows(2).all(|w| w[0].rank < w[1].rank));
                }
            }
        }
    }

    #[test]
    fn test_top_n_unknown_country_is_empty() {
        let s = two_country_store();
        assert!(top_n_ranked_songs(&s, W1, "Atlantis", 5).is_empty());
        assert!(top_n_ranked_songs(&s, "1999-01-01", "Canada", 5).is_empty());
    }

    #[test]
    fn test_paired_rows_join_on_track() {
        let s = two_country_store();
        let rows = paired_rank_rows(&s, W1, "Canada", "United States");
        let summary: Vec<_> = rows
            .iter()
            .map(|r| (r.track_name.as_str(), r.rank_in_country1, r.rank_in_country2))
            .collect();
        assert_eq!(
            summary,
            [
                ("As It Was", Some(1), Some(3)),
                ("Jimmy Cooks", Some(2), None),
                ("Wait For U", Some(3), Some(1)),
                ("Me Porto Bonito", None, Some(2)),
            ]
        );
        assert_eq!(rows[0].rank_delta(), Some(2));
        assert_eq!(rows[1].rank_delta(), None);
        assert!(rows.iter().all(|r| r.rank_in_country1.is_some() || r.rank_in_country2.is_some()));
    }

    #[test]
    fn test_paired_rows_cover_both_track_sets() {
        let s = two_country_store();
        for (a, b) in [("Canada", "United States"), ("United States", "Canada"), ("Canada", "Mexico")] {
            let rows = paired_rank_rows(&s, W1, a, b);
            let paired: BTreeSet<_> = rows.iter().map(|r| r.track_name.clone()).collect();
            let expected: BTreeSet<_> = top_n_ranked_songs(&s, W1, a, u32::MAX)
                .into_iter()
                .chain(top_n_ranked_songs(&s, W1, b, u32::MAX))
                .map(|r| r.track_name)
                .collect();
            assert_eq!(paired, expected);
        }
    }

    #[test]
    fn test_synthetic_global_uses_minimum_rank() {
        let s = two_country_store();
        let rows = paired_rank_rows(&s, W1, "Canada", GLOBAL_REGION);
        let get = |t: &str| rows.iter().find(|r| r.track_name == t).unwrap().clone();

        assert_eq!(get("As It Was").rank_in_country2, Some(1));
        assert_eq!(get("Wait For U").rank_in_country2, Some(1));
        assert_eq!(get("Jimmy Cooks").rank_in_country2, Some(2));
        let porto = get("Me Porto Bonito");
        assert_eq!((porto.rank_in_country1, porto.rank_in_country2), (None, Some(2)));
    }

    #[test]
    fn test_real_global_rows_take_precedence() {
        let s = store(
            &[
                row(W1, "Canada", 1, "A", "pop", 0.5),
                row(W1, "Global", 1, "B", "rock", 0.5),
                row(W1, "Global", 2, "A", "pop", 0.5),
            ],
            &["Canada"],
        );
        let rows = paired_rank_rows(&s, W1, "Canada", GLOBAL_REGION);
        assert_eq!(rows[0].rank_in_country2, Some(2));
        assert_eq!(rows[1].track_name, "B");
    }

    #[test]
    fn test_comparison_pair_materializes_global() {
        assert_eq!(comparison_pair(&[]), None);
        let one = vec!["Canada".to_string()];
        assert_eq!(comparison_pair(&one), Some(("Canada", GLOBAL_REGION)));
        let two = vec!["Canada".to_string(), "Mexico".to_string()];
        assert_eq!(comparison_pair(&two), Some(("Canada", "Mexico")));
    }

    #[test]
    fn test_average_features_by_genre() {
        let s = store(
            &[
                row(W1, "Canada", 1, "A", "pop", 0.4),
                row(W1, "Canada", 2, "B", "rock", 0.8),
                row(W1, "Canada", 3, "C", "pop", 0.6),
            ],
            &["Canada"],
        );
        let aggregates = average_features_by_genre(&s, W1, &["Canada".to_string()], 2);
        assert_eq!(aggregates.len(), 2);

        assert_eq!(aggregates[0].genre, "pop");
        assert_eq!(aggregates[0].record_count, 2);
        assert!((aggregates[0].averaged_features["danceability"] - 0.5).abs() < 1e-9);
        assert_eq!(aggregates[0].source_country, "Canada");

        assert_eq!(aggregates[1].genre, "rock");
        assert!((aggregates[1].averaged_features["danceability"] - 0.8).abs() < 1e-9);
        assert!(aggregates.iter().all(|a| a.averaged_features.values().all(|v| v.is_finite())));
    }

    #[test]
    fn test_average_features_truncates_and_groups_per_country() {
        let s = two_country_store();
        let countries = vec!["Canada".to_string(), "United States".to_string()];
        let aggregates = average_features_by_genre(&s, W1, &countries, 1);
        let summary: Vec<_> = aggregates
            .iter()
            .map(|a| (a.source_country.as_str(), a.genre.as_str()))
            .collect();
        assert_eq!(summary, [("Canada", "rap"), ("United States", "rap")]);

        assert!(average_features_by_genre(&s, W1, &countries, 0).is_empty());
        assert!(average_features_by_genre(&s, W1, &[], 3).is_empty());
        assert!(average_features_by_genre(&s, W1, &["Mexico".to_string()], 3).is_empty());
    }

    #[test]
    fn test_rank_trajectories_follow_timeline() {
        let s = two_country_store();
        let tracks = vec!["As It Was".to_string(), "Wait For U".to_string(), "Unknown".to_string()];
        let trajectories = rank_trajectories(&s, "Canada", &tracks);
        assert_eq!(trajectories.len(), 2);

        let ranks: Vec<_> = trajectories[0].points.iter().map(|p| (p.week_number, p.rank)).collect();
        assert_eq!(ranks, [(1, 1), (2, 2)]);
        assert_eq!(trajectories[1].points.len(), 1);
        assert_eq!(trajectories[1].genre, "rap");
    }
}
