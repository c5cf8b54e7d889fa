use std::collections::HashMap;

use thiserror::Error;

use crate::models::{ClubId, PositionChange, Season, StandingsRow};

/// A season label that is not of the form "<startYear>/<endYear>".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("season label '{label}' is not of the form <startYear>/<endYear>")]
pub struct SeasonLabelError {
    pub label: String,
}

/// Club → 1-based rank.
pub type Ranking = HashMap<ClubId, usize>;

pub struct StandingsEngine;

impl StandingsEngine {
    /// Order rows by points, highest first. Equal points keep their input order.
    pub fn rank(rows: &[StandingsRow]) -> Vec<StandingsRow> {
        let mut ranked = rows.to_vec();
        // sort_by is stable
        ranked.sort_by(|a, b| b.points.cmp(&a.points));
        ranked
    }

    /// Map each club of an already ranked table to its 1-based position.
    pub fn ranking_of(ranked: &[StandingsRow]) -> Ranking {
        ranked
            .iter()
            .enumerate()
            .map(|(index, row)| (row.club.id.clone(), index + 1))
            .collect()
    }

    /// Movement of each club in `current_ranked` relative to `previous`.
    /// Clubs missing from `previous` did not move.
    pub fn compute_position_changes(
        current_ranked: &[StandingsRow],
        previous: &Ranking,
    ) -> HashMap<ClubId, PositionChange> {
        current_ranked
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let rank = index + 1;
                let change = match previous.get(&row.club.id) {
                    Some(&prev) if rank < prev => PositionChange::Up,
                    Some(&prev) if rank > prev => PositionChange::Down,
                    _ => PositionChange::Neither,
                };
                (row.club.id.clone(), change)
            })
            .collect()
    }

    /// Copy of `ranked` with each row's `position_change` taken from `changes`.
    pub fn annotate(
        ranked: &[StandingsRow],
        changes: &HashMap<ClubId, PositionChange>,
    ) -> Vec<StandingsRow> {
        ranked
            .iter()
            .map(|row| StandingsRow {
                position_change: changes.get(&row.club.id).copied().unwrap_or_default(),
                ..row.clone()
            })
            .collect()
    }

    /// "2024/2025" → "2023/2024".
    pub fn previous_season_label(label: &str) -> Result<String, SeasonLabelError> {
        let malformed = || SeasonLabelError {
            label: label.to_string(),
        };

        let (start, end) = label.split_once('/').ok_or_else(malformed)?;
        let start = parse_year(start).ok_or_else(malformed)?;
        let end = parse_year(end).ok_or_else(malformed)?;

        Ok(format!("{}/{}", start - 1, end - 1))
    }
}

fn parse_year(part: &str) -> Option<i64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// The requested season if its label matches exactly, otherwise the season
/// flagged `main`. With several main seasons the first one wins.
pub fn select_season<'a>(seasons: &'a [Season], label: Option<&str>) -> Option<&'a Season> {
    let requested = label
        .filter(|l| !l.is_empty())
        .and_then(|l| seasons.iter().find(|s| s.label == l));

    requested.or_else(|| {
        let mut mains = seasons.iter().filter(|s| s.main);
        let first = mains.next();
        if mains.next().is_some() {
            tracing::warn!("More than one season is flagged main; using the first");
        }
        first
    })
}

/// Season labels for a filter control: the main season first, then the rest
/// in source order.
pub fn season_options(seasons: &[Season]) -> Vec<String> {
    let main = select_season(seasons, None).or_else(|| seasons.first());
    let Some(main) = main else {
        return Vec::new();
    };

    std::iter::once(main.label.clone())
        .chain(
            seasons
                .iter()
                .filter(|s| s.label != main.label)
                .map(|s| s.label.clone()),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Club;

    fn row(club: &str, points: i32) -> StandingsRow {
        StandingsRow {
            key: None,
            club: Club {
                id: ClubId::from(club),
                name: club.to_string(),
                link: None,
                logo: None,
            },
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            points,
            position_change: PositionChange::Neither,
        }
    }

    fn season(label: &str, main: bool) -> Season {
        Season {
            id: format!("id-{}", label),
            label: label.to_string(),
            main,
            league_table: vec![],
            skipped_table_rows: 0,
            matchweeks: vec![],
        }
    }

    fn ids(rows: &[StandingsRow]) -> Vec<&str> {
        rows.iter().map(|r| r.club.id.as_str()).collect()
    }

    #[test]
    fn test_rank_is_stable_on_equal_points() {
        let rows = vec![row("A", 10), row("B", 10), row("C", 5)];
        assert_eq!(ids(&StandingsEngine::rank(&rows)), vec!["A", "B", "C"]);

        let rows = vec![row("C", 5), row("B", 10), row("A", 10)];
        assert_eq!(ids(&StandingsEngine::rank(&rows)), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_rank_does_not_mutate_input() {
        let rows = vec![row("low", 1), row("high", 9)];
        let ranked = StandingsEngine::rank(&rows);
        assert_eq!(ids(&rows), vec!["low", "high"]);
        assert_eq!(ids(&ranked), vec!["high", "low"]);
    }

    #[test]
    fn test_position_changes() {
        let current = vec![row("X", 9), row("Y", 6), row("Z", 3)];
        let previous: Ranking = [("X", 2), ("Y", 1), ("Z", 3)]
            .into_iter()
            .map(|(id, rank)| (ClubId::from(id), rank))
            .collect();

        let changes = StandingsEngine::compute_position_changes(&current, &previous);
        assert_eq!(changes[&ClubId::from("X")], PositionChange::Up);
        assert_eq!(changes[&ClubId::from("Y")], PositionChange::Down);
        assert_eq!(changes[&ClubId::from("Z")], PositionChange::Neither);

        // same inputs, same mapping
        assert_eq!(
            changes,
            StandingsEngine::compute_position_changes(&current, &previous)
        );
    }

    #[test]
    fn test_club_missing_from_previous_is_neither() {
        let current = vec![row("NEW", 12), row("OLD", 3)];
        let previous: Ranking = [(ClubId::from("OLD"), 1)].into_iter().collect();

        let changes = StandingsEngine::compute_position_changes(&current, &previous);
        assert_eq!(changes[&ClubId::from("NEW")], PositionChange::Neither);
        assert_eq!(changes[&ClubId::from("OLD")], PositionChange::Down);
    }

    #[test]
    fn test_annotate_and_ranking_of() {
        let ranked = StandingsEngine::rank(&[row("A", 1), row("B", 4)]);
        let ranking = StandingsEngine::ranking_of(&ranked);
        assert_eq!(ranking[&ClubId::from("B")], 1);
        assert_eq!(ranking[&ClubId::from("A")], 2);

        let changes: HashMap<_, _> = [(ClubId::from("B"), PositionChange::Up)].into_iter().collect();
        let annotated = StandingsEngine::annotate(&ranked, &changes);
        assert_eq!(annotated[0].position_change, PositionChange::Up);
        assert_eq!(annotated[1].position_change, PositionChange::Neither);
    }

    #[test]
    fn test_previous_season_label() {
        assert_eq!(
            StandingsEngine::previous_season_label("2024/2025").unwrap(),
            "2023/2024"
        );
        for bad in ["2024", "", "2024/", "/2025", "2024/2025/2026", "2024 /2025", "+2024/2025", "abcd/efgh"] {
            let err = StandingsEngine::previous_season_label(bad).unwrap_err();
            assert_eq!(err.label, bad);
        }
    }

    #[test]
    fn test_select_season_falls_back_to_main() {
        let seasons = vec![season("2023/2024", false), season("2024/2025", true)];

        assert_eq!(select_season(&seasons, Some("2023/2024")).unwrap().label, "2023/2024");
        assert_eq!(select_season(&seasons, Some("1999/2000")).unwrap().label, "2024/2025");
        assert_eq!(select_season(&seasons, None).unwrap().label, "2024/2025");
        assert!(select_season(&[season("2023/2024", false)], None).is_none());
    }

    #[test]
    fn test_select_season_first_main_wins() {
        let seasons = vec![season("a", true), season("b", true)];
        assert_eq!(select_season(&seasons, None).unwrap().label, "a");
    }

    #[test]
    fn test_season_options_put_main_first() {
        let seasons = vec![
            season("2022/2023", false),
            season("2024/2025", true),
            season("2023/2024", false),
        ];
        assert_eq!(
            season_options(&seasons),
            vec!["2024/2025", "2022/2023", "2023/2024"]
        );
        assert!(season_options(&[]).is_empty());
    }
}
