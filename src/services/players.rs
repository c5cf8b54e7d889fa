use serde::Deserialize;

use crate::models::Player;

/// Club filter value that disables club filtering.
pub const ALL_CLUBS: &str = "All Clubs";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerFilter {
    pub club: Option<String>,
    pub search: Option<String>,
    pub season: Option<String>,
}

impl PlayerFilter {
    fn club(&self) -> Option<String> {
        self.club
            .as_deref()
            .filter(|c| !c.is_empty() && *c != ALL_CLUBS)
            .map(str::to_lowercase)
    }

    fn search(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn season(&self) -> Option<&str> {
        self.season.as_deref().filter(|s| !s.is_empty())
    }

    pub fn matches(&self, player: &Player) -> bool {
        if let Some(club) = self.club() {
            let plays_for = player
                .club
                .as_ref()
                .is_some_and(|c| c.name.to_lowercase() == club);
            if !plays_for {
                return false;
            }
        }

        if let Some(search) = self.search() {
            if !player.full_name().to_lowercase().contains(&search) {
                return false;
            }
        }

        if let Some(season) = self.season() {
            if !player.related_seasons.iter().any(|s| s == season) {
                return false;
            }
        }

        true
    }
}

/// Players passing `filter`, in source order.
pub fn filter_players<'a>(players: &'a [Player], filter: &PlayerFilter) -> Vec<&'a Player> {
    players.iter().filter(|p| filter.matches(p)).collect()
}

/// Look a player up by the `first-last` slug used in profile links.
pub fn find_by_slug<'a>(players: &'a [Player], slug: &str) -> Option<&'a Player> {
    let slug = slug.to_lowercase();
    players.iter().find(|p| p.slug() == slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Club, ClubId};

    fn player(first: &str, last: &str, club: Option<&str>, seasons: &[&str]) -> Player {
        Player {
            id: format!("{}-{}", first, last),
            first_name: first.to_string(),
            last_name: last.to_string(),
            club: club.map(|name| Club {
                id: ClubId::from(name),
                name: name.to_string(),
                link: None,
                logo: None,
            }),
            position: None,
            nationality: None,
            number: None,
            date_of_birth: None,
            height: None,
            related_seasons: seasons.iter().map(|s| s.to_string()).collect(),
            season_stats: vec![],
        }
    }

    fn roster() -> Vec<Player> {
        vec![
            player("Ada", "Striker", Some("Athletic"), &["2024/2025"]),
            player("Bo", "Keeper", Some("Borough"), &["2023/2024", "2024/2025"]),
            player("Cy", "Adams", None, &["2023/2024"]),
        ]
    }

    fn names(players: &[&Player]) -> Vec<String> {
        players.iter().map(|p| p.full_name()).collect()
    }

    #[test]
    fn test_no_filter_keeps_everyone() {
        let players = roster();
        assert_eq!(filter_players(&players, &PlayerFilter::default()).len(), 3);

        let all_clubs = PlayerFilter {
            club: Some(ALL_CLUBS.to_string()),
            ..Default::default()
        };
        assert_eq!(filter_players(&players, &all_clubs).len(), 3);
    }

    #[test]
    fn test_filter_by_club_is_case_insensitive() {
        let players = roster();
        let filter = PlayerFilter {
            club: Some("borough".into()),
            ..Default::default()
        };
        assert_eq!(names(&filter_players(&players, &filter)), vec!["Bo Keeper"]);
    }

    #[test]
    fn test_search_matches_across_first_and_last_name() {
        let players = roster();
        let filter = PlayerFilter {
            search: Some("a st".into()),
            ..Default::default()
        };
        assert_eq!(names(&filter_players(&players, &filter)), vec!["Ada Striker"]);

        let filter = PlayerFilter {
            search: Some("AD".into()),
            ..Default::default()
        };
        assert_eq!(
            names(&filter_players(&players, &filter)),
            vec!["Ada Striker", "Cy Adams"]
        );
    }

    #[test]
    fn test_filters_combine() {
        let players = roster();
        let filter = PlayerFilter {
            club: None,
            search: Some("a".into()),
            season: Some("2023/2024".into()),
        };
        assert_eq!(names(&filter_players(&players, &filter)), vec!["Cy Adams"]);
    }

    #[test]
    fn test_find_by_slug() {
        let players = roster();
        assert_eq!(find_by_slug(&players, "Bo-Keeper").unwrap().id, "Bo-Keeper");
        assert!(find_by_slug(&players, "nobody-here").is_none());
    }
}
