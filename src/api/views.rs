//! JSON shapes served by the API, built from domain records at request time.

use std::num::NonZeroUsize;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{
    CareerTotals, Club, Fixture, Matchweek, Player, PositionChange, Score, Season, SeasonStat,
};
use crate::services::content::ContentClient;
use crate::services::players::{filter_players, PlayerFilter};
use crate::services::scheduler::{page, DayGroup, FixtureScheduler};
use crate::services::StandingsEngine;
use crate::utils::{age_on, date_label, kickoff_label};

#[derive(Debug, Serialize)]
pub struct ClubView {
    pub id: String,
    pub name: String,
    pub link: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TableRowView {
    pub position: usize,
    pub club: ClubView,
    pub played: i32,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: i32,
    pub position_change: PositionChange,
}

#[derive(Debug, Serialize)]
pub struct LeagueTableView {
    pub season: Option<String>,
    pub seasons: Vec<String>,
    pub rows: Vec<TableRowView>,
}

#[derive(Debug, Serialize)]
pub struct FixtureView {
    pub key: Option<String>,
    pub home: ClubView,
    pub away: ClubView,
    pub scheduled_at: DateTime<Utc>,
    pub kickoff: String,
    pub started: bool,
    pub live: bool,
    pub score: Option<Score>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DayView {
    pub label: String,
    pub fixtures: Vec<FixtureView>,
}

#[derive(Debug, Serialize)]
pub struct MatchweekView {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<DayView>,
}

#[derive(Debug, Serialize)]
pub struct FixturesPageView {
    pub season: Option<String>,
    pub matchweek: String,
    pub matchweeks: Vec<String>,
    pub page: usize,
    pub has_more: bool,
    pub no_fixtures: bool,
    pub days: Vec<DayView>,
}

#[derive(Debug, Serialize)]
pub struct PlayerView {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub club: Option<ClubView>,
    pub position: Option<String>,
    pub nationality: Option<String>,
    pub number: Option<u32>,
    pub age: Option<i32>,
    /// Metres.
    pub height: Option<f64>,
    pub season_stats: Vec<SeasonStatView>,
    pub totals: CareerTotals,
}

#[derive(Debug, Serialize)]
pub struct SeasonStatView {
    pub season: String,
    pub club: Option<ClubView>,
    pub appearances: u32,
    pub goals: u32,
    pub assists: u32,
    pub clean_sheets: u32,
}

#[derive(Debug, Serialize)]
pub struct PlayersPageView {
    pub page: usize,
    pub has_more: bool,
    pub total: usize,
    pub players: Vec<PlayerView>,
}

/// Turns domain records into views as of `now`, labelling times in `offset`.
pub struct Presenter<'a> {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
    pub content: &'a ContentClient,
}

impl Presenter<'_> {
    pub fn club(&self, club: &Club) -> ClubView {
        ClubView {
            id: club.id.to_string(),
            name: club.name.clone(),
            link: club.link.clone(),
            logo_url: club
                .logo
                .as_deref()
                .and_then(|asset| self.content.image_url(asset)),
        }
    }

    /// Rows in ranked order with the annotations as persisted.
    pub fn league_table(&self, season: Option<&Season>, seasons: Vec<String>) -> LeagueTableView {
        let rows = season
            .map(|s| StandingsEngine::rank(&s.league_table))
            .unwrap_or_default();

        LeagueTableView {
            season: season.map(|s| s.label.clone()),
            seasons,
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, row)| TableRowView {
                    position: i + 1,
                    club: self.club(&row.club),
                    played: row.played,
                    won: row.won,
                    drawn: row.drawn,
                    lost: row.lost,
                    goals_for: row.goals_for,
                    goals_against: row.goals_against,
                    goal_difference: row.goal_difference(),
                    points: row.points,
                    position_change: row.position_change,
                })
                .collect(),
        }
    }

    pub fn fixture(&self, fixture: &Fixture) -> FixtureView {
        FixtureView {
            key: fixture.key.clone(),
            home: self.club(&fixture.home),
            away: self.club(&fixture.away),
            scheduled_at: fixture.scheduled_at,
            kickoff: kickoff_label(fixture.scheduled_at, &self.offset),
            started: fixture.is_started(self.now),
            live: fixture.live_mode,
            score: fixture.visible_score(self.now),
            location: fixture.location.clone(),
        }
    }

    fn day(&self, group: DayGroup<'_>) -> DayView {
        DayView {
            label: group.label,
            fixtures: group.fixtures.into_iter().map(|f| self.fixture(f)).collect(),
        }
    }

    pub fn matchweek(&self, matchweek: &Matchweek) -> MatchweekView {
        MatchweekView {
            name: matchweek.name.clone(),
            start_date: matchweek.start_date,
            end_date: matchweek.end_date,
            days: matchweek
                .days_in_order()
                .into_iter()
                .map(|day| DayView {
                    label: date_label(day.date),
                    fixtures: day.fixtures.iter().map(|f| self.fixture(f)).collect(),
                })
                .collect(),
        }
    }

    pub fn fixtures_page(
        &self,
        season: Option<&Season>,
        filter: &str,
        page_index: usize,
        page_size: NonZeroUsize,
    ) -> FixturesPageView {
        let Some(season) = season else {
            return FixturesPageView {
                season: None,
                matchweek: filter.to_string(),
                matchweeks: Vec::new(),
                page: page_index,
                has_more: false,
                no_fixtures: true,
                days: Vec::new(),
            };
        };

        let selected = FixtureScheduler::selected_matchweeks(season, filter);
        let fixtures: Vec<&Fixture> = selected
            .iter()
            .copied()
            .flat_map(Matchweek::fixtures)
            .collect();
        let slice = page(&fixtures, page_size, page_index);
        let groups = FixtureScheduler::group_fixtures_by_day(slice.items.iter().copied(), &self.offset);

        FixturesPageView {
            season: Some(season.label.clone()),
            matchweek: filter.to_string(),
            matchweeks: season.matchweeks.iter().map(|mw| mw.name.clone()).collect(),
            page: page_index,
            has_more: slice.has_more,
            no_fixtures: FixtureScheduler::has_no_fixtures(&selected),
            days: groups.into_iter().map(|g| self.day(g)).collect(),
        }
    }

    pub fn player(&self, player: &Player) -> PlayerView {
        let today = self.now.with_timezone(&self.offset).date_naive();
        PlayerView {
            id: player.id.clone(),
            slug: player.slug(),
            name: player.full_name(),
            club: player.club.as_ref().map(|c| self.club(c)),
            position: player.position.clone(),
            nationality: player.nationality.clone(),
            number: player.number,
            age: player.date_of_birth.map(|dob| age_on(dob, today)),
            height: player.height,
            season_stats: player
                .season_stats
                .iter()
                .map(|s| self.season_stat(s))
                .collect(),
            totals: player.career_totals(),
        }
    }

    fn season_stat(&self, stat: &SeasonStat) -> SeasonStatView {
        SeasonStatView {
            season: stat.season.clone(),
            club: stat.club.as_ref().map(|c| self.club(c)),
            appearances: stat.appearances,
            goals: stat.goals,
            assists: stat.assists,
            clean_sheets: stat.clean_sheets,
        }
    }

    pub fn players_page(
        &self,
        players: &[Player],
        filter: &PlayerFilter,
        page_index: usize,
        page_size: NonZeroUsize,
    ) -> PlayersPageView {
        let matching = filter_players(players, filter);
        let slice = page(&matching, page_size, page_index);

        PlayersPageView {
            page: page_index,
            has_more: slice.has_more,
            total: matching.len(),
            players: slice.items.iter().map(|p| self.player(p)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentConfig;
    use crate::models::{ClubId, MatchDay, StandingsRow};
    use chrono::{Offset, TimeZone};

    fn club(id: &str, logo: Option<&str>) -> Club {
        Club {
            id: ClubId::from(id),
            name: id.to_uppercase(),
            link: None,
            logo: logo.map(str::to_string),
        }
    }

    fn fixture(home: &str, away: &str, at: DateTime<Utc>, score: Option<(u32, u32)>) -> Fixture {
        Fixture {
            key: None,
            home: club(home, None),
            away: club(away, None),
            scheduled_at: at,
            score: score.map(|(home_score, away_score)| Score {
                home_score,
                away_score,
            }),
            live_mode: false,
            location: None,
        }
    }

    fn season() -> Season {
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 9, d).unwrap();
        let kick = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 9, d, h, 0, 0).unwrap();
        Season {
            id: "s".into(),
            label: "2024/2025".into(),
            main: true,
            league_table: vec![
                StandingsRow {
                    key: None,
                    club: club("b", Some("image-abc-10x10-png")),
                    played: 2,
                    won: 0,
                    drawn: 1,
                    lost: 1,
                    goals_for: 1,
                    goals_against: 3,
                    points: 1,
                    position_change: PositionChange::Down,
                },
                StandingsRow {
                    key: None,
                    club: club("a", None),
                    played: 2,
                    won: 2,
                    drawn: 0,
                    lost: 0,
                    goals_for: 5,
                    goals_against: 1,
                    points: 6,
                    position_change: PositionChange::Up,
                },
            ],
            skipped_table_rows: 0,
            matchweeks: vec![Matchweek {
                name: "Matchweek 1".into(),
                start_date: day(9),
                end_date: day(15),
                days: vec![
                    MatchDay {
                        date: day(15),
                        fixtures: vec![fixture("c", "d", kick(15, 14), None)],
                    },
                    MatchDay {
                        date: day(14),
                        fixtures: vec![
                            fixture("a", "b", kick(14, 12), Some((2, 1))),
                            fixture("e", "f", kick(14, 17), Some((0, 0))),
                        ],
                    },
                ],
            }],
        }
    }

    fn presenter(content: &ContentClient) -> Presenter<'_> {
        Presenter {
            now: Utc.with_ymd_and_hms(2024, 9, 14, 13, 0, 0).unwrap(),
            offset: Utc.fix(),
            content,
        }
    }

    fn client() -> ContentClient {
        ContentClient::new(ContentConfig {
            project_id: Some("proj".into()),
            ..Default::default()
        })
    }


    #[test]
    fn test_league_table_is_ranked_with_stored_annotations() {
        let content = client();
        let season = season();
        let view = presenter(&content).league_table(Some(&season), vec!["2024/2025".into()]);

        assert_eq!(view.season.as_deref(), Some("2024/2025"));
        assert_eq!(view.rows[0].club.id, "a");
        assert_eq!(view.rows[0].position, 1);
        assert_eq!(view.rows[0].goal_difference, 4);
        assert_eq!(view.rows[0].position_change, PositionChange::Up);
        assert_eq!(view.rows[1].position, 2);
        assert_eq!(
            view.rows[1].club.logo_url.as_deref(),
            Some("https://cdn.sanity.io/images/proj/production/abc-10x10.png")
        );
    }

    #[test]
    fn test_missing_season_gives_empty_table() {
        let content = client();
        let view = presenter(&content).league_table(None, vec![]);
        assert!(view.season.is_none());
        assert!(view.rows.is_empty());
    }

    #[test]
    fn test_fixture_scores_hidden_before_kickoff() {
        let content = client();
        let season = season();
        let view = presenter(&content).fixtures_page(
            Some(&season),
            "all",
            0,
            NonZeroUsize::new(10).unwrap(),
        );

        assert!(!view.no_fixtures);
        assert!(!view.has_more);
        // grouped in source order: the 15th is listed first in the document
        assert_eq!(view.days[0].label, "Sunday, September 15");
        assert_eq!(view.days[1].label, "Saturday, September 14");

        let saturday = &view.days[1].fixtures;
        assert!(saturday[0].started);
        assert_eq!(saturday[0].kickoff, "12:00");
        assert_eq!(saturday[0].score.map(|s| s.home_score), Some(2));
        assert!(!saturday[1].started);
        assert!(saturday[1].score.is_none());
    }

    #[test]
    fn test_fixtures_page_size_and_unknown_matchweek() {
        let content = client();
        let season = season();
        let p = presenter(&content);

        let first = p.fixtures_page(Some(&season), "", 0, NonZeroUsize::new(2).unwrap());
        assert!(first.has_more);
        assert_eq!(first.days.iter().map(|d| d.fixtures.len()).sum::<usize>(), 2);

        let missing = p.fixtures_page(Some(&season), "Matchweek 9", 0, NonZeroUsize::new(2).unwrap());
        assert!(missing.no_fixtures);
        assert!(missing.days.is_empty());
        assert_eq!(missing.matchweeks, vec!["Matchweek 1".to_string()]);
    }

    #[test]
    fn test_current_matchweek_days_in_date_order() {
        let content = client();
        let season = season();
        let view = presenter(&content).matchweek(&season.matchweeks[0]);
        let labels: Vec<&str> = view.days.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Saturday, September 14", "Sunday, September 15"]);
    }

    #[test]
    fn test_players_page() {
        let content = client();
        let players: Vec<Player> = ["ann", "bob", "cat"]
            .iter()
            .map(|name| Player {
                id: name.to_string(),
                first_name: name.to_string(),
                last_name: "Smith".into(),
                club: Some(club("a", None)),
                position: None,
                nationality: None,
                number: None,
                date_of_birth: NaiveDate::from_ymd_opt(2000, 9, 15),
                height: None,
                related_seasons: vec![],
                season_stats: vec![],
            })
            .collect();

        let view = presenter(&content).players_page(
            &players,
            &PlayerFilter::default(),
            0,
            NonZeroUsize::new(2).unwrap(),
        );
        assert_eq!(view.total, 3);
        assert!(view.has_more);
        assert_eq!(view.players[0].slug, "ann-smith");
        assert_eq!(view.players[0].age, Some(23));
    }

    #[test]
    fn test_player_profile_lists_seasons_and_totals() {
        let content = client();
        let stat = |season: &str, appearances, goals| SeasonStat {
            season: season.to_string(),
            club: Some(club("a", Some("image-abc-10x10-png"))),
            appearances,
            goals,
            assists: 2,
            clean_sheets: 0,
        };
        let player = Player {
            id: "p1".into(),
            first_name: "Ada".into(),
            last_name: "Striker".into(),
            club: None,
            position: Some("Forward".into()),
            nationality: None,
            number: Some(9),
            date_of_birth: None,
            height: Some(1.78),
            related_seasons: vec![],
            season_stats: vec![stat("2023/2024", 20, 8), stat("2024/2025", 5, 3)],
        };

        let view = presenter(&content).player(&player);
        assert_eq!(view.height, Some(1.78));
        assert_eq!(view.season_stats.len(), 2);
        assert_eq!(view.season_stats[1].season, "2024/2025");
        assert!(view.season_stats[0]
            .club
            .as_ref()
            .is_some_and(|c| c.logo_url.is_some()));
        assert_eq!(view.totals.appearances, 25);
        assert_eq!(view.totals.goals, 11);
        assert_eq!(view.totals.assists, 4);
        assert_eq!(view.totals.clean_sheets, 0);
    }
}
