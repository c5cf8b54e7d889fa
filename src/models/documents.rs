//! Raw document shapes returned by the content API and their validation
//! into the domain records. Every field is optional on the wire; the
//! `into_*` conversions decide what is usable.

use serde::{Deserialize, Serialize};

use super::{
    Club, ClubId, Fixture, MatchDay, Matchweek, Player, PositionChange, Score, Season, SeasonStat,
    StandingsRow,
};
use crate::utils::{parse_content_date, parse_content_datetime, spans_matchweek};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageDoc {
    pub asset: Option<AssetRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClubDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "_ref")]
    pub reference: Option<String>,
    pub name: Option<String>,
    pub link: Option<String>,
    pub image: Option<ImageDoc>,
}

impl ClubDoc {
    /// A club is usable as soon as it has an identity.
    pub fn into_club(self) -> Option<Club> {
        let id = self.id.or(self.reference)?;
        Some(Club {
            id: ClubId(id),
            name: self.name.unwrap_or_default(),
            link: self.link,
            logo: self.image.and_then(|i| i.asset).and_then(|a| a.reference),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeagueTableRowDoc {
    #[serde(rename = "_key")]
    pub key: Option<String>,
    pub club: Option<ClubDoc>,
    /// Raw reference id, present even when the club document no longer resolves.
    pub club_ref: Option<String>,
    pub points: Option<i32>,
    pub played: Option<i32>,
    pub won: Option<i32>,
    pub drawn: Option<i32>,
    pub lost: Option<i32>,
    pub gf: Option<i32>,
    pub ga: Option<i32>,
    pub position_change: Option<PositionChange>,
}

impl LeagueTableRowDoc {
    /// A row whose club reference dangles keeps its counters under a bare
    /// club id; only a row without any reference is unusable.
    pub fn into_row(self) -> Option<StandingsRow> {
        let club = match (self.club.and_then(ClubDoc::into_club), self.club_ref) {
            (Some(club), _) => club,
            (None, Some(reference)) => {
                tracing::warn!(
                    "Table row {:?} references club {} which does not resolve",
                    self.key,
                    reference
                );
                Club {
                    id: ClubId(reference),
                    name: String::new(),
                    link: None,
                    logo: None,
                }
            }
            (None, None) => {
                tracing::warn!("Table row {:?} has no club reference", self.key);
                return None;
            }
        };

        Some(StandingsRow {
            key: self.key,
            club,
            played: self.played.unwrap_or(0),
            won: self.won.unwrap_or(0),
            drawn: self.drawn.unwrap_or(0),
            lost: self.lost.unwrap_or(0),
            goals_for: self.gf.unwrap_or(0),
            goals_against: self.ga.unwrap_or(0),
            points: self.points.unwrap_or(0),
            position_change: self.position_change.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreDoc {
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureDoc {
    #[serde(rename = "_key")]
    pub key: Option<String>,
    pub home_club: Option<ClubDoc>,
    pub away_club: Option<ClubDoc>,
    pub scheduled_date_time: Option<String>,
    pub score: Option<ScoreDoc>,
    pub live_mode: Option<bool>,
    pub location: Option<String>,
}

impl FixtureDoc {
    pub fn into_fixture(self) -> Option<Fixture> {
        let home = self.home_club.and_then(ClubDoc::into_club);
        let away = self.away_club.and_then(ClubDoc::into_club);
        let scheduled_at = self
            .scheduled_date_time
            .as_deref()
            .and_then(parse_content_datetime);

        let (Some(home), Some(away), Some(scheduled_at)) = (home, away, scheduled_at) else {
            tracing::warn!(
                "Dropping fixture {:?}: missing club or kickoff time",
                self.key
            );
            return None;
        };

        let score = self.score.and_then(|s| match (s.home_score, s.away_score) {
            (Some(home_score), Some(away_score)) => Some(Score { home_score, away_score }),
            _ => None,
        });

        Some(Fixture {
            key: self.key,
            home,
            away,
            scheduled_at,
            score,
            live_mode: self.live_mode.unwrap_or(false),
            location: self.location,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchDayDoc {
    pub date: Option<String>,
    pub fixtures: Option<Vec<FixtureDoc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchweekDoc {
    pub name: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    pub days: Option<Vec<MatchDayDoc>>,
}

impl MatchweekDoc {
    pub fn into_matchweek(self) -> Option<Matchweek> {
        let name = self.name.unwrap_or_default();
        let start_date = self.start_date.as_deref().and_then(parse_content_date);
        let end_date = self.end_date.as_deref().and_then(parse_content_date);

        let (Some(start_date), Some(end_date)) = (start_date, end_date) else {
            tracing::warn!("Dropping matchweek '{}': missing or unreadable dates", name);
            return None;
        };

        if !spans_matchweek(start_date, end_date) {
            tracing::warn!(
                "Matchweek '{}' runs {} to {}, not a seven-day window",
                name,
                start_date,
                end_date
            );
        }

        let days = self
            .days
            .unwrap_or_default()
            .into_iter()
            .filter_map(|day| {
                let date = day.date.as_deref().and_then(parse_content_date)?;
                let fixtures = day
                    .fixtures
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(FixtureDoc::into_fixture)
                    .collect();
                Some(MatchDay { date, fixtures })
            })
            .collect();

        Some(Matchweek {
            name,
            start_date,
            end_date,
            days,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub season: Option<String>,
    pub main: Option<bool>,
    pub league_table: Option<Vec<LeagueTableRowDoc>>,
    pub matchweeks: Option<Vec<MatchweekDoc>>,
}

impl SeasonDoc {
    pub fn into_season(self) -> Option<Season> {
        let (Some(id), Some(label)) = (self.id, self.season) else {
            tracing::warn!("Dropping season document without id or label");
            return None;
        };

        let entries = self.league_table.unwrap_or_default();
        let stored = entries.len();
        let league_table: Vec<StandingsRow> = entries
            .into_iter()
            .filter_map(LeagueTableRowDoc::into_row)
            .collect();

        Some(Season {
            id,
            label,
            main: self.main.unwrap_or(false),
            skipped_table_rows: stored - league_table.len(),
            league_table,
            matchweeks: self
                .matchweeks
                .unwrap_or_default()
                .into_iter()
                .filter_map(MatchweekDoc::into_matchweek)
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonRefDoc {
    pub season: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonStatDoc {
    pub season: Option<String>,
    pub club: Option<ClubDoc>,
    pub appearances: Option<u32>,
    pub goals: Option<u32>,
    pub assists: Option<u32>,
    pub clean_sheets: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerDoc {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub club: Option<ClubDoc>,
    pub position: Option<String>,
    pub nationality: Option<String>,
    pub number: Option<u32>,
    pub date_of_birth: Option<String>,
    pub height: Option<f64>,
    pub related_seasons: Option<Vec<SeasonRefDoc>>,
    pub season_stats: Option<Vec<SeasonStatDoc>>,
}

impl PlayerDoc {
    pub fn into_player(self) -> Option<Player> {
        let Some(id) = self.id else {
            tracing::warn!("Dropping player document without id");
            return None;
        };

        Some(Player {
            id,
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            club: self.club.and_then(ClubDoc::into_club),
            position: self.position,
            nationality: self.nationality,
            number: self.number,
            date_of_birth: self.date_of_birth.as_deref().and_then(parse_content_date),
            height: self.height,
            related_seasons: self
                .related_seasons
                .unwrap_or_default()
                .into_iter()
                .filter_map(|s| s.season)
                .collect(),
            season_stats: self
                .season_stats
                .unwrap_or_default()
                .into_iter()
                .filter_map(|s| {
                    Some(SeasonStat {
                        season: s.season?,
                        club: s.club.and_then(ClubDoc::into_club),
                        appearances: s.appearances.unwrap_or(0),
                        goals: s.goals.unwrap_or(0),
                        assists: s.assists.unwrap_or(0),
                        clean_sheets: s.clean_sheets.unwrap_or(0),
                    })
                })
                .collect(),
        })
    }
}

// ── write shapes ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceDoc {
    #[serde(rename = "_ref")]
    pub reference: String,
    #[serde(rename = "_type")]
    pub kind: &'static str,
}

/// One league-table entry as written back by the "set full table" patch.
#[derive(Debug, Clone, Serialize)]
pub struct LeagueTableEntryDoc {
    #[serde(rename = "_key")]
    pub key: String,
    pub club: ReferenceDoc,
    pub points: i32,
    pub played: i32,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub gf: i32,
    pub ga: i32,
    pub position_change: PositionChange,
}

impl From<&StandingsRow> for LeagueTableEntryDoc {
    fn from(row: &StandingsRow) -> Self {
        Self {
            // rows created outside the editor may lack a key; the club id is unique per table
            key: row.key.clone().unwrap_or_else(|| row.club.id.0.clone()),
            club: ReferenceDoc {
                reference: row.club.id.0.clone(),
                kind: "reference",
            },
            points: row.points,
            played: row.played,
            won: row.won,
            drawn: row.drawn,
            lost: row.lost,
            gf: row.goals_for,
            ga: row.goals_against,
            position_change: row.position_change,
        }
    }
}
