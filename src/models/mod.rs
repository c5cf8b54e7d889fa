use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod documents;

/// Content-store identifier of a club document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClubId(pub String);

impl ClubId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClubId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ClubId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ClubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: ClubId,
    pub name: String,
    pub link: Option<String>,
    /// Image asset reference, resolved to a URL with `ContentClient::image_url`.
    pub logo: Option<String>,
}

/// Table movement of a club relative to a reference ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionChange {
    Up,
    Down,
    #[default]
    #[serde(alias = "neutral")]
    Neither,
}

impl PositionChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionChange::Up => "up",
            PositionChange::Down => "down",
            PositionChange::Neither => "neither",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            PositionChange::Up => "▲",
            PositionChange::Down => "▼",
            PositionChange::Neither => "•",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    /// Array key of the row inside the season document.
    pub key: Option<String>,
    pub club: Club,
    pub played: i32,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub points: i32,
    /// Derived annotation, recomputed by the finalize step.
    pub position_change: PositionChange,
}

impl StandingsRow {
    pub fn goal_difference(&self) -> i32 {
        self.goals_for - self.goals_against
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: String,
    /// Human label such as "2024/2025".
    pub label: String,
    pub main: bool,
    pub league_table: Vec<StandingsRow>,
    /// Stored table entries with no club reference at all. They cannot be
    /// written back, so a non-zero count blocks finalizing.
    #[serde(default)]
    pub skipped_table_rows: usize,
    pub matchweeks: Vec<Matchweek>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchweek {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<MatchDay>,
}

impl Matchweek {
    /// Days in ascending calendar order; the source keeps editor order.
    pub fn days_in_order(&self) -> Vec<&MatchDay> {
        let mut days: Vec<&MatchDay> = self.days.iter().collect();
        days.sort_by_key(|day| day.date);
        days
    }

    pub fn fixtures(&self) -> impl Iterator<Item = &Fixture> {
        self.days.iter().flat_map(|day| day.fixtures.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDay {
    pub date: NaiveDate,
    pub fixtures: Vec<Fixture>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home_score: u32,
    pub away_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub key: Option<String>,
    pub home: Club,
    pub away: Club,
    pub scheduled_at: DateTime<Utc>,
    pub score: Option<Score>,
    pub live_mode: bool,
    pub location: Option<String>,
}

impl Fixture {
    pub fn is_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.scheduled_at
    }

    /// Score to display: only once the match has kicked off or is flagged live.
    pub fn visible_score(&self, now: DateTime<Utc>) -> Option<Score> {
        self.score
            .filter(|_| self.is_started(now) || self.live_mode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStat {
    pub season: String,
    pub club: Option<Club>,
    pub appearances: u32,
    pub goals: u32,
    pub assists: u32,
    pub clean_sheets: u32,
}

/// Sums of a player's per-season stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CareerTotals {
    pub appearances: u32,
    pub goals: u32,
    pub assists: u32,
    pub clean_sheets: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub club: Option<Club>,
    pub position: Option<String>,
    pub nationality: Option<String>,
    pub number: Option<u32>,
    pub date_of_birth: Option<NaiveDate>,
    pub height: Option<f64>,
    /// Labels of the seasons this player is listed in.
    pub related_seasons: Vec<String>,
    pub season_stats: Vec<SeasonStat>,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn career_totals(&self) -> CareerTotals {
        self.season_stats
            .iter()
            .fold(CareerTotals::default(), |acc, s| CareerTotals {
                appearances: acc.appearances + s.appearances,
                goals: acc.goals + s.goals,
                assists: acc.assists + s.assists,
                clean_sheets: acc.clean_sheets + s.clean_sheets,
            })
    }

    pub fn slug(&self) -> String {
        format!(
            "{}-{}",
            self.first_name.to_lowercase(),
            self.last_name.to_lowercase()
        )
    }
}

// API Response types
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}
