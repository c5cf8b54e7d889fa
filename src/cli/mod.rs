use anyhow::{anyhow, Result};
use chrono::Utc;
use std::io;

use crate::config::AppConfig;
use crate::db::{create_pool, init_database_with_pool};
use crate::models::{Fixture, Season, StandingsRow};
use crate::services::finalizer::Baseline;
use crate::services::players::{filter_players, PlayerFilter};
use crate::services::scheduler::{page, Feed, FeedState};
use crate::services::standings::{season_options, select_season};
use crate::services::{
    finalize_standings, ContentClient, ContentSource, FixtureScheduler, StandingsEngine,
};
use crate::utils::{age_on, kickoff_label};

fn content_client(config: &AppConfig) -> Result<ContentClient> {
    let client = ContentClient::new(config.content.clone());
    if !client.is_configured() {
        return Err(anyhow!("CONTENT_PROJECT_ID is not set; nothing to read from"));
    }
    Ok(client)
}

async fn load_season(client: &ContentClient, label: Option<&str>) -> Result<Option<Season>> {
    let seasons = client.fetch_seasons().await?;
    let season = select_season(&seasons, label).cloned();

    if season.is_none() {
        println!("❌ No season found{}", label.map_or(String::new(), |l| format!(" for '{}'", l)));
        let options = season_options(&seasons);
        if !options.is_empty() {
            println!("\n💡 Available seasons:");
            for option in options {
                println!("   • {}", option);
            }
        }
    }

    Ok(season)
}

pub async fn show_table(config: &AppConfig, season: Option<&str>, csv: bool) -> Result<()> {
    let client = content_client(config)?;
    let Some(season) = load_season(&client, season).await? else {
        return Ok(());
    };

    let ranked = StandingsEngine::rank(&season.league_table);

    if csv {
        return write_table_csv(&ranked, io::stdout().lock());
    }

    println!("🏆 League table {}\n", season.label);
    if ranked.is_empty() {
        println!("📭 No table rows yet for this season.");
        return Ok(());
    }

    println!(
        "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4}",
        "#", "Club", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"
    );
    for (i, row) in ranked.iter().enumerate() {
        println!(
            "{:>3}{} {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4}",
            i + 1,
            row.position_change.arrow(),
            row.club.name,
            row.played,
            row.won,
            row.drawn,
            row.lost,
            row.goals_for,
            row.goals_against,
            row.goal_difference(),
            row.points
        );
    }

    Ok(())
}

/// Ranked table as CSV, one record per club.
pub fn write_table_csv<W: io::Write>(ranked: &[StandingsRow], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    writer.write_record([
        "position", "club", "played", "won", "drawn", "lost", "goals_for", "goals_against",
        "goal_difference", "points", "position_change",
    ])?;

    for (i, row) in ranked.iter().enumerate() {
        writer.write_record([
            (i + 1).to_string(),
            row.club.name.clone(),
            row.played.to_string(),
            row.won.to_string(),
            row.drawn.to_string(),
            row.lost.to_string(),
            row.goals_for.to_string(),
            row.goals_against.to_string(),
            row.goal_difference().to_string(),
            row.points.to_string(),
            row.position_change.as_str().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub async fn show_current_matchweek(config: &AppConfig, season: Option<&str>) -> Result<()> {
    let client = content_client(config)?;
    let Some(season) = load_season(&client, season).await? else {
        return Ok(());
    };

    let now = Utc::now();
    let Some(matchweek) = FixtureScheduler::select_current_matchweek(&season.matchweeks, now)
    else {
        println!("🏁 Season {} has no matchweeks left.", season.label);
        return Ok(());
    };

    println!(
        "📅 {} ({} to {})",
        matchweek.name,
        matchweek.start_date.format("%d %b"),
        matchweek.end_date.format("%d %b %Y")
    );

    let fixtures: Vec<&Fixture> = matchweek
        .days_in_order()
        .into_iter()
        .flat_map(|day| day.fixtures.iter())
        .collect();
    print_fixture_days(config, &fixtures);

    Ok(())
}

pub async fn show_fixtures(
    config: &AppConfig,
    season: Option<&str>,
    matchweek: Option<&str>,
    page_index: usize,
    all: bool,
) -> Result<()> {
    let client = content_client(config)?;
    let Some(season) = load_season(&client, season).await? else {
        return Ok(());
    };

    let filter = matchweek.unwrap_or_default();
    let selected = FixtureScheduler::selected_matchweeks(&season, filter);
    if FixtureScheduler::has_no_fixtures(&selected) {
        println!("📭 No fixtures scheduled for this selection.");
        return Ok(());
    }

    let fixtures = FixtureScheduler::select_matchweek_fixtures(&season, filter);
    println!("⚽ Fixtures {} ({} total)", season.label, fixtures.len());

    if all {
        let mut feed = Feed::new(fixtures, config.fixtures_page_size);
        let mut batch = 1;
        while feed.state() == FeedState::Idle {
            println!("\n── page {} ──", batch);
            print_fixture_days(config, feed.load_more());
            batch += 1;
        }
        println!("\n✅ Listed {} fixtures", feed.loaded().len());
        return Ok(());
    }

    let slice = page(&fixtures, config.fixtures_page_size, page_index);
    print_fixture_days(config, slice.items);
    if slice.has_more {
        println!(
            "\n➡️  More fixtures: league-hub fixtures --page {}",
            page_index + 1
        );
    }

    Ok(())
}

fn print_fixture_days(config: &AppConfig, fixtures: &[&Fixture]) {
    let now = Utc::now();
    let offset = config.display_offset;

    for group in FixtureScheduler::group_fixtures_by_day(fixtures.iter().copied(), &offset) {
        println!("\n{}", group.label);
        for fixture in group.fixtures {
            let middle = match fixture.visible_score(now) {
                Some(score) => format!("{} - {}", score.home_score, score.away_score),
                None => kickoff_label(fixture.scheduled_at, &offset),
            };
            let live = if fixture.live_mode { " 🔴 LIVE" } else { "" };
            println!(
                "   {:>20}  {:^7}  {}{}",
                fixture.home.name, middle, fixture.away.name, live
            );
        }
    }
}

pub async fn show_players(config: &AppConfig, filter: PlayerFilter) -> Result<()> {
    let client = content_client(config)?;
    let players = client.fetch_players().await?;
    let matching = filter_players(&players, &filter);

    if matching.is_empty() {
        println!("❌ No players match the given filters");
        return Ok(());
    }

    println!("👥 {} players\n", matching.len());
    let today = Utc::now().with_timezone(&config.display_offset).date_naive();
    for player in matching {
        let number = player.number.map_or("-".to_string(), |n| n.to_string());
        let club = player.club.as_ref().map_or("Free agent", |c| c.name.as_str());
        let age = player
            .date_of_birth
            .map_or(String::new(), |dob| format!(", {}", age_on(dob, today)));
        println!(
            "{:>3}  {} ({}{})  {}",
            number,
            player.full_name(),
            player.position.as_deref().unwrap_or("?"),
            age,
            club
        );
    }

    Ok(())
}

pub async fn finalize(config: &AppConfig, season: Option<&str>) -> Result<()> {
    let client = content_client(config)?;
    let pool = create_pool(&config.database_url).await?;
    init_database_with_pool(&pool).await?;

    println!("🧮 Finalizing standings...");
    let outcome = finalize_standings(&client, &pool, season).await?;

    match &outcome.baseline {
        Baseline::Snapshot { taken_at, .. } => println!(
            "📸 Compared with the snapshot from {}",
            taken_at.format("%Y-%m-%d %H:%M")
        ),
        Baseline::PreviousSeason { label } => println!("📚 Compared with season {}", label),
        Baseline::None => println!("🆕 No earlier table; every club starts level"),
    }

    for (i, row) in outcome.table.iter().enumerate() {
        println!(
            "{:>3} {} {:<24} {:>4}",
            i + 1,
            row.position_change.arrow(),
            row.club.name,
            row.points
        );
    }

    if outcome.persisted {
        println!("\n✅ Position changes saved for {}", outcome.season_label);
    } else {
        println!("\n⚠️  Could not save position changes; check CONTENT_TOKEN and try again");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Club, ClubId, PositionChange};

    fn row(club: &str, points: i32, gf: i32, ga: i32) -> StandingsRow {
        StandingsRow {
            key: None,
            club: Club {
                id: ClubId::from(club),
                name: club.to_string(),
                link: None,
                logo: None,
            },
            played: 3,
            won: 1,
            drawn: 1,
            lost: 1,
            goals_for: gf,
            goals_against: ga,
            points,
            position_change: PositionChange::Up,
        }
    }

    #[test]
    fn test_table_csv() {
        let mut out = Vec::new();
        write_table_csv(&[row("Rovers", 7, 5, 2), row("United, FC", 4, 1, 3)], &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("position,club,"));
        assert_eq!(lines[1], "1,Rovers,3,1,1,1,5,2,3,7,up");
        assert_eq!(lines[2], "2,\"United, FC\",3,1,1,1,1,3,-2,4,up");
    }

    #[test]
    fn test_cli_needs_a_project() {
        assert!(content_client(&AppConfig::default()).is_err());
    }
}
