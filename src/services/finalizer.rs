//! The one place that writes position-change annotations. Reads never write;
//! finalizing compares the current table with the last finalized snapshot
//! (or, before the first one, the previous season's table), persists the
//! annotated table and advances the snapshot.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::{latest_snapshot, record_snapshot};
use crate::models::{Season, StandingsRow};
use crate::services::content::ContentSource;
use crate::services::standings::{select_season, Ranking, StandingsEngine};

/// What the new table was compared against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Baseline {
    Snapshot { id: String, taken_at: DateTime<Utc> },
    PreviousSeason { label: String },
    None,
}

/// The stored table holds entries this service cannot read back, and the
/// single "set full table" write would delete them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("season {label} has {skipped} league table entries without a club reference; fix them before finalizing")]
pub struct IncompleteTableError {
    pub label: String,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalizeOutcome {
    pub season_id: String,
    pub season_label: String,
    pub baseline: Baseline,
    pub table: Vec<StandingsRow>,
    /// False when the content write failed; the table is still valid.
    pub persisted: bool,
    pub snapshot_id: Option<String>,
}

pub async fn finalize_standings<S: ContentSource>(
    source: &S,
    pool: &SqlitePool,
    season_label: Option<&str>,
) -> Result<FinalizeOutcome> {
    let seasons = source.fetch_seasons().await?;
    let season = select_season(&seasons, season_label).ok_or_else(|| {
        anyhow!(
            "no season labelled {:?} and no season flagged main",
            season_label.unwrap_or_default()
        )
    })?;

    tracing::info!("Finalizing standings for season {}", season.label);

    if season.skipped_table_rows > 0 {
        return Err(IncompleteTableError {
            label: season.label.clone(),
            skipped: season.skipped_table_rows,
        }
        .into());
    }

    let (previous, baseline) = previous_ranking(source, pool, season).await?;

    let ranked = StandingsEngine::rank(&season.league_table);
    let changes = StandingsEngine::compute_position_changes(&ranked, &previous);
    let table = StandingsEngine::annotate(&ranked, &changes);

    let persisted = match source.set_league_table(&season.id, &table).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to persist position changes for {}: {}", season.label, e);
            false
        }
    };

    // the snapshot only advances once the store holds the matching annotations
    let snapshot_id = if persisted {
        match record_snapshot(pool, season, &table).await {
            Ok(id) => Some(id),
            Err(e) => {
                // the next finalize compares against the previous snapshot again
                tracing::error!("Position changes saved but snapshot not recorded: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    Ok(FinalizeOutcome {
        season_id: season.id.clone(),
        season_label: season.label.clone(),
        baseline,
        table,
        persisted,
        snapshot_id,
    })
}

async fn previous_ranking<S: ContentSource>(
    source: &S,
    pool: &SqlitePool,
    season: &Season,
) -> Result<(Ranking, Baseline)> {
    if let Some(snapshot) = latest_snapshot(pool, &season.id).await? {
        tracing::debug!(
            "Comparing against snapshot {} of {}",
            snapshot.id,
            snapshot.season_label
        );
        return Ok((
            snapshot.ranking,
            Baseline::Snapshot {
                id: snapshot.id,
                taken_at: snapshot.taken_at,
            },
        ));
    }

    let label = StandingsEngine::previous_season_label(&season.label)?;
    match source.fetch_season_by_label(&label).await? {
        Some(previous) => {
            let ranked = StandingsEngine::rank(&previous.league_table);
            Ok((
                StandingsEngine::ranking_of(&ranked),
                Baseline::PreviousSeason { label },
            ))
        }
        None => {
            tracing::info!("No season {} to compare against; no movement recorded", label);
            Ok((Ranking::new(), Baseline::None))
        }
    }
}
