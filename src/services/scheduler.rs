use std::collections::HashMap;
use std::num::NonZeroUsize;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::models::{Fixture, Matchweek, Season};
use crate::utils::{date_in_range, day_label};

/// Matchweek filter values meaning "no filter".
const ALL_MATCHWEEKS: [&str; 2] = ["all", "all matchweeks"];

/// Fixtures sharing one calendar day, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct DayGroup<'a> {
    pub label: String,
    pub fixtures: Vec<&'a Fixture>,
}

/// One slice of a longer sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub has_more: bool,
}

/// Slice `[index * size, index * size + size)` out of `all`. Pure: the cursor
/// belongs to the caller.
pub fn page<T>(all: &[T], page_size: NonZeroUsize, page_index: usize) -> Page<'_, T> {
    let size = page_size.get();
    let start = page_index.saturating_mul(size).min(all.len());
    let end = start.saturating_add(size).min(all.len());
    let has_more = page_index.saturating_add(1).saturating_mul(size) < all.len();

    Page {
        items: &all[start..end],
        has_more,
    }
}

pub struct FixtureScheduler;

impl FixtureScheduler {
    /// The matchweek in progress on `now`'s date, otherwise the first one
    /// still to come. `None` once every matchweek is over.
    pub fn select_current_matchweek(
        matchweeks: &[Matchweek],
        now: DateTime<Utc>,
    ) -> Option<&Matchweek> {
        let mut ordered: Vec<&Matchweek> = matchweeks.iter().collect();
        ordered.sort_by_key(|mw| mw.start_date);

        let today = now.date_naive();
        ordered
            .iter()
            .find(|mw| date_in_range(today, mw.start_date, mw.end_date))
            .or_else(|| ordered.iter().find(|mw| today < mw.start_date))
            .copied()
    }

    /// Group by the long day label of each kickoff as seen in `tz`. Groups
    /// appear in order of their first fixture.
    pub fn group_fixtures_by_day<'a, I, Tz>(fixtures: I, tz: &Tz) -> Vec<DayGroup<'a>>
    where
        I: IntoIterator<Item = &'a Fixture>,
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut groups: Vec<DayGroup<'a>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for fixture in fixtures {
            let label = day_label(fixture.scheduled_at, tz);
            match index.get(&label) {
                Some(&i) => groups[i].fixtures.push(fixture),
                None => {
                    index.insert(label.clone(), groups.len());
                    groups.push(DayGroup {
                        label,
                        fixtures: vec![fixture],
                    });
                }
            }
        }

        groups
    }

    /// Matchweeks picked by a name filter: every matchweek for "all"/empty,
    /// otherwise the one whose name matches case-insensitively (if any).
    pub fn selected_matchweeks<'a>(season: &'a Season, filter: &str) -> Vec<&'a Matchweek> {
        let filter = filter.trim().to_lowercase();
        if filter.is_empty() || ALL_MATCHWEEKS.contains(&filter.as_str()) {
            return season.matchweeks.iter().collect();
        }

        season
            .matchweeks
            .iter()
            .find(|mw| mw.name.to_lowercase() == filter)
            .into_iter()
            .collect()
    }

    /// Flattened fixtures of the selected matchweeks: matchweek order, then
    /// day order, then fixture order.
    pub fn select_matchweek_fixtures<'a>(season: &'a Season, filter: &str) -> Vec<&'a Fixture> {
        Self::selected_matchweeks(season, filter)
            .into_iter()
            .flat_map(|mw| mw.fixtures())
            .collect()
    }

    /// True when nothing would be listed: no matchweek selected, or none of
    /// them has a match day.
    pub fn has_no_fixtures(matchweeks: &[&Matchweek]) -> bool {
        matchweeks.iter().all(|mw| mw.days.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Exhausted,
}

/// Caller-side cursor for "load more" consumption of a fixed list.
#[derive(Debug, Clone)]
pub struct Feed<T> {
    items: Vec<T>,
    page_size: NonZeroUsize,
    next_page: usize,
    loaded: usize,
    state: FeedState,
}

impl<T> Feed<T> {
    pub fn new(items: Vec<T>, page_size: NonZeroUsize) -> Self {
        let state = if items.is_empty() {
            FeedState::Exhausted
        } else {
            FeedState::Idle
        };
        Self {
            items,
            page_size,
            next_page: 0,
            loaded: 0,
            state,
        }
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    /// Items handed out so far.
    pub fn loaded(&self) -> &[T] {
        &self.items[..self.loaded]
    }

    /// Next page, or an empty slice once exhausted.
    pub fn load_more(&mut self) -> &[T] {
        if self.state == FeedState::Exhausted {
            return &[];
        }

        let Page { items, has_more } = page(&self.items, self.page_size, self.next_page);
        let start = self.loaded;
        self.loaded += items.len();
        self.next_page += 1;
        if !has_more {
            self.state = FeedState::Exhausted;
        }

        &self.items[start..self.loaded]
    }
}
