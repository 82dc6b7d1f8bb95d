//! Optimistic feed state for a swipe session.
//!
//! The queue mirrors what the server would return, one step ahead of it: a
//! swipe removes the current card and burns quota locally before the request
//! settles. This is a latency smoother, not a consistency mechanism; on any
//! unexpected failure the whole state is rebuilt from a fresh fetch.

use std::collections::VecDeque;

use crate::client::{FeedCard, SwipeStats};

#[derive(Debug, Default)]
pub struct FeedState {
    queue: VecDeque<FeedCard>,
    today_swipes: i64,
    max_daily_swipes: i64,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole state with authoritative server data.
    pub fn replace(&mut self, items: Vec<FeedCard>, stats: &SwipeStats) {
        self.queue = items.into();
        self.today_swipes = stats.today_swipes;
        self.max_daily_swipes = stats.max_daily_swipes;
    }

    /// Appends a further feed page to the back of the queue.
    pub fn extend(&mut self, items: Vec<FeedCard>) {
        self.queue.extend(items);
    }

    /// Overwrites the quota counters without touching the queue.
    pub fn apply_stats(&mut self, stats: &SwipeStats) {
        self.today_swipes = stats.today_swipes;
        self.max_daily_swipes = stats.max_daily_swipes;
    }

    pub fn current(&self) -> Option<&FeedCard> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn remaining_swipes(&self) -> i64 {
        (self.max_daily_swipes - self.today_swipes).max(0)
    }

    pub fn limit_reached(&self) -> bool {
        self.max_daily_swipes > 0 && self.today_swipes >= self.max_daily_swipes
    }

    /// Removes the current card and burns one swipe of quota, assuming the
    /// decision will be recorded. There is no inverse; failed requests roll
    /// back by refetching.
    pub fn optimistic_swipe(&mut self) -> Option<FeedCard> {
        let card = self.queue.pop_front()?;
        self.today_swipes += 1;
        Some(card)
    }

    /// Marks the quota as exhausted after a limit-reached response.
    pub fn mark_limit_reached(&mut self) {
        if self.max_daily_swipes > 0 {
            self.today_swipes = self.today_swipes.max(self.max_daily_swipes);
        }
    }
}
