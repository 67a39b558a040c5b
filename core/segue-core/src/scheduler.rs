//! Virtual-time timer queue.
//!
//! Every delayed step of the protocol (deferred navigation, minimum hold, scroll
//! hold, restore attempts) is a timer owned by this queue. Timers carry the
//! [`TransitionToken`] of the work they belong to, so superseding a transition
//! is a single [`Scheduler::cancel_token`] call instead of a race on shared flags.
//!
//! Time never moves on its own: the owner advances it. Timers with the same due
//! time fire in the order they were scheduled.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Identifies one unit of scheduled work (a transition or a page mount).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TransitionToken(u64);

impl TransitionToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransitionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct FiredTimer<E> {
    pub id: TimerId,
    pub token: TransitionToken,
    pub at: Duration,
    pub event: E,
}

#[derive(Debug)]
struct Entry<E> {
    token: TransitionToken,
    event: E,
}

pub struct Scheduler<E> {
    now: Duration,
    next_seq: u64,
    next_token: u64,
    timers: BTreeMap<(Duration, TimerId), Entry<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            next_token: 0,
            timers: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn mint_token(&mut self) -> TransitionToken {
        self.next_token += 1;
        TransitionToken(self.next_token)
    }

    /// Schedules `event` to fire `delay` after the current time.
    pub fn schedule(&mut self, token: TransitionToken, delay: Duration, event: E) -> TimerId {
        self.schedule_at(token, self.now + delay, event)
    }

    /// Schedules `event` at an absolute time; times in the past fire on the next pop.
    pub fn schedule_at(&mut self, token: TransitionToken, at: Duration, event: E) -> TimerId {
        self.next_seq += 1;
        let id = TimerId(self.next_seq);
        let due = at.max(self.now);
        self.timers.insert((due, id), Entry { token, event });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let key = self.timers.keys().find(|(_, timer)| *timer == id).copied();
        key.map(|key| self.timers.remove(&key).is_some())
            .unwrap_or(false)
    }

    /// Drops every pending timer owned by `token`, returning how many were dropped.
    pub fn cancel_token(&mut self, token: TransitionToken) -> usize {
        let before = self.timers.len();
        self.timers.retain(|_, entry| entry.token != token);
        before - self.timers.len()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.timers.keys().next().map(|(due, _)| *due)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn pending_for(&self, token: TransitionToken) -> usize {
        self.timers
            .values()
            .filter(|entry| entry.token == token)
            .count()
    }

    /// Pops the earliest timer due at or before `until`, moving the clock to its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<FiredTimer<E>> {
        let (due, _) = *self.timers.keys().next()?;
        if due > until {
            return None;
        }
        let ((at, id), entry) = self.timers.pop_first()?;
        self.now = self.now.max(at);
        Some(FiredTimer {
            id,
            token: entry.token,
            at,
            event: entry.event,
        })
    }

    /// Moves the clock forward without firing anything. Never moves backwards.
    pub fn advance_clock(&mut self, to: Duration) {
        self.now = self.now.max(to);
    }
}
