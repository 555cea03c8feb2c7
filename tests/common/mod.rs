#![allow(dead_code)]

use timeflow::commands::Session;
use timeflow::{CalendarDay, FixedClock, MemoryStorage, TaskStore};

pub fn day(s: &str) -> CalendarDay {
    CalendarDay::parse(s).expect("valid test date")
}

/// An empty store whose "today" is `today`.
pub fn store_on(today: &str) -> TaskStore {
    TaskStore::new(FixedClock(day(today)))
}

/// A session over empty in-memory storage, so it starts from the seed tasks.
pub fn seeded_session(today: &str) -> Session {
    Session::open(Box::new(MemoryStorage::new()), FixedClock(day(today)))
}
