//! Event projector
//!
//! Projects birthdays and death anniversaries onto a calendar year and
//! answers "what's coming up in the next N days". "Today" is always an
//! explicit parameter so results are reproducible under test.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use crate::dates::anchor_to_year;
use crate::person::{id_sort_key, Person};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EventKind {
    /// Recurring birthday; `age` is the current age, or age at death for
    /// the deceased.
    Birthday { age: Option<u32>, deceased: bool },
    DeathAnniversary { years_since: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyEvent {
    pub person_id: String,
    pub display_name: String,
    /// Source month/day re-anchored onto the projection year.
    pub occurs_on: NaiveDate,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Project one event per known birth date and one per known death date,
/// anchored to `today`'s year. Output is in deterministic id order but
/// otherwise unsorted; callers filter and sort as needed.
pub fn project_events(records: &HashMap<String, Person>, today: NaiveDate) -> Vec<FamilyEvent> {
    let mut people: Vec<&Person> = records.values().collect();
    people.sort_by_key(|p| id_sort_key(&p.id));

    let mut events = Vec::new();
    for person in people {
        if let Some(birth) = person.birth_date {
            events.push(FamilyEvent {
                person_id: person.id.clone(),
                display_name: person.display_name().to_string(),
                occurs_on: anchor_to_year(birth, today.year()),
                kind: EventKind::Birthday {
                    age: person.age_on(today),
                    deceased: !person.is_alive(),
                },
            });
        }
        if let Some(death) = person.death_date {
            events.push(FamilyEvent {
                person_id: person.id.clone(),
                display_name: person.display_name().to_string(),
                occurs_on: anchor_to_year(death, today.year()),
                kind: EventKind::DeathAnniversary {
                    years_since: today.year() - death.year(),
                },
            });
        }
    }
    events
}

/// Events whose next occurrence falls within `[from, from + horizon_days]`,
/// ascending by date, ties broken by person id.
///
/// Each event is re-anchored at query time: if its month/day has already
/// passed this year the next year's occurrence is considered, which keeps a
/// late-December birthday visible across the year boundary without
/// resurfacing it in January.
pub fn upcoming(events: &[FamilyEvent], from: NaiveDate, horizon_days: u32) -> Vec<FamilyEvent> {
    let end = from
        .checked_add_days(Days::new(u64::from(horizon_days)))
        .unwrap_or(NaiveDate::MAX);

    let mut hits: Vec<FamilyEvent> = events
        .iter()
        .filter_map(|event| {
            let mut next = anchor_to_year(event.occurs_on, from.year());
            if next < from {
                next = anchor_to_year(event.occurs_on, from.year() + 1);
            }
            (next <= end).then(|| FamilyEvent {
                occurs_on: next,
                ..event.clone()
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        a.occurs_on
            .cmp(&b.occurs_on)
            .then_with(|| id_sort_key(&a.person_id).cmp(&id_sort_key(&b.person_id)))
    });
    hits
}
