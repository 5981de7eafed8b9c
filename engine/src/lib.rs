//! Family Relationship Graph & Derived Analytics Engine
//!
//! Pure, synchronous computation core behind the family website: normalizes
//! flat person records into a cycle-safe founder forest, projects birthdays
//! and memorial dates onto the calendar year, and derives population-wide
//! statistics. All operations take an immutable snapshot of the record set
//! plus an explicit "today" and return freshly built results; nothing here
//! performs I/O or holds state between calls.

pub mod dates;
pub mod events;
pub mod forest;
pub mod person;
pub mod stats;

pub use events::{project_events, upcoming, EventKind, FamilyEvent};
pub use forest::{build_forest, FamilyTreeNode};
pub use person::{normalize, normalize_records, Person, RawRecord, Sex};
pub use stats::{summarize, StatisticsSummary};
