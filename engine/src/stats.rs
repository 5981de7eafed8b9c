//! Aggregate statistics engine
//!
//! Population-wide metrics over the full record set. Orphaned or oddly
//! linked records still count here; only the founder descendant metrics
//! follow graph edges, and those reuse the forest builder's founder
//! detection so the dashboard and the tree agree on who the founders are.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::forest::founder_ids;
use crate::person::{id_sort_key, Person, Sex};

/// Bucket label for persons with no recorded birthplace.
pub const UNSPECIFIED_PLACE: &str = "unspecified";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenderDistribution {
    pub male: u32,
    pub female: u32,
    pub unknown: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FounderDescendants {
    pub person_id: String,
    pub display_name: String,
    /// Transitively reachable children.
    pub direct: u32,
    /// Spouses married into the founder's line.
    pub indirect: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeExtreme {
    pub person_id: String,
    pub display_name: String,
    pub age: u32,
    pub alive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgeSpread {
    pub family_name: String,
    /// Max minus min birth year within the family group.
    pub years: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSummary {
    pub total_members: u32,
    pub living_members: u32,
    /// Total parent-child edges in the record set.
    pub total_children: u32,
    /// Edges per person, rounded to one decimal.
    pub average_children: f64,
    pub founders: Vec<FounderDescendants>,
    pub gender: GenderDistribution,
    /// 12 buckets, January first.
    pub birthday_months: [u32; 12],
    /// 1-based month with the most birthdays; `None` when no birth dates
    /// are recorded at all.
    pub busiest_month: Option<u32>,
    /// Birthplace → count, most common first.
    pub birthplaces: Vec<(String, u32)>,
    /// Births per decade, ascending.
    pub births_by_decade: Vec<(i32, u32)>,
    pub oldest: Option<AgeExtreme>,
    pub youngest: Option<AgeExtreme>,
    pub max_age_spread: Option<AgeSpread>,
}

/// Compute the whole summary. Pure: same records and date, same output.
/// An empty record set yields zero counts and `None` markers.
pub fn summarize(records: &HashMap<String, Person>, today: NaiveDate) -> StatisticsSummary {
    let mut people: Vec<&Person> = records.values().collect();
    people.sort_by_key(|p| id_sort_key(&p.id));

    let total_members = people.len() as u32;
    let living_members = people.iter().filter(|p| p.is_alive()).count() as u32;
    let total_children = count_parent_edges(&people, records);
    let average_children = if people.is_empty() {
        0.0
    } else {
        (f64::from(total_children) / people.len() as f64 * 10.0).round() / 10.0
    };

    let months = birthday_months(&people);
    StatisticsSummary {
        total_members,
        living_members,
        total_children,
        average_children,
        founders: founder_descendants(records),
        gender: gender_distribution(&people),
        busiest_month: busiest_month(&months),
        birthday_months: months,
        birthplaces: birthplace_distribution(&people),
        births_by_decade: births_by_decade(&people),
        oldest: age_extreme(&people, today, true),
        youngest: age_extreme(&people, today, false),
        max_age_spread: max_age_spread(&people),
    }
}

/// Parent-child edges: one per structured parent reference that resolves
/// to a record in the set. Dangling references are not edges.
fn count_parent_edges(people: &[&Person], records: &HashMap<String, Person>) -> u32 {
    people
        .iter()
        .flat_map(|p| [p.father_id.as_deref(), p.mother_id.as_deref()])
        .flatten()
        .filter(|id| records.contains_key(*id))
        .count() as u32
}

// ============================================================================
// Descendant counts
// ============================================================================

/// Per-founder descendant counts, one entry per forest root.
///
/// Every transitively reachable child counts as direct; the spouse of the
/// founder or of any reachable child counts as indirect. Counted spouses
/// join the visited set, so a spouse shared across branches is counted
/// once.
fn founder_descendants(records: &HashMap<String, Person>) -> Vec<FounderDescendants> {
    founder_ids(records)
        .into_iter()
        .filter_map(|id| records.get(id))
        .map(|founder| {
            let mut visited: HashSet<&str> = HashSet::new();
            visited.insert(founder.id.as_str());
            let mut direct = 0;
            let mut indirect = 0;
            count_spouse(founder, records, &mut visited, &mut indirect);
            walk_children(founder, records, &mut visited, &mut direct, &mut indirect);
            FounderDescendants {
                person_id: founder.id.clone(),
                display_name: founder.display_name().to_string(),
                direct,
                indirect,
            }
        })
        .collect()
}

fn count_spouse<'a>(
    person: &'a Person,
    records: &'a HashMap<String, Person>,
    visited: &mut HashSet<&'a str>,
    indirect: &mut u32,
) {
    if let Some(spouse) = person.spouse_id.as_deref().and_then(|sid| records.get(sid)) {
        if visited.insert(spouse.id.as_str()) {
            *indirect += 1;
        }
    }
}

fn walk_children<'a>(
    parent: &'a Person,
    records: &'a HashMap<String, Person>,
    visited: &mut HashSet<&'a str>,
    direct: &mut u32,
    indirect: &mut u32,
) {
    let mut children: Vec<&Person> = records
        .values()
        .filter(|c| {
            c.father_id.as_deref() == Some(parent.id.as_str())
                || c.mother_id.as_deref() == Some(parent.id.as_str())
        })
        .collect();
    children.sort_by_key(|c| id_sort_key(&c.id));

    for child in children {
        if !visited.insert(child.id.as_str()) {
            continue;
        }
        *direct += 1;
        count_spouse(child, records, visited, indirect);
        walk_children(child, records, visited, direct, indirect);
    }
}

// ============================================================================
// Distributions
// ============================================================================

fn gender_distribution(people: &[&Person]) -> GenderDistribution {
    let mut dist = GenderDistribution::default();
    for person in people {
        match person.sex {
            Sex::M => dist.male += 1,
            Sex::F => dist.female += 1,
            Sex::Unknown => dist.unknown += 1,
        }
    }
    dist
}

fn birthday_months(people: &[&Person]) -> [u32; 12] {
    let mut months = [0u32; 12];
    for birth in people.iter().filter_map(|p| p.birth_date) {
        months[birth.month0() as usize] += 1;
    }
    months
}

/// Arg-max over the month buckets, earliest month on ties.
fn busiest_month(months: &[u32; 12]) -> Option<u32> {
    if months.iter().all(|&n| n == 0) {
        return None;
    }
    let (index, _) = months
        .iter()
        .enumerate()
        .max_by_key(|&(i, n)| (n, std::cmp::Reverse(i)))?;
    Some(index as u32 + 1)
}

fn birthplace_distribution(people: &[&Person]) -> Vec<(String, u32)> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for person in people {
        let place = person.birth_place.as_deref().unwrap_or(UNSPECIFIED_PLACE);
        *counts.entry(place).or_default() += 1;
    }
    let mut places: Vec<(String, u32)> = counts
        .into_iter()
        .map(|(place, n)| (place.to_string(), n))
        .collect();
    places.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    places
}

fn births_by_decade(people: &[&Person]) -> Vec<(i32, u32)> {
    let mut decades: BTreeMap<i32, u32> = BTreeMap::new();
    for birth in people.iter().filter_map(|p| p.birth_date) {
        *decades.entry(birth.year().div_euclid(10) * 10).or_default() += 1;
    }
    decades.into_iter().collect()
}

/// Oldest (or youngest) person with a known birth date; the deceased
/// compete with their age at death. People are scanned in id order and
/// only strictly better ages replace the champion, so ties go to the
/// earliest-listed id.
fn age_extreme(people: &[&Person], today: NaiveDate, oldest: bool) -> Option<AgeExtreme> {
    let mut best: Option<AgeExtreme> = None;
    for person in people {
        let Some(age) = person.age_on(today) else {
            continue;
        };
        let beats = match &best {
            None => true,
            Some(champion) if oldest => age > champion.age,
            Some(champion) => age < champion.age,
        };
        if beats {
            best = Some(AgeExtreme {
                person_id: person.id.clone(),
                display_name: person.display_name().to_string(),
                age,
                alive: person.is_alive(),
            });
        }
    }
    best
}

/// Largest max−min birth-year spread among family-name groups with at
/// least two known birth years. Group keys iterate sorted, and only a
/// strictly larger spread replaces the current winner, so ties go to the
/// lexically earliest family name.
fn max_age_spread(people: &[&Person]) -> Option<AgeSpread> {
    let mut groups: BTreeMap<&str, Vec<i32>> = BTreeMap::new();
    for person in people {
        if let (Some(name), Some(birth)) = (person.family_name(), person.birth_date) {
            groups.entry(name).or_default().push(birth.year());
        }
    }

    let mut best: Option<AgeSpread> = None;
    for (name, years) in groups {
        if years.len() < 2 {
            continue;
        }
        let spread = years.iter().max().unwrap() - years.iter().min().unwrap();
        if best.as_ref().map_or(true, |b| spread > b.years) {
            best = Some(AgeSpread {
                family_name: name.to_string(),
                years: spread,
            });
        }
    }
    best
}
