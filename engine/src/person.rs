//! Person model and raw record normalization
//!
//! Raw records arrive from the external document store with display-language
//! field labels ("Full Name", "Married To", ...). This module translates them
//! into the normalized [`Person`] shape everything downstream consumes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::dates;

/// Sentinel parent/spouse reference meaning "unknown/unregistered".
/// Treated identically to a missing field, never as a graph edge.
pub const UNREGISTERED: &str = "99";

// ============================================================================
// Normalized model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
    Unknown,
}

/// Normalized snapshot of one family member.
///
/// All reference fields (`father_id`, `mother_id`, `spouse_id`) are either a
/// real id into the same record set or `None`; the `"99"` sentinel, empty
/// strings, explicit nulls and missing fields have all been collapsed to
/// `None` by [`normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub full_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub nickname: Option<String>,
    pub sex: Sex,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
    pub death_place: Option<String>,
    pub residence: Option<String>,
    pub father_id: Option<String>,
    pub mother_id: Option<String>,
    pub spouse_id: Option<String>,
    pub other_father_note: Option<String>,
    pub other_mother_note: Option<String>,
}

impl Person {
    /// Best display string for this person: full name, then nickname, then
    /// given name, then the bare id.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.nickname.as_deref())
            .or(self.given_name.as_deref())
            .unwrap_or(&self.id)
    }

    /// Whole years lived as of `today`, capped at the death date for the
    /// deceased. `None` when the birth date is unrecorded.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        let as_of = self.death_date.unwrap_or(today);
        Some(dates::age_on(birth, as_of))
    }

    pub fn is_alive(&self) -> bool {
        self.death_date.is_none()
    }

    /// True when neither structured parent reference is recorded.
    pub fn has_no_parent_link(&self) -> bool {
        self.father_id.is_none() && self.mother_id.is_none()
    }

    /// Surname key used for family grouping: the explicit surname field,
    /// falling back to the last whitespace token of the full name.
    pub fn family_name(&self) -> Option<&str> {
        self.surname
            .as_deref()
            .or_else(|| self.full_name.as_deref()?.split_whitespace().last())
    }
}

/// Deterministic ordering key for person ids: numeric ids sort numerically
/// and come before non-numeric ids, which sort lexically.
pub fn id_sort_key(id: &str) -> (u8, u64, &str) {
    match id.parse::<u64>() {
        Ok(n) => (0, n, ""),
        Err(_) => (1, 0, id),
    }
}

// ============================================================================
// Raw record shape
// ============================================================================

/// One record as stored in the external document store. Field names are the
/// store's display-language labels; every field is optional so a partially
/// filled record never fails to deserialize.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Full Name", default)]
    pub full_name: Option<String>,
    #[serde(rename = "First Name", default)]
    pub given_name: Option<String>,
    #[serde(rename = "Surname", default)]
    pub surname: Option<String>,
    #[serde(rename = "Nickname", default)]
    pub nickname: Option<String>,
    #[serde(rename = "Sex", default)]
    pub sex: Option<String>,
    #[serde(rename = "Birth", default)]
    pub birth: Option<String>,
    #[serde(rename = "Death", default)]
    pub death: Option<String>,
    #[serde(rename = "Place of Birth", default)]
    pub birth_place: Option<String>,
    #[serde(rename = "Place of Death", default)]
    pub death_place: Option<String>,
    #[serde(rename = "Lives In", default)]
    pub residence: Option<String>,
    #[serde(rename = "Married To", default)]
    pub spouse: Option<String>,
    #[serde(rename = "Father", default)]
    pub father: Option<String>,
    #[serde(rename = "Mother", default)]
    pub mother: Option<String>,
    #[serde(rename = "Other Father", default)]
    pub other_father: Option<String>,
    #[serde(rename = "Other Mother", default)]
    pub other_mother: Option<String>,
}

// ============================================================================
// Normalization
// ============================================================================

/// Collapse the three null-like reference forms (missing, empty, `"99"`)
/// into `None`.
fn link(raw: &Option<String>) -> Option<String> {
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some(UNREGISTERED) => None,
        Some(id) => Some(id.to_string()),
    }
}

fn parse_sex(raw: &Option<String>) -> Sex {
    match raw.as_deref().map(str::trim) {
        Some("M") | Some("m") => Sex::M,
        Some("F") | Some("f") => Sex::F,
        other => {
            if let Some(code) = other.filter(|s| !s.is_empty()) {
                debug!(code, "unknown sex code, treating as unknown");
            }
            Sex::Unknown
        }
    }
}

fn parse_date_field(person_id: &str, field: &str, raw: &Option<String>) -> Option<NaiveDate> {
    let text = raw.as_deref()?.trim();
    if text.is_empty() {
        return None;
    }
    match dates::parse_date(text) {
        Ok(date) => Some(date),
        Err(err) => {
            debug!(person_id, field, %err, "unparsable date, treating as unknown");
            None
        }
    }
}

fn text(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalize one raw record. Never fails: malformed fields degrade to
/// `None`/`Unknown` with a debug diagnostic.
pub fn normalize(id: &str, raw: &RawRecord) -> Person {
    Person {
        id: id.to_string(),
        full_name: text(&raw.full_name),
        given_name: text(&raw.given_name),
        surname: text(&raw.surname),
        nickname: text(&raw.nickname),
        sex: parse_sex(&raw.sex),
        birth_date: parse_date_field(id, "birth", &raw.birth),
        death_date: parse_date_field(id, "death", &raw.death),
        birth_place: text(&raw.birth_place),
        death_place: text(&raw.death_place),
        residence: text(&raw.residence),
        father_id: link(&raw.father),
        mother_id: link(&raw.mother),
        spouse_id: link(&raw.spouse),
        other_father_note: text(&raw.other_father),
        other_mother_note: text(&raw.other_mother),
    }
}

/// Normalize a whole fetched record set, keyed by document id.
pub fn normalize_records(raw: &HashMap<String, RawRecord>) -> HashMap<String, Person> {
    raw.iter()
        .map(|(id, record)| (id.clone(), normalize(id, record)))
        .collect()
}

/// Bare test fixture: a person with only an id and a generated full name.
#[cfg(test)]
pub(crate) fn test_person(id: &str) -> Person {
    Person {
        id: id.to_string(),
        full_name: Some(format!("Person {id}")),
        given_name: None,
        surname: None,
        nickname: None,
        sex: Sex::Unknown,
        birth_date: None,
        death_date: None,
        birth_place: None,
        death_place: None,
        residence: None,
        father_id: None,
        mother_id: None,
        spouse_id: None,
        other_father_note: None,
        other_mother_note: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawRecord {
        RawRecord {
            full_name: Some("João Silva Tanja".into()),
            sex: Some("M".into()),
            birth: Some("1920-03-15".into()),
            father: Some("99".into()),
            mother: None,
            spouse: Some("2".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_sentinel_and_null_parents_normalize_uniformly() {
        let person = normalize("1", &raw());
        // "99" father and missing mother both become None
        assert_eq!(person.father_id, None);
        assert_eq!(person.mother_id, None);
        assert!(person.has_no_parent_link());
        assert_eq!(person.spouse_id, Some("2".into()));

        let mut empty_ref = raw();
        empty_ref.spouse = Some("  ".into());
        assert_eq!(normalize("1", &empty_ref).spouse_id, None);
    }

    #[test]
    fn test_malformed_fields_degrade_not_fail() {
        let record = RawRecord {
            sex: Some("X".into()),
            birth: Some("not a date".into()),
            ..Default::default()
        };
        let person = normalize("7", &record);
        assert_eq!(person.sex, Sex::Unknown);
        assert_eq!(person.birth_date, None);
        // nothing recorded at all still yields a usable Person
        let bare = normalize("8", &RawRecord::default());
        assert_eq!(bare.display_name(), "8");
    }

    #[test]
    fn test_display_name_fallback_chain() {
        let mut record = raw();
        let full = normalize("1", &record);
        assert_eq!(full.display_name(), "João Silva Tanja");

        record.full_name = None;
        record.nickname = Some("Vô João".into());
        assert_eq!(normalize("1", &record).display_name(), "Vô João");
    }

    #[test]
    fn test_family_name_falls_back_to_last_token() {
        let person = normalize("1", &raw());
        // no explicit surname field set in raw()
        assert_eq!(person.family_name(), Some("Tanja"));
    }

    #[test]
    fn test_raw_record_deserializes_display_labels() {
        let json = r#"{
            "Full Name": "Maria Santos Tanja",
            "Sex": "F",
            "Birth": "22/07/1925",
            "Married To": "1",
            "Mother": "99"
        }"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        let person = normalize("2", &record);
        assert_eq!(person.sex, Sex::F);
        assert_eq!(
            person.birth_date,
            NaiveDate::from_ymd_opt(1925, 7, 22)
        );
        assert_eq!(person.mother_id, None);
    }
}
