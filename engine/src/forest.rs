//! Relationship graph builder
//!
//! Turns the flat id→person map into an ordered founder forest: founders at
//! the top, spouses attached to their partner's node, children nested once
//! under the couple. The underlying data is a general graph that may contain
//! cycles or contradictory links, so every traversal threads a visited set
//! and prunes re-visits instead of recursing forever.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::person::{id_sort_key, Person};

/// One node of the derived family forest.
#[derive(Debug, Clone, Serialize)]
pub struct FamilyTreeNode {
    pub person: Person,
    /// Distance from this node's forest root.
    pub level: u32,
    pub spouse: Option<Person>,
    pub children: Vec<FamilyTreeNode>,
}

/// Build the founder forest. Deterministic: repeated calls on an unchanged
/// record set produce identical output.
pub fn build_forest(records: &HashMap<String, Person>) -> Vec<FamilyTreeNode> {
    let mut visited: HashSet<&str> = HashSet::new();
    founder_ids(records)
        .into_iter()
        .filter_map(|id| build_branch(id, 0, &mut visited, records))
        .collect()
}

fn is_child_of(person: &Person, parent_id: &str) -> bool {
    person.father_id.as_deref() == Some(parent_id)
        || person.mother_id.as_deref() == Some(parent_id)
}

fn mutually_married(a: &Person, b: &Person) -> bool {
    a.spouse_id.as_deref() == Some(b.id.as_str())
        && b.spouse_id.as_deref() == Some(a.id.as_str())
}

/// Founder detection and ordering.
///
/// A founder has no recorded parent link and is not listed as anyone's
/// child (a record claiming both is bad input; the child listing wins).
/// Founders are sorted by id, and a founder that is mutually married to an
/// earlier-kept founder is collapsed into that root instead of becoming a
/// second top-level tree.
pub(crate) fn founder_ids(records: &HashMap<String, Person>) -> Vec<&str> {
    let listed_as_child: HashSet<&str> = records
        .values()
        .filter(|p| !p.has_no_parent_link())
        .map(|p| p.id.as_str())
        .collect();

    let mut candidates: Vec<&Person> = records
        .values()
        .filter(|p| p.has_no_parent_link() && !listed_as_child.contains(p.id.as_str()))
        .collect();
    candidates.sort_by_key(|p| id_sort_key(&p.id));

    let mut roots: Vec<&Person> = Vec::new();
    for candidate in candidates {
        // Symmetry is verified, not assumed: one-directional spouse links
        // do not collapse.
        if let Some(root) = roots.iter().find(|r| mutually_married(r, candidate)) {
            debug!(
                founder = %candidate.id,
                root = %root.id,
                "founder collapsed into spouse's root"
            );
        } else {
            roots.push(candidate);
        }
    }
    roots.into_iter().map(|p| p.id.as_str()).collect()
}

/// Expand one branch. `visited` spans the whole forest build, so a person
/// appears at most once anywhere in the output and cyclic parent links
/// terminate instead of overflowing the stack.
fn build_branch<'a>(
    id: &'a str,
    level: u32,
    visited: &mut HashSet<&'a str>,
    records: &'a HashMap<String, Person>,
) -> Option<FamilyTreeNode> {
    if !visited.insert(id) {
        return None;
    }
    let person = match records.get(id) {
        Some(p) => p,
        None => {
            debug!(id, "branch references an id not in the record set");
            return None;
        }
    };

    let spouse = person.spouse_id.as_deref().and_then(|sid| {
        let found = records.get(sid);
        if found.is_none() {
            debug!(id, spouse = sid, "dangling spouse reference");
        }
        found
    });
    let spouse_id = spouse.map(|s| s.id.as_str());

    // Children of the couple: linked to this person or to the resolved
    // spouse. Each record is seen once, so the couple's children are
    // naturally deduplicated by id.
    let mut child_ids: Vec<&str> = records
        .values()
        .filter(|c| {
            is_child_of(c, id) || spouse_id.is_some_and(|sid| is_child_of(c, sid))
        })
        .map(|c| c.id.as_str())
        .collect();
    child_ids.sort_by_key(|cid| id_sort_key(cid));

    let children = child_ids
        .into_iter()
        .filter_map(|cid| build_branch(cid, level + 1, visited, records))
        .collect();

    Some(FamilyTreeNode {
        person: person.clone(),
        level,
        spouse: spouse.cloned(),
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::test_person as person;

    fn records(people: Vec<Person>) -> HashMap<String, Person> {
        people.into_iter().map(|p| (p.id.clone(), p)).collect()
    }

    /// The canonical couple: A married to B, child C of both.
    fn couple_with_child() -> HashMap<String, Person> {
        let mut a = person("1");
        a.spouse_id = Some("2".into());
        let mut b = person("2");
        b.spouse_id = Some("1".into());
        let mut c = person("3");
        c.father_id = Some("1".into());
        c.mother_id = Some("2".into());
        records(vec![a, b, c])
    }

    fn all_ids(forest: &[FamilyTreeNode], out: &mut Vec<String>) {
        for node in forest {
            out.push(node.person.id.clone());
            all_ids(&node.children, out);
        }
    }

    #[test]
    fn test_couple_collapses_to_one_root() {
        let forest = build_forest(&couple_with_child());
        assert_eq!(forest.len(), 1);
        let root = &forest[0];
        assert_eq!(root.person.id, "1");
        assert_eq!(root.level, 0);
        assert_eq!(root.spouse.as_ref().unwrap().id, "2");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].person.id, "3");
        assert_eq!(root.children[0].level, 1);
    }

    #[test]
    fn test_one_directional_spouse_link_does_not_collapse() {
        let mut map = couple_with_child();
        map.get_mut("2").unwrap().spouse_id = None;
        let forest = build_forest(&map);
        // not mutual, so both stay roots; child still appears only once
        assert_eq!(forest.len(), 2);
        let mut ids = Vec::new();
        all_ids(&forest, &mut ids);
        assert_eq!(ids.iter().filter(|id| *id == "3").count(), 1);
    }

    #[test]
    fn test_sentinel_parent_is_still_a_founder() {
        // father "99" normalizes to None upstream; simulate post-normalize
        let solo = person("5");
        let map = records(vec![solo]);
        let forest = build_forest(&map);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].person.id, "5");
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn test_linked_child_is_never_a_root() {
        let mut map = couple_with_child();
        // grandchild under "3", so the middle generation is both a child
        // and a parent; only "1" may surface as a root
        let mut d = person("4");
        d.father_id = Some("3".into());
        map.insert("4".into(), d);
        let forest = build_forest(&map);
        assert_eq!(forest.len(), 1);
        let mut ids = Vec::new();
        all_ids(&forest, &mut ids);
        ids.sort();
        assert_eq!(ids, ["1", "3", "4"]);
    }

    #[test]
    fn test_cyclic_parentage_terminates() {
        let mut a = person("1");
        a.father_id = Some("2".into());
        let mut b = person("2");
        b.father_id = Some("1".into());
        // both are "children", so neither is a founder: empty forest,
        // but crucially no infinite recursion anywhere
        let forest = build_forest(&records(vec![a, b]));
        assert!(forest.is_empty());
    }

    #[test]
    fn test_self_parent_terminates() {
        let a = person("1");
        let mut b = person("2");
        b.father_id = Some("2".into());
        b.mother_id = Some("1".into());
        let forest = build_forest(&records(vec![a, b]));
        // "2" is its own father: visited guard stops the descent
        assert_eq!(forest.len(), 1);
        let mut ids = Vec::new();
        all_ids(&forest, &mut ids);
        assert_eq!(ids.iter().filter(|id| *id == "2").count(), 1);
    }

    #[test]
    fn test_each_person_appears_at_most_once() {
        // shared child linked under two unrelated founders
        let f1 = person("1");
        let f2 = person("2");
        let mut shared = person("3");
        shared.father_id = Some("1".into());
        shared.mother_id = Some("2".into());
        let forest = build_forest(&records(vec![f1, f2, shared]));
        let mut ids = Vec::new();
        all_ids(&forest, &mut ids);
        ids.sort();
        ids.dedup();
        let mut again = Vec::new();
        all_ids(&forest, &mut again);
        again.sort();
        assert_eq!(ids, again, "duplicate person id in forest output");
    }

    #[test]
    fn test_dangling_references_degrade_gracefully() {
        let mut a = person("1");
        a.spouse_id = Some("404".into());
        let mut b = person("2");
        b.father_id = Some("1".into());
        b.mother_id = Some("404".into());
        let forest = build_forest(&records(vec![a, b]));
        assert_eq!(forest.len(), 1);
        assert!(forest[0].spouse.is_none());
        assert_eq!(forest[0].children.len(), 1);
    }

    #[test]
    fn test_founder_order_is_numeric_then_lexical() {
        let forest = build_forest(&records(vec![
            person("10"),
            person("2"),
            person("abc"),
        ]));
        let roots: Vec<&str> = forest.iter().map(|n| n.person.id.as_str()).collect();
        assert_eq!(roots, ["2", "10", "abc"]);
    }

    #[test]
    fn test_empty_record_set_yields_empty_forest() {
        assert!(build_forest(&HashMap::new()).is_empty());
    }
}
