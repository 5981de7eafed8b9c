//! Engine demo harness
//!
//! Loads a JSON file of raw family records, runs all three projections and
//! logs the results. Usage: `familytree-engine <records.json>`

use chrono::Utc;
use std::collections::HashMap;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use genealogy::{build_forest, normalize_records, project_events, summarize, upcoming, RawRecord};

fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: familytree-engine <records.json>"))?;
    let json = std::fs::read_to_string(&path)?;
    let raw: HashMap<String, RawRecord> = serde_json::from_str(&json)?;

    let records = normalize_records(&raw);
    let today = Utc::now().date_naive();
    info!("Loaded {} records from {}", records.len(), path);

    let forest = build_forest(&records);
    info!("Forest: {} root(s)", forest.len());
    for root in &forest {
        info!(
            "  {} (spouse: {}, {} children)",
            root.person.display_name(),
            root.spouse
                .as_ref()
                .map(|s| s.display_name())
                .unwrap_or("none"),
            root.children.len()
        );
    }

    let events = project_events(&records, today);
    let next_60_days = upcoming(&events, today, 60);
    info!(
        "{} events this year, {} in the next 60 days",
        events.len(),
        next_60_days.len()
    );
    for event in &next_60_days {
        info!("  {} — {}", event.occurs_on, event.display_name);
    }

    let summary = summarize(&records, today);
    info!(
        "{} members ({} living), {:.1} children per person on average",
        summary.total_members, summary.living_members, summary.average_children
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
