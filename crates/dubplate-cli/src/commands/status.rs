use anyhow::Result;
use std::path::PathBuf;

use dubplate_core::model::TrackStatus;
use dubplate_core::schema::Database;

pub fn show_status(db: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(db)?;
    let database = Database::open(&config.database_path)?;

    let unreleased = database.count_tracks_by_status(TrackStatus::Unreleased)?;
    let removed = database.count_tracks_by_status(TrackStatus::Removed)?;
    let pending = database.list_pending_removals()?;

    println!("\n📊 Dubplate Status\n");
    println!("  Database: {}", config.database_path.display());
    println!("  Unreleased tracks: {unreleased}");
    println!("  Removed tracks: {removed}");
    println!("  Pending removals: {}", pending.len());

    if !pending.is_empty() {
        println!("\n  Run `dubplate reconcile` to resolve the pending removals");
    }

    Ok(())
}
