// src/db/store.rs

//! Opening the catalog store, restoring it from its archive and, once, rebuilding it.

use crate::db::archive::{archive_path, decompress_file};
use crate::db::connection::{self, SqlitePool};
use crate::db::schema;
use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Healthy → (failure) → Recovering → Healthy. A failure while
/// `Recovering` is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreState {
	Healthy,
	Recovering { reason: String },
}

/// Opens the store at `db_path`, creating it on first run.
///
/// An archive left by a previous session is restored first. If the store
/// cannot be opened, its files are deleted and it is created again.
pub fn open_store(db_path: &Path) -> Result<SqlitePool> {
	let mut state = StoreState::Healthy;

	loop {
		let err = match try_open(db_path) {
			Ok(pool) => {
				if let StoreState::Recovering { reason } = &state {
					info!("Store recreated after failure: {}", reason);
				}
				return Ok(pool);
			}
			Err(e) => e,
		};

		match &state {
			StoreState::Healthy => {
				warn!("Failed to open database {:?}: {:#}", db_path, err);
				warn!("Recovering: deleting the old database and creating a new one");
				remove_store_files(db_path)?;
				state = StoreState::Recovering { reason: format!("{:#}", err) };
			}
			StoreState::Recovering { .. } => {
				return Err(err.context("Failed to recreate database during recovery"));
			}
		}
	}
}

fn try_open(db_path: &Path) -> Result<SqlitePool> {
	let archive = archive_path(db_path);
	if archive.exists() {
		decompress_file(&archive).context("Failed to restore archived database")?;
	} else if !db_path.exists() {
		info!("First run: no database found at {:?}, creating a new one", db_path);
	}

	let pool = connection::establish_pool_with_path(db_path)?;
	let conn = pool.get().context("Failed to get database connection")?;
	schema::create_tables(&conn)?;
	schema::check_integrity(&conn)?;
	Ok(pool)
}

fn remove_store_files(db_path: &Path) -> Result<()> {
	for path in [db_path.to_path_buf(), archive_path(db_path)] {
		if path.exists() {
			fs::remove_file(&path).with_context(|| format!("Failed to delete {:?}", path))?;
			warn!("Deleted {:?}", path);
		}
	}
	Ok(())
}
