use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use anyhow::{Result, Context};
use log::info;

pub type SqlitePool = Pool<SqliteConnectionManager>;

/// Single user, one query at a time.
const POOL_SIZE: u32 = 4;

/// Establishes a connection pool for the catalog store at `path`
pub fn establish_pool_with_path(path: &Path) -> Result<SqlitePool> {
	info!("SQLite database will be located at: {:?}", path);

	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent)
			.context("Failed to create database directory")?;
	}

	let manager = SqliteConnectionManager::file(path);

	let pool = Pool::builder()
		.max_size(POOL_SIZE)
		.build(manager)
		.context("Failed to create SQLite connection pool")?;

	info!("SQLite connection pool established successfully");
	Ok(pool)
}
