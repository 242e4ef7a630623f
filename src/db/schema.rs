use rusqlite::Connection;
use anyhow::{Result, Context, bail};

pub fn create_tables(conn: &Connection) -> Result<()> {
	conn.execute_batch(
		"
		CREATE TABLE IF NOT EXISTS products (
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			vendor TEXT NOT NULL,
			product TEXT NOT NULL,
			version TEXT NOT NULL,
			UNIQUE(vendor, product, version)
		);

		CREATE TABLE IF NOT EXISTS vulnerabilities (
			id INTEGER PRIMARY KEY AUTOINCREMENT,
			vendor TEXT NOT NULL,
			product TEXT NOT NULL,
			vuln_id TEXT NOT NULL,
			description TEXT NOT NULL,
			publish_date TEXT NOT NULL,
			start_vuln_version TEXT NOT NULL,
			fixed_version TEXT NOT NULL,
			UNIQUE(vendor, product, vuln_id)
		);

		CREATE INDEX IF NOT EXISTS idx_products_product
		ON products(product);

		CREATE INDEX IF NOT EXISTS idx_vulnerabilities_product
		ON vulnerabilities(product);
		"
	).context("Failed to create tables")?;

	Ok(())
}

/// Runs SQLite's quick integrity check on the open store.
pub fn check_integrity(conn: &Connection) -> Result<()> {
	let status: String = conn
		.query_row("PRAGMA quick_check", [], |row| row.get(0))
		.context("Failed to run integrity check")?;

	if status != "ok" {
		bail!("Database integrity check failed: {}", status);
	}
	Ok(())
}
