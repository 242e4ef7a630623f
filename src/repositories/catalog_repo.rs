// src/repositories/catalog_repo.rs

use crate::db::connection::SqlitePool;
use crate::models::product::{ProductSummary, ProductVersion};
use crate::models::vulnerability::VulnerabilityRecord;
use chrono::NaiveDate;
use rusqlite::{params, Error as SqliteError, OptionalExtension};
use std::sync::Arc;
use anyhow::{Result, Context};
use tokio::task;

/// Row counts of both catalog tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogCounts {
	pub versions: usize,
	pub vulnerabilities: usize,
}

#[derive(Clone)]
pub struct CatalogRepository {
	pool: Arc<SqlitePool>,
}

impl CatalogRepository {
	pub fn new(pool: Arc<SqlitePool>) -> Self {
		Self { pool }
	}

	/// Inserts a batch of product versions in one transaction.
	///
	/// Rows already present under `(vendor, product, version)` are ignored.
	/// Returns the number of new rows.
	pub async fn insert_product_versions(&self, batch: Vec<ProductVersion>) -> Result<usize> {
		let pool = self.pool.clone();

		task::spawn_blocking(move || -> Result<_> {
			let mut conn = pool.get().context("Failed to get database connection")?;
			let tx = conn.transaction()?;

			let mut inserted = 0;
			{
				let mut stmt = tx.prepare(
					"INSERT OR IGNORE INTO products (vendor, product, version)
					 VALUES (?1, ?2, ?3)",
				)?;
				for item in &batch {
					inserted += stmt
						.execute(params![item.vendor, item.product, item.version])
						.context("Failed to insert product version")?;
				}
			}

			tx.commit().context("Failed to commit transaction")?;
			Ok(inserted)
		})
			.await
			.context("Failed to execute database operation")?
	}

	/// Inserts a batch of vulnerabilities in one transaction.
	///
	/// Rows already present under `(vendor, product, vuln_id)` are ignored.
	/// Returns the number of new rows.
	pub async fn insert_vulnerabilities(&self, batch: Vec<VulnerabilityRecord>) -> Result<usize> {
		let pool = self.pool.clone();

		task::spawn_blocking(move || -> Result<_> {
			let mut conn = pool.get().context("Failed to get database connection")?;
			let tx = conn.transaction()?;

			let mut inserted = 0;
			{
				let mut stmt = tx.prepare(
					"INSERT OR IGNORE INTO vulnerabilities
					 (vendor, product, vuln_id, description, publish_date, start_vuln_version, fixed_version)
					 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
				)?;
				for vuln in &batch {
					inserted += stmt
						.execute(params![
							vuln.vendor,
							vuln.product,
							vuln.vuln_id,
							vuln.description,
							vuln.publish_date.format("%Y-%m-%d").to_string(),
							vuln.start_version,
							vuln.fixed_version,
						])
						.context("Failed to insert vulnerability")?;
				}
			}

			tx.commit().context("Failed to commit transaction")?;
			Ok(inserted)
		})
			.await
			.context("Failed to execute database operation")?
	}

	/// Distinct version strings known for `product`, in no particular order.
	pub async fn list_versions(&self, product: &str) -> Result<Vec<String>> {
		let pool = self.pool.clone();
		let product = product.to_string();

		task::spawn_blocking(move || -> Result<_> {
			let conn = pool.get().context("Failed to get database connection")?;
			let mut stmt = conn.prepare(
				"SELECT DISTINCT version FROM products WHERE product = ?1"
			)?;

			let rows = stmt.query_map([product], |row| row.get(0))?;
			rows
				.collect::<rusqlite::Result<Vec<String>>>()
				.context("Failed to collect versions")
		})
			.await
			.context("Failed to execute database operation")?
	}

	/// All vulnerabilities recorded for `product`, in insertion order.
	pub async fn list_vulnerabilities(&self, product: &str) -> Result<Vec<VulnerabilityRecord>> {
		let pool = self.pool.clone();
		let product = product.to_string();

		task::spawn_blocking(move || -> Result<_> {
			let conn = pool.get().context("Failed to get database connection")?;
			let mut stmt = conn.prepare(
				"SELECT vendor, product, vuln_id, description, publish_date, start_vuln_version, fixed_version
				 FROM vulnerabilities
				 WHERE product = ?1
				 ORDER BY id"
			)?;

			let rows = stmt.query_map([product], |row| {
				let publish_date: String = row.get(4)?;
				Ok(VulnerabilityRecord {
					vendor: row.get(0)?,
					product: row.get(1)?,
					vuln_id: row.get(2)?,
					description: row.get(3)?,
					publish_date: NaiveDate::parse_from_str(&publish_date, "%Y-%m-%d")
						.map_err(|e| SqliteError::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?,
					start_version: row.get(5)?,
					fixed_version: row.get(6)?,
				})
			})?;

			rows
				.collect::<rusqlite::Result<Vec<_>>>()
				.context("Failed to collect vulnerabilities")
		})
			.await
			.context("Failed to execute database operation")?
	}

	pub async fn product_exists(&self, product: &str) -> Result<bool> {
		let pool = self.pool.clone();
		let product = product.to_string();

		task::spawn_blocking(move || -> Result<_> {
			let conn = pool.get().context("Failed to get database connection")?;
			let found = conn
				.query_row(
					"SELECT 1 FROM products WHERE product = ?1 LIMIT 1",
					[product],
					|row| row.get::<_, i64>(0),
				)
				.optional()
				.context("Failed to look up product")?;
			Ok(found.is_some())
		})
			.await
			.context("Failed to execute database operation")?
	}

	/// Exact string match on the stored version.
	pub async fn version_exists(&self, product: &str, version: &str) -> Result<bool> {
		let pool = self.pool.clone();
		let product = product.to_string();
		let version = version.to_string();

		task::spawn_blocking(move || -> Result<_> {
			let conn = pool.get().context("Failed to get database connection")?;
			let found = conn
				.query_row(
					"SELECT 1 FROM products WHERE product = ?1 AND version = ?2 LIMIT 1",
					params![product, version],
					|row| row.get::<_, i64>(0),
				)
				.optional()
				.context("Failed to look up version")?;
			Ok(found.is_some())
		})
			.await
			.context("Failed to execute database operation")?
	}

	/// Every product in the catalog with the number of versions on record.
	pub async fn list_products(&self) -> Result<Vec<ProductSummary>> {
		let pool = self.pool.clone();

		task::spawn_blocking(move || -> Result<_> {
			let conn = pool.get().context("Failed to get database connection")?;
			let mut stmt = conn.prepare(
				"SELECT vendor, product, COUNT(*)
				 FROM products
				 GROUP BY vendor, product
				 ORDER BY product, vendor"
			)?;

			let rows = stmt.query_map([], |row| {
				let count: i64 = row.get(2)?;
				Ok(ProductSummary {
					vendor: row.get(0)?,
					product: row.get(1)?,
					version_count: usize::try_from(count).map_err(|_| SqliteError::InvalidQuery)?,
				})
			})?;

			rows
				.collect::<rusqlite::Result<Vec<_>>>()
				.context("Failed to collect products")
		})
			.await
			.context("Failed to execute database operation")?
	}

	pub async fn counts(&self) -> Result<CatalogCounts> {
		let pool = self.pool.clone();

		task::spawn_blocking(move || -> Result<_> {
			let conn = pool.get().context("Failed to get database connection")?;
			let versions: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
			let vulnerabilities: i64 =
				conn.query_row("SELECT COUNT(*) FROM vulnerabilities", [], |row| row.get(0))?;

			Ok(CatalogCounts {
				versions: usize::try_from(versions).context("Integer overflow for version count")?,
				vulnerabilities: usize::try_from(vulnerabilities)
					.context("Integer overflow for vulnerability count")?,
			})
		})
			.await
			.context("Failed to execute database operation")?
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;
	use crate::db::{connection, schema};
	use tempfile::{tempdir, TempDir};

	/// Fresh store in a temporary directory. Keep the `TempDir` alive for the
	/// duration of the test.
	pub(crate) fn setup_test_db() -> Result<(TempDir, Arc<SqlitePool>)> {
		let dir = tempdir()?;
		let db_path = dir.path().join("test.db");
		let pool = Arc::new(connection::establish_pool_with_path(&db_path)?);

		let conn = pool.get()?;
		schema::create_tables(&conn)?;

		Ok((dir, pool))
	}

	pub(crate) fn vuln(product: &str, id: &str, start: &str, fixed: &str) -> VulnerabilityRecord {
		VulnerabilityRecord {
			vendor: "Acme".to_string(),
			product: product.to_string(),
			vuln_id: id.to_string(),
			description: format!("Issue {}", id),
			publish_date: NaiveDate::from_ymd_opt(2023, 5, 17).unwrap(),
			start_version: start.to_string(),
			fixed_version: fixed.to_string(),
		}
	}

	#[tokio::test]
	async fn test_product_versions() -> Result<()> {
		let (_dir, pool) = setup_test_db()?;
		let repo = CatalogRepository::new(pool);

		let inserted = repo
			.insert_product_versions(vec![
				ProductVersion::new("Acme", "Widget", "1.0.0"),
				ProductVersion::new("Acme", "Widget", "1.1.0"),
				ProductVersion::new("Acme", "Widget", "1.0.0"),
				ProductVersion::new("Other", "Widget", "1.0.0"),
				ProductVersion::new("Acme", "Gadget", "3.2"),
			])
			.await?;
		assert_eq!(inserted, 4);

		let mut versions = repo.list_versions("Widget").await?;
		versions.sort();
		assert_eq!(versions, vec!["1.0.0", "1.1.0"]);

		assert!(repo.product_exists("Gadget").await?);
		assert!(!repo.product_exists("Gizmo").await?);
		assert!(repo.version_exists("Widget", "1.1.0").await?);
		assert!(!repo.version_exists("Widget", "3.2").await?);

		let products = repo.list_products().await?;
		assert_eq!(products.len(), 3);
		assert_eq!(products[0].product, "Gadget");
		assert_eq!(products[1].vendor, "Acme");
		assert_eq!(products[1].version_count, 2);

		Ok(())
	}

	#[tokio::test]
	async fn test_vulnerabilities_keep_insertion_order() -> Result<()> {
		let (_dir, pool) = setup_test_db()?;
		let repo = CatalogRepository::new(pool);

		let inserted = repo
			.insert_vulnerabilities(vec![
				vuln("Widget", "KLA-20", "2.0", "2.5"),
				vuln("Widget", "KLA-3", "1.0", "3.0"),
				vuln("Gadget", "KLA-7", "0.1", "0.2"),
				vuln("Widget", "KLA-20", "9.0", "9.5"),
			])
			.await?;
		assert_eq!(inserted, 3);

		let records = repo.list_vulnerabilities("Widget").await?;
		let ids: Vec<&str> = records.iter().map(|r| r.vuln_id.as_str()).collect();
		assert_eq!(ids, vec!["KLA-20", "KLA-3"]);
		assert_eq!(records[0].start_version, "2.0");
		assert_eq!(records[0].publish_date, NaiveDate::from_ymd_opt(2023, 5, 17).unwrap());

		assert_eq!(
			repo.counts().await?,
			CatalogCounts { versions: 0, vulnerabilities: 3 }
		);
		Ok(())
	}
}
