// src/services/query.rs

//! The two catalog queries and the checks that gate them.

use crate::engine::matcher::{self, SafeVersionReport, VulnerabilityRange};
use crate::engine::version::ParsedVersion;
use crate::error::{LookupError, LookupResult};
use crate::models::product::ProductSummary;
use crate::models::vulnerability::VulnerabilityRecord;
use crate::repositories::catalog_repo::CatalogRepository;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

lazy_static! {
	static ref PRODUCT_NAME: Regex = Regex::new(r"^[a-zA-Z0-9\s\-\(\)]+$").expect("valid product name pattern");
}

/// Checks the product name's shape without touching the store.
pub fn validate_product_name(product: &str) -> LookupResult<()> {
	if product.is_empty() {
		return Err(LookupError::InvalidProductName("the name must not be empty".to_string()));
	}
	if !PRODUCT_NAME.is_match(product) {
		return Err(LookupError::InvalidProductName(format!(
			"'{}' may only contain letters, digits, spaces, hyphens and parentheses",
			product
		)));
	}
	Ok(())
}

pub struct VulnerabilityService {
	repo: CatalogRepository,
}

impl VulnerabilityService {
	pub fn new(repo: CatalogRepository) -> Self {
		Self { repo }
	}

	/// Validates the name and checks that the catalog knows the product.
	pub async fn ensure_product(&self, product: &str) -> LookupResult<()> {
		validate_product_name(product)?;

		if !self.repo.product_exists(product).await? {
			return Err(LookupError::ProductNotFound(product.to_string()));
		}
		Ok(())
	}

	/// Checks that `version` parses and is on record for `product`.
	pub async fn ensure_version(&self, product: &str, version: &str) -> LookupResult<()> {
		ParsedVersion::parse(version)?;

		if !self.repo.version_exists(product, version).await? {
			return Err(LookupError::VersionNotFound {
				product: product.to_string(),
				version: version.to_string(),
			});
		}
		Ok(())
	}

	/// Every vulnerability whose range contains `version`, in storage order.
	pub async fn check_version(&self, product: &str, version: &str) -> LookupResult<Vec<VulnerabilityRecord>> {
		let parsed = ParsedVersion::parse(version)?;
		let ranges = self.load_ranges(product).await?;

		let hits = matcher::evaluate(&parsed, &ranges)
			.into_iter()
			.map(|range| range.record().clone())
			.collect::<Vec<_>>();

		debug!("{} {}: {} matching vulnerabilities", product, version, hits.len());
		Ok(hits)
	}

	/// First version of `product` not covered by any vulnerability, plus the
	/// latest known version. Both are `None` when no versions are known.
	/// Stored versions that no longer parse are skipped.
	pub async fn find_safe_version(&self, product: &str) -> LookupResult<SafeVersionReport> {
		let versions: Vec<String> = self
			.repo
			.list_versions(product)
			.await?
			.into_iter()
			.filter(|version| match ParsedVersion::parse(version) {
				Ok(_) => true,
				Err(e) => {
					warn!("Ignoring stored version of {}: {}", product, e);
					false
				}
			})
			.collect();
		let ranges = self.load_ranges(product).await?;

		match matcher::first_safe_version(&versions, &ranges) {
			Err(LookupError::NoVersionsFound) => Ok(SafeVersionReport::default()),
			other => other,
		}
	}

	pub async fn list_products(&self) -> LookupResult<Vec<ProductSummary>> {
		Ok(self.repo.list_products().await?)
	}

	/// Ranges for `product`. Rows that no longer form a valid range are
	/// skipped; ingestion rejects them, so they only come from older stores.
	async fn load_ranges(&self, product: &str) -> LookupResult<Vec<VulnerabilityRange>> {
		let records = self.repo.list_vulnerabilities(product).await?;

		let ranges = records
			.into_iter()
			.filter_map(|record| {
				let id = record.vuln_id.clone();
				match VulnerabilityRange::new(record) {
					Ok(range) => Some(range),
					Err(e) => {
						warn!("Ignoring stored vulnerability {}: {}", id, e);
						None
					}
				}
			})
			.collect();
		Ok(ranges)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::db::connection::SqlitePool;
	use crate::models::product::ProductVersion;
	use crate::repositories::catalog_repo::tests::{setup_test_db, vuln};
	use anyhow::Result;
	use std::sync::Arc;
	use tempfile::TempDir;

	async fn seeded_service() -> Result<(TempDir, Arc<SqlitePool>, VulnerabilityService)> {
		let (dir, pool) = setup_test_db()?;
		let repo = CatalogRepository::new(pool.clone());

		repo.insert_product_versions(
			["1.0.0", "1.1.0", "1.10.0", "2.0.0", "2.5.0", "3.0.0"]
				.iter()
				.map(|v| ProductVersion::new("Acme", "Widget (Pro)", *v))
				.chain(std::iter::once(ProductVersion::new("Acme", "Gadget", "0.9")))
				.collect(),
		)
			.await?;
		repo.insert_vulnerabilities(vec![
			vuln("Widget (Pro)", "KLA-B", "2.0.0", "2.5.0"),
			vuln("Widget (Pro)", "KLA-A", "1.0.0", "2.0.0"),
			vuln("Widget (Pro)", "KLA-C", "1.1.0", "2.1.0"),
			vuln("Gadget", "KLA-G", "0.1", "5.0"),
		])
			.await?;

		Ok((dir, pool, VulnerabilityService::new(repo)))
	}

	#[test]
	fn test_validate_product_name() {
		assert!(validate_product_name("Widget (Pro) 2-x").is_ok());
		assert!(matches!(validate_product_name(""), Err(LookupError::InvalidProductName(_))));
		assert!(matches!(validate_product_name("Widget; DROP TABLE"), Err(LookupError::InvalidProductName(_))));
		assert!(matches!(validate_product_name("Виджет"), Err(LookupError::InvalidProductName(_))));
	}

	#[tokio::test]
	async fn test_check_version_returns_all_overlaps() -> Result<()> {
		let (_dir, _pool, service) = seeded_service().await?;

		let ids: Vec<String> = service
			.check_version("Widget (Pro)", "1.10.0")
			.await?
			.into_iter()
			.map(|r| r.vuln_id)
			.collect();
		assert_eq!(ids, vec!["KLA-A", "KLA-C"]);

		let ids: Vec<String> = service
			.check_version("Widget (Pro)", "2.0.0")
			.await?
			.into_iter()
			.map(|r| r.vuln_id)
			.collect();
		assert_eq!(ids, vec!["KLA-B", "KLA-C"]);

		assert!(service.check_version("Widget (Pro)", "2.5.0").await?.is_empty());
		Ok(())
	}

	#[tokio::test]
	async fn test_check_version_rejects_bad_version() -> Result<()> {
		let (_dir, _pool, service) = seeded_service().await?;
		let err = service.check_version("Widget (Pro)", "two").await.unwrap_err();
		assert!(matches!(err, LookupError::InvalidVersionFormat(_)));
		Ok(())
	}

	#[tokio::test]
	async fn test_find_safe_version() -> Result<()> {
		let (_dir, _pool, service) = seeded_service().await?;

		let report = service.find_safe_version("Widget (Pro)").await?;
		assert_eq!(report.safe.as_deref(), Some("2.5.0"));
		assert_eq!(report.latest.as_deref(), Some("3.0.0"));

		let report = service.find_safe_version("Gadget").await?;
		assert_eq!(report.safe, None);
		assert_eq!(report.latest.as_deref(), Some("0.9"));

		let report = service.find_safe_version("Unknown").await?;
		assert_eq!(report, SafeVersionReport::default());
		Ok(())
	}

	#[tokio::test]
	async fn test_gating_checks() -> Result<()> {
		let (_dir, _pool, service) = seeded_service().await?;

		service.ensure_product("Widget (Pro)").await?;
		assert!(matches!(
			service.ensure_product("Gizmo").await,
			Err(LookupError::ProductNotFound(_))
		));
		assert!(matches!(
			service.ensure_product("").await,
			Err(LookupError::InvalidProductName(_))
		));

		service.ensure_version("Widget (Pro)", "1.10.0").await?;
		assert!(matches!(
			service.ensure_version("Widget (Pro)", "9.9.9").await,
			Err(LookupError::VersionNotFound { .. })
		));
		assert!(matches!(
			service.ensure_version("Widget (Pro)", "1..0").await,
			Err(LookupError::InvalidVersionFormat(_))
		));
		Ok(())
	}

	#[tokio::test]
	async fn test_stored_malformed_range_is_ignored() -> Result<()> {
		let (_dir, pool, service) = seeded_service().await?;
		pool.get()?.execute(
			"INSERT INTO vulnerabilities
			 (vendor, product, vuln_id, description, publish_date, start_vuln_version, fixed_version)
			 VALUES ('Acme', 'Widget (Pro)', 'KLA-X', 'inverted', '2020-01-01', '9.0', '1.0')",
			[],
		)?;

		let ids: Vec<String> = service
			.check_version("Widget (Pro)", "1.0.0")
			.await?
			.into_iter()
			.map(|r| r.vuln_id)
			.collect();
		assert_eq!(ids, vec!["KLA-A"]);
		Ok(())
	}

	#[tokio::test]
	async fn test_stored_unparsable_version_is_ignored() -> Result<()> {
		let (_dir, pool, service) = seeded_service().await?;
		pool.get()?.execute(
			"INSERT INTO products (vendor, product, version) VALUES ('Acme', 'Widget (Pro)', 'nightly')",
			[],
		)?;

		let report = service.find_safe_version("Widget (Pro)").await?;
		assert_eq!(report.safe.as_deref(), Some("2.5.0"));
		assert_eq!(report.latest.as_deref(), Some("3.0.0"));

		pool.get()?.execute(
			"INSERT INTO products (vendor, product, version) VALUES ('Acme', 'Gizmo', 'latest')",
			[],
		)?;
		assert_eq!(service.find_safe_version("Gizmo").await?, SafeVersionReport::default());
		Ok(())
	}
}
