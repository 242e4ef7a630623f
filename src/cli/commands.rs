// src/cli/commands.rs

//! Validate, query, render. Used by both the menu and the subcommands.

use crate::cli::render;
use crate::error::LookupResult;
use crate::services::query::VulnerabilityService;

pub async fn safe_version(service: &VulnerabilityService, product: &str) -> LookupResult<String> {
	service.ensure_product(product).await?;

	let report = service.find_safe_version(product).await?;
	Ok(render::safe_version_panel(product, &report))
}

pub async fn check_version(
	service: &VulnerabilityService,
	product: &str,
	version: &str,
	links: bool,
) -> LookupResult<String> {
	service.ensure_product(product).await?;
	service.ensure_version(product, version).await?;

	let records = service.check_version(product, version).await?;
	if records.is_empty() {
		return Ok(render::no_vulnerabilities(product, version));
	}
	Ok(render::vulnerability_table(&records, links))
}

pub async fn list_products(service: &VulnerabilityService) -> LookupResult<String> {
	let products = service.list_products().await?;
	Ok(render::product_list(&products))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::LookupError;
	use crate::models::product::ProductVersion;
	use crate::repositories::catalog_repo::tests::{setup_test_db, vuln};
	use crate::repositories::catalog_repo::CatalogRepository;
	use anyhow::Result;

	#[tokio::test]
	async fn test_commands_gate_and_render() -> Result<()> {
		let (_dir, pool) = setup_test_db()?;
		let repo = CatalogRepository::new(pool);
		repo.insert_product_versions(vec![
			ProductVersion::new("Acme", "Widget", "1.0.0"),
			ProductVersion::new("Acme", "Widget", "2.0.0"),
		])
			.await?;
		repo.insert_vulnerabilities(vec![vuln("Widget", "KLA55555", "1.0.0", "2.0.0")]).await?;
		let service = VulnerabilityService::new(repo);

		let out = safe_version(&service, "Widget").await?;
		assert!(out.contains("2.0.0"));

		let out = check_version(&service, "Widget", "1.0.0", false).await?;
		assert!(out.contains("KLA55555"));

		let out = check_version(&service, "Widget", "2.0.0", false).await?;
		assert!(out.contains("No vulnerabilities"));

		assert!(matches!(
			check_version(&service, "Widget", "1.5.0", false).await,
			Err(LookupError::VersionNotFound { .. })
		));
		assert!(matches!(
			safe_version(&service, "Wid$get").await,
			Err(LookupError::InvalidProductName(_))
		));

		let out = list_products(&service).await?;
		assert!(out.contains("Widget") && out.contains("2 versions"));
		Ok(())
	}
}
