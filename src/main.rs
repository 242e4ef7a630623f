// src/main.rs

mod cli;
mod config;
mod db;
mod engine;
mod error;
mod models;
mod repositories;
mod services;
mod utils;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::render;
use config::{Command, Config};
use console::Term;
use db::archive;
use db::connection::SqlitePool;
use db::store;
use log::{error, info, warn};
use repositories::catalog_repo::CatalogRepository;
use services::query::VulnerabilityService;
use std::path::Path;
use std::sync::Arc;
use utils::importer::{load_versions, load_vulnerabilities};

struct App {
	config: Config,
	pool: Arc<SqlitePool>,
}

impl App {
	fn new(config: Config) -> Result<Self> {
		utils::logger::init(&config.log_level);
		info!("Starting vulnerability checker");

		let pool = Arc::new(
			store::open_store(&config.db_path)
				.context("Failed to initialize the catalog database")?,
		);
		info!("Database ready at {:?}", config.db_path);

		Ok(App { config, pool })
	}

	async fn import_catalog(&self, repo: &CatalogRepository) -> Result<()> {
		let (versions, vulnerabilities) =
			import_sources(&self.config.versions_file, &self.config.vulnerabilities_file, repo).await?;

		let counts = repo.counts().await?;
		info!(
			"Catalog holds {} versions and {} vulnerabilities",
			counts.versions, counts.vulnerabilities
		);
		println!(
			"{}",
			console::style(format!("Loaded {} versions and {} vulnerabilities.", versions, vulnerabilities)).green()
		);
		Ok(())
	}

	async fn run(self) -> Result<()> {
		let repo = CatalogRepository::new(self.pool.clone());
		let outcome = self.serve(repo).await;

		let App { config, pool } = self;
		drop(pool);
		if !config.no_archive {
			if let Err(e) = archive::compress_file(&config.db_path) {
				warn!("Failed to archive the database: {:#}", e);
			}
		}
		outcome
	}

	async fn serve(&self, repo: CatalogRepository) -> Result<()> {
		self.import_catalog(&repo).await?;
		let service = VulnerabilityService::new(repo);

		let links = Term::stdout().is_term();

		match &self.config.command {
			None => {
				println!("{}", render::banner());
				if !links {
					println!("{}", render::link_notice());
				}
				cli::session::run(&service, links).await
			}
			Some(Command::Safe { product }) => {
				let out = cli::commands::safe_version(&service, product.trim()).await?;
				println!("{}", out);
				Ok(())
			}
			Some(Command::Check { product, version }) => {
				let out = cli::commands::check_version(&service, product.trim(), version.trim(), links).await?;
				println!("{}", out);
				Ok(())
			}
			Some(Command::Products) => {
				println!("{}", cli::commands::list_products(&service).await?);
				Ok(())
			}
		}
	}
}

/// Loads both sources. Fails if either yields nothing, whether it is missing,
/// unreadable or holds no valid records.
async fn import_sources(
	versions_file: &Path,
	vulnerabilities_file: &Path,
	repo: &CatalogRepository,
) -> Result<(usize, usize)> {
	let versions = match load_versions(versions_file, repo).await {
		Ok(count) => count,
		Err(e) => {
			error!("Failed to load versions from {:?}: {:#}", versions_file, e);
			0
		}
	};
	let vulnerabilities = match load_vulnerabilities(vulnerabilities_file, repo).await {
		Ok(count) => count,
		Err(e) => {
			error!("Failed to load vulnerabilities from {:?}: {:#}", vulnerabilities_file, e);
			0
		}
	};

	if versions == 0 || vulnerabilities == 0 {
		bail!("No data loaded. Check the source files.");
	}
	Ok((versions, vulnerabilities))
}

#[tokio::main]
async fn main() -> Result<()> {
	let config = Config::parse();
	let app = App::new(config)?;
	app.run().await
}
