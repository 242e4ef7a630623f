// src/utils/importer.rs

use crate::engine::matcher::VulnerabilityRange;
use crate::engine::version::ParsedVersion;
use crate::models::product::ProductVersion;
use crate::models::vulnerability::VulnerabilityRecord;
use crate::repositories::catalog_repo::CatalogRepository;
use anyhow::{anyhow, Context, Error, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use encoding_rs_io::DecodeReaderBytesBuilder;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tokio::task;

/// The number of records to insert into the database in a single batch.
const BATCH_SIZE: usize = 1000;

/// One entry of the versions source.
#[derive(Debug, Deserialize)]
pub struct VersionEntry {
	pub vendor: String,
	pub product: String,
	pub version: String,
}

/// One entry of the vulnerabilities source.
///
/// Field names follow the published feed (`KLA_id`, `start_vuln_version`);
/// the model's own names are accepted as well.
#[derive(Debug, Deserialize)]
pub struct VulnerabilityEntry {
	pub vendor: String,
	pub product: String,

	#[serde(rename = "KLA_id", alias = "vuln_id")]
	pub vuln_id: String,

	pub description: String,

	pub publish_date: String,

	#[serde(rename = "start_vuln_version", alias = "start_version")]
	pub start_version: String,

	pub fixed_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
	Json,
	Csv,
}

impl SourceFormat {
	fn from_path(path: &Path) -> Self {
		match path.extension().and_then(|ext| ext.to_str()) {
			Some(ext) if ext.eq_ignore_ascii_case("csv") => SourceFormat::Csv,
			_ => SourceFormat::Json,
		}
	}
}

/// Loads product versions from `path` into the catalog.
///
/// Entries with an unparsable version are skipped with a warning. Entries
/// already in the catalog count as loaded.
///
/// # Returns
///
/// * `Result<usize>` - The number of accepted entries.
pub async fn load_versions(path: &Path, repo: &CatalogRepository) -> Result<usize> {
	let entries: Vec<VersionEntry> = read_source(path.to_path_buf()).await?;
	let total = entries.len();

	let accepted: Vec<ProductVersion> = entries
		.into_iter()
		.enumerate()
		.filter_map(|(idx, entry)| match process_version_entry(entry) {
			Ok(item) => Some(item),
			Err(e) => {
				warn!("Skipping version entry #{} in {:?}: {}", idx + 1, path, e);
				None
			}
		})
		.collect();

	let count = accepted.len();
	let inserted = insert_in_batches(accepted, |batch| repo.insert_product_versions(batch)).await?;

	info!("Loaded {} of {} versions from {:?} ({} new)", count, total, path, inserted);
	Ok(count)
}

/// Loads vulnerabilities from `path` into the catalog.
///
/// Entries whose versions do not parse, whose start version is not below the
/// fixed version, or whose publish date is not a date are skipped with a
/// warning.
///
/// # Returns
///
/// * `Result<usize>` - The number of accepted entries.
pub async fn load_vulnerabilities(path: &Path, repo: &CatalogRepository) -> Result<usize> {
	let entries: Vec<VulnerabilityEntry> = read_source(path.to_path_buf()).await?;
	let total = entries.len();

	let accepted: Vec<VulnerabilityRecord> = entries
		.into_iter()
		.filter_map(|entry| {
			let id = entry.vuln_id.clone();
			match process_vulnerability_entry(entry) {
				Ok(record) => Some(record),
				Err(e) => {
					warn!("Skipping vulnerability {} in {:?}: {}", id, path, e);
					None
				}
			}
		})
		.collect();

	let count = accepted.len();
	let inserted = insert_in_batches(accepted, |batch| repo.insert_vulnerabilities(batch)).await?;

	info!("Loaded {} of {} vulnerabilities from {:?} ({} new)", count, total, path, inserted);
	Ok(count)
}

async fn insert_in_batches<T, F, Fut>(items: Vec<T>, mut insert: F) -> Result<usize>
where
	F: FnMut(Vec<T>) -> Fut,
	Fut: std::future::Future<Output = Result<usize>>,
{
	let mut inserted = 0;
	let mut items = items.into_iter().peekable();

	while items.peek().is_some() {
		let batch: Vec<T> = items.by_ref().take(BATCH_SIZE).collect();
		inserted += insert(batch).await?;
	}

	Ok(inserted)
}

/// Reads and deserializes a whole source file off the async runtime.
async fn read_source<T>(path: PathBuf) -> Result<Vec<T>>
where
	T: DeserializeOwned + Send + 'static,
{
	task::spawn_blocking(move || -> Result<Vec<T>, Error> {
		let file = File::open(&path).with_context(|| format!("File not found: {:?}", path))?;

		// Strips a BOM and transcodes UTF-16 input to UTF-8
		let reader = DecodeReaderBytesBuilder::new()
			.strip_bom(true)
			.build(file);

		match SourceFormat::from_path(&path) {
			SourceFormat::Json => parse_json(BufReader::new(reader))
				.with_context(|| format!("Failed to read {:?}", path)),
			SourceFormat::Csv => parse_csv(reader, &path),
		}
	})
		.await
		.context("Failed to run import task")?
}

fn parse_json<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
	serde_json::from_reader(reader).context("Invalid JSON: expected an array of records")
}

fn parse_csv<T: DeserializeOwned, R: Read>(reader: R, path: &Path) -> Result<Vec<T>> {
	let mut rdr = ReaderBuilder::new()
		.trim(csv::Trim::All)
		.from_reader(reader);

	rdr.headers()
		.with_context(|| format!("Failed to read CSV headers from {:?}", path))?;

	let mut records = Vec::new();
	for (line_number, result) in rdr.deserialize::<T>().enumerate() {
		match result {
			Ok(record) => records.push(record),
			Err(e) => warn!("Skipping invalid record at line {} of {:?}: {}", line_number + 2, path, e),
		}
	}
	Ok(records)
}

fn process_version_entry(entry: VersionEntry) -> Result<ProductVersion, Error> {
	let vendor = required(entry.vendor, "vendor")?;
	let product = required(entry.product, "product")?;
	let version = required(entry.version, "version")?;

	ParsedVersion::parse(&version)?;

	Ok(ProductVersion::new(vendor, product, version))
}

fn process_vulnerability_entry(entry: VulnerabilityEntry) -> Result<VulnerabilityRecord, Error> {
	let record = VulnerabilityRecord {
		vendor: required(entry.vendor, "vendor")?,
		product: required(entry.product, "product")?,
		vuln_id: required(entry.vuln_id, "vulnerability id")?,
		description: entry.description.trim().to_string(),
		publish_date: parse_date(&entry.publish_date)?,
		start_version: entry.start_version.trim().to_string(),
		fixed_version: entry.fixed_version.trim().to_string(),
	};

	// Validates both bounds and their order
	let range = VulnerabilityRange::new(record)?;
	Ok(range.into_record())
}

fn required(value: String, field: &str) -> Result<String, Error> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		return Err(anyhow!("missing {}", field));
	}
	Ok(trimmed.to_string())
}

/// Parses an ISO date, ignoring any time part (`2024-02-01T10:00:00Z`).
fn parse_date(date_str: &str) -> Result<NaiveDate, Error> {
	let date_part = date_str
		.trim()
		.split(['T', ' '])
		.next()
		.unwrap_or_default();

	NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
		.with_context(|| format!("invalid publish date '{}'", date_str))
}
