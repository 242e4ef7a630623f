// src/models/vulnerability.rs

use chrono::NaiveDate;

/// A known vulnerability affecting the versions in `[start_version, fixed_version)`.
///
/// Keyed by `(vendor, product, vuln_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VulnerabilityRecord {
	pub vendor: String,
	pub product: String,
	pub vuln_id: String,
	pub description: String,
	pub publish_date: NaiveDate,
	pub start_version: String,
	pub fixed_version: String,
}

impl VulnerabilityRecord {
	/// Public advisory page for this record.
	pub fn advisory_url(&self) -> String {
		format!("https://threats.kaspersky.com/en/vulnerability/{}", self.vuln_id)
	}
}
