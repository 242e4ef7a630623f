// src/engine/matcher.rs

//! Half-open range matching and the safe-version search.

use crate::engine::version::ParsedVersion;
use crate::error::{LookupError, LookupResult};
use crate::models::vulnerability::VulnerabilityRecord;
use log::debug;

/// A vulnerability record with its bounds parsed.
///
/// Construction guarantees `start < fixed`.
#[derive(Debug, Clone)]
pub struct VulnerabilityRange {
	record: VulnerabilityRecord,
	start: ParsedVersion,
	fixed: ParsedVersion,
}

impl VulnerabilityRange {
	/// Parses both bounds of `record`.
	///
	/// # Errors
	///
	/// * `InvalidVersionFormat` if either bound does not parse.
	/// * `MalformedRange` if the start version is not strictly lower than the
	///   fixed version.
	pub fn new(record: VulnerabilityRecord) -> LookupResult<Self> {
		let start = ParsedVersion::parse(&record.start_version)?;
		let fixed = ParsedVersion::parse(&record.fixed_version)?;

		if start >= fixed {
			return Err(LookupError::MalformedRange {
				vuln_id: record.vuln_id.clone(),
				start: record.start_version.clone(),
				fixed: record.fixed_version.clone(),
			});
		}

		Ok(Self { record, start, fixed })
	}

	pub fn record(&self) -> &VulnerabilityRecord {
		&self.record
	}

	pub fn into_record(self) -> VulnerabilityRecord {
		self.record
	}
}

/// `true` iff `start <= version < fixed`. The fixed version itself is safe.
pub fn is_vulnerable(version: &ParsedVersion, range: &VulnerabilityRange) -> bool {
	version >= &range.start && version < &range.fixed
}

/// Every range containing `version`, in input order.
pub fn evaluate<'a>(version: &ParsedVersion, ranges: &'a [VulnerabilityRange]) -> Vec<&'a VulnerabilityRange> {
	ranges
		.iter()
		.filter(|range| is_vulnerable(version, range))
		.collect()
}

/// Result of the safe-version search.
///
/// `latest` is the highest known version regardless of whether it is safe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeVersionReport {
	pub safe: Option<String>,
	pub latest: Option<String>,
}

/// Finds the lowest version not covered by any range.
///
/// Each candidate is checked against every range: a range starting later can
/// flag a version above the fix of an earlier one.
///
/// # Errors
///
/// * `NoVersionsFound` if `versions` is empty.
/// * `InvalidVersionFormat` if any candidate does not parse.
pub fn first_safe_version<S: AsRef<str>>(
	versions: &[S],
	ranges: &[VulnerabilityRange],
) -> LookupResult<SafeVersionReport> {
	if versions.is_empty() {
		return Err(LookupError::NoVersionsFound);
	}

	let mut parsed = versions
		.iter()
		.map(|v| ParsedVersion::parse(v.as_ref()))
		.collect::<LookupResult<Vec<_>>>()?;
	parsed.sort();

	let safe = parsed.iter().find(|candidate| {
		let hits = evaluate(candidate, ranges);
		if !hits.is_empty() {
			debug!("{} is affected by {} vulnerabilities", candidate, hits.len());
		}
		hits.is_empty()
	});

	Ok(SafeVersionReport {
		safe: safe.map(ToString::to_string),
		latest: parsed.last().map(ToString::to_string),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;

	fn record(id: &str, start: &str, fixed: &str) -> VulnerabilityRecord {
		VulnerabilityRecord {
			vendor: "Acme".to_string(),
			product: "Widget".to_string(),
			vuln_id: id.to_string(),
			description: format!("{} test vulnerability", id),
			publish_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
			start_version: start.to_string(),
			fixed_version: fixed.to_string(),
		}
	}

	fn range(id: &str, start: &str, fixed: &str) -> VulnerabilityRange {
		VulnerabilityRange::new(record(id, start, fixed)).unwrap()
	}

	fn v(s: &str) -> ParsedVersion {
		ParsedVersion::parse(s).unwrap()
	}

	#[test]
	fn test_half_open_boundaries() {
		let r = range("KLA-1", "2.0.0", "2.5.0");
		assert!(!is_vulnerable(&v("2.5.0"), &r));
		assert!(is_vulnerable(&v("2.4.99"), &r));
		assert!(is_vulnerable(&v("2.0.0"), &r));
		assert!(!is_vulnerable(&v("1.9.9"), &r));
		assert!(!is_vulnerable(&v("2.5"), &r));
		assert!(is_vulnerable(&v("2.5.0-rc.1"), &r));
	}

	#[test]
	fn test_malformed_ranges_rejected() {
		for (start, fixed) in [("2.0.0", "2.0.0"), ("2.0", "2.0.0"), ("3.0.0", "2.0.0")] {
			let err = VulnerabilityRange::new(record("KLA-9", start, fixed)).unwrap_err();
			assert!(matches!(err, LookupError::MalformedRange { .. }), "{} / {}", start, fixed);
		}

		let err = VulnerabilityRange::new(record("KLA-9", "x.y", "2.0.0")).unwrap_err();
		assert!(matches!(err, LookupError::InvalidVersionFormat(_)));
	}

	#[test]
	fn test_evaluate_returns_all_matches_in_order() {
		let ranges = vec![
			range("KLA-3", "1.5.0", "3.0.0"),
			range("KLA-1", "1.0.0", "2.0.0"),
			range("KLA-2", "4.0.0", "5.0.0"),
		];

		let hits: Vec<&str> = evaluate(&v("1.7.2"), &ranges)
			.iter()
			.map(|r| r.record().vuln_id.as_str())
			.collect();
		assert_eq!(hits, vec!["KLA-3", "KLA-1"]);

		assert!(evaluate(&v("3.5"), &ranges).is_empty());
	}

	#[test]
	fn test_first_safe_version_basic() {
		let ranges = vec![range("KLA-1", "1.0.0", "2.0.0")];
		let report = first_safe_version(&["1.0.0", "1.1.0", "2.0.0"], &ranges).unwrap();
		assert_eq!(report.safe.as_deref(), Some("2.0.0"));
		assert_eq!(report.latest.as_deref(), Some("2.0.0"));
	}

	#[test]
	fn test_first_safe_version_without_records() {
		let report = first_safe_version(&["1.10.0", "1.2.0", "1.9.0"], &[]).unwrap();
		assert_eq!(report.safe.as_deref(), Some("1.2.0"));
		assert_eq!(report.latest.as_deref(), Some("1.10.0"));
	}

	#[test]
	fn test_first_safe_version_single_version_without_records() {
		let report = first_safe_version(&["3.1"], &[]).unwrap();
		assert_eq!(report.safe, report.latest);
		assert_eq!(report.latest.as_deref(), Some("3.1"));
	}

	#[test]
	fn test_first_safe_version_empty() {
		let versions: [&str; 0] = [];
		let err = first_safe_version(&versions, &[]).unwrap_err();
		assert!(matches!(err, LookupError::NoVersionsFound));
	}

	#[test]
	fn test_first_safe_version_sorts_numerically() {
		let ranges = vec![range("KLA-1", "1.0.0", "1.10.0")];
		let report = first_safe_version(&["1.9.0", "1.10.0", "1.2.0", "1.11.0"], &ranges).unwrap();
		assert_eq!(report.safe.as_deref(), Some("1.10.0"));
		assert_eq!(report.latest.as_deref(), Some("1.11.0"));
	}

	#[test]
	fn test_later_range_reflags_versions() {
		// 2.0.0 fixes KLA-1 but is inside KLA-2
		let ranges = vec![
			range("KLA-1", "1.0.0", "2.0.0"),
			range("KLA-2", "2.0.0", "2.2.0"),
		];
		let report = first_safe_version(&["1.0.0", "2.0.0", "2.1.0", "2.2.0", "3.0.0"], &ranges).unwrap();
		assert_eq!(report.safe.as_deref(), Some("2.2.0"));
		assert_eq!(report.latest.as_deref(), Some("3.0.0"));
	}

	#[test]
	fn test_no_safe_version() {
		let ranges = vec![range("KLA-1", "0.1", "10.0")];
		let report = first_safe_version(&["1.0", "2.0", "9.9.9"], &ranges).unwrap();
		assert_eq!(report.safe, None);
		assert_eq!(report.latest.as_deref(), Some("9.9.9"));
	}

	#[test]
	fn test_invalid_candidate_fails() {
		let err = first_safe_version(&["1.0", "not-a-version"], &[]).unwrap_err();
		assert!(matches!(err, LookupError::InvalidVersionFormat(_)));
	}
}
