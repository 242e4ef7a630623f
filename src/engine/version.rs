// src/engine/version.rs

//! Version parsing and ordering used for range matching.
//!
//! A version is a dotted numeric release (`1`, `1.2`, `1.2.3.4`), optionally
//! preceded by `v`, followed by an optional tag (`-rc.1`, `rc1`, `.beta2`,
//! `.post1`) and an optional `+build` tag.
//!
//! Tags opening with a known marker are ranked `dev < a < b < rc < release <
//! post`. Any other tag sorts as a pre-release just below the release.

use crate::error::{LookupError, LookupResult};
use std::cmp::Ordering;
use std::fmt;

/// One pre-release or build identifier.
///
/// Variant order matters: numeric identifiers sort below alphanumeric ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Identifier {
	Numeric(u64),
	Alpha(String),
}

/// Where a tag places a version relative to its release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
	Dev,
	Alpha,
	Beta,
	Candidate,
	Unknown,
	Release,
	Post,
}

#[derive(Debug, Clone)]
pub struct ParsedVersion {
	raw: String,
	release: Vec<u64>,
	pre: Vec<Identifier>,
	build: Vec<Identifier>,
}

impl ParsedVersion {
	/// Parses a version string.
	///
	/// # Errors
	///
	/// Returns `LookupError::InvalidVersionFormat` when the input cannot be
	/// split into an ordered sequence of components.
	pub fn parse(input: &str) -> LookupResult<Self> {
		let invalid = || LookupError::InvalidVersionFormat(input.to_string());

		let trimmed = input.trim();
		let body = trimmed
			.strip_prefix(['v', 'V'])
			.unwrap_or(trimmed);

		let (body, build) = match body.split_once('+') {
			Some((body, build)) => (body, Some(build)),
			None => (body, None),
		};

		let core_end = body
			.find(|c: char| !(c.is_ascii_digit() || c == '.'))
			.unwrap_or(body.len());
		let (mut core, mut rest) = body.split_at(core_end);

		// "2.0.0.beta1": the dot before the tag belongs to the tag
		if let Some(stripped) = core.strip_suffix('.') {
			if rest.is_empty() {
				return Err(invalid());
			}
			core = stripped;
		} else if let Some(stripped) = rest.strip_prefix(['-', '_']) {
			rest = stripped;
			if rest.is_empty() {
				return Err(invalid());
			}
		}

		if core.is_empty() {
			return Err(invalid());
		}

		let release = core
			.split('.')
			.map(|part| {
				if part.is_empty() {
					return None;
				}
				part.parse::<u64>().ok()
			})
			.collect::<Option<Vec<_>>>()
			.ok_or_else(invalid)?;

		let pre = if rest.is_empty() {
			Vec::new()
		} else {
			tokenize(rest).ok_or_else(invalid)?
		};

		let build = match build {
			Some(tag) => tokenize(tag).ok_or_else(invalid)?,
			None => Vec::new(),
		};

		Ok(Self {
			raw: trimmed.to_string(),
			release,
			pre,
			build,
		})
	}

	fn cmp_release(&self, other: &Self) -> Ordering {
		let len = self.release.len().max(other.release.len());
		for idx in 0..len {
			let a = self.release.get(idx).copied().unwrap_or(0);
			let b = other.release.get(idx).copied().unwrap_or(0);
			match a.cmp(&b) {
				Ordering::Equal => {}
				ord => return ord,
			}
		}
		Ordering::Equal
	}

	fn cmp_pre(&self, other: &Self) -> Ordering {
		let (phase, rest) = classify(&self.pre);
		let (other_phase, other_rest) = classify(&other.pre);
		phase.cmp(&other_phase).then_with(|| rest.cmp(other_rest))
	}
}

/// Splits a tag into its phase and the identifiers after the marker.
/// Unknown tags keep every identifier so they still order among themselves.
fn classify(tag: &[Identifier]) -> (Phase, &[Identifier]) {
	let Some((Identifier::Alpha(marker), rest)) = tag.split_first() else {
		return if tag.is_empty() { (Phase::Release, tag) } else { (Phase::Unknown, tag) };
	};

	let phase = match marker.as_str() {
		"dev" => Phase::Dev,
		"a" | "alpha" => Phase::Alpha,
		"b" | "beta" => Phase::Beta,
		"c" | "rc" | "pre" | "preview" => Phase::Candidate,
		"post" | "rev" | "r" => Phase::Post,
		_ => return (Phase::Unknown, tag),
	};
	(phase, rest)
}

/// Splits a tag into identifiers on `.`, `-` and `_`, and again at every
/// boundary between letters and digits (`rc10` → `rc`, `10`).
fn tokenize(tag: &str) -> Option<Vec<Identifier>> {
	let mut identifiers = Vec::new();

	for segment in tag.split(['.', '-', '_']) {
		if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_alphanumeric()) {
			return None;
		}

		let mut run = String::new();
		let mut run_is_digit = false;
		for c in segment.chars() {
			if !run.is_empty() && c.is_ascii_digit() != run_is_digit {
				identifiers.push(identifier(&run, run_is_digit)?);
				run.clear();
			}
			run_is_digit = c.is_ascii_digit();
			run.push(c);
		}
		identifiers.push(identifier(&run, run_is_digit)?);
	}

	Some(identifiers)
}

fn identifier(run: &str, numeric: bool) -> Option<Identifier> {
	if numeric {
		run.parse().ok().map(Identifier::Numeric)
	} else {
		Some(Identifier::Alpha(run.to_ascii_lowercase()))
	}
}

impl Ord for ParsedVersion {
	fn cmp(&self, other: &Self) -> Ordering {
		self.cmp_release(other)
			.then_with(|| self.cmp_pre(other))
			.then_with(|| self.build.cmp(&other.build))
	}
}

impl PartialOrd for ParsedVersion {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl PartialEq for ParsedVersion {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for ParsedVersion {}

impl fmt::Display for ParsedVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}
