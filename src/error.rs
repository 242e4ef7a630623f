// src/error.rs

use thiserror::Error;

/// Errors surfaced at the query boundary.
///
/// Storage failures come out of the repository layer as `anyhow::Error` and
/// are carried through unchanged.
#[derive(Error, Debug)]
pub enum LookupError {
	#[error("Invalid version format: '{0}'. Expected something like X.Y.Z")]
	InvalidVersionFormat(String),

	#[error("Invalid product name: {0}")]
	InvalidProductName(String),

	#[error("Product '{0}' was not found in the catalog")]
	ProductNotFound(String),

	#[error("Version '{version}' of product '{product}' was not found in the catalog")]
	VersionNotFound { product: String, version: String },

	#[error("No versions are known for the requested product")]
	NoVersionsFound,

	#[error("Malformed range for {vuln_id}: start version '{start}' is not lower than fixed version '{fixed}'")]
	MalformedRange {
		vuln_id: String,
		start: String,
		fixed: String,
	},

	#[error(transparent)]
	Storage(#[from] anyhow::Error),
}

pub type LookupResult<T> = std::result::Result<T, LookupError>;
