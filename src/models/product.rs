// src/models/product.rs

/// A released version of a product, keyed by `(vendor, product, version)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductVersion {
	pub vendor: String,
	pub product: String,
	pub version: String,
}

impl ProductVersion {
	pub fn new(vendor: impl Into<String>, product: impl Into<String>, version: impl Into<String>) -> Self {
		Self {
			vendor: vendor.into(),
			product: product.into(),
			version: version.into(),
		}
	}
}

/// One line of the product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
	pub vendor: String,
	pub product: String,
	pub version_count: usize,
}
