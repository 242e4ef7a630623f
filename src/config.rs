// src/config.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "vulnerability_checker")]
#[command(version, about = "Look up known vulnerabilities and the first safe version of a product")]
pub struct Config {
	/// Catalog database file. It is archived to `<path>.zlib` on exit.
	#[arg(long, env = "VULN_DB_PATH", default_value = "vulnerabilities.sqlite")]
	pub db_path: PathBuf,

	/// Product versions source (JSON array, or CSV by extension)
	#[arg(long, env = "VULN_VERSIONS_FILE", default_value = "json/versions.json")]
	pub versions_file: PathBuf,

	/// Vulnerabilities source (JSON array, or CSV by extension)
	#[arg(long, env = "VULN_VULNERABILITIES_FILE", default_value = "json/vulnerabilities.json")]
	pub vulnerabilities_file: PathBuf,

	/// Leave the database uncompressed on exit
	#[arg(long)]
	pub no_archive: bool,

	/// Log level used when RUST_LOG is not set
	#[arg(long, default_value = "warn")]
	pub log_level: String,

	#[command(subcommand)]
	pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Print the first safe version of a product
	Safe {
		product: String,
	},
	/// Check one version of a product for vulnerabilities
	Check {
		product: String,
		version: String,
	},
	/// List products in the catalog
	Products,
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn test_cli_definition() {
		Config::command().debug_assert();
	}

	#[test]
	fn test_defaults_and_subcommands() {
		let config = Config::try_parse_from(["vulnerability_checker"]).unwrap();
		assert_eq!(config.versions_file, PathBuf::from("json/versions.json"));
		assert!(!config.no_archive);
		assert!(config.command.is_none());

		let config = Config::try_parse_from([
			"vulnerability_checker",
			"--db-path",
			"/tmp/catalog.sqlite",
			"check",
			"Widget (Pro)",
			"1.2.3",
		])
		.unwrap();
		assert_eq!(config.db_path, PathBuf::from("/tmp/catalog.sqlite"));
		match config.command {
			Some(Command::Check { product, version }) => {
				assert_eq!(product, "Widget (Pro)");
				assert_eq!(version, "1.2.3");
			}
			other => panic!("unexpected command: {:?}", other),
		}
	}
}
