// src/db/archive.rs

//! zlib archiving of the store file while the tool is not running.

use anyhow::{Context, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::info;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const ARCHIVE_EXTENSION: &str = "zlib";

/// `<db>.zlib` next to the store file.
pub fn archive_path(db_path: &Path) -> PathBuf {
	let mut name = db_path.as_os_str().to_owned();
	name.push(".");
	name.push(ARCHIVE_EXTENSION);
	PathBuf::from(name)
}

/// Compresses `db_path` into its archive and removes the original.
pub fn compress_file(db_path: &Path) -> Result<PathBuf> {
	let target = archive_path(db_path);

	let mut input = BufReader::new(
		File::open(db_path).with_context(|| format!("Failed to open {:?} for archiving", db_path))?,
	);
	let output = File::create(&target)
		.with_context(|| format!("Failed to create archive {:?}", target))?;

	let mut encoder = ZlibEncoder::new(BufWriter::new(output), Compression::default());
	let bytes = io::copy(&mut input, &mut encoder).context("Failed to compress database")?;
	encoder
		.finish()
		.context("Failed to finish archive stream")?
		.flush()
		.context("Failed to flush archive")?;

	fs::remove_file(db_path)
		.with_context(|| format!("Failed to remove {:?} after archiving", db_path))?;

	info!("Archived {} bytes from {:?} into {:?}", bytes, db_path, target);
	Ok(target)
}

/// Restores the store file from `archive` and removes the archive.
pub fn decompress_file(archive: &Path) -> Result<PathBuf> {
	let target = archive.with_extension("");

	let input = File::open(archive)
		.with_context(|| format!("Failed to open archive {:?}", archive))?;
	let mut decoder = ZlibDecoder::new(BufReader::new(input));
	let mut output = BufWriter::new(
		File::create(&target).with_context(|| format!("Failed to create {:?}", target))?,
	);

	let bytes = io::copy(&mut decoder, &mut output).context("Failed to decompress archive")?;
	output.flush().context("Failed to flush restored database")?;

	fs::remove_file(archive)
		.with_context(|| format!("Failed to remove archive {:?}", archive))?;

	info!("Restored {} bytes from {:?} into {:?}", bytes, archive, target);
	Ok(target)
}
