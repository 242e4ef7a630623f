// src/cli/render.rs

//! Console formatting. Everything here takes finished results and returns text.

use crate::engine::matcher::SafeVersionReport;
use crate::models::product::ProductSummary;
use crate::models::vulnerability::VulnerabilityRecord;
use console::{measure_text_width, style, truncate_str};
use std::fmt::Display;

const DESCRIPTION_WIDTH: usize = 72;

pub fn banner() -> String {
	panel(
		"Welcome!",
		&format!("{} {}", style("Vulnerability Checker").cyan().bold(), style(concat!("v", env!("CARGO_PKG_VERSION"))).green()),
	)
}

pub fn link_notice() -> String {
	format!(
		"{} your terminal may not support clickable links. Advisory links are printed as text.",
		style("Note:").yellow().bold()
	)
}

pub fn error_line(err: &dyn Display) -> String {
	style(err.to_string()).red().bold().to_string()
}

pub fn safe_version_panel(product: &str, report: &SafeVersionReport) -> String {
	match (&report.safe, &report.latest) {
		(Some(safe), latest) => panel(
			"Safe version found",
			&format!(
				"First safe version of {}: {}\nLatest known version: {}",
				style(product).bold(),
				style(safe).green().bold(),
				style(latest.as_deref().unwrap_or(safe)).green(),
			),
		),
		(None, Some(latest)) => format!(
			"{}\nLatest known version: {}",
			style(format!("No safe version of '{}' was found.", product)).red().bold(),
			style(latest).yellow(),
		),
		(None, None) => style(format!("No versions of '{}' are known.", product))
			.red()
			.bold()
			.to_string(),
	}
}

pub fn no_vulnerabilities(product: &str, version: &str) -> String {
	panel(
		"Analysis complete",
		&format!(
			"{} No vulnerabilities found for '{}' version '{}'.",
			style("OK").green().bold(),
			product,
			version
		),
	)
}

/// Table of matching vulnerabilities.
///
/// With `links`, ids are emitted as OSC 8 hyperlinks to the advisory;
/// otherwise the URL follows the id in plain text.
pub fn vulnerability_table(records: &[VulnerabilityRecord], links: bool) -> String {
	let header = ["ID", "Description", "Published", "Vulnerable from", "Fixed in"];

	let rows: Vec<[Cell; 5]> = records
		.iter()
		.map(|record| {
			let id = if links {
				Cell::new(record.vuln_id.clone(), |text| {
					style(hyperlink(&record.advisory_url(), text)).cyan().to_string()
				})
			} else {
				Cell::new(format!("{} ({})", record.vuln_id, record.advisory_url()), |text| {
					style(text).cyan().to_string()
				})
			};

			[
				id,
				Cell::new(truncate_str(&record.description, DESCRIPTION_WIDTH, "...").into_owned(), |text| {
					style(text).magenta().to_string()
				}),
				Cell::new(record.publish_date.format("%Y-%m-%d").to_string(), |text| {
					style(text).yellow().to_string()
				}),
				Cell::new(record.start_version.clone(), |text| style(text).red().bold().to_string()),
				Cell::new(record.fixed_version.clone(), |text| style(text).green().bold().to_string()),
			]
		})
		.collect();

	let mut widths = header.map(measure_text_width);
	for row in &rows {
		for (width, cell) in widths.iter_mut().zip(row.iter()) {
			*width = (*width).max(cell.width());
		}
	}

	let separator = format!(
		"+{}+",
		widths.iter().map(|w| "-".repeat(w + 2)).collect::<Vec<_>>().join("+")
	);

	let mut out = Vec::with_capacity(rows.len() * 2 + 4);
	out.push(style(format!("Found {} vulnerabilities", records.len())).red().bold().to_string());
	out.push(separator.clone());
	out.push(format!(
		"| {} |",
		header
			.iter()
			.zip(widths.iter())
			.map(|(title, width)| pad(&style(title).bold().to_string(), measure_text_width(title), *width))
			.collect::<Vec<_>>()
			.join(" | ")
	));
	out.push(separator.clone());
	for row in &rows {
		out.push(format!(
			"| {} |",
			row.iter()
				.zip(widths.iter())
				.map(|(cell, width)| pad(&cell.styled, cell.width(), *width))
				.collect::<Vec<_>>()
				.join(" | ")
		));
	}
	out.push(separator);
	out.join("\n")
}

pub fn product_list(products: &[ProductSummary]) -> String {
	if products.is_empty() {
		return style("The catalog is empty.").yellow().to_string();
	}

	let name_width = products
		.iter()
		.map(|p| measure_text_width(&p.product))
		.max()
		.unwrap_or(0);

	products
		.iter()
		.map(|p| {
			format!(
				"{}  {} ({} versions)",
				pad(&style(&p.product).cyan().to_string(), measure_text_width(&p.product), name_width),
				p.vendor,
				p.version_count
			)
		})
		.collect::<Vec<_>>()
		.join("\n")
}

pub fn easter_egg() -> String {
	panel(
		"Secret found!",
		&style("You found the hidden easter egg.\n\nThanks for taking a close look at this tool :)")
			.magenta()
			.bold()
			.to_string(),
	)
}

pub fn farewell() -> String {
	style("You have left the matrix...").magenta().bold().to_string()
}

struct Cell {
	plain: String,
	styled: String,
}

impl Cell {
	fn new(plain: String, paint: impl Fn(&str) -> String) -> Self {
		let styled = paint(&plain);
		Self { plain, styled }
	}

	fn width(&self) -> usize {
		measure_text_width(&self.plain)
	}
}

/// Right-pads already styled text, measuring its visible width separately.
fn pad(styled: &str, visible: usize, width: usize) -> String {
	format!("{}{}", styled, " ".repeat(width.saturating_sub(visible)))
}

fn hyperlink(url: &str, text: &str) -> String {
	format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text)
}

fn panel(title: &str, body: &str) -> String {
	let lines: Vec<&str> = body.lines().collect();
	let inner = lines
		.iter()
		.map(|line| measure_text_width(line))
		.chain(std::iter::once(measure_text_width(title) + 2))
		.max()
		.unwrap_or(0);

	let title_bar = format!(" {} ", style(title).bold());
	let top = format!(
		"+{}{}+",
		title_bar,
		"-".repeat((inner + 2).saturating_sub(measure_text_width(title) + 2))
	);

	let mut out = vec![top];
	for line in lines {
		out.push(format!("| {} |", pad(line, measure_text_width(line), inner)));
	}
	out.push(format!("+{}+", "-".repeat(inner + 2)));
	out.join("\n")
}
