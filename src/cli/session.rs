// src/cli/session.rs

use crate::cli::commands;
use crate::cli::menu::{menu_text, MenuChoice};
use crate::cli::render;
use crate::services::query::VulnerabilityService;
use anyhow::{Context, Result};
use console::{style, Term};
use log::info;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

/// Interactive menu loop. Query errors are printed and the loop continues;
/// it ends on "exit" or end of input.
pub async fn run(service: &VulnerabilityService, links: bool) -> Result<()> {
	let term = Term::stdout();
	let mut input = BufReader::new(tokio::io::stdin()).lines();

	loop {
		println!("{}", menu_text());
		let Some(choice) = prompt(&mut input, "Choose an action").await? else {
			break;
		};

		let Some(choice) = MenuChoice::parse(&choice) else {
			clear(&term);
			println!("{}", render::error_line(&"Invalid choice. Please try again."));
			continue;
		};

		match choice {
			MenuChoice::Secret => {
				clear(&term);
				println!("{}", render::easter_egg());
			}
			MenuChoice::FindSafeVersion => {
				let Some(product) = prompt(&mut input, "Enter the product name").await? else {
					break;
				};
				clear(&term);
				match commands::safe_version(service, &product).await {
					Ok(out) => println!("{}", out),
					Err(e) => println!("{}", render::error_line(&e)),
				}
			}
			MenuChoice::CheckVersion => {
				let Some(product) = prompt(&mut input, "Enter the product name").await? else {
					break;
				};
				let Some(version) = prompt(&mut input, "Enter the version").await? else {
					break;
				};
				clear(&term);
				match commands::check_version(service, &product, &version, links).await {
					Ok(out) => println!("{}", out),
					Err(e) => println!("{}", render::error_line(&e)),
				}
			}
			MenuChoice::Exit => {
				clear(&term);
				println!("{}", render::farewell());
				break;
			}
		}
	}

	info!("Interactive session finished");
	Ok(())
}

/// Prints `label` and reads one trimmed line. `None` at end of input.
async fn prompt(input: &mut Input, label: &str) -> Result<Option<String>> {
	print!("{}: ", style(label).yellow().bold());
	std::io::stdout().flush().context("Failed to flush stdout")?;

	let line = input.next_line().await.context("Failed to read from stdin")?;
	Ok(line.map(|l| l.trim().to_string()))
}

fn clear(term: &Term) {
	if term.is_term() {
		// Cosmetic only
		let _ = term.clear_screen();
	}
}
