// src/cli/menu.rs

use console::style;

/// Main menu entries. `Secret` is not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
	FindSafeVersion,
	CheckVersion,
	Exit,
	Secret,
}

impl MenuChoice {
	pub fn parse(input: &str) -> Option<Self> {
		let input = input.trim();
		if input.eq_ignore_ascii_case("kaspersky") {
			return Some(MenuChoice::Secret);
		}

		match input {
			"1" => Some(MenuChoice::FindSafeVersion),
			"2" => Some(MenuChoice::CheckVersion),
			"3" => Some(MenuChoice::Exit),
			_ => None,
		}
	}
}

pub fn menu_text() -> String {
	format!(
		"\n{}\n1. Find the first safe version of a product\n2. Check a product version for vulnerabilities\n3. Exit",
		style("Main menu:").cyan().bold()
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_menu_choice() {
		assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::FindSafeVersion));
		assert_eq!(MenuChoice::parse(" 2 "), Some(MenuChoice::CheckVersion));
		assert_eq!(MenuChoice::parse("3"), Some(MenuChoice::Exit));
		assert_eq!(MenuChoice::parse("KASPERSKY"), Some(MenuChoice::Secret));
		assert_eq!(MenuChoice::parse("4"), None);
		assert_eq!(MenuChoice::parse(""), None);
	}
}
