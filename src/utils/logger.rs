use env_logger::{Builder, Env};

/// `RUST_LOG` wins over `default_level`.
pub fn init(default_level: &str) {
	Builder::from_env(Env::default().default_filter_or(default_level))
		.format_timestamp_millis()
		.format_module_path(true)
		.init();
}
