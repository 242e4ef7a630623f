pub mod matcher;
pub mod version;
