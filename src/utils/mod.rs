pub mod importer;
pub mod logger;
