pub mod archive;
pub mod connection;
pub mod schema;
pub mod store;
