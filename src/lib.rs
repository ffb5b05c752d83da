pub mod alto;
pub mod config;
pub mod epc;
pub mod import;
pub mod store;
pub mod tour;
