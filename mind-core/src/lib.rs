pub mod config;
pub mod db;
pub mod schema;
pub mod tool;
pub mod tsv_reader;
