//! BookMyRoom core: CSV formats, database layer, and the export and import engines.

pub mod booking_csv;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
