pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;
pub mod routes;
pub mod schema;
pub mod state;
