pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod play;
pub mod routes;
pub mod store;
