pub mod catalog;
pub mod db;
pub mod expiry;
pub mod models;
pub mod openrouter;
pub mod receipt;
pub mod suggestions;
