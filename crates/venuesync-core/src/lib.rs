pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod processor;
pub mod render;
pub mod source;
pub mod store;
