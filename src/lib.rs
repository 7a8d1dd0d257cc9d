pub mod catalog;
pub mod config;
pub mod constants;
#[cfg(feature = "db")]
pub mod db;
pub mod domain;
pub mod error;
pub mod labels;
pub mod logging;
pub mod seed;
pub mod server;
pub mod slug;
pub mod storage;
pub mod upload;
pub mod validation;
pub mod web;
