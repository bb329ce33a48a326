pub mod auth;
pub mod config;
pub mod daemon;
pub mod domain;
pub mod error;
pub mod generate;
mod http;
pub mod mail;
pub mod pipeline;
pub mod schedule;
