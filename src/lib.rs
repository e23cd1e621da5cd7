pub mod api;
pub mod config;
pub mod dicomweb;
pub mod dispatch;
pub mod handlers;
pub mod observability;
pub mod payload;
pub mod targets;
