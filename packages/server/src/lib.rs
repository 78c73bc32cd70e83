// Scraper Workflow API - Core
//
// This crate provides the HTTP control surface for the product scraping
// workflow: endpoints that start long-running workflow tasks in the background
// and a job table that clients poll for status and results.

pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
