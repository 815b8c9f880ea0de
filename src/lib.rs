//! Content calendar service library.
//!
//! A service that schedules, generates, and reviews social-media/blog
//! content for a real-estate marketing workflow, scrapes research sources
//! for topic context, and syncs approved items to Google Calendar.

pub mod ai;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod db;
pub mod generation;
pub mod research;
pub mod vectors;
pub mod web;
