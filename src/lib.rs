// src/lib.rs

pub mod api;
pub mod app_state;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod remote;
pub mod service;
pub mod slots;
