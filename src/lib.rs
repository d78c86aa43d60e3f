// src/lib.rs

//! comicwatch: webcomic update watcher library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
pub mod web;
