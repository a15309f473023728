// src/model/mod.rs
//! Data model shared by the simulation components

pub mod types;

pub use types::*;
