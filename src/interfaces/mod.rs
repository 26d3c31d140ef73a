//! Edges of the application: files the user hands in and what the user sees.

pub mod console;
pub mod csv;
