//! API route handlers

pub mod health;
pub mod software;
pub mod versions;
pub mod websites;
