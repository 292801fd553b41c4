//! API Routes

pub mod alerts;
pub mod cities;
pub mod models;
pub mod simulation;
