//! Domain layer for the Listings domain

pub mod entities;
pub mod state;
