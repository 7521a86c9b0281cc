//! Domain layer for the Members domain

pub mod entities;
pub mod gate;
