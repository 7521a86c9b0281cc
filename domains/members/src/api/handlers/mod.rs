//! HTTP handlers for the Members domain

pub mod members;
