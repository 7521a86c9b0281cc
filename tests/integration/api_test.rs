//! API endpoint integration tests
//!
//! Drives the composed router end to end: community gate and members,
//! listings with image upload, conversations and live streams.

#![allow(dead_code)]

mod common;
mod conversations;
mod listings;
mod members;
mod streams;
