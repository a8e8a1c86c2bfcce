//! Users and posts backend.
//!
//! Users register as `PENDING`, receive a certification mail and become
//! `ACTIVE` once they verify their address or log in. Only active users are
//! visible to lookups and may write posts.

pub mod app;
pub mod config;
pub mod error;
pub mod mail;
pub mod posts;
pub mod providers;
pub mod state;
pub mod users;
