//! Core types and engine logic for Rota, the reviewer rotation service.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! defines the domain model, the [`store::ReviewStore`] persistence contract,
//! and the three components that make reviewer decisions on top of it:
//! [`directory`], [`assign`], and [`deactivate`].

pub mod assign;
pub mod deactivate;
pub mod directory;
pub mod error;
pub mod pull_request;
pub mod store;
pub mod team;
pub mod user;

pub use error::{Error, Result};
