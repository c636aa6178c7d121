//! HTTP admin API for the writing-test repository.
//!
//! Exposes list, replace, append and remove over one route per document,
//! plus request routing and the hyper server loop.

pub mod config;
pub mod handlers;
pub mod router;
pub mod server;
