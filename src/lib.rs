//! Terminal admin console for the Elder platform.
//!
//! The `query` and `mutation` modules hold the data-sync layer: a keyed
//! cache of server state with request deduplication, and a dispatcher for
//! writes that invalidates what they touch. `ui` draws on top of both.

pub mod app;
pub mod commands;
pub mod config;
pub mod context;
pub mod elder;
pub mod event;
pub mod filter;
pub mod mutation;
pub mod notify;
pub mod pagination;
pub mod query;
pub mod ui;
