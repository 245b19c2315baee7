pub mod api_types;
pub mod client;
pub mod error;
pub mod export;
pub mod forms;
pub mod keys;
pub mod types;

pub use client::ElderClient;
pub use error::ApiError;
pub use types::{Listable, Resource};
