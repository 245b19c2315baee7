//! Client-side server-state synchronization.
//!
//! - [`QueryKey`] identifies a fetch structurally
//! - [`QueryStore`] holds one [`CacheEntry`] per key, allows one in-flight
//!   fetch per key and discards results from superseded fetches
//! - [`QueryObserver`] is what a page holds: key + fetcher + [`Gate`]

mod entry;
mod gate;
mod key;
mod observer;
mod store;

pub use entry::{CacheEntry, Payload, QuerySnapshot, QueryStatus};
pub use gate::Gate;
pub use key::{InvalidationTarget, QueryKey};
pub use observer::QueryObserver;
pub use store::{PayloadFuture, QueryStore};
