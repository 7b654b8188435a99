pub mod calendar;
pub mod config;
pub mod constants;
pub mod error;
pub mod feed;
pub mod models;
pub mod services;
pub mod session;
pub mod store;

// Re-export the types most consumers need at crate root
pub use calendar::Calendar;
pub use config::{FeedConfig, MarkReadPolicy};
pub use error::{FeedError, FeedResult};
pub use models::{Activity, FilterState, Notification};
pub use session::{FeedPageState, FeedSession, FeedView};
pub use store::{EventStore, HttpEventStore, InMemoryEventStore};

#[cfg(test)]
pub(crate) mod testing;
