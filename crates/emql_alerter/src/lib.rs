//! Alert delivery. Keeps a registry of `transport:endpoint` destinations
//! persisted through a caller-supplied key/value store and fans alerts out
//! over HTTP and SMTP transports.
pub mod alerter;
pub mod api;
pub mod errors;
pub mod sender;
pub mod store;

pub use alerter::{Alerter, Config, EmailConfig};
pub use api::AlerterApi;
pub use sender::Sender;
pub use store::{KeyValueStore, MemoryStore};
