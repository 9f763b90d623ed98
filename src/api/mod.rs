//! Consumed surface of the backend REST API: resource kinds and their
//! endpoints, the listed-record shape, and the "list mine" seam the access
//! checks are built on.

pub mod client;
mod listing;
mod record;
mod resource;

pub use client::ApiClient;
pub use listing::{RecordMutations, ResourceListing, StaticListing};
pub use record::ListedRecord;
pub use resource::ResourceKind;
