//! Service layer of the Canopy wiki.
//!
//! [`Wiki`] ties the repositories in `canopy-db` to the collaborators defined
//! in `canopy-core` (renderer, search indexer, backup mirror) and owns the
//! multi-step operations: page create/update with the rename cascade,
//! revision revert, and share-link validation with access recording.
//! Every multi-row mutation runs in one transaction; side channels run
//! after commit and only log on failure.

pub mod access_recorder;
mod cascade;
pub mod error;
pub mod hierarchy;
pub mod import;
pub mod links;
mod mirror;
pub mod pages;
pub mod revisions;
pub mod search;
pub mod shares;
pub mod stats;
mod wiki;

pub use access_recorder::{AccessEvent, AccessRecorder, AccessRecorderHandle, AccessSink};
pub use error::{WikiError, WikiResult};
pub use wiki::{Actor, Wiki};
