//! Course schedule engine: feed ingestion, deduplication, reconciliation
//! against the persisted snapshot, selection and manual courses.
mod catalog;
mod client;
mod cycle;
mod dedup;
mod error;
mod normalize;
mod reconcile;
mod selection;
mod service;
mod transfer;
mod types;
mod view;

pub use catalog::*;
pub use client::*;
pub use cycle::*;
pub use dedup::*;
pub use error::*;
pub use normalize::*;
pub use reconcile::*;
pub use selection::*;
pub use service::*;
pub use transfer::*;
pub use types::*;
pub use view::*;
