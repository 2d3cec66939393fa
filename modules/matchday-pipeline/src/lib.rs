//! Acquisition pipeline: fetch the team page, extract match records and
//! synchronize them into the store on a cron cadence.

pub mod fetcher;
pub mod parser;
pub mod schedule;
pub mod sync;
pub mod update;

pub use fetcher::{FetchConfig, Fetcher, HttpTransport, Transport};
pub use sync::{SyncReport, Synchronizer};
pub use update::Updater;
