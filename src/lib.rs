//! Filtering and aggregation engine for field-sales productivity and
//! performance sheets.
//!
//! The engine is pure: [`reports::generate_dashboard`] takes a loaded
//! [`types::Snapshot`] and a [`types::FilterSelection`] and derives every
//! view the dashboard renders. Loading CSV exports and writing reports live
//! in [`loader`] and [`output`].
pub mod filter;
pub mod loader;
pub mod options;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use reports::generate_dashboard;
pub use types::{Dashboard, FilterSelection, Snapshot};
