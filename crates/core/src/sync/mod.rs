//! Commit selection and change aggregation.
//!
//! [`selector::select`] turns a [`crate::models::SyncPolicy`] into candidate
//! commits; [`aggregator::Aggregator`] runs each candidate through the author
//! and merge gates and folds its changed paths into a
//! [`crate::models::SyncSet`].

pub mod aggregator;
pub mod selector;

pub use aggregator::Aggregator;
pub use selector::select;
