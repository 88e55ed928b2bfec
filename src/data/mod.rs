//! Sample data handed to the clustering pipeline.
//!
//! Loading sample points from files or databases happens outside this crate;
//! callers build a [`SampleStore`] from already computed points.

mod store;

pub use store::SampleStore;
