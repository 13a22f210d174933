// Job catalog: postings and companies written by the ingestion pipeline.

pub mod models;

pub use models::{Company, HiringSurge, Job};
