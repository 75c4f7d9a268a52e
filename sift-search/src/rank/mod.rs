//! Result ranking: URL normalisation, scoring, deduplication.
//!
//! [`scoring::rerank`] turns one raw upstream page into a sorted,
//! URL-unique set; [`dedup::merge_ranked`] combines several such sets.

pub mod dedup;
pub mod scoring;
pub mod url_normalize;
