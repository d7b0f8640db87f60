//! File exports of comparison results.

pub mod export;
