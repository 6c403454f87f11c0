//! mathdrill-core: exercise model, validation and exam scoring.
//!
//! This crate defines the exercise and exam data model, the schema validator
//! for loosely-typed exercise JSON, the angle-diagram normalizer, exercise
//! instantiation, and the exam scoring engine. Everything here is pure and
//! synchronous except the [`traits::ResultStore`] capability.

pub mod error;
pub mod exam;
pub mod expr;
pub mod generate;
pub mod model;
pub mod normalize;
pub mod report;
pub mod schema;
pub mod scoring;
pub mod traits;
