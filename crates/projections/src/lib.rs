//! Read side of the CMS.
//!
//! This crate provides:
//! - [`Projection`] trait for processing events into read models
//! - [`ReadModel`] trait for query access to denormalized data
//! - [`ProjectionProcessor`] for feeding events from the store to projections
//! - [`AppsView`] and [`SchemasView`], which also serve the lookups used by
//!   command handlers
//! - [`ContentRepository`], the draft and published content sets with their
//!   query surface

pub mod contents;
pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use contents::{
    CompareOp, ContentCollection, ContentEntity, ContentQuery, ContentRepository, DraftContents,
    FilterNode, MAX_TAKE, PublishedContents, ResultList, SortNode, SortOrder,
};
pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{AppsView, SchemasView};
