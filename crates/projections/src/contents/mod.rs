//! Content read side: a draft set with every version, a published set with
//! the live versions, and the repository that routes queries between them.

mod collection;
mod draft;
mod entity;
mod published;
mod query;
mod repository;

pub use collection::ContentCollection;
pub use draft::DraftContents;
pub use entity::ContentEntity;
pub use published::PublishedContents;
pub use query::{
    CompareOp, ContentQuery, FilterNode, MAX_TAKE, ResultList, SortNode, SortOrder,
};
pub use repository::ContentRepository;
