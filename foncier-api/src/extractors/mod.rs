//! Request extractors

mod json;
mod path_id;
mod query;

pub use json::ApiJson;
pub use path_id::{PathId, PathIdError, PathIds};
pub use query::ApiQuery;
