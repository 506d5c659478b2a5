pub mod list_by_post;

pub use list_by_post::{ListCommentsError, ListCommentsQuery, ListCommentsResponse};
