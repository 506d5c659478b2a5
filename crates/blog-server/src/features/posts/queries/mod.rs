pub mod get;
pub mod list;
pub mod list_by_author;

pub use get::{GetPostError, GetPostQuery};
pub use list::{ListPostsError, ListPostsQuery};
pub use list_by_author::ListPostsByAuthorQuery;
