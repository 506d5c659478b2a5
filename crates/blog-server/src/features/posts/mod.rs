pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use commands::{CreatePostCommand, CreatePostError};
pub use queries::{
    GetPostError, GetPostQuery, ListPostsByAuthorQuery, ListPostsError, ListPostsQuery,
};
pub use routes::posts_routes;
pub use types::Post;
