pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use commands::{CreateCommentCommand, CreateCommentError};
pub use queries::{ListCommentsError, ListCommentsQuery};
pub use routes::comments_routes;
pub use types::Comment;
