pub mod create;

pub use create::{CreateCommentCommand, CreateCommentError};
