pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use commands::{
    LoginCommand, LoginError, RegisterUserCommand, RegisterUserError,
};
pub use queries::{GetProfileError, GetProfileQuery};
pub use routes::users_routes;
pub use types::{AuthResponse, UserResponse};
