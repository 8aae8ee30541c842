pub mod auth;
pub mod mask;
pub mod password;

pub use auth::*;
pub use mask::*;
pub use password::*;
