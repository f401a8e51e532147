//! User accounts: a user row, its wallet and the opening ledger entry, created together.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{UserError, UserResult};
pub use manager::UserManager;
pub use models::{CreateUserRequest, User, UserAccount};
