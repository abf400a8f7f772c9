//! Business logic services for the Smart Task backend

mod user;

pub use user::{MemoryUserStore, PgUserStore, UserService, UserServiceError, UserStore};
