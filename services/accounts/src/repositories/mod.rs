//! Repositories for database operations

pub mod memory;
pub mod postgres;
pub mod user;

pub use memory::MemoryUserTable;
pub use postgres::PgUserTable;
pub use user::{Timeouts, UserRepository, UserTable};
