//! Repositories module - storage for users and messages
//!
//! The services depend on the `MessageStore` and `UserStore` ports only. Two backends
//! implement them:
//! - `MessageRepository` / `UserRepository`: MySQL through sqlx
//! - `InMemoryMessageRepository` / `InMemoryUserRepository`: DashMap, for tests and
//!   the `memory` storage backend

// ************************* NOTE ON SQLX ************************* //

/*
   Queries are written with the runtime API (`sqlx::query` / `sqlx::query_as::<_, T>`)
   and `.bind(...)` for every placeholder, so the crate builds without a live database.
   Entities derive `sqlx::FromRow`: the selected column names must match the field names.

   Pick the fetch method by the number of rows you expect:
   None              .execute(...).await          INSERT/UPDATE/DELETE, gives rows_affected / last_insert_id
   Zero or One       .fetch_optional(...).await   Option<T>, extra rows are ignored
   Exactly One       .fetch_one(...).await        errors with RowNotFound if nothing comes back
   Multiple          .fetch_all(...).await        Vec<T>

   The schema lives in `migrations/` and is applied at startup by `sqlx::migrate!`.
*/

// ************************* REPOSITORY MODULES ************************* //

pub mod memory;
pub mod message;
pub mod traits;
pub mod user;

pub use traits::{MessageStore, UserStore};

pub use memory::{InMemoryMessageRepository, InMemoryUserRepository};
pub use message::MessageRepository;
pub use user::UserRepository;
