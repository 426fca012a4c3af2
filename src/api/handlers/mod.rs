pub mod auth;
pub(crate) mod books;
pub(crate) mod health;
pub(crate) mod users;
