pub mod common;
pub mod password_session;
pub mod ssh_session;

pub use password_session::{PasswordSession, PasswordSessionOpener};
pub use ssh_session::{RemoteEntry, RemoteSession, SessionOpener};
