pub mod db;
pub mod identity;
pub mod invalidation;
pub mod mailer;
pub mod memory;
pub mod storage;

pub use db::DbAdapter;
pub use identity::PgIdentityAdapter;
pub use invalidation::BroadcastInvalidator;
pub use mailer::{CodeMailer, LogMailer, SmtpMailer};
pub use memory::{FailPoint, InMemoryStore};
pub use storage::FsObjectStorage;
