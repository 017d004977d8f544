use diesel::{Connection, PgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations};

pub mod access;
pub mod code;
pub mod config;
pub mod error;
pub mod models;
pub mod notification;
pub mod schema;
pub mod sql_enum;
pub mod state_machine;

pub use access::{Actor, Role, RoleSet};
pub use error::{ErrorKind, ServiceError};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub fn establish_connection(database_url: &str) -> Result<PgConnection, ServiceError> {
    PgConnection::establish(database_url).map_err(|err| {
        tracing::error!(error = %err, "failed to connect to database");
        ServiceError::internal("database unavailable")
    })
}
