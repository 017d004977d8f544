use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::access::Role;
use crate::schema::{notifications, users};

/// Identity record consulted when assigning work to a staff member.
#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = users)]
pub struct UserAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub id: Uuid,
    pub recipient_roles: Vec<String>,
    pub recipient_users: Vec<Uuid>,
    pub kind: String,
    pub priority: String,
    pub title: String,
    pub message: String,
    pub data: Value,
    pub sender_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Accounts holding `role`, newest first.
pub fn list_users(
    conn: &mut PgConnection,
    role: Role,
    active_only: bool,
) -> QueryResult<Vec<UserAccount>> {
    let mut query = users::table
        .filter(users::role.eq(role))
        .order(users::created_at.desc())
        .select(UserAccount::as_select())
        .into_boxed();
    if active_only {
        query = query.filter(users::is_active.eq(true));
    }
    query.load(conn)
}

pub fn find_user(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Option<UserAccount>> {
    users::table
        .find(user_id)
        .select(UserAccount::as_select())
        .first(conn)
        .optional()
}
