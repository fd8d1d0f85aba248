//! Staff account model.

use crate::account::role::Role;
use crate::prelude::*;
use crate::{db::connection::DbConnection, schema::coach_user::dsl::*};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

diesel::define_sql_function!(fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text);

/// A coach or QA reviewer that can log in.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::coach_user)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CoachUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string; never serialized to clients.
    #[serde(skip_serializing)]
    pub hash: String,
    pub role: String,
    /// Identifier of the coach's task list (`coaches_data.case_owner_id`). Always `None` for QA.
    pub coach_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating, or replacing the details of, an account.
#[derive(Insertable, AsChangeset, PartialEq, Debug, Clone, Deserialize)]
#[diesel(table_name = crate::schema::coach_user)]
#[diesel(treat_none_as_null = true)]
pub struct CoachUserCreate {
    pub username: String,
    pub email: String,
    pub hash: String,
    pub role: String,
    pub coach_id: Option<String>,
}

impl CoachUserCreate {
    pub fn save(self, connection: &DbConnection) -> Result<CoachUser> {
        let conn = &mut connection.pool.get()?;
        Ok(diesel::insert_into(coach_user)
            .values(&self)
            .returning(CoachUser::as_returning())
            .get_result(conn)?)
    }

    /// Inserts the account, or overwrites email, hash, role and coach id of the
    /// account that already has this username.
    ///
    /// Returns the stored row and whether it was newly created.
    pub fn upsert(self, connection: &DbConnection) -> Result<(CoachUser, bool)> {
        let conn = &mut connection.pool.get()?;
        conn.transaction(|conn| {
            let existing = coach_user
                .filter(username.eq(&self.username))
                .select(CoachUser::as_select())
                .first(conn)
                .optional()?;

            match existing {
                Some(existing) => {
                    let updated = diesel::update(coach_user.filter(id.eq(existing.id)))
                        .set(&self)
                        .returning(CoachUser::as_returning())
                        .get_result(conn)?;
                    Ok((updated, false))
                }
                None => {
                    let created = diesel::insert_into(coach_user)
                        .values(&self)
                        .returning(CoachUser::as_returning())
                        .get_result(conn)?;
                    Ok((created, true))
                }
            }
        })
    }
}

impl CoachUser {
    /// The parsed `role` column.
    pub fn role(&self) -> Result<Role> {
        self.role.parse()
    }

    pub fn fetch_by_id(target: &Uuid, connection: &DbConnection) -> Result<Self> {
        let conn = &mut connection.pool.get()?;
        Ok(CoachUser::by_id(target)
            .select(CoachUser::as_select())
            .get_result(conn)?)
    }

    pub fn find_by_username(target: &str, connection: &DbConnection) -> Result<Option<Self>> {
        let conn = &mut connection.pool.get()?;
        Ok(CoachUser::by_username(target)
            .select(CoachUser::as_select())
            .first(conn)
            .optional()?)
    }

    /// Email lookup is case-insensitive: staff type their address however they like.
    pub fn find_by_email(target: &str, connection: &DbConnection) -> Result<Option<Self>> {
        let conn = &mut connection.pool.get()?;
        Ok(coach_user
            .filter(lower(email).eq(target.trim().to_lowercase()))
            .select(CoachUser::as_select())
            .first(conn)
            .optional()?)
    }

    pub fn fetch_all(connection: &DbConnection) -> Result<Vec<Self>> {
        let conn = &mut connection.pool.get()?;
        Ok(coach_user
            .order(username.asc())
            .select(CoachUser::as_select())
            .load(conn)?)
    }

    pub fn fetch_by_role(target: Role, connection: &DbConnection) -> Result<Vec<Self>> {
        let conn = &mut connection.pool.get()?;
        Ok(coach_user
            .filter(role.eq(target.as_str()))
            .order(username.asc())
            .select(CoachUser::as_select())
            .load(conn)?)
    }

    #[diesel::dsl::auto_type(no_type_alias)]
    pub fn by_id(target: &Uuid) -> _ {
        crate::schema::coach_user::dsl::coach_user.filter(id.eq(target))
    }

    #[diesel::dsl::auto_type(no_type_alias)]
    pub fn by_username<'a>(target: &'a str) -> _ {
        crate::schema::coach_user::dsl::coach_user.filter(username.eq(target))
    }
}
