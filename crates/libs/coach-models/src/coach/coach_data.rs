//! The JSON task list stored for each coach.

use crate::prelude::*;
use crate::{db::connection::DbConnection, schema::coaches_data::dsl::*};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of `coaches_data`, keyed by the coach's case owner id.
///
/// `tasks` is free-form JSON; it is normalised into task objects by the web layer.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::coaches_data)]
#[diesel(primary_key(case_owner_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CoachData {
    pub case_owner_id: i32,
    pub tasks: Option<Value>,
}

impl CoachData {
    pub fn find_by_id(target: i32, connection: &DbConnection) -> Result<Option<Self>> {
        let conn = &mut connection.pool.get()?;
        Ok(coaches_data
            .filter(case_owner_id.eq(target))
            .select(CoachData::as_select())
            .first(conn)
            .optional()?)
    }

    /// Replaces the whole task list.
    pub fn save_tasks(&mut self, new_tasks: Value, connection: &DbConnection) -> Result<()> {
        let conn = &mut connection.pool.get()?;
        diesel::update(coaches_data.filter(case_owner_id.eq(self.case_owner_id)))
            .set(tasks.eq(Some(new_tasks.clone())))
            .execute(conn)?;
        self.tasks = Some(new_tasks);
        Ok(())
    }

    /// Creates an empty task list for `target` unless one exists.
    ///
    /// Returns `true` when a row was inserted.
    pub fn ensure(target: i32, connection: &DbConnection) -> Result<bool> {
        let conn = &mut connection.pool.get()?;
        let inserted = diesel::insert_into(coaches_data)
            .values((case_owner_id.eq(target), tasks.eq(Some(Value::Array(vec![])))))
            .on_conflict(case_owner_id)
            .do_nothing()
            .execute(conn)?;
        Ok(inserted > 0)
    }
}
