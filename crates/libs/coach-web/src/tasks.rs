//! Per-coach task lists.
//!
//! A coach's tasks are one JSON array in `coaches_data.tasks`. Entries written
//! by older tools may be bare strings or carry extra keys, so the list is
//! normalised on every read and unknown keys are kept on write.

use chrono::{SecondsFormat, Utc};
use coach_models::{coach::coach_data::CoachData, db::connection::DbConnection};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;
use uuid::Uuid;

use crate::ctx::Ctx;
use crate::prelude::*;

pub const MAX_TEXT_CHARS: usize = 5000;

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn new_task_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Maps an explicit `null` to `Some(Value::Null)` so it can be told apart from absence.
fn present<'de, D>(deserializer: D) -> core::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn clean_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::BadRequest(String::from("text may not be blank")));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(Error::BadRequest(format!(
            "text may not be longer than {MAX_TEXT_CHARS} characters"
        )));
    }
    Ok(text.to_string())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPost {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub evidence: Option<Value>,
}

/// Only the fields present are changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub evidence: Option<Value>,
}

/// A normalised task list.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskList(Vec<Value>);

fn id_text(task: &Value) -> String {
    match task.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl TaskList {
    /// Anything but an array reads as an empty list. Non-object entries become
    /// open tasks with a fresh id and empty timestamps.
    pub fn from_raw(raw: Option<&Value>) -> Self {
        let Some(Value::Array(entries)) = raw else {
            return Self(Vec::new());
        };
        Self(
            entries
                .iter()
                .map(|entry| match entry {
                    Value::Object(_) => entry.clone(),
                    Value::String(text) => Self::legacy_task(text),
                    other => Self::legacy_task(&other.to_string()),
                })
                .collect(),
        )
    }

    fn legacy_task(text: &str) -> Value {
        json!({
            "id": new_task_id(),
            "text": text,
            "done": false,
            "created_at": "",
            "updated_at": "",
        })
    }

    /// Newest first by `created_at`. Tasks without one sort last, in stored order.
    pub fn newest_first(&self) -> Vec<Value> {
        let mut sorted = self.0.clone();
        sorted.sort_by(|a, b| {
            let created = |task: &Value| {
                task.get("created_at")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            created(b).cmp(&created(a))
        });
        sorted
    }

    /// Puts a new open task at the front and returns it.
    pub fn add(&mut self, payload: TaskPost) -> Result<Value> {
        let text = clean_text(payload.text.as_deref().unwrap_or_default())?;
        let now = now_iso();
        let mut task = Map::new();
        task.insert(String::from("id"), Value::String(new_task_id()));
        task.insert(String::from("text"), Value::String(text));
        task.insert(String::from("done"), Value::Bool(false));
        task.insert(String::from("created_at"), Value::String(now.clone()));
        task.insert(String::from("updated_at"), Value::String(now));
        if let Some(evidence) = payload.evidence {
            task.insert(String::from("evidence"), evidence);
        }
        let task = Value::Object(task);
        self.0.insert(0, task.clone());
        Ok(task)
    }

    fn position(&self, task_id: &str) -> Result<usize> {
        self.0
            .iter()
            .position(|task| id_text(task) == task_id)
            .ok_or(Error::TaskNotFound)
    }

    /// Applies `patch` to the task and stamps `updated_at`.
    pub fn update(&mut self, task_id: &str, patch: TaskPatch) -> Result<Value> {
        let index = self.position(task_id)?;
        let text = patch.text.as_deref().map(clean_text).transpose()?;

        let Value::Object(task) = &mut self.0[index] else {
            return Err(Error::TaskNotFound);
        };
        if let Some(text) = text {
            task.insert(String::from("text"), Value::String(text));
        }
        if let Some(done) = patch.done {
            task.insert(String::from("done"), Value::Bool(done));
        }
        if let Some(evidence) = patch.evidence {
            task.insert(String::from("evidence"), evidence);
        }
        task.insert(String::from("updated_at"), Value::String(now_iso()));
        Ok(self.0[index].clone())
    }

    /// Drops every task with this id.
    pub fn remove(&mut self, task_id: &str) -> Result<()> {
        let before = self.0.len();
        self.0.retain(|task| id_text(task) != task_id);
        if self.0.len() == before {
            return Err(Error::TaskNotFound);
        }
        Ok(())
    }

    pub fn into_value(self) -> Value {
        Value::Array(self.0)
    }
}

/// Rejects callers that may not touch `coach_id`'s list.
pub fn guard_coach_scope(ctx: &Ctx, coach_id: &str) -> Result<()> {
    if ctx.can_access_coach(coach_id) {
        Ok(())
    } else {
        Err(Error::ApiForbidden)
    }
}

fn load(ctx: &Ctx, coach_id: &str, connection: &DbConnection) -> Result<CoachData> {
    guard_coach_scope(ctx, coach_id)?;
    let key: i32 = coach_id.trim().parse().map_err(|_| Error::CoachNotFound)?;
    CoachData::find_by_id(key, connection)?.ok_or(Error::CoachNotFound)
}

pub fn list_tasks(ctx: &Ctx, coach_id: &str, connection: &DbConnection) -> Result<Vec<Value>> {
    let coach = load(ctx, coach_id, connection)?;
    Ok(TaskList::from_raw(coach.tasks.as_ref()).newest_first())
}

pub fn create_task(
    ctx: &Ctx,
    coach_id: &str,
    payload: TaskPost,
    connection: &DbConnection,
) -> Result<Value> {
    let mut coach = load(ctx, coach_id, connection)?;
    let mut tasks = TaskList::from_raw(coach.tasks.as_ref());
    let task = tasks.add(payload)?;
    coach.save_tasks(tasks.into_value(), connection)?;
    info!("{} added a task for coach {coach_id}", ctx.user.username);
    Ok(task)
}

pub fn update_task(
    ctx: &Ctx,
    coach_id: &str,
    task_id: &str,
    patch: TaskPatch,
    connection: &DbConnection,
) -> Result<Value> {
    let mut coach = load(ctx, coach_id, connection)?;
    let mut tasks = TaskList::from_raw(coach.tasks.as_ref());
    let task = tasks.update(task_id, patch)?;
    coach.save_tasks(tasks.into_value(), connection)?;
    Ok(task)
}

pub fn delete_task(
    ctx: &Ctx,
    coach_id: &str,
    task_id: &str,
    connection: &DbConnection,
) -> Result<()> {
    let mut coach = load(ctx, coach_id, connection)?;
    let mut tasks = TaskList::from_raw(coach.tasks.as_ref());
    tasks.remove(task_id)?;
    coach.save_tasks(tasks.into_value(), connection)?;
    info!("{} deleted task {task_id} of coach {coach_id}", ctx.user.username);
    Ok(())
}
