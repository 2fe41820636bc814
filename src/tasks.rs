use std::sync::RwLock;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Priority, Task, TaskInput};
use crate::store::{keys, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    All,
    Active,
    Completed,
}

/// Field-optional update for an existing task; `None` leaves the field
/// untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub estimated_minutes: Option<u32>,
}

/// Task planner store, cached in memory and written through as a whole on
/// every mutation.
pub struct TaskStore {
    store: Store,
    tasks: RwLock<Vec<Task>>,
}

impl TaskStore {
    pub async fn load(store: Store) -> Result<Self> {
        let tasks = store.get_or(keys::TASKS, Vec::new()).await?;
        Ok(Self {
            store,
            tasks: RwLock::new(tasks),
        })
    }

    async fn persist(&self, tasks: &[Task]) -> Result<()> {
        self.store.set(keys::TASKS, &tasks).await
    }

    pub async fn create(&self, input: TaskInput) -> Result<Task> {
        let task = Task::from_input(input, Utc::now());
        let updated = {
            let mut tasks = self.tasks.read().unwrap().clone();
            tasks.push(task.clone());
            tasks
        };
        self.persist(&updated).await?;
        *self.tasks.write().unwrap() = updated;
        Ok(task)
    }

    pub async fn update(&self, task_id: &str, patch: TaskPatch) -> Result<Task> {
        let mut tasks = self.tasks.read().unwrap().clone();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| anyhow!("no task with id '{task_id}'"))?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(subject) = patch.subject {
            task.subject = Some(subject);
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(estimated) = patch.estimated_minutes {
            task.estimated_minutes = Some(estimated);
        }
        task.updated_at = Utc::now();
        let updated_task = task.clone();

        self.persist(&tasks).await?;
        *self.tasks.write().unwrap() = tasks;
        Ok(updated_task)
    }

    pub async fn toggle_completed(&self, task_id: &str) -> Result<Task> {
        let mut tasks = self.tasks.read().unwrap().clone();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| anyhow!("no task with id '{task_id}'"))?;
        task.completed = !task.completed;
        task.updated_at = Utc::now();
        let updated_task = task.clone();

        self.persist(&tasks).await?;
        *self.tasks.write().unwrap() = tasks;
        Ok(updated_task)
    }

    pub async fn delete(&self, task_id: &str) -> Result<()> {
        let mut tasks = self.tasks.read().unwrap().clone();
        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);
        if tasks.len() == before {
            return Err(anyhow!("no task with id '{task_id}'"));
        }

        self.persist(&tasks).await?;
        *self.tasks.write().unwrap() = tasks;
        Ok(())
    }

    /// Filtered view, high priority first, then earliest due date (tasks
    /// without one sort last), then creation time.
    pub fn list(&self, filter: TaskFilter) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .unwrap()
            .iter()
            .filter(|t| match filter {
                TaskFilter::All => true,
                TaskFilter::Active => !t.completed,
                TaskFilter::Completed => t.completed,
            })
            .cloned()
            .collect();

        tasks.sort_by(|a, b| {
            a.priority
                .order()
                .cmp(&b.priority.order())
                .then_with(|| match (a.due_date, b.due_date) {
                    (Some(da), Some(db)) => da.cmp(&db),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        tasks
    }

    pub fn all(&self) -> Vec<Task> {
        self.list(TaskFilter::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, priority: Priority) -> TaskInput {
        TaskInput {
            title: title.to_string(),
            description: None,
            subject: None,
            priority,
            due_date: None,
            estimated_minutes: None,
        }
    }

    async fn temp_tasks() -> (tempfile::TempDir, TaskStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("store.sqlite3")).unwrap();
        let tasks = TaskStore::load(store).await.unwrap();
        (dir, tasks)
    }

    #[tokio::test]
    async fn create_toggle_delete_round_trip() {
        let (_dir, tasks) = temp_tasks().await;
        let task = tasks.create(input("read chapter 4", Priority::Medium)).await.unwrap();
        assert!(!task.completed);

        let toggled = tasks.toggle_completed(&task.id).await.unwrap();
        assert!(toggled.completed);
        assert_eq!(tasks.list(TaskFilter::Completed).len(), 1);
        assert!(tasks.list(TaskFilter::Active).is_empty());

        tasks.delete(&task.id).await.unwrap();
        assert!(tasks.all().is_empty());
    }

    #[tokio::test]
    async fn list_sorts_by_priority_then_due_date() {
        let (_dir, tasks) = temp_tasks().await;
        tasks.create(input("low", Priority::Low)).await.unwrap();
        let mut urgent = input("high-later", Priority::High);
        urgent.due_date = NaiveDate::from_ymd_opt(2025, 4, 2);
        tasks.create(urgent).await.unwrap();
        let mut first = input("high-soon", Priority::High);
        first.due_date = NaiveDate::from_ymd_opt(2025, 4, 1);
        tasks.create(first).await.unwrap();

        let listed = tasks.all();
        assert_eq!(listed[0].title, "high-soon");
        assert_eq!(listed[1].title, "high-later");
        assert_eq!(listed[2].title, "low");
    }

    #[tokio::test]
    async fn update_patches_only_given_fields() {
        let (_dir, tasks) = temp_tasks().await;
        let task = tasks.create(input("draft essay", Priority::Low)).await.unwrap();

        let patched = tasks
            .update(
                &task.id,
                TaskPatch {
                    priority: Some(Priority::High),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(patched.priority, Priority::High);
        assert_eq!(patched.title, "draft essay");
    }

    #[tokio::test]
    async fn unknown_id_is_an_error() {
        let (_dir, tasks) = temp_tasks().await;
        assert!(tasks.delete("missing").await.is_err());
        assert!(tasks.toggle_completed("missing").await.is_err());
    }
}
