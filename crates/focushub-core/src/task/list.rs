//! In-memory task collection with optimistic persistence.
//!
//! Every mutation lands in the local `Vec` first and then hands the backend
//! call to [`PendingSyncs`]. A failed call is logged by the gateway and the
//! local state is left as it is; there is no rollback.

use std::future::Future;

use uuid::Uuid;

use super::{Category, NewTask, Priority, Task, TaskFilter, TaskPatch};
use crate::error::ValidationError;
use crate::gateway::Gateway;
use crate::sync::{IdMap, IdRemap, PendingSyncs};

/// An inline title edit in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub task_id: String,
    /// Title at the moment editing began.
    pub draft: String,
}

#[derive(Debug)]
pub struct TaskList {
    tasks: Vec<Task>,
    gateway: Gateway,
    pending: PendingSyncs,
    editing: Option<EditSession>,
}

impl TaskList {
    pub fn new(gateway: Gateway) -> Self {
        Self::with_tasks(gateway, Vec::new())
    }

    pub fn with_tasks(gateway: Gateway, tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            gateway,
            pending: PendingSyncs::new(),
            editing: None,
        }
    }

    /// Fetch all tasks, newest first.
    pub async fn load(gateway: Gateway) -> Self {
        let tasks = gateway.tasks().get_all().await;
        tracing::debug!(count = tasks.len(), "tasks loaded");
        Self::with_tasks(gateway, tasks)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of backend calls not yet awaited.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Add a Medium/Work task at the top of the list.
    pub fn add(&mut self, title: &str) -> Result<&Task, ValidationError> {
        self.add_with(title, Priority::default(), Category::default())
    }

    pub fn add_with(
        &mut self,
        title: &str,
        priority: Priority,
        category: Category,
    ) -> Result<&Task, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            completed: false,
            priority,
            category,
            checked: false,
        };
        let row = NewTask::from(&task);
        let local = task.id.clone();
        self.tasks.insert(0, task);

        self.sync(move |gateway, ids| async move {
            let created = gateway.tasks().create(&row).await;
            ids.settle(&local, created.as_ref().map(|t| t.id.as_str()));
            Some(IdRemap {
                local,
                server: created?.id,
            })
        });

        Ok(&self.tasks[0])
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<(), ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let task = self.find_mut(id)?;
        task.title = title.to_string();

        self.update(
            id,
            TaskPatch {
                title: Some(title.to_string()),
                ..TaskPatch::default()
            },
        );
        Ok(())
    }

    /// Flip `checked` and `completed` together. Returns the new value.
    pub fn toggle(&mut self, id: &str) -> Result<bool, ValidationError> {
        let task = self.find_mut(id)?;
        let checked = !task.checked;
        task.checked = checked;
        task.completed = checked;

        self.update(
            id,
            TaskPatch {
                checked: Some(checked),
                completed: Some(checked),
                ..TaskPatch::default()
            },
        );
        Ok(checked)
    }

    pub fn set_priority(&mut self, id: &str, priority: Priority) -> Result<(), ValidationError> {
        self.find_mut(id)?.priority = priority;
        self.update(
            id,
            TaskPatch {
                priority: Some(priority),
                ..TaskPatch::default()
            },
        );
        Ok(())
    }

    pub fn set_category(&mut self, id: &str, category: Category) -> Result<(), ValidationError> {
        self.find_mut(id)?.category = category;
        self.update(
            id,
            TaskPatch {
                category: Some(category),
                ..TaskPatch::default()
            },
        );
        Ok(())
    }

    /// Remove a task locally and delete it on the backend.
    ///
    /// Unchecked tasks may be removed too; the dashboard only offers the
    /// action for checked ones.
    pub fn remove(&mut self, id: &str) -> Result<Task, ValidationError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownTask(id.to_string()))?;
        let removed = self.tasks.remove(idx);

        if self.editing.as_ref().is_some_and(|e| e.task_id == id) {
            self.editing = None;
        }

        let id = id.to_string();
        self.sync(move |gateway, ids| async move {
            let Some(id) = ids.resolve(&id) else {
                return None;
            };
            if !gateway.tasks().delete(&id).await {
                tracing::warn!(task_id = %id, "task removed locally but backend delete failed");
            }
            None
        });

        Ok(removed)
    }

    pub fn filter(&self, filter: TaskFilter) -> Vec<&Task> {
        self.filter_by(|t| filter.matches(t))
    }

    pub fn filter_by<P>(&self, predicate: P) -> Vec<&Task>
    where
        P: Fn(&Task) -> bool,
    {
        self.tasks.iter().filter(|t| predicate(t)).collect()
    }

    /// Start editing a task title. Replaces any edit already in progress.
    pub fn begin_edit(&mut self, id: &str) -> Result<&EditSession, ValidationError> {
        let draft = self
            .get(id)
            .map(|t| t.title.clone())
            .ok_or_else(|| ValidationError::UnknownTask(id.to_string()))?;
        Ok(&*self.editing.insert(EditSession {
            task_id: id.to_string(),
            draft,
        }))
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    /// Finish the current edit. Blank text ends the edit without renaming.
    /// Returns whether the title was changed.
    pub fn commit_edit(&mut self, text: &str) -> Result<bool, ValidationError> {
        let Some(session) = self.editing.take() else {
            return Ok(false);
        };
        if text.trim().is_empty() || text.trim() == session.draft {
            return Ok(false);
        }
        self.rename(&session.task_id, text)?;
        Ok(true)
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Await in-flight backend calls and adopt server ids for tasks created
    /// locally. Returns the ids replaced.
    pub async fn flush(&mut self) -> Vec<IdRemap> {
        let mut applied = Vec::new();
        for remap in self.pending.drain().await {
            if let Some(edit) = self.editing.as_mut().filter(|e| e.task_id == remap.local) {
                edit.task_id = remap.server.clone();
            }
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == remap.local) {
                task.id = remap.server.clone();
                applied.push(remap);
            }
        }
        applied
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Task, ValidationError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownTask(id.to_string()))
    }

    fn update(&mut self, id: &str, patch: TaskPatch) {
        let id = id.to_string();
        self.sync(move |gateway, ids| async move {
            match ids.resolve(&id) {
                Some(id) => {
                    gateway.tasks().update(&id, &patch).await;
                }
                None => {
                    tracing::warn!(task_id = %id, "task never reached the backend, dropping update");
                }
            }
            None
        });
    }

    fn sync<F, Fut>(&mut self, call: F)
    where
        F: FnOnce(Gateway, IdMap) -> Fut,
        Fut: Future<Output = Option<IdRemap>> + Send + 'static,
    {
        if !self.gateway.is_available() {
            tracing::debug!("backend offline, keeping task change local");
            return;
        }
        let call = call(self.gateway.clone(), self.pending.ids());
        self.pending.spawn(call);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::sample_tasks;

    fn list() -> TaskList {
        TaskList::with_tasks(Gateway::offline(), sample_tasks())
    }

    #[test]
    fn add_prepends_with_defaults() {
        let mut list = list();
        let task = list.add("  Write report  ").unwrap().clone();
        assert_eq!(task.title, "Write report");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, Category::Work);
        assert!(!task.checked && !task.completed);
        assert_eq!(list.tasks()[0].id, task.id);
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn add_rejects_blank_title() {
        let mut list = list();
        assert_eq!(list.add("   ").unwrap_err(), ValidationError::EmptyTitle);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn ids_are_unique() {
        let mut list = TaskList::new(Gateway::offline());
        let a = list.add("a").unwrap().id.clone();
        let b = list.add("b").unwrap().id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn toggle_keeps_flags_in_lockstep() {
        let mut list = list();
        assert!(list.toggle("1").unwrap());
        let task = list.get("1").unwrap();
        assert!(task.checked && task.completed);
        assert!(!list.toggle("1").unwrap());
        let task = list.get("1").unwrap();
        assert!(!task.checked && !task.completed);
    }

    #[test]
    fn rename_and_unknown_ids() {
        let mut list = list();
        list.rename("2", "Reply to Sam").unwrap();
        assert_eq!(list.get("2").unwrap().title, "Reply to Sam");
        assert_eq!(list.rename("2", " "), Err(ValidationError::EmptyTitle));
        assert_eq!(
            list.rename("99", "x"),
            Err(ValidationError::UnknownTask("99".into()))
        );
        assert!(list.toggle("99").is_err());
    }

    #[test]
    fn remove_unchecked_task_is_allowed() {
        let mut list = list();
        let removed = list.remove("3").unwrap();
        assert_eq!(removed.title, "Walk the dog");
        assert!(list.get("3").is_none());
        assert!(list.remove("3").is_err());
    }

    #[test]
    fn field_updates() {
        let mut list = list();
        list.set_priority("3", Priority::High).unwrap();
        list.set_category("1", Category::Personal).unwrap();
        assert_eq!(list.get("3").unwrap().priority, Priority::High);
        assert_eq!(list.filter(TaskFilter::Personal).len(), 2);
    }

    #[test]
    fn filters() {
        let list = list();
        assert_eq!(list.filter(TaskFilter::All).len(), 3);
        assert_eq!(list.filter(TaskFilter::Work).len(), 2);
        let high = list.filter_by(|t| t.priority == Priority::High);
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, "1");
    }

    #[test]
    fn edit_session_commit() {
        let mut list = list();
        assert_eq!(list.begin_edit("1").unwrap().draft, "Finalize Q3 Design System");
        assert!(list.commit_edit("Finalize Q4 Design System").unwrap());
        assert_eq!(list.get("1").unwrap().title, "Finalize Q4 Design System");
        assert!(list.editing().is_none());
    }

    #[test]
    fn edit_session_blank_or_cancelled() {
        let mut list = list();
        list.begin_edit("1").unwrap();
        assert!(!list.commit_edit("   ").unwrap());
        assert_eq!(list.get("1").unwrap().title, "Finalize Q3 Design System");

        list.begin_edit("2").unwrap();
        list.cancel_edit();
        assert!(list.editing().is_none());
        assert!(!list.commit_edit("ignored").unwrap());
    }

    #[test]
    fn removing_edited_task_ends_edit() {
        let mut list = list();
        list.begin_edit("2").unwrap();
        list.remove("2").unwrap();
        assert!(list.editing().is_none());
    }

    #[tokio::test]
    async fn offline_changes_never_queue_backend_calls() {
        let mut list = list();
        list.add("x").unwrap();
        list.toggle("1").unwrap();
        list.remove("2").unwrap();
        assert_eq!(list.pending(), 0);
        assert!(list.flush().await.is_empty());
    }

    #[tokio::test]
    async fn load_offline_is_empty() {
        let list = TaskList::load(Gateway::offline()).await;
        assert!(list.is_empty());
    }
}
