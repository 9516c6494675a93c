//! Task List
//!
//! Owner-scoped to-do records. The only entities that are ever physically
//! deleted; ids stay burned after deletion.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::hash::StateHasher;
use crate::core::ids::AccountId;
use crate::error::{ArcadeError, ArcadeResult};
use crate::ledger::Registry;

/// One task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier.
    pub id: u64,
    /// Creating account.
    pub owner: AccountId,
    /// Done flag.
    pub completed: bool,
}

/// All tasks.
#[derive(Clone, Debug)]
pub struct TaskList {
    tasks: Registry<Task>,
}

impl Default for TaskList {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskList {
    /// Empty list.
    pub fn new() -> Self {
        Self { tasks: Registry::new("task") }
    }

    /// Create a task owned by the caller.
    pub fn create_task(&mut self, caller: AccountId) -> u64 {
        let id = self.tasks.allocate(|id| Task { id, owner: caller, completed: false });
        info!(task_id = id, owner = %caller.short(), "Task created");
        id
    }

    /// Set the done flag. Owner only.
    pub fn set_completed(&mut self, caller: &AccountId, id: u64, completed: bool) -> ArcadeResult<bool> {
        let task = self.tasks.require_mut(id)?;
        if task.owner != *caller {
            return Err(ArcadeError::Unauthorized);
        }
        task.completed = completed;
        Ok(completed)
    }

    /// Look up a task.
    pub fn get_task(&self, id: u64) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Remove a task. Owner only.
    pub fn delete_task(&mut self, caller: &AccountId, id: u64) -> ArcadeResult<()> {
        if self.tasks.require(id)?.owner != *caller {
            return Err(ArcadeError::Unauthorized);
        }
        self.tasks.remove(id)?;
        info!(task_id = id, "Task deleted");
        Ok(())
    }

    /// Fold into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.tasks.next_id());
        hasher.update_u64(self.tasks.len() as u64);
        for (_, task) in self.tasks.iter() {
            hasher.update_u64(task.id);
            hasher.update_account(&task.owner);
            hasher.update_bool(task.completed);
        }
    }
}
