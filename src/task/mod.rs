use crate::entities::*;
use chrono::{DateTime, Utc};
use sea_orm::*;
use std::collections::BTreeMap;

pub mod api;

/// Priority of a task. Serialized as its lowercase code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Returns the wire/storage code for this priority.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parses a priority code, returning `None` for anything outside the
    /// enumerated set.
    pub fn parse(code: &str) -> Option<Priority> {
        match code {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Task {
    id: i32,
    title: String,
    description: String,
    completed: bool,
    assignee: String,
    priority: Priority,
    deadline: String,
    category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i32,
        title: String,
        description: String,
        completed: bool,
        assignee: String,
        priority: Priority,
        deadline: String,
        category: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            completed,
            assignee,
            priority,
            deadline,
            category,
            created_at,
            updated_at,
        }
    }

    /// Returns the ID of the task.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the title of the task.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description of the task.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns whether the task is completed.
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Returns the assignee of the task.
    pub fn assignee(&self) -> &str {
        &self.assignee
    }

    /// Returns the priority of the task.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the deadline of the task. Deadlines are opaque client-formatted
    /// strings, not structured dates.
    pub fn deadline(&self) -> &str {
        &self.deadline
    }

    /// Returns the category of the task.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns when the task was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the task was last modified.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task::new(
            model.id,
            model.title,
            model.description,
            model.completed,
            model.assignee,
            // The column is constrained to valid codes at write time.
            Priority::parse(&model.priority).unwrap_or_default(),
            model.deadline,
            model.category,
            model.created_at,
            model.updated_at,
        )
    }
}

/// Field-level validation messages, keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the messages recorded for a field, if any.
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, messages.join(" "))?;
            first = false;
        }
        Ok(())
    }
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// Represents a rejected write (missing title, unknown priority, field too long).
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    /// Represents a task not found error.
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Incoming task fields for create and update operations. `None` means the
/// field was not supplied; defaults (create, full update) or the stored value
/// (partial update) apply.
#[derive(Debug, Default, Clone)]
pub struct TaskDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub assignee: Option<String>,
    pub priority: Option<String>,
    pub deadline: Option<String>,
    pub category: Option<String>,
}

const TITLE_MAX_LEN: usize = 200;
const ASSIGNEE_MAX_LEN: usize = 100;
const PRIORITY_MAX_LEN: usize = 10;
const DEADLINE_MAX_LEN: usize = 20;
const CATEGORY_MAX_LEN: usize = 100;

fn check_max_len(errors: &mut ValidationErrors, field: &str, value: &str, max_len: usize) {
    if value.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {} characters.", max_len),
        );
    }
}

/// Validates a draft. With `title_required`, a missing title is an error
/// (create and full update); otherwise only supplied fields are checked
/// (partial update).
fn validate_draft(draft: &TaskDraft, title_required: bool) -> Result<(), TaskServiceError> {
    let mut errors = ValidationErrors::default();

    match &draft.title {
        Some(title) if title.is_empty() => errors.add("title", "This field may not be blank."),
        Some(title) => check_max_len(&mut errors, "title", title, TITLE_MAX_LEN),
        None if title_required => errors.add("title", "This field is required."),
        None => {}
    }

    if let Some(priority) = &draft.priority {
        if Priority::parse(priority).is_none() {
            errors.add("priority", format!("\"{}\" is not a valid choice.", priority));
        }
        check_max_len(&mut errors, "priority", priority, PRIORITY_MAX_LEN);
    }

    if let Some(assignee) = &draft.assignee {
        check_max_len(&mut errors, "assignee", assignee, ASSIGNEE_MAX_LEN);
    }
    if let Some(deadline) = &draft.deadline {
        check_max_len(&mut errors, "deadline", deadline, DEADLINE_MAX_LEN);
    }
    if let Some(category) = &draft.category {
        check_max_len(&mut errors, "category", category, CATEGORY_MAX_LEN);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TaskServiceError::Validation(errors))
    }
}

pub struct TaskService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl TaskService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> TaskService {
        TaskService { db }
    }

    /// Creates a new task from the supplied draft.
    ///
    /// # Arguments
    ///
    /// * `draft` - The incoming task fields; `title` is required, everything
    ///   else falls back to its default.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Task` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, draft: TaskDraft) -> Result<Task, TaskServiceError> {
        validate_draft(&draft, true)?;

        let priority = draft
            .priority
            .as_deref()
            .and_then(Priority::parse)
            .unwrap_or_default();
        let now = Utc::now();
        let active_model = task::ActiveModel {
            title: ActiveValue::Set(draft.title.unwrap_or_default()),
            description: ActiveValue::Set(draft.description.unwrap_or_default()),
            completed: ActiveValue::Set(draft.completed.unwrap_or(false)),
            assignee: ActiveValue::Set(draft.assignee.unwrap_or_default()),
            priority: ActiveValue::Set(priority.as_str().to_string()),
            deadline: ActiveValue::Set(draft.deadline.unwrap_or_default()),
            category: ActiveValue::Set(draft.category.unwrap_or_default()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await?;
        Ok(Task::from(created_model))
    }

    /// Retrieves a single task by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to retrieve.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Task` if found, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn get_task_by_id(&self, id: i32) -> Result<Task, TaskServiceError> {
        let model = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;
        Ok(Task::from(model))
    }

    /// Retrieves all tasks, newest first.
    ///
    /// # Returns
    ///
    /// A `Result` containing a vector of `Task` ordered by creation time
    /// descending, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_tasks(&self) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = task::Entity::find()
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    /// Replaces all mutable fields of a task (full update). Fields absent
    /// from the draft are reset to their defaults; `title` is required.
    /// An unknown ID is reported before the draft is validated.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to update.
    /// * `draft` - The replacement fields.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Task` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn replace_task_by_id(
        &self,
        id: i32,
        draft: TaskDraft,
    ) -> Result<Task, TaskServiceError> {
        let task_to_update = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        validate_draft(&draft, true)?;

        let priority = draft
            .priority
            .as_deref()
            .and_then(Priority::parse)
            .unwrap_or_default();
        let mut active_model: task::ActiveModel = task_to_update.into();
        active_model.title = ActiveValue::Set(draft.title.unwrap_or_default());
        active_model.description = ActiveValue::Set(draft.description.unwrap_or_default());
        active_model.completed = ActiveValue::Set(draft.completed.unwrap_or(false));
        active_model.assignee = ActiveValue::Set(draft.assignee.unwrap_or_default());
        active_model.priority = ActiveValue::Set(priority.as_str().to_string());
        active_model.deadline = ActiveValue::Set(draft.deadline.unwrap_or_default());
        active_model.category = ActiveValue::Set(draft.category.unwrap_or_default());
        active_model.updated_at = ActiveValue::Set(Utc::now());
        let updated_model = active_model.update(self.db).await?;

        Ok(Task::from(updated_model))
    }

    /// Updates only the supplied fields of a task (partial update).
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to update.
    /// * `patch` - The fields to change; unset fields keep their stored value.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Task` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn patch_task_by_id(
        &self,
        id: i32,
        patch: TaskDraft,
    ) -> Result<Task, TaskServiceError> {
        let task_to_update = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        validate_draft(&patch, false)?;

        let mut active_model: task::ActiveModel = task_to_update.into();
        if let Some(title) = patch.title {
            active_model.title = ActiveValue::Set(title);
        }
        if let Some(description) = patch.description {
            active_model.description = ActiveValue::Set(description);
        }
        if let Some(completed) = patch.completed {
            active_model.completed = ActiveValue::Set(completed);
        }
        if let Some(assignee) = patch.assignee {
            active_model.assignee = ActiveValue::Set(assignee);
        }
        if let Some(priority) = patch.priority {
            // Already validated against the enumerated set above.
            let priority = Priority::parse(&priority).unwrap_or_default();
            active_model.priority = ActiveValue::Set(priority.as_str().to_string());
        }
        if let Some(deadline) = patch.deadline {
            active_model.deadline = ActiveValue::Set(deadline);
        }
        if let Some(category) = patch.category {
            active_model.category = ActiveValue::Set(category);
        }
        active_model.updated_at = ActiveValue::Set(Utc::now());
        let updated_model = active_model.update(self.db).await?;

        Ok(Task::from(updated_model))
    }

    /// Deletes a task by its ID (hard delete).
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to delete.
    ///
    /// # Returns
    ///
    /// A `Result` containing the deleted `Task` if successful, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task_by_id(&self, id: i32) -> Result<Task, TaskServiceError> {
        let task_to_delete = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))?;

        let task_copy = Task::from(task_to_delete);
        task::Entity::delete_by_id(id).exec(self.db).await?;

        Ok(task_copy)
    }
}
