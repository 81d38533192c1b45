use sea_orm::DatabaseConnection;
use tasker_server::task::{Priority, TaskDraft, TaskService, TaskServiceError};
use testcontainers_modules::{postgres, testcontainers};

mod common;

pub struct TestContext {
    #[allow(dead_code)] // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<postgres::Postgres>,
    pub db: DatabaseConnection,
}

async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let container = common::setup_container().await?;
    let db = common::setup_db(&container).await?;
    Ok(TestContext { db, container })
}

fn draft_with_title(title: &str) -> TaskDraft {
    TaskDraft {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn can_create_task_with_defaults() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let created = task_service
        .create_task(draft_with_title("Buy milk"))
        .await
        .expect("Failed to create task");

    assert_eq!(created.title(), "Buy milk");
    assert_eq!(created.description(), "");
    assert!(!created.completed());
    assert_eq!(created.assignee(), "");
    assert_eq!(created.priority(), Priority::Medium);
    assert_eq!(created.deadline(), "");
    assert_eq!(created.category(), "");
    assert_eq!(created.created_at(), created.updated_at());
}

#[tokio::test]
async fn create_rejects_unknown_priority_and_persists_nothing() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let draft = TaskDraft {
        title: Some("Buy milk".to_string()),
        priority: Some("urgent".to_string()),
        ..Default::default()
    };
    let result = task_service.create_task(draft).await;

    match result {
        Err(TaskServiceError::Validation(errors)) => {
            assert_eq!(
                errors.field("priority"),
                Some(&["\"urgent\" is not a valid choice.".to_string()][..])
            );
        }
        other => panic!("Expected validation error, got ok={}", other.is_ok()),
    }

    let all_tasks = task_service
        .get_all_tasks()
        .await
        .expect("Failed to list tasks");
    assert!(all_tasks.is_empty());
}

#[tokio::test]
async fn can_retrieve_created_task_by_id() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let draft = TaskDraft {
        title: Some("Write report".to_string()),
        description: Some("Quarterly numbers".to_string()),
        assignee: Some("alex".to_string()),
        priority: Some("high".to_string()),
        deadline: Some("2025-09-01".to_string()),
        category: Some("work".to_string()),
        ..Default::default()
    };
    let created = task_service
        .create_task(draft)
        .await
        .expect("Failed to create task");

    let fetched = task_service
        .get_task_by_id(created.id())
        .await
        .expect("Failed to retrieve task");

    assert_eq!(fetched, created);
}

#[tokio::test]
async fn can_handle_retrieve_when_task_not_found() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let result = task_service.get_task_by_id(9999).await;

    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(9999))));
}

#[tokio::test]
async fn patch_changes_only_supplied_fields_and_advances_updated_at() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let draft = TaskDraft {
        title: Some("Water plants".to_string()),
        description: Some("Kitchen and balcony".to_string()),
        ..Default::default()
    };
    let created = task_service
        .create_task(draft)
        .await
        .expect("Failed to create task");

    let patch = TaskDraft {
        completed: Some(true),
        ..Default::default()
    };
    let patched = task_service
        .patch_task_by_id(created.id(), patch)
        .await
        .expect("Failed to patch task");

    assert!(patched.completed());
    assert_eq!(patched.title(), "Water plants");
    assert_eq!(patched.description(), "Kitchen and balcony");
    assert_eq!(patched.created_at(), created.created_at());
    assert!(patched.updated_at() > created.updated_at());
}

#[tokio::test]
async fn replace_resets_unsupplied_fields_to_defaults() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let draft = TaskDraft {
        title: Some("Plan offsite".to_string()),
        description: Some("Collect venue options".to_string()),
        assignee: Some("sam".to_string()),
        priority: Some("high".to_string()),
        ..Default::default()
    };
    let created = task_service
        .create_task(draft)
        .await
        .expect("Failed to create task");

    let replaced = task_service
        .replace_task_by_id(created.id(), draft_with_title("Plan offsite"))
        .await
        .expect("Failed to replace task");

    assert_eq!(replaced.id(), created.id());
    assert_eq!(replaced.title(), "Plan offsite");
    assert_eq!(replaced.description(), "");
    assert_eq!(replaced.assignee(), "");
    assert_eq!(replaced.priority(), Priority::Medium);
    assert_eq!(replaced.created_at(), created.created_at());
}

#[tokio::test]
async fn replace_requires_title() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let created = task_service
        .create_task(draft_with_title("Clean garage"))
        .await
        .expect("Failed to create task");

    let result = task_service
        .replace_task_by_id(created.id(), TaskDraft::default())
        .await;

    match result {
        Err(TaskServiceError::Validation(errors)) => {
            assert_eq!(
                errors.field("title"),
                Some(&["This field is required.".to_string()][..])
            );
        }
        other => panic!("Expected validation error, got ok={}", other.is_ok()),
    }
}

#[tokio::test]
async fn replace_reports_unknown_task_before_validating_the_draft() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    // The empty draft would fail validation, but the unknown ID wins.
    let result = task_service.replace_task_by_id(8888, TaskDraft::default()).await;

    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(8888))));
}

#[tokio::test]
async fn patch_reports_unknown_task_before_validating_the_patch() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let patch = TaskDraft {
        priority: Some("urgent".to_string()),
        ..Default::default()
    };
    let result = task_service.patch_task_by_id(8888, patch).await;

    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(8888))));
}

#[tokio::test]
async fn can_handle_delete_then_retrieve_as_not_found() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let created = task_service
        .create_task(draft_with_title("Return library books"))
        .await
        .expect("Failed to create task");
    let id = created.id();

    let deleted = task_service
        .delete_task_by_id(id)
        .await
        .expect("Failed to delete task");
    assert_eq!(deleted, created);

    let result = task_service.get_task_by_id(id).await;
    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(got)) if got == id));
}

#[tokio::test]
async fn can_handle_delete_when_task_not_found() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let result = task_service.delete_task_by_id(12345).await;

    assert!(matches!(result, Err(TaskServiceError::TaskNotFound(12345))));
}

#[tokio::test]
async fn list_returns_newest_tasks_first() {
    let state = setup().await.expect("Failed to setup test context");
    let task_service = TaskService::new(&state.db);

    let first = task_service
        .create_task(draft_with_title("Task A"))
        .await
        .expect("Failed to create task A");
    let second = task_service
        .create_task(draft_with_title("Task B"))
        .await
        .expect("Failed to create task B");

    let all_tasks = task_service
        .get_all_tasks()
        .await
        .expect("Failed to list tasks");

    assert_eq!(all_tasks.len(), 2);
    assert_eq!(all_tasks[0].id(), second.id());
    assert_eq!(all_tasks[1].id(), first.id());
}
