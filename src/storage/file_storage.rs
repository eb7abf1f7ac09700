use crate::{
    domain::{BoardConfig, Task, TaskId, TaskStatus, UserId},
    error::{BoardError, Result},
    storage::TaskBackend,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// On-disk form of a task: the task plus who owns it and when it was created
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskRecord {
    user_id: UserId,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    task: Task,
}

/// File-based backend storing one JSON file per task
pub struct FileStorage {
    root_path: PathBuf,
}

impl FileStorage {
    const BOARD_DIR: &'static str = ".taskboard";
    const TASKS_DIR: &'static str = "tasks";
    const CONFIG_FILE: &'static str = "board.json";

    /// Creates a new FileStorage instance for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::BOARD_DIR),
        }
    }

    fn tasks_dir(&self) -> PathBuf {
        self.root_path.join(Self::TASKS_DIR)
    }

    fn config_file(&self) -> PathBuf {
        self.root_path.join(Self::CONFIG_FILE)
    }

    fn task_file(&self, id: &TaskId) -> PathBuf {
        self.tasks_dir().join(format!("{}.json", id.as_str()))
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    async fn read_record(&self, id: &TaskId) -> Result<TaskRecord> {
        let file_path = self.task_file(id);

        if !file_path.exists() {
            return Err(BoardError::TaskNotFound(id.to_string()));
        }

        let contents = fs::read_to_string(&file_path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn write_record(&self, record: &TaskRecord) -> Result<()> {
        self.ensure_directory_exists(&self.tasks_dir()).await?;

        let json = serde_json::to_string_pretty(record)?;
        fs::write(self.task_file(&record.task.id), json).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskBackend for FileStorage {
    async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;
        self.ensure_directory_exists(&self.tasks_dir()).await?;

        if !self.config_file().exists() {
            self.save_config(&BoardConfig::default()).await?;
        }

        Ok(())
    }

    async fn fetch_tasks(&self, user: &UserId) -> Result<Vec<Task>> {
        let tasks_dir = self.tasks_dir();

        if !tasks_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&tasks_dir).await?;
        let mut records: Vec<TaskRecord> = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let contents = fs::read_to_string(&path).await?;
            match serde_json::from_str::<TaskRecord>(&contents) {
                Ok(record) if &record.user_id == user => records.push(record),
                Ok(_) => {}
                Err(err) => warn!(path = %path.display(), %err, "Skipping unreadable task file"),
            }
        }

        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.task.id.as_str().cmp(b.task.id.as_str()))
        });
        debug!(user = %user, count = records.len(), "Fetched tasks");
        Ok(records.into_iter().map(|record| record.task).collect())
    }

    async fn create_task(&self, user: &UserId, task: &Task) -> Result<Task> {
        if self.task_file(&task.id).exists() {
            return Err(BoardError::DuplicateTask(task.id.to_string()));
        }

        let record = TaskRecord {
            user_id: user.clone(),
            created_at: Utc::now(),
            task: task.clone(),
        };
        self.write_record(&record).await?;
        Ok(record.task)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<()> {
        let file_path = self.task_file(id);

        if !file_path.exists() {
            return Err(BoardError::TaskNotFound(id.to_string()));
        }

        fs::remove_file(file_path).await?;
        Ok(())
    }

    async fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<()> {
        let mut record = self.read_record(id).await?;
        record.task.status = status;
        self.write_record(&record).await
    }

    async fn save_config(&self, config: &BoardConfig) -> Result<()> {
        config.validate()?;
        self.ensure_directory_exists(&self.root_path).await?;

        let json = serde_json::to_string_pretty(config)?;
        fs::write(self.config_file(), json).await?;

        Ok(())
    }

    async fn load_config(&self) -> Result<BoardConfig> {
        let config_file = self.config_file();

        if !config_file.exists() {
            return Err(BoardError::BoardNotInitialized);
        }

        let contents = fs::read_to_string(&config_file).await?;
        let config: BoardConfig = serde_json::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    async fn is_initialized(&self) -> bool {
        self.root_path.exists() && self.config_file().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;
    use tempfile::TempDir;

    fn user() -> UserId {
        BoardConfig::default().current_user
    }

    fn task(id: &str, title: &str) -> Task {
        Task::new(id.parse().unwrap(), title.to_string())
    }

    #[tokio::test]
    async fn test_storage_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        assert!(!storage.is_initialized().await);

        storage.initialize().await.unwrap();

        assert!(storage.is_initialized().await);
        assert!(storage.tasks_dir().exists());
        assert!(storage.config_file().exists());
        assert_eq!(storage.load_config().await.unwrap(), BoardConfig::default());
    }

    #[tokio::test]
    async fn test_load_config_before_init() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        assert!(matches!(
            storage.load_config().await,
            Err(BoardError::BoardNotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_save_config_validates() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let mut config = BoardConfig::default();
        config.columns.reverse();
        storage.save_config(&config).await.unwrap();
        assert_eq!(
            storage.load_config().await.unwrap().columns[0],
            TaskStatus::Completed
        );

        config.columns.truncate(2);
        assert!(matches!(
            storage.save_config(&config).await,
            Err(BoardError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_and_fetch_tasks() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let first = task("t1", "First").with_priority(Priority::Urgent);
        storage.create_task(&user(), &first).await.unwrap();
        storage.create_task(&user(), &task("t2", "Second")).await.unwrap();

        let tasks = storage.fetch_tasks(&user()).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0], first);
        assert_eq!(tasks[1].title, "Second");
    }

    #[tokio::test]
    async fn test_fetch_is_scoped_to_user() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        storage.create_task(&user(), &task("mine", "Mine")).await.unwrap();
        storage
            .create_task(&UserId::new("someone-else"), &task("theirs", "Theirs"))
            .await
            .unwrap();

        let tasks = storage.fetch_tasks(&user()).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id.as_str(), "mine");
    }

    #[tokio::test]
    async fn test_create_duplicate_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        storage.create_task(&user(), &task("t1", "First")).await.unwrap();
        let result = storage.create_task(&user(), &task("t1", "Again")).await;
        assert!(matches!(result, Err(BoardError::DuplicateTask(_))));
    }

    #[tokio::test]
    async fn test_update_status_and_complete() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        storage.create_task(&user(), &task("t1", "First")).await.unwrap();
        storage.create_task(&user(), &task("t2", "Second")).await.unwrap();

        storage
            .update_task_status(&"t1".parse().unwrap(), TaskStatus::UnderReview)
            .await
            .unwrap();
        storage.complete_task(&"t2".parse().unwrap()).await.unwrap();

        let tasks = storage.fetch_tasks(&user()).await.unwrap();
        assert_eq!(tasks[0].status, TaskStatus::UnderReview);
        assert_eq!(tasks[1].status, TaskStatus::Completed);

        let missing = storage
            .update_task_status(&"nope".parse().unwrap(), TaskStatus::Todo)
            .await;
        assert!(matches!(missing, Err(BoardError::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_task() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        storage.create_task(&user(), &task("t1", "First")).await.unwrap();
        storage.delete_task(&"t1".parse().unwrap()).await.unwrap();

        assert!(storage.fetch_tasks(&user()).await.unwrap().is_empty());
        assert!(matches!(
            storage.delete_task(&"t1".parse().unwrap()).await,
            Err(BoardError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_skips_corrupt_files() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        storage.create_task(&user(), &task("t1", "First")).await.unwrap();
        fs::write(storage.tasks_dir().join("broken.json"), "{ not json")
            .await
            .unwrap();

        let tasks = storage.fetch_tasks(&user()).await.unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_skips_records_with_path_like_ids() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        storage.create_task(&user(), &task("t1", "First")).await.unwrap();
        let record = serde_json::json!({
            "user_id": user(),
            "created_at": Utc::now(),
            "id": "../../escaped",
            "title": "Escaped",
            "status": "TODO",
        });
        fs::write(storage.tasks_dir().join("escaped.json"), record.to_string())
            .await
            .unwrap();

        let tasks = storage.fetch_tasks(&user()).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id.as_str(), "t1");
        assert!(!temp_dir.path().join("escaped.json").exists());
    }
}
