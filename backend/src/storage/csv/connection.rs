use anyhow::Result;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::order_repository::OrderRepository;
use super::work_in_progress_repository::WorkInProgressRepository;
use crate::storage::traits::Connection;

/// Name of the folder created inside the user's Documents directory
pub const DEFAULT_DIRECTORY_NAME: &str = "Board Foot Calculator";

/// File that, when present in the default directory, points at the real one
pub const REDIRECT_FILE_NAME: &str = ".boardfoot_redirect";

const WORK_IN_PROGRESS_FILE: &str = "work_in_progress.csv";
const ORDERS_INDEX_FILE: &str = "saved_orders.yaml";
const ORDERS_INDEX_BACKUP_FILE: &str = "saved_orders.yaml.corrupt";
const ORDERS_DIRECTORY: &str = "orders";

/// CsvConnection manages the data directory and the file layout inside it
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: Arc<PathBuf>,
}

impl CsvConnection {
    /// Create a new CSV connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: Arc::new(base_path),
        })
    }

    /// Create a new CSV connection in the default data directory
    /// This uses ~/Documents/Board Foot Calculator, but checks for a redirect file first
    pub fn new_default() -> Result<Self> {
        Self::new(Self::resolve_default_directory()?)
    }

    /// Work out which directory the default connection should use
    pub fn resolve_default_directory() -> Result<PathBuf> {
        let documents_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        let default_data_dir = documents_dir.join(DEFAULT_DIRECTORY_NAME);

        Ok(Self::follow_redirect(default_data_dir))
    }

    /// Follow the redirect file in `default_dir` if it names an existing directory
    pub fn follow_redirect(default_dir: PathBuf) -> PathBuf {
        let redirect_file = default_dir.join(REDIRECT_FILE_NAME);
        if !redirect_file.exists() {
            info!("No redirect file found, using data directory: {}", default_dir.display());
            return default_dir;
        }

        match fs::read_to_string(&redirect_file) {
            Ok(redirected_path) => {
                let redirected_path = redirected_path.trim();
                let path = PathBuf::from(redirected_path);

                if path.is_dir() {
                    info!("Found redirect file, using data directory: {}", path.display());
                    path
                } else {
                    warn!(
                        "Redirect file points to non-existent directory: {}. Using default.",
                        redirected_path
                    );
                    default_dir
                }
            }
            Err(e) => {
                error!("Failed to read redirect file: {}. Using default directory.", e);
                default_dir
            }
        }
    }

    /// Get the base directory path
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn work_in_progress_path(&self) -> PathBuf {
        self.base_directory.join(WORK_IN_PROGRESS_FILE)
    }

    pub fn orders_index_path(&self) -> PathBuf {
        self.base_directory.join(ORDERS_INDEX_FILE)
    }

    /// Where an undecodable order index is moved before a new one is written
    pub fn orders_index_backup_path(&self) -> PathBuf {
        self.base_directory.join(ORDERS_INDEX_BACKUP_FILE)
    }

    pub fn orders_directory(&self) -> PathBuf {
        self.base_directory.join(ORDERS_DIRECTORY)
    }

    /// Board table owned by a single order, `None` for ids that are not plain file names
    pub fn order_boards_path(&self, order_id: &str) -> Option<PathBuf> {
        let is_plain = !order_id.is_empty()
            && order_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !is_plain {
            return None;
        }
        Some(self.orders_directory().join(format!("{}.csv", order_id)))
    }

    /// Write a file by writing a sibling temp file and renaming it over the target
    pub fn write_atomically(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

impl Connection for CsvConnection {
    type WorkInProgressRepository = WorkInProgressRepository;
    type OrderRepository = OrderRepository;

    fn create_work_in_progress_repository(&self) -> Self::WorkInProgressRepository {
        WorkInProgressRepository::new(self.clone())
    }

    fn create_order_repository(&self) -> Self::OrderRepository {
        OrderRepository::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("nested").join("data");

        let connection = CsvConnection::new(&data_dir).unwrap();

        assert!(data_dir.is_dir());
        assert_eq!(connection.base_directory(), data_dir.as_path());
        assert_eq!(connection.work_in_progress_path(), data_dir.join("work_in_progress.csv"));
    }

    #[test]
    fn test_follow_redirect() {
        let temp_dir = TempDir::new().unwrap();
        let default_dir = temp_dir.path().join("default");
        let target_dir = temp_dir.path().join("elsewhere");
        fs::create_dir_all(&default_dir).unwrap();
        fs::create_dir_all(&target_dir).unwrap();

        // No redirect file
        assert_eq!(CsvConnection::follow_redirect(default_dir.clone()), default_dir);

        // Redirect to an existing directory
        fs::write(
            default_dir.join(REDIRECT_FILE_NAME),
            format!("{}\n", target_dir.display()),
        )
        .unwrap();
        assert_eq!(CsvConnection::follow_redirect(default_dir.clone()), target_dir);

        // Redirect to a missing directory falls back
        fs::write(default_dir.join(REDIRECT_FILE_NAME), "/does/not/exist").unwrap();
        assert_eq!(CsvConnection::follow_redirect(default_dir.clone()), default_dir);
    }

    #[test]
    fn test_order_boards_path_rejects_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();

        assert!(connection.order_boards_path("3f2b9c1e-0a4d-4c1b-9a77-0d5c1f2e8b10").is_some());
        assert!(connection.order_boards_path("../work_in_progress").is_none());
        assert!(connection.order_boards_path("a/b").is_none());
        assert!(connection.order_boards_path("").is_none());
    }

    #[test]
    fn test_write_atomically_replaces_contents() {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        let path = connection.orders_directory().join("file.txt");

        connection.write_atomically(&path, b"first").unwrap();
        connection.write_atomically(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!connection.orders_directory().join("file.txt.tmp").exists());
    }
}
