//! Live tally domain logic.
//!
//! [`TallyService`] owns the boards of the current session together with the
//! board draft being typed. Every mutation is applied in memory first and then
//! mirrored to the work-in-progress slot by a background writer task, so the
//! caller never waits on disk I/O.
//!
//! Writes reach storage strictly in mutation order. A failed write is logged
//! and reported through [`TallyService::persistence_status`]; the in-memory
//! tally stays authoritative and the session carries on.

use log::{debug, error, info, warn};
use shared::{BoardDraft, BoardEntry, LumberPreset, TallySummary};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

use crate::domain::board_form::BoardFormService;
use crate::domain::models::{PersistenceError, PersistenceStatus};
use crate::storage::WorkInProgressStorage;

enum WorkInProgressCommand {
    Save(Vec<BoardEntry>),
    Clear,
    Flush(oneshot::Sender<Result<(), PersistenceError>>),
}

pub struct TallyService {
    boards: Vec<BoardEntry>,
    draft: BoardDraft,
    form: BoardFormService,
    writer: mpsc::UnboundedSender<WorkInProgressCommand>,
    summary: watch::Sender<TallySummary>,
    status: watch::Receiver<PersistenceStatus>,
}

impl TallyService {
    /// Resume the previous session from storage and start the writer.
    ///
    /// A missing or unreadable snapshot starts an empty tally. Must be called
    /// from within a tokio runtime.
    pub async fn restore(storage: Arc<dyn WorkInProgressStorage>) -> Self {
        let boards = match storage.load_work_in_progress().await {
            Ok(Some(boards)) => {
                info!("Restored {} boards from work in progress", boards.len());
                boards
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load work in progress: {}. Starting with an empty tally.", e);
                Vec::new()
            }
        };

        let (writer, commands) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(PersistenceStatus::default());
        tokio::spawn(run_writer(storage, commands, status_tx));

        let (summary, _) = watch::channel(TallySummary::from_boards(&boards));

        Self {
            boards,
            draft: BoardDraft::default(),
            form: BoardFormService::new(),
            writer,
            summary,
            status,
        }
    }

    pub fn boards(&self) -> &[BoardEntry] {
        &self.boards
    }

    pub fn draft(&self) -> &BoardDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut BoardDraft {
        &mut self.draft
    }

    pub fn can_add(&self) -> bool {
        self.form.can_add(&self.draft)
    }

    pub fn apply_preset(&mut self, preset: &LumberPreset) {
        self.form.apply_preset(&mut self.draft, preset);
    }

    /// Edit draft pre-filled from the board with the given id
    pub fn draft_for(&self, id: &str) -> Option<BoardDraft> {
        self.boards.iter().find(|b| b.id == id).map(BoardDraft::from_entry)
    }

    /// Append a board built from the current draft.
    ///
    /// Returns `None` and changes nothing when the draft is invalid.
    pub fn add(&mut self) -> Option<BoardEntry> {
        let entry = self.form.build_entry(&self.draft)?;
        self.boards.push(entry.clone());
        self.form.reset_after_add(&mut self.draft);

        debug!("Added board {} ({})", entry.id, entry.display_string());
        self.mirror();
        Some(entry)
    }

    /// Remove a board by id. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.boards.len();
        self.boards.retain(|b| b.id != id);
        if self.boards.len() == before {
            debug!("No board found to remove for ID '{}'", id);
            return false;
        }

        self.mirror();
        true
    }

    /// Replace the board with the given id using an edit draft
    pub fn update(&mut self, id: &str, draft: &BoardDraft) -> Option<BoardEntry> {
        let position = self.boards.iter().position(|b| b.id == id)?;
        let updated = self.form.rebuild_entry(&self.boards[position], draft)?;
        self.boards[position] = updated.clone();

        debug!("Updated board {}", id);
        self.mirror();
        Some(updated)
    }

    /// Empty the tally, reset the whole draft and drop the work-in-progress slot
    pub fn clear_all(&mut self) {
        self.boards.clear();
        self.form.reset_all(&mut self.draft);

        info!("Cleared tally");
        self.enqueue(WorkInProgressCommand::Clear);
        self.publish();
    }

    /// Swap in a whole new set of boards, e.g. an order loaded for editing
    pub fn replace_boards(&mut self, boards: Vec<BoardEntry>) {
        info!("Replacing tally with {} boards", boards.len());
        self.boards = boards;
        self.mirror();
    }

    pub fn total_board_feet(&self) -> f64 {
        shared::total_board_feet(&self.boards)
    }

    pub fn total_cost(&self) -> f64 {
        shared::total_cost(&self.boards)
    }

    pub fn summary(&self) -> TallySummary {
        TallySummary::from_boards(&self.boards)
    }

    /// Receiver that sees the latest summary after every mutation
    pub fn subscribe(&self) -> watch::Receiver<TallySummary> {
        self.summary.subscribe()
    }

    pub fn persistence_status(&self) -> PersistenceStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_persistence(&self) -> watch::Receiver<PersistenceStatus> {
        self.status.clone()
    }

    /// Wait until every queued write has been applied.
    ///
    /// Fails if any write since the previous flush failed.
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        let (reply, done) = oneshot::channel();
        if self.writer.send(WorkInProgressCommand::Flush(reply)).is_err() {
            return Err(PersistenceError::WriterStopped);
        }
        done.await.map_err(|_| PersistenceError::WriterStopped)?
    }

    fn mirror(&self) {
        self.enqueue(WorkInProgressCommand::Save(self.boards.clone()));
        self.publish();
    }

    fn enqueue(&self, command: WorkInProgressCommand) {
        if self.writer.send(command).is_err() {
            error!("Work-in-progress writer has stopped; change kept in memory only");
        }
    }

    fn publish(&self) {
        self.summary.send_replace(self.summary());
    }
}

async fn run_writer(
    storage: Arc<dyn WorkInProgressStorage>,
    mut commands: mpsc::UnboundedReceiver<WorkInProgressCommand>,
    status: watch::Sender<PersistenceStatus>,
) {
    let mut failure_since_flush: Option<String> = None;

    while let Some(command) = commands.recv().await {
        let result = match command {
            WorkInProgressCommand::Save(boards) => storage.save_work_in_progress(&boards).await,
            WorkInProgressCommand::Clear => storage.clear_work_in_progress().await,
            WorkInProgressCommand::Flush(reply) => {
                let outcome = match failure_since_flush.take() {
                    Some(message) => Err(PersistenceError::WriteFailed(message)),
                    None => Ok(()),
                };
                let _ = reply.send(outcome);
                continue;
            }
        };

        match result {
            Ok(()) => {
                status.send_replace(PersistenceStatus::Healthy);
            }
            Err(e) => {
                let message = e.to_string();
                error!("Failed to write work in progress: {}", message);
                failure_since_flush = Some(message.clone());
                status.send_replace(PersistenceStatus::Failed { message });
            }
        }
    }

    debug!("Work-in-progress writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::{sample_boards, TestEnvironment};
    use crate::storage::csv::WorkInProgressRepository;
    use anyhow::Result;
    use async_trait::async_trait;
    use shared::PricingType;

    struct FailingStorage;

    #[async_trait]
    impl WorkInProgressStorage for FailingStorage {
        async fn save_work_in_progress(&self, _boards: &[BoardEntry]) -> Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }

        async fn load_work_in_progress(&self) -> Result<Option<Vec<BoardEntry>>> {
            Ok(None)
        }

        async fn clear_work_in_progress(&self) -> Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }
    }

    async fn setup_test() -> (TallyService, Arc<WorkInProgressRepository>, TestEnvironment) {
        let env = TestEnvironment::new().await.unwrap();
        let storage = Arc::new(WorkInProgressRepository::new(env.connection.clone()));
        let tally = TallyService::restore(storage.clone()).await;
        (tally, storage, env)
    }

    fn fill_draft(tally: &mut TallyService, thickness: &str, width: &str, length: &str) {
        let draft = tally.draft_mut();
        draft.thickness = thickness.to_string();
        draft.width = width.to_string();
        draft.length = length.to_string();
    }

    #[tokio::test]
    async fn test_add_appends_and_resets_draft() {
        let (mut tally, storage, _env) = setup_test().await;
        fill_draft(&mut tally, "4", "6", "8");
        tally.draft_mut().price = "5".to_string();
        tally.draft_mut().wood_species = "Oak (Red)".to_string();

        let added = tally.add().unwrap();
        assert_eq!(added.board_feet(), 4.0);
        assert_eq!(tally.boards().len(), 1);
        assert_eq!(tally.total_board_feet(), 4.0);
        assert_eq!(tally.total_cost(), 20.0);

        // Dimensions reset, price and species kept
        assert_eq!(tally.draft().thickness, "");
        assert_eq!(tally.draft().quantity, "1");
        assert_eq!(tally.draft().price, "5");
        assert_eq!(tally.draft().wood_species, "Oak (Red)");

        tally.flush().await.unwrap();
        let stored = storage.load_work_in_progress().await.unwrap().unwrap();
        assert_eq!(stored, tally.boards());
    }

    #[tokio::test]
    async fn test_add_with_invalid_draft_changes_nothing() {
        let (mut tally, _storage, _env) = setup_test().await;
        fill_draft(&mut tally, "4", "0", "8");

        assert!(!tally.can_add());
        assert!(tally.add().is_none());
        assert!(tally.boards().is_empty());
        assert_eq!(tally.draft().width, "0");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (mut tally, storage, _env) = setup_test().await;
        fill_draft(&mut tally, "4", "6", "8");
        let first = tally.add().unwrap();
        fill_draft(&mut tally, "8", "5", "10");
        let second = tally.add().unwrap();

        assert!(tally.remove(&first.id));
        let after_once = tally.boards().to_vec();
        assert!(!tally.remove(&first.id));
        assert_eq!(tally.boards(), after_once.as_slice());
        assert_eq!(tally.boards()[0].id, second.id);

        tally.flush().await.unwrap();
        let stored = storage.load_work_in_progress().await.unwrap().unwrap();
        assert_eq!(stored, after_once);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_unit() {
        let (mut tally, _storage, _env) = setup_test().await;
        fill_draft(&mut tally, "4", "6", "8");
        let original = tally.add().unwrap();

        let mut edit = tally.draft_for(&original.id).unwrap();
        assert_eq!(edit.thickness, "4.0");
        edit.length = "12".to_string();
        edit.pricing_type = PricingType::Linear;

        let updated = tally.update(&original.id, &edit).unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.unit, original.unit);
        assert_eq!(updated.length, 12.0);
        assert_eq!(tally.boards(), &[updated.clone()]);

        // Unknown id and invalid drafts leave the tally alone
        assert!(tally.update("missing", &edit).is_none());
        edit.length = "-1".to_string();
        assert!(tally.update(&original.id, &edit).is_none());
        assert_eq!(tally.boards(), &[updated]);
    }

    #[tokio::test]
    async fn test_clear_all_removes_slot() {
        let (mut tally, storage, env) = setup_test().await;
        fill_draft(&mut tally, "4", "6", "8");
        tally.draft_mut().price = "5".to_string();
        tally.add().unwrap();
        tally.flush().await.unwrap();
        assert!(env.connection.work_in_progress_path().exists());

        tally.clear_all();
        tally.flush().await.unwrap();

        assert!(tally.boards().is_empty());
        assert_eq!(tally.draft().price, "");
        assert!(storage.load_work_in_progress().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_resumes_previous_session() {
        let env = TestEnvironment::new().await.unwrap();
        let storage = Arc::new(WorkInProgressRepository::new(env.connection.clone()));
        let boards = sample_boards();
        storage.save_work_in_progress(&boards).await.unwrap();

        let tally = TallyService::restore(storage).await;

        assert_eq!(tally.boards(), boards.as_slice());
        assert_eq!(tally.summary().board_count, 4);
    }

    #[tokio::test]
    async fn test_restore_from_corrupt_slot_is_empty() {
        let env = TestEnvironment::new().await.unwrap();
        std::fs::write(env.connection.work_in_progress_path(), "id,length\nnot,a board\n").unwrap();
        let storage = Arc::new(WorkInProgressRepository::new(env.connection.clone()));

        let tally = TallyService::restore(storage).await;

        assert!(tally.boards().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_each_change() {
        let (mut tally, _storage, _env) = setup_test().await;
        let mut updates = tally.subscribe();

        tally.replace_boards(sample_boards());
        assert!(updates.has_changed().unwrap());
        let summary = *updates.borrow_and_update();
        assert_eq!(summary, tally.summary());
        assert_eq!(summary.board_count, 4);

        tally.clear_all();
        assert_eq!(updates.borrow_and_update().board_count, 0);
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_without_touching_tally() {
        let mut tally = TallyService::restore(Arc::new(FailingStorage)).await;
        fill_draft(&mut tally, "4", "6", "8");

        assert!(tally.add().is_some());
        let result = tally.flush().await;

        assert!(matches!(result, Err(PersistenceError::WriteFailed(_))));
        assert_eq!(
            tally.persistence_status(),
            PersistenceStatus::Failed {
                message: "disk full".to_string()
            }
        );
        assert_eq!(tally.boards().len(), 1);

        // The failure is reported once
        assert!(tally.flush().await.is_ok());
    }
}
