//! Locks command implementation
//!
//! Lists dataset locks and releases stuck ones.

use super::{connect, load_checked};
use crate::core::locks::LockManager;
use crate::domain::{DatasetId, DatasetLock, LockFilter, LockReason, UserId};
use clap::{Args, Subcommand};

/// Arguments for the locks command
#[derive(Args, Debug)]
pub struct LocksArgs {
    #[command(subcommand)]
    pub action: LocksAction,
}

#[derive(Subcommand, Debug)]
pub enum LocksAction {
    /// List locks, optionally filtered
    List {
        #[arg(long)]
        dataset: Option<DatasetId>,

        #[arg(long)]
        reason: Option<LockReason>,

        #[arg(long)]
        user: Option<UserId>,
    },

    /// Remove every lock of one reason from a dataset
    Release {
        #[arg(long)]
        dataset: DatasetId,

        #[arg(long)]
        reason: LockReason,
    },
}

impl LocksArgs {
    /// Execute the locks command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_checked(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let stores = match connect(&config).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let manager = LockManager::new(stores.locks);

        match &self.action {
            LocksAction::List { dataset, reason, user } => {
                let filter = LockFilter {
                    dataset_id: *dataset,
                    reason: *reason,
                    user_id: *user,
                };
                let locks = manager.list_locks(filter).await?;
                if locks.is_empty() {
                    println!("No locks found");
                }
                for lock in &locks {
                    println!("{}", Self::describe(lock));
                }
                Ok(0)
            }
            LocksAction::Release { dataset, reason } => {
                let removed = manager.remove_locks(*dataset, *reason).await?;
                tracing::info!(dataset_id = %dataset, reason = %reason, removed = removed.len(), "Locks released from CLI");
                println!("🔓 Released {} {} lock(s) on {}", removed.len(), reason, dataset);
                Ok(0)
            }
        }
    }

    fn describe(lock: &DatasetLock) -> String {
        format!(
            "{}  {:<22} since {}  user={}  {}",
            lock.dataset_id,
            lock.reason.as_str(),
            lock.start_time.format("%Y-%m-%d %H:%M:%S"),
            lock.user_id.map(|u| u.to_string()).unwrap_or_else(|| "-".into()),
            lock.info.as_deref().unwrap_or("")
        )
    }
}
