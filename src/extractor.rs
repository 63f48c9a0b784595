//! Extraction orchestrator.
//!
//! One cycle fetches the workspace's users and projects concurrently under a
//! shared deadline, serializes every entity, and writes each one to storage
//! under a deterministic name. Re-running a cycle overwrites files in place;
//! entities deleted on the remote side are never pruned.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
#[cfg(test)]
use mockall::automock;
use tracing::{debug, error, info};

use crate::deadline::Deadline;
use crate::error::{Error, Result};
use crate::models::{Project, User};
use crate::storage::Storage;

const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(60);

/// The listing surface the orchestrator needs from an API client.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkspaceClient: Send + Sync {
    async fn list_users(&self, deadline: Deadline) -> Result<Vec<User>>;
    async fn list_projects(&self, deadline: Deadline) -> Result<Vec<Project>>;
}

/// Drives one full extraction cycle: fetch, serialize, persist.
#[derive(Clone)]
pub struct Extractor {
    client: Arc<dyn WorkspaceClient>,
    storage: Arc<dyn Storage>,
    cycle_timeout: Duration,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("cycle_timeout", &self.cycle_timeout)
            .finish_non_exhaustive()
    }
}

impl Extractor {
    pub fn new(client: Arc<dyn WorkspaceClient>, storage: Arc<dyn Storage>) -> Self {
        Self {
            client,
            storage,
            cycle_timeout: DEFAULT_CYCLE_TIMEOUT,
        }
    }

    /// Override the wall-clock budget for one cycle.
    pub fn with_timeout(mut self, cycle_timeout: Duration) -> Self {
        self.cycle_timeout = cycle_timeout;
        self
    }

    /// Trigger entry point: run one cycle and log the outcome. Callable
    /// repeatedly; every call is an independent cycle.
    pub async fn run_extraction_cycle(&self) {
        match self.extract_all().await {
            Ok(()) => info!("extraction cycle complete"),
            Err(e) => error!(error = %e, "extraction cycle failed"),
        }
    }

    /// Run the users and projects extractions concurrently under one shared
    /// deadline. Both tasks always run to completion; if any failed, the
    /// first observed error is returned.
    pub async fn extract_all(&self) -> Result<()> {
        let deadline = Deadline::after(self.cycle_timeout);
        debug!("starting extraction cycle");

        let mut tasks = FuturesUnordered::new();

        let users = self.clone();
        tasks.push(tokio::spawn(
            async move { users.extract_users(deadline).await },
        ));

        let projects = self.clone();
        tasks.push(tokio::spawn(async move {
            projects.extract_projects(deadline).await
        }));

        let mut first_error = None;
        while let Some(joined) = tasks.next().await {
            let outcome = joined.unwrap_or_else(|e| {
                Err(Error::Request(format!("extraction task panicked: {e}")))
            });
            if let Err(e) = outcome {
                error!(error = %e, "entity extraction failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Fetch all users and persist one file per user. The first failed
    /// write aborts the remaining users; earlier writes are kept.
    pub async fn extract_users(&self, deadline: Deadline) -> Result<()> {
        debug!("extracting users");
        let users = self.client.list_users(deadline).await?;
        info!(count = users.len(), "fetched users");

        for user in &users {
            let bytes = serde_json::to_vec(user)?;
            self.storage
                .save(&format!("user_{}.json", user.gid), &bytes)
                .await?;
        }

        Ok(())
    }

    /// Fetch all projects and persist one file per project.
    pub async fn extract_projects(&self, deadline: Deadline) -> Result<()> {
        debug!("extracting projects");
        let projects = self.client.list_projects(deadline).await?;
        info!(count = projects.len(), "fetched projects");

        for project in &projects {
            let bytes = serde_json::to_vec(project)?;
            self.storage
                .save(&format!("project_{}.json", project.gid), &bytes)
                .await?;
        }

        Ok(())
    }
}
