use std::sync::Arc;

use moka::future::Cache;
use tracing::debug;

use crate::domain::{AccessToken, TeamId};
use crate::errors::domain::DomainError;
use crate::repos::SharedPointsBackend;

const CAPACITY: u64 = 1024;

enum Miss {
    Unknown,
    Backend(DomainError),
}

/// Memoized team display names.
///
/// Only names the backend actually returned are cached; an unknown team falls
/// back to `"Team {id}"` and is asked for again next time.
#[derive(Clone)]
pub struct TeamNameCache {
    backend: SharedPointsBackend,
    names: Cache<TeamId, String>,
}

impl TeamNameCache {
    pub fn new(backend: SharedPointsBackend) -> Self {
        Self {
            backend,
            names: Cache::builder().max_capacity(CAPACITY).build(),
        }
    }

    pub fn fallback_name(team_id: TeamId) -> String {
        format!("Team {team_id}")
    }

    /// Display name of `team_id`. Concurrent lookups of one team share a single backend call.
    pub async fn name(&self, token: &AccessToken, team_id: TeamId) -> Result<String, DomainError> {
        let backend = self.backend.clone();
        let loaded = self
            .names
            .try_get_with(team_id, async move {
                match backend.team_name(token, team_id).await {
                    Ok(Some(name)) => Ok(name),
                    Ok(None) => Err(Miss::Unknown),
                    Err(e) => Err(Miss::Backend(e)),
                }
            })
            .await;

        match loaded {
            Ok(name) => Ok(name),
            Err(miss) => match Arc::as_ref(&miss) {
                Miss::Unknown => {
                    debug!(team_id, "team has no name, using fallback");
                    Ok(Self::fallback_name(team_id))
                }
                Miss::Backend(e) => Err(e.clone()),
            },
        }
    }

    /// Resolve every distinct team among `team_ids`, in order.
    pub async fn names(
        &self,
        token: &AccessToken,
        team_ids: impl IntoIterator<Item = Option<TeamId>>,
    ) -> Result<Vec<Option<String>>, DomainError> {
        let mut out = Vec::new();
        for team_id in team_ids {
            out.push(match team_id {
                Some(id) => Some(self.name(token, id).await?),
                None => None,
            });
        }
        Ok(out)
    }

    #[cfg(test)]
    pub(crate) async fn cached_entries(&self) -> u64 {
        self.names.run_pending_tasks().await;
        self.names.entry_count()
    }
}

impl std::fmt::Debug for TeamNameCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamNameCache")
            .field("entries", &self.names.entry_count())
            .finish()
    }
}
