//! Defect ledger of a trade's current acceptance cycle.

use bw_client_api::ClientApi;
use bw_rest_api_contract::{Defect, DefectId, DefectResolutionUpdate, MilestoneId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    defect: Defect,
    /// Resolved flag as last known on the server.
    persisted_resolved: bool,
}

impl LedgerEntry {
    fn new(defect: Defect) -> Self {
        let persisted_resolved = defect.resolved;
        Self {
            defect,
            persisted_resolved,
        }
    }

    pub fn id(&self) -> DefectId {
        self.defect.id
    }

    pub fn defect(&self) -> &Defect {
        &self.defect
    }

    /// Local flag, possibly not yet persisted.
    pub fn is_resolved(&self) -> bool {
        self.defect.resolved
    }

    pub fn is_persisted(&self) -> bool {
        self.defect.resolved == self.persisted_resolved
    }
}

/// A defect write that failed while the rest of the batch went on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefectFailure {
    pub defect_id: Option<DefectId>,
    pub title: String,
    pub error: String,
}

/// Outcome of a batch of independent defect writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub persisted: Vec<DefectId>,
    pub failed: Vec<DefectFailure>,
}

impl ResolutionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<DefectId> {
        self.failed.iter().filter_map(|f| f.defect_id).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DefectLedger {
    entries: Vec<LedgerEntry>,
    frozen: bool,
}

impl DefectLedger {
    pub fn new(defects: Vec<Defect>) -> Self {
        Self {
            entries: defects.into_iter().map(LedgerEntry::new).collect(),
            frozen: false,
        }
    }

    /// Fetch the ledger. A failed read yields an empty ledger.
    pub async fn load<C: ClientApi + ?Sized>(client: &C, milestone_id: MilestoneId) -> Self {
        match client.list_defects(milestone_id).await {
            Ok(defects) => {
                debug!(%milestone_id, count = defects.len(), "loaded defect ledger");
                Self::new(defects)
            }
            Err(e) => {
                warn!(%milestone_id, error = %e, "could not load defects, treating ledger as empty");
                Self::default()
            }
        }
    }

    /// Stop accepting local edits; the ledger is history from now on.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: DefectId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn defects(&self) -> Vec<Defect> {
        self.entries.iter().map(|e| e.defect.clone()).collect()
    }

    pub fn all_resolved(&self) -> bool {
        self.entries.iter().all(LedgerEntry::is_resolved)
    }

    /// Flip one defect's local resolved flag and return the new value.
    pub fn toggle_resolved(&mut self, id: DefectId) -> Result<bool, Error> {
        if self.frozen {
            return Err(Error::LedgerFrozen);
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or(Error::UnknownDefect(id))?;
        entry.defect.resolved = !entry.defect.resolved;
        Ok(entry.defect.resolved)
    }

    /// Defects marked resolved locally but not on the server.
    pub fn pending_resolutions(&self) -> Vec<DefectId> {
        self.entries
            .iter()
            .filter(|e| e.defect.resolved && !e.persisted_resolved)
            .map(LedgerEntry::id)
            .collect()
    }

    /// Persist every pending resolution, one request per defect.
    ///
    /// A failed write does not stop the batch; it is recorded in the report
    /// and the defect stays pending.
    pub async fn persist_resolutions<C: ClientApi + ?Sized>(
        &mut self,
        client: &C,
        resolution_notes: &str,
    ) -> ResolutionReport {
        let mut report = ResolutionReport::default();

        for entry in self.entries.iter_mut().filter(|e| e.defect.resolved && !e.persisted_resolved) {
            let update = DefectResolutionUpdate {
                resolved: true,
                resolution_notes: resolution_notes.to_string(),
            };
            match client.update_defect(entry.id(), &update).await {
                Ok(()) => {
                    entry.persisted_resolved = true;
                    entry.defect.resolution_notes = Some(update.resolution_notes);
                    report.persisted.push(entry.id());
                }
                Err(e) => {
                    warn!(defect_id = %entry.id(), error = %e, "failed to persist defect resolution");
                    report.failed.push(DefectFailure {
                        defect_id: Some(entry.id()),
                        title: entry.defect.title.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}
