//! Versioned holder for a trade's completion status.
//!
//! The server owns the status; the client mirrors it and updates it
//! optimistically. Every change bumps a local version so that stale fetch
//! results and late rollbacks can be detected instead of blindly overwriting
//! newer state.

use bw_rest_api_contract::CompletionStatus;
use tokio::sync::watch;

/// Status plus the local version it was published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: CompletionStatus,
    pub version: u64,
}

/// Issued when a fetch starts; results are applied only if still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// State before an optimistic update, for rolling it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    previous: CompletionStatus,
    version: u64,
}

impl Checkpoint {
    pub fn previous(&self) -> CompletionStatus {
        self.previous
    }
}

/// What applying a server response did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed(StatusSnapshot),
    Unchanged,
    /// A newer fetch or local update already superseded this response.
    Stale,
}

#[derive(Debug)]
pub struct StatusCell {
    status: CompletionStatus,
    version: u64,
    issued_fetches: u64,
    applied_fetch: u64,
    server_revision: Option<u64>,
    tx: watch::Sender<StatusSnapshot>,
}

impl StatusCell {
    pub fn new(status: CompletionStatus) -> Self {
        let (tx, _rx) = watch::channel(StatusSnapshot { status, version: 0 });
        Self {
            status,
            version: 0,
            issued_fetches: 0,
            applied_fetch: 0,
            server_revision: None,
            tx,
        }
    }

    pub fn status(&self) -> CompletionStatus {
        self.status
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: self.status,
            version: self.version,
        }
    }

    /// Receive every applied change.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.tx.subscribe()
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued_fetches += 1;
        FetchTicket(self.issued_fetches)
    }

    /// Apply an authoritative status fetched under `ticket`.
    ///
    /// Responses to fetches older than the last applied one, or issued
    /// before the last local update, are discarded. When the server reports
    /// a revision, a lower revision than already seen is discarded too.
    pub fn apply_server(
        &mut self,
        ticket: FetchTicket,
        status: CompletionStatus,
        revision: Option<u64>,
    ) -> Applied {
        if ticket.0 <= self.applied_fetch {
            return Applied::Stale;
        }
        if let (Some(revision), Some(seen)) = (revision, self.server_revision) {
            if revision < seen {
                return Applied::Stale;
            }
        }

        self.applied_fetch = ticket.0;
        if revision.is_some() {
            self.server_revision = revision;
        }
        self.set(status)
    }

    /// Move to `to` ahead of the server's confirmation.
    pub fn apply_optimistic(&mut self, to: CompletionStatus) -> Checkpoint {
        let previous = self.status;
        // fetches started before this update must not undo it
        self.applied_fetch = self.issued_fetches;
        self.set(to);
        Checkpoint {
            previous,
            version: self.version,
        }
    }

    /// Undo an optimistic update, unless something newer was applied since.
    pub fn rollback(&mut self, checkpoint: Checkpoint) -> bool {
        if self.version != checkpoint.version {
            return false;
        }
        self.set(checkpoint.previous);
        true
    }

    fn set(&mut self, status: CompletionStatus) -> Applied {
        if status == self.status {
            return Applied::Unchanged;
        }
        self.status = status;
        self.version += 1;
        let snapshot = self.snapshot();
        self.tx.send_replace(snapshot);
        Applied::Changed(snapshot)
    }
}
