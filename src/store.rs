use crate::error::{FarmReportError, Result};
use crate::schema::DashboardData;
use futures::future::{self, BoxFuture, FutureExt};
use log::{info, warn};
use std::collections::HashSet;

/// The remote collaborator that owns persistence.
pub trait DataSource {
    fn load_dashboard_data(&self) -> BoxFuture<'_, Result<DashboardData>>;
}

/// A source that always returns the same collections. Useful for fixtures and demos.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    data: DashboardData,
}

impl InMemorySource {
    pub fn new(data: DashboardData) -> Self {
        Self { data }
    }
}

impl DataSource for InMemorySource {
    fn load_dashboard_data(&self) -> BoxFuture<'_, Result<DashboardData>> {
        future::ready(Ok(self.data.clone())).boxed()
    }
}

/// Issued when a reload starts; its sequence number orders completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReloadTicket {
    seq: u64,
}

impl ReloadTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The response replaced the snapshot.
    Applied { seq: u64 },
    /// A newer response was already applied; this one was discarded.
    Stale { seq: u64, current: u64 },
}

impl ReloadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Holds the raw collections of one session. Snapshots are replaced wholesale.
#[derive(Debug, Default)]
pub struct EntityStore {
    snapshot: DashboardData,
    issued_seq: u64,
    applied_seq: u64,
    loaded: bool,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &DashboardData {
        &self.snapshot
    }

    /// Whether any load has succeeded yet.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.issued_seq += 1;
        ReloadTicket {
            seq: self.issued_seq,
        }
    }

    /// Applies a completed response unless a newer one already landed.
    /// Failures leave the current snapshot untouched.
    pub fn complete_reload(
        &mut self,
        ticket: ReloadTicket,
        response: Result<DashboardData>,
    ) -> Result<ReloadOutcome> {
        if ticket.seq <= self.applied_seq {
            warn!(
                "Discarding stale dashboard response #{} (current snapshot is #{})",
                ticket.seq, self.applied_seq
            );
            return Ok(ReloadOutcome::Stale {
                seq: ticket.seq,
                current: self.applied_seq,
            });
        }

        let data = response.map_err(into_unavailable).inspect_err(|e| {
            warn!("Dashboard reload #{} failed: {}", ticket.seq, e);
        })?;

        self.install(data)?;
        self.applied_seq = ticket.seq;
        Ok(ReloadOutcome::Applied { seq: ticket.seq })
    }

    pub async fn reload<S>(&mut self, source: &S) -> Result<ReloadOutcome>
    where
        S: DataSource + ?Sized,
    {
        let ticket = self.begin_reload();
        let response = source.load_dashboard_data().await;
        self.complete_reload(ticket, response)
    }

    /// Installs data directly, outside the ticket sequence.
    pub fn replace(&mut self, data: DashboardData) -> Result<()> {
        let ticket = self.begin_reload();
        self.complete_reload(ticket, Ok(data)).map(|_| ())
    }

    fn install(&mut self, mut data: DashboardData) -> Result<()> {
        data.validate()?;

        // Newest entries first; ties keep their source order.
        data.transactions.sort_by(|a, b| b.date.cmp(&a.date));

        let known: HashSet<&str> = data.properties.iter().map(|p| p.id.as_str()).collect();
        let dangling = data
            .productions
            .iter()
            .filter(|r| !known.contains(r.property_id.as_str()))
            .count();
        if dangling > 0 {
            warn!(
                "{} production records reference properties missing from the snapshot",
                dangling
            );
        }

        info!(
            "Loaded dashboard snapshot: {} properties, {} production records, {} transactions",
            data.properties.len(),
            data.productions.len(),
            data.transactions.len()
        );

        self.snapshot = data;
        self.loaded = true;
        Ok(())
    }
}

fn into_unavailable(error: FarmReportError) -> FarmReportError {
    match error {
        FarmReportError::DataUnavailable(_) | FarmReportError::InvalidRecord { .. } => error,
        other => FarmReportError::DataUnavailable(other.to_string()),
    }
}
