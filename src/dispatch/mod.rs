//! Batch dispatch: submits grouped commands to the metadata store and keeps
//! going when a batch is rejected.
//!
//! The store applies a bulk envelope transactionally, so commands are grouped
//! by kind and submitted stage by stage. A rejected or failed batch is logged
//! with its payload and never aborts the run.

use crate::client::MetadataClient;
use crate::error::Result;
use crate::metadata::commands::MetadataCommand;
use log::{debug, info, warn};

/// The submission stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    ClearMetadata,
    UntrackTables,
    TrackTables,
    CustomizeTables,
    ObjectRelationships,
    ArrayRelationships,
    InsertPermissions,
    SelectPermissions,
    UpdatePermissions,
    DeletePermissions,
}

impl BatchKind {
    pub fn label(&self) -> &'static str {
        match self {
            BatchKind::ClearMetadata => "CLEAR metadata",
            BatchKind::UntrackTables => "UNTRACK tables",
            BatchKind::TrackTables => "TRACK tables",
            BatchKind::CustomizeTables => "CUSTOMIZE tables",
            BatchKind::ObjectRelationships => "OBJECT relationships",
            BatchKind::ArrayRelationships => "ARRAY relationships",
            BatchKind::InsertPermissions => "INSERT permissions",
            BatchKind::SelectPermissions => "SELECT permissions",
            BatchKind::UpdatePermissions => "UPDATE permissions",
            BatchKind::DeletePermissions => "DELETE permissions",
        }
    }
}

/// One batch of commands submitted together.
#[derive(Debug)]
pub struct CommandGroup {
    pub kind: BatchKind,
    pub commands: Vec<MetadataCommand>,
}

impl CommandGroup {
    pub fn new(kind: BatchKind, commands: Vec<MetadataCommand>) -> Self {
        Self { kind, commands }
    }
}

/// Counts accumulated over one or more dispatch rounds.
#[derive(Debug, Default, Clone, Copy)]
pub struct DispatchSummary {
    pub batches_attempted: usize,
    pub batches_rejected: usize,
    pub batches_failed: usize,
    pub commands_submitted: usize,
}

impl DispatchSummary {
    pub fn merge(&mut self, other: DispatchSummary) {
        self.batches_attempted += other.batches_attempted;
        self.batches_rejected += other.batches_rejected;
        self.batches_failed += other.batches_failed;
        self.commands_submitted += other.commands_submitted;
    }
}

pub struct Dispatcher<'a, C: MetadataClient> {
    client: &'a C,
}

impl<'a, C: MetadataClient> Dispatcher<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Submits each non-empty group in order. Rejections and transport
    /// failures are counted and logged; the remaining groups still run.
    pub async fn dispatch(&self, groups: Vec<CommandGroup>) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary::default();

        for group in groups {
            if group.commands.is_empty() {
                debug!("no commands for {}, skipping batch", group.kind.label());
                continue;
            }

            info!(
                "ready to submit {} commands: {}",
                group.commands.len(),
                group.kind.label()
            );
            summary.batches_attempted += 1;

            match self.client.submit_batch(&group.commands).await {
                Ok(outcome) if outcome.is_success() => {
                    summary.commands_submitted += group.commands.len();
                    debug!("{} accepted: {}", group.kind.label(), outcome.body);
                }
                Ok(outcome) => {
                    summary.batches_rejected += 1;
                    warn!(
                        "{} rejected with status {}: {}",
                        group.kind.label(),
                        outcome.status,
                        outcome.body
                    );
                    log_payload(&group);
                }
                Err(error) => {
                    summary.batches_failed += 1;
                    warn!("{} failed: {}", group.kind.label(), error);
                    log_payload(&group);
                }
            }
        }

        Ok(summary)
    }
}

fn log_payload(group: &CommandGroup) {
    match serde_json::to_string(&group.commands) {
        Ok(payload) => warn!("{} payload: {}", group.kind.label(), payload),
        Err(error) => warn!("{} payload unserializable: {}", group.kind.label(), error),
    }
}
