//! The staged sync pipeline and offline metadata generation.
//!
//! An apply run replays the whole graph against the store in four stages:
//! prelude (untrack or clear), track, customize (naming plus relationships),
//! and permissions. Each stage is a dispatch round; a rejected batch is
//! logged and the run moves on.

use crate::client::MetadataClient;
use crate::config::RuntimeConfig;
use crate::dispatch::{BatchKind, CommandGroup, DispatchSummary, Dispatcher};
use crate::error::Result;
use crate::graph::SchemaGraph;
use crate::metadata::commands::{
    ClearMetadataArgs, MetadataCommand, TableCustomizationArgs, TrackTableArgs, UntrackTableArgs,
};
use crate::metadata::{
    DeletePermission, InsertPermission, MetadataBody, MetadataDocument, PermissionEntry,
    QualifiedTable, SelectPermission, SourceEntry, TableDefinition, UpdatePermission,
};
use crate::metadata::commands::{ArrayRelationshipArgs, ObjectRelationshipArgs};
use crate::permissions;
use crate::synthesis;
use log::info;
use serde_json::json;

pub struct Runtime<C: MetadataClient> {
    client: C,
    config: RuntimeConfig,
}

impl<C: MetadataClient> Runtime<C> {
    pub fn new(client: C, config: RuntimeConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Replays the full graph against the store: prelude, track, customize,
    /// permissions. Returns the merged dispatch summary.
    pub async fn perform_full_metadata_transform(
        &self,
        graph: &SchemaGraph,
        clear_first: bool,
    ) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary::default();

        info!("[1] resetting tracked state");
        summary.merge(self.prelude(graph, clear_first).await?);

        info!("[2] tracking tables");
        summary.merge(self.track_all_tables(graph).await?);

        info!("[3] customizing tables and relationships");
        summary.merge(self.customize_all_tables(graph).await?);

        info!("[4] creating permissions");
        summary.merge(self.permissions_for_all_tables(graph).await?);

        info!(
            "done: {} batches, {} rejected, {} failed, {} commands accepted",
            summary.batches_attempted,
            summary.batches_rejected,
            summary.batches_failed,
            summary.commands_submitted
        );
        Ok(summary)
    }

    /// Clears all store metadata. Destructive; used by the reset command.
    pub async fn clear_metadata(&self) -> Result<DispatchSummary> {
        self.dispatcher()
            .dispatch(vec![CommandGroup::new(
                BatchKind::ClearMetadata,
                vec![MetadataCommand::ClearMetadata(ClearMetadataArgs::default())],
            )])
            .await
    }

    async fn prelude(&self, graph: &SchemaGraph, clear_first: bool) -> Result<DispatchSummary> {
        if clear_first {
            return self.clear_metadata().await;
        }

        let commands = graph
            .tables
            .iter()
            .map(|table| {
                MetadataCommand::PgUntrackTable(UntrackTableArgs {
                    table: QualifiedTable::new(&self.config.schema, &table.name),
                    source: self.config.source.clone(),
                    cascade: true,
                })
            })
            .collect();

        self.dispatcher()
            .dispatch(vec![CommandGroup::new(BatchKind::UntrackTables, commands)])
            .await
    }

    async fn track_all_tables(&self, graph: &SchemaGraph) -> Result<DispatchSummary> {
        let commands = graph
            .tables
            .iter()
            .map(|table| {
                MetadataCommand::PgTrackTable(TrackTableArgs {
                    table: QualifiedTable::new(&self.config.schema, &table.name),
                    source: self.config.source.clone(),
                })
            })
            .collect();

        self.dispatcher()
            .dispatch(vec![CommandGroup::new(BatchKind::TrackTables, commands)])
            .await
    }

    async fn customize_all_tables(&self, graph: &SchemaGraph) -> Result<DispatchSummary> {
        let definitions = synthesis::table_definitions(graph, &self.config.schema)?;

        let mut customizations = Vec::new();
        let mut object_relationships = Vec::new();
        let mut array_relationships = Vec::new();

        for definition in definitions {
            if let Some(configuration) = definition.configuration {
                customizations.push(MetadataCommand::PgSetTableCustomization(
                    TableCustomizationArgs {
                        table: definition.table.clone(),
                        source: self.config.source.clone(),
                        configuration,
                    },
                ));
            }
            for relationship in definition.object_relationships {
                object_relationships.push(MetadataCommand::PgCreateObjectRelationship(
                    ObjectRelationshipArgs {
                        table: definition.table.clone(),
                        source: self.config.source.clone(),
                        name: relationship.name,
                        using: relationship.using,
                    },
                ));
            }
            for relationship in definition.array_relationships {
                array_relationships.push(MetadataCommand::PgCreateArrayRelationship(
                    ArrayRelationshipArgs {
                        table: definition.table.clone(),
                        source: self.config.source.clone(),
                        name: relationship.name,
                        using: relationship.using,
                    },
                ));
            }
        }

        self.dispatcher()
            .dispatch(vec![
                CommandGroup::new(BatchKind::CustomizeTables, customizations),
                CommandGroup::new(BatchKind::ObjectRelationships, object_relationships),
                CommandGroup::new(BatchKind::ArrayRelationships, array_relationships),
            ])
            .await
    }

    async fn permissions_for_all_tables(&self, graph: &SchemaGraph) -> Result<DispatchSummary> {
        let batches =
            permissions::derive_permissions(graph, &self.config.source, &self.config.schema);
        info!("derived {} permission commands", batches.total());

        self.dispatcher()
            .dispatch(vec![
                CommandGroup::new(BatchKind::InsertPermissions, batches.insert),
                CommandGroup::new(BatchKind::SelectPermissions, batches.select),
                CommandGroup::new(BatchKind::UpdatePermissions, batches.update),
                CommandGroup::new(BatchKind::DeletePermissions, batches.delete),
            ])
            .await
    }

    fn dispatcher(&self) -> Dispatcher<'_, C> {
        Dispatcher::new(&self.client)
    }
}

/// Builds a complete metadata document offline, without touching a store.
/// When `default_role` is given, every table gets a minimal open permission
/// set for that role.
pub fn generate_metadata_document(
    graph: &SchemaGraph,
    config: &RuntimeConfig,
    default_role: Option<&str>,
) -> Result<MetadataDocument> {
    let mut tables = synthesis::table_definitions(graph, &config.schema)?;

    if let Some(role) = default_role {
        for definition in &mut tables {
            attach_minimal_permissions(definition, graph, role);
        }
    }

    Ok(MetadataDocument {
        resource_version: 1,
        metadata: MetadataBody {
            version: 3,
            sources: vec![SourceEntry {
                name: config.source.clone(),
                kind: "postgres".to_string(),
                tables,
            }],
        },
    })
}

/// Open CRUD permissions over every column of the table, for bootstrap use.
fn attach_minimal_permissions(definition: &mut TableDefinition, graph: &SchemaGraph, role: &str) {
    let columns: Vec<String> = graph
        .tables
        .iter()
        .find(|table| table.name == definition.table.name)
        .map(|table| table.columns.clone())
        .unwrap_or_default();

    definition.insert_permissions.push(PermissionEntry {
        role: role.to_string(),
        permission: InsertPermission {
            check: json!({}),
            set: Default::default(),
            columns: columns.clone(),
            backend_only: false,
        },
    });
    definition.select_permissions.push(PermissionEntry {
        role: role.to_string(),
        permission: SelectPermission {
            columns: columns.clone(),
            filter: json!({}),
            computed_fields: vec![],
            limit: None,
            allow_aggregations: true,
        },
    });
    definition.update_permissions.push(PermissionEntry {
        role: role.to_string(),
        permission: UpdatePermission {
            columns: columns.clone(),
            filter: json!({}),
            check: Some(json!({})),
            set: Default::default(),
        },
    });
    definition.delete_permissions.push(PermissionEntry {
        role: role.to_string(),
        permission: DeletePermission { filter: json!({}) },
    });
}
