//! Typed commands accepted by the metadata store, serialized as
//! `{"type": ..., "args": ...}` pairs.

use crate::metadata::{
    ArrayRelUsing, DeletePermission, InsertPermission, ObjectRelUsing, QualifiedTable,
    SelectPermission, TableConfiguration, UpdatePermission,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackTableArgs {
    pub table: QualifiedTable,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UntrackTableArgs {
    pub table: QualifiedTable,
    pub source: String,
    #[serde(default)]
    pub cascade: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCustomizationArgs {
    pub table: QualifiedTable,
    pub source: String,
    pub configuration: TableConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRelationshipArgs {
    pub table: QualifiedTable,
    pub source: String,
    pub name: String,
    pub using: ObjectRelUsing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayRelationshipArgs {
    pub table: QualifiedTable,
    pub source: String,
    pub name: String,
    pub using: ArrayRelUsing,
}

/// Arguments shared by the four create-permission commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionArgs<P> {
    pub table: QualifiedTable,
    pub role: String,
    pub source: String,
    pub permission: P,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClearMetadataArgs {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "snake_case")]
pub enum MetadataCommand {
    PgTrackTable(TrackTableArgs),
    PgUntrackTable(UntrackTableArgs),
    PgSetTableCustomization(TableCustomizationArgs),
    PgCreateObjectRelationship(ObjectRelationshipArgs),
    PgCreateArrayRelationship(ArrayRelationshipArgs),
    PgCreateInsertPermission(PermissionArgs<InsertPermission>),
    PgCreateSelectPermission(PermissionArgs<SelectPermission>),
    PgCreateUpdatePermission(PermissionArgs<UpdatePermission>),
    PgCreateDeletePermission(PermissionArgs<DeletePermission>),
    ClearMetadata(ClearMetadataArgs),
}

impl MetadataCommand {
    /// Wire name of the command, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MetadataCommand::PgTrackTable(_) => "pg_track_table",
            MetadataCommand::PgUntrackTable(_) => "pg_untrack_table",
            MetadataCommand::PgSetTableCustomization(_) => "pg_set_table_customization",
            MetadataCommand::PgCreateObjectRelationship(_) => "pg_create_object_relationship",
            MetadataCommand::PgCreateArrayRelationship(_) => "pg_create_array_relationship",
            MetadataCommand::PgCreateInsertPermission(_) => "pg_create_insert_permission",
            MetadataCommand::PgCreateSelectPermission(_) => "pg_create_select_permission",
            MetadataCommand::PgCreateUpdatePermission(_) => "pg_create_update_permission",
            MetadataCommand::PgCreateDeletePermission(_) => "pg_create_delete_permission",
            MetadataCommand::ClearMetadata(_) => "clear_metadata",
        }
    }

    /// The table a command targets, when it targets one.
    pub fn table(&self) -> Option<&QualifiedTable> {
        match self {
            MetadataCommand::PgTrackTable(args) => Some(&args.table),
            MetadataCommand::PgUntrackTable(args) => Some(&args.table),
            MetadataCommand::PgSetTableCustomization(args) => Some(&args.table),
            MetadataCommand::PgCreateObjectRelationship(args) => Some(&args.table),
            MetadataCommand::PgCreateArrayRelationship(args) => Some(&args.table),
            MetadataCommand::PgCreateInsertPermission(args) => Some(&args.table),
            MetadataCommand::PgCreateSelectPermission(args) => Some(&args.table),
            MetadataCommand::PgCreateUpdatePermission(args) => Some(&args.table),
            MetadataCommand::PgCreateDeletePermission(args) => Some(&args.table),
            MetadataCommand::ClearMetadata(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_track_table_wire_shape() {
        let command = MetadataCommand::PgTrackTable(TrackTableArgs {
            table: QualifiedTable::new("public", "users"),
            source: "default".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({
                "type": "pg_track_table",
                "args": {
                    "table": {"schema": "public", "name": "users"},
                    "source": "default"
                }
            })
        );
    }

    #[test]
    fn test_clear_metadata_wire_shape() {
        let command = MetadataCommand::ClearMetadata(ClearMetadataArgs::default());
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            json!({"type": "clear_metadata", "args": {}})
        );
    }

    #[test]
    fn test_select_permission_wire_shape() {
        let command = MetadataCommand::PgCreateSelectPermission(PermissionArgs {
            table: QualifiedTable::new("public", "notes"),
            role: "user".to_string(),
            source: "default".to_string(),
            permission: SelectPermission {
                columns: vec!["id".to_string(), "title".to_string()],
                filter: json!({"user": {"id": {"_eq": "X-Hasura-User-Id"}}}),
                computed_fields: vec![],
                limit: None,
                allow_aggregations: true,
            },
        });

        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["type"], "pg_create_select_permission");
        assert_eq!(value["args"]["role"], "user");
        assert_eq!(
            value["args"]["permission"]["filter"],
            json!({"user": {"id": {"_eq": "X-Hasura-User-Id"}}})
        );
    }
}
