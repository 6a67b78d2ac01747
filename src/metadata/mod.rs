//! Wire types for the metadata store: table definitions, naming
//! configuration, relationships, and permission payloads.
//!
//! These structs serialize to the exact JSON shapes the store's metadata API
//! expects, both inside command arguments and in generated metadata files.

pub mod commands;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedTable {
    pub schema: String,
    pub name: String,
}

impl QualifiedTable {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }
}

impl std::fmt::Display for QualifiedTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// GraphQL root-field names for each CRUD operation of one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomRootFields {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub insert: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub insert_one: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub select: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub select_by_pk: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub select_aggregate: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub update: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub update_by_pk: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub delete: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub delete_by_pk: String,
}

/// Naming configuration for one table: display name, root fields, and the
/// physical-to-logical column name map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableConfiguration {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub custom_name: String,
    #[serde(default)]
    pub custom_root_fields: CustomRootFields,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_column_names: BTreeMap<String, String>,
}

/// Column reference for a to-one relationship: a local FK column, or a
/// column on a remote table when the FK lives on the other side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForeignKeyOn {
    Column(String),
    Remote {
        column: String,
        table: QualifiedTable,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRelUsing {
    pub foreign_key_constraint_on: ForeignKeyOn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRelationship {
    pub name: String,
    pub using: ObjectRelUsing,
}

/// A column on the remote table that points back at this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteColumn {
    pub column: String,
    pub table: QualifiedTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayRelUsing {
    pub foreign_key_constraint_on: RemoteColumn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayRelationship {
    pub name: String,
    pub using: ArrayRelUsing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertPermission {
    pub check: Value,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub set: Map<String, Value>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub backend_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectPermission {
    pub columns: Vec<String>,
    pub filter: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub computed_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default)]
    pub allow_aggregations: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePermission {
    pub columns: Vec<String>,
    pub filter: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub set: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletePermission {
    pub filter: Value,
}

/// Role-keyed permission entry as it appears in a metadata file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionEntry<P> {
    pub role: String,
    pub permission: P,
}

/// The synthesized unit for one physical table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub table: QualifiedTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<TableConfiguration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_relationships: Vec<ObjectRelationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub array_relationships: Vec<ArrayRelationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insert_permissions: Vec<PermissionEntry<InsertPermission>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub select_permissions: Vec<PermissionEntry<SelectPermission>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update_permissions: Vec<PermissionEntry<UpdatePermission>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete_permissions: Vec<PermissionEntry<DeletePermission>>,
}

impl TableDefinition {
    pub fn new(table: QualifiedTable, configuration: TableConfiguration) -> Self {
        Self {
            table,
            configuration: Some(configuration),
            object_relationships: Vec::new(),
            array_relationships: Vec::new(),
            insert_permissions: Vec::new(),
            select_permissions: Vec::new(),
            update_permissions: Vec::new(),
            delete_permissions: Vec::new(),
        }
    }
}

/// One data source in a generated metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub name: String,
    pub kind: String,
    pub tables: Vec<TableDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataBody {
    pub version: u64,
    pub sources: Vec<SourceEntry>,
}

/// Top-level shape of an exported metadata file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub resource_version: u64,
    pub metadata: MetadataBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_foreign_key_on_serialization() {
        let local = ForeignKeyOn::Column("user_id".to_string());
        assert_eq!(serde_json::to_value(&local).unwrap(), json!("user_id"));

        let remote = ForeignKeyOn::Remote {
            column: "user_id".to_string(),
            table: QualifiedTable::new("public", "notes"),
        };
        assert_eq!(
            serde_json::to_value(&remote).unwrap(),
            json!({"column": "user_id", "table": {"schema": "public", "name": "notes"}})
        );
    }

    #[test]
    fn test_table_definition_omits_empty_sections() {
        let definition = TableDefinition::new(
            QualifiedTable::new("public", "users"),
            TableConfiguration::default(),
        );
        let value = serde_json::to_value(&definition).unwrap();
        assert!(value.get("object_relationships").is_none());
        assert!(value.get("insert_permissions").is_none());
    }

    #[test]
    fn test_update_permission_omits_missing_check() {
        let permission = UpdatePermission {
            columns: vec!["title".to_string()],
            filter: json!({}),
            check: None,
            set: Map::new(),
        };
        let value = serde_json::to_value(&permission).unwrap();
        assert!(value.get("check").is_none());
    }
}
