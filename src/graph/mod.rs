//! Read-only schema graph model: entities, fields, and foreign-key edges.
//!
//! The graph is produced by an external introspection step and arrives as a
//! JSON export. Nothing in this crate mutates it; every run derives fresh
//! metadata from the same input.

pub mod annotations;
mod loader;

pub use annotations::{
    ColumnSpec, DeleteRule, InsertRule, Operation, RoleGrant, RuleTemplate, SelectRule, UpdateRule,
};
pub use loader::load_graph;

use crate::error::{HasuraSyncError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// How many rows the far side of an edge can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    ToOne,
    ToMany,
}

/// Whether the edge is declared on this entity or mirrors a declaration on
/// the target entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Inverse,
}

/// Whether the foreign-key column lives on this entity's table or on the
/// other side of the relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    Owning,
    Referencing,
}

/// A typed column declared by an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub column: String,
}

/// A directed relationship between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub name: String,
    pub multiplicity: Multiplicity,
    pub direction: Direction,
    pub ownership: Ownership,
    /// Physical table the relationship resolves to; the join table for
    /// association edges.
    pub target_table: String,
    /// Foreign-key columns of the relationship.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Foreign-key columns declared by the inverse edge, when one exists.
    #[serde(default)]
    pub inverse_columns: Vec<String>,
    /// Relationship realized through a join table (many-to-many).
    #[serde(default)]
    pub association: bool,
}

impl Edge {
    pub fn fk_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }

    /// Permission rules cascade over edges declared here whose FK lives on
    /// the other side: the target rows belong to this entity.
    pub fn propagates_permissions(&self) -> bool {
        self.direction == Direction::Forward && self.ownership == Ownership::Referencing
    }
}

/// A named node of the graph, backed by exactly one physical table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Optional role-scoped permission annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<RoleGrant>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl Entity {
    /// Candidate set for an all-columns policy: the primary key, every
    /// declared field's column, and every FK column owned by an outgoing
    /// edge. Duplicate-free and sorted.
    pub fn complete_columns(&self) -> Vec<String> {
        let mut columns = BTreeSet::new();
        columns.insert(self.primary_key.clone());
        for field in &self.fields {
            columns.insert(field.column.clone());
        }
        for edge in &self.edges {
            if edge.ownership == Ownership::Owning {
                for column in &edge.columns {
                    columns.insert(column.clone());
                }
            }
        }
        columns.into_iter().collect()
    }
}

/// A physical table, entity-backed or not (e.g. a pure join table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationalTable {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// The full schema graph: entities plus the complete relational table list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaGraph {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub tables: Vec<RelationalTable>,
}

impl SchemaGraph {
    pub fn is_entity_table(&self, table: &str) -> bool {
        self.entities.iter().any(|entity| entity.table == table)
    }

    /// Structural checks performed once at load time. The graph is rejected
    /// when entity tables are missing, duplicated, or absent from the
    /// relational table list, or when an edge disagrees with its inverse on
    /// the FK column set.
    pub fn validate(&self) -> Result<()> {
        let table_names: HashSet<&str> =
            self.tables.iter().map(|table| table.name.as_str()).collect();
        let mut entity_tables = HashSet::new();

        for entity in &self.entities {
            if entity.table.is_empty() {
                return Err(HasuraSyncError::GraphValidation(format!(
                    "entity {} has no table",
                    entity.name
                )));
            }
            if !entity_tables.insert(entity.table.as_str()) {
                return Err(HasuraSyncError::GraphValidation(format!(
                    "table {} is mapped by more than one entity",
                    entity.table
                )));
            }
            if !table_names.contains(entity.table.as_str()) {
                return Err(HasuraSyncError::GraphValidation(format!(
                    "entity {} table {} is missing from the relational table list",
                    entity.name, entity.table
                )));
            }

            for edge in &entity.edges {
                if edge.target_table.is_empty() {
                    return Err(HasuraSyncError::GraphValidation(format!(
                        "edge {} on entity {} has no target table",
                        edge.name, entity.name
                    )));
                }
                if !edge.association
                    && !edge.columns.is_empty()
                    && !edge.inverse_columns.is_empty()
                    && edge.columns != edge.inverse_columns
                {
                    return Err(HasuraSyncError::GraphValidation(format!(
                        "edge {} on entity {} disagrees with its inverse on FK columns ({:?} vs {:?})",
                        edge.name, entity.name, edge.columns, edge.inverse_columns
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, table: &str) -> Entity {
        Entity {
            name: name.to_string(),
            table: table.to_string(),
            primary_key: "id".to_string(),
            fields: vec![],
            edges: vec![],
            permissions: None,
        }
    }

    fn graph_with(entities: Vec<Entity>, tables: &[&str]) -> SchemaGraph {
        SchemaGraph {
            entities,
            tables: tables
                .iter()
                .map(|name| RelationalTable {
                    name: name.to_string(),
                    columns: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn test_complete_columns_sorted_and_deduped() {
        let mut user = entity("User", "users");
        user.fields = vec![
            Field {
                name: "email".to_string(),
                column: "email".to_string(),
            },
            Field {
                name: "name".to_string(),
                column: "name".to_string(),
            },
        ];
        user.edges = vec![Edge {
            name: "organization".to_string(),
            multiplicity: Multiplicity::ToOne,
            direction: Direction::Forward,
            ownership: Ownership::Owning,
            target_table: "organizations".to_string(),
            columns: vec!["organization_id".to_string(), "email".to_string()],
            inverse_columns: vec![],
            association: false,
        }];

        assert_eq!(
            user.complete_columns(),
            vec!["email", "id", "name", "organization_id"]
        );
    }

    #[test]
    fn test_validate_rejects_duplicate_entity_table() {
        let graph = graph_with(
            vec![entity("User", "users"), entity("Account", "users")],
            &["users"],
        );
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_relational_table() {
        let graph = graph_with(vec![entity("User", "users")], &["notes"]);
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverse_fk_mismatch() {
        let mut user = entity("User", "users");
        user.edges = vec![Edge {
            name: "notes".to_string(),
            multiplicity: Multiplicity::ToMany,
            direction: Direction::Forward,
            ownership: Ownership::Referencing,
            target_table: "notes".to_string(),
            columns: vec!["user_id".to_string()],
            inverse_columns: vec!["author_id".to_string()],
            association: false,
        }];
        let graph = graph_with(vec![user], &["users", "notes"]);
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_consistent_graph() {
        let mut user = entity("User", "users");
        user.edges = vec![Edge {
            name: "notes".to_string(),
            multiplicity: Multiplicity::ToMany,
            direction: Direction::Forward,
            ownership: Ownership::Referencing,
            target_table: "notes".to_string(),
            columns: vec!["user_id".to_string()],
            inverse_columns: vec!["user_id".to_string()],
            association: false,
        }];
        let graph = graph_with(vec![user], &["users", "notes"]);
        assert!(graph.validate().is_ok());
    }
}
