//! Permission derivation: turns entity role grants into create-permission
//! commands, cascading rules across referencing edges.
//!
//! A rule declared on an entity also applies to the rows it owns in other
//! tables. For every forward edge whose FK lives on the far side, the engine
//! clones the rule, swaps its columns for the edge's FK columns, and nests
//! its predicate under the relationship's navigation key so the target rows
//! are filtered through their owner.

use crate::graph::{
    ColumnSpec, DeleteRule, Edge, Entity, InsertRule, Operation, RuleTemplate, SchemaGraph,
    SelectRule, UpdateRule,
};
use crate::metadata::commands::{MetadataCommand, PermissionArgs};
use crate::metadata::{
    DeletePermission, InsertPermission, QualifiedTable, SelectPermission, UpdatePermission,
};
use log::{debug, warn};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

/// Per-run claim registry. Each (operation, table) pair carries at most one
/// permission per run; the first writer wins.
#[derive(Debug, Default)]
struct PermissionDedup {
    claimed: HashMap<Operation, HashSet<String>>,
}

impl PermissionDedup {
    fn try_claim(&mut self, operation: Operation, table: &str) -> bool {
        self.claimed
            .entry(operation)
            .or_default()
            .insert(table.to_string())
    }
}

/// Derived commands grouped by operation, in submission order.
#[derive(Debug, Default)]
pub struct PermissionBatches {
    pub insert: Vec<MetadataCommand>,
    pub select: Vec<MetadataCommand>,
    pub update: Vec<MetadataCommand>,
    pub delete: Vec<MetadataCommand>,
}

impl PermissionBatches {
    fn push(&mut self, operation: Operation, command: MetadataCommand) {
        match operation {
            Operation::Insert => self.insert.push(command),
            Operation::Select => self.select.push(command),
            Operation::Update => self.update.push(command),
            Operation::Delete => self.delete.push(command),
        }
    }

    pub fn total(&self) -> usize {
        self.insert.len() + self.select.len() + self.update.len() + self.delete.len()
    }
}

/// Nests a predicate under a relationship navigation key. Absent predicates
/// and blank keys pass the predicate through untouched: an open rule stays
/// open instead of gaining an empty wrapper.
fn rewrap(predicate: Option<&Value>, navigation_key: &str) -> Option<Value> {
    match predicate {
        Some(value) if !navigation_key.is_empty() => Some(json!({ navigation_key: value })),
        Some(value) => Some(value.clone()),
        None => None,
    }
}

fn insert_permission(rule: &InsertRule, columns: Vec<String>, check: Option<Value>) -> InsertPermission {
    InsertPermission {
        check: check.or_else(|| rule.check.clone()).unwrap_or_else(|| json!({})),
        set: rule.set.clone(),
        columns,
        backend_only: rule.backend_only,
    }
}

fn select_permission(rule: &SelectRule, columns: Vec<String>, filter: Option<Value>) -> SelectPermission {
    SelectPermission {
        columns,
        filter: filter.or_else(|| rule.filter.clone()).unwrap_or_else(|| json!({})),
        computed_fields: rule.computed_fields.clone(),
        limit: rule.limit,
        allow_aggregations: rule.allow_aggregations,
    }
}

fn update_permission(
    rule: &UpdateRule,
    columns: Vec<String>,
    filter: Option<Value>,
    check: Option<Value>,
) -> UpdatePermission {
    UpdatePermission {
        columns,
        filter: filter.or_else(|| rule.filter.clone()).unwrap_or_else(|| json!({})),
        check: check.or_else(|| rule.check.clone()),
        set: rule.set.clone(),
    }
}

fn delete_permission(rule: &DeleteRule, filter: Option<Value>) -> DeletePermission {
    DeletePermission {
        filter: filter.or_else(|| rule.filter.clone()).unwrap_or_else(|| json!({})),
    }
}

/// Builds one create-permission command from a rule template.
///
/// `columns` is the resolved column set for the target table; `filter` and
/// `check` override the template's own predicates when the rule has been
/// rewrapped for a propagated edge.
fn command_for_rule(
    rule: RuleTemplate<'_>,
    table: QualifiedTable,
    role: &str,
    source: &str,
    columns: Vec<String>,
    filter: Option<Value>,
    check: Option<Value>,
) -> MetadataCommand {
    let role = role.to_string();
    let source = source.to_string();
    match rule {
        RuleTemplate::Insert(rule) => MetadataCommand::PgCreateInsertPermission(PermissionArgs {
            table,
            role,
            source,
            permission: insert_permission(rule, columns, check),
        }),
        RuleTemplate::Select(rule) => MetadataCommand::PgCreateSelectPermission(PermissionArgs {
            table,
            role,
            source,
            permission: select_permission(rule, columns, filter),
        }),
        RuleTemplate::Update(rule) => MetadataCommand::PgCreateUpdatePermission(PermissionArgs {
            table,
            role,
            source,
            permission: update_permission(rule, columns, filter, check),
        }),
        RuleTemplate::Delete(rule) => MetadataCommand::PgCreateDeletePermission(PermissionArgs {
            table,
            role,
            source,
            permission: delete_permission(rule, filter),
        }),
    }
}

fn predicates(rule: RuleTemplate<'_>) -> (Option<&Value>, Option<&Value>) {
    match rule {
        RuleTemplate::Insert(rule) => (None, rule.check.as_ref()),
        RuleTemplate::Select(rule) => (rule.filter.as_ref(), None),
        RuleTemplate::Update(rule) => (rule.filter.as_ref(), rule.check.as_ref()),
        RuleTemplate::Delete(rule) => (rule.filter.as_ref(), None),
    }
}

fn propagated_command(
    entity: &Entity,
    edge: &Edge,
    operation: Operation,
    rule: RuleTemplate<'_>,
    role: &str,
    source: &str,
    schema_name: &str,
) -> MetadataCommand {
    let navigation_key = edge
        .fk_column()
        .map(crate::naming::navigation_key)
        .unwrap_or_default();

    let (filter, check) = predicates(rule);
    let filter = rewrap(filter, &navigation_key);
    let check = rewrap(check, &navigation_key);

    debug!(
        "propagating {} rule of {} over edge {} to table {}",
        operation, entity.name, edge.name, edge.target_table
    );

    command_for_rule(
        rule,
        QualifiedTable::new(schema_name, &edge.target_table),
        role,
        source,
        edge.columns.clone(),
        filter,
        check,
    )
}

/// Derives every create-permission command for the graph.
///
/// Entities without a grant are skipped; grants without a role are skipped
/// with a warning. Each (operation, table) pair is claimed at most once per
/// run, uniformly across base and propagated rules.
pub fn derive_permissions(graph: &SchemaGraph, source: &str, schema_name: &str) -> PermissionBatches {
    let mut batches = PermissionBatches::default();
    let mut dedup = PermissionDedup::default();

    for entity in &graph.entities {
        let Some(grant) = &entity.permissions else {
            debug!("entity {} carries no permission annotation", entity.name);
            continue;
        };
        if grant.role.is_empty() {
            warn!(
                "entity {} declares a permission grant without a role, skipping",
                entity.name
            );
            continue;
        }

        let complete = entity.complete_columns();

        for (operation, rule) in grant.rules() {
            if dedup.try_claim(operation, &entity.table) {
                let columns = rule_columns(rule).resolve(&complete);
                batches.push(
                    operation,
                    command_for_rule(
                        rule,
                        QualifiedTable::new(schema_name, &entity.table),
                        &grant.role,
                        source,
                        columns,
                        None,
                        None,
                    ),
                );
            } else {
                debug!(
                    "{} permission on {} already claimed, skipping base rule of {}",
                    operation, entity.table, entity.name
                );
            }

            for edge in &entity.edges {
                if !edge.propagates_permissions() {
                    continue;
                }
                if graph.is_entity_table(&edge.target_table) {
                    // entity-backed tables declare their own grants
                    continue;
                }
                if !dedup.try_claim(operation, &edge.target_table) {
                    debug!(
                        "{} permission on {} already claimed, skipping edge {} of {}",
                        operation, edge.target_table, edge.name, entity.name
                    );
                    continue;
                }

                batches.push(
                    operation,
                    propagated_command(
                        entity,
                        edge,
                        operation,
                        rule,
                        &grant.role,
                        source,
                        schema_name,
                    ),
                );
            }
        }
    }

    batches
}

fn rule_columns(rule: RuleTemplate<'_>) -> &ColumnSpec {
    match rule {
        RuleTemplate::Insert(rule) => &rule.columns,
        RuleTemplate::Select(rule) => &rule.columns,
        RuleTemplate::Update(rule) => &rule.columns,
        RuleTemplate::Delete(_) => {
            // delete rules carry no column set
            const EMPTY: &ColumnSpec = &ColumnSpec::Explicit(Vec::new());
            EMPTY
        }
    }
}
