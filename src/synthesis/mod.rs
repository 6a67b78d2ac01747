//! Table-Definition Synthesizer: converts graph entities (and the relational
//! tables no entity maps) into canonical table definitions — display names,
//! CRUD root fields, column name maps, and relationship declarations.

use crate::error::{HasuraSyncError, Result};
use crate::graph::{Entity, Multiplicity, Ownership, RelationalTable, SchemaGraph};
use crate::metadata::{
    ArrayRelUsing, ArrayRelationship, CustomRootFields, ForeignKeyOn, ObjectRelUsing,
    ObjectRelationship, QualifiedTable, RemoteColumn, TableConfiguration, TableDefinition,
};
use crate::naming;
use log::debug;
use std::collections::HashSet;

const INSERT_VERB: &str = "insert";
const UPDATE_VERB: &str = "update";
const DELETE_VERB: &str = "delete";
const AGGREGATE_SUFFIX: &str = "Aggregate";

fn resolve_table(table: &str, logical_name: &str, schema_name: &str) -> Result<QualifiedTable> {
    if table.is_empty() {
        return Err(HasuraSyncError::UnresolvedTable(logical_name.to_string()));
    }
    Ok(QualifiedTable::new(schema_name, table))
}

/// Display name and root-field configuration shared by entity-backed and raw
/// tables.
fn base_configuration(logical_name: &str) -> TableConfiguration {
    let names = naming::display_names(logical_name);

    TableConfiguration {
        custom_name: logical_name.to_string(),
        custom_root_fields: CustomRootFields {
            insert: naming::lower_camel(&format!("{}{}", INSERT_VERB, names.plural)),
            insert_one: naming::lower_camel(&format!("{}{}", INSERT_VERB, names.singular)),
            select: naming::lower_camel(&names.plural),
            select_by_pk: naming::lower_camel(&names.singular),
            select_aggregate: naming::lower_camel(&format!("{}{}", names.plural, AGGREGATE_SUFFIX)),
            update: naming::lower_camel(&format!("{}{}", UPDATE_VERB, names.plural)),
            update_by_pk: naming::lower_camel(&format!("{}{}", UPDATE_VERB, names.singular)),
            delete: naming::lower_camel(&format!("{}{}", DELETE_VERB, names.plural)),
            delete_by_pk: naming::lower_camel(&format!("{}{}", DELETE_VERB, names.singular)),
        },
        custom_column_names: Default::default(),
    }
}

/// Synthesizes the table definition for one entity.
pub fn table_definition_for_entity(entity: &Entity, schema_name: &str) -> Result<TableDefinition> {
    let table = resolve_table(&entity.table, &entity.name, schema_name)?;
    let mut configuration = base_configuration(&entity.name);

    for field in &entity.fields {
        configuration
            .custom_column_names
            .insert(field.column.clone(), naming::lower_camel(&field.name));
    }

    let mut definition = TableDefinition::new(table, TableConfiguration::default());

    for edge in &entity.edges {
        let relationship_name = naming::lower_camel(&edge.name);

        match edge.multiplicity {
            Multiplicity::ToOne => {
                let Some(fk_column) = edge.fk_column() else {
                    debug!(
                        "skipping to-one edge {} on {}: no FK column",
                        edge.name, entity.name
                    );
                    continue;
                };

                let constraint = if edge.ownership == Ownership::Owning {
                    // the locally-owned FK is also exposed as a logical field
                    configuration.custom_column_names.insert(
                        fk_column.to_string(),
                        format!("{}ID", relationship_name),
                    );
                    ForeignKeyOn::Column(fk_column.to_string())
                } else {
                    ForeignKeyOn::Remote {
                        column: fk_column.to_string(),
                        table: QualifiedTable::new(schema_name, &edge.target_table),
                    }
                };

                definition.object_relationships.push(ObjectRelationship {
                    name: relationship_name,
                    using: ObjectRelUsing {
                        foreign_key_constraint_on: constraint,
                    },
                });
            }
            Multiplicity::ToMany => {
                let column = if edge.association {
                    format!("{}_id", naming::snake(&entity.name))
                } else {
                    match edge.inverse_columns.first() {
                        Some(column) => column.clone(),
                        None => {
                            debug!(
                                "skipping to-many edge {} on {}: no inverse columns",
                                edge.name, entity.name
                            );
                            continue;
                        }
                    }
                };

                definition.array_relationships.push(ArrayRelationship {
                    name: relationship_name,
                    using: ArrayRelUsing {
                        foreign_key_constraint_on: RemoteColumn {
                            column,
                            table: QualifiedTable::new(schema_name, &edge.target_table),
                        },
                    },
                });
            }
        }
    }

    definition.configuration = Some(configuration);
    Ok(definition)
}

/// Synthesizes a minimal definition for a relational table no entity maps,
/// inferring object relationships from FK-shaped columns.
pub fn table_definition_for_relational_table(
    table: &RelationalTable,
    schema_name: &str,
) -> Result<TableDefinition> {
    let display_name = naming::upper_camel(&naming::singular(&table.name));
    let qualified = resolve_table(&table.name, &display_name, schema_name)?;
    let mut configuration = base_configuration(&display_name);
    let mut definition = TableDefinition::new(qualified, TableConfiguration::default());

    for column in &table.columns {
        configuration
            .custom_column_names
            .insert(column.clone(), naming::logical_column_name(column));

        if let Some(stem) = naming::fk_stem(column) {
            definition.object_relationships.push(ObjectRelationship {
                name: naming::lower_camel(stem),
                using: ObjectRelUsing {
                    foreign_key_constraint_on: ForeignKeyOn::Column(column.clone()),
                },
            });
        }
    }

    definition.configuration = Some(configuration);
    Ok(definition)
}

/// Definitions for every table in the graph: one per entity, then one per
/// relational table no entity claimed.
pub fn table_definitions(graph: &SchemaGraph, schema_name: &str) -> Result<Vec<TableDefinition>> {
    let mut definitions = Vec::new();
    let mut mapped_tables = HashSet::new();

    for entity in &graph.entities {
        definitions.push(table_definition_for_entity(entity, schema_name)?);
        mapped_tables.insert(entity.table.as_str());
    }

    for table in &graph.tables {
        if mapped_tables.contains(table.name.as_str()) {
            continue;
        }
        definitions.push(table_definition_for_relational_table(table, schema_name)?);
    }

    Ok(definitions)
}
