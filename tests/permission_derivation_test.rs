//! End-to-end derivation tests: JSON graph export in, permission commands
//! and metadata documents out.

use hasura_sync::graph::load_graph;
use hasura_sync::metadata::commands::MetadataCommand;
use hasura_sync::permissions::derive_permissions;
use hasura_sync::runtime::generate_metadata_document;
use hasura_sync::RuntimeConfig;
use serde_json::json;
use std::io::Write;

fn blog_graph_json() -> String {
    json!({
        "entities": [
            {
                "name": "User",
                "table": "users",
                "fields": [
                    {"name": "email", "column": "email"},
                    {"name": "name", "column": "name"}
                ],
                "edges": [
                    {
                        "name": "notes",
                        "multiplicity": "to_many",
                        "direction": "forward",
                        "ownership": "referencing",
                        "target_table": "note_drafts",
                        "columns": ["user_id"],
                        "inverse_columns": ["user_id"]
                    }
                ],
                "permissions": {
                    "role": "user",
                    "insert_permission": {
                        "check": {"id": {"_eq": "X-Hasura-User-Id"}},
                        "columns": ["email", "name"]
                    },
                    "select_permission": {
                        "filter": {"id": {"_eq": "X-Hasura-User-Id"}},
                        "all_columns": true,
                        "allow_aggregations": true
                    }
                }
            }
        ],
        "tables": [
            {"name": "users", "columns": ["id", "email", "name"]},
            {"name": "note_drafts", "columns": ["id", "user_id", "title"]}
        ]
    })
    .to_string()
}

fn load(json: &str) -> hasura_sync::SchemaGraph {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    load_graph(file.path()).unwrap()
}

#[test]
fn derives_base_and_propagated_rules_from_export() {
    let graph = load(&blog_graph_json());
    let batches = derive_permissions(&graph, "default", "public");

    // insert: base rule plus the propagated one on the draft table
    assert_eq!(batches.insert.len(), 2);
    match &batches.insert[1] {
        MetadataCommand::PgCreateInsertPermission(args) => {
            assert_eq!(args.table.name, "note_drafts");
            assert_eq!(args.role, "user");
            assert_eq!(args.permission.columns, vec!["user_id"]);
            assert_eq!(
                args.permission.check,
                json!({"user": {"id": {"_eq": "X-Hasura-User-Id"}}})
            );
        }
        other => panic!("unexpected command {}", other.kind()),
    }

    // select: all_columns resolves against the entity's complete column set
    match &batches.select[0] {
        MetadataCommand::PgCreateSelectPermission(args) => {
            assert_eq!(args.table.name, "users");
            assert_eq!(args.permission.columns, vec!["email", "id", "name"]);
            assert!(args.permission.allow_aggregations);
        }
        other => panic!("unexpected command {}", other.kind()),
    }
}

#[test]
fn update_and_delete_are_absent_when_undeclared() {
    let graph = load(&blog_graph_json());
    let batches = derive_permissions(&graph, "default", "public");

    assert!(batches.update.is_empty());
    assert!(batches.delete.is_empty());
    assert_eq!(batches.total(), 4);
}

#[test]
fn shared_dependent_table_is_claimed_once() {
    let graph = load(
        &json!({
            "entities": [
                {
                    "name": "Post",
                    "table": "posts",
                    "edges": [{
                        "name": "attachments",
                        "multiplicity": "to_many",
                        "direction": "forward",
                        "ownership": "referencing",
                        "target_table": "attachments",
                        "columns": ["post_id"],
                        "inverse_columns": ["post_id"]
                    }],
                    "permissions": {
                        "role": "user",
                        "select_permission": {"filter": {"id": {"_eq": "X-Hasura-User-Id"}}, "all_columns": true}
                    }
                },
                {
                    "name": "Comment",
                    "table": "comments",
                    "edges": [{
                        "name": "attachments",
                        "multiplicity": "to_many",
                        "direction": "forward",
                        "ownership": "referencing",
                        "target_table": "attachments",
                        "columns": ["comment_id"],
                        "inverse_columns": ["comment_id"]
                    }],
                    "permissions": {
                        "role": "user",
                        "select_permission": {"filter": {"id": {"_eq": "X-Hasura-User-Id"}}, "all_columns": true}
                    }
                }
            ],
            "tables": [
                {"name": "posts", "columns": ["id"]},
                {"name": "comments", "columns": ["id"]},
                {"name": "attachments", "columns": ["id", "post_id", "comment_id"]}
            ]
        })
        .to_string(),
    );

    let batches = derive_permissions(&graph, "default", "public");
    let attachment_rules: Vec<_> = batches
        .select
        .iter()
        .filter(|command| command.table().map(|t| t.name.as_str()) == Some("attachments"))
        .collect();

    assert_eq!(attachment_rules.len(), 1);
    match attachment_rules[0] {
        MetadataCommand::PgCreateSelectPermission(args) => {
            // Post comes first in the graph, so its edge wins
            assert_eq!(args.permission.columns, vec!["post_id"]);
            assert_eq!(
                args.permission.filter,
                json!({"post": {"id": {"_eq": "X-Hasura-User-Id"}}})
            );
        }
        other => panic!("unexpected command {}", other.kind()),
    }
}

#[test]
fn generated_document_includes_naming_and_relationships() {
    let graph = load(&blog_graph_json());
    let document = generate_metadata_document(&graph, &RuntimeConfig::default(), None).unwrap();

    let tables = &document.metadata.sources[0].tables;
    assert_eq!(tables.len(), 2);

    let users = &tables[0];
    assert_eq!(users.table.name, "users");
    let configuration = users.configuration.as_ref().unwrap();
    assert_eq!(configuration.custom_name, "User");
    assert_eq!(configuration.custom_root_fields.select, "users");
    assert_eq!(configuration.custom_root_fields.insert_one, "insertUser");
    assert_eq!(users.array_relationships.len(), 1);
    assert_eq!(users.array_relationships[0].name, "notes");

    // the unmapped draft table still gets naming and an inferred object
    // relationship from its FK-shaped column
    let drafts = &tables[1];
    assert_eq!(drafts.table.name, "note_drafts");
    let configuration = drafts.configuration.as_ref().unwrap();
    assert_eq!(configuration.custom_name, "NoteDraft");
    assert_eq!(
        configuration.custom_column_names.get("user_id"),
        Some(&"userID".to_string())
    );
    assert_eq!(drafts.object_relationships.len(), 1);
    assert_eq!(drafts.object_relationships[0].name, "user");
}

#[test]
fn generated_document_round_trips_through_json() {
    let graph = load(&blog_graph_json());
    let document =
        generate_metadata_document(&graph, &RuntimeConfig::default(), Some("user")).unwrap();

    let text = serde_json::to_string_pretty(&document).unwrap();
    let back: hasura_sync::metadata::MetadataDocument = serde_json::from_str(&text).unwrap();
    assert_eq!(back, document);
}
