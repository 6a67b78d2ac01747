//! Role-scoped permission annotations attached to entities.
//!
//! An entity declares at most one [`RoleGrant`], holding up to four
//! operation-scoped rule templates. Predicates are carried as raw JSON
//! values; the derivation engine clones and rewraps them without ever
//! interpreting their contents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The four operations a grant can scope rules to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Select,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Insert,
        Operation::Select,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Select => "select",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column policy of a rule: an explicit list, or the entity's complete
/// column set minus exclusions.
///
/// On the wire this is the flattened `columns` / `all_columns` /
/// `excluded_columns` triple the annotation format uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ColumnSpecRepr", into = "ColumnSpecRepr")]
pub enum ColumnSpec {
    Explicit(Vec<String>),
    AllExcept(Vec<String>),
}

impl Default for ColumnSpec {
    fn default() -> Self {
        ColumnSpec::Explicit(Vec::new())
    }
}

impl ColumnSpec {
    /// Resolves the policy against an entity's complete column set. The
    /// complete set is expected sorted and duplicate-free; explicit lists are
    /// returned as declared.
    pub fn resolve(&self, complete_columns: &[String]) -> Vec<String> {
        match self {
            ColumnSpec::Explicit(columns) => columns.clone(),
            ColumnSpec::AllExcept(excluded) => complete_columns
                .iter()
                .filter(|column| !excluded.contains(column))
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnSpecRepr {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    columns: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    all_columns: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    excluded_columns: Vec<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl From<ColumnSpecRepr> for ColumnSpec {
    fn from(repr: ColumnSpecRepr) -> Self {
        if repr.all_columns {
            ColumnSpec::AllExcept(repr.excluded_columns)
        } else {
            ColumnSpec::Explicit(repr.columns)
        }
    }
}

impl From<ColumnSpec> for ColumnSpecRepr {
    fn from(spec: ColumnSpec) -> Self {
        match spec {
            ColumnSpec::Explicit(columns) => ColumnSpecRepr {
                columns,
                all_columns: false,
                excluded_columns: Vec::new(),
            },
            ColumnSpec::AllExcept(excluded_columns) => ColumnSpecRepr {
                columns: Vec::new(),
                all_columns: true,
                excluded_columns,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsertRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub set: Map<String, Value>,
    #[serde(flatten)]
    pub columns: ColumnSpec,
    #[serde(default, skip_serializing_if = "is_false")]
    pub backend_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(flatten)]
    pub columns: ColumnSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub computed_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_aggregations: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub set: Map<String, Value>,
    #[serde(flatten)]
    pub columns: ColumnSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}

/// One role's rule templates for an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleGrant {
    #[serde(default)]
    pub role: String,
    #[serde(
        default,
        rename = "insert_permission",
        skip_serializing_if = "Option::is_none"
    )]
    pub insert: Option<InsertRule>,
    #[serde(
        default,
        rename = "select_permission",
        skip_serializing_if = "Option::is_none"
    )]
    pub select: Option<SelectRule>,
    #[serde(
        default,
        rename = "update_permission",
        skip_serializing_if = "Option::is_none"
    )]
    pub update: Option<UpdateRule>,
    #[serde(
        default,
        rename = "delete_permission",
        skip_serializing_if = "Option::is_none"
    )]
    pub delete: Option<DeleteRule>,
}

/// Borrowed view of one declared rule, tagged by operation.
#[derive(Debug, Clone, Copy)]
pub enum RuleTemplate<'a> {
    Insert(&'a InsertRule),
    Select(&'a SelectRule),
    Update(&'a UpdateRule),
    Delete(&'a DeleteRule),
}

impl RoleGrant {
    /// The declared rules in operation order.
    pub fn rules(&self) -> Vec<(Operation, RuleTemplate<'_>)> {
        let mut rules = Vec::new();
        if let Some(rule) = &self.insert {
            rules.push((Operation::Insert, RuleTemplate::Insert(rule)));
        }
        if let Some(rule) = &self.select {
            rules.push((Operation::Select, RuleTemplate::Select(rule)));
        }
        if let Some(rule) = &self.update {
            rules.push((Operation::Update, RuleTemplate::Update(rule)));
        }
        if let Some(rule) = &self.delete {
            rules.push((Operation::Delete, RuleTemplate::Delete(rule)));
        }
        rules
    }
}
