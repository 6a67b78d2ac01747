//! Casing and inflection helpers shared by the synthesizer and the
//! permission engine.
//!
//! All GraphQL-facing names are lower camel case; display names are upper
//! camel case. Foreign-key columns follow the `<name>_id` convention, and the
//! stem left after stripping that suffix doubles as the relationship name and
//! as the navigation key permissions are nested under.

use convert_case::{Case, Casing};
use log::warn;

pub fn lower_camel(name: &str) -> String {
    name.to_case(Case::Camel)
}

pub fn upper_camel(name: &str) -> String {
    name.to_case(Case::Pascal)
}

pub fn snake(name: &str) -> String {
    name.to_case(Case::Snake)
}

pub fn singular(name: &str) -> String {
    pluralizer::pluralize(name, 1, false)
}

pub fn plural(name: &str) -> String {
    pluralizer::pluralize(name, 2, false)
}

/// Singular and plural display forms of an entity name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNames {
    pub singular: String,
    pub plural: String,
}

/// Derives the display names used for root fields. Irregular nouns whose
/// singular and plural forms collide get a forced `s` suffix.
pub fn display_names(logical_name: &str) -> DisplayNames {
    let singular = upper_camel(&singular(logical_name));
    let mut plural = upper_camel(&plural(logical_name));

    if singular == plural {
        warn!(
            "singular-plural equality for {:?}, forcing plural suffix",
            logical_name
        );
        plural.push('s');
    }

    DisplayNames { singular, plural }
}

/// The stem of a foreign-key-shaped column (`user_id` -> `user`), or `None`
/// when the column does not look like a foreign key.
pub fn fk_stem(column: &str) -> Option<&str> {
    column
        .strip_suffix("_id")
        .or_else(|| column.strip_suffix("ID"))
        .filter(|stem| !stem.is_empty())
}

/// The relationship field a propagated predicate is nested under: the FK
/// column with its suffix stripped, camel cased. Falls back to the raw column
/// when it is not FK-shaped.
pub fn navigation_key(column: &str) -> String {
    lower_camel(fk_stem(column).unwrap_or(column))
}

/// Logical (API-facing) name for a physical column. FK-shaped columns keep an
/// uppercase `ID` suffix so `user_id` becomes `userID`.
pub fn logical_column_name(column: &str) -> String {
    match fk_stem(column) {
        Some(stem) => format!("{}ID", lower_camel(stem)),
        None => lower_camel(column),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_casing() {
        assert_eq!(lower_camel("organization_areas"), "organizationAreas");
        assert_eq!(upper_camel("note"), "Note");
        assert_eq!(snake("UserProfile"), "user_profile");
    }

    #[test]
    fn test_display_names() {
        let names = display_names("Note");
        assert_eq!(names.singular, "Note");
        assert_eq!(names.plural, "Notes");
    }

    #[test]
    fn test_display_names_collision_forces_suffix() {
        let names = display_names("Sheep");
        assert_eq!(names.singular, "Sheep");
        assert_eq!(names.plural, "Sheeps");
    }

    #[test]
    fn test_display_names_stable() {
        assert_eq!(display_names("User"), display_names("User"));
    }

    #[test]
    fn test_fk_stem() {
        assert_eq!(fk_stem("user_id"), Some("user"));
        assert_eq!(fk_stem("authorID"), Some("author"));
        assert_eq!(fk_stem("id"), None);
        assert_eq!(fk_stem("title"), None);
    }

    #[test]
    fn test_navigation_key() {
        assert_eq!(navigation_key("user_id"), "user");
        assert_eq!(navigation_key("parent_folder_id"), "parentFolder");
        assert_eq!(navigation_key("title"), "title");
    }

    #[test]
    fn test_logical_column_name() {
        assert_eq!(logical_column_name("user_id"), "userID");
        assert_eq!(logical_column_name("created_at"), "createdAt");
        assert_eq!(logical_column_name("id"), "id");
    }
}
