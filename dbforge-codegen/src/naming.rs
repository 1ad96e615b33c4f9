//! Naming utilities for code generation

use heck::{ToLowerCamelCase, ToPascalCase, ToSnakeCase};
use serde::{Deserialize, Serialize};

/// How a table name becomes an entity type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableNameRule {
    /// `user_profiles` -> `UserProfile`
    #[default]
    Singular,
    /// `user_profile` -> `UserProfiles`
    Plural,
    /// `user_profiles` -> `UserProfiles`
    Original,
}

/// How a column name becomes a serialization key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnNameRule {
    #[default]
    SnakeCase,
    CamelCase,
    PascalCase,
    /// Keep the column name as it appears in the catalog
    Original,
}

pub fn to_snake_case(name: &str) -> String {
    name.to_snake_case()
}

pub fn to_camel_case(name: &str) -> String {
    name.to_lower_camel_case()
}

pub fn to_pascal_case(name: &str) -> String {
    name.to_pascal_case()
}

/// Convert a column name to a field name (snake_case)
pub fn to_field_name(column_name: &str) -> String {
    column_name.to_snake_case()
}

/// Entity type name for a table, always PascalCase.
pub fn to_entity_name(table_name: &str, rule: TableNameRule) -> String {
    let snake = table_name.to_snake_case();
    match rule {
        TableNameRule::Singular => singularize(&snake).to_pascal_case(),
        TableNameRule::Plural => pluralize(&snake).to_pascal_case(),
        TableNameRule::Original => snake.to_pascal_case(),
    }
}

/// Serialization key for a column.
pub fn to_serde_key(column_name: &str, rule: ColumnNameRule) -> String {
    match rule {
        ColumnNameRule::SnakeCase => column_name.to_snake_case(),
        ColumnNameRule::CamelCase => column_name.to_lower_camel_case(),
        ColumnNameRule::PascalCase => column_name.to_pascal_case(),
        ColumnNameRule::Original => column_name.to_string(),
    }
}

/// File stem for a table's generated files, e.g. `UserProfiles` -> `user_profiles`.
pub fn to_file_stem(table_name: &str) -> String {
    table_name.to_snake_case()
}

/// Generate a find_by method name for columns
/// e.g., ["user_id", "device_type"] -> "find_by_user_id_and_device_type"
pub fn generate_find_by_method_name(columns: &[String]) -> String {
    let parts: Vec<String> = columns.iter().map(|c| c.to_snake_case()).collect();
    format!("find_by_{}", parts.join("_and_"))
}

const UNCOUNTABLE: &[&str] = &[
    "data",
    "metadata",
    "info",
    "information",
    "equipment",
    "news",
    "series",
    "species",
    "sheep",
    "fish",
];

// Irregular plurals (common in database contexts)
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("mouse", "mice"),
    ("index", "indices"),
];

const F_TO_VES: &[&str] = &[
    "leaf", "knife", "wife", "life", "shelf", "self", "half", "calf", "loaf", "thief",
];

const O_TO_OES: &[&str] = &["hero", "potato", "tomato", "echo", "veto"];

/// Apply `f` to the last `_`-separated word of `name`.
fn on_last_word(name: &str, f: impl Fn(&str) -> String) -> String {
    match name.rfind('_') {
        Some(pos) if pos + 1 < name.len() => {
            format!("{}{}", &name[..=pos], f(&name[pos + 1..]))
        }
        _ => f(name),
    }
}

/// Pluralize a word (or the last word of a snake_case name).
///
/// Already-plural input is singularized first, so `pluralize("users")` is `users`.
pub fn pluralize(name: &str) -> String {
    on_last_word(name, |word| pluralize_word(&singularize_word(word)))
}

/// Singularize a word (or the last word of a snake_case name).
pub fn singularize(name: &str) -> String {
    on_last_word(name, singularize_word)
}

fn pluralize_word(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        if word == *singular {
            return plural.to_string();
        }
    }

    // Words ending in -is → -es (analysis → analyses, basis → bases)
    if word.ends_with("is") && word.len() > 2 {
        return format!("{}es", &word[..word.len() - 2]);
    }

    // Words ending in -f or -fe → -ves (leaf → leaves, knife → knives)
    if let Some(stripped) = word.strip_suffix("fe") {
        return format!("{}ves", stripped);
    }
    if F_TO_VES.contains(&word) {
        return format!("{}ves", &word[..word.len() - 1]);
    }

    if O_TO_OES.contains(&word) {
        return format!("{}es", word);
    }

    // Past participles used as adjectives stay as they are
    // e.g., "published", "deleted", "updated"
    if word.ends_with("ed") && word.len() > 2 {
        return word.to_string();
    }

    // Standard rules: -s, -x, -z, -ch, -sh → add -es
    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{}es", word);
    }

    // Words ending in consonant + y → -ies
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.is_empty() && !stem.ends_with(is_vowel) {
            return format!("{}ies", stem);
        }
    }

    format!("{}s", word)
}

fn singularize_word(word: &str) -> String {
    if word.len() < 2 || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        if word == *plural {
            return singular.to_string();
        }
    }

    // Already singular: status, address, basis, published
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") || word.ends_with("ed")
    {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("sses") {
        return format!("{}ss", stem);
    }

    // statuses → status, but houses → house
    if let Some(stem) = word.strip_suffix("uses") {
        return if stem.ends_with(is_vowel) {
            format!("{}use", stem)
        } else {
            format!("{}us", stem)
        };
    }

    if let Some(stem) = word.strip_suffix("yses") {
        return format!("{}ysis", stem);
    }

    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", stem);
        }
    }

    if let Some(stem) = word.strip_suffix("ves") {
        for candidate in [format!("{}f", stem), format!("{}fe", stem)] {
            if F_TO_VES.contains(&candidate.as_str()) {
                return candidate;
            }
        }
    }

    if let Some(stem) = word.strip_suffix("oes") {
        let o = format!("{}o", stem);
        if O_TO_OES.contains(&o.as_str()) {
            return o;
        }
    }

    for suffix in ["xes", "zes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }

    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Check if a name is a Rust reserved keyword
pub fn is_rust_keyword(name: &str) -> bool {
    matches!(
        name,
        "as" | "async"
            | "await"
            | "break"
            | "const"
            | "continue"
            | "crate"
            | "dyn"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "abstract"
            | "become"
            | "box"
            | "do"
            | "final"
            | "macro"
            | "override"
            | "priv"
            | "try"
            | "typeof"
            | "unsized"
            | "virtual"
            | "yield"
    )
}

/// Keywords that cannot be raw identifiers.
fn is_path_keyword(name: &str) -> bool {
    matches!(name, "self" | "super" | "crate" | "Self")
}

/// Escape a field name if it's a Rust keyword
///
/// Path keywords take a trailing underscore (`self_`), other keywords the
/// raw prefix (`r#type`). A leading digit gets an underscore prefix.
/// Collisions between columns are left to the caller.
pub fn escape_field_name(name: &str) -> String {
    let snake = name.to_snake_case();
    if is_path_keyword(&snake) {
        format!("{}_", snake)
    } else if is_rust_keyword(&snake) {
        format!("r#{}", snake)
    } else if snake.is_empty() {
        "_column".to_string()
    } else if snake.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", snake)
    } else {
        snake
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_entity_name() {
        assert_eq!(to_entity_name("users", TableNameRule::Singular), "User");
        assert_eq!(
            to_entity_name("user_settings", TableNameRule::Singular),
            "UserSetting"
        );
        assert_eq!(to_entity_name("order_item", TableNameRule::Plural), "OrderItems");
        assert_eq!(to_entity_name("order_items", TableNameRule::Original), "OrderItems");
        assert_eq!(to_entity_name("categories", TableNameRule::Singular), "Category");
    }

    #[test]
    fn test_to_serde_key() {
        assert_eq!(to_serde_key("created_at", ColumnNameRule::SnakeCase), "created_at");
        assert_eq!(to_serde_key("created_at", ColumnNameRule::CamelCase), "createdAt");
        assert_eq!(to_serde_key("created_at", ColumnNameRule::PascalCase), "CreatedAt");
        assert_eq!(to_serde_key("createdAt", ColumnNameRule::Original), "createdAt");
    }

    #[test]
    fn test_to_field_name() {
        assert_eq!(to_field_name("userId"), "user_id");
        assert_eq!(to_field_name("first_name"), "first_name");
        assert_eq!(to_field_name("CreatedAt"), "created_at");
    }

    #[test]
    fn test_pluralize() {
        // Basic -s
        assert_eq!(pluralize("id"), "ids");
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("email"), "emails");

        // -es for -s, -x, -z, -ch, -sh
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("dish"), "dishes");

        // -y → -ies (consonant + y)
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("company"), "companies");
        // -y → -ys (vowel + y)
        assert_eq!(pluralize("key"), "keys");
        assert_eq!(pluralize("day"), "days");

        // -is → -es
        assert_eq!(pluralize("analysis"), "analyses");
        assert_eq!(pluralize("basis"), "bases");

        // -f/-fe → -ves
        assert_eq!(pluralize("leaf"), "leaves");
        assert_eq!(pluralize("knife"), "knives");

        // Irregulars
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("child"), "children");
        assert_eq!(pluralize("index"), "indices");

        // -o words
        assert_eq!(pluralize("hero"), "heroes");
        assert_eq!(pluralize("photo"), "photos");

        // -ed words (past participles) - don't pluralize
        assert_eq!(pluralize("published"), "published");
        assert_eq!(pluralize("deleted"), "deleted");
        assert_eq!(pluralize("updated"), "updated");

        // Last word of a snake_case name
        assert_eq!(pluralize("order_item"), "order_items");
        assert_eq!(pluralize("user_person"), "user_people");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("statuses"), "status");
        assert_eq!(singularize("houses"), "house");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("analyses"), "analysis");
        assert_eq!(singularize("leaves"), "leaf");
        assert_eq!(singularize("knives"), "knife");
        assert_eq!(singularize("heroes"), "hero");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("order_items"), "order_item");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("data"), "data");
        assert_eq!(singularize("archives"), "archive");
    }

    #[test]
    fn test_plural_of_singular_is_plural() {
        let words = [
            "user", "users", "post", "posts", "status", "statuses", "category", "categories",
            "box", "boxes", "address", "addresses", "order_item", "order_items", "key", "keys",
            "analysis", "analyses", "leaf", "leaves", "person", "people", "house", "houses",
        ];
        for word in words {
            assert_eq!(pluralize(&singularize(word)), pluralize(word), "word: {}", word);
        }
    }

    #[test]
    fn test_snake_pascal_round_trip() {
        for name in ["users", "user_id", "order_items", "created_at", "a"] {
            assert_eq!(to_snake_case(&to_pascal_case(name)), name);
        }
    }

    #[test]
    fn test_generate_find_by_method_name() {
        assert_eq!(
            generate_find_by_method_name(&["id".to_string()]),
            "find_by_id"
        );
        assert_eq!(
            generate_find_by_method_name(&["user_id".to_string(), "device_type".to_string()]),
            "find_by_user_id_and_device_type"
        );
    }

    #[test]
    fn test_escape_field_name() {
        assert_eq!(escape_field_name("type"), "r#type");
        assert_eq!(escape_field_name("name"), "name");
        assert_eq!(escape_field_name("async"), "r#async");
    }

    #[test]
    fn test_escape_path_keywords() {
        assert_eq!(escape_field_name("self"), "self_");
        assert_eq!(escape_field_name("Self"), "self_");
        assert_eq!(escape_field_name("super"), "super_");
        assert_eq!(escape_field_name("crate"), "crate_");
        assert_eq!(escape_field_name("2fa_code"), "_2fa_code");
        assert_eq!(escape_field_name("--"), "_column");
        for name in ["self", "super", "crate", "Self", "type", "2fa_code"] {
            let field = escape_field_name(name);
            assert!(syn::parse_str::<syn::Ident>(&field).is_ok(), "{}", field);
        }
    }
}
