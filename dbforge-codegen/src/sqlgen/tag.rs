//! Field annotation parsing
//!
//! An annotation is a semicolon-separated list of `key` or `key:value`
//! items, e.g. `pk;auto_increment` or `size:50;not_null;comment:display name`.

/// Parsed field annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTag {
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub index: bool,
    pub not_null: bool,
    pub size: Option<u32>,
    pub default: Option<String>,
    pub comment: Option<String>,
    /// Explicit column type; wins over the type mapper
    pub sql_type: Option<String>,
    /// Explicit column name; wins over the snake_case field name
    pub column: Option<String>,
}

/// Why an annotation could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    UnknownKey(String),
    MissingValue(String),
    InvalidSize(String),
}

impl std::fmt::Display for TagError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagError::UnknownKey(key) => write!(f, "unknown tag key `{}`", key),
            TagError::MissingValue(key) => write!(f, "tag key `{}` needs a value", key),
            TagError::InvalidSize(value) => write!(f, "invalid size `{}`", value),
        }
    }
}

impl std::error::Error for TagError {}

impl FieldTag {
    /// Parse an annotation string.
    pub fn parse(tag: &str) -> Result<Self, TagError> {
        let mut parsed = FieldTag::default();
        for item in tag.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = match item.split_once(':') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (item, None),
            };
            match key.to_ascii_lowercase().as_str() {
                "primary_key" | "pk" | "primarykey" => parsed.primary_key = true,
                "auto_increment" | "autoincrement" => parsed.auto_increment = true,
                "unique" => parsed.unique = true,
                "index" => parsed.index = true,
                "not_null" | "notnull" => parsed.not_null = true,
                "size" => {
                    let value = required(key, value)?;
                    let size = value
                        .parse()
                        .map_err(|_| TagError::InvalidSize(value.to_string()))?;
                    parsed.size = Some(size);
                }
                "default" => parsed.default = Some(required(key, value)?.to_string()),
                "comment" => parsed.comment = Some(required(key, value)?.to_string()),
                "type" => parsed.sql_type = Some(required(key, value)?.to_string()),
                "column" => parsed.column = Some(required(key, value)?.to_string()),
                _ => return Err(TagError::UnknownKey(key.to_string())),
            }
        }
        Ok(parsed)
    }
}

fn required<'a>(key: &str, value: Option<&'a str>) -> Result<&'a str, TagError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(TagError::MissingValue(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags_and_values() {
        let tag = FieldTag::parse("pk; auto_increment ;size:50;default:1;comment:a: b").unwrap();
        assert!(tag.primary_key);
        assert!(tag.auto_increment);
        assert_eq!(tag.size, Some(50));
        assert_eq!(tag.default.as_deref(), Some("1"));
        // Only the first colon separates key and value
        assert_eq!(tag.comment.as_deref(), Some("a: b"));
    }

    #[test]
    fn test_aliases() {
        let tag = FieldTag::parse("primarykey;autoincrement;notnull").unwrap();
        assert!(tag.primary_key && tag.auto_increment && tag.not_null);
    }

    #[test]
    fn test_overrides() {
        let tag = FieldTag::parse("type:CHAR(2);column:country_code").unwrap();
        assert_eq!(tag.sql_type.as_deref(), Some("CHAR(2)"));
        assert_eq!(tag.column.as_deref(), Some("country_code"));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            FieldTag::parse("pk;nullable").unwrap_err(),
            TagError::UnknownKey("nullable".into())
        );
        assert_eq!(
            FieldTag::parse("size").unwrap_err(),
            TagError::MissingValue("size".into())
        );
        assert_eq!(
            FieldTag::parse("size:big").unwrap_err(),
            TagError::InvalidSize("big".into())
        );
    }

    #[test]
    fn test_empty_tag() {
        assert_eq!(FieldTag::parse("").unwrap(), FieldTag::default());
        assert_eq!(FieldTag::parse(";;").unwrap(), FieldTag::default());
    }
}
