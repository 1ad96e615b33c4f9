//! Compile-time model descriptors used for forward SQL generation
//!
//! A [`ModelDescriptor`] is the static description of an annotated struct:
//! its name, target table and fields, each field carrying the Rust type as
//! written in source and its raw `#[sql("...")]` tag. Descriptors are
//! normally produced by `#[derive(SqlModel)]`, but can be built by hand:
//!
//! ```
//! use dbforge::{FieldDescriptor, ModelDescriptor};
//!
//! let model = ModelDescriptor::new("User", "users")
//!     .field(FieldDescriptor::new("id", "i64").tag("primary_key;auto_increment"))
//!     .field(FieldDescriptor::new("name", "String").tag("size:50;not_null"));
//! assert_eq!(model.fields.len(), 2);
//! ```

/// A type that can describe itself for SQL generation.
///
/// Implemented by `#[derive(SqlModel)]`.
pub trait SqlModel {
    /// Describe this type's table and fields.
    fn describe() -> ModelDescriptor;
}

/// Static description of a model type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// The Rust type name
    pub name: String,
    /// The table this model maps to
    pub table: String,
    /// Fields in declaration order
    pub fields: Vec<FieldDescriptor>,
}

/// Static description of one struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field identifier as written in source
    pub name: String,
    /// Field type as written in source, whitespace removed (e.g. `Option<String>`)
    pub rust_type: String,
    /// Raw semicolon-separated annotation, if any
    pub tag: Option<String>,
    /// Whether the field is visible outside its module (`pub`)
    pub exported: bool,
    /// Explicitly excluded from SQL generation
    pub skip: bool,
    /// Fields of an embedded model, flattened into the parent
    pub embedded: Option<Vec<FieldDescriptor>>,
}

impl ModelDescriptor {
    /// Create an empty descriptor.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Append an embedded model whose fields are flattened into this one.
    pub fn embed(mut self, name: impl Into<String>, model: ModelDescriptor) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            rust_type: model.name,
            tag: None,
            exported: true,
            skip: false,
            embedded: Some(model.fields),
        });
        self
    }
}

impl FieldDescriptor {
    /// Create an exported field with no annotation.
    pub fn new(name: impl Into<String>, rust_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rust_type: rust_type.into().chars().filter(|c| !c.is_whitespace()).collect(),
            tag: None,
            exported: true,
            skip: false,
            embedded: None,
        }
    }

    /// Attach a semicolon-separated annotation.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set visibility.
    pub fn exported(mut self, exported: bool) -> Self {
        self.exported = exported;
        self
    }

    /// Mark the field as excluded.
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_type_whitespace_removed() {
        let field = FieldDescriptor::new("tags", "Option < Vec < u8 > >");
        assert_eq!(field.rust_type, "Option<Vec<u8>>");
    }

    #[test]
    fn test_embed_flattens_fields() {
        let audit = ModelDescriptor::new("Audit", "audits")
            .field(FieldDescriptor::new("created_at", "NaiveDateTime"));
        let model = ModelDescriptor::new("Post", "posts")
            .field(FieldDescriptor::new("id", "i64"))
            .embed("audit", audit);
        let embedded = model.fields[1].embedded.as_ref().unwrap();
        assert_eq!(embedded[0].name, "created_at");
    }
}
