//! Text templates for generated source files
//!
//! A small Mustache-style language rendered over `serde_json::Value` data:
//!
//! - `{{ expr }}` outputs a value; `{{! note }}` is a comment
//! - `{{#if expr}}...{{else}}...{{/if}}`
//! - `{{#each list}}...{{else}}...{{/each}}`, with `this`, `@index`,
//!   `@first` and `@last` inside the loop
//! - function calls `{{ join names ", " }}`, pipes `{{ name | pascal }}`
//!   (the piped value is the first argument) and sub-expressions
//!   `{{ add (len columns) 1 }}`
//!
//! Names resolve against the innermost loop item first, then outward to the
//! root data. A missing name is `null`, which renders as nothing and is false.
//!
//! The engine ships the `entity`, `dao` and `query` templates used by the
//! generator; [`TemplateEngine::load_dir`] overrides them from `<name>.tpl`
//! files. Rendering only produces text.

mod funcs;
mod parser;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use parser::{Expr, Node};

/// Name of the entity template
pub const ENTITY: &str = "entity";
/// Name of the record-access template
pub const DAO: &str = "dao";
/// Name of the query-builder template
pub const QUERY: &str = "query";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (ENTITY, include_str!("../../templates/entity.tpl")),
    (DAO, include_str!("../../templates/dao.tpl")),
    (QUERY, include_str!("../../templates/query.tpl")),
];

/// A template function: arguments in, value or message out.
pub type TemplateFunc = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// A template failed to load or render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template `{template}` line {line}: {message}")]
pub struct TemplateError {
    pub template: String,
    /// 1-based; 0 when the error is not tied to a line
    pub line: usize,
    pub message: String,
}

impl TemplateError {
    pub fn new(template: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            template: template.to_string(),
            line,
            message: message.into(),
        }
    }
}

/// Registry of named templates and callable functions.
#[derive(Clone)]
pub struct TemplateEngine {
    sources: HashMap<String, String>,
    funcs: HashMap<String, TemplateFunc>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut templates: Vec<&String> = self.sources.keys().collect();
        templates.sort();
        let mut funcs: Vec<&String> = self.funcs.keys().collect();
        funcs.sort();
        f.debug_struct("TemplateEngine")
            .field("templates", &templates)
            .field("funcs", &funcs)
            .finish()
    }
}

impl TemplateEngine {
    /// Built-in functions and the built-in templates.
    pub fn new() -> Self {
        let mut engine = Self::empty();
        for (name, source) in BUILTIN_TEMPLATES {
            engine.sources.insert(name.to_string(), source.to_string());
        }
        engine
    }

    /// Built-in functions, no templates.
    pub fn empty() -> Self {
        Self {
            sources: HashMap::new(),
            funcs: funcs::builtins()
                .into_iter()
                .map(|(name, f)| (name.to_string(), f))
                .collect(),
        }
    }

    /// Register (or replace) a function.
    pub fn register_func(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    ) {
        self.funcs.insert(name.into(), Arc::new(f));
    }

    /// Add or replace a template; the source is checked before it is stored.
    pub fn load_template(&mut self, name: &str, source: &str) -> Result<(), TemplateError> {
        parser::parse(name, source)?;
        self.sources.insert(name.to_string(), source.to_string());
        Ok(())
    }

    /// Load every `<name>.tpl` in `dir`, returning the loaded names.
    pub fn load_dir(&mut self, dir: &Path) -> Result<Vec<String>, TemplateError> {
        let io_error = |e: std::io::Error| {
            TemplateError::new(&dir.display().to_string(), 0, e.to_string())
        };
        if !dir.is_dir() {
            return Err(TemplateError::new(
                &dir.display().to_string(),
                0,
                "template directory does not exist",
            ));
        }
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(io_error)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("tpl"))
            .collect();
        paths.sort();

        let mut loaded = Vec::new();
        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = std::fs::read_to_string(&path).map_err(io_error)?;
            self.load_template(name, &source)?;
            debug!("Loaded template {} from {}", name, path.display());
            loaded.push(name.to_string());
        }
        Ok(loaded)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Render a registered template.
    pub fn render(&self, name: &str, data: &Value) -> Result<String, TemplateError> {
        let source = self
            .sources
            .get(name)
            .ok_or_else(|| TemplateError::new(name, 0, "no such template"))?;
        self.render_source(name, source, data)
    }

    /// Render template text that is not registered.
    pub fn render_source(&self, name: &str, source: &str, data: &Value) -> Result<String, TemplateError> {
        let nodes = parser::parse(name, source)?;
        let mut out = String::with_capacity(source.len());
        let scope = Scope {
            value: data,
            item: None,
            parent: None,
        };
        Renderer { engine: self, name }.nodes(&nodes, &scope, &mut out)?;
        Ok(out)
    }
}

/// Position of the current `#each` item.
#[derive(Clone, Copy)]
struct Item {
    index: usize,
    len: usize,
}

struct Scope<'a> {
    value: &'a Value,
    item: Option<Item>,
    parent: Option<&'a Scope<'a>>,
}

impl Scope<'_> {
    fn item(&self) -> Option<Item> {
        self.item.or_else(|| self.parent.and_then(|p| p.item()))
    }

    fn lookup(&self, path: &[String]) -> Value {
        let Some((head, rest)) = path.split_first() else {
            return Value::Null;
        };
        match head.as_str() {
            "this" => descend(self.value, rest),
            "@index" => self.item().map(|i| Value::from(i.index)).unwrap_or(Value::Null),
            "@first" => Value::Bool(self.item().is_some_and(|i| i.index == 0)),
            "@last" => Value::Bool(self.item().is_some_and(|i| i.index + 1 == i.len)),
            key => {
                let mut scope = Some(self);
                while let Some(s) = scope {
                    if let Some(found) = s.value.get(key) {
                        return descend(found, rest);
                    }
                    scope = s.parent;
                }
                Value::Null
            }
        }
    }
}

fn descend(value: &Value, path: &[String]) -> Value {
    let mut current = value;
    for key in path {
        current = match current.get(key.as_str()) {
            Some(next) => next,
            None => return Value::Null,
        };
    }
    current.clone()
}

/// How a value prints: strings bare, `null` as nothing, containers as JSON.
pub(crate) fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `null`, `false`, `0`, `""`, `[]` and `{}` are false.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

struct Renderer<'e> {
    engine: &'e TemplateEngine,
    name: &'e str,
}

impl Renderer<'_> {
    fn nodes(&self, nodes: &[Node], scope: &Scope<'_>, out: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output { expr, line } => out.push_str(&to_text(&self.eval(expr, scope, *line)?)),
                Node::If {
                    cond,
                    then,
                    otherwise,
                    line,
                } => {
                    let branch = if is_truthy(&self.eval(cond, scope, *line)?) {
                        then
                    } else {
                        otherwise
                    };
                    self.nodes(branch, scope, out)?;
                }
                Node::Each {
                    source,
                    body,
                    otherwise,
                    line,
                } => match self.eval(source, scope, *line)? {
                    Value::Array(items) if !items.is_empty() => {
                        let len = items.len();
                        for (index, item) in items.iter().enumerate() {
                            let child = Scope {
                                value: item,
                                item: Some(Item { index, len }),
                                parent: Some(scope),
                            };
                            self.nodes(body, &child, out)?;
                        }
                    }
                    Value::Array(_) | Value::Null => self.nodes(otherwise, scope, out)?,
                    other => {
                        return Err(TemplateError::new(
                            self.name,
                            *line,
                            format!("`#each` expects a list, got {}", other),
                        ))
                    }
                },
            }
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr, scope: &Scope<'_>, line: usize) -> Result<Value, TemplateError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Path(path) => Ok(scope.lookup(path)),
            Expr::Call { name, args } => {
                let f = self.engine.funcs.get(name).ok_or_else(|| {
                    TemplateError::new(self.name, line, format!("unknown function `{}`", name))
                })?;
                let values = args
                    .iter()
                    .map(|a| self.eval(a, scope, line))
                    .collect::<Result<Vec<_>, _>>()?;
                f(&values).map_err(|message| TemplateError::new(self.name, line, message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(source: &str, data: Value) -> String {
        TemplateEngine::empty().render_source("t", source, &data).unwrap()
    }

    #[test]
    fn test_output_and_pipes() {
        assert_eq!(
            render("struct {{ table | singular | pascal }};", json!({"table": "user_profiles"})),
            "struct UserProfile;"
        );
        assert_eq!(render("{{ missing }}|{{ n }}", json!({"n": 3})), "|3");
    }

    #[test]
    fn test_each_with_position() {
        let out = render(
            "{{#each cols}}{{@index}}:{{this}}{{#if @last}}.{{else}}, {{/if}}{{/each}}",
            json!({"cols": ["id", "name"]}),
        );
        assert_eq!(out, "0:id, 1:name.");
    }

    #[test]
    fn test_each_else_and_outer_names() {
        let source = "{{#each cols}}\n{{ entity }}.{{ name }}\n{{else}}\nnone\n{{/each}}\n";
        assert_eq!(
            render(source, json!({"entity": "User", "cols": [{"name": "id"}]})),
            "User.id\n"
        );
        assert_eq!(render(source, json!({"entity": "User", "cols": []})), "none\n");
    }

    #[test]
    fn test_if_with_sub_expression() {
        let source = "{{#if (eq (len cols) 2)}}pair{{else}}other{{/if}}";
        assert_eq!(render(source, json!({"cols": [1, 2]})), "pair");
        assert_eq!(render(source, json!({"cols": [1]})), "other");
    }

    #[test]
    fn test_standalone_lines() {
        let source = "a\n{{#if flag}}\n  b\n{{/if}}\nc\n";
        assert_eq!(render(source, json!({"flag": true})), "a\n  b\nc\n");
        assert_eq!(render(source, json!({"flag": false})), "a\nc\n");
    }

    #[test]
    fn test_register_func_and_errors() {
        let mut engine = TemplateEngine::empty();
        engine.register_func("shout", |args: &[Value]| {
            Ok(Value::String(format!("{}!", to_text(&args[0]))))
        });
        engine.register_func("fail", |_: &[Value]| Err("boom".to_string()));
        engine.load_template("ok", "{{ shout name }}").unwrap();
        engine.load_template("bad", "line one\n{{ fail name }}x").unwrap();

        assert_eq!(engine.render("ok", &json!({"name": "hi"})).unwrap(), "hi!");
        let err = engine.render("bad", &json!({})).unwrap_err();
        assert_eq!(err, TemplateError::new("bad", 2, "boom"));

        let err = engine.render("ok2", &json!({})).unwrap_err();
        assert_eq!(err.message, "no such template");

        let err = engine
            .render_source("t", "{{ nope 1 }}", &json!({}))
            .unwrap_err();
        assert!(err.message.contains("unknown function"));
    }

    #[test]
    fn test_each_rejects_scalar() {
        let err = TemplateEngine::empty()
            .render_source("t", "{{#each n}}x{{/each}}", &json!({"n": 1}))
            .unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_load_template_checks_syntax() {
        let mut engine = TemplateEngine::new();
        assert!(engine.load_template(ENTITY, "{{#if x}}").is_err());
        // The built-in stays in place after a failed override
        assert_eq!(engine.sources[ENTITY], BUILTIN_TEMPLATES[0].1);
    }

    #[test]
    fn test_builtin_templates_parse() {
        let engine = TemplateEngine::new();
        for name in [ENTITY, DAO, QUERY] {
            assert!(engine.has_template(name));
            assert!(parser::parse(name, &engine.sources[name]).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_load_dir_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("entity.tpl"), "custom {{ entity_name }}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut engine = TemplateEngine::new();
        let loaded = engine.load_dir(dir.path()).unwrap();
        assert_eq!(loaded, vec!["entity"]);
        assert_eq!(
            engine.render(ENTITY, &json!({"entity_name": "User"})).unwrap(),
            "custom User"
        );
        assert!(engine.has_template(DAO));
    }

    #[test]
    fn test_load_dir_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("entity.tpl");
        std::fs::write(&file, "x").unwrap();

        let mut engine = TemplateEngine::new();
        for path in [dir.path().join("missing"), file] {
            let err = engine.load_dir(&path).unwrap_err();
            assert_eq!(err.message, "template directory does not exist");
            assert_eq!(err.line, 0);
        }
    }
}
