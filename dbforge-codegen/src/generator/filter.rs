//! Include/exclude table filtering

use crate::config::FilterConfig;

/// A table-name pattern: exact, `prefix*`, `*suffix` or `*infix*`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Any,
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl Pattern {
    fn new(raw: &str) -> Self {
        let raw = raw.trim();
        match (raw.strip_prefix('*'), raw.strip_suffix('*')) {
            _ if raw == "*" || raw == "**" => Pattern::Any,
            (Some(rest), Some(_)) => Pattern::Contains(rest[..rest.len() - 1].to_string()),
            (Some(rest), None) => Pattern::Suffix(rest.to_string()),
            (None, Some(rest)) => Pattern::Prefix(rest.to_string()),
            (None, None) => Pattern::Exact(raw.to_string()),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Exact(s) => name == s,
            Pattern::Prefix(s) => name.starts_with(s.as_str()),
            Pattern::Suffix(s) => name.ends_with(s.as_str()),
            Pattern::Contains(s) => name.contains(s.as_str()),
        }
    }
}

/// Decides which tables take part in a run.
///
/// A non-empty include list is an allow-list checked first; the exclude
/// list then removes matches.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl TableFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            include: config.include.iter().map(|p| Pattern::new(p)).collect(),
            exclude: config.exclude.iter().map(|p| Pattern::new(p)).collect(),
        }
    }

    pub fn matches(&self, table: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(table)) {
            return false;
        }
        !self.exclude.iter().any(|p| p.matches(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str]) -> TableFilter {
        TableFilter::new(&FilterConfig {
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_include_then_exclude() {
        let f = filter(&["user*"], &["*_log"]);
        assert!(!f.matches("user_log"));
        assert!(f.matches("users"));
        assert!(!f.matches("orders"));
    }

    #[test]
    fn test_empty_filter_allows_all() {
        assert!(filter(&[], &[]).matches("anything"));
    }

    #[test]
    fn test_pattern_shapes() {
        assert_eq!(Pattern::new("*audit*"), Pattern::Contains("audit".into()));
        assert_eq!(Pattern::new("tmp_*"), Pattern::Prefix("tmp_".into()));
        assert_eq!(Pattern::new("*_bak"), Pattern::Suffix("_bak".into()));
        assert_eq!(Pattern::new("users"), Pattern::Exact("users".into()));
        assert_eq!(Pattern::new("*"), Pattern::Any);

        let f = filter(&[], &["*audit*", "tmp_*", "schema_migrations"]);
        assert!(!f.matches("order_audit_trail"));
        assert!(!f.matches("tmp_import"));
        assert!(!f.matches("schema_migrations"));
        assert!(f.matches("schema_migrations_v2"));
    }
}
