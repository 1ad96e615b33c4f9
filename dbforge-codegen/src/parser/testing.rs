//! Scripted in-memory catalog connection for parser and generator tests

use async_trait::async_trait;
use dbforge::{Connection, Context, Dialect, Error, Row, Value};
use std::sync::Mutex;

enum Reply {
    Rows(Vec<Row>),
    Fail(String),
    Cancelled,
    TimedOut,
}

impl Reply {
    fn failure(err: Error) -> Self {
        match err {
            Error::Cancelled => Reply::Cancelled,
            Error::Timeout => Reply::TimedOut,
            Error::Query(message) => Reply::Fail(message),
            other => Reply::Fail(other.to_string()),
        }
    }
}

struct Rule {
    fragment: String,
    param: Option<String>,
    reply: Reply,
}

/// Answers catalog queries from a list of rules.
///
/// A rule matches when the SQL contains its fragment and, if given, one of
/// the bound parameters equals its parameter. The first matching rule wins;
/// unmatched queries return no rows.
pub struct ScriptedConnection {
    dialect: Dialect,
    rules: Vec<Rule>,
    log: Mutex<Vec<String>>,
}

impl ScriptedConnection {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            rules: Vec::new(),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, fragment: &str, rows: Vec<Row>) -> Self {
        self.rules.push(Rule {
            fragment: fragment.to_string(),
            param: None,
            reply: Reply::Rows(rows),
        });
        self
    }

    pub fn on_param(mut self, fragment: &str, param: &str, rows: Vec<Row>) -> Self {
        self.rules.push(Rule {
            fragment: fragment.to_string(),
            param: Some(param.to_string()),
            reply: Reply::Rows(rows),
        });
        self
    }

    /// Fail matching queries. Cancellation and timeout errors are replayed
    /// as such; anything else becomes a query error with the same message.
    pub fn fail(mut self, fragment: &str, err: Error) -> Self {
        self.rules.push(Rule {
            fragment: fragment.to_string(),
            param: None,
            reply: Reply::failure(err),
        });
        self
    }

    pub fn fail_param(mut self, fragment: &str, param: &str, err: Error) -> Self {
        self.rules.push(Rule {
            fragment: fragment.to_string(),
            param: Some(param.to_string()),
            reply: Reply::failure(err),
        });
        self
    }

    /// Every SQL statement received so far.
    pub fn queries(&self) -> Vec<String> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn fetch_all(&self, ctx: &Context, sql: &str, params: Vec<Value>) -> dbforge::Result<Vec<Row>> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }
        if let Ok(mut log) = self.log.lock() {
            log.push(sql.to_string());
        }
        let rule = self.rules.iter().find(|rule| {
            sql.contains(&rule.fragment)
                && rule.param.as_ref().map_or(true, |p| {
                    params.iter().any(|v| matches!(v, Value::String(s) if s == p))
                })
        });
        match rule.map(|r| &r.reply) {
            Some(Reply::Rows(rows)) => Ok(rows.clone()),
            Some(Reply::Fail(message)) => Err(Error::Query(message.clone())),
            Some(Reply::Cancelled) => Err(Error::Cancelled),
            Some(Reply::TimedOut) => Err(Error::Timeout),
            None => Ok(Vec::new()),
        }
    }
}

fn table_info(cid: i64, name: &str, ty: &str, notnull: i64, default: Option<&str>, pk: i64) -> Row {
    Row::new()
        .with("cid", cid)
        .with("name", name)
        .with("type", ty)
        .with("notnull", notnull)
        .with("dflt_value", default)
        .with("pk", pk)
}

/// The two-table `users`/`posts` schema as SQLite pragmas report it.
pub fn sqlite_users_posts() -> ScriptedConnection {
    sqlite_users_posts_with(ScriptedConnection::new(Dialect::Sqlite))
}

/// [`sqlite_users_posts`] behind the rules already on `conn`.
pub fn sqlite_users_posts_with(conn: ScriptedConnection) -> ScriptedConnection {
    conn.on(
            "PRAGMA database_list",
            vec![Row::new()
                .with("seq", 0i64)
                .with("name", "main")
                .with("file", "/data/app.db")],
        )
        .on(
            "FROM sqlite_master",
            vec![Row::new().with("name", "posts"), Row::new().with("name", "users")],
        )
        .on(
            "table_info(\"users\")",
            vec![
                table_info(0, "id", "INTEGER", 0, None, 1),
                table_info(1, "username", "TEXT", 1, None, 0),
                table_info(2, "created_at", "TIMESTAMP", 0, Some("CURRENT_TIMESTAMP"), 0),
            ],
        )
        .on(
            "table_info(\"posts\")",
            vec![
                table_info(0, "id", "INTEGER", 0, None, 1),
                table_info(1, "user_id", "INTEGER", 0, None, 0),
            ],
        )
        .on(
            "index_list(\"users\")",
            vec![Row::new()
                .with("seq", 0i64)
                .with("name", "sqlite_autoindex_users_1")
                .with("unique", 1i64)
                .with("origin", "u")
                .with("partial", 0i64)],
        )
        .on(
            "index_info(\"sqlite_autoindex_users_1\")",
            vec![Row::new()
                .with("seqno", 0i64)
                .with("cid", 1i64)
                .with("name", "username")],
        )
        .on(
            "foreign_key_list(\"posts\")",
            vec![Row::new()
                .with("id", 0i64)
                .with("seq", 0i64)
                .with("table", "users")
                .with("from", "user_id")
                .with("to", "id")
                .with("on_update", "NO ACTION")
                .with("on_delete", "CASCADE")
                .with("match", "NONE")],
        )
}
