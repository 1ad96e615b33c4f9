//! Template lexer and parser
//!
//! Tags never span lines. A line holding only block tags (`#if`, `#each`,
//! `else`, closers, comments) and whitespace renders as nothing, so block
//! structure can be laid out on its own lines without leaving blank lines.

use serde_json::Value;

use super::TemplateError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    /// `this`, `@index`, `name`, `table.comment`
    Path(Vec<String>),
    Call { name: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Output {
        expr: Expr,
        line: usize,
    },
    If {
        cond: Expr,
        then: Vec<Node>,
        otherwise: Vec<Node>,
        line: usize,
    },
    Each {
        source: Expr,
        body: Vec<Node>,
        otherwise: Vec<Node>,
        line: usize,
    },
}

#[derive(Debug)]
enum Token {
    Text(String),
    Tag { body: String, line: usize },
}

fn is_block(body: &str) -> bool {
    body.starts_with('#') || body.starts_with('/') || body.starts_with('!') || body == "else"
}

fn lex(name: &str, source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut out = Vec::new();
    for (i, line) in source.split_inclusive('\n').enumerate() {
        let line_no = i + 1;
        let mut tokens = Vec::new();
        let mut rest = line;
        while let Some(start) = rest.find("{{") {
            if start > 0 {
                tokens.push(Token::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| TemplateError::new(name, line_no, "unclosed `{{`"))?;
            tokens.push(Token::Tag {
                body: after[..end].trim().to_string(),
                line: line_no,
            });
            rest = &after[end + 2..];
        }
        if !rest.is_empty() {
            tokens.push(Token::Text(rest.to_string()));
        }

        let standalone = tokens
            .iter()
            .any(|t| matches!(t, Token::Tag { body, .. } if is_block(body)))
            && tokens.iter().all(|t| match t {
                Token::Text(text) => text.trim().is_empty(),
                Token::Tag { body, .. } => is_block(body),
            });
        if standalone {
            out.extend(tokens.into_iter().filter(|t| matches!(t, Token::Tag { .. })));
        } else {
            out.extend(tokens);
        }
    }
    Ok(out)
}

/// Parse a template into its node tree.
pub(crate) fn parse(name: &str, source: &str) -> Result<Vec<Node>, TemplateError> {
    let tokens = lex(name, source)?;
    let mut parser = Parser {
        name,
        tokens: tokens.into_iter(),
    };
    let (nodes, end) = parser.block(&[])?;
    match end {
        None => Ok(nodes),
        Some((tag, line)) => Err(TemplateError::new(
            name,
            line,
            format!("unexpected `{{{{{}}}}}`", tag),
        )),
    }
}

struct Parser<'a> {
    name: &'a str,
    tokens: std::vec::IntoIter<Token>,
}

impl Parser<'_> {
    fn error(&self, line: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::new(self.name, line, message)
    }

    /// Parse nodes until one of `closers` (or the end of input) is reached.
    fn block(&mut self, closers: &[&str]) -> Result<(Vec<Node>, Option<(String, usize)>), TemplateError> {
        let mut nodes = Vec::new();
        while let Some(token) = self.tokens.next() {
            let (body, line) = match token {
                Token::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Token::Tag { body, line } => (body, line),
            };

            if body.starts_with('!') {
                continue;
            }
            if closers.contains(&body.as_str()) {
                return Ok((nodes, Some((body, line))));
            }
            if let Some(rest) = keyword(&body, "#if") {
                let cond = self.expression(rest, line)?;
                let (then, otherwise) = self.branches("/if", line)?;
                nodes.push(Node::If {
                    cond,
                    then,
                    otherwise,
                    line,
                });
            } else if let Some(rest) = keyword(&body, "#each") {
                let source = self.expression(rest, line)?;
                let (body, otherwise) = self.branches("/each", line)?;
                nodes.push(Node::Each {
                    source,
                    body,
                    otherwise,
                    line,
                });
            } else if is_block(&body) {
                // A closer or `else` that does not belong to the open block
                return Ok((nodes, Some((body, line))));
            } else {
                let expr = self.expression(&body, line)?;
                nodes.push(Node::Output { expr, line });
            }
        }
        Ok((nodes, None))
    }

    /// The two arms of a block closed by `closer`, split at `else`.
    fn branches(&mut self, closer: &str, open_line: usize) -> Result<(Vec<Node>, Vec<Node>), TemplateError> {
        let (then, end) = self.block(&["else", closer])?;
        match end {
            Some((tag, _)) if tag == closer => Ok((then, Vec::new())),
            Some((tag, _)) if tag == "else" => {
                let (otherwise, end) = self.block(&[closer])?;
                match end {
                    Some(_) => Ok((then, otherwise)),
                    None => Err(self.error(open_line, format!("missing `{{{{{}}}}}`", closer))),
                }
            }
            Some((tag, line)) => Err(self.error(
                line,
                format!("expected `{{{{{}}}}}`, found `{{{{{}}}}}`", closer, tag),
            )),
            None => Err(self.error(open_line, format!("missing `{{{{{}}}}}`", closer))),
        }
    }

    fn expression(&self, source: &str, line: usize) -> Result<Expr, TemplateError> {
        let tokens = tokenize(source).map_err(|m| self.error(line, m))?;
        if tokens.is_empty() {
            return Err(self.error(line, "empty expression"));
        }
        let mut parser = ExprParser { tokens, pos: 0 };
        let expr = parser.pipeline().map_err(|m| self.error(line, m))?;
        if parser.pos < parser.tokens.len() {
            return Err(self.error(line, format!("unexpected `{}`", parser.tokens[parser.pos])));
        }
        Ok(expr)
    }
}

/// `#if cond` -> `Some("cond")` for keyword `#if`.
fn keyword<'b>(body: &'b str, word: &str) -> Option<&'b str> {
    let rest = body.strip_prefix(word)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ExprToken {
    Ident(String),
    Str(String),
    Num(Value),
    LParen,
    RParen,
    Pipe,
}

impl std::fmt::Display for ExprToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExprToken::Ident(s) => f.write_str(s),
            ExprToken::Str(s) => write!(f, "{:?}", s),
            ExprToken::Num(n) => write!(f, "{}", n),
            ExprToken::LParen => f.write_str("("),
            ExprToken::RParen => f.write_str(")"),
            ExprToken::Pipe => f.write_str("|"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<ExprToken>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(ExprToken::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(ExprToken::RParen);
            }
            '|' => {
                chars.next();
                tokens.push(ExprToken::Pipe);
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(other) => text.push(other),
                            None => return Err("unterminated string".into()),
                        },
                        Some(other) => text.push(other),
                        None => return Err("unterminated string".into()),
                    }
                }
                tokens.push(ExprToken::Str(text));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut text = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' || (d == '-' && text.is_empty()) {
                        text.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = if let Ok(n) = text.parse::<i64>() {
                    Value::from(n)
                } else {
                    text.parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .ok_or_else(|| format!("invalid number `{}`", text))?
                };
                tokens.push(ExprToken::Num(value));
            }
            c if c.is_alphabetic() || c == '_' || c == '@' => {
                let mut text = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || matches!(d, '_' | '.' | '@') {
                        text.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(ExprToken::Ident(text));
            }
            other => return Err(format!("unexpected character `{}`", other)),
        }
    }
    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<ExprToken>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&ExprToken> {
        self.tokens.get(self.pos)
    }

    /// `command ( '|' command )*`; a piped value becomes the first argument.
    fn pipeline(&mut self) -> Result<Expr, String> {
        let mut expr = self.command()?;
        while self.peek() == Some(&ExprToken::Pipe) {
            self.pos += 1;
            expr = match self.command()? {
                Expr::Path(path) if path.len() == 1 => Expr::Call {
                    name: path[0].clone(),
                    args: vec![expr],
                },
                Expr::Call { name, mut args } => {
                    args.insert(0, expr);
                    Expr::Call { name, args }
                }
                _ => return Err("a pipe must end in a function".into()),
            };
        }
        Ok(expr)
    }

    /// `term` or `function term+`.
    fn command(&mut self) -> Result<Expr, String> {
        let first = self.term()?;
        let mut args = Vec::new();
        while !matches!(self.peek(), None | Some(ExprToken::Pipe) | Some(ExprToken::RParen)) {
            args.push(self.term()?);
        }
        if args.is_empty() {
            return Ok(first);
        }
        match first {
            Expr::Path(path) if path.len() == 1 && !path[0].starts_with('@') && path[0] != "this" => {
                Ok(Expr::Call {
                    name: path[0].clone(),
                    args,
                })
            }
            _ => Err("only a function name can take arguments".into()),
        }
    }

    fn term(&mut self) -> Result<Expr, String> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| "unexpected end of expression".to_string())?;
        self.pos += 1;
        match token {
            ExprToken::Str(s) => Ok(Expr::Literal(Value::String(s))),
            ExprToken::Num(n) => Ok(Expr::Literal(n)),
            ExprToken::Ident(word) => Ok(match word.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                _ => Expr::Path(word.split('.').map(str::to_string).collect()),
            }),
            ExprToken::LParen => {
                let inner = self.pipeline()?;
                match self.peek() {
                    Some(ExprToken::RParen) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err("missing `)`".into()),
                }
            }
            other => Err(format!("unexpected `{}`", other)),
        }
    }
}
