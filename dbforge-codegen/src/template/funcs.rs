//! Built-in template functions

use serde_json::Value;

use super::{is_truthy, to_text, TemplateFunc};
use crate::naming;
use std::sync::Arc;

fn arity(name: &str, args: &[Value], expected: usize) -> Result<(), String> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(format!(
            "`{}` takes {} argument(s), got {}",
            name,
            expected,
            args.len()
        ))
    }
}

fn text_fn(name: &'static str, f: fn(&str) -> String) -> (&'static str, TemplateFunc) {
    let text = func(move |args| {
        arity(name, args, 1)?;
        Ok(Value::String(f(&to_text(&args[0]))))
    });
    (name, text)
}

enum Number {
    Int(i64),
    Float(f64),
}

fn number(name: &str, value: &Value) -> Result<Number, String> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Number::Int(i)),
            None => n
                .as_f64()
                .map(Number::Float)
                .ok_or_else(|| format!("`{}`: number out of range", name)),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Number::Int)
            .map_err(|_| format!("`{}` expects numbers, got {:?}", name, s)),
        other => Err(format!("`{}` expects numbers, got {}", name, other)),
    }
}

fn arithmetic(
    name: &'static str,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> (&'static str, TemplateFunc) {
    let op = func(move |args| {
        arity(name, args, 2)?;
        match (number(name, &args[0])?, number(name, &args[1])?) {
            (Number::Int(a), Number::Int(b)) => int(a, b)
                .map(Value::from)
                .ok_or_else(|| format!("`{}` overflowed", name)),
            (a, b) => {
                let as_f64 = |n: Number| match n {
                    Number::Int(i) => i as f64,
                    Number::Float(f) => f,
                };
                Ok(serde_json::Number::from_f64(float(as_f64(a), as_f64(b)))
                    .map(Value::Number)
                    .unwrap_or(Value::Null))
            }
        }
    });
    (name, op)
}

fn func(
    f: impl Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
) -> TemplateFunc {
    Arc::new(f)
}

/// Every built-in function, by name.
pub(crate) fn builtins() -> Vec<(&'static str, TemplateFunc)> {
    let mut funcs = vec![
        text_fn("snake", naming::to_snake_case),
        text_fn("camel", naming::to_camel_case),
        text_fn("pascal", naming::to_pascal_case),
        text_fn("singular", naming::singularize),
        text_fn("plural", naming::pluralize),
        text_fn("upper", |s| s.to_uppercase()),
        text_fn("lower", |s| s.to_lowercase()),
        text_fn("trim", |s| s.trim().to_string()),
        // Rust string literal
        text_fn("quote", |s| format!("{:?}", s)),
        arithmetic("add", i64::checked_add, |a, b| a + b),
        arithmetic("sub", i64::checked_sub, |a, b| a - b),
    ];

    funcs.push(("replace", func(|args| {
        arity("replace", args, 3)?;
        let from = to_text(&args[1]);
        if from.is_empty() {
            return Err("`replace` needs a non-empty pattern".into());
        }
        Ok(Value::String(to_text(&args[0]).replace(&from, &to_text(&args[2]))))
    })));
    funcs.push(("join", func(|args| {
        arity("join", args, 2)?;
        let sep = to_text(&args[1]);
        match &args[0] {
            Value::Array(items) => Ok(Value::String(
                items.iter().map(to_text).collect::<Vec<_>>().join(&sep),
            )),
            Value::Null => Ok(Value::String(String::new())),
            other => Err(format!("`join` expects a list, got {}", other)),
        }
    })));
    funcs.push(("len", func(|args| {
        arity("len", args, 1)?;
        let len = match &args[0] {
            Value::Null => 0,
            Value::String(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            other => return Err(format!("`len` has no meaning for {}", other)),
        };
        Ok(Value::from(len))
    })));
    funcs.push(("eq", func(|args| {
        arity("eq", args, 2)?;
        Ok(Value::Bool(args[0] == args[1]))
    })));
    funcs.push(("ne", func(|args| {
        arity("ne", args, 2)?;
        Ok(Value::Bool(args[0] != args[1]))
    })));
    funcs.push(("not", func(|args| {
        arity("not", args, 1)?;
        Ok(Value::Bool(!is_truthy(&args[0])))
    })));
    funcs.push(("and", func(|args| {
        Ok(Value::Bool(!args.is_empty() && args.iter().all(is_truthy)))
    })));
    funcs.push(("or", func(|args| Ok(Value::Bool(args.iter().any(is_truthy))))));
    funcs.push(("default", func(|args| {
        arity("default", args, 2)?;
        Ok(if is_truthy(&args[0]) {
            args[0].clone()
        } else {
            args[1].clone()
        })
    })));
    funcs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: &[Value]) -> Result<Value, String> {
        let funcs = builtins();
        let (_, f) = funcs.iter().find(|(n, _)| *n == name).unwrap();
        f(args)
    }

    #[test]
    fn test_naming_funcs() {
        assert_eq!(call("pascal", &[json!("user_profiles")]).unwrap(), json!("UserProfiles"));
        assert_eq!(call("singular", &[json!("categories")]).unwrap(), json!("category"));
        assert_eq!(call("plural", &[json!("person")]).unwrap(), json!("people"));
        assert_eq!(call("camel", &[json!("created_at")]).unwrap(), json!("createdAt"));
    }

    #[test]
    fn test_quote() {
        assert_eq!(call("quote", &[json!("say \"hi\"")]).unwrap(), json!("\"say \\\"hi\\\"\""));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(call("add", &[json!(1), json!(2)]).unwrap(), json!(3));
        assert_eq!(call("sub", &[json!(1), json!(2)]).unwrap(), json!(-1));
        assert_eq!(call("add", &[json!(1.5), json!(1)]).unwrap(), json!(2.5));
        assert!(call("add", &[json!("x"), json!(1)]).is_err());
        assert!(call("add", &[json!(i64::MAX), json!(1)]).is_err());
    }

    #[test]
    fn test_collections() {
        assert_eq!(call("join", &[json!(["a", "b"]), json!(", ")]).unwrap(), json!("a, b"));
        assert_eq!(call("len", &[json!([1, 2, 3])]).unwrap(), json!(3));
        assert_eq!(call("len", &[json!("héllo")]).unwrap(), json!(5));
    }

    #[test]
    fn test_logic() {
        assert_eq!(call("and", &[json!(true), json!("x")]).unwrap(), json!(true));
        assert_eq!(call("or", &[json!(0), json!("")]).unwrap(), json!(false));
        assert_eq!(call("not", &[json!([])]).unwrap(), json!(true));
        assert_eq!(call("default", &[json!(""), json!("n/a")]).unwrap(), json!("n/a"));
        assert_eq!(call("eq", &[json!("a"), json!("a")]).unwrap(), json!(true));
    }

    #[test]
    fn test_arity_error() {
        let err = call("replace", &[json!("a")]).unwrap_err();
        assert!(err.contains("3 argument"));
    }
}
