//! Type conversion utilities for MySQL

use crate::error::{Error, Result};
use crate::row::Row;
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use mysql_async::Row as MySqlAsyncRow;
use mysql_async::Value as MySqlValue;

/// Convert dbforge Value to mysql_async Value
pub fn to_mysql_value(value: &Value) -> MySqlValue {
    match value {
        Value::Null => MySqlValue::NULL,
        Value::Bool(v) => MySqlValue::from(*v),
        Value::I64(v) => MySqlValue::from(*v),
        Value::U64(v) => MySqlValue::from(*v),
        Value::F64(v) => MySqlValue::from(*v),
        Value::String(v) => MySqlValue::from(v.as_str()),
        Value::Bytes(v) => MySqlValue::from(v.as_slice()),
    }
}

/// Convert mysql_async Value to dbforge Value
///
/// Temporal values only appear in catalog rows as defaults or timestamps,
/// so they are rendered to their SQL text form.
pub fn from_mysql_value(value: MySqlValue) -> Result<Value> {
    match value {
        MySqlValue::NULL => Ok(Value::Null),
        MySqlValue::Bytes(v) => {
            // Try to interpret as string first
            match String::from_utf8(v) {
                Ok(s) => Ok(Value::String(s)),
                Err(e) => Ok(Value::Bytes(e.into_bytes())),
            }
        }
        MySqlValue::Int(v) => Ok(Value::I64(v)),
        MySqlValue::UInt(v) => Ok(Value::U64(v)),
        MySqlValue::Float(v) => Ok(Value::F64(v as f64)),
        MySqlValue::Double(v) => Ok(Value::F64(v)),
        MySqlValue::Date(year, month, day, hour, min, sec, micro) => {
            let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
                .ok_or_else(|| Error::TypeConversion {
                    expected: "date",
                    actual: format!("{}-{}-{}", year, month, day),
                })?;
            if hour == 0 && min == 0 && sec == 0 && micro == 0 {
                return Ok(Value::String(date.to_string()));
            }
            let time = NaiveTime::from_hms_micro_opt(hour as u32, min as u32, sec as u32, micro)
                .ok_or_else(|| Error::TypeConversion {
                    expected: "time",
                    actual: format!("{}:{}:{}.{}", hour, min, sec, micro),
                })?;
            Ok(Value::String(NaiveDateTime::new(date, time).to_string()))
        }
        MySqlValue::Time(is_neg, days, hours, mins, secs, _micro) => Ok(Value::String(format!(
            "{}{:02}:{:02}:{:02}",
            if is_neg { "-" } else { "" },
            days * 24 + hours as u32,
            mins,
            secs
        ))),
    }
}

/// Convert a mysql_async row into a dbforge row, keeping column order.
pub fn from_mysql_row(row: MySqlAsyncRow) -> Result<Row> {
    let columns = row.columns_ref();
    let mut out = Row::new();

    for (i, column) in columns.iter().enumerate() {
        let column_name = column.name_str().to_string();
        let mysql_value = row
            .as_ref(i)
            .ok_or_else(|| Error::ColumnNotFound(column_name.clone()))?
            .clone();
        out.push(column_name, from_mysql_value(mysql_value)?);
    }

    Ok(out)
}
