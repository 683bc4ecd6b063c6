//! Filter-expression evaluation against records
//!
//! The in-memory repository evaluates parsed expressions directly. A SQL
//! repository would compile the same tree into a WHERE fragment; the
//! semantics here are the contract either backend must satisfy.

use regex::Regex;

use crate::domain::record::Record;
use crate::domain::value::PropertyValue;

use super::parser::{CompareOp, Expr, Literal, PropertyRef, TypeSuffix};

/// Evaluate an expression against a record. A reference to a property the
/// record does not carry never matches.
pub fn matches(expr: &Expr, record: &Record) -> bool {
    match expr {
        Expr::And(left, right) => matches(left, record) && matches(right, record),
        Expr::Or(left, right) => matches(left, record) || matches(right, record),
        Expr::Compare { target, op, value } => resolve(target, record)
            .map(|resolved| compare(&resolved, *op, value))
            .unwrap_or(false),
        Expr::Like {
            target,
            pattern,
            case_insensitive,
        } => resolve(target, record)
            .and_then(|resolved| resolved.as_str().map(str::to_string))
            .map(|text| like_matches(&text, pattern, *case_insensitive))
            .unwrap_or(false),
    }
}

/// Resolve a reference against built-in attributes first, then the
/// property maps.
fn resolve(target: &PropertyRef, record: &Record) -> Option<PropertyValue> {
    let value = match target.name.as_str() {
        "id" => record.id.map(|id| PropertyValue::Int(id as i64)),
        "name" => Some(PropertyValue::String(record.name.clone())),
        "externalId" | "external_id" => record
            .external_id
            .as_ref()
            .map(|id| PropertyValue::String(id.clone())),
        "createTimeSinceEpoch" => Some(PropertyValue::Int(record.create_time_since_epoch)),
        "lastUpdateTimeSinceEpoch" => {
            Some(PropertyValue::Int(record.last_update_time_since_epoch))
        }
        name => record
            .properties
            .get(name)
            .or_else(|| record.custom_properties.get(name))
            .cloned(),
    }?;

    match target.type_suffix {
        None => Some(value),
        Some(TypeSuffix::StringValue) => matches!(value, PropertyValue::String(_)).then_some(value),
        Some(TypeSuffix::IntValue) => matches!(value, PropertyValue::Int(_)).then_some(value),
        Some(TypeSuffix::DoubleValue) => matches!(value, PropertyValue::Double(_)).then_some(value),
        Some(TypeSuffix::BoolValue) => matches!(value, PropertyValue::Bool(_)).then_some(value),
    }
}

fn compare(value: &PropertyValue, op: CompareOp, literal: &Literal) -> bool {
    match (value, literal) {
        // ints and doubles compare numerically, in any combination
        (PropertyValue::Int(_) | PropertyValue::Double(_), Literal::Number(n)) => {
            let left = value.as_number().unwrap_or(f64::NAN);
            ordered(left.partial_cmp(n), op)
        }
        (PropertyValue::String(s), Literal::String(t)) => ordered(Some(s.as_str().cmp(t)), op),
        (PropertyValue::Bool(b), Literal::Bool(t)) => match op {
            CompareOp::Eq => b == t,
            CompareOp::Ne => b != t,
            _ => false,
        },
        // type mismatch never matches
        _ => false,
    }
}

fn ordered(ordering: Option<std::cmp::Ordering>, op: CompareOp) -> bool {
    use std::cmp::Ordering::*;
    match ordering {
        None => false,
        Some(ordering) => match op {
            CompareOp::Eq => ordering == Equal,
            CompareOp::Ne => ordering != Equal,
            CompareOp::Lt => ordering == Less,
            CompareOp::Le => ordering != Greater,
            CompareOp::Gt => ordering == Greater,
            CompareOp::Ge => ordering != Less,
        },
    }
}

/// SQL LIKE over the whole string: `%` matches any run, `_` a single
/// character, everything else is literal.
fn like_matches(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let mut regex = String::with_capacity(pattern.len() + 8);
    if case_insensitive {
        regex.push_str("(?i)");
    }
    regex.push('^');
    for c in pattern.chars() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');

    // the pattern is built from escaped literals and cannot fail to compile
    Regex::new(&regex)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}
