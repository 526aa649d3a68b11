//! Filter clauses extracted from a `where` query parameter.

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Comparison applied by a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
}

impl CompareOp {
    /// Parses a `$`-prefixed operator key such as `$gte`.
    pub fn from_operator(key: &str) -> Option<Self> {
        let op = match key {
            "$eq" => Self::Eq,
            "$ne" => Self::Ne,
            "$gt" => Self::Gt,
            "$gte" => Self::Gte,
            "$lt" => Self::Lt,
            "$lte" => Self::Lte,
            "$in" => Self::In,
            "$nin" => Self::Nin,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::In => "$in",
            Self::Nin => "$nin",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `field <op> value` comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
}

impl FilterClause {
    pub fn new(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, CompareOp::Eq, value)
    }

    /// Flattens a Mongo-style `where` document into clauses, in document order.
    ///
    /// - `{"name": "x"}` is an equality clause;
    /// - `{"age": {"$gt": 3, "$lt": 9}}` yields one clause per operator;
    /// - `$and` / `$or` lists are flattened in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWhere`] for a non-object document, an unknown
    /// operator, or an operator object mixing `$` keys with plain keys.
    pub fn parse_where(document: &Value) -> Result<Vec<Self>> {
        let Value::Object(map) = document else {
            return Err(Error::invalid_where("expected a JSON object"));
        };

        let mut clauses = Vec::new();
        collect_clauses(map, &mut clauses)?;
        Ok(clauses)
    }

    /// Parses the raw `where` text before flattening it.
    pub fn parse_where_str(raw: &str) -> Result<Vec<Self>> {
        let document: Value = serde_json::from_str(raw)
            .map_err(|e| Error::invalid_where(format!("not valid JSON: {e}")))?;
        Self::parse_where(&document)
    }
}

fn collect_clauses(map: &Map<String, Value>, out: &mut Vec<FilterClause>) -> Result<()> {
    for (key, value) in map {
        match key.as_str() {
            "$and" | "$or" => {
                let Value::Array(branches) = value else {
                    return Err(Error::invalid_where(format!("{key} expects a list")));
                };
                for branch in branches {
                    let Value::Object(branch) = branch else {
                        return Err(Error::invalid_where(format!(
                            "{key} entries must be objects"
                        )));
                    };
                    collect_clauses(branch, out)?;
                }
            }
            k if k.starts_with('$') => {
                return Err(Error::invalid_where(format!(
                    "unsupported operator '{k}' at top level"
                )));
            }
            field => collect_field(field, value, out)?,
        }
    }
    Ok(())
}

fn collect_field(field: &str, value: &Value, out: &mut Vec<FilterClause>) -> Result<()> {
    let operators = match value {
        Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => ops,
        _ => {
            out.push(FilterClause::eq(field, value.clone()));
            return Ok(());
        }
    };

    for (key, operand) in operators {
        let op = CompareOp::from_operator(key).ok_or_else(|| {
            Error::invalid_where(format!("unsupported operator '{key}' on '{field}'"))
        })?;
        out.push(FilterClause::new(field, op, operand.clone()));
    }
    Ok(())
}
