//! Parameterized `IN (...)` clause construction.
//!
//! Zone codes are bound as positional parameters, one placeholder per code,
//! and never interpolated into the SQL text.

use popbuilder_population_models::ZoneCode;
use switchy_database::DatabaseValue;

use crate::DbError;

/// A `column IN ($1, ..., $N)` predicate together with its bound values.
#[derive(Debug, Clone)]
pub struct InClause {
    /// SQL predicate text containing only placeholders.
    pub sql: String,
    /// Values bound to the placeholders, in placeholder order.
    pub params: Vec<DatabaseValue>,
}

/// Builds an `IN` predicate on `column` with exactly one placeholder per
/// code, bound in input order.
///
/// # Errors
///
/// Returns [`DbError::NoZones`] if `codes` is empty, since `IN ()` is not
/// valid SQL.
pub fn zone_in_clause(column: &str, codes: &[ZoneCode]) -> Result<InClause, DbError> {
    if codes.is_empty() {
        return Err(DbError::NoZones);
    }

    let mut sql = String::with_capacity(column.len() + 6 + codes.len() * 5);
    sql.push_str(column);
    sql.push_str(" IN (");

    for i in 1..=codes.len() {
        if i > 1 {
            sql.push_str(", ");
        }
        sql.push('$');
        sql.push_str(&i.to_string());
    }
    sql.push(')');

    let params = codes
        .iter()
        .map(|code| DatabaseValue::String(code.as_str().to_string()))
        .collect();

    Ok(InClause { sql, params })
}
