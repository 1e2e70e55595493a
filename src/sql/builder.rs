//! Builds parameterized DDL, INSERT, SELECT, UPDATE, DELETE.
//!
//! Identifiers are validated and quoted; every value becomes a `$n` parameter
//! recorded in `Statement::params` in placeholder order.

use crate::error::{DbError, PredicateError, SchemaError};
use crate::schema::{record_setters, FieldType, FieldValue, SchemaFieldReference, TableSchema};
use crate::sql::{ColumnSetter, Operand, WhereFilter};
use regex::Regex;
use std::sync::OnceLock;

fn ident_pattern() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern"))
}

pub fn is_valid_identifier(s: &str) -> bool {
    ident_pattern().is_match(s)
}

/// Quote identifier for PostgreSQL after checking it is a plain identifier.
pub fn quoted(s: &str) -> Result<String, SchemaError> {
    if !is_valid_identifier(s) {
        return Err(SchemaError::InvalidIdentifier(s.to_string()));
    }
    Ok(format!("\"{}\"", s))
}

/// `table` or `schema.table`, each part quoted.
pub fn qualified_table(table: &str) -> Result<String, SchemaError> {
    match table.split_once('.') {
        Some((schema, name)) => Ok(format!("{}.{}", quoted(schema)?, quoted(name)?)),
        None => quoted(table),
    }
}

/// One positional parameter: the field it belongs to, its type tag and value.
#[derive(Clone, Debug, PartialEq)]
pub struct BindParam {
    pub field: String,
    pub field_type: FieldType,
    pub value: FieldValue,
}

/// SQL text plus the parameters for its `$1..$n` placeholders, in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<BindParam>,
}

impl Statement {
    fn push_param(&mut self, field: &str, field_type: FieldType, value: FieldValue) -> String {
        self.params.push(BindParam {
            field: field.to_string(),
            field_type,
            value,
        });
        format!("${}", self.params.len())
    }

    /// Placeholder for a setter; an untyped NULL becomes a literal.
    fn push_setter(&mut self, setter: &ColumnSetter) -> String {
        match setter.field_type() {
            Some(ty) => self.push_param(setter.column(), ty, setter.value().clone()),
            None => "NULL".to_string(),
        }
    }
}

/// `CREATE TABLE IF NOT EXISTS <table> (<name> <type> <modifiers>, ...)`.
pub fn create_table<'a>(
    table: &str,
    fields: impl IntoIterator<Item = &'a SchemaFieldReference>,
) -> Result<String, SchemaError> {
    let mut defs = Vec::new();
    for field in fields {
        let mut def = format!("{} {}", quoted(field.name())?, field.field_type().native_type());
        for m in field.modifiers() {
            def.push(' ');
            def.push_str(m.as_sql());
        }
        defs.push(def);
    }
    if defs.is_empty() {
        return Err(SchemaError::EmptyFieldList {
            table: table.to_string(),
        });
    }
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified_table(table)?,
        defs.join(", ")
    ))
}

/// INSERT with columns and placeholders in setter order. No setters means
/// every column takes its default.
pub fn insert(table: &str, setters: &[ColumnSetter], returning: bool) -> Result<Statement, SchemaError> {
    let mut q = Statement::default();
    let table = qualified_table(table)?;
    let mut cols = Vec::with_capacity(setters.len());
    let mut placeholders = Vec::with_capacity(setters.len());
    for s in setters {
        cols.push(quoted(s.column())?);
        placeholders.push(q.push_setter(s));
    }
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", table)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            placeholders.join(", ")
        )
    };
    if returning {
        q.sql.push_str(" RETURNING *");
    }
    Ok(q)
}

/// INSERT of a record in field-declaration order.
pub fn insert_record<T: TableSchema>(table: &str, record: &T, returning: bool) -> Result<Statement, SchemaError> {
    insert(table, &record_setters(record, true), returning)
}

/// UPDATE: SET parameters first, then WHERE parameters. No filters updates every row.
pub fn update(
    table: &str,
    setters: &[ColumnSetter],
    filters: &[WhereFilter],
    returning: bool,
) -> Result<Statement, DbError> {
    if setters.is_empty() {
        return Err(SchemaError::EmptyFieldList {
            table: table.to_string(),
        }
        .into());
    }
    let mut q = Statement::default();
    let table = qualified_table(table)?;
    let mut sets = Vec::with_capacity(setters.len());
    for s in setters {
        let col = quoted(s.column())?;
        sets.push(format!("{} = {}", col, q.push_setter(s)));
    }
    q.sql = format!("UPDATE {} SET {}", table, sets.join(", "));
    if let Some(clause) = where_clause(&mut q, filters)? {
        q.sql.push_str(" WHERE ");
        q.sql.push_str(&clause);
    }
    if returning {
        q.sql.push_str(" RETURNING *");
    }
    Ok(q)
}

/// SELECT list with optional filters; `*` selects every column. No filters
/// omits the WHERE clause entirely.
pub fn select(table: &str, columns: &[&str], filters: &[WhereFilter]) -> Result<Statement, DbError> {
    if columns.is_empty() {
        return Err(SchemaError::EmptyFieldList {
            table: table.to_string(),
        }
        .into());
    }
    let mut q = Statement::default();
    let table = qualified_table(table)?;
    let cols = columns
        .iter()
        .map(|c| if *c == "*" { Ok("*".to_string()) } else { quoted(c) })
        .collect::<Result<Vec<_>, _>>()?;
    q.sql = format!("SELECT {} FROM {}", cols.join(", "), table);
    if let Some(clause) = where_clause(&mut q, filters)? {
        q.sql.push_str(" WHERE ");
        q.sql.push_str(&clause);
    }
    Ok(q)
}

/// DELETE requires at least one filter; checked before any SQL is built.
pub fn delete(table: &str, filters: &[WhereFilter]) -> Result<Statement, DbError> {
    if filters.is_empty() {
        return Err(PredicateError::EmptyDeletePredicate {
            table: table.to_string(),
        }
        .into());
    }
    let mut q = Statement::default();
    let table = qualified_table(table)?;
    let clause = where_clause(&mut q, filters)?.unwrap_or_default();
    q.sql = format!("DELETE FROM {} WHERE {}", table, clause);
    Ok(q)
}

/// `(<f1> <op> $n AND <f2> <op> ...)`, or None for no filters.
fn where_clause(q: &mut Statement, filters: &[WhereFilter]) -> Result<Option<String>, DbError> {
    if filters.is_empty() {
        return Ok(None);
    }
    let mut parts = Vec::with_capacity(filters.len());
    for f in filters {
        f.validate()?;
        let mut lhs = quoted(f.field().name())?;
        if f.compares_as_text() {
            lhs.push_str("::text");
        }
        let op = f.operator().as_sql();
        let name = f.field().name();
        let ty = f.operand_type();
        let part = match f.operand() {
            Operand::None => format!("{} {}", lhs, op),
            Operand::One(v) => {
                let ph = q.push_param(name, ty, v.clone());
                format!("{} {} {}", lhs, op, ph)
            }
            Operand::Many(values) => {
                let phs: Vec<String> = values
                    .iter()
                    .map(|v| q.push_param(name, ty, v.clone()))
                    .collect();
                format!("{} {} ({})", lhs, op, phs.join(", "))
            }
        };
        parts.push(part);
    }
    Ok(Some(format!("({})", parts.join(" AND "))))
}
