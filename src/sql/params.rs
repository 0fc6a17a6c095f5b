//! Typed bind values and binding onto sqlx queries.

use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::{QueryAs, QueryScalar};

/// A value that can be bound to a PostgreSQL query.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Text(String),
    OptText(Option<String>),
    BigInt(i64),
    Int(i32),
    Decimal(Decimal),
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Text(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

impl From<Option<String>> for BindValue {
    fn from(v: Option<String>) -> Self {
        BindValue::OptText(v)
    }
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::BigInt(v)
    }
}

impl From<i32> for BindValue {
    fn from(v: i32) -> Self {
        BindValue::Int(v)
    }
}

impl From<Decimal> for BindValue {
    fn from(v: Decimal) -> Self {
        BindValue::Decimal(v)
    }
}

pub fn bind_query_as<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    params: &[BindValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for p in params {
        query = match p.clone() {
            BindValue::Text(s) => query.bind(s),
            BindValue::OptText(s) => query.bind(s),
            BindValue::BigInt(n) => query.bind(n),
            BindValue::Int(n) => query.bind(n),
            BindValue::Decimal(d) => query.bind(d),
        };
    }
    query
}

pub fn bind_scalar<'q, O>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    params: &[BindValue],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for p in params {
        query = match p.clone() {
            BindValue::Text(s) => query.bind(s),
            BindValue::OptText(s) => query.bind(s),
            BindValue::BigInt(n) => query.bind(n),
            BindValue::Int(n) => query.bind(n),
            BindValue::Decimal(d) => query.bind(d),
        };
    }
    query
}
