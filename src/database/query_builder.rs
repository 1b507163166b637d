use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, Postgres};

use crate::filter::{SqlParam, SqlResult};

/// Build a `query_as` with every parameter of `sql` bound in order.
pub fn query_as<'q, O>(sql: &'q SqlResult) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    let mut q = sqlx::query_as::<_, O>(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query_as(q, p);
    }
    q
}

/// Build a plain `query` with every parameter of `sql` bound in order.
pub fn query(sql: &SqlResult) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query(q, p);
    }
    q
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Json(j) => q.bind(j),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Json(j) => q.bind(j),
    }
}
