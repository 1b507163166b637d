use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::manager::DatabaseError;
use super::models::User;
use super::query_builder;
use super::UserStore;
use crate::filter::{Filter, FilterTarget, ItemFilter, SqlBuilder, SqlParam};

/// User columns plus the number of recipes each user authored. Callers
/// append `GROUP BY users.id`.
const USER_SELECT: &str = r#"SELECT users.id, users.email, users.name,
        users.role, users.lastlog, users.creation_date,
        COUNT(recipes.id) AS recipes_authored
    FROM users
    LEFT JOIN recipes
        ON users.id = recipes.author_id"#;

/// Columns returned by writes that touch a single user row. A write never
/// changes authorship, so the recipe count is read back separately when it
/// matters.
const USER_RETURNING: &str =
    "RETURNING id, email, name, role, lastlog, creation_date, 0::bigint AS recipes_authored";

/// Postgres-backed [`UserStore`].
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select_one(&self, column: &str, value: impl Into<SqlParam> + Send) -> Result<Option<User>, DatabaseError> {
        let mut b = SqlBuilder::new(USER_SELECT);
        b.push(&format!(" WHERE users.{} = ", column))
            .push_bind(value)
            .push(" GROUP BY users.id");
        let sql = b.finish();
        let user: Option<User> = query_builder::query_as(&sql).fetch_optional(&self.pool).await?;
        Ok(user)
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn list(&self, filter: &ItemFilter) -> Result<Vec<User>, DatabaseError> {
        let sql = Filter::from_item_filter(FilterTarget::Users, filter).to_sql(USER_SELECT);
        let users: Vec<User> = query_builder::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn get(&self, id: i32) -> Result<User, DatabaseError> {
        self.select_one("id", id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))
    }

    async fn create(&self, user: &User) -> Result<User, DatabaseError> {
        let sql = format!("INSERT INTO users (email, role) VALUES ($1, $2) {}", USER_RETURNING);
        let created: User = sqlx::query_as(&sql)
            .bind(&user.email)
            .bind(&user.role)
            .fetch_one(&self.pool)
            .await?;
        debug!("Created user {} <{}>", created.id, created.email);
        Ok(created)
    }

    async fn update(&self, id: i32, user: &User) -> Result<User, DatabaseError> {
        let updated = sqlx::query("UPDATE users SET (email, role) = ($1, $2) WHERE id = $3")
            .bind(&user.email)
            .bind(&user.role)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {}", id)));
        }
        // Read it back with the join.
        self.get(id).await
    }

    async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn get_by_token(&self, token: &str) -> Result<User, DatabaseError> {
        self.select_one("token", token)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("session token".to_string()))
    }

    async fn record_login(&self, email: &str, name: &str, token: &str) -> Result<User, DatabaseError> {
        let sql = format!(
            "UPDATE users SET (token, name, lastlog) = ($1, $2, CURRENT_TIMESTAMP) WHERE email = $3 {}",
            USER_RETURNING
        );
        let user: Option<User> = sqlx::query_as(&sql)
            .bind(token)
            .bind(name)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or_else(|| DatabaseError::NotFound(format!("user with email {}", email)))
    }

    async fn logout(&self, token: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET (token, lastlog) = (NULL, CURRENT_TIMESTAMP) WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
