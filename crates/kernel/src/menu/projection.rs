//! Projected queries for model-bound menu options.
//!
//! A `model` descriptor names an entity class and two of its attributes. The
//! projection registry maps each class name to an explicitly registered
//! query capability that returns those two attributes as option pairs.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_query::{Alias, Expr, PostgresQueryBuilder, Query};
use sqlx::PgPool;
use tracing::debug;

use super::descriptor::EntityDeclaration;
use super::error::ResolveError;
use super::resolver::OptionPair;

/// A read-only projection of one entity type.
#[async_trait]
pub trait ProjectedQuery: Send + Sync {
    /// Columns that may be used as an option id or name.
    fn columns(&self) -> &[String];

    /// Select every row, projecting `id_field` and `name_field` as id/name.
    async fn fetch(&self, id_field: &str, name_field: &str) -> Result<Vec<OptionPair>>;
}

/// Registry of entity projections, keyed by class name.
#[derive(Default)]
pub struct ProjectionRegistry {
    entities: HashMap<String, Arc<dyn ProjectedQuery>>,
}

impl ProjectionRegistry {
    /// Create an empty projection registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table-backed projection for every declared entity.
    pub fn from_declarations<'a>(
        pool: &PgPool,
        declarations: impl IntoIterator<Item = &'a EntityDeclaration>,
    ) -> Self {
        let mut registry = Self::new();
        for decl in declarations {
            registry.register(
                &decl.class,
                Arc::new(TableProjection::new(
                    pool.clone(),
                    &decl.table,
                    decl.columns.clone(),
                )),
            );
        }
        registry
    }

    /// Register (or replace) the projection for a class.
    pub fn register(&mut self, class: &str, query: Arc<dyn ProjectedQuery>) {
        self.entities.insert(class.to_string(), query);
    }

    /// Get projection count.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Query `class`, selecting `id_field` and `name_field` aliased as id/name.
    pub async fn query_projected(
        &self,
        class: &str,
        id_field: &str,
        name_field: &str,
    ) -> Result<Vec<OptionPair>, ResolveError> {
        let query = self
            .entities
            .get(class)
            .ok_or_else(|| ResolveError::UnknownEntity(class.to_string()))?;

        for column in [id_field, name_field] {
            if !query.columns().iter().any(|c| c == column) {
                return Err(ResolveError::UnknownField {
                    entity: class.to_string(),
                    column: column.to_string(),
                });
            }
        }

        let rows = query.fetch(id_field, name_field).await?;
        debug!(entity = %class, rows = rows.len(), "projected query");
        Ok(rows)
    }
}

/// PostgreSQL projection over a single table.
pub struct TableProjection {
    pool: PgPool,
    table: String,
    columns: Vec<String>,
}

impl TableProjection {
    /// Create a projection over `table`, allowing only `columns`.
    pub fn new(pool: PgPool, table: &str, columns: Vec<String>) -> Self {
        Self {
            pool,
            table: table.to_string(),
            columns,
        }
    }
}

/// Build the projection SQL. Identifiers are quoted by the builder and both
/// columns are cast to text.
fn projection_sql(table: &str, id_field: &str, name_field: &str) -> String {
    Query::select()
        .expr_as(
            Expr::col(Alias::new(id_field)).cast_as(Alias::new("TEXT")),
            Alias::new("id"),
        )
        .expr_as(
            Expr::col(Alias::new(name_field)).cast_as(Alias::new("TEXT")),
            Alias::new("name"),
        )
        .from(Alias::new(table))
        .to_string(PostgresQueryBuilder)
}

#[async_trait]
impl ProjectedQuery for TableProjection {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    async fn fetch(&self, id_field: &str, name_field: &str) -> Result<Vec<OptionPair>> {
        let sql = projection_sql(&self.table, id_field, name_field);
        let rows: Vec<(Option<String>, Option<String>)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to project table {}", self.table))?;

        // NULL renders as the empty string
        Ok(rows
            .into_iter()
            .map(|(id, name)| OptionPair::new(id.unwrap_or_default(), name.unwrap_or_default()))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    struct FixedRows {
        columns: Vec<String>,
    }

    #[async_trait]
    impl ProjectedQuery for FixedRows {
        fn columns(&self) -> &[String] {
            &self.columns
        }

        async fn fetch(&self, id_field: &str, name_field: &str) -> Result<Vec<OptionPair>> {
            Ok(vec![OptionPair::new(id_field, name_field)])
        }
    }

    fn registry() -> ProjectionRegistry {
        let mut registry = ProjectionRegistry::new();
        registry.register(
            "Item",
            Arc::new(FixedRows {
                columns: vec!["id_item".to_string(), "title".to_string()],
            }),
        );
        registry
    }

    #[tokio::test]
    async fn query_registered_entity() {
        let rows = registry()
            .query_projected("Item", "id_item", "title")
            .await
            .unwrap();
        assert_eq!(rows, vec![OptionPair::new("id_item", "title")]);
    }

    #[tokio::test]
    async fn unknown_entity_is_an_error() {
        let err = registry()
            .query_projected("Ghost", "id", "name")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownEntity(c) if c == "Ghost"));
    }

    #[tokio::test]
    async fn column_outside_whitelist_is_rejected() {
        let err = registry()
            .query_projected("Item", "id_item", "password")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownField { column, .. } if column == "password"));
    }

    #[test]
    fn projection_sql_casts_and_quotes_identifiers() {
        assert_eq!(
            projection_sql("catalog_item", "id_item", "title"),
            r#"SELECT CAST("id_item" AS TEXT) AS "id", CAST("title" AS TEXT) AS "name" FROM "catalog_item""#
        );
    }

    #[test]
    fn projection_sql_escapes_embedded_quotes() {
        assert_eq!(
            projection_sql("odd\"table", "id", "name"),
            r#"SELECT CAST("id" AS TEXT) AS "id", CAST("name" AS TEXT) AS "name" FROM "odd""table""#
        );
    }
}
