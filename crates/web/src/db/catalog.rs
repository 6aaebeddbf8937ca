//! Product and service catalog repository.
//!
//! Rows decode straight into the selection snapshot types from `tidi-core`,
//! which is what the proposal pickers hold.

use sqlx::PgPool;

use tidi_core::selection::{ProductItem, ServiceItem};
use tidi_core::{Money, ProductId, ServiceId, WorkspaceId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    description: String,
    sell_price: Money,
    cost_price: Money,
}

impl From<ProductRow> for ProductItem {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            description: row.description,
            sell_price: row.sell_price,
            cost_price: row.cost_price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: ServiceId,
    label: String,
    price: Money,
}

impl From<ServiceRow> for ServiceItem {
    fn from(row: ServiceRow) -> Self {
        Self {
            id: row.id,
            label: row.label,
            price: row.price,
        }
    }
}

/// Repository for a workspace's catalog.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(
        &self,
        workspace: WorkspaceId,
    ) -> Result<Vec<ProductItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, description, sell_price, cost_price
            FROM tidi.product
            WHERE workspace_id = $1
            ORDER BY description, id
            ",
        )
        .bind(workspace)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(
        &self,
        workspace: WorkspaceId,
        id: ProductId,
    ) -> Result<Option<ProductItem>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, description, sell_price, cost_price
            FROM tidi.product
            WHERE workspace_id = $1 AND id = $2
            ",
        )
        .bind(workspace)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_product(
        &self,
        workspace: WorkspaceId,
        description: &str,
        sell_price: Money,
        cost_price: Money,
    ) -> Result<ProductItem, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO tidi.product (workspace_id, description, sell_price, cost_price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, description, sell_price, cost_price
            ",
        )
        .bind(workspace)
        .bind(description)
        .bind(sell_price)
        .bind(cost_price)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_services(
        &self,
        workspace: WorkspaceId,
    ) -> Result<Vec<ServiceItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, label, price FROM tidi.service WHERE workspace_id = $1 ORDER BY label, id",
        )
        .bind(workspace)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_service(
        &self,
        workspace: WorkspaceId,
        id: ServiceId,
    ) -> Result<Option<ServiceItem>, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, label, price FROM tidi.service WHERE workspace_id = $1 AND id = $2",
        )
        .bind(workspace)
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_service(
        &self,
        workspace: WorkspaceId,
        label: &str,
        price: Money,
    ) -> Result<ServiceItem, RepositoryError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r"
            INSERT INTO tidi.service (workspace_id, label, price)
            VALUES ($1, $2, $3)
            RETURNING id, label, price
            ",
        )
        .bind(workspace)
        .bind(label)
        .bind(price)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
