//! Workspace catalog: the products and services proposals pick from.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use tidi_core::selection::{ProductItem, ServiceItem};
use tidi_core::{Money, WorkspaceId, WorkspaceRef};

use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::middleware::Requester;
use crate::models::User;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NewProduct {
    pub description: String,
    pub sell_price: Money,
    pub cost_price: Money,
}

#[derive(Debug, Deserialize)]
pub struct NewService {
    pub label: String,
    pub price: Money,
}

async fn owned_workspace(state: &AppState, user: &User, identifier: &str) -> Result<WorkspaceId> {
    let identifier = WorkspaceRef::parse(identifier);
    Ok(state.workspaces().get_workspace(user, &identifier).await?.id)
}

fn required_text(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn non_negative(price: Money, field: &str) -> Result<Money> {
    if price < Money::ZERO {
        return Err(AppError::BadRequest(format!("{field} cannot be negative")));
    }
    Ok(price)
}

pub async fn list_products(
    State(state): State<AppState>,
    Requester(user): Requester,
    Path(identifier): Path<String>,
) -> Result<Json<Vec<ProductItem>>> {
    let workspace = owned_workspace(&state, &user, &identifier).await?;
    let products = CatalogRepository::new(state.pool())
        .list_products(workspace)
        .await?;
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    Requester(user): Requester,
    Path(identifier): Path<String>,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductItem>)> {
    let workspace = owned_workspace(&state, &user, &identifier).await?;
    let description = required_text(&body.description, "description")?;
    let sell_price = non_negative(body.sell_price, "sell_price")?;
    let cost_price = non_negative(body.cost_price, "cost_price")?;

    let product = CatalogRepository::new(state.pool())
        .create_product(workspace, &description, sell_price, cost_price)
        .await?;

    tracing::info!(workspace_id = %workspace, product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list_services(
    State(state): State<AppState>,
    Requester(user): Requester,
    Path(identifier): Path<String>,
) -> Result<Json<Vec<ServiceItem>>> {
    let workspace = owned_workspace(&state, &user, &identifier).await?;
    let services = CatalogRepository::new(state.pool())
        .list_services(workspace)
        .await?;
    Ok(Json(services))
}

pub async fn create_service(
    State(state): State<AppState>,
    Requester(user): Requester,
    Path(identifier): Path<String>,
    Json(body): Json<NewService>,
) -> Result<(StatusCode, Json<ServiceItem>)> {
    let workspace = owned_workspace(&state, &user, &identifier).await?;
    let label = required_text(&body.label, "label")?;
    let price = non_negative(body.price, "price")?;

    let service = CatalogRepository::new(state.pool())
        .create_service(workspace, &label, price)
        .await?;

    tracing::info!(workspace_id = %workspace, service_id = %service.id, "service created");
    Ok((StatusCode::CREATED, Json(service)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_trims() {
        assert_eq!(
            required_text("  Solar panel ", "description").ok().as_deref(),
            Some("Solar panel")
        );
        assert!(matches!(
            required_text("   ", "description"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        assert!(non_negative(Money::from_cents(-1), "price").is_err());
        assert!(non_negative(Money::ZERO, "price").is_ok());
    }
}
