//! Proposal pickers over the session.
//!
//! Each browser session holds one product selection and one service
//! selection, stored under the picker's cache key as the same JSON the
//! picker writes. Every request loads the stored list, applies one picker
//! operation and writes the result back.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use tidi_core::selection::{
    Picker, ProductItem, Quantity, SelectedItem, Selectable, SelectionCache, SelectionError,
    SelectionListener, SelectionTotals, ServiceItem,
};
use tidi_core::{ProductId, ServiceId, WorkspaceId, WorkspaceRef};

use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, Requester};
use crate::models::User;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Which workspace catalog to pick from.
#[derive(Debug, Deserialize)]
pub struct WorkspaceQuery {
    pub workspace: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemRequest<Id> {
    pub id: Id,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest<Id> {
    pub id: Id,
    pub quantity: u32,
}

/// Parent-supplied list the picker starts from.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Selectable"))]
pub struct SeedRequest<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<SelectedItem<T>>,
}

/// Selection as returned to the client.
#[derive(Debug, Serialize)]
pub struct SelectionView<T> {
    pub items: Vec<SelectedItem<T>>,
    #[serde(flatten)]
    pub totals: SelectionTotals,
}

// =============================================================================
// Session Plumbing
// =============================================================================

/// Holds the last value the picker wrote until it is flushed to the session.
#[derive(Debug, Default)]
struct PendingWrite {
    latest: Option<(&'static str, String)>,
}

impl SelectionCache for PendingWrite {
    fn write(&mut self, key: &'static str, value: String) {
        self.latest = Some((key, value));
    }
}

impl PendingWrite {
    async fn flush(self, session: &Session) -> Result<()> {
        if let Some((key, value)) = self.latest {
            session.insert(key, value).await?;
        }
        Ok(())
    }
}

/// Keeps the most recent list and totals the picker published.
struct LatestSelection<T> {
    items: Vec<SelectedItem<T>>,
    totals: SelectionTotals,
}

impl<T> Default for LatestSelection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            totals: SelectionTotals::default(),
        }
    }
}

impl<T: Clone> SelectionListener<T> for LatestSelection<T> {
    fn items_changed(&mut self, items: &[SelectedItem<T>]) {
        self.items = items.to_vec();
    }

    fn totals_changed(&mut self, totals: SelectionTotals) {
        self.totals = totals;
    }
}

impl<T> From<LatestSelection<T>> for SelectionView<T> {
    fn from(latest: LatestSelection<T>) -> Self {
        Self {
            items: latest.items,
            totals: latest.totals,
        }
    }
}

type SessionPicker<T> = Picker<T, PendingWrite, LatestSelection<T>>;

/// Read the stored selection. A missing or unreadable entry is an empty list.
async fn load_selection<T: Selectable>(session: &Session) -> Result<Vec<SelectedItem<T>>> {
    let Some(raw) = session.get::<String>(T::CACHE_KEY).await? else {
        return Ok(Vec::new());
    };

    Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, key = T::CACHE_KEY, "Discarding unreadable selection");
        Vec::new()
    }))
}

/// Run one picker operation against the session's selection.
async fn apply<T, F>(
    session: &Session,
    initial: Option<Vec<SelectedItem<T>>>,
    operation: F,
) -> Result<Json<SelectionView<T>>>
where
    T: Selectable + Send + Sync,
    F: FnOnce(&mut SessionPicker<T>) -> std::result::Result<(), SelectionError> + Send,
{
    let initial = match initial {
        Some(items) => items,
        None => load_selection::<T>(session).await?,
    };

    let mut picker = Picker::new(initial, PendingWrite::default(), LatestSelection::default())?;
    operation(&mut picker)?;
    let (_, pending, latest) = picker.into_parts();

    pending.flush(session).await?;
    Ok(Json(latest.into()))
}

async fn workspace_id(
    state: &AppState,
    requester: &User,
    query: &WorkspaceQuery,
) -> Result<WorkspaceId> {
    let identifier = WorkspaceRef::parse(&query.workspace);
    let workspace = state.workspaces().get_workspace(requester, &identifier).await?;
    Ok(workspace.id)
}

// =============================================================================
// Product Picker
// =============================================================================

/// Current product selection.
pub async fn products_selection(
    RequireAuth(_user): RequireAuth,
    session: Session,
) -> Result<Json<SelectionView<ProductItem>>> {
    apply::<ProductItem, _>(&session, None, |_| Ok(())).await
}

/// Replace the product selection with the parent's list.
pub async fn seed_products(
    RequireAuth(_user): RequireAuth,
    session: Session,
    Json(body): Json<SeedRequest<ProductItem>>,
) -> Result<Json<SelectionView<ProductItem>>> {
    apply(&session, Some(body.items), |_| Ok(())).await
}

/// Select or unselect a product from the workspace catalog.
pub async fn toggle_product(
    State(state): State<AppState>,
    Requester(user): Requester,
    session: Session,
    Query(query): Query<WorkspaceQuery>,
    Json(body): Json<ItemRequest<ProductId>>,
) -> Result<Json<SelectionView<ProductItem>>> {
    let workspace = workspace_id(&state, &user, &query).await?;
    let product = CatalogRepository::new(state.pool())
        .get_product(workspace, body.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", body.id)))?;

    apply(&session, None, move |picker| picker.toggle(product)).await
}

/// Change the quantity of a selected product.
pub async fn set_product_quantity(
    RequireAuth(_user): RequireAuth,
    session: Session,
    Json(body): Json<QuantityRequest<ProductId>>,
) -> Result<Json<SelectionView<ProductItem>>> {
    apply::<ProductItem, _>(&session, None, move |picker| {
        picker.set_quantity(body.id, Quantity::new(body.quantity))
    })
    .await
}

/// Drop a product from the selection.
pub async fn remove_product(
    RequireAuth(_user): RequireAuth,
    session: Session,
    Json(body): Json<ItemRequest<ProductId>>,
) -> Result<Json<SelectionView<ProductItem>>> {
    apply::<ProductItem, _>(&session, None, move |picker| picker.remove(body.id)).await
}

// =============================================================================
// Service Picker
// =============================================================================

/// Current service selection.
pub async fn services_selection(
    RequireAuth(_user): RequireAuth,
    session: Session,
) -> Result<Json<SelectionView<ServiceItem>>> {
    apply::<ServiceItem, _>(&session, None, |_| Ok(())).await
}

/// Replace the service selection with the parent's list.
pub async fn seed_services(
    RequireAuth(_user): RequireAuth,
    session: Session,
    Json(body): Json<SeedRequest<ServiceItem>>,
) -> Result<Json<SelectionView<ServiceItem>>> {
    apply(&session, Some(body.items), |_| Ok(())).await
}

/// Select or unselect a service from the workspace catalog.
pub async fn toggle_service(
    State(state): State<AppState>,
    Requester(user): Requester,
    session: Session,
    Query(query): Query<WorkspaceQuery>,
    Json(body): Json<ItemRequest<ServiceId>>,
) -> Result<Json<SelectionView<ServiceItem>>> {
    let workspace = workspace_id(&state, &user, &query).await?;
    let service = CatalogRepository::new(state.pool())
        .get_service(workspace, body.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("service {}", body.id)))?;

    apply(&session, None, move |picker| picker.toggle(service)).await
}

/// Change the quantity of a selected service.
pub async fn set_service_quantity(
    RequireAuth(_user): RequireAuth,
    session: Session,
    Json(body): Json<QuantityRequest<ServiceId>>,
) -> Result<Json<SelectionView<ServiceItem>>> {
    apply::<ServiceItem, _>(&session, None, move |picker| {
        picker.set_quantity(body.id, Quantity::new(body.quantity))
    })
    .await
}

/// Drop a service from the selection.
pub async fn remove_service(
    RequireAuth(_user): RequireAuth,
    session: Session,
    Json(body): Json<ItemRequest<ServiceId>>,
) -> Result<Json<SelectionView<ServiceItem>>> {
    apply::<ServiceItem, _>(&session, None, move |picker| picker.remove(body.id)).await
}
