//! Workspace and address repository.
//!
//! The address of a workspace is created lazily: the first update inserts it
//! and links it, later updates rewrite the same row. Both writes happen in the
//! transaction that locks the workspace row, so two concurrent first updates
//! cannot each create an address.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tidi_core::workspace::{AddressWrite, NewWorkspace, NormalizedAddress, WorkspaceContact};
use tidi_core::{AddressId, Slug, UserId, WorkspaceId, WorkspaceRef};

use super::RepositoryError;
use crate::models::{Address, Workspace};

const WORKSPACE_COLUMNS: &str =
    "id, name, slug, owner_id, address_id, logo, email, phone, created_at, updated_at";

const ADDRESS_COLUMNS: &str = "id, cep, address, number, neighborhood, city, state, complement";

#[derive(Debug, sqlx::FromRow)]
struct WorkspaceRow {
    id: WorkspaceId,
    name: String,
    slug: String,
    owner_id: UserId,
    address_id: Option<AddressId>,
    logo: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WorkspaceRow> for Workspace {
    type Error = RepositoryError;

    fn try_from(row: WorkspaceRow) -> Result<Self, Self::Error> {
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            slug,
            owner_id: row.owner_id,
            address_id: row.address_id,
            logo: row.logo,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    cep: Option<String>,
    address: Option<String>,
    number: Option<String>,
    neighborhood: Option<String>,
    city: Option<String>,
    state: Option<String>,
    complement: Option<String>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            cep: row.cep,
            address: row.address,
            number: row.number,
            neighborhood: row.neighborhood,
            city: row.city,
            state: row.state,
            complement: row.complement,
        }
    }
}

/// Bind values for `WHERE id = $1 OR slug = $2`; the unused side is `NULL`.
fn lookup_keys(workspace: &WorkspaceRef) -> (Option<WorkspaceId>, Option<&str>) {
    match workspace {
        WorkspaceRef::Id(id) => (Some(*id), None),
        WorkspaceRef::Slug(slug) => (None, Some(slug.as_str())),
    }
}

/// Repository for workspace database operations.
pub struct WorkspaceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WorkspaceRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether any workspace uses `slug`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM tidi.workspace WHERE slug = $1)",
        )
        .bind(slug)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a workspace owned by `owner` and mark the owner onboarded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        owner: UserId,
        data: &NewWorkspace,
    ) -> Result<Workspace, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
            r"
            INSERT INTO tidi.workspace (name, slug, owner_id, logo, email, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {WORKSPACE_COLUMNS}
            "
        ))
        .bind(&data.name)
        .bind(data.slug.as_str())
        .bind(owner)
        .bind(data.logo.as_deref())
        .bind(data.email.as_deref())
        .bind(data.phone.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "slug"))?;

        sqlx::query(
            r"
            UPDATE tidi.user
            SET is_onboarded = TRUE, updated_at = NOW()
            WHERE id = $1 AND NOT is_onboarded
            ",
        )
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Find a workspace by id or slug, restricted to `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_owned(
        &self,
        owner: UserId,
        workspace: &WorkspaceRef,
    ) -> Result<Option<Workspace>, RepositoryError> {
        let (id, slug) = lookup_keys(workspace);
        let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
            r"
            SELECT {WORKSPACE_COLUMNS}
            FROM tidi.workspace
            WHERE (id = $1 OR slug = $2) AND owner_id = $3
            "
        ))
        .bind(id)
        .bind(slug)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Find a workspace by id or slug regardless of owner. Operator tooling only.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(
        &self,
        workspace: &WorkspaceRef,
    ) -> Result<Option<Workspace>, RepositoryError> {
        let (id, slug) = lookup_keys(workspace);
        let row = sqlx::query_as::<_, WorkspaceRow>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM tidi.workspace WHERE id = $1 OR slug = $2"
        ))
        .bind(id)
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// All workspaces owned by `owner`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Workspace>, RepositoryError> {
        let rows = sqlx::query_as::<_, WorkspaceRow>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM tidi.workspace WHERE owner_id = $1 ORDER BY id"
        ))
        .bind(owner)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an address by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_address(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM tidi.address WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Write the address and contact fields of a workspace atomically.
    ///
    /// The workspace row is locked first. If it already links an address that
    /// row is updated, otherwise a new address is inserted and linked. Nothing
    /// is written when the workspace is missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no workspace matches for `owner`.
    /// Returns `RepositoryError::DataCorruption` if the linked address is gone.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_with_address(
        &self,
        owner: UserId,
        workspace: &WorkspaceRef,
        address: &NormalizedAddress,
        contact: &WorkspaceContact,
    ) -> Result<(Workspace, AddressWrite), RepositoryError> {
        let (id, slug) = lookup_keys(workspace);
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, WorkspaceRow>(&format!(
            r"
            SELECT {WORKSPACE_COLUMNS}
            FROM tidi.workspace
            WHERE (id = $1 OR slug = $2) AND owner_id = $3
            FOR UPDATE
            "
        ))
        .bind(id)
        .bind(slug)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let write = AddressWrite::for_linked(current.address_id);
        let address_id = match write {
            AddressWrite::UpdateExisting(address_id) => {
                let result = sqlx::query(
                    r"
                    UPDATE tidi.address
                    SET cep = $1, address = $2, number = $3, neighborhood = $4,
                        city = $5, state = $6, complement = $7, updated_at = NOW()
                    WHERE id = $8
                    ",
                )
                .bind(address.cep.as_deref())
                .bind(address.address.as_deref())
                .bind(address.number.as_deref())
                .bind(address.neighborhood.as_deref())
                .bind(address.city.as_deref())
                .bind(address.state.as_deref())
                .bind(address.complement.as_deref())
                .bind(address_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(RepositoryError::DataCorruption(format!(
                        "workspace {} links missing address {address_id}",
                        current.id
                    )));
                }
                address_id
            }
            AddressWrite::CreateAndLink => {
                sqlx::query_scalar::<_, AddressId>(
                    r"
                    INSERT INTO tidi.address
                        (cep, address, number, neighborhood, city, state, complement)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING id
                    ",
                )
                .bind(address.cep.as_deref())
                .bind(address.address.as_deref())
                .bind(address.number.as_deref())
                .bind(address.neighborhood.as_deref())
                .bind(address.city.as_deref())
                .bind(address.state.as_deref())
                .bind(address.complement.as_deref())
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let updated = sqlx::query_as::<_, WorkspaceRow>(&format!(
            r"
            UPDATE tidi.workspace
            SET logo = COALESCE($1, logo),
                email = COALESCE($2, email),
                phone = $3,
                address_id = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING {WORKSPACE_COLUMNS}
            "
        ))
        .bind(contact.logo.as_deref())
        .bind(contact.email.as_deref())
        .bind(contact.phone.as_deref())
        .bind(address_id)
        .bind(current.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((updated.try_into()?, write))
    }
}
