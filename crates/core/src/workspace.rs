//! Workspace identifiers and update payloads.
//!
//! Incoming payloads are normalized here, before they reach the database:
//! free-text address fields are trimmed, postal code and phone keep only
//! alphanumeric characters, and blank values become `None`.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{AddressId, Slug, WorkspaceId};

/// How a request refers to a workspace: by numeric id or by slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkspaceRef {
    Id(WorkspaceId),
    Slug(String),
}

impl WorkspaceRef {
    /// Interpret a path segment.
    ///
    /// A non-empty string made only of ASCII digits that fits in an `i32` is
    /// an id; anything else is looked up as a slug.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if is_number(raw)
            && let Ok(id) = raw.parse::<i32>()
        {
            return Self::Id(WorkspaceId::new(id));
        }
        Self::Slug(raw.to_owned())
    }
}

impl fmt::Display for WorkspaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Slug(slug) => f.write_str(slug),
        }
    }
}

impl From<WorkspaceId> for WorkspaceRef {
    fn from(id: WorkspaceId) -> Self {
        Self::Id(id)
    }
}

impl From<&Slug> for WorkspaceRef {
    fn from(slug: &Slug) -> Self {
        Self::Slug(slug.as_str().to_owned())
    }
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Keep only ASCII letters and digits (`"01310-100"` → `"01310100"`).
///
/// Returns `None` when nothing is left.
#[must_use]
pub fn remove_special_characters(value: Option<&str>) -> Option<String> {
    let cleaned: String = value?
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

fn trimmed(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Address fields as submitted by the workspace settings form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub cep: Option<String>,
    pub address: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub complement: Option<String>,
}

/// Address fields ready to be written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAddress {
    pub cep: Option<String>,
    pub address: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub complement: Option<String>,
}

impl AddressInput {
    #[must_use]
    pub fn normalize(&self) -> NormalizedAddress {
        NormalizedAddress {
            cep: remove_special_characters(self.cep.as_deref()),
            address: trimmed(self.address.as_deref()),
            number: trimmed(self.number.as_deref()),
            neighborhood: trimmed(self.neighborhood.as_deref()),
            city: trimmed(self.city.as_deref()),
            state: trimmed(self.state.as_deref()),
            complement: trimmed(self.complement.as_deref()),
        }
    }
}

/// Payload of a workspace update: the address plus contact/branding fields.
///
/// The form posts everything flat, so the address fields are flattened in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateWorkspaceInput {
    #[serde(flatten)]
    pub address: AddressInput,
    pub logo: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Contact/branding columns of an update.
///
/// `logo` and `email` of `None` leave the stored value untouched; `phone` is
/// always written, so an absent phone clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceContact {
    pub logo: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl UpdateWorkspaceInput {
    /// Split into normalized address and contact parts.
    #[must_use]
    pub fn normalize(&self) -> (NormalizedAddress, WorkspaceContact) {
        let contact = WorkspaceContact {
            logo: self.logo.clone(),
            email: self.email.clone(),
            phone: remove_special_characters(self.phone.as_deref()),
        };
        (self.address.normalize(), contact)
    }
}

/// Payload for creating a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWorkspace {
    pub name: String,
    pub slug: Slug,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A workspace payload that cannot be stored.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NewWorkspaceError {
    #[error("Workspace name is required")]
    BlankName,
}

impl NewWorkspace {
    /// Trim the name and strip formatting from the phone.
    ///
    /// # Errors
    ///
    /// Returns `NewWorkspaceError::BlankName` if the name is empty once
    /// trimmed.
    pub fn normalized(mut self) -> Result<Self, NewWorkspaceError> {
        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            return Err(NewWorkspaceError::BlankName);
        }
        self.phone = remove_special_characters(self.phone.as_deref());
        self.email = trimmed(self.email.as_deref());
        Ok(self)
    }
}

/// What an update does to the workspace's address row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressWrite {
    /// The workspace already links this address: update it in place.
    UpdateExisting(AddressId),
    /// No address yet: insert one and link it.
    CreateAndLink,
}

impl AddressWrite {
    /// Decide from the workspace's current `address_id`.
    #[must_use]
    pub const fn for_linked(address_id: Option<AddressId>) -> Self {
        match address_id {
            Some(id) => Self::UpdateExisting(id),
            None => Self::CreateAndLink,
        }
    }
}

/// Answer to "is this slug free?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlugStatus {
    /// `true` when no workspace uses the slug.
    pub status: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_ref_numeric_is_id() {
        assert_eq!(
            WorkspaceRef::parse("19"),
            WorkspaceRef::Id(WorkspaceId::new(19))
        );
        assert_eq!(
            WorkspaceRef::parse(" 7 "),
            WorkspaceRef::Id(WorkspaceId::new(7))
        );
    }

    #[test]
    fn test_workspace_ref_other_is_slug() {
        assert_eq!(
            WorkspaceRef::parse("acme-2"),
            WorkspaceRef::Slug("acme-2".to_owned())
        );
        assert_eq!(WorkspaceRef::parse("-3"), WorkspaceRef::Slug("-3".to_owned()));
        assert_eq!(WorkspaceRef::parse("1.5"), WorkspaceRef::Slug("1.5".to_owned()));
        // Too large for an id column: can only be a slug.
        assert_eq!(
            WorkspaceRef::parse("99999999999"),
            WorkspaceRef::Slug("99999999999".to_owned())
        );
    }

    #[test]
    fn test_remove_special_characters() {
        assert_eq!(
            remove_special_characters(Some("01310-100")),
            Some("01310100".to_owned())
        );
        assert_eq!(
            remove_special_characters(Some("+55 (11) 98765-4321")),
            Some("5511987654321".to_owned())
        );
        assert_eq!(remove_special_characters(Some(" - ")), None);
        assert_eq!(remove_special_characters(None), None);
    }

    #[test]
    fn test_update_input_normalize() {
        let input: UpdateWorkspaceInput = serde_json::from_value(serde_json::json!({
            "cep": "01310-100",
            "address": "  Av. Paulista ",
            "number": "1000",
            "neighborhood": "   ",
            "city": "São Paulo",
            "state": " SP",
            "logo": "https://cdn.example.com/logo.png",
            "phone": "(11) 3333-4444"
        }))
        .unwrap();

        let (address, contact) = input.normalize();
        assert_eq!(address.cep.as_deref(), Some("01310100"));
        assert_eq!(address.address.as_deref(), Some("Av. Paulista"));
        assert_eq!(address.neighborhood, None);
        assert_eq!(address.state.as_deref(), Some("SP"));
        assert_eq!(address.complement, None);
        assert_eq!(contact.phone.as_deref(), Some("1133334444"));
        assert_eq!(contact.email, None);
    }

    #[test]
    fn test_address_write_decision() {
        assert_eq!(AddressWrite::for_linked(None), AddressWrite::CreateAndLink);
        assert_eq!(
            AddressWrite::for_linked(Some(AddressId::new(3))),
            AddressWrite::UpdateExisting(AddressId::new(3))
        );
    }

    #[test]
    fn test_new_workspace_rejects_numeric_slug() {
        let result: Result<NewWorkspace, _> = serde_json::from_value(serde_json::json!({
            "name": "Acme",
            "slug": "123"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_new_workspace_normalized() {
        let data = NewWorkspace {
            name: "  Acme Solar ".to_string(),
            slug: Slug::parse("acme-solar").unwrap(),
            logo: None,
            email: Some("  ".to_string()),
            phone: Some("(41) 3333-4444".to_string()),
        }
        .normalized()
        .unwrap();
        assert_eq!(data.name, "Acme Solar");
        assert_eq!(data.email, None);
        assert_eq!(data.phone.as_deref(), Some("4133334444"));
    }

    #[test]
    fn test_new_workspace_blank_name_rejected() {
        let data = NewWorkspace {
            name: " \t ".to_string(),
            slug: Slug::parse("acme").unwrap(),
            logo: None,
            email: None,
            phone: None,
        };
        assert_eq!(data.normalized(), Err(NewWorkspaceError::BlankName));
    }
}
