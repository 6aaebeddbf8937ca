//! Workspace record manager against a real database.
//!
//! Run with: `cargo test -p tidi-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use tidi_core::WorkspaceRef;
use tidi_core::workspace::{AddressInput, SlugStatus, UpdateWorkspaceInput};
use tidi_integration_tests::{TestContext, unique_suffix};
use tidi_web::db::UserRepository;
use tidi_web::services::{WorkspaceError, WorkspaceService};

/// Eight random digits, so address rows written by this test can be counted.
fn unique_cep() -> String {
    format!("{:08}", uuid::Uuid::new_v4().as_u128() % 100_000_000)
}

fn address_update(cep: &str, street: &str, phone: &str) -> UpdateWorkspaceInput {
    UpdateWorkspaceInput {
        address: AddressInput {
            cep: Some(cep.to_string()),
            address: Some(street.to_string()),
            number: Some(" 42 ".to_string()),
            city: Some("Curitiba".to_string()),
            state: Some("PR".to_string()),
            ..AddressInput::default()
        },
        logo: None,
        email: Some("contact@example.com".to_string()),
        phone: Some(phone.to_string()),
    }
}

// ============================================================================
// verify_slug
// ============================================================================

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_verify_slug() {
    let ctx = TestContext::new().await;
    let service = WorkspaceService::new(&ctx.pool);
    let owner = ctx.create_user().await;
    let workspace = ctx.create_workspace(&owner).await;

    let taken = service.verify_slug(Some(workspace.slug.as_str())).await.unwrap();
    assert_eq!(taken, Some(SlugStatus { status: false }));

    let free = format!("free-{}", unique_suffix());
    let free = service.verify_slug(Some(free.as_str())).await.unwrap();
    assert_eq!(free, Some(SlugStatus { status: true }));

    assert_eq!(service.verify_slug(Some("")).await.unwrap(), None);
    assert_eq!(service.verify_slug(None).await.unwrap(), None);
}

// ============================================================================
// create / list
// ============================================================================

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_create_marks_owner_onboarded_and_lists_in_order() {
    let ctx = TestContext::new().await;
    let service = WorkspaceService::new(&ctx.pool);
    let owner = ctx.create_user().await;
    assert!(!owner.is_onboarded);

    let first = ctx.create_workspace(&owner).await;
    let second = ctx.create_workspace(&owner).await;

    let reloaded = UserRepository::new(&ctx.pool)
        .get_by_id(owner.id)
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.is_onboarded);

    let ids: Vec<_> = service
        .get_user_workspaces(&reloaded)
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id]);

    let stranger = ctx.create_user().await;
    assert!(service.get_user_workspaces(&stranger).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_duplicate_slug_is_rejected() {
    let ctx = TestContext::new().await;
    let service = WorkspaceService::new(&ctx.pool);
    let owner = ctx.create_user().await;
    let existing = ctx.create_workspace(&owner).await;

    let duplicate = tidi_core::workspace::NewWorkspace {
        name: "Copy".to_string(),
        slug: existing.slug.clone(),
        logo: None,
        email: None,
        phone: None,
    };
    let result = service.create_workspace(&owner, duplicate).await;
    assert!(matches!(result, Err(WorkspaceError::SlugTaken)));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_blank_name_is_rejected_before_insert() {
    let ctx = TestContext::new().await;
    let service = WorkspaceService::new(&ctx.pool);
    let owner = ctx.create_user().await;
    let slug = tidi_core::Slug::parse(&format!("blank-{}", unique_suffix())).unwrap();

    let blank = tidi_core::workspace::NewWorkspace {
        name: "   ".to_string(),
        slug: slug.clone(),
        logo: None,
        email: None,
        phone: None,
    };
    let result = service.create_workspace(&owner, blank).await;
    assert!(matches!(result, Err(WorkspaceError::Invalid(_))));

    let status = service.verify_slug(Some(slug.as_str())).await.unwrap();
    assert_eq!(status, Some(SlugStatus { status: true }));
}

// ============================================================================
// update_workspace
// ============================================================================

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_first_update_creates_address_second_reuses_it() {
    let ctx = TestContext::new().await;
    let service = WorkspaceService::new(&ctx.pool);
    let owner = ctx.create_user().await;
    let workspace = ctx.create_workspace(&owner).await;
    assert!(workspace.address_id.is_none());

    let by_slug = WorkspaceRef::from(&workspace.slug);
    let updated = service
        .update_workspace(
            &owner,
            &by_slug,
            &address_update("80010-000", " Rua XV ", "(41) 3333-4444"),
        )
        .await
        .unwrap();
    let address_id = updated.address_id.expect("address linked on first update");
    assert_eq!(updated.phone.as_deref(), Some("4133334444"));
    assert_eq!(updated.email.as_deref(), Some("contact@example.com"));

    let detail = service.get_workspace_detail(&owner, &by_slug).await.unwrap();
    let address = detail.address.expect("address present");
    assert_eq!(address.cep.as_deref(), Some("80010000"));
    assert_eq!(address.address.as_deref(), Some("Rua XV"));
    assert_eq!(address.number.as_deref(), Some("42"));

    // Numeric identifier resolves the same workspace
    let by_id = WorkspaceRef::parse(&workspace.id.to_string());
    let again = service
        .update_workspace(
            &owner,
            &by_id,
            &address_update("80020-000", "Rua das Flores", "41 99999-0000"),
        )
        .await
        .unwrap();
    assert_eq!(again.address_id, Some(address_id));

    let detail = service.get_workspace_detail(&owner, &by_id).await.unwrap();
    let address = detail.address.expect("address present");
    assert_eq!(address.id, address_id);
    assert_eq!(address.cep.as_deref(), Some("80020000"));
    assert_eq!(address.address.as_deref(), Some("Rua das Flores"));
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_update_unknown_workspace_writes_nothing() {
    let ctx = TestContext::new().await;
    let service = WorkspaceService::new(&ctx.pool);
    let owner = ctx.create_user().await;

    let cep = unique_cep();
    let missing = WorkspaceRef::parse(&format!("missing-{}", unique_suffix()));
    let result = service
        .update_workspace(&owner, &missing, &address_update(&cep, "Rua XV", "41"))
        .await;

    assert!(matches!(result, Err(WorkspaceError::NotFound)));
    assert_eq!(
        result.map(|_| ()).unwrap_err().to_string(),
        "Workspace doesn't exist"
    );
    assert_eq!(ctx.addresses_with_cep(&cep).await, 0);
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_update_by_non_owner_is_not_found() {
    let ctx = TestContext::new().await;
    let service = WorkspaceService::new(&ctx.pool);
    let owner = ctx.create_user().await;
    let stranger = ctx.create_user().await;
    let workspace = ctx.create_workspace(&owner).await;

    let result = service
        .update_workspace(
            &stranger,
            &WorkspaceRef::from(workspace.id),
            &address_update("80010-000", "Rua XV", "41"),
        )
        .await;
    assert!(matches!(result, Err(WorkspaceError::NotFound)));

    let untouched = service
        .get_workspace(&owner, &WorkspaceRef::from(workspace.id))
        .await
        .unwrap();
    assert!(untouched.address_id.is_none());
}

#[tokio::test]
#[ignore = "Requires running PostgreSQL"]
async fn test_failed_workspace_write_rolls_back_new_address() {
    let ctx = TestContext::new().await;
    let service = WorkspaceService::new(&ctx.pool);
    let owner = ctx.create_user().await;
    let workspace = ctx.create_workspace(&owner).await;

    // Make the workspace UPDATE fail for this row only, after the address
    // INSERT has already run in the same transaction.
    let suffix = unique_suffix();
    let function = format!("tidi.reject_workspace_update_{suffix}");
    let trigger = format!("reject_workspace_update_{suffix}");
    sqlx::query(&format!(
        r"
        CREATE FUNCTION {function}() RETURNS trigger AS $$
        BEGIN
            IF NEW.id = {id} THEN
                RAISE EXCEPTION 'workspace update rejected';
            END IF;
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        ",
        id = workspace.id.as_i32()
    ))
    .execute(&ctx.pool)
    .await
    .unwrap();
    sqlx::query(&format!(
        "CREATE TRIGGER {trigger} BEFORE UPDATE ON tidi.workspace \
         FOR EACH ROW EXECUTE FUNCTION {function}()"
    ))
    .execute(&ctx.pool)
    .await
    .unwrap();

    let cep = unique_cep();
    let result = service
        .update_workspace(
            &owner,
            &WorkspaceRef::from(workspace.id),
            &address_update(&cep, "Rua XV", "41 3333-4444"),
        )
        .await;

    sqlx::query(&format!("DROP TRIGGER {trigger} ON tidi.workspace"))
        .execute(&ctx.pool)
        .await
        .unwrap();
    sqlx::query(&format!("DROP FUNCTION {function}()"))
        .execute(&ctx.pool)
        .await
        .unwrap();

    assert!(matches!(result, Err(WorkspaceError::Repository(_))));
    assert_eq!(ctx.addresses_with_cep(&cep).await, 0);

    let untouched = service
        .get_workspace(&owner, &WorkspaceRef::from(workspace.id))
        .await
        .unwrap();
    assert!(untouched.address_id.is_none());
    assert!(untouched.phone.is_none());
}
