mod common;

use assert_matches::assert_matches;
use common::TestApp;
use news_cms_api::entities::{account_role, role_claim};
use news_cms_api::errors::ServiceError;
use news_cms_api::services::account::{
    LoginRequest, RegisterRequest, UpdateAccountRequest, DEFAULT_ROLE, EMAIL_TAKEN, LOGIN_FAILED,
    USER_NOT_FOUND,
};
use news_cms_api::services::role::find_role_by_name;
use rstest::rstest;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

const PASSWORD: &str = "Passw0rd!";

fn registration(email: &str, roles: &[&str]) -> RegisterRequest {
    RegisterRequest {
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        email: email.into(),
        address: "Arlington".into(),
        age: 40,
        password: PASSWORD.into(),
        role: roles.iter().map(|r| r.to_string()).collect(),
    }
}

async fn grant_claim(app: &TestApp, role: &str, claim_type: &str, value: &str) {
    let role = find_role_by_name(&*app.state.db, role)
        .await
        .unwrap()
        .expect("seeded role");
    role_claim::ActiveModel {
        id: Set(Uuid::new_v4()),
        role_id: Set(role.id),
        claim_type: Set(claim_type.into()),
        claim_value: Set(value.into()),
    }
    .insert(&*app.state.db)
    .await
    .unwrap();
}

#[tokio::test]
async fn register_defaults_to_user_role() {
    let app = TestApp::new().await;

    let account = app
        .state
        .services
        .accounts
        .register(registration("grace@example.com", &[]))
        .await
        .unwrap();

    assert_eq!(account.role, vec![DEFAULT_ROLE.to_string()]);
    let claims = app
        .state
        .tokens
        .validate(account.token.as_deref().expect("token issued"))
        .unwrap();
    assert_eq!(claims.id, account.id);
    assert_eq!(claims.email, "grace@example.com");
    assert_eq!(claims.role, vec![DEFAULT_ROLE.to_string()]);
}

#[tokio::test]
async fn email_is_unique_ignoring_case() {
    let app = TestApp::new().await;
    let accounts = &app.state.services.accounts;
    accounts
        .register(registration("grace@example.com", &[]))
        .await
        .unwrap();

    assert_matches!(
        accounts.register(registration("GRACE@example.com", &[])).await,
        Err(ServiceError::Conflict(msg)) if msg == EMAIL_TAKEN
    );
}

#[rstest]
#[case("", "Password is not null")]
#[case("abc", "Passwords must be at least 6 characters.")]
#[tokio::test]
async fn register_rejects_weak_passwords(#[case] password: &str, #[case] first_message: &str) {
    let app = TestApp::new().await;
    let mut request = registration("weak@example.com", &[]);
    request.password = password.into();

    assert_matches!(
        app.state.services.accounts.register(request).await,
        Err(ServiceError::Validation(messages)) => {
            assert_eq!(messages[0], first_message);
        }
    );
}

#[tokio::test]
async fn login_checks_password_and_email() {
    let app = TestApp::new().await;
    let accounts = &app.state.services.accounts;
    accounts
        .register(registration("grace@example.com", &["Admin"]))
        .await
        .unwrap();

    let ok = accounts
        .login(LoginRequest {
            email: "Grace@Example.com".into(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap();
    assert_eq!(ok.role, vec!["Admin".to_string()]);
    assert!(ok.token.is_some());

    assert_matches!(
        accounts
            .login(LoginRequest {
                email: "grace@example.com".into(),
                password: "wrong".into(),
            })
            .await,
        Err(ServiceError::Validation(messages)) if messages == vec![LOGIN_FAILED.to_string()]
    );
    assert_matches!(
        accounts
            .login(LoginRequest {
                email: "nobody@example.com".into(),
                password: PASSWORD.into(),
            })
            .await,
        Err(ServiceError::NotFound(msg)) if msg == USER_NOT_FOUND
    );
}

#[tokio::test]
async fn token_claims_are_deduplicated_across_roles() {
    let app = TestApp::new().await;
    grant_claim(&app, "Admin", "permission", "news.read").await;
    grant_claim(&app, "User", "permission", "news.read").await;
    grant_claim(&app, "Admin", "permission", "news.write").await;

    let account = app
        .state
        .services
        .accounts
        .register(registration("grace@example.com", &["Admin", "User", "Admin"]))
        .await
        .unwrap();

    let claims = app
        .state
        .tokens
        .validate(account.token.as_deref().unwrap())
        .unwrap();
    let mut roles = claims.role.clone();
    roles.sort_unstable();
    assert_eq!(roles, vec!["Admin".to_string(), "User".to_string()]);
    let mut values: Vec<&str> = claims.claims.iter().map(|c| c.value.as_str()).collect();
    values.sort_unstable();
    assert_eq!(values, vec!["news.read", "news.write"]);
}

#[tokio::test]
async fn update_with_bad_password_persists_nothing() {
    let app = TestApp::new().await;
    let accounts = &app.state.services.accounts;
    let account = accounts
        .register(registration("grace@example.com", &[]))
        .await
        .unwrap();

    let result = accounts
        .update(
            account.id,
            UpdateAccountRequest {
                first_name: Some("Amazing".into()),
                password: Some("short".into()),
                add_roles: vec!["Admin".into()],
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::Validation(_)));

    let unchanged = accounts.get_by_id(account.id).await.unwrap();
    assert_eq!(unchanged.first_name, "Grace");
    assert_eq!(unchanged.role, vec![DEFAULT_ROLE.to_string()]);
    // old password still works
    accounts
        .login(LoginRequest {
            email: "grace@example.com".into(),
            password: PASSWORD.into(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn update_applies_profile_and_role_delta() {
    let app = TestApp::new().await;
    let accounts = &app.state.services.accounts;
    let account = accounts
        .register(registration("grace@example.com", &[]))
        .await
        .unwrap();

    let updated = accounts
        .update(
            account.id,
            UpdateAccountRequest {
                address: Some("New York".into()),
                age: Some(41),
                add_roles: vec!["Admin".into()],
                remove_roles: vec!["User".into()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.address, "New York");
    assert_eq!(updated.age, 41);
    assert_eq!(updated.role, vec!["Admin".to_string()]);
}

#[tokio::test]
async fn adding_held_role_conflicts() {
    let app = TestApp::new().await;
    let accounts = &app.state.services.accounts;
    let account = accounts
        .register(registration("grace@example.com", &[]))
        .await
        .unwrap();

    assert_matches!(
        accounts
            .update(
                account.id,
                UpdateAccountRequest {
                    add_roles: vec!["User".into()],
                    ..Default::default()
                },
            )
            .await,
        Err(ServiceError::Conflict(msg)) if msg == "User already in role 'User'"
    );
}

#[tokio::test]
async fn accounts_by_role_partitions_members() {
    let app = TestApp::new().await;
    let accounts = &app.state.services.accounts;
    let admin = accounts
        .register(registration("admin@example.com", &["Admin"]))
        .await
        .unwrap();
    let reader = accounts
        .register(registration("reader@example.com", &[]))
        .await
        .unwrap();
    let admin_role = find_role_by_name(&*app.state.db, "Admin")
        .await
        .unwrap()
        .unwrap();

    let split = accounts.get_by_role_id(admin_role.id).await.unwrap();
    assert_eq!(split.members.iter().map(|a| a.id).collect::<Vec<_>>(), vec![admin.id]);
    assert_eq!(split.non_members.iter().map(|a| a.id).collect::<Vec<_>>(), vec![reader.id]);
}

#[tokio::test]
async fn deleting_account_removes_memberships() {
    let app = TestApp::new().await;
    let accounts = &app.state.services.accounts;
    let account = accounts
        .register(registration("grace@example.com", &["Admin", "User"]))
        .await
        .unwrap();

    accounts.delete(account.id).await.unwrap();

    let rows = account_role::Entity::find()
        .filter(account_role::Column::AccountId.eq(account.id))
        .count(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(rows, 0);
    assert_matches!(
        accounts.get_by_id(account.id).await,
        Err(ServiceError::NotFound(msg)) if msg == USER_NOT_FOUND
    );
}
