mod common;

use assert_matches::assert_matches;
use common::TestApp;
use news_cms_api::entities::{account_role, menu_role, role_claim};
use news_cms_api::envelope::PageParams;
use news_cms_api::errors::ServiceError;
use news_cms_api::services::account::RegisterRequest;
use news_cms_api::services::menu::{
    CreateMenuRequest, MenuQueryFilter, MenusByRoleNamesRequest, UpdateMenuRequest,
    NAME_REQUIRED as MENU_NAME_REQUIRED, ROLE_ALREADY_IN_MENU, ROLE_REQUIRED,
};
use news_cms_api::services::role::{
    CreateRoleRequest, UpdateRoleMenuRequest, DESCRIPTION_REQUIRED, NAME_REQUIRED, NAME_TAKEN,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

async fn menu(app: &TestApp, name: &str, parent_id: Option<Uuid>, roles: &[&str]) -> Uuid {
    app.state
        .services
        .menus
        .create(CreateMenuRequest {
            menu_name: name.into(),
            href: Some(format!("/{}", name.to_lowercase())),
            icon: None,
            parent_id,
            role: roles.iter().map(|r| r.to_string()).collect(),
        })
        .await
        .unwrap()
        .id
}

async fn menu_role_rows(app: &TestApp, menu_id: Uuid) -> u64 {
    menu_role::Entity::find()
        .filter(menu_role::Column::MenuId.eq(menu_id))
        .count(&*app.state.db)
        .await
        .unwrap()
}

#[tokio::test]
async fn menu_create_reports_every_violation() {
    let app = TestApp::new().await;

    let result = app
        .state
        .services
        .menus
        .create(CreateMenuRequest::default())
        .await;

    assert_matches!(result, Err(ServiceError::Validation(messages)) => {
        assert_eq!(messages, vec![MENU_NAME_REQUIRED.to_string(), ROLE_REQUIRED.to_string()]);
    });
}

#[tokio::test]
async fn menu_create_with_unknown_role_is_not_found() {
    let app = TestApp::new().await;

    let result = app
        .state
        .services
        .menus
        .create(CreateMenuRequest {
            menu_name: "Reports".into(),
            role: vec!["Auditor".into()],
            ..Default::default()
        })
        .await;

    assert_matches!(result, Err(ServiceError::NotFound(msg)) if msg == "Not find role");
}

#[tokio::test]
async fn deleting_root_menu_cascades_one_level() {
    let app = TestApp::new().await;
    let root = menu(&app, "Admin", None, &["Admin"]).await;
    let users = menu(&app, "Users", Some(root), &["Admin"]).await;
    let settings = menu(&app, "Settings", Some(root), &["Admin", "User"]).await;
    let audit = menu(&app, "Audit", Some(users), &["Admin"]).await;
    let unrelated = menu(&app, "Home", None, &["User"]).await;

    app.state.services.menus.delete(root).await.unwrap();

    for gone in [root, users, settings] {
        assert_matches!(
            app.state.services.menus.get_by_id(gone).await,
            Err(ServiceError::NotFound(_))
        );
        assert_eq!(menu_role_rows(&app, gone).await, 0);
    }

    // grandchildren stay behind with their links
    let orphan = app.state.services.menus.get_by_id(audit).await.unwrap();
    assert_eq!(orphan.parent_id, Some(users));
    assert_eq!(menu_role_rows(&app, audit).await, 1);
    assert_eq!(menu_role_rows(&app, unrelated).await, 1);
}

#[tokio::test]
async fn deleting_child_menu_leaves_siblings() {
    let app = TestApp::new().await;
    let root = menu(&app, "Admin", None, &["Admin"]).await;
    let users = menu(&app, "Users", Some(root), &["Admin"]).await;
    let settings = menu(&app, "Settings", Some(root), &["Admin"]).await;

    app.state.services.menus.delete(users).await.unwrap();

    let remaining = app.state.services.menus.get_by_id(root).await.unwrap();
    let children: Vec<Uuid> = remaining
        .sub_menus
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(children, vec![settings]);
}

#[tokio::test]
async fn adding_role_already_on_menu_conflicts() {
    let app = TestApp::new().await;
    let news = menu(&app, "News", None, &["User"]).await;

    let result = app
        .state
        .services
        .menus
        .update(
            news,
            UpdateMenuRequest {
                add_roles: vec!["User".into()],
                ..Default::default()
            },
        )
        .await;

    assert_matches!(result, Err(ServiceError::Conflict(msg)) if msg == ROLE_ALREADY_IN_MENU);
    assert_eq!(menu_role_rows(&app, news).await, 1);
}

#[tokio::test]
async fn menu_update_without_parent_makes_root() {
    let app = TestApp::new().await;
    let root = menu(&app, "Admin", None, &["Admin"]).await;
    let child = menu(&app, "Users", Some(root), &["Admin"]).await;

    let updated = app
        .state
        .services
        .menus
        .update(
            child,
            UpdateMenuRequest {
                add_roles: vec!["User".into()],
                remove_roles: vec!["Admin".into()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.parent_id, None);
    assert_eq!(updated.role, vec!["User".to_string()]);

    let roots = app
        .state
        .services
        .menus
        .get_by_filter(MenuQueryFilter {
            menu_name: None,
            page: PageParams::unpaged(),
        })
        .await
        .unwrap();
    assert_eq!(roots.total_data, Some(2));
}

#[tokio::test]
async fn menus_by_role_names_returns_roots_or_nothing() {
    let app = TestApp::new().await;

    let none = app
        .state
        .services
        .menus
        .get_by_role_names(MenusByRoleNamesRequest {
            role_names: vec!["User".into()],
        })
        .await
        .unwrap();
    assert!(none.is_none());

    let home = menu(&app, "Home", None, &["User"]).await;
    menu(&app, "Latest", Some(home), &["User"]).await;
    menu(&app, "Admin", None, &["Admin"]).await;

    let visible = app
        .state
        .services
        .menus
        .get_by_role_names(MenusByRoleNamesRequest {
            role_names: vec!["User".into()],
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, home);
    assert_eq!(visible[0].sub_menus.as_ref().map(Vec::len), Some(1));
}

#[tokio::test]
async fn menus_by_role_names_follow_request_order() {
    let app = TestApp::new().await;
    menu(&app, "AdminMenu", None, &["Admin"]).await;
    menu(&app, "UserMenu", None, &["User"]).await;

    let by_names = |names: &[&str]| MenusByRoleNamesRequest {
        role_names: names.iter().map(|n| n.to_string()).collect(),
    };

    let ordered = app
        .state
        .services
        .menus
        .get_by_role_names(by_names(&["User", "Admin"]))
        .await
        .unwrap()
        .unwrap();
    let names: Vec<&str> = ordered.iter().map(|m| m.menu_name.as_str()).collect();
    assert_eq!(names, vec!["UserMenu", "AdminMenu"]);

    let repeated = app
        .state
        .services
        .menus
        .get_by_role_names(by_names(&["User", "User"]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(repeated.len(), 2);
    assert!(repeated.iter().all(|m| m.menu_name == "UserMenu"));
}

#[tokio::test]
async fn reparenting_menu_under_grandchild_is_rejected() {
    let app = TestApp::new().await;
    let root = menu(&app, "Admin", None, &["Admin"]).await;
    let users = menu(&app, "Users", Some(root), &["Admin"]).await;
    let audit = menu(&app, "Audit", Some(users), &["Admin"]).await;

    let result = app
        .state
        .services
        .menus
        .update(
            root,
            UpdateMenuRequest {
                parent_id: Some(audit),
                ..Default::default()
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::Validation(_)));

    let unchanged = app.state.services.menus.get_by_id(root).await.unwrap();
    assert_eq!(unchanged.parent_id, None);
    assert_eq!(unchanged.sub_menus.as_ref().map(Vec::len), Some(1));
}

#[tokio::test]
async fn role_create_validates_and_rejects_duplicates() {
    let app = TestApp::new().await;

    assert_matches!(
        app.state.services.roles.create(CreateRoleRequest::default()).await,
        Err(ServiceError::Validation(messages)) => {
            assert_eq!(messages, vec![NAME_REQUIRED.to_string(), DESCRIPTION_REQUIRED.to_string()]);
        }
    );

    assert_matches!(
        app.state
            .services
            .roles
            .create(CreateRoleRequest {
                role_name: "Admin".into(),
                description: "again".into(),
            })
            .await,
        Err(ServiceError::Conflict(msg)) if msg == NAME_TAKEN
    );
}

#[tokio::test]
async fn role_menu_delta_links_and_unlinks() {
    let app = TestApp::new().await;
    let editor = app
        .state
        .services
        .roles
        .create(CreateRoleRequest {
            role_name: "Editor".into(),
            description: "Writes news".into(),
        })
        .await
        .unwrap();
    let drafts = menu(&app, "Drafts", None, &["Admin"]).await;
    let home = menu(&app, "Home", None, &["User"]).await;

    app.state
        .services
        .roles
        .update_role_menu(
            editor.id,
            UpdateRoleMenuRequest {
                add_menu_ids: vec![drafts, home],
                remove_menu_ids: vec![],
            },
        )
        .await
        .unwrap();
    app.state
        .services
        .roles
        .update_role_menu(
            editor.id,
            UpdateRoleMenuRequest {
                add_menu_ids: vec![],
                remove_menu_ids: vec![home],
            },
        )
        .await
        .unwrap();

    let split = app
        .state
        .services
        .menus
        .get_by_role_id(editor.id)
        .await
        .unwrap();
    let linked: Vec<Uuid> = split.role.iter().map(|m| m.id).collect();
    assert_eq!(linked, vec![drafts]);
    // the User role keeps its own link to Home
    assert_eq!(menu_role_rows(&app, home).await, 1);
}

#[tokio::test]
async fn deleting_role_detaches_everything() {
    let app = TestApp::new().await;
    let editor = app
        .state
        .services
        .roles
        .create(CreateRoleRequest {
            role_name: "Editor".into(),
            description: "Writes news".into(),
        })
        .await
        .unwrap();
    menu(&app, "Drafts", None, &["Editor"]).await;
    app.state
        .services
        .accounts
        .register(RegisterRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "Passw0rd!".into(),
            role: vec!["Editor".into()],
            ..Default::default()
        })
        .await
        .unwrap();
    role_claim::ActiveModel {
        id: Set(Uuid::new_v4()),
        role_id: Set(editor.id),
        claim_type: Set("permission".into()),
        claim_value: Set("news.write".into()),
    }
    .insert(&*app.state.db)
    .await
    .unwrap();

    app.state.services.roles.delete(editor.id).await.unwrap();

    let db = &*app.state.db;
    assert_eq!(
        account_role::Entity::find()
            .filter(account_role::Column::RoleId.eq(editor.id))
            .count(db)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        menu_role::Entity::find()
            .filter(menu_role::Column::RoleId.eq(editor.id))
            .count(db)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        role_claim::Entity::find()
            .filter(role_claim::Column::RoleId.eq(editor.id))
            .count(db)
            .await
            .unwrap(),
        0
    );
    assert_matches!(
        app.state.services.roles.get_by_id(editor.id).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn sub_menus_lists_direct_children_with_subtrees() {
    let app = TestApp::new().await;
    let root = menu(&app, "Admin", None, &["Admin"]).await;
    let users = menu(&app, "Users", Some(root), &["Admin"]).await;
    menu(&app, "Audit", Some(users), &["Admin"]).await;

    let subs = app.state.services.menus.get_sub_menus(root).await.unwrap();

    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].id, users);
    assert_eq!(subs[0].role, vec!["Admin".to_string()]);
    assert_eq!(subs[0].sub_menus.as_ref().map(Vec::len), Some(1));

    assert_matches!(
        app.state.services.menus.get_sub_menus(Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    );
}
