use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{accounts, categories, logs, menus, news, roles};
use crate::services::{account, category, log, menu, news as news_service, role};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "News CMS API",
        version = "1.0.0",
        description = r#"
# News CMS API

Content management backend for news articles, their category tree, navigation
menus and the accounts and roles that see them.

## Responses

Single-entity calls answer with a status envelope:

```json
{ "status": "Sucess", "message": null, "data": { }, "totalData": 1 }
```

Errors use the same envelope with `"status": "Error"` and one message per
problem. List endpoints take `?filter=<json>` and answer with a paginated list.

## Authentication

Category and log endpoints require `Authorization: Bearer <token>`; tokens are
returned by `/api/v1/register` and `/api/v1/login`.
"#
    ),
    paths(
        crate::health::health_check,
        categories::create_category,
        categories::get_category,
        categories::list_categories,
        categories::update_category,
        categories::delete_category,
        categories::categories_by_news,
        menus::create_menu,
        menus::get_menu,
        menus::list_menus,
        menus::update_menu,
        menus::delete_menu,
        menus::menus_by_role_names,
        menus::menus_by_role,
        menus::sub_menus,
        news::create_news,
        news::get_news,
        news::list_news,
        news::update_news,
        news::delete_news,
        news::news_by_category,
        roles::create_role,
        roles::get_role,
        roles::list_roles,
        roles::update_role,
        roles::update_role_menus,
        roles::update_role_accounts,
        roles::delete_role,
        accounts::register,
        accounts::login,
        accounts::get_account,
        accounts::list_accounts,
        accounts::update_account,
        accounts::delete_account,
        accounts::accounts_by_role,
        logs::list_logs,
        logs::get_log,
    ),
    components(schemas(
        category::CategoryResponse,
        category::CreateCategoryRequest,
        category::UpdateCategoryRequest,
        category::CategoryQueryFilter,
        category::CategoriesByNewsResponse,
        menu::MenuResponse,
        menu::CreateMenuRequest,
        menu::UpdateMenuRequest,
        menu::MenuQueryFilter,
        menu::MenusByRoleNamesRequest,
        menu::MenusByRoleResponse,
        news_service::NewsResponse,
        news_service::CreateNewsRequest,
        news_service::UpdateNewsRequest,
        news_service::NewsQueryFilter,
        news_service::NewsByCategoryResponse,
        role::RoleResponse,
        role::CreateRoleRequest,
        role::UpdateRoleRequest,
        role::UpdateRoleMenuRequest,
        role::UpdateRoleAccountRequest,
        role::RoleQueryFilter,
        account::AccountResponse,
        account::RegisterRequest,
        account::LoginRequest,
        account::UpdateAccountRequest,
        account::AccountQueryFilter,
        account::AccountsByRoleResponse,
        log::LogModel,
        log::LogQueryFilter,
        crate::envelope::PageParams,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and build info"),
        (name = "Categories", description = "Category tree and news membership"),
        (name = "Menus", description = "Navigation menus and their roles"),
        (name = "News", description = "News articles"),
        (name = "Roles", description = "Roles, their menus and members"),
        (name = "Accounts", description = "Registration, login and profiles"),
        (name = "Logs", description = "Application logs from the search index"),
    )
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDocV1::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let doc = ApiDocV1::openapi();
        for path in [
            "/health",
            "/api/v1/category/{id}",
            "/api/v1/menu/role",
            "/api/v1/news/category/{category_id}",
            "/api/v1/role/account/{id}",
            "/api/v1/register",
            "/api/v1/log/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("Bearer"));
    }
}
