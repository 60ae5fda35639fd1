use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_categories_table::Migration),
            Box::new(m20240101_000002_create_news_tables::Migration),
            Box::new(m20240101_000003_create_identity_tables::Migration),
            Box::new(m20240101_000004_create_menu_tables::Migration),
        ]
    }
}

// Migration implementations
//
// No foreign keys are declared: dependent join rows are removed by the
// services before the owning row.

mod m20240101_000001_create_categories_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_categories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(ColumnDef::new(Categories::ParentId).uuid().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_categories_parent_id")
                        .table(Categories::Table)
                        .col(Categories::ParentId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Categories {
        Table,
        Id,
        Name,
        ParentId,
    }
}

mod m20240101_000002_create_news_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_news_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(News::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(News::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(News::Title).string().not_null())
                        .col(ColumnDef::new(News::Content).text().not_null())
                        .col(ColumnDef::new(News::UrlImage).string().null())
                        .col(
                            ColumnDef::new(News::CreateTime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(News::UpdateTime)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CategoryNews::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CategoryNews::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CategoryNews::CategoryId).uuid().not_null())
                        .col(ColumnDef::new(CategoryNews::NewsId).uuid().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_category_news_category_id")
                        .table(CategoryNews::Table)
                        .col(CategoryNews::CategoryId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_category_news_news_id")
                        .table(CategoryNews::Table)
                        .col(CategoryNews::NewsId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CategoryNews::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(News::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum News {
        Table,
        Id,
        Title,
        Content,
        UrlImage,
        CreateTime,
        UpdateTime,
    }

    #[derive(Iden)]
    enum CategoryNews {
        Table,
        Id,
        CategoryId,
        NewsId,
    }
}

mod m20240101_000003_create_identity_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_identity_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Roles::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Roles::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Roles::Name)
                                .string_len(256)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Roles::Description).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RoleClaims::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RoleClaims::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RoleClaims::RoleId).uuid().not_null())
                        .col(ColumnDef::new(RoleClaims::ClaimType).string().not_null())
                        .col(ColumnDef::new(RoleClaims::ClaimValue).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Accounts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Accounts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Accounts::UserName).string().not_null())
                        .col(
                            ColumnDef::new(Accounts::Email)
                                .string_len(256)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Accounts::FirstName).string().not_null())
                        .col(ColumnDef::new(Accounts::LastName).string().not_null())
                        .col(ColumnDef::new(Accounts::Address).string().not_null())
                        .col(ColumnDef::new(Accounts::Age).integer().not_null())
                        .col(ColumnDef::new(Accounts::PasswordHash).text().not_null())
                        .col(
                            ColumnDef::new(Accounts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Accounts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AccountRoles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AccountRoles::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AccountRoles::AccountId).uuid().not_null())
                        .col(ColumnDef::new(AccountRoles::RoleId).uuid().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_account_roles_account_id")
                        .table(AccountRoles::Table)
                        .col(AccountRoles::AccountId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AccountRoles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Accounts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RoleClaims::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Roles::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Roles {
        Table,
        Id,
        Name,
        Description,
    }

    #[derive(Iden)]
    enum RoleClaims {
        Table,
        Id,
        RoleId,
        ClaimType,
        ClaimValue,
    }

    #[derive(Iden)]
    enum Accounts {
        Table,
        Id,
        UserName,
        Email,
        FirstName,
        LastName,
        Address,
        Age,
        PasswordHash,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum AccountRoles {
        Table,
        Id,
        AccountId,
        RoleId,
    }
}

mod m20240101_000004_create_menu_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_menu_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Menus::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Menus::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Menus::MenuName).string().not_null())
                        .col(ColumnDef::new(Menus::Href).string().null())
                        .col(ColumnDef::new(Menus::Icon).string().null())
                        .col(ColumnDef::new(Menus::ParentId).uuid().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MenuRoles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MenuRoles::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MenuRoles::MenuId).uuid().not_null())
                        .col(ColumnDef::new(MenuRoles::RoleId).uuid().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_menu_roles_menu_id")
                        .table(MenuRoles::Table)
                        .col(MenuRoles::MenuId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MenuRoles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Menus::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Menus {
        Table,
        Id,
        MenuName,
        Href,
        Icon,
        ParentId,
    }

    #[derive(Iden)]
    enum MenuRoles {
        Table,
        Id,
        MenuId,
        RoleId,
    }
}
