use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub description: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::menu_role::Entity")]
    MenuRoles,
    #[sea_orm(has_many = "super::account_role::Entity")]
    AccountRoles,
    #[sea_orm(has_many = "super::role_claim::Entity")]
    RoleClaims,
}

impl Related<super::menu_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuRoles.def()
    }
}

impl Related<super::account_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountRoles.def()
    }
}

impl Related<super::role_claim::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleClaims.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
