use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Navigation menu entry; `parent_id = None` marks a root.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menus")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub menu_name: String,
    pub href: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::menu_role::Entity")]
    MenuRoles,
}

impl Related<super::menu_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuRoles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
