use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// News category; `parent_id = None` marks a root.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::category_news::Entity")]
    CategoryNews,
}

impl Related<super::category_news::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryNews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
