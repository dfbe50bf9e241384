//! Header entity: one row per request header name

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::FieldValues;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "header")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub request: i32,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Json")]
    pub values: FieldValues,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::request::Entity",
        from = "Column::Request",
        to = "super::request::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Request,
}

impl Related<super::request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
