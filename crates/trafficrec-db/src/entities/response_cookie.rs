//! ResponseCookie entity: one row per cookie name set by a response

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::FieldValues;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "responsecookie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub response: i32,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Json")]
    pub values: FieldValues,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::response::Entity",
        from = "Column::Response",
        to = "super::response::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Response,
}

impl Related<super::response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Response.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
