//! Response entity for HTTP responses observed by the proxy

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "response")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub run: i32,

    /// Request this response answers; unset when it could not be correlated
    pub request: Option<i32>,

    pub start_time: ChronoDateTimeUtc,

    pub http_version: Option<String>,

    pub status_code: i32,

    pub reason: Option<String>,

    #[sea_orm(column_type = "Blob", nullable)]
    pub content_raw: Option<Vec<u8>>,

    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::run::Entity",
        from = "Column::Run",
        to = "super::run::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Run,

    #[sea_orm(
        belongs_to = "super::request::Entity",
        from = "Column::Request",
        to = "super::request::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Request,

    #[sea_orm(has_many = "super::response_header::Entity")]
    Headers,

    #[sea_orm(has_many = "super::response_trailer::Entity")]
    Trailers,

    #[sea_orm(has_many = "super::response_cookie::Entity")]
    Cookies,
}

impl Related<super::run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Run.def()
    }
}

impl Related<super::request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl Related<super::response_header::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Headers.def()
    }
}

impl Related<super::response_trailer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trailers.def()
    }
}

impl Related<super::response_cookie::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cookies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
