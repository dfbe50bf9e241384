//! Request entity for intercepted HTTP requests and failed TLS handshakes

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "request")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Run this request was captured in
    pub run: i32,

    pub start_time: ChronoDateTimeUtc,

    /// Host as seen by the proxy (SNI for failed handshakes)
    pub host: Option<String>,

    pub port: Option<i32>,

    pub method: Option<String>,

    /// `http` or `https`
    pub scheme: Option<String>,

    pub authority: Option<String>,

    pub path: Option<String>,

    pub http_version: Option<String>,

    /// Body bytes exactly as intercepted
    #[sea_orm(column_type = "Blob", nullable)]
    pub content_raw: Option<Vec<u8>>,

    /// Body decoded as UTF-8, unset when the bytes are not valid text
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,

    /// TLS handshake error; only set on rows recording a failed handshake
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,
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

    #[sea_orm(has_many = "super::header::Entity")]
    Headers,

    #[sea_orm(has_many = "super::trailer::Entity")]
    Trailers,

    #[sea_orm(has_many = "super::response::Entity")]
    Responses,
}

impl Related<super::run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Run.def()
    }
}

impl Related<super::header::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Headers.def()
    }
}

impl Related<super::trailer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trailers.def()
    }
}

impl Related<super::response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
