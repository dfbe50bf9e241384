//! Run entity: one labeled capture session
//!
//! Rows are created and closed by the controller that launches the proxy;
//! the capture pipeline only references them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "run")]
pub struct Model {
    /// Externally assigned run id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,

    /// Human-readable label for the session
    pub label: Option<String>,

    pub start_time: Option<ChronoDateTimeUtc>,

    pub end_time: Option<ChronoDateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::request::Entity")]
    Requests,

    #[sea_orm(has_many = "super::response::Entity")]
    Responses,
}

impl Related<super::request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requests.def()
    }
}

impl Related<super::response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
