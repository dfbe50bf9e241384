//! Storage side of the pipeline
//!
//! [`PersistenceGateway`] is the seam between event handling and the
//! database. Every method commits before returning: a crash after a call
//! returns never loses the rows it wrote. Child rows of one parent are
//! written as a single bulk insert inside one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
    TransactionTrait,
};
use tracing::debug;
use trafficrec_db::entities::{
    header, request, response, response_cookie, response_header, response_trailer, trailer,
    FieldValues,
};

use crate::correlation::RunId;
use crate::error::CaptureError;
use crate::multivalue::FieldMap;

/// Store-generated primary key
pub type RowId = i32;

/// Child tables hanging off a request row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestChild {
    Header,
    Trailer,
}

/// Child tables hanging off a response row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseChild {
    Header,
    Trailer,
    Cookie,
}

/// Columns of a new `request` row
#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub run: RunId,
    pub start_time: DateTime<Utc>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub method: Option<String>,
    pub scheme: Option<String>,
    pub authority: Option<String>,
    pub path: Option<String>,
    pub http_version: Option<String>,
    pub content_raw: Option<Vec<u8>>,
}

/// Columns of a new `response` row
#[derive(Debug, Clone, PartialEq)]
pub struct NewResponse {
    pub run: RunId,
    pub request: Option<RowId>,
    pub start_time: DateTime<Utc>,
    pub http_version: Option<String>,
    pub status_code: u16,
    pub reason: Option<String>,
    pub content_raw: Option<Vec<u8>>,
}

/// All writes the pipeline performs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Insert a request row and return its id
    async fn insert_request(&self, request: NewRequest) -> Result<RowId, CaptureError>;

    /// Set the decoded text body of an existing request
    async fn update_request_content(
        &self,
        id: RowId,
        content: String,
    ) -> Result<(), CaptureError>;

    /// Bulk-insert one child row per field; returns the number of rows written
    ///
    /// Empty maps write nothing and open no transaction.
    async fn insert_request_children(
        &self,
        kind: RequestChild,
        request_id: RowId,
        fields: &FieldMap,
    ) -> Result<usize, CaptureError>;

    /// Insert a response row and return its id
    async fn insert_response(&self, response: NewResponse) -> Result<RowId, CaptureError>;

    /// Set the decoded text body of an existing response
    async fn update_response_content(
        &self,
        id: RowId,
        content: String,
    ) -> Result<(), CaptureError>;

    async fn insert_response_children(
        &self,
        kind: ResponseChild,
        response_id: RowId,
        fields: &FieldMap,
    ) -> Result<usize, CaptureError>;

    /// Record a failed client TLS handshake as a request row without HTTP data
    async fn insert_tls_failure(
        &self,
        run: RunId,
        sni: Option<String>,
        error: Option<String>,
    ) -> Result<RowId, CaptureError>;
}

/// [`PersistenceGateway`] backed by a sea-orm connection
#[derive(Clone)]
pub struct SeaOrmGateway {
    db: DatabaseConnection,
}

impl SeaOrmGateway {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Insert all `models` in one transaction
    async fn insert_children<A>(&self, models: Vec<A>) -> Result<usize, CaptureError>
    where
        A: ActiveModelTrait + Send + 'static,
    {
        let count = models.len();
        if count == 0 {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        <A::Entity as EntityTrait>::insert_many(models)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        Ok(count)
    }
}

fn field_rows<A>(fields: &FieldMap, build: impl Fn(String, FieldValues) -> A) -> Vec<A> {
    fields
        .iter()
        .map(|(name, values)| build(name.to_owned(), FieldValues(values.to_vec())))
        .collect()
}

#[async_trait]
impl PersistenceGateway for SeaOrmGateway {
    async fn insert_request(&self, new: NewRequest) -> Result<RowId, CaptureError> {
        let model = request::ActiveModel {
            id: NotSet,
            run: Set(new.run.get()),
            start_time: Set(new.start_time),
            host: Set(new.host),
            port: Set(new.port.map(i32::from)),
            method: Set(new.method),
            scheme: Set(new.scheme),
            authority: Set(new.authority),
            path: Set(new.path),
            http_version: Set(new.http_version),
            content_raw: Set(new.content_raw),
            content: Set(None),
            error: Set(None),
        };

        let id = request::Entity::insert(model)
            .exec(&self.db)
            .await?
            .last_insert_id;
        debug!("Recorded request {}", id);
        Ok(id)
    }

    async fn update_request_content(
        &self,
        id: RowId,
        content: String,
    ) -> Result<(), CaptureError> {
        request::Entity::update_many()
            .col_expr(request::Column::Content, Expr::value(content))
            .filter(request::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn insert_request_children(
        &self,
        kind: RequestChild,
        request_id: RowId,
        fields: &FieldMap,
    ) -> Result<usize, CaptureError> {
        match kind {
            RequestChild::Header => {
                let rows = field_rows(fields, |name, values| header::ActiveModel {
                    id: NotSet,
                    request: Set(request_id),
                    name: Set(name),
                    values: Set(values),
                });
                self.insert_children(rows).await
            }
            RequestChild::Trailer => {
                let rows = field_rows(fields, |name, values| trailer::ActiveModel {
                    id: NotSet,
                    request: Set(request_id),
                    name: Set(name),
                    values: Set(values),
                });
                self.insert_children(rows).await
            }
        }
    }

    async fn insert_response(&self, new: NewResponse) -> Result<RowId, CaptureError> {
        let model = response::ActiveModel {
            id: NotSet,
            run: Set(new.run.get()),
            request: Set(new.request),
            start_time: Set(new.start_time),
            http_version: Set(new.http_version),
            status_code: Set(i32::from(new.status_code)),
            reason: Set(new.reason),
            content_raw: Set(new.content_raw),
            content: Set(None),
        };

        let id = response::Entity::insert(model)
            .exec(&self.db)
            .await?
            .last_insert_id;
        debug!("Recorded response {} (request {:?})", id, new.request);
        Ok(id)
    }

    async fn update_response_content(
        &self,
        id: RowId,
        content: String,
    ) -> Result<(), CaptureError> {
        response::Entity::update_many()
            .col_expr(response::Column::Content, Expr::value(content))
            .filter(response::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn insert_response_children(
        &self,
        kind: ResponseChild,
        response_id: RowId,
        fields: &FieldMap,
    ) -> Result<usize, CaptureError> {
        match kind {
            ResponseChild::Header => {
                let rows = field_rows(fields, |name, values| response_header::ActiveModel {
                    id: NotSet,
                    response: Set(response_id),
                    name: Set(name),
                    values: Set(values),
                });
                self.insert_children(rows).await
            }
            ResponseChild::Trailer => {
                let rows = field_rows(fields, |name, values| response_trailer::ActiveModel {
                    id: NotSet,
                    response: Set(response_id),
                    name: Set(name),
                    values: Set(values),
                });
                self.insert_children(rows).await
            }
            ResponseChild::Cookie => {
                let rows = field_rows(fields, |name, values| response_cookie::ActiveModel {
                    id: NotSet,
                    response: Set(response_id),
                    name: Set(name),
                    values: Set(values),
                });
                self.insert_children(rows).await
            }
        }
    }

    async fn insert_tls_failure(
        &self,
        run: RunId,
        sni: Option<String>,
        error: Option<String>,
    ) -> Result<RowId, CaptureError> {
        let model = request::ActiveModel {
            id: NotSet,
            run: Set(run.get()),
            start_time: Set(Utc::now()),
            host: Set(sni),
            port: Set(None),
            method: Set(None),
            scheme: Set(Some("https".to_string())),
            authority: Set(None),
            path: Set(None),
            http_version: Set(None),
            content_raw: Set(None),
            content: Set(None),
            error: Set(error),
        };

        let id = request::Entity::insert(model)
            .exec(&self.db)
            .await?
            .last_insert_id;
        debug!("Recorded TLS failure {}", id);
        Ok(id)
    }
}
