//! Initial capture schema: runs, requests, responses and their child rows

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. run (owned by the launching controller)
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Run::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Run::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Run::Label).string().null())
                    .col(ColumnDef::new(Run::StartTime).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Run::EndTime).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. request
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Request::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Request::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Request::Run).integer().not_null())
                    .col(
                        ColumnDef::new(Request::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Request::Host).string().null())
                    .col(ColumnDef::new(Request::Port).integer().null())
                    .col(ColumnDef::new(Request::Method).string_len(32).null())
                    .col(ColumnDef::new(Request::Scheme).string_len(16).null())
                    .col(ColumnDef::new(Request::Authority).string().null())
                    .col(ColumnDef::new(Request::Path).text().null())
                    .col(ColumnDef::new(Request::HttpVersion).string_len(16).null())
                    .col(ColumnDef::new(Request::ContentRaw).blob().null())
                    .col(ColumnDef::new(Request::Content).text().null())
                    .col(ColumnDef::new(Request::Error).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_run")
                            .from(Request::Table, Request::Run)
                            .to(Run::Table, Run::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_request_run")
                    .table(Request::Table)
                    .col(Request::Run)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. response
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Response::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Response::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Response::Run).integer().not_null())
                    .col(ColumnDef::new(Response::Request).integer().null())
                    .col(
                        ColumnDef::new(Response::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Response::HttpVersion).string_len(16).null())
                    .col(ColumnDef::new(Response::StatusCode).integer().not_null())
                    .col(ColumnDef::new(Response::Reason).string().null())
                    .col(ColumnDef::new(Response::ContentRaw).blob().null())
                    .col(ColumnDef::new(Response::Content).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_response_run")
                            .from(Response::Table, Response::Run)
                            .to(Run::Table, Run::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_response_request")
                            .from(Response::Table, Response::Request)
                            .to(Request::Table, Request::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_response_request")
                    .table(Response::Table)
                    .col(Response::Request)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. multi-valued child rows
        // ============================================================
        for (table, parent) in FIELD_TABLES {
            create_field_table(manager, table, parent).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (table, _) in FIELD_TABLES.iter().rev() {
            manager
                .drop_table(Table::drop().table(Alias::new(*table)).if_exists().to_owned())
                .await?;
        }

        manager
            .drop_table(Table::drop().table(Response::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Request::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Run::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

/// Child tables as `(table, parent table)`; the parent column is named after its table
const FIELD_TABLES: [(&str, &str); 5] = [
    ("header", "request"),
    ("trailer", "request"),
    ("responseheader", "response"),
    ("responsetrailer", "response"),
    ("responsecookie", "response"),
];

/// Create a `(id, <parent>, name, values)` table
async fn create_field_table(
    manager: &SchemaManager<'_>,
    table: &str,
    parent: &str,
) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(Alias::new(table))
                .if_not_exists()
                .col(
                    ColumnDef::new(Field::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key(),
                )
                .col(ColumnDef::new(Alias::new(parent)).integer().not_null())
                .col(ColumnDef::new(Field::Name).text().not_null())
                .col(ColumnDef::new(Field::Values).json().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{table}_{parent}"))
                        .from(Alias::new(table), Alias::new(parent))
                        .to(Alias::new(parent), Field::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name(format!("idx_{table}_{parent}"))
                .table(Alias::new(table))
                .col(Alias::new(parent))
                .to_owned(),
        )
        .await
}

// ============================================================
// Table identifiers
// ============================================================

#[derive(DeriveIden)]
enum Run {
    #[sea_orm(iden = "run")]
    Table,
    Id,
    Label,
    StartTime,
    EndTime,
}

#[derive(DeriveIden)]
enum Request {
    #[sea_orm(iden = "request")]
    Table,
    Id,
    Run,
    StartTime,
    Host,
    Port,
    Method,
    Scheme,
    Authority,
    Path,
    HttpVersion,
    ContentRaw,
    Content,
    Error,
}

#[derive(DeriveIden)]
enum Response {
    #[sea_orm(iden = "response")]
    Table,
    Id,
    Run,
    Request,
    StartTime,
    HttpVersion,
    StatusCode,
    Reason,
    ContentRaw,
    Content,
}

/// Columns shared by every multi-valued child table
#[derive(DeriveIden)]
enum Field {
    Id,
    Name,
    Values,
}
