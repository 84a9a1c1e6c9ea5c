use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IdMap::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IdMap::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(IdMap::ContentType).string().not_null())
                    .col(ColumnDef::new(IdMap::TmdbId).integer().null())
                    .col(ColumnDef::new(IdMap::TvdbId).integer().null())
                    .col(ColumnDef::new(IdMap::ImdbId).string().null())
                    .col(ColumnDef::new(IdMap::TvmazeId).integer().null())
                    .col(ColumnDef::new(IdMap::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(IdMap::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // One index per identifier column: every populated key must resolve
        // the row without a scan.
        for (name, col) in [
            ("idx_id_map_tmdb", IdMap::TmdbId),
            ("idx_id_map_tvdb", IdMap::TvdbId),
            ("idx_id_map_imdb", IdMap::ImdbId),
            ("idx_id_map_tvmaze", IdMap::TvmazeId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(IdMap::Table)
                        .col(col)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx_id_map_updated_at")
                    .table(IdMap::Table)
                    .col(IdMap::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IdMap::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IdMap {
    Table,
    Id,
    ContentType,
    TmdbId,
    TvdbId,
    ImdbId,
    TvmazeId,
    CreatedAt,
    UpdatedAt,
}
