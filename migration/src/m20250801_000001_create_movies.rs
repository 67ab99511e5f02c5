use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(string(Movies::Id).primary_key())
                    .col(string(Movies::Title))
                    .col(boolean(Movies::Matched))
                    .col(string(Movies::Genres))
                    .col(double(Movies::Rating))
                    .col(integer(Movies::Year))
                    .col(string(Movies::Description))
                    .col(string(Movies::ImageName))
                    .col(string(Movies::Director))
                    .col(string(Movies::Writer))
                    .col(string(Movies::Actors))
                    .col(string(Movies::CountriesOfOrigin))
                    .col(string(Movies::TrailerUrl))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_title_unique")
                    .table(Movies::Table)
                    .col(Movies::Title)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_movies_title_unique").table(Movies::Table).to_owned())
            .await?;

        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    Matched,
    Genres,
    Rating,
    Year,
    Description,
    ImageName,
    Director,
    Writer,
    Actors,
    CountriesOfOrigin,
    TrailerUrl,
}
