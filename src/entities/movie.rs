use sea_orm::entity::prelude::*;

/// One persisted document per enriched record; `title` carries a unique
/// index, string sequences are stored as JSON text.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub matched: bool,
    pub genres: String,
    pub rating: f64,
    pub year: i32,
    pub description: String,
    pub image_name: String,
    pub director: String,
    pub writer: String,
    pub actors: String,
    pub countries_of_origin: String,
    pub trailer_url: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
