use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, Set, SqlErr};

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::MovieRecord,
};

/// Single-document sink over the movies table. Duplicate titles are rejected
/// by the store's unique index, never overwritten.
#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Reachability probe gating pipeline startup.
    pub async fn ping(&self) -> AppResult<()> {
        self.db.ping().await.map_err(|e| AppError::Precondition(e.to_string()))
    }

    pub async fn insert(&self, movie: &MovieRecord) -> AppResult<()> {
        let model = movie::ActiveModel {
            id: Set(movie.id.clone()),
            title: Set(movie.title.clone()),
            matched: Set(movie.matched),
            genres: Set(serde_json::to_string(&movie.genres)?),
            rating: Set(movie.rating),
            year: Set(movie.year),
            description: Set(movie.description.clone()),
            image_name: Set(movie.image_name.clone()),
            director: Set(movie.director.clone()),
            writer: Set(movie.writer.clone()),
            actors: Set(serde_json::to_string(&movie.actors)?),
            countries_of_origin: Set(serde_json::to_string(&movie.countries_of_origin)?),
            trailer_url: Set(movie.trailer_url.clone()),
        };

        match movie::Entity::insert(model).exec(&self.db).await {
            Ok(_) => Ok(()),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(AppError::Conflict { title: movie.title.clone() })
                },
                _ => Err(AppError::Db(err)),
            },
        }
    }

    pub async fn count(&self) -> AppResult<u64> {
        Ok(movie::Entity::find().count(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieInput;

    fn record(title: &str) -> MovieRecord {
        MovieRecord::from_input(MovieInput {
            title: title.to_string(),
            year: Some(1999),
            genres: Some(vec!["Action".to_string()]),
            rating: None,
            description: None,
            director: None,
            writer: None,
            actors: None,
            countries_of_origin: None,
            trailer_url: None,
        })
        .unwrap()
    }

    async fn memory_store() -> MovieStore {
        let db = crate::db::connect_and_migrate("sqlite::memory:").await.unwrap();
        MovieStore::new(db)
    }

    #[tokio::test]
    async fn inserts_and_counts() {
        let store = memory_store().await;
        store.insert(&record("The Matrix")).await.unwrap();
        store.insert(&record("Heat")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_title_is_a_conflict() {
        let store = memory_store().await;
        store.insert(&record("The Matrix")).await.unwrap();

        let err = store.insert(&record("The Matrix")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { ref title } if title == "The Matrix"));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ping_succeeds_on_open_store() {
        let store = memory_store().await;
        store.ping().await.unwrap();
    }
}
