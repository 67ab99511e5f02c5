use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Placeholder kept until the detail enricher finds a real poster.
pub const DEFAULT_IMAGE_NAME: &str = "assets/no_image_available.jpg";

pub const DEFAULT_RATING: f64 = 0.0;

/// Loosely-typed input record as it appears in the seed list.
#[derive(Clone, Debug, Deserialize)]
pub struct MovieInput {
    pub title: String,
    pub year: Option<i32>,
    pub genres: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub director: Option<String>,
    pub writer: Option<String>,
    pub actors: Option<Vec<String>>,
    pub countries_of_origin: Option<Vec<String>>,
    pub trailer_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MovieRecord {
    pub id: String,
    pub title: String,
    pub matched: bool,
    pub year: i32,
    pub genres: Vec<String>,
    pub rating: f64,
    pub description: String,
    pub image_name: String,
    pub director: String,
    pub writer: String,
    pub actors: Vec<String>,
    pub countries_of_origin: Vec<String>,
    pub trailer_url: String,
}

impl MovieRecord {
    /// Validates ranges instead of clamping; an out-of-range field fails the
    /// whole record. The id is generated here and never comes from remote data.
    pub fn from_input(input: MovieInput) -> AppResult<Self> {
        let title_len = input.title.chars().count();
        if !(2..=125).contains(&title_len) {
            return Err(AppError::Validation { field: "title", value: input.title });
        }

        let year = input.year.unwrap_or_else(|| jiff::Zoned::now().year() as i32);
        if !(1900..=2100).contains(&year) {
            return Err(AppError::Validation { field: "year", value: year.to_string() });
        }

        let rating = input.rating.unwrap_or(DEFAULT_RATING);
        if !(0.0..=10.0).contains(&rating) {
            return Err(AppError::Validation { field: "rating", value: rating.to_string() });
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            matched: false,
            year,
            genres: input.genres.unwrap_or_else(|| vec![String::new()]),
            rating,
            description: input.description.unwrap_or_default(),
            image_name: DEFAULT_IMAGE_NAME.to_string(),
            director: input.director.unwrap_or_default(),
            writer: input.writer.unwrap_or_default(),
            actors: input.actors.unwrap_or_else(|| vec![String::new()]),
            countries_of_origin: input.countries_of_origin.unwrap_or_else(|| vec![String::new()]),
            trailer_url: input.trailer_url.unwrap_or_default(),
        })
    }
}
