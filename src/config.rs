use anyhow::Context;

pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const USER_AGENT: &str = "Mozilla/5.0";

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub search_url: String,
    pub database_url: String,
    pub movies_file: String,
    pub pictures_dir: String,
    pub max_concurrent: usize,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("CATALOG_BASE_URL")
            .unwrap_or_else(|_| "https://www.imdb.com".to_string());

        let search_url = std::env::var("CATALOG_SEARCH_URL")
            .unwrap_or_else(|_| "https://www.imdb.com/search/title/?".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://cinedex.db?mode=rwc".to_string());

        let movies_file =
            std::env::var("MOVIES_FILE").unwrap_or_else(|_| "movies.json".to_string());

        let pictures_dir =
            std::env::var("PICTURES_DIR").unwrap_or_else(|_| "movie_pictures".to_string());

        let max_concurrent: usize = std::env::var("MAX_CONCURRENT_TASKS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("MAX_CONCURRENT_TASKS")?;

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("REQUEST_TIMEOUT_SECS")?;

        Ok(Self {
            base_url,
            search_url,
            database_url,
            movies_file,
            pictures_dir,
            max_concurrent,
            request_timeout_secs,
        })
    }
}
