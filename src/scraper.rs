use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::MovieRecord,
};

/// Ranked search entries inspected per query.
const SEARCH_RESULT_LIMIT: usize = 5;

/// Deterministic title -> poster file name mapping.
pub fn image_file_name(title: &str) -> String {
    let mut out = String::with_capacity(title.len() + 4);
    for c in title.to_lowercase().chars() {
        match c {
            ' ' => out.push('_'),
            ':' | '!' | '&' | ',' | '+' => {},
            c => out.push(c),
        }
    }
    out.push_str(".jpg");
    out
}

#[derive(Clone, Debug)]
pub(crate) struct SearchHit {
    pub title: String,
    pub href: String,
}

/// Searches the catalog for the record's title, restricted to theatrical
/// features. On an exact title hit the record is marked matched and the
/// detail-page link is returned; no hit is not an error.
pub async fn search_movie(
    client: &reqwest::Client,
    config: &Config,
    movie: &mut MovieRecord,
) -> AppResult<Option<String>> {
    let genre = movie.genres.first().map(String::as_str).unwrap_or("");
    let url = format!(
        "{}title={}&genres={}&title_type=feature",
        config.search_url,
        urlencoding::encode(&movie.title),
        genre
    );

    debug!(title = %movie.title, genre = %genre, "searching catalog");
    let html = client.get(&url).send().await?.error_for_status()?.text().await?;

    let hits = parse_search_results(&html, SEARCH_RESULT_LIMIT);
    debug!(title = %movie.title, hits = hits.len(), "parsed search results");

    match resolve_exact(&hits, &movie.title) {
        Some(href) => {
            movie.matched = true;
            Ok(Some(href))
        },
        None => Ok(None),
    }
}

fn parse_search_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let doc = Html::parse_document(html);
    let wrapper_sel = Selector::parse("a.ipc-title-link-wrapper").unwrap();
    let title_sel = Selector::parse("h3.ipc-title__text").unwrap();

    let mut out = Vec::new();

    for el in doc.select(&wrapper_sel).take(limit) {
        let Some(href) = el.value().attr("href") else { continue };
        let Some(heading) = el.select(&title_sel).next() else { continue };

        // Displayed titles carry a "1. " ordinal prefix.
        let title: String = element_text(heading).chars().skip(3).collect();

        out.push(SearchHit { title, href: href.to_string() });
    }

    out
}

/// First exact title equality wins; later candidates are not inspected.
fn resolve_exact(hits: &[SearchHit], title: &str) -> Option<String> {
    hits.iter().find(|hit| hit.title == title).map(|hit| hit.href.clone())
}

/// Fetches the matched entry's detail page, applies the extracted fields to
/// the record and downloads its poster. Returns whether a poster was written.
pub async fn enrich_movie(
    client: &reqwest::Client,
    config: &Config,
    movie: &mut MovieRecord,
    href: &str,
) -> AppResult<bool> {
    let url = format!("{}{}", config.base_url, href);
    debug!(title = %movie.title, "fetching detail page");
    let resp = client.get(&url).send().await.map_err(AppError::DetailFetch)?;
    let html = resp
        .error_for_status()
        .map_err(AppError::DetailFetch)?
        .text()
        .await
        .map_err(AppError::DetailFetch)?;

    let image_url = apply_detail_page(movie, &html, &config.base_url)?;
    Ok(fetch_image(client, config, movie, &image_url).await)
}

/// Applies the detail page's regions to the record in a fixed order, so that
/// a malformed page still leaves every previously extracted field in place.
/// Returns the poster source URL.
fn apply_detail_page(movie: &mut MovieRecord, html: &str, base_url: &str) -> AppResult<String> {
    let doc = Html::parse_document(html);

    let rating_sel = Selector::parse("div.sc-eb51e184-0 div.sc-eb51e184-2").unwrap();
    let rating_text = doc
        .select(&rating_sel)
        .next()
        .map(element_text)
        .ok_or(AppError::Enrichment { region: "rating" })?;
    let rating: f64 = rating_text
        .split('/')
        .next()
        .unwrap_or("")
        .trim()
        .parse()
        .map_err(|_| AppError::Enrichment { region: "rating" })?;
    if !(0.0..=10.0).contains(&rating) {
        return Err(AppError::Enrichment { region: "rating" });
    }
    movie.rating = rating;

    let scroller_sel = Selector::parse("div.ipc-chip-list__scroller").unwrap();
    let chip_sel = Selector::parse("span.ipc-chip__text").unwrap();
    let scroller =
        doc.select(&scroller_sel).next().ok_or(AppError::Enrichment { region: "genres" })?;
    movie.genres = scroller.select(&chip_sel).map(element_text).collect();

    let desc_sel = Selector::parse("span.sc-2d37a7c7-2").unwrap();
    movie.description = doc
        .select(&desc_sel)
        .next()
        .map(element_text)
        .ok_or(AppError::Enrichment { region: "description" })?;

    let year_sel = Selector::parse("div.sc-1f50b7c-0 li.ipc-inline-list__item").unwrap();
    let year_text = doc
        .select(&year_sel)
        .next()
        .map(element_text)
        .ok_or(AppError::Enrichment { region: "year" })?;
    let year: i32 = year_text.parse().map_err(|_| AppError::Enrichment { region: "year" })?;
    if !(1900..=2100).contains(&year) {
        return Err(AppError::Enrichment { region: "year" });
    }
    movie.year = year;

    let credit_sel = Selector::parse("a.ipc-metadata-list-item__list-content-item").unwrap();
    let mut credits = doc.select(&credit_sel);
    movie.director =
        credits.next().map(element_text).ok_or(AppError::Enrichment { region: "director" })?;
    movie.writer =
        credits.next().map(element_text).ok_or(AppError::Enrichment { region: "writer" })?;

    let cast_sel = Selector::parse("div.ipc-shoveler__grid").unwrap();
    let actor_sel = Selector::parse("a.sc-bfec09a1-1").unwrap();
    let grid = doc.select(&cast_sel).next().ok_or(AppError::Enrichment { region: "cast" })?;
    movie.actors = grid.select(&actor_sel).map(element_text).collect();

    let meta_list_sel = Selector::parse("ul.ipc-metadata-list--base").unwrap();
    let item_sel = Selector::parse("li.ipc-metadata-list__item").unwrap();
    let link_sel = Selector::parse("a").unwrap();
    let origin_item = doc
        .select(&meta_list_sel)
        .next()
        .and_then(|list| list.select(&item_sel).nth(1))
        .ok_or(AppError::Enrichment { region: "countries" })?;
    let mut origins: Vec<String> = origin_item.select(&link_sel).map(element_text).collect();
    if origins.is_empty() {
        return Err(AppError::Enrichment { region: "countries" });
    }
    // The leading entry is the section label, not a country.
    origins.remove(0);
    movie.countries_of_origin = origins;

    let img_sel = Selector::parse("img.ipc-image").unwrap();
    let image_url = doc
        .select(&img_sel)
        .next()
        .and_then(|img| img.value().attr("src"))
        .ok_or(AppError::Enrichment { region: "poster" })?
        .to_string();
    movie.image_name = image_file_name(&movie.title);

    let overlay_sel = Selector::parse("a.ipc-lockup-overlay.ipc-focusable").unwrap();
    let trailer_href = doc
        .select(&overlay_sel)
        .nth(1)
        .and_then(|a| a.value().attr("href"))
        .ok_or(AppError::Enrichment { region: "trailer" })?;
    movie.trailer_url = format!("{base_url}{trailer_href}");

    Ok(image_url)
}

/// Downloads the poster bytes into the pictures directory. Failures are
/// logged and reported as `false`, never returned to the caller.
pub async fn fetch_image(
    client: &reqwest::Client,
    config: &Config,
    movie: &MovieRecord,
    image_url: &str,
) -> bool {
    match download_image(client, config, movie, image_url).await {
        Ok(()) => true,
        Err(err) => {
            error!(title = %movie.title, error = %err, "failed to download image");
            false
        },
    }
}

async fn download_image(
    client: &reqwest::Client,
    config: &Config,
    movie: &MovieRecord,
    image_url: &str,
) -> AppResult<()> {
    let resp =
        client.get(image_url).send().await.map_err(|e| AppError::ImageFetch(e.to_string()))?;
    if resp.status() != reqwest::StatusCode::OK {
        return Err(AppError::ImageFetch(format!("HTTP {}", resp.status())));
    }
    let bytes = resp.bytes().await.map_err(|e| AppError::ImageFetch(e.to_string()))?;

    let path = std::path::Path::new(&config.pictures_dir).join(&movie.image_name);
    std::fs::write(path, &bytes)?;
    Ok(())
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DEFAULT_IMAGE_NAME, MovieInput, MovieRecord};

    fn record(title: &str) -> MovieRecord {
        MovieRecord::from_input(MovieInput {
            title: title.to_string(),
            year: None,
            genres: None,
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

    #[test]
    fn image_file_name_strips_and_joins() {
        assert_eq!(
            image_file_name("Nothing: Else! Should & Matters, As applepie"),
            "nothing_else_should__matters_as_applepie.jpg"
        );
    }

    #[test]
    fn image_file_name_is_total() {
        assert_eq!(image_file_name(""), ".jpg");
        assert_eq!(image_file_name("Amélie"), "amélie.jpg");
        assert_eq!(image_file_name("Se7en+"), "se7en.jpg");
    }

    fn search_entry(ordinal: usize, title: &str, href: &str) -> String {
        format!(
            r#"<li><a class="ipc-title-link-wrapper" href="{href}">
                 <h3 class="ipc-title__text">{ordinal}. {title}</h3></a></li>"#
        )
    }

    #[test]
    fn parses_search_results_without_ordinal_prefix() {
        let html = format!(
            "<ul>{}{}</ul>",
            search_entry(1, "The Matrix", "/title/tt0133093/"),
            search_entry(2, "The Matrix Resurrections", "/title/tt10838180/"),
        );
        let hits = parse_search_results(&html, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "The Matrix");
        assert_eq!(hits[0].href, "/title/tt0133093/");
        assert_eq!(hits[1].title, "The Matrix Resurrections");
    }

    #[test]
    fn search_results_are_limited() {
        let html: String =
            (1..=8).map(|i| search_entry(i, &format!("Movie {i}"), "/title/x/")).collect();
        assert_eq!(parse_search_results(&html, 5).len(), 5);
    }

    #[test]
    fn first_exact_match_wins() {
        let hits = vec![
            SearchHit { title: "Heat".to_string(), href: "/title/first/".to_string() },
            SearchHit { title: "Heat".to_string(), href: "/title/second/".to_string() },
        ];
        assert_eq!(resolve_exact(&hits, "Heat").as_deref(), Some("/title/first/"));
        assert_eq!(resolve_exact(&hits, "Heat 2"), None);
    }

    fn detail_page(with_poster: bool) -> String {
        detail_page_with("8.7/10", "1999", with_poster)
    }

    fn detail_page_with(rating: &str, year: &str, with_poster: bool) -> String {
        let poster = if with_poster {
            r#"<img class="ipc-image" src="https://images.example/poster.jpg">"#
        } else {
            ""
        };
        format!(
            r#"
            <div class="sc-eb51e184-0"><div class="sc-eb51e184-2">{rating}</div></div>
            <div class="ipc-chip-list__scroller">
              <span class="ipc-chip__text">Action</span>
              <span class="ipc-chip__text">Sci-Fi</span>
            </div>
            <span class="sc-2d37a7c7-2">A computer hacker learns the truth.</span>
            <div class="sc-1f50b7c-0"><ul><li class="ipc-inline-list__item">{year}</li></ul></div>
            <ul class="ipc-metadata-list ipc-metadata-list--dividers-all ipc-metadata-list--base">
              <li class="ipc-metadata-list__item">
                <a class="ipc-metadata-list-item__list-content-item">Lana Wachowski</a>
                <a class="ipc-metadata-list-item__list-content-item">Lilly Wachowski</a>
              </li>
              <li class="ipc-metadata-list__item">
                <a>Countries of origin</a>
                <ul><li><a>United States</a></li><li><a>Australia</a></li></ul>
              </li>
            </ul>
            <div class="ipc-sub-grid ipc-shoveler__grid">
              <a class="sc-bfec09a1-1">Keanu Reeves</a>
              <a class="sc-bfec09a1-1">Carrie-Anne Moss</a>
            </div>
            {poster}
            <a class="ipc-lockup-overlay ipc-focusable" href="/mediaviewer/"></a>
            <a class="ipc-lockup-overlay ipc-focusable" href="/video/vi1032782361/"></a>
            "#
        )
    }

    #[test]
    fn applies_every_detail_region() {
        let mut movie = record("The Matrix");
        let image_url =
            apply_detail_page(&mut movie, &detail_page(true), "https://www.imdb.com").unwrap();

        assert_eq!(image_url, "https://images.example/poster.jpg");
        assert_eq!(movie.rating, 8.7);
        assert_eq!(movie.genres, vec!["Action", "Sci-Fi"]);
        assert_eq!(movie.description, "A computer hacker learns the truth.");
        assert_eq!(movie.year, 1999);
        assert_eq!(movie.director, "Lana Wachowski");
        assert_eq!(movie.writer, "Lilly Wachowski");
        assert_eq!(movie.actors, vec!["Keanu Reeves", "Carrie-Anne Moss"]);
        assert_eq!(movie.countries_of_origin, vec!["United States", "Australia"]);
        assert_eq!(movie.image_name, "the_matrix.jpg");
        assert_eq!(movie.trailer_url, "https://www.imdb.com/video/vi1032782361/");
    }

    #[test]
    fn missing_first_region_leaves_record_untouched() {
        let mut movie = record("The Matrix");
        let err = apply_detail_page(&mut movie, "<html></html>", "https://www.imdb.com")
            .unwrap_err();
        assert!(matches!(err, AppError::Enrichment { region: "rating" }));
        assert_eq!(movie.rating, 0.0);
        assert_eq!(movie.genres, vec![String::new()]);
        assert_eq!(movie.image_name, DEFAULT_IMAGE_NAME);
    }

    #[test]
    fn out_of_range_rating_is_rejected() {
        let mut movie = record("The Matrix");
        let err =
            apply_detail_page(&mut movie, &detail_page_with("11.2/10", "1999", true), "https://www.imdb.com")
                .unwrap_err();
        assert!(matches!(err, AppError::Enrichment { region: "rating" }));
        assert_eq!(movie.rating, 0.0);
    }

    #[test]
    fn out_of_range_year_keeps_earlier_fields() {
        let mut movie = record("The Matrix");
        let default_year = movie.year;
        let err =
            apply_detail_page(&mut movie, &detail_page_with("8.7/10", "1899", true), "https://www.imdb.com")
                .unwrap_err();
        assert!(matches!(err, AppError::Enrichment { region: "year" }));
        // Regions before the year were already applied.
        assert_eq!(movie.rating, 8.7);
        assert_eq!(movie.year, default_year);
    }

    #[tokio::test]
    async fn unreachable_detail_page_is_a_detail_fetch_error() {
        let config = Config {
            base_url: "https://catalog.invalid".to_string(),
            search_url: "https://catalog.invalid/search/title/?".to_string(),
            database_url: "sqlite::memory:".to_string(),
            movies_file: "movies.json".to_string(),
            pictures_dir: "movie_pictures".to_string(),
            max_concurrent: 10,
            request_timeout_secs: 1,
        };
        let client = reqwest::Client::new();
        let mut movie = record("The Matrix");

        let err =
            enrich_movie(&client, &config, &mut movie, "/title/tt0133093/").await.unwrap_err();
        assert!(matches!(err, AppError::DetailFetch(_)));
    }

    #[test]
    fn missing_poster_keeps_earlier_fields_and_placeholder() {
        let mut movie = record("The Matrix");
        let err = apply_detail_page(&mut movie, &detail_page(false), "https://www.imdb.com")
            .unwrap_err();
        assert!(matches!(err, AppError::Enrichment { region: "poster" }));
        // Regions before the poster were already applied.
        assert_eq!(movie.rating, 8.7);
        assert_eq!(movie.year, 1999);
        assert_eq!(movie.countries_of_origin, vec!["United States", "Australia"]);
        // No poster, no derived file name.
        assert_eq!(movie.image_name, DEFAULT_IMAGE_NAME);
    }
}
