use std::collections::HashSet;

use serde_json::json;
use sift_search::cache::request_key;
use sift_search::rank::url_normalize::{host_of, normalize_url};
use sift_search::{SearchBackend, SearchParams, SearchResult};
use tracing::debug;

use super::Gateway;
use super::types::{ImageResult, ImageSearchArgs, ImageSearchResponse};
use crate::cursor::{decode_cursor, next_cursor};
use crate::error::Result;

const UNTITLED: &str = "(untitled)";

impl<B: SearchBackend> Gateway<B> {
    /// Search the upstream `images` category.
    ///
    /// Results without an image or thumbnail URL are dropped, and repeats of
    /// the same image (after URL normalization) keep only the first.
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::search`].
    pub async fn image_search(&self, args: ImageSearchArgs) -> Result<ImageSearchResponse> {
        args.validate()?;
        let page = match args.cursor.as_deref() {
            Some(cursor) => decode_cursor(cursor)?,
            None => 1,
        };
        let language = self.resolve_language(args.lang.as_deref(), &args.query);
        let safesearch = args.safe.unwrap_or(self.config.search.default_safesearch);

        let key = request_key(
            "images",
            &json!({
                "q": args.query,
                "page": page,
                "limit": args.limit,
                "language": language,
                "safesearch": safesearch.level(),
                "engines": args.engines,
            }),
        );
        if let Some(hit) = self.image_cache.get(&key).await {
            debug!(page, "image cache hit");
            return Ok(hit);
        }

        let mut params = SearchParams::new(args.query.as_str(), language);
        params.page = page;
        params.safesearch = safesearch;
        params.categories = vec!["images".to_owned()];
        params.engines = args.engines.clone().unwrap_or_default();

        let raw = self.backend.search(&params).await?;
        let next_cursor = next_cursor(page, !raw.is_empty());

        let mut seen = HashSet::new();
        let results = raw
            .into_iter()
            .filter_map(to_image_result)
            .filter(|r| seen.insert(normalize_url(&r.image_url)))
            .take(args.limit as usize)
            .collect();

        let response = ImageSearchResponse {
            results,
            next_cursor,
        };
        self.image_cache.insert(key, response.clone()).await;
        Ok(response)
    }
}

fn to_image_result(raw: SearchResult) -> Option<ImageResult> {
    let image_url = raw
        .image_url
        .as_deref()
        .or(raw.thumbnail_url.as_deref())
        .map(str::trim)
        .filter(|u| !u.is_empty())?
        .to_owned();

    let title = match raw.title.trim() {
        "" => UNTITLED.to_owned(),
        t => t.to_owned(),
    };
    let page_url = raw.url.trim();
    let (source_page_url, domain) = if page_url.is_empty() {
        (None, None)
    } else {
        (Some(normalize_url(page_url)), host_of(page_url))
    };

    Some(ImageResult {
        title,
        image_url,
        thumbnail_url: raw.thumbnail_url.filter(|t| !t.trim().is_empty()),
        source_page_url,
        source: raw.engine,
        score: raw.score,
        domain,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::config::GatewayConfig;
    use crate::cursor::encode_cursor;
    use sift_search::{NetworkAccessPolicy, PolicyConfig, SearchError};
    use std::sync::{Arc, Mutex};

    struct ImageBackend {
        results: Vec<SearchResult>,
        seen_categories: Mutex<Vec<String>>,
    }

    impl SearchBackend for ImageBackend {
        async fn search(
            &self,
            params: &SearchParams,
        ) -> std::result::Result<Vec<SearchResult>, SearchError> {
            *self.seen_categories.lock().unwrap() = params.categories.clone();
            Ok(self.results.clone())
        }
    }

    fn image(title: &str, page: &str, img: Option<&str>, thumb: Option<&str>) -> SearchResult {
        SearchResult {
            title: title.into(),
            url: page.into(),
            image_url: img.map(Into::into),
            thumbnail_url: thumb.map(Into::into),
            engine: Some("bing images".into()),
            ..Default::default()
        }
    }

    fn gateway(results: Vec<SearchResult>) -> Gateway<ImageBackend> {
        let backend = ImageBackend {
            results,
            seen_categories: Mutex::new(Vec::new()),
        };
        let guard = Arc::new(NetworkAccessPolicy::new(&PolicyConfig::default()));
        Gateway::with_parts(GatewayConfig::default(), backend, guard).expect("gateway")
    }

    #[test]
    fn thumbnail_stands_in_for_missing_image() {
        let r = to_image_result(image(
            "  ",
            "https://photos.example.com/cat?utm_source=x",
            None,
            Some(" https://cdn.example.com/t.jpg "),
        ))
        .expect("kept");
        assert_eq!(r.title, UNTITLED);
        assert_eq!(r.image_url, "https://cdn.example.com/t.jpg");
        assert_eq!(r.source_page_url.as_deref(), Some("https://photos.example.com/cat"));
        assert_eq!(r.domain.as_deref(), Some("photos.example.com"));

        assert!(to_image_result(image("no image", "https://a.example/", None, None)).is_none());
        assert!(to_image_result(image("blank", "https://a.example/", Some(" "), None)).is_none());
    }

    #[tokio::test]
    async fn dedups_by_normalized_image_url_and_limits() {
        let gw = gateway(vec![
            image("Cat", "https://a.example/1", Some("https://img.example.com/cat.jpg"), None),
            image(
                "Cat again",
                "https://b.example/2",
                Some("https://IMG.example.com/cat.jpg#zoom"),
                None,
            ),
            image("Dog", "https://c.example/3", Some("https://img.example.com/dog.jpg"), None),
            image("Bird", "https://d.example/4", Some("https://img.example.com/bird.jpg"), None),
        ]);
        let mut args = ImageSearchArgs::new("cat photo");
        args.limit = 2;
        let response = gw.image_search(args).await.expect("images");

        let titles: Vec<_> = response.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Cat", "Dog"]);
        assert_eq!(response.next_cursor, Some(encode_cursor(2)));
        assert_eq!(*gw.backend.seen_categories.lock().unwrap(), ["images"]);
    }

    #[tokio::test]
    async fn last_page_cursor_has_no_successor() {
        let gw = gateway(vec![image(
            "Cat",
            "https://a.example/1",
            Some("https://img.example.com/cat.jpg"),
            None,
        )]);
        let mut args = ImageSearchArgs::new("cat photo");
        args.cursor = Some(encode_cursor(u32::MAX));
        let response = gw.image_search(args).await.expect("images");

        assert_eq!(response.results.len(), 1);
        assert!(response.next_cursor.is_none());
    }
}
