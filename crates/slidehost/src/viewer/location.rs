use url::Url;

use crate::model::{DeckMetadata, slide_image_file};

pub const PAGE_PARAM: &str = "page";
pub const MODE_PARAM: &str = "mode";
pub const FROM_PARAM: &str = "from";
pub const SLIDE_PARAM: &str = "slide";

pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Copy of `url` with `key` set to `value`, or removed when `value` is `None`.
/// Other parameters keep their order; a new key is appended.
pub fn with_query_param(url: &Url, key: &str, value: Option<&str>) -> Url {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if let Some(value) = value {
        let position = url
            .query_pairs()
            .position(|(k, _)| k == key)
            .unwrap_or(pairs.len())
            .min(pairs.len());
        pairs.insert(position, (key.to_string(), value.to_string()));
    }

    let mut out = url.clone();
    if pairs.is_empty() {
        out.set_query(None);
    } else {
        out.query_pairs_mut().clear().extend_pairs(pairs);
    }
    out
}

/// Deck identity: the `slide` query parameter for the generic entry point,
/// otherwise the last non-empty path segment.
pub fn deck_name(url: &Url) -> Option<String> {
    match query_param(url, SLIDE_PARAM) {
        Some(name) => Some(name).filter(|n| !n.trim().is_empty()),
        None => url
            .path_segments()?
            .rfind(|s| !s.is_empty())
            .map(str::to_string),
    }
}

/// Directory holding the site's `slides/` tree, derived from the viewer URL.
pub fn resource_base(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_query(None);
    base.set_fragment(None);
    let up = if query_param(url, SLIDE_PARAM).is_none() && url.path().ends_with('/') {
        ".."
    } else {
        "."
    };
    base.join(up).unwrap_or(base)
}

pub fn metadata_url(base: &Url, name: &str) -> Result<Url, url::ParseError> {
    base.join(&format!("slides/{name}/metadata.json"))
}

/// One URL per page of deck `name`, in page order.
pub fn image_urls(
    base: &Url,
    name: &str,
    meta: &DeckMetadata,
) -> Result<Vec<String>, url::ParseError> {
    let format = meta.format();
    (1..=meta.page_count)
        .map(|page| {
            base.join(&format!("slides/{name}/images/{}", slide_image_file(page, format)))
                .map(String::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_deck_name_from_path_and_query() {
        assert_eq!(
            deck_name(&url("https://h.example/decks/intro?page=2")).as_deref(),
            Some("intro")
        );
        assert_eq!(
            deck_name(&url("https://h.example/decks/intro/")).as_deref(),
            Some("intro")
        );
        assert_eq!(
            deck_name(&url("https://h.example/viewer.html?slide=q3-review")).as_deref(),
            Some("q3-review")
        );
        assert_eq!(deck_name(&url("https://h.example/viewer.html?slide=")), None);
        assert_eq!(deck_name(&url("https://h.example/")), None);
    }

    #[test]
    fn test_resource_base() {
        assert_eq!(
            resource_base(&url("https://h.example/site/intro?page=3")).as_str(),
            "https://h.example/site/"
        );
        assert_eq!(
            resource_base(&url("https://h.example/site/intro/")).as_str(),
            "https://h.example/site/"
        );
        assert_eq!(
            resource_base(&url("https://h.example/site/viewer.html?slide=intro")).as_str(),
            "https://h.example/site/"
        );
    }

    #[test]
    fn test_image_urls_for_five_png_pages() {
        let base = url("https://h.example/");
        let meta = DeckMetadata {
            name: "demo".into(),
            title: None,
            page_count: 5,
            format: Some("png".into()),
        };
        let urls = image_urls(&base, "demo", &meta).unwrap();
        assert_eq!(urls.len(), 5);
        assert_eq!(urls[0], "https://h.example/slides/demo/images/slide-001.png");
        assert_eq!(urls[4], "https://h.example/slides/demo/images/slide-005.png");
        assert_eq!(
            metadata_url(&base, "demo").unwrap().as_str(),
            "https://h.example/slides/demo/metadata.json"
        );
    }

    #[test]
    fn test_image_urls_use_given_name_over_metadata_name() {
        let meta = DeckMetadata {
            name: "Quarterly Review".into(),
            title: None,
            page_count: 2,
            format: Some("webp".into()),
        };
        let urls = image_urls(&url("https://h.example/site/"), "q3-review", &meta).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://h.example/site/slides/q3-review/images/slide-001.webp",
                "https://h.example/site/slides/q3-review/images/slide-002.webp",
            ]
        );
    }

    #[test]
    fn test_with_query_param_replaces_in_place() {
        let u = url("https://h.example/intro?from=list&page=2&mode=scroll");
        assert_eq!(
            with_query_param(&u, PAGE_PARAM, Some("7")).as_str(),
            "https://h.example/intro?from=list&page=7&mode=scroll"
        );
        assert_eq!(
            with_query_param(&u, FROM_PARAM, None).as_str(),
            "https://h.example/intro?page=2&mode=scroll"
        );
        assert_eq!(
            with_query_param(&url("https://h.example/intro"), PAGE_PARAM, Some("1")).as_str(),
            "https://h.example/intro?page=1"
        );
        assert_eq!(
            with_query_param(&url("https://h.example/intro?page=1"), PAGE_PARAM, None).as_str(),
            "https://h.example/intro"
        );
    }
}
