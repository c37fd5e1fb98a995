pub mod completion;
pub mod config;
pub mod index;
pub mod share;
pub mod theme;
pub mod view;

use anyhow::{Context as _, Result};
use url::Url;

use crate::api::HttpApi;
use crate::config::Config;
use crate::viewer::location::{self, FROM_PARAM, MODE_PARAM, PAGE_PARAM};

/// Settings shared by every subcommand.
pub struct Context {
    pub config: Config,
    pub server_override: Option<String>,
    pub quiet: bool,
}

impl Context {
    pub fn new(server_override: Option<String>, quiet: bool) -> Self {
        Self {
            config: Config::load_or_default(),
            server_override,
            quiet,
        }
    }

    pub fn server_url(&self) -> &str {
        self.server_override
            .as_deref()
            .unwrap_or_else(|| self.config.server_url())
    }

    pub fn api(&self) -> Result<HttpApi> {
        HttpApi::new(self.server_url())
            .with_context(|| format!("Invalid server URL: {}", self.server_url()))
    }
}

/// Viewer URL for `deck`: a full http(s) URL is taken as is, anything else
/// is a deck name under the server root.
pub fn deck_location(
    server: &Url,
    deck: &str,
    page: Option<usize>,
    scroll: bool,
    from_list: bool,
) -> Result<Url> {
    let mut url = match Url::parse(deck) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        _ => {
            let name = deck.trim().trim_matches('/');
            if name.is_empty() {
                anyhow::bail!("Deck name is empty");
            }
            let mut url = server.clone();
            url.path_segments_mut()
                .map_err(|_| anyhow::anyhow!("Server URL cannot have a path: {server}"))?
                .pop_if_empty()
                .push(name);
            url
        }
    };
    if let Some(page) = page {
        url = location::with_query_param(&url, PAGE_PARAM, Some(&page.to_string()));
    }
    if scroll {
        url = location::with_query_param(&url, MODE_PARAM, Some("scroll"));
    }
    if from_list {
        url = location::with_query_param(&url, FROM_PARAM, Some("list"));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> Url {
        Url::parse("http://localhost:3000/").unwrap()
    }

    #[test]
    fn test_deck_location_from_name() {
        let url = deck_location(&server(), "intro", Some(3), true, false).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/intro?page=3&mode=scroll");
    }

    #[test]
    fn test_deck_location_escapes_name() {
        let url = deck_location(&server(), "q3 review", None, false, true).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/q3%20review?from=list");
    }

    #[test]
    fn test_deck_location_keeps_full_urls() {
        let url = deck_location(
            &server(),
            "https://h.example/site/viewer.html?slide=intro",
            Some(2),
            false,
            false,
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://h.example/site/viewer.html?slide=intro&page=2"
        );
    }

    #[test]
    fn test_deck_location_rejects_blank_name() {
        assert!(deck_location(&server(), " / ", None, false, false).is_err());
    }

    #[test]
    fn test_server_override_wins() {
        let ctx = Context {
            config: Config::default(),
            server_override: Some("http://h.example:8080".into()),
            quiet: true,
        };
        assert_eq!(ctx.server_url(), "http://h.example:8080");
        assert_eq!(ctx.api().unwrap().base().as_str(), "http://h.example:8080/");
    }
}
