use url::Url;

use super::location::{FROM_PARAM, MODE_PARAM, with_query_param};
use crate::model::ViewerMode;

#[derive(Debug, Clone, PartialEq)]
pub struct ShareLinks {
    pub url: Url,
    pub embed: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    Url,
    Embed,
}

/// Canonical link to `location` plus an `<iframe>` snippet embedding it.
///
/// The "opened from list" marker is dropped; `mode=scroll` is present only
/// when scroll mode is the chosen share option.
pub fn share_links(location: &Url, mode: ViewerMode, title: &str) -> ShareLinks {
    let url = with_query_param(location, FROM_PARAM, None);
    let url = match mode {
        ViewerMode::Scroll => with_query_param(&url, MODE_PARAM, Some("scroll")),
        ViewerMode::Paged => with_query_param(&url, MODE_PARAM, None),
    };
    let embed = format!(
        r#"<iframe src="{}" title="{}" width="100%" height="500" frameborder="0" allowfullscreen></iframe>"#,
        escape_attr(url.as_str()),
        escape_attr(title)
    );
    ShareLinks { url, embed }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
