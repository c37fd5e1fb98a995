use serde::{Deserialize, Serialize};

/// Image extension used when a deck does not declare one.
pub const DEFAULT_FORMAT: &str = "png";

/// One deck as listed by the backend or a static index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideSummary {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub page_count: usize,

    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub created_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl SlideSummary {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.name)
    }

    /// Thumbnail path relative to the site root: the explicit one, else page 1.
    pub fn thumbnail_path(&self) -> String {
        match &self.thumbnail {
            Some(path) if !path.is_empty() => path.clone(),
            _ => format!(
                "slides/{}/images/{}",
                self.name,
                slide_image_file(1, &self.format)
            ),
        }
    }
}

/// Wire shape shared by `GET /api/slides`, the embedded blob and `slides-index.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlideList {
    #[serde(default)]
    pub slides: Vec<SlideSummary>,
}

/// Per-deck `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckMetadata {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub page_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl DeckMetadata {
    pub fn format(&self) -> &str {
        self.format
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FORMAT)
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

/// Body of `PUT /api/slides/{name}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlidePatch {
    pub title: String,
    pub description: String,
    pub created_at: String,
}

/// Fields of the import form; `pdf` is read from disk by the HTTP client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportForm {
    pub pdf: std::path::PathBuf,
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
}

impl ImportForm {
    /// Non-empty text fields in the order they are submitted.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", self.name.as_deref()),
            ("title", self.title.as_deref()),
            ("description", self.description.as_deref()),
            ("createdAt", self.created_at.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        })
        .collect()
    }
}

/// How the viewer lays out pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewerMode {
    #[default]
    Paged,
    Scroll,
}

impl ViewerMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "paged" => Some(Self::Paged),
            "scroll" => Some(Self::Scroll),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Paged => "paged",
            Self::Scroll => "scroll",
        }
    }
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

/// `slide-007.png` for page 7.
pub fn slide_image_file(page: usize, format: &str) -> String {
    format!("slide-{page:03}.{format}")
}
