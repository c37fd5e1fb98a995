use serde::Deserialize;
use std::io::BufReader;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;
use thiserror::Error;
use ureq::Agent;
use url::Url;

use crate::live_reload::{self, ChannelEvent};
use crate::model::{DeckMetadata, ImportForm, SlideList, SlidePatch, SlideSummary};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const IMPORT_TIMEOUT: Duration = Duration::from_secs(300);
const STATIC_INDEX_FILE: &str = "slides-index.json";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The dev-mode backend plus its static fallbacks.
pub trait SlideApi {
    /// `GET /api/slides`; success is the dev-mode signal.
    fn list_slides(&self) -> Result<Vec<SlideSummary>, ApiError>;

    /// `slides-index.json` next to the site root.
    fn static_index(&self) -> Result<Vec<SlideSummary>, ApiError>;

    fn import(&self, form: &ImportForm) -> Result<(), ApiError>;

    fn update(&self, name: &str, patch: &SlidePatch) -> Result<(), ApiError>;

    fn delete(&self, name: &str) -> Result<(), ApiError>;

    /// Opens the server-push channel. Connection failures arrive as `ChannelEvent::Error`.
    fn open_live_reload(&self) -> Result<Receiver<ChannelEvent>, ApiError>;
}

/// Per-deck resources the viewer reads.
pub trait DeckSource {
    fn fetch_metadata(&self, url: &Url) -> Result<DeckMetadata, ApiError>;

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Blocking HTTP client for the slide backend.
#[derive(Clone)]
pub struct HttpApi {
    base: Url,
    agent: Agent,
    import_agent: Agent,
    stream_agent: Agent,
}

impl HttpApi {
    pub fn new(base: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            agent: build_agent(Some(REQUEST_TIMEOUT)),
            import_agent: build_agent(Some(IMPORT_TIMEOUT)),
            stream_agent: build_agent(None),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn slide_url(&self, name: &str) -> Result<Url, ApiError> {
        let mut url = self.base.join("api/slides/")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Decode(format!("cannot-be-a-base URL: {}", self.base)))?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> Result<T, ApiError> {
        tracing::debug!(%url, "GET");
        let mut response = self.agent.get(url.as_str()).call().map_err(network)?;
        check_status(&mut response)?;
        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn build_agent(timeout: Option<Duration>) -> Agent {
    let config = Agent::config_builder()
        .timeout_global(timeout)
        .http_status_as_error(false)
        .build();
    Agent::new_with_config(config)
}

fn network(e: ureq::Error) -> ApiError {
    ApiError::Network(e.to_string())
}

/// Turns a non-2xx response into `ApiError::Status`, preferring the `{ error }` body.
fn check_status(response: &mut ureq::http::Response<ureq::Body>) -> Result<(), ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.body_mut().read_to_string().unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .ok()
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

impl SlideApi for HttpApi {
    fn list_slides(&self) -> Result<Vec<SlideSummary>, ApiError> {
        let url = self.base.join("api/slides")?;
        Ok(self.get_json::<SlideList>(&url)?.slides)
    }

    fn static_index(&self) -> Result<Vec<SlideSummary>, ApiError> {
        let url = self.base.join(STATIC_INDEX_FILE)?;
        Ok(self.get_json::<SlideList>(&url)?.slides)
    }

    fn import(&self, form: &ImportForm) -> Result<(), ApiError> {
        let url = self.base.join("api/import")?;
        let pdf = std::fs::read(&form.pdf)?;
        let filename = form
            .pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "slides.pdf".to_string());
        let boundary = multipart_boundary();
        let body = multipart_body(&boundary, &form.fields(), "pdf", &filename, &pdf);

        tracing::info!(%url, file = %filename, bytes = pdf.len(), "POST import");
        let mut response = self
            .import_agent
            .post(url.as_str())
            .header(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .send(&body[..])
            .map_err(network)?;
        check_status(&mut response)
    }

    fn update(&self, name: &str, patch: &SlidePatch) -> Result<(), ApiError> {
        let url = self.slide_url(name)?;
        tracing::info!(%url, "PUT");
        let mut response = self
            .agent
            .put(url.as_str())
            .send_json(patch)
            .map_err(network)?;
        check_status(&mut response)
    }

    fn delete(&self, name: &str) -> Result<(), ApiError> {
        let url = self.slide_url(name)?;
        tracing::info!(%url, "DELETE");
        let mut response = self.agent.delete(url.as_str()).call().map_err(network)?;
        check_status(&mut response)
    }

    fn open_live_reload(&self) -> Result<Receiver<ChannelEvent>, ApiError> {
        let url = self.base.join("api/live-reload")?;
        let agent = self.stream_agent.clone();
        let (tx, rx) = mpsc::channel();
        std::thread::Builder::new()
            .name("live-reload".to_string())
            .spawn(move || {
                tracing::debug!(%url, "opening live-reload stream");
                let response = agent
                    .get(url.as_str())
                    .header("Accept", "text/event-stream")
                    .call();
                let mut response = match response {
                    Ok(response) => response,
                    Err(e) => {
                        let _ = tx.send(ChannelEvent::Error(e.to_string()));
                        return;
                    }
                };
                if let Err(e) = check_status(&mut response) {
                    let _ = tx.send(ChannelEvent::Error(e.to_string()));
                    return;
                }
                let reader = BufReader::new(response.into_body().into_reader());
                live_reload::pump(reader, &tx);
            })?;
        Ok(rx)
    }
}

impl DeckSource for HttpApi {
    fn fetch_metadata(&self, url: &Url) -> Result<DeckMetadata, ApiError> {
        self.get_json(url)
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        tracing::trace!(%url, "GET bytes");
        let mut response = self.agent.get(url).call().map_err(network)?;
        check_status(&mut response)?;
        response
            .body_mut()
            .read_to_vec()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn multipart_boundary() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("----slidehost{nanos:x}")
}

/// `multipart/form-data` body: text fields first, then the single file part.
pub fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    file_field: &str,
    filename: &str,
    file: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(file.len() + 512);
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    let filename = filename.replace('"', "");
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{file_field}\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
