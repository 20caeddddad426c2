//! Purpose: Provide a blocking HTTP client for the bookshelf JSON endpoints.
//! Exports: `RemoteClient`.
//! Role: Mirrors the five library operations for the CLI and integration tests.
//! Invariants: Request/response bodies match the server's field names exactly.
//! Invariants: Failure envelopes `{success:false,error}` map back to `ErrorKind`.
#![allow(clippy::result_large_err)]

use crate::core::error::{Error, ErrorKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

type ApiResult<T> = Result<T, Error>;

#[derive(Clone)]
pub struct RemoteClient {
    inner: Arc<RemoteClientInner>,
}

struct RemoteClientInner {
    base_url: Url,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct SuccessEnvelope {
    success: bool,
}

#[derive(Deserialize)]
struct LibraryEnvelope {
    library: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

#[derive(Serialize)]
struct BookRequest<'a> {
    book: &'a str,
}

#[derive(Serialize)]
struct RenameRequest<'a> {
    original_book: &'a str,
    new_book: &'a str,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            inner: Arc::new(RemoteClientInner { base_url, agent }),
        })
    }

    pub fn health(&self) -> ApiResult<()> {
        let url = self.endpoint("healthz")?;
        let _value: serde_json::Value = self.request_json::<(), _>("GET", &url, None)?;
        Ok(())
    }

    pub fn add_book(&self, title: &str) -> ApiResult<()> {
        let url = self.endpoint("addBook")?;
        let envelope = self.request_json("POST", &url, Some(&BookRequest { book: title }))?;
        expect_success(envelope)
    }

    pub fn remove_book(&self, title: &str) -> ApiResult<()> {
        let url = self.endpoint("removeBook")?;
        let envelope = self.request_json("DELETE", &url, Some(&BookRequest { book: title }))?;
        expect_success(envelope)
    }

    pub fn rename_book(&self, original: &str, new: &str) -> ApiResult<()> {
        let url = self.endpoint("updateBook")?;
        let payload = RenameRequest {
            original_book: original,
            new_book: new,
        };
        let envelope = self.request_json("PATCH", &url, Some(&payload))?;
        expect_success(envelope)
    }

    pub fn list_books(&self) -> ApiResult<String> {
        let url = self.endpoint("getLibrary")?;
        let envelope: LibraryEnvelope = self.request_json::<(), _>("GET", &url, None)?;
        Ok(envelope.library)
    }

    pub fn save_to_database(&self) -> ApiResult<BTreeMap<String, u64>> {
        let url = self.endpoint("saveToDatabase")?;
        self.request_json::<(), _>("PUT", &url, None)
    }

    fn endpoint(&self, name: &str) -> ApiResult<Url> {
        build_url(&self.inner.base_url, &[name])
    }

    fn request_json<T, R>(&self, method: &str, url: &Url, body: Option<&T>) -> ApiResult<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let request = self
            .inner
            .agent
            .request(method, url.as_str())
            .set("Accept", "application/json");
        let response = match body {
            None => request.call(),
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to encode request json")
                        .with_source(err)
                })?;
                request
                    .set("Content-Type", "application/json")
                    .send_string(&payload)
            }
        };

        match response {
            Ok(resp) => read_json_response(resp),
            Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

fn expect_success(envelope: SuccessEnvelope) -> ApiResult<()> {
    if envelope.success {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::Internal).with_message("server reported failure"))
    }
}

fn normalize_base_url(input: String) -> ApiResult<Url> {
    let mut url = Url::parse(&input).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid server url")
            .with_hint("Use a URL like http://127.0.0.1:3000.")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage).with_message("server url must use http or https"));
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_url(base_url: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("server url cannot be a base")
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn read_json_response<R>(response: ureq::Response) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
        let kind = error_kind_from_message(&envelope.error)
            .unwrap_or_else(|| error_kind_from_status(status));
        return Error::new(kind).with_message(envelope.error);
    }
    Error::new(error_kind_from_status(status)).with_message(format!("remote error status {status}"))
}

fn error_kind_from_message(message: &str) -> Option<ErrorKind> {
    match message {
        "Invalid book title" | "Invalid book titles" => Some(ErrorKind::InvalidInput),
        "Duplicate book title" => Some(ErrorKind::DuplicateEntry),
        "Book not found" => Some(ErrorKind::NotFound),
        _ => None,
    }
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 | 413 | 422 => ErrorKind::Usage,
        404 => ErrorKind::NotFound,
        500..=599 => ErrorKind::Internal,
        _ => ErrorKind::Io,
    }
}
