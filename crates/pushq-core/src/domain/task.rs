//! PushTask - 検証済み・不変のタスク記述子
//!
//! # 設計
//! - コンストラクタで全フィールドを検証（Fail-fast）
//! - 構築後は変更不可（フィールドは private、アクセサのみ公開）
//! - 部分的に正しいインスタンスは存在しない

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::TaskQueueError;
use super::method::HttpMethod;
use super::payload::{json_type, Payload};

/// A task may be scheduled up to 30 days into the future.
pub const MAX_DELAY_SECONDS: f64 = 2_592_000.0;
pub const MAX_NAME_LENGTH: usize = 500;
pub const MAX_URL_LENGTH: usize = 2083;

const FORM_CONTENT_TYPE: &str = "content-type: application/x-www-form-urlencoded";
const OPTION_KEYS: [&str; 4] = ["delay_seconds", "method", "name", "header"];

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("task name regex"));

/// Options accepted by `PushTask`, in the legacy shape.
///
/// # Example
/// ```ignore
/// let options = PushTaskOptions::new()
///     .method(HttpMethod::Get)
///     .delay_seconds(30.0)
///     .header("X-Test: SomeValue");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PushTaskOptions {
    /// Minimum time to wait before the task runs.
    pub delay_seconds: f64,

    /// One of POST, GET, HEAD, PUT, DELETE.
    pub method: String,

    /// Empty means the service generates a unique name.
    pub name: String,

    /// CRLF-separated `key:value` lines. `content-type` cannot be set when the
    /// payload is sent as a body.
    pub header: String,
}

impl Default for PushTaskOptions {
    fn default() -> Self {
        Self {
            delay_seconds: 0.0,
            method: HttpMethod::Post.as_str().to_string(),
            name: String::new(),
            header: String::new(),
        }
    }
}

impl PushTaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method.as_str().to_string();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn delay_seconds(mut self, delay_seconds: f64) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    /// Append one header line.
    pub fn header(mut self, line: impl AsRef<str>) -> Self {
        if !self.header.is_empty() {
            self.header.push_str("\r\n");
        }
        self.header.push_str(line.as_ref());
        self
    }

    /// Read options from JSON, rejecting unknown keys and values of the wrong
    /// type. A JSON list is read like a map keyed by index, so any non-empty
    /// list fails the key check.
    pub fn from_json(value: &Value) -> Result<Self, TaskQueueError> {
        let source = OptionSource::from_json(value)?;
        Ok(Self {
            method: source.method()?.as_str().to_string(),
            name: source.name()?,
            delay_seconds: source.delay_seconds()?,
            header: source.header()?,
        })
    }
}

/// Options as handed to `PushTask`, before their types are checked.
///
/// JSON values stay raw until `PushTask::build` asks for them, so type errors
/// surface in the same order as the range checks.
enum OptionSource<'a> {
    Typed(PushTaskOptions),
    Json(&'a Map<String, Value>),
}

impl<'a> OptionSource<'a> {
    fn from_json(value: &'a Value) -> Result<Self, TaskQueueError> {
        match value {
            Value::Null => Ok(Self::Typed(PushTaskOptions::default())),
            Value::Array(items) if items.is_empty() => {
                Ok(Self::Typed(PushTaskOptions::default()))
            }
            Value::Array(items) => {
                let keys: Vec<String> = (0..items.len()).map(|i| i.to_string()).collect();
                Err(unknown_options(&keys))
            }
            Value::Object(map) => {
                let extra: Vec<&String> = map
                    .keys()
                    .filter(|k| !OPTION_KEYS.contains(&k.as_str()))
                    .collect();
                if extra.is_empty() {
                    Ok(Self::Json(map))
                } else {
                    Err(unknown_options(&extra))
                }
            }
            other => Err(TaskQueueError::invalid(format!(
                "options must be an array. Actual type: {}",
                json_type(other)
            ))),
        }
    }

    fn method(&self) -> Result<HttpMethod, TaskQueueError> {
        match self {
            Self::Typed(options) => options.method.parse(),
            Self::Json(map) => match map.get("method") {
                None => Ok(HttpMethod::default()),
                Some(Value::String(s)) => s.parse(),
                Some(other) => Err(TaskQueueError::invalid(format!("Invalid method: {other}"))),
            },
        }
    }

    fn name(&self) -> Result<String, TaskQueueError> {
        match self {
            Self::Typed(options) => Ok(options.name.clone()),
            Self::Json(map) => string_option(map, "name"),
        }
    }

    fn delay_seconds(&self) -> Result<f64, TaskQueueError> {
        match self {
            Self::Typed(options) => Ok(options.delay_seconds),
            Self::Json(map) => match map.get("delay_seconds") {
                None => Ok(0.0),
                Some(v) => v.as_f64().ok_or_else(|| {
                    TaskQueueError::invalid("delay_seconds must be a numeric type.")
                }),
            },
        }
    }

    fn header(&self) -> Result<String, TaskQueueError> {
        match self {
            Self::Typed(options) => Ok(options.header.clone()),
            Self::Json(map) => string_option(map, "header"),
        }
    }
}

fn unknown_options<S: AsRef<str>>(keys: &[S]) -> TaskQueueError {
    let keys: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
    TaskQueueError::invalid(format!("Invalid options supplied: {}", keys.join(",")))
}

fn string_option(map: &Map<String, Value>, key: &str) -> Result<String, TaskQueueError> {
    match map.get(key) {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(TaskQueueError::invalid(format!(
            "{key} must be a string. Actual type: {}",
            json_type(other)
        ))),
    }
}

/// A validated description of one unit of work to enqueue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushTask {
    url: String,
    payload: Payload,
    method: HttpMethod,
    delay_seconds: f64,
    name: String,
    headers: Vec<String>,
}

impl PushTask {
    /// Construct a task for the handler at `url_path`.
    ///
    /// The payload is appended to the URL as a query string for GET, HEAD and
    /// DELETE, and sent as a form-encoded body for POST and PUT.
    pub fn new(
        url_path: &str,
        payload: Payload,
        options: PushTaskOptions,
    ) -> Result<Self, TaskQueueError> {
        validate_path(url_path)?;
        Self::build(url_path, payload, OptionSource::Typed(options))
    }

    /// Legacy-shaped constructor: payload and options as JSON objects.
    pub fn from_json(
        url_path: &str,
        payload: &Value,
        options: &Value,
    ) -> Result<Self, TaskQueueError> {
        validate_path(url_path)?;
        let payload = Payload::from_json(payload)?;
        let options = OptionSource::from_json(options)?;
        Self::build(url_path, payload, options)
    }

    fn build(
        url_path: &str,
        payload: Payload,
        options: OptionSource<'_>,
    ) -> Result<Self, TaskQueueError> {
        let method = options.method()?;

        let name = options.name()?;
        if !name.is_empty() {
            if name.len() > MAX_NAME_LENGTH {
                return Err(TaskQueueError::invalid(format!(
                    "name exceeds maximum length of {MAX_NAME_LENGTH}. Actual length: {}",
                    name.len()
                )));
            }
            if !NAME_PATTERN.is_match(&name) {
                return Err(TaskQueueError::invalid(format!(
                    "name must match pattern: {}. name: {name}",
                    NAME_PATTERN.as_str()
                )));
            }
        }

        let delay_seconds = options.delay_seconds()?;
        if !delay_seconds.is_finite() || !(0.0..=MAX_DELAY_SECONDS).contains(&delay_seconds) {
            return Err(TaskQueueError::invalid(format!(
                "delay_seconds must be between 0 and {MAX_DELAY_SECONDS} (30 days). \
                 delay_seconds: {delay_seconds}"
            )));
        }

        let mut url = url_path.to_string();
        let mut headers = Vec::new();
        if !payload.is_empty() {
            if method.has_body() {
                headers.push(FORM_CONTENT_TYPE.to_string());
            } else {
                url = format!("{url_path}?{}", payload.encode());
            }
        }
        if url.len() > MAX_URL_LENGTH {
            return Err(TaskQueueError::invalid(format!(
                "URL length greater than maximum of {MAX_URL_LENGTH}. URL: {url}"
            )));
        }

        let header = options.header()?;
        let has_content_type = !headers.is_empty();
        for line in header.split("\r\n") {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !line.contains(':') {
                return Err(TaskQueueError::invalid(format!(
                    "Each header must contain a colon. Header: {line}"
                )));
            }
            if has_content_type && is_content_type(line) {
                return Err(TaskQueueError::invalid(
                    "Content-type header may not be specified as it is set by the task.",
                ));
            }
            headers.push(line.to_string());
        }

        Ok(Self {
            url,
            payload,
            method,
            delay_seconds,
            name,
            headers,
        })
    }

    /// URL path, plus the query string for GET, HEAD and DELETE tasks.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn delay_seconds(&self) -> f64 {
        self.delay_seconds
    }

    /// Explicit name, or `""` when the service will generate one.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn has_payload(&self) -> bool {
        !self.payload.is_empty()
    }

    /// Headers sent when the task runs. The service may add more.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }
}

fn validate_path(url_path: &str) -> Result<(), TaskQueueError> {
    if !url_path.starts_with('/') {
        return Err(TaskQueueError::invalid("url_path must begin with '/'."));
    }
    if url_path.contains('?') {
        return Err(TaskQueueError::invalid(
            "query strings not allowed in url_path.",
        ));
    }
    Ok(())
}

fn is_content_type(line: &str) -> bool {
    const KEY: &[u8] = b"content-type";
    line.as_bytes()
        .get(..KEY.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(KEY))
}
