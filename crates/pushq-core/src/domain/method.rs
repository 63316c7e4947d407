//! HttpMethod - タスク実行時の HTTP メソッド

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::TaskQueueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Post,
    Get,
    Head,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// POST and PUT carry the payload as a body; the rest put it in the URL.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl FromStr for HttpMethod {
    type Err = TaskQueueError;

    /// Method names are matched exactly; `post` is not `POST`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POST" => Ok(HttpMethod::Post),
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(TaskQueueError::invalid(format!("Invalid method: {other}"))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("POST", HttpMethod::Post)]
    #[case("GET", HttpMethod::Get)]
    #[case("HEAD", HttpMethod::Head)]
    #[case("PUT", HttpMethod::Put)]
    #[case("DELETE", HttpMethod::Delete)]
    fn parses_known_methods(#[case] name: &str, #[case] method: HttpMethod) {
        assert_eq!(name.parse::<HttpMethod>().unwrap(), method);
        assert_eq!(method.to_string(), name);
    }

    #[rstest]
    #[case("post")]
    #[case("PATCH")]
    #[case("")]
    fn rejects_unknown_methods(#[case] name: &str) {
        let err = name.parse::<HttpMethod>().unwrap_err();
        assert!(err.to_string().contains("Invalid method"));
    }
}
