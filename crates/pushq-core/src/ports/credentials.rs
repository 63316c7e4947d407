//! ProjectIdSource port - 環境の認証情報から project_id を推定
//!
//! 明示的な project_id が設定されていない場合にだけ使われます。

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

const WELL_KNOWN_FILE: &str = ".config/gcloud/application_default_credentials.json";

pub trait ProjectIdSource: Send + Sync {
    fn project_id(&self) -> Option<String>;
}

/// Reads `project_id` from the credentials file named by
/// `GOOGLE_APPLICATION_CREDENTIALS`, falling back to the gcloud well-known file.
#[derive(Debug, Clone, Default)]
pub struct AmbientCredentials;

#[derive(Deserialize)]
struct CredentialsFile {
    project_id: Option<String>,
}

impl AmbientCredentials {
    fn candidates() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = env::var_os(CREDENTIALS_ENV).filter(|p| !p.is_empty()) {
            paths.push(PathBuf::from(path));
        }
        if let Some(home) = env::var_os("HOME").filter(|p| !p.is_empty()) {
            paths.push(Path::new(&home).join(WELL_KNOWN_FILE));
        }
        paths
    }
}

impl ProjectIdSource for AmbientCredentials {
    fn project_id(&self) -> Option<String> {
        Self::candidates()
            .iter()
            .find_map(|path| project_id_from_file(path))
    }
}

/// Never finds a project. For tests and for callers that always configure one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl ProjectIdSource for NoCredentials {
    fn project_id(&self) -> Option<String> {
        None
    }
}

/// `project_id` of a service-account style JSON file, if it has one.
pub fn project_id_from_file(path: &Path) -> Option<String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "credentials file not readable");
            return None;
        }
    };
    match serde_json::from_str::<CredentialsFile>(&raw) {
        Ok(file) => file.project_id.filter(|p| !p.is_empty()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "credentials file is not valid JSON");
            None
        }
    }
}
