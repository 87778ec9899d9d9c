//! Per-page JSON artifacts
//!
//! Each page maps deterministically to a file under the content directory:
//!
//! | URL | Artifact |
//! |-----|----------|
//! | `https://x.com/` | `index.json` |
//! | `https://x.com/about/team` | `about/team.json` |
//! | `https://x.com/news/` | `news.json` |
//! | `https://x.com/list?page=2&sort=asc` | `list_page_2_sort_asc.json` |

use crate::output::traits::{OutputError, OutputResult};
use crate::state::PageRecord;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// File stem used when a URL has an empty path
pub const INDEX_PLACEHOLDER: &str = "index";

const ARTIFACT_EXTENSION: &str = "json";

/// Maps a URL to its artifact path relative to the content directory
///
/// Path segments become directories and the last segment becomes the file
/// stem. A non-empty query is appended to the stem with `=`, `&` and path
/// separators replaced by `_`, so a query can never escape the directory.
pub fn artifact_relative_path(url: &Url) -> PathBuf {
    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();

    let (dirs, last) = match segments.split_last() {
        Some((last, dirs)) => (dirs, *last),
        None => (&[][..], INDEX_PLACEHOLDER),
    };

    let mut path = PathBuf::new();
    for dir in dirs {
        path.push(dir);
    }

    let stem = match url.query().filter(|q| !q.is_empty()) {
        Some(query) => format!("{}_{}", last, query.replace(['=', '&', '/', '\\'], "_")),
        None => last.to_string(),
    };
    path.push(format!("{}.{}", stem, ARTIFACT_EXTENSION));
    path
}

/// Serializes a record as pretty-printed JSON
///
/// Non-ASCII text is written as-is and fields keep the order
/// `url`, `title`, `body`.
pub fn render_artifact(record: &PageRecord) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Writes a page artifact under `content_dir`, replacing any previous one
///
/// The document is written to a sibling temporary file and renamed into
/// place so readers never observe a partial artifact.
pub fn write_artifact(content_dir: &Path, record: &PageRecord) -> OutputResult<PathBuf> {
    let url = Url::parse(&record.url).map_err(|_| OutputError::InvalidUrl(record.url.clone()))?;
    let path = content_dir.join(artifact_relative_path(&url));
    let document = render_artifact(record)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| OutputError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let staging = path.with_extension("json.tmp");
    fs::write(&staging, document).map_err(|source| OutputError::Write {
        path: staging.clone(),
        source,
    })?;
    fs::rename(&staging, &path).map_err(|source| OutputError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}
