use std::borrow::Cow;
use std::path::Path;

use tracing::debug;

/// A frontend file compiled into the binary.
pub struct Asset {
    pub name: &'static str,
    pub content_type: &'static str,
    embedded: &'static str,
}

pub const INDEX_HTML: Asset = Asset {
    name: "index.html",
    content_type: "text/html; charset=utf-8",
    embedded: include_str!("../frontend/index.html"),
};

pub const APP_JS: Asset = Asset {
    name: "app.js",
    content_type: "application/javascript",
    embedded: include_str!("../frontend/app.js"),
};

pub const STYLES_CSS: Asset = Asset {
    name: "styles.css",
    content_type: "text/css",
    embedded: include_str!("../frontend/styles.css"),
};

/// Files reachable under `/static/`.
pub fn static_asset(path: &str) -> Option<&'static Asset> {
    match path {
        "app.js" => Some(&APP_JS),
        "styles.css" => Some(&STYLES_CSS),
        _ => None,
    }
}

impl Asset {
    /// Reads the on-disk copy from `dir` when given and readable, so edits show
    /// up without a rebuild. Falls back to the embedded copy.
    pub async fn contents(&self, dir: Option<&Path>) -> Cow<'static, str> {
        if let Some(dir) = dir {
            match tokio::fs::read_to_string(dir.join(self.name)).await {
                Ok(text) => return Cow::Owned(text),
                Err(err) => debug!(asset = self.name, %err, "Serving embedded asset"),
            }
        }
        Cow::Borrowed(self.embedded)
    }
}
