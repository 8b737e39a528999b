//! Build-time configuration. Nothing here is read at runtime.

use compare::{ArtifactResolver, DEFAULT_ASSET_ROOT, DEFAULT_IMAGE_EXT};

/// Static root the offline pipeline publishes into.
pub const ASSET_ROOT: &str = match option_env!("VIEWER_ASSET_ROOT") {
    Some(root) => root,
    None => DEFAULT_ASSET_ROOT,
};

pub const IMAGE_EXT: &str = match option_env!("VIEWER_IMAGE_EXT") {
    Some(ext) => ext,
    None => DEFAULT_IMAGE_EXT,
};

/// `EnvFilter` directive for the browser console subscriber.
pub const LOG_DIRECTIVE: &str = match option_env!("VIEWER_LOG") {
    Some(directive) => directive,
    None => "info",
};

const CATALOG_FILE: &str = "index.json";

fn asset_root() -> &'static str {
    ASSET_ROOT.trim_end_matches('/')
}

pub fn catalog_url() -> String {
    format!("{}/{CATALOG_FILE}", asset_root())
}

pub fn resolver() -> ArtifactResolver {
    ArtifactResolver::new(asset_root(), IMAGE_EXT)
}
