pub mod document;
pub mod metrics;
pub mod model;
pub mod roi;

pub use document::*;
pub use metrics::*;
pub use model::*;
pub use roi::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Transport failure before any response arrived.
    Io(String),
    /// The server answered with a non-success status.
    Http { status: u16 },
    /// The body was not a usable catalog document.
    Corrupt(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(msg) => write!(f, "catalog fetch failed: {msg}"),
            CatalogError::Http { status } => write!(f, "catalog fetch returned HTTP {status}"),
            CatalogError::Corrupt(msg) => write!(f, "catalog document corrupt: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}
