use foundation::{RoiKey, Year};
use serde::Serialize;

/// The four visual products stored per ROI and year.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Before,
    After,
    Mask,
    Heat,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Before,
        ArtifactKind::After,
        ArtifactKind::Mask,
        ArtifactKind::Heat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Before => "before",
            ArtifactKind::After => "after",
            ArtifactKind::Mask => "mask",
            ArtifactKind::Heat => "heat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownArtifactKind(pub String);

impl std::fmt::Display for UnknownArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown artifact kind: {}", self.0)
    }
}

impl std::error::Error for UnknownArtifactKind {}

impl std::str::FromStr for ArtifactKind {
    type Err = UnknownArtifactKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(ArtifactKind::Before),
            "after" => Ok(ArtifactKind::After),
            "mask" => Ok(ArtifactKind::Mask),
            "heat" => Ok(ArtifactKind::Heat),
            _ => Err(UnknownArtifactKind(s.to_string())),
        }
    }
}

pub const DEFAULT_ASSET_ROOT: &str = "/visualization_results";
pub const DEFAULT_IMAGE_EXT: &str = "png";

/// Maps `(roi, year, kind)` to a static asset path.
///
/// Layout: `{root}/{roi}/{kind}_{year}.{ext}`, or `{root}/{kind}_{year}.{ext}`
/// for the implicit ROI of a catalog without regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactResolver {
    root: String,
    ext: String,
}

impl Default for ArtifactResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_ROOT, DEFAULT_IMAGE_EXT)
    }
}

impl ArtifactResolver {
    pub fn new(root: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ext: ext.into(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// `None` means "not ready": render a placeholder instead of loading.
    pub fn resolve(
        &self,
        roi: Option<&RoiKey>,
        year: Option<&Year>,
        kind: ArtifactKind,
    ) -> Option<String> {
        let (roi, year) = (roi?, year?);
        let kind = kind.as_str();
        let (root, ext) = (&self.root, &self.ext);
        Some(if roi.is_implicit() {
            format!("{root}/{kind}_{year}.{ext}")
        } else {
            format!("{root}/{roi}/{kind}_{year}.{ext}")
        })
    }
}

/// Source references for one render of the comparison view.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSet {
    pub before: Option<String>,
    pub after: Option<String>,
    pub mask: Option<String>,
    pub heat: Option<String>,
}

impl ImageSet {
    /// Before at the before year, after at the after year. Mask and heat are
    /// filed under the first year of a pair, so they follow the before year.
    pub fn for_selection(
        resolver: &ArtifactResolver,
        roi: Option<&RoiKey>,
        before_year: Option<&Year>,
        after_year: Option<&Year>,
    ) -> Self {
        Self {
            before: resolver.resolve(roi, before_year, ArtifactKind::Before),
            after: resolver.resolve(roi, after_year, ArtifactKind::After),
            mask: resolver.resolve(roi, before_year, ArtifactKind::Mask),
            heat: resolver.resolve(roi, before_year, ArtifactKind::Heat),
        }
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&str> {
        match kind {
            ArtifactKind::Before => self.before.as_deref(),
            ArtifactKind::After => self.after.as_deref(),
            ArtifactKind::Mask => self.mask.as_deref(),
            ArtifactKind::Heat => self.heat.as_deref(),
        }
    }
}
