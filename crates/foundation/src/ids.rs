use serde::{Deserialize, Serialize};

/// Canonical identity of a region instance (`park`, `park_2`, ...).
///
/// The empty key stands for the single implicit region of a catalog that
/// lists years without any regions.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoiKey(String);

impl RoiKey {
    pub fn new(key: impl Into<String>) -> Self {
        RoiKey(key.into())
    }

    pub fn implicit() -> Self {
        RoiKey(String::new())
    }

    pub fn is_implicit(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoiKey {
    fn from(s: &str) -> Self {
        RoiKey::new(s)
    }
}

/// Opaque year identifier as listed by the catalog.
///
/// Indexes written by the offline pipeline use integers, older ones use
/// strings. Both compare textually after parsing.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawYear", into = "String")]
pub struct Year(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawYear {
    Int(i64),
    Text(String),
}

impl From<RawYear> for Year {
    fn from(raw: RawYear) -> Self {
        match raw {
            RawYear::Int(n) => Year(n.to_string()),
            RawYear::Text(s) => Year(s),
        }
    }
}

impl From<Year> for String {
    fn from(y: Year) -> Self {
        y.0
    }
}

impl Year {
    pub fn new(year: impl Into<String>) -> Self {
        Year(year.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Year {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Year {
    fn from(s: &str) -> Self {
        Year::new(s)
    }
}

impl From<u32> for Year {
    fn from(n: u32) -> Self {
        Year(n.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{RoiKey, Year};

    #[test]
    fn year_accepts_numbers_and_strings() {
        let years: Vec<Year> = serde_json::from_str(r#"[2019, "2023"]"#).unwrap();
        assert_eq!(years, vec![Year::from(2019), Year::from("2023")]);
        assert_eq!(serde_json::to_string(&years).unwrap(), r#"["2019","2023"]"#);
    }

    #[test]
    fn implicit_roi_is_empty() {
        assert!(RoiKey::implicit().is_implicit());
        assert!(!RoiKey::from("park").is_implicit());
    }
}
