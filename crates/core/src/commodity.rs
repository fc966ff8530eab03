//! Tracked commodities.
//!
//! The set is fixed reference data. Storage keeps the slug (`as_str`) as text,
//! so adding a variant never requires migrating stored rows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A commodity quoted on the cash bid page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Commodity {
    Corn,
    Soybeans,
    /// Hard red spring wheat, 14% protein.
    #[serde(rename = "spring-wheat-14pro")]
    SpringWheat14Pro,
    /// Hard red winter wheat, 12% protein.
    #[serde(rename = "winter-wheat-12pro")]
    WinterWheat12Pro,
    Canola,
}

impl Commodity {
    /// Every tracked commodity, in display order.
    pub const ALL: [Commodity; 5] = [
        Self::Corn,
        Self::Soybeans,
        Self::SpringWheat14Pro,
        Self::WinterWheat12Pro,
        Self::Canola,
    ];

    /// Returns the stable slug used in storage and configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Corn => "corn",
            Self::Soybeans => "soybeans",
            Self::SpringWheat14Pro => "spring-wheat-14pro",
            Self::WinterWheat12Pro => "winter-wheat-12pro",
            Self::Canola => "canola",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Corn => "Corn",
            Self::Soybeans => "Soybeans",
            Self::SpringWheat14Pro => "Spring Wheat 14 Pro",
            Self::WinterWheat12Pro => "Winter Wheat 12 Pro",
            Self::Canola => "Canola",
        }
    }

    /// Parses a stored slug.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s.trim())
    }

    /// Maps a label as it appears on the bid page onto a commodity.
    ///
    /// Labels vary between "HRS Wheat 14%", "Spring Wheat 14 Pro" and the
    /// like, so matching works on lowercase alphanumeric words.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let words: Vec<String> = label
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        let has = |w: &str| words.iter().any(|x| x == w);
        let has_prefix = |p: &str| words.iter().any(|x| x.starts_with(p));

        if words.is_empty() {
            return None;
        }
        if let Some(c) = Self::parse(&words.join("-")) {
            return Some(c);
        }

        if has("corn") {
            Some(Self::Corn)
        } else if has_prefix("soybean") || has("beans") {
            Some(Self::Soybeans)
        } else if has("canola") {
            Some(Self::Canola)
        } else if has_prefix("wheat") || has("hrs") || has("hrw") {
            if has("spring") || has("hrs") || has("14") || has("14pro") {
                Some(Self::SpringWheat14Pro)
            } else if has("winter") || has("hrw") || has("12") || has("12pro") {
                Some(Self::WinterWheat12Pro)
            } else {
                None
            }
        } else {
            None
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commodity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .or_else(|| Self::from_label(s))
            .ok_or_else(|| format!("unknown commodity: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_roundtrip() {
        for c in Commodity::ALL {
            assert_eq!(Commodity::parse(c.as_str()), Some(c));
        }
    }

    #[test]
    fn test_from_label_page_variants() {
        assert_eq!(Commodity::from_label("Corn"), Some(Commodity::Corn));
        assert_eq!(Commodity::from_label("  SOYBEANS "), Some(Commodity::Soybeans));
        assert_eq!(
            Commodity::from_label("HRS Wheat 14%"),
            Some(Commodity::SpringWheat14Pro)
        );
        assert_eq!(
            Commodity::from_label("Spring Wheat 14 Pro"),
            Some(Commodity::SpringWheat14Pro)
        );
        assert_eq!(
            Commodity::from_label("Winter Wheat 12%"),
            Some(Commodity::WinterWheat12Pro)
        );
        assert_eq!(Commodity::from_label("Canola"), Some(Commodity::Canola));
    }

    #[test]
    fn test_from_label_rejects_headers_and_unknowns() {
        assert_eq!(Commodity::from_label("Commodity"), None);
        assert_eq!(Commodity::from_label(""), None);
        assert_eq!(Commodity::from_label("Durum"), None);
        assert_eq!(Commodity::from_label("Wheat"), None);
    }

    #[test]
    fn test_from_str_accepts_slug_and_label() {
        assert_eq!("canola".parse::<Commodity>(), Ok(Commodity::Canola));
        assert_eq!(
            "Winter Wheat 12 Pro".parse::<Commodity>(),
            Ok(Commodity::WinterWheat12Pro)
        );
        assert!("oats".parse::<Commodity>().is_err());
    }

    #[test]
    fn test_serde_uses_slug() {
        let json = serde_json::to_string(&Commodity::SpringWheat14Pro).unwrap();
        assert_eq!(json, "\"spring-wheat-14pro\"");
    }
}
