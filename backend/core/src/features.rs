//! Package feature set shared by the structure and graphic converters.
//!
//! Both conversion paths must be built from the same `FeatureSet`; otherwise
//! the spoken description and the rendered picture can describe different
//! mathematical objects.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Macro packages known to the TeX parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Package {
    Base,
    Ams,
    Color,
    Boldsymbol,
    Cancel,
    Bussproofs,
}

impl Package {
    pub const ALL: [Package; 6] = [
        Package::Base,
        Package::Ams,
        Package::Color,
        Package::Boldsymbol,
        Package::Cancel,
        Package::Bussproofs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Ams => "ams",
            Self::Color => "color",
            Self::Boldsymbol => "boldsymbol",
            Self::Cancel => "cancel",
            Self::Bussproofs => "bussproofs",
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Package {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Package::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown package '{s}'"))
    }
}

/// The set of enabled packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    enabled: BTreeSet<Package>,
}

/// Packages excluded unless explicitly re-enabled. Proof trees have no
/// MathML counterpart in the structure serializer.
pub const DEFAULT_DENY_LIST: &[Package] = &[Package::Bussproofs];

impl Default for FeatureSet {
    fn default() -> Self {
        Self::all_except(DEFAULT_DENY_LIST)
    }
}

impl FeatureSet {
    /// Every known package except the ones in `deny`. `Base` is always kept.
    pub fn all_except(deny: &[Package]) -> Self {
        let enabled = Package::ALL
            .into_iter()
            .filter(|p| *p == Package::Base || !deny.contains(p))
            .collect();
        Self { enabled }
    }

    pub fn is_enabled(&self, package: Package) -> bool {
        self.enabled.contains(&package)
    }

    pub fn packages(&self) -> impl Iterator<Item = Package> + '_ {
        self.enabled.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_denies_bussproofs() {
        let set = FeatureSet::default();
        assert!(!set.is_enabled(Package::Bussproofs));
        assert!(set.is_enabled(Package::Ams));
        assert!(set.is_enabled(Package::Cancel));
    }

    #[test]
    fn base_cannot_be_denied() {
        let set = FeatureSet::all_except(&[Package::Base, Package::Color]);
        assert!(set.is_enabled(Package::Base));
        assert!(!set.is_enabled(Package::Color));
    }

    #[test]
    fn parses_package_names() {
        assert_eq!("cancel".parse::<Package>().unwrap(), Package::Cancel);
        assert!("physics".parse::<Package>().is_err());
    }
}
