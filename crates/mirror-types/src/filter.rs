//! Member visibility filter
//!
//! A filter selects which members a provider lists. At least one visibility
//! flag and at least one static-ness flag must be set for anything to match.

use std::fmt;

use bitflags::bitflags;

use crate::member::Visibility;

bitflags! {
    /// Declarative member filter
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberFilter: u8 {
        /// Public members
        const PUBLIC = 0x01;
        /// Private, protected, and internal members
        const NON_PUBLIC = 0x02;
        /// Instance members
        const INSTANCE = 0x04;
        /// Static members
        const STATIC = 0x08;
        /// Members declared on the type itself, none inherited
        const DECLARED_ONLY = 0x10;
        /// Include static members of ancestor types
        const FLATTEN_HIERARCHY = 0x20;
    }
}

impl MemberFilter {
    /// Public instance and static members
    pub const DEFAULT: Self = Self::PUBLIC.union(Self::INSTANCE).union(Self::STATIC);

    /// Every visibility, instance and static
    pub const ALL: Self = Self::DEFAULT.union(Self::NON_PUBLIC);

    /// Public instance members
    pub const PUBLIC_INSTANCE: Self = Self::PUBLIC.union(Self::INSTANCE);

    /// Whether a member with this visibility and static-ness passes the filter
    pub fn matches(&self, visibility: Visibility, is_static: bool) -> bool {
        let visible = if visibility.is_public() {
            self.contains(Self::PUBLIC)
        } else {
            self.contains(Self::NON_PUBLIC)
        };
        let binding = if is_static {
            self.contains(Self::STATIC)
        } else {
            self.contains(Self::INSTANCE)
        };
        visible && binding
    }

    /// Parse a single flag or preset name (case-insensitive)
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NONE" => Some(Self::empty()),
            "PUBLIC" => Some(Self::PUBLIC),
            "NON_PUBLIC" | "NONPUBLIC" => Some(Self::NON_PUBLIC),
            "INSTANCE" => Some(Self::INSTANCE),
            "STATIC" => Some(Self::STATIC),
            "DECLARED_ONLY" => Some(Self::DECLARED_ONLY),
            "FLATTEN_HIERARCHY" => Some(Self::FLATTEN_HIERARCHY),
            "DEFAULT" => Some(Self::DEFAULT),
            "ALL" => Some(Self::ALL),
            "PUBLIC_INSTANCE" => Some(Self::PUBLIC_INSTANCE),
            _ => None,
        }
    }

    /// Parse pipe-separated names (e.g., "PUBLIC|INSTANCE")
    pub fn from_combined_str(s: &str) -> Option<Self> {
        let mut result = Self::empty();
        for part in s.split('|') {
            result |= Self::from_keyword(part.trim())?;
        }
        Some(result)
    }
}

impl Default for MemberFilter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for MemberFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        f.write_str(&names.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches() {
        let filter = MemberFilter::PUBLIC | MemberFilter::INSTANCE;
        assert!(filter.matches(Visibility::Public, false));
        assert!(!filter.matches(Visibility::Public, true));
        assert!(!filter.matches(Visibility::Protected, false));
        assert!(MemberFilter::ALL.matches(Visibility::Private, true));
    }

    #[test]
    fn test_from_combined_str() {
        assert_eq!(
            MemberFilter::from_combined_str("PUBLIC|INSTANCE|STATIC"),
            Some(MemberFilter::DEFAULT)
        );
        assert_eq!(
            MemberFilter::from_combined_str("all | declared_only"),
            Some(MemberFilter::ALL | MemberFilter::DECLARED_ONLY)
        );
        assert_eq!(MemberFilter::from_combined_str("PUBLIC|BOGUS"), None);
        assert_eq!(MemberFilter::from_combined_str(""), None);
    }

    #[test]
    fn test_from_keyword_accepts_presets_and_aliases() {
        assert_eq!(MemberFilter::from_keyword("nonpublic"), Some(MemberFilter::NON_PUBLIC));
        assert_eq!(MemberFilter::from_keyword("Public_Instance"), Some(MemberFilter::PUBLIC_INSTANCE));
        assert_eq!(MemberFilter::from_keyword("none"), Some(MemberFilter::empty()));
        assert_eq!(MemberFilter::from_keyword("SHINY"), None);

        // Generated exact-name lookup is untouched
        assert_eq!(MemberFilter::from_name("STATIC"), Some(MemberFilter::STATIC));
        assert_eq!(MemberFilter::from_name("static"), None);
    }

    #[test]
    fn test_display_round_trips() {
        let filter = MemberFilter::NON_PUBLIC | MemberFilter::STATIC;
        assert_eq!(filter.to_string(), "NON_PUBLIC|STATIC");
        assert_eq!(MemberFilter::from_combined_str(&filter.to_string()), Some(filter));
        assert_eq!(MemberFilter::empty().to_string(), "NONE");
    }
}
