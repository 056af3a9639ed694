//! Fully qualified plugin names (`<namespace>.<bundle>.<plugin>`).

use std::fmt;
use std::str::FromStr;

/// A fully qualified plugin name. Parsing only checks the part count, to
/// match the redirect-resolution algorithm's own permissive split: a
/// redirect target is "an FQN" if and only if it has exactly three
/// dot-separated parts, regardless of what characters those parts contain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fqn {
    namespace: String,
    bundle: String,
    plugin: String,
}

impl Fqn {
    pub fn new(
        namespace: impl Into<String>,
        bundle: impl Into<String>,
        plugin: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            bundle: bundle.into(),
            plugin: plugin.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    /// The `<namespace>.<bundle>` prefix naming this plugin's owning bundle.
    pub fn bundle_fqn(&self) -> BundleFqn {
        BundleFqn::new(&self.namespace, &self.bundle)
    }

    /// Parses a redirect target. Unlike [`FromStr`], this is infallible in
    /// the sense the resolver needs: it only distinguishes "exactly three
    /// dot-separated parts" (an `Fqn`) from everything else (not an `Fqn`),
    /// mirroring `next_name.split(".", 2)` in the reference resolver.
    pub fn parse_redirect_target(s: &str) -> Option<Fqn> {
        let mut parts = s.splitn(3, '.');
        let namespace = parts.next()?;
        let bundle = parts.next()?;
        let plugin = parts.next()?;
        if namespace.is_empty() || bundle.is_empty() || plugin.is_empty() {
            return None;
        }
        Some(Fqn::new(namespace, bundle, plugin))
    }
}

impl fmt::Display for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.namespace, self.bundle, self.plugin)
    }
}

impl FromStr for Fqn {
    type Err = FqnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fqn::parse_redirect_target(s).ok_or_else(|| FqnParseError(s.to_string()))
    }
}

/// Returned when a string does not split into exactly three non-empty,
/// dot-separated parts.
#[derive(Debug, Clone, thiserror::Error)]
#[error("'{0}' is not a fully qualified plugin name")]
pub struct FqnParseError(pub String);

/// A bundle's fully qualified name, `<namespace>.<bundle>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BundleFqn {
    namespace: String,
    bundle: String,
}

impl BundleFqn {
    pub fn new(namespace: impl Into<String>, bundle: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            bundle: bundle.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    pub fn is_builtin(&self) -> bool {
        self.namespace == "ansible" && self.bundle == "builtin"
    }

    pub fn is_legacy(&self) -> bool {
        self.namespace == "ansible" && self.bundle == "legacy"
    }

    pub fn plugin(&self, name: impl Into<String>) -> Fqn {
        Fqn::new(self.namespace.clone(), self.bundle.clone(), name)
    }
}

impl fmt::Display for BundleFqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.bundle)
    }
}

impl FromStr for BundleFqn {
    type Err = FqnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, '.');
        let namespace = parts.next().filter(|p| !p.is_empty());
        let bundle = parts.next().filter(|p| !p.is_empty());
        match (namespace, bundle) {
            (Some(ns), Some(b)) => Ok(BundleFqn::new(ns, b)),
            _ => Err(FqnParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_part_target() {
        let fqn = Fqn::parse_redirect_target("foo.bar.baz").unwrap();
        assert_eq!(fqn.namespace(), "foo");
        assert_eq!(fqn.bundle(), "bar");
        assert_eq!(fqn.plugin(), "baz");
    }

    #[test]
    fn rejects_non_fqn() {
        assert!(Fqn::parse_redirect_target("this-is-not-a-fqcn").is_none());
        assert!(Fqn::parse_redirect_target("foo.bar").is_none());
    }

    #[test]
    fn extra_dots_fold_into_plugin_part() {
        // split(".", 2) semantics: third part keeps any remaining dots.
        let fqn = Fqn::parse_redirect_target("foo.bar.baz.qux").unwrap();
        assert_eq!(fqn.plugin(), "baz.qux");
    }

    #[test]
    fn display_round_trips() {
        let fqn = Fqn::new("foo", "bar", "baz");
        assert_eq!(fqn.to_string(), "foo.bar.baz");
        assert_eq!(fqn.bundle_fqn().to_string(), "foo.bar");
    }

    #[test]
    fn builtin_and_legacy_detection() {
        assert!(BundleFqn::new("ansible", "builtin").is_builtin());
        assert!(BundleFqn::new("ansible", "legacy").is_legacy());
        assert!(!BundleFqn::new("community", "general").is_builtin());
    }
}
