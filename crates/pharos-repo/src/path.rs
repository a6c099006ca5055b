//! Absolute resource paths.
//!
//! Every node in the repository is addressed by a slash-separated absolute
//! path, e.g. `/var/discovery/pharos/clusterInstances`. Paths are validated
//! once at construction so the rest of the code can treat them as opaque
//! keys.

use crate::error::{RepoError, Result};

/// A validated absolute repository path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoPath(String);

impl RepoPath {
    /// Parse and validate a path.
    ///
    /// Rules: must start with `/`, no empty segments, no trailing slash
    /// (the root `/` alone is not addressable either, it only exists as a
    /// parent of top-level nodes).
    pub fn new(path: &str) -> Result<Self> {
        if !path.starts_with('/') {
            return Err(RepoError::InvalidPath(format!("not absolute: {path:?}")));
        }
        if path == "/" {
            return Err(RepoError::InvalidPath("root is not addressable".into()));
        }
        if path.ends_with('/') {
            return Err(RepoError::InvalidPath(format!("trailing slash: {path:?}")));
        }
        if path[1..].split('/').any(str::is_empty) {
            return Err(RepoError::InvalidPath(format!("empty segment: {path:?}")));
        }
        Ok(Self(path.to_string()))
    }

    /// The parent path, or `None` for a top-level node.
    pub fn parent(&self) -> Option<RepoPath> {
        let idx = self.0.rfind('/').expect("validated path contains a slash");
        if idx == 0 {
            None
        } else {
            Some(RepoPath(self.0[..idx].to_string()))
        }
    }

    /// A child path under this one.
    pub fn child(&self, name: &str) -> RepoPath {
        RepoPath(format!("{}/{}", self.0, name))
    }

    /// The final path segment.
    pub fn name(&self) -> &str {
        let idx = self.0.rfind('/').expect("validated path contains a slash");
        &self.0[idx + 1..]
    }

    /// The full path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_absolute_paths() {
        let p = RepoPath::new("/var/discovery/pharos/clusterInstances").unwrap();
        assert_eq!(p.as_str(), "/var/discovery/pharos/clusterInstances");
    }

    #[test]
    fn rejects_relative_and_malformed() {
        assert!(RepoPath::new("var/discovery").is_err());
        assert!(RepoPath::new("/").is_err());
        assert!(RepoPath::new("/var//discovery").is_err());
        assert!(RepoPath::new("/var/discovery/").is_err());
    }

    #[test]
    fn parent_strips_final_segment() {
        let p = RepoPath::new("/var/discovery/pharos/clusterInstances").unwrap();
        assert_eq!(
            p.parent().unwrap().as_str(),
            "/var/discovery/pharos"
        );
    }

    #[test]
    fn top_level_has_no_parent() {
        let p = RepoPath::new("/var").unwrap();
        assert!(p.parent().is_none());
    }

    #[test]
    fn child_and_name() {
        let p = RepoPath::new("/var/discovery").unwrap();
        let c = p.child("idmap");
        assert_eq!(c.as_str(), "/var/discovery/idmap");
        assert_eq!(c.name(), "idmap");
    }
}
