#![deny(missing_docs)]
//! Purpose-aware path and command sandbox for the shepherd tool-loop runtime.
//!
//! Every filesystem or subprocess effect the [`shepherd_tool`](../shepherd_tool/index.html)
//! registry performs is validated here first. Validation never partially
//! applies: a rejected path or command produces a [`PolicyError`] naming the
//! triggering rule and leaves nothing resolved.

mod config;
mod tool_kind;

pub use config::PolicyConfig;
pub use tool_kind::classify_tool;

use shepherd_types::{Purpose, ToolKind};
use std::path::{Path, PathBuf};

/// Which effect a path is being validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// The path will only be read.
    Read,
    /// The path will be written (and possibly created).
    Write,
}

/// A path or command failed validation. `rule` names the triggering check
/// so callers and the event log can report precisely why.
#[derive(Debug, Clone, thiserror::Error)]
#[error("policy rejected {rule}: {message}")]
pub struct PolicyError {
    /// The rule that rejected the input: `absolute`, `traversal`, `segment`,
    /// `file`, `prefix`, `symlink`, or `command`.
    pub rule: &'static str,
    /// Human-readable detail.
    pub message: String,
}

impl PolicyError {
    fn new(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

/// Validates paths and commands against a [`PolicyConfig`].
///
/// Stateless beyond its configuration and the fixed project root it
/// resolves paths against; safe to share across concurrent scheduler runs.
pub struct PolicyEngine {
    config: PolicyConfig,
    root: PathBuf,
}

impl PolicyEngine {
    /// Build an engine rooted at `root` with the given configuration.
    pub fn new(root: impl Into<PathBuf>, config: PolicyConfig) -> Self {
        Self {
            config,
            root: root.into(),
        }
    }

    /// Build an engine rooted at `root` with [`PolicyConfig::default`].
    pub fn with_default_config(root: impl Into<PathBuf>) -> Self {
        Self::new(root, PolicyConfig::default())
    }

    /// The fixed project root paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a user-supplied path for the given access kind and purpose.
    ///
    /// Steps, in order: trim and reject empty, normalize separators, reject
    /// absolute paths, resolve relative to the root and reject escape,
    /// reject denied directory segments, reject denied secret filenames,
    /// check the read/write allow-list for `purpose`, reject symlinked
    /// targets. Returns the resolved absolute path.
    pub fn validate_path(
        &self,
        raw: &str,
        kind: AccessKind,
        purpose: Purpose,
    ) -> Result<PathBuf, PolicyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PolicyError::new("file", "path must not be empty"));
        }
        let normalized = trimmed.replace('\\', "/");

        if normalized.starts_with('/') || is_windows_absolute(&normalized) {
            return Err(PolicyError::new(
                "absolute",
                format!("absolute paths are not allowed: {normalized}"),
            ));
        }

        let relative = Path::new(&normalized);
        if relative
            .components()
            .next()
            .is_some_and(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(PolicyError::new(
                "traversal",
                format!("path escapes the project root: {normalized}"),
            ));
        }

        let mut escapes = false;
        let mut depth: i64 = 0;
        for component in relative.components() {
            match component {
                std::path::Component::ParentDir => {
                    depth -= 1;
                    if depth < 0 {
                        escapes = true;
                        break;
                    }
                }
                std::path::Component::Normal(_) => depth += 1,
                _ => {}
            }
        }
        if escapes {
            return Err(PolicyError::new(
                "traversal",
                format!("path escapes the project root: {normalized}"),
            ));
        }

        for component in relative.components() {
            if let std::path::Component::Normal(segment) = component {
                let segment = segment.to_string_lossy();
                if self
                    .config
                    .denied_dir_names
                    .iter()
                    .any(|denied| denied == segment.as_ref())
                {
                    return Err(PolicyError::new(
                        "segment",
                        format!("path segment `{segment}` is not allowed"),
                    ));
                }
            }
        }

        if let Some(file_name) = relative.file_name().map(|n| n.to_string_lossy()) {
            if self
                .config
                .denied_file_names
                .iter()
                .any(|denied| file_name_matches(denied, &file_name))
            {
                return Err(PolicyError::new(
                    "file",
                    format!("file `{file_name}` is not allowed"),
                ));
            }
        }

        match kind {
            AccessKind::Read => {
                if !self.config.read_allowed_prefixes.iter().any(|prefix| {
                    path_under_prefix(&normalized, prefix)
                }) {
                    return Err(PolicyError::new(
                        "prefix",
                        format!("read path `{normalized}` is outside the allowed prefixes"),
                    ));
                }
            }
            AccessKind::Write => {
                let allowed: &[String] = if purpose.is_elevated() {
                    &self.config.write_allowed_prefixes_dev
                } else {
                    &self.config.write_allowed_prefixes_default
                };
                if !allowed.iter().any(|prefix| path_under_prefix(&normalized, prefix)) {
                    return Err(PolicyError::new(
                        "prefix",
                        format!("write path `{normalized}` is not allowed under purpose `{purpose}`"),
                    ));
                }
            }
        }

        let resolved = self.root.join(relative);
        if let Ok(metadata) = std::fs::symlink_metadata(&resolved) {
            if metadata.file_type().is_symlink() {
                return Err(PolicyError::new(
                    "symlink",
                    format!("`{normalized}` is a symbolic link"),
                ));
            }
        }

        Ok(resolved)
    }

    /// Validate a command string against the closed allowlist. Returns the
    /// canonical command string on success.
    pub fn validate_command(&self, raw: &str) -> Result<String, PolicyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PolicyError::new("command", "command must not be empty"));
        }
        if self
            .config
            .command_allowlist
            .iter()
            .any(|allowed| allowed == trimmed)
        {
            Ok(trimmed.to_string())
        } else {
            Err(PolicyError::new(
                "command",
                format!("command is not on the allowlist: {trimmed}"),
            ))
        }
    }

    /// Classify a tool name for budget accounting. Delegates to
    /// [`classify_tool`].
    pub fn classify_tool(&self, tool_name: &str) -> ToolKind {
        classify_tool(tool_name)
    }
}

fn is_windows_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn file_name_matches(pattern: &str, file_name: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        file_name.starts_with(prefix)
    } else {
        file_name == pattern
    }
}

fn path_under_prefix(normalized: &str, prefix: &str) -> bool {
    normalized == prefix || normalized.starts_with(&format!("{prefix}/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(dir: &Path) -> PolicyEngine {
        PolicyEngine::with_default_config(dir)
    }

    #[test]
    fn rejects_absolute_paths() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let err = e
            .validate_path("/etc/passwd", AccessKind::Read, Purpose::Default)
            .unwrap_err();
        assert_eq!(err.rule, "absolute");
    }

    #[test]
    fn rejects_parent_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let err = e
            .validate_path("../secrets.txt", AccessKind::Read, Purpose::Default)
            .unwrap_err();
        assert_eq!(err.rule, "traversal");
    }

    #[test]
    fn rejects_traversal_buried_mid_path() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let err = e
            .validate_path("src/a/../../../etc/passwd", AccessKind::Read, Purpose::Default)
            .unwrap_err();
        assert_eq!(err.rule, "traversal");
    }

    #[test]
    fn rejects_denied_segment() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let err = e
            .validate_path("src/.git/config", AccessKind::Read, Purpose::Default)
            .unwrap_err();
        assert_eq!(err.rule, "segment");
    }

    #[test]
    fn policy_symmetry_denied_segment_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        assert!(e
            .validate_path("notes/test.txt", AccessKind::Read, Purpose::Default)
            .is_ok());
        let err = e
            .validate_path(".git/notes/test.txt", AccessKind::Read, Purpose::Default)
            .unwrap_err();
        assert_eq!(err.rule, "segment");
    }

    #[test]
    fn rejects_denied_secret_filename() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        let err = e
            .validate_path("data/outputs/.env", AccessKind::Write, Purpose::Dev)
            .unwrap_err();
        assert_eq!(err.rule, "file");
    }

    #[test]
    fn read_requires_allowed_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        assert!(e
            .validate_path("src/main.rs", AccessKind::Read, Purpose::Default)
            .is_ok());
        let err = e
            .validate_path("data/outputs/x.txt", AccessKind::Read, Purpose::Default)
            .unwrap_err();
        assert_eq!(err.rule, "prefix");
    }

    #[test]
    fn write_outside_outputs_requires_dev_purpose() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        assert!(e
            .validate_path("notes/should-fail.txt", AccessKind::Write, Purpose::Default)
            .is_err());
        assert!(e
            .validate_path("src/generated.rs", AccessKind::Write, Purpose::Dev)
            .is_ok());
        assert!(e
            .validate_path("src/generated.rs", AccessKind::Write, Purpose::Default)
            .is_err());
    }

    #[test]
    fn write_to_outputs_always_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        assert!(e
            .validate_path("data/outputs/x.txt", AccessKind::Write, Purpose::Default)
            .is_ok());
        assert!(e
            .validate_path("data/outputs/x.txt", AccessKind::Write, Purpose::Runtime)
            .is_ok());
    }

    #[test]
    fn rejects_symlinked_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data/outputs")).unwrap();
        let target = dir.path().join("data/outputs/real.txt");
        std::fs::write(&target, "hi").unwrap();
        let link = dir.path().join("data/outputs/link.txt");
        #[cfg(unix)]
        std::os::unix::fs::symlink(&target, &link).unwrap();
        #[cfg(unix)]
        {
            let e = engine(dir.path());
            let err = e
                .validate_path("data/outputs/link.txt", AccessKind::Write, Purpose::Default)
                .unwrap_err();
            assert_eq!(err.rule, "symlink");
        }
    }

    #[test]
    fn command_allowlist_is_exact_match() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        assert!(e.validate_command("git status").is_ok());
        assert!(e.validate_command("git status --porcelain").is_err());
        assert!(e.validate_command("rm -rf /").is_err());
    }

    #[test]
    fn command_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let e = engine(dir.path());
        assert_eq!(e.validate_command("  git status  ").unwrap(), "git status");
    }
}
