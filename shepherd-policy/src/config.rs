/// Construction parameters for a [`crate::PolicyEngine`].
///
/// Defaults match the literal sets named in the sandbox specification; a
/// deployment may extend them (add entries) but should not shrink them
/// below what the spec requires.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Path segments that are never allowed to appear in a validated path,
    /// regardless of access kind (`git-metadata`, `dependency-cache`,
    /// `build-artifact`).
    pub denied_dir_names: Vec<String>,
    /// Base filenames that are never allowed, matched exactly or as a
    /// `prefix*` glob (dotenv-style secret holders).
    pub denied_file_names: Vec<String>,
    /// Prefixes a path must fall under to be read.
    pub read_allowed_prefixes: Vec<String>,
    /// Prefixes a path must fall under to be written when purpose is `dev`.
    pub write_allowed_prefixes_dev: Vec<String>,
    /// Prefixes a path must fall under to be written for any other purpose.
    pub write_allowed_prefixes_default: Vec<String>,
    /// Closed allowlist of command strings `run_cmd` may execute.
    pub command_allowlist: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            denied_dir_names: vec![".git".into(), "node_modules".into(), "target".into()],
            denied_file_names: vec![
                ".env".into(),
                ".env.local".into(),
                ".env.production".into(),
                ".env.*".into(),
            ],
            read_allowed_prefixes: vec![
                "src".into(),
                "data".into(),
                "logs".into(),
                "notes".into(),
                "README".into(),
                "README.md".into(),
                "Cargo.toml".into(),
                "package.json".into(),
            ],
            write_allowed_prefixes_dev: vec!["data/outputs".into(), "src".into()],
            write_allowed_prefixes_default: vec!["data/outputs".into()],
            command_allowlist: vec![
                "npm test".into(),
                "npm run build".into(),
                "cargo test".into(),
                "cargo build".into(),
                "tsc --noEmit".into(),
                "git status".into(),
            ],
        }
    }
}
