//! Job snapshots consumed by the walker.
//!
//! A [`JobNode`] is a read-only copy of what the host knows about a build job
//! at the moment a walk starts. The walker never mutates it.

use serde::{Deserialize, Serialize};

/// Source-control configuration of a job.
///
/// Hosts may configure several repositories, branches and credentials; the
/// walker only ever uses the first entry of each list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScmConfig {
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default)]
    pub branches: Vec<String>,
    #[serde(default)]
    pub credentials_ids: Vec<String>,
}

impl ScmConfig {
    /// Single-repository configuration.
    pub fn git(url: impl Into<String>) -> Self {
        Self {
            repositories: vec![url.into()],
            ..Self::default()
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branches.push(branch.into());
        self
    }

    pub fn with_credentials(mut self, credentials_id: impl Into<String>) -> Self {
        self.credentials_ids.push(credentials_id.into());
        self
    }

    /// First configured repository URL, if any.
    pub fn primary_url(&self) -> Option<&str> {
        self.repositories
            .first()
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    /// First configured branch with a leading `*/` wildcard removed.
    pub fn primary_branch(&self) -> Option<&str> {
        self.branches
            .first()
            .map(|branch| branch.strip_prefix("*/").unwrap_or(branch))
    }

    pub fn primary_credentials_id(&self) -> Option<&str> {
        self.credentials_ids.first().map(String::as_str)
    }
}

/// Maven build descriptor and settings references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MavenConfig {
    /// Path of the root `pom.xml`, relative to the job workspace.
    #[serde(default)]
    pub root_pom: Option<String>,
    /// Managed `settings.xml` config id.
    #[serde(default)]
    pub settings_id: Option<String>,
    /// Managed global `settings.xml` config id.
    #[serde(default)]
    pub global_settings_id: Option<String>,
}

/// Last recorded build outcomes of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildHistory {
    #[serde(default)]
    pub last_successful: Option<u64>,
    #[serde(default)]
    pub last_unsuccessful: Option<u64>,
}

impl BuildHistory {
    pub fn new(last_successful: Option<u64>, last_unsuccessful: Option<u64>) -> Self {
        Self {
            last_successful,
            last_unsuccessful,
        }
    }

    /// True when the job has no successful build on record.
    pub fn never_built(&self) -> bool {
        self.last_successful.is_none()
    }

    /// True when the most recent unsuccessful build is newer than the most
    /// recent successful one (or there is no successful build at all).
    pub fn recently_failed(&self) -> bool {
        match (self.last_successful, self.last_unsuccessful) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(ok), Some(failed)) => failed > ok,
        }
    }
}

/// A build job as seen by the walker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobNode {
    /// Unique job name; identity for deduplication.
    pub name: String,
    #[serde(default)]
    pub scm: Option<ScmConfig>,
    #[serde(default)]
    pub maven: Option<MavenConfig>,
    #[serde(default)]
    pub history: BuildHistory,
}

impl JobNode {
    /// Create a job with no SCM, Maven or build history.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scm: None,
            maven: None,
            history: BuildHistory::default(),
        }
    }

    pub fn with_scm(mut self, scm: ScmConfig) -> Self {
        self.scm = Some(scm);
        self
    }

    pub fn with_maven(mut self, maven: MavenConfig) -> Self {
        self.maven = Some(maven);
        self
    }

    pub fn with_history(mut self, history: BuildHistory) -> Self {
        self.history = history;
        self
    }

    /// Declared build descriptor path, if the job is a Maven job that has one.
    pub fn build_file(&self) -> Option<&str> {
        self.maven.as_ref().and_then(|m| m.root_pom.as_deref())
    }
}
