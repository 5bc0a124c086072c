//! Per-job expansion of action templates.
//!
//! An action template is a snippet of pipeline script with placeholder
//! tokens. Rendering replaces every recognised token with a single-quoted
//! literal taken from the job snapshot:
//!
//! | Token | Value |
//! |---|---|
//! | `JOB_NAME` | job name |
//! | `JOB_SCM_URL` | first repository URL |
//! | `JOB_SCM_BRANCH` | first branch, `*/` prefix removed |
//! | `JOB_SCM_CREDINTIALS_ID` | first credentials id |
//! | `POM_FILE` | root POM path (only when declared) |
//! | `MVN_SETTINGS` | settings config id |
//! | `MVN_GLOBAL_SETTINGS` | global settings config id |
//!
//! Missing values render as `''`. Unknown text is left alone.

use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::model::JobNode;

/// Template used when a walk step does not specify one.
pub const DEFAULT_ACTION: &str = "build JOB_NAME";

/// Placeholder tokens understood by [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    JobName,
    ScmUrl,
    ScmBranch,
    ScmCredentialsId,
    PomFile,
    MavenSettings,
    MavenGlobalSettings,
}

impl Token {
    /// Every token, longest literal first.
    pub const ALL: [Token; 7] = [
        Token::ScmCredentialsId,
        Token::MavenGlobalSettings,
        Token::MavenSettings,
        Token::ScmBranch,
        Token::ScmUrl,
        Token::JobName,
        Token::PomFile,
    ];

    /// Literal text of the token as it appears in templates.
    pub fn literal(&self) -> &'static str {
        match self {
            Token::JobName => "JOB_NAME",
            Token::ScmUrl => "JOB_SCM_URL",
            Token::ScmBranch => "JOB_SCM_BRANCH",
            // Spelling is part of the public template vocabulary.
            Token::ScmCredentialsId => "JOB_SCM_CREDINTIALS_ID",
            Token::PomFile => "POM_FILE",
            Token::MavenSettings => "MVN_SETTINGS",
            Token::MavenGlobalSettings => "MVN_GLOBAL_SETTINGS",
        }
    }

    pub fn from_literal(text: &str) -> Option<Token> {
        Token::ALL.into_iter().find(|t| t.literal() == text)
    }

    /// Substitution for this token, or `None` to keep the token verbatim.
    fn value(&self, node: &JobNode) -> Option<String> {
        let scm = node.scm.as_ref();
        // Branch and credentials only count when a repository is configured.
        let repo_url = scm.and_then(|s| s.primary_url());
        let value = match self {
            Token::JobName => Some(node.name.as_str()),
            Token::ScmUrl => repo_url,
            Token::ScmBranch => repo_url.and(scm.and_then(|s| s.primary_branch())),
            Token::ScmCredentialsId => repo_url.and(scm.and_then(|s| s.primary_credentials_id())),
            Token::PomFile => return node.build_file().map(quote),
            Token::MavenSettings => node.maven.as_ref().and_then(|m| m.settings_id.as_deref()),
            Token::MavenGlobalSettings => node
                .maven
                .as_ref()
                .and_then(|m| m.global_settings_id.as_deref()),
        };
        Some(quote(value.unwrap_or_default()))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.literal())
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let alternation = Token::ALL
            .iter()
            .map(|t| regex::escape(t.literal()))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&alternation).expect("token alternation is a valid regex")
    })
}

/// Wrap `value` in POSIX shell single quotes.
///
/// Inside single quotes only the quote itself is special; it is written as
/// `'\''` (close, escaped quote, reopen). Backslashes pass through unchanged.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Expand every recognised token in `template` for `node`.
///
/// Replacement is a single left-to-right pass, so text inserted for one token
/// is never scanned for further tokens.
pub fn render(template: &str, node: &JobNode) -> String {
    token_pattern()
        .replace_all(template, |caps: &Captures<'_>| {
            let matched = &caps[0];
            Token::from_literal(matched)
                .and_then(|token| token.value(node))
                .unwrap_or_else(|| matched.to_string())
        })
        .into_owned()
}

/// An action template supplied by the walk caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionTemplate(String);

impl ActionTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn render(&self, node: &JobNode) -> String {
        render(&self.0, node)
    }

    /// Tokens present in the template, in first-occurrence order.
    pub fn tokens(&self) -> Vec<Token> {
        let mut found = Vec::new();
        for m in token_pattern().find_iter(&self.0) {
            if let Some(token) = Token::from_literal(m.as_str()) {
                if !found.contains(&token) {
                    found.push(token);
                }
            }
        }
        found
    }
}

impl Default for ActionTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_ACTION)
    }
}

impl From<&str> for ActionTemplate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ActionTemplate {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ActionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
