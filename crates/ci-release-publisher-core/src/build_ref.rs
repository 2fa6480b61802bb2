//! Identity of the current CI build, read from the Travis-CI environment

use tracing::debug;

use crate::error::{ConfigError, Result};

/// The build and job this invocation runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRef {
    /// CI repository slug (`TRAVIS_REPO_SLUG`)
    pub repo_slug: String,
    /// Repository releases are published to, usually the same as `repo_slug`
    pub hosting_repo: String,
    /// Branch name; equals the tag name on tag builds
    pub branch: String,
    /// Pushed tag that triggered the build, if any
    pub tag: Option<String>,
    pub commit: String,
    pub build_number: u64,
    pub build_id: String,
    pub job_number: u64,
    pub job_id: String,
    /// Whether the current job's tests failed (`TRAVIS_TEST_RESULT=1`)
    pub job_failed: bool,
    /// Whether the current job is allowed to fail
    pub allow_failure: bool,
}

fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(name.to_string()).into()),
    }
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.is_empty())
}

fn invalid(name: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnvVar {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| invalid(name, value, "expected a non-negative integer").into())
}

impl BuildRef {
    /// Read the build reference from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the build reference through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let repo_slug = required(&lookup, "TRAVIS_REPO_SLUG")?;
        let hosting_repo =
            optional(&lookup, "GITHUB_REPO_SLUG").unwrap_or_else(|| repo_slug.clone());
        let branch = required(&lookup, "TRAVIS_BRANCH")?;
        let tag = optional(&lookup, "TRAVIS_TAG");
        let commit = required(&lookup, "TRAVIS_COMMIT")?;

        let build_number_raw = required(&lookup, "TRAVIS_BUILD_NUMBER")?;
        let build_number = parse_number("TRAVIS_BUILD_NUMBER", &build_number_raw)?;
        let build_id = required(&lookup, "TRAVIS_BUILD_ID")?;

        let job_number_raw = required(&lookup, "TRAVIS_JOB_NUMBER")?;
        let job_part = job_number_raw
            .split_once('.')
            .map(|(_, job)| job)
            .ok_or_else(|| {
                invalid("TRAVIS_JOB_NUMBER", &job_number_raw, "expected <build>.<job>")
            })?;
        let job_number = parse_number("TRAVIS_JOB_NUMBER", job_part)?;
        let job_id = required(&lookup, "TRAVIS_JOB_ID")?;

        let job_failed = match optional(&lookup, "TRAVIS_TEST_RESULT").as_deref() {
            None | Some("0") => false,
            Some("1") => true,
            Some(other) => {
                return Err(invalid("TRAVIS_TEST_RESULT", other, "expected 0 or 1").into());
            }
        };
        let allow_failure = optional(&lookup, "TRAVIS_ALLOW_FAILURE")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let build = Self {
            repo_slug,
            hosting_repo,
            branch,
            tag,
            commit,
            build_number,
            build_id,
            job_number,
            job_id,
            job_failed,
            allow_failure,
        };
        debug!(?build, "read build reference");
        Ok(build)
    }

    /// The pushed tag on tag builds, the branch otherwise
    pub fn branch_or_tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.branch)
    }

    pub fn is_tag_build(&self) -> bool {
        self.tag.is_some()
    }

    /// Whether releases go to a repository other than the one being built
    pub fn publishes_elsewhere(&self) -> bool {
        self.hosting_repo != self.repo_slug
    }

    /// Commit new releases should point at, unless explicitly overridden
    ///
    /// Unset when publishing to another repository, which does not have the commit.
    pub fn default_target_commitish(&self) -> Option<String> {
        (!self.publishes_elsewhere()).then(|| self.commit.clone())
    }

    /// Whether the current job failed and was not allowed to
    pub fn job_failed_without_permission(&self) -> bool {
        self.job_failed && !self.allow_failure
    }
}
