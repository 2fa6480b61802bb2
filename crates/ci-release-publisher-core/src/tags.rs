//! Tag naming scheme for managed releases
//!
//! Every release this tool manages is identified by its tag alone. The tag
//! encodes the release kind, the branch (or pushed tag), and the build and job
//! numbers where the kind has them:
//!
//! | Kind      | Final tag                          | Staging tag              |
//! |-----------|------------------------------------|--------------------------|
//! | temporary | `<p>-<branch>-<build>-<job>-tmp`   | `<s><final>`             |
//! | latest    | `<p>-<branch>-latest`              | `<s><final>`             |
//! | numbered  | `<p>-<branch>-<build>`             | `<s><final>`             |
//! | tag       | `<tag>`                            | `<s><p>-<tag>-tag`       |
//!
//! `<p>` is the tag prefix and `<s>` the staging prefix. Decoding is strict:
//! patterns are anchored and numbers must be canonical, so a tag that `encode`
//! could not have produced never decodes.

use regex::Regex;

use crate::error::{ConfigError, Result};
use crate::types::ReleaseKind;

/// Default prefix of every managed tag
pub const DEFAULT_TAG_PREFIX: &str = "ci";

/// Default marker for tags of releases that are not committed yet
pub const DEFAULT_STAGING_PREFIX: &str = "_";

const NUMBER: &str = "0|[1-9][0-9]*";

/// Identity of a managed release, as carried by its tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReleaseIdentity {
    Temporary {
        branch: String,
        build_number: u64,
        job_number: u64,
    },
    Latest {
        branch: String,
    },
    Numbered {
        branch: String,
        build_number: u64,
    },
    Tag {
        tag: String,
    },
}

impl ReleaseIdentity {
    pub fn kind(&self) -> ReleaseKind {
        match self {
            Self::Temporary { .. } => ReleaseKind::Temporary,
            Self::Latest { .. } => ReleaseKind::Latest,
            Self::Numbered { .. } => ReleaseKind::Numbered,
            Self::Tag { .. } => ReleaseKind::Tag,
        }
    }

    /// Branch name, or the pushed tag for tag releases
    pub fn branch_or_tag(&self) -> &str {
        match self {
            Self::Temporary { branch, .. }
            | Self::Latest { branch }
            | Self::Numbered { branch, .. } => branch,
            Self::Tag { tag } => tag,
        }
    }

    pub fn build_number(&self) -> Option<u64> {
        match self {
            Self::Temporary { build_number, .. } | Self::Numbered { build_number, .. } => {
                Some(*build_number)
            }
            _ => None,
        }
    }

    pub fn job_number(&self) -> Option<u64> {
        match self {
            Self::Temporary { job_number, .. } => Some(*job_number),
            _ => None,
        }
    }
}

/// A decoded tag: the release it names and whether it is the staging form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagIdentity {
    pub release: ReleaseIdentity,
    pub staging: bool,
}

struct KindPatterns {
    plain: Regex,
    staging: Regex,
}

/// Encoder and strict decoder for managed tag names
pub struct TagCodec {
    prefix: String,
    staging_prefix: String,
    temporary: KindPatterns,
    latest: KindPatterns,
    numbered: KindPatterns,
    tag_staging: Regex,
}

impl std::fmt::Debug for TagCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagCodec")
            .field("prefix", &self.prefix)
            .field("staging_prefix", &self.staging_prefix)
            .finish()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        ConfigError::InvalidValue {
            field: "tag_prefix".to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Check that a prefix pair keeps final and staging tags apart
///
/// Both prefixes must be non-empty, and `<s><p>-` must not start with `<p>-`:
/// with `ci` and `ci-`, the staging tag `ci-ci-master-latest` would also read
/// as the final latest tag of branch `ci-master`.
pub fn validate_prefixes(prefix: &str, staging_prefix: &str) -> Result<()> {
    let invalid = |field: &str, message: String| -> Result<()> {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message,
        }
        .into())
    };

    if prefix.is_empty() {
        return invalid("tag_prefix", "tag prefix can't be empty".to_string());
    }
    if staging_prefix.is_empty() {
        return invalid("tag_prefix_tmp", "staging tag prefix can't be empty".to_string());
    }

    let final_head = format!("{}-", prefix);
    if format!("{}{}", staging_prefix, final_head).starts_with(&final_head) {
        return invalid(
            "tag_prefix_tmp",
            format!(
                "staging prefix {:?} makes staging tags look like final tags with prefix {:?}",
                staging_prefix, prefix
            ),
        );
    }
    Ok(())
}

impl TagCodec {
    /// Create a codec for the given prefixes, checked by [`validate_prefixes`]
    pub fn new(prefix: &str, staging_prefix: &str) -> Result<Self> {
        validate_prefixes(prefix, staging_prefix)?;

        let p = regex::escape(prefix);
        let s = regex::escape(staging_prefix);
        let both = |body: &str| -> Result<KindPatterns> {
            Ok(KindPatterns {
                plain: compile(&format!("^(?s){}-{}$", p, body))?,
                staging: compile(&format!("^(?s){}{}-{}$", s, p, body))?,
            })
        };

        Ok(Self {
            prefix: prefix.to_string(),
            staging_prefix: staging_prefix.to_string(),
            temporary: both(&format!(
                "(?P<branch>.+)-(?P<build>{n})-(?P<job>{n})-tmp",
                n = NUMBER
            ))?,
            latest: both("(?P<branch>.+)-latest")?,
            numbered: both(&format!("(?P<branch>.+)-(?P<build>{})", NUMBER))?,
            tag_staging: compile(&format!("^(?s){}{}-(?P<tag>.+)-tag$", s, p))?,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn staging_prefix(&self) -> &str {
        &self.staging_prefix
    }

    /// Produce the final or staging tag for a release
    pub fn encode(&self, release: &ReleaseIdentity, staging: bool) -> String {
        let stage = if staging { self.staging_prefix.as_str() } else { "" };
        match release {
            ReleaseIdentity::Temporary {
                branch,
                build_number,
                job_number,
            } => format!(
                "{}{}-{}-{}-{}-tmp",
                stage, self.prefix, branch, build_number, job_number
            ),
            ReleaseIdentity::Latest { branch } => {
                format!("{}{}-{}-latest", stage, self.prefix, branch)
            }
            ReleaseIdentity::Numbered {
                branch,
                build_number,
            } => format!("{}{}-{}-{}", stage, self.prefix, branch, build_number),
            ReleaseIdentity::Tag { tag } if staging => {
                format!("{}{}-{}-tag", self.staging_prefix, self.prefix, tag)
            }
            ReleaseIdentity::Tag { tag } => tag.clone(),
        }
    }

    /// Decode a tag as one particular (kind, staging) form
    pub fn decode(&self, kind: ReleaseKind, staging: bool, tag: &str) -> Option<ReleaseIdentity> {
        let pattern = match (kind, staging) {
            (ReleaseKind::Tag, false) => {
                return (!tag.is_empty()).then(|| ReleaseIdentity::Tag {
                    tag: tag.to_string(),
                });
            }
            (ReleaseKind::Tag, true) => &self.tag_staging,
            (ReleaseKind::Temporary, _) => self.temporary.select(staging),
            (ReleaseKind::Latest, _) => self.latest.select(staging),
            (ReleaseKind::Numbered, _) => self.numbered.select(staging),
        };

        let caps = pattern.captures(tag)?;
        let text = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
        let number = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u64>().ok());

        Some(match kind {
            ReleaseKind::Temporary => ReleaseIdentity::Temporary {
                branch: text("branch")?,
                build_number: number("build")?,
                job_number: number("job")?,
            },
            ReleaseKind::Latest => ReleaseIdentity::Latest {
                branch: text("branch")?,
            },
            ReleaseKind::Numbered => ReleaseIdentity::Numbered {
                branch: text("branch")?,
                build_number: number("build")?,
            },
            ReleaseKind::Tag => ReleaseIdentity::Tag { tag: text("tag")? },
        })
    }

    /// Classify a tag as any managed form
    ///
    /// The plain tag-release form is skipped since any string matches it.
    pub fn classify(&self, tag: &str) -> Option<TagIdentity> {
        const ORDER: [(ReleaseKind, bool); 7] = [
            (ReleaseKind::Temporary, true),
            (ReleaseKind::Temporary, false),
            (ReleaseKind::Latest, true),
            (ReleaseKind::Latest, false),
            (ReleaseKind::Numbered, true),
            (ReleaseKind::Numbered, false),
            (ReleaseKind::Tag, true),
        ];

        ORDER.iter().find_map(|&(kind, staging)| {
            self.decode(kind, staging, tag)
                .map(|release| TagIdentity { release, staging })
        })
    }
}

impl KindPatterns {
    fn select(&self, staging: bool) -> &Regex {
        if staging {
            &self.staging
        } else {
            &self.plain
        }
    }
}
