// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source descriptor parsing.
//!
//! A descriptor string names where a plugin comes from. Prefixes are checked
//! in a fixed order (`github:`, local path, URL) before falling through to
//! the npm package grammar, so npm names never shadow the other variants.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Ref used for GitHub sources that do not name one.
pub const DEFAULT_GITHUB_REF: &str = "main";

static NPM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:@[a-z0-9~-][a-z0-9._~-]*/)?[a-z0-9~-][a-z0-9._~-]*$").unwrap()
});

static GITHUB_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap());

/// A parsed source descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PluginSource {
    /// An installed npm package.
    Npm {
        package: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        version: Option<String>,
    },
    /// A GitHub repository archive.
    Github {
        owner: String,
        repo: String,
        /// Branch, tag, or commit. `None` means [`DEFAULT_GITHUB_REF`].
        #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
        git_ref: Option<String>,
    },
    /// A directory on the local filesystem, kept verbatim.
    Local { path: String },
    /// An archive at an arbitrary URL.
    Url { url: String },
}

impl PluginSource {
    /// Short name of the variant, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PluginSource::Npm { .. } => "npm",
            PluginSource::Github { .. } => "github",
            PluginSource::Local { .. } => "local",
            PluginSource::Url { .. } => "url",
        }
    }
}

impl fmt::Display for PluginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginSource::Npm {
                package,
                version: Some(version),
            } => write!(f, "{package}@{version}"),
            PluginSource::Npm { package, .. } => write!(f, "{package}"),
            PluginSource::Github {
                owner,
                repo,
                git_ref: Some(git_ref),
            } => write!(f, "github:{owner}/{repo}#{git_ref}"),
            PluginSource::Github { owner, repo, .. } => write!(f, "github:{owner}/{repo}"),
            PluginSource::Local { path } => write!(f, "{path}"),
            PluginSource::Url { url } => write!(f, "{url}"),
        }
    }
}

impl FromStr for PluginSource {
    type Err = SourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// A descriptor that matches none of the supported grammars.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid source format '{descriptor}': {reason}")]
pub struct SourceParseError {
    pub descriptor: String,
    pub reason: &'static str,
}

impl SourceParseError {
    fn new(descriptor: &str, reason: &'static str) -> Self {
        Self {
            descriptor: descriptor.to_string(),
            reason,
        }
    }
}

/// Parses a source descriptor.
///
/// - `github:<owner>/<repo>[#<ref>]`
/// - `./…` or `/…` (local path)
/// - `http://…` or `https://…`
/// - `@scope/name[@version]` or `name[@version]` (npm)
pub fn parse(source: &str) -> Result<PluginSource, SourceParseError> {
    if let Some(coords) = source.strip_prefix("github:") {
        return parse_github(source, coords);
    }

    if source.starts_with("./") || source.starts_with('/') {
        return Ok(PluginSource::Local {
            path: source.to_string(),
        });
    }

    if source.starts_with("http://") || source.starts_with("https://") {
        return Ok(PluginSource::Url {
            url: source.to_string(),
        });
    }

    parse_npm(source)
}

fn parse_github(source: &str, coords: &str) -> Result<PluginSource, SourceParseError> {
    let (repo_path, git_ref) = match coords.split_once('#') {
        Some((_, "")) => return Err(SourceParseError::new(source, "empty ref after '#'")),
        Some((path, git_ref)) => (path, Some(git_ref.to_string())),
        None => (coords, None),
    };

    let Some((owner, repo)) = repo_path.split_once('/') else {
        return Err(SourceParseError::new(source, "expected github:<owner>/<repo>"));
    };

    if !GITHUB_SEGMENT.is_match(owner) || !GITHUB_SEGMENT.is_match(repo) {
        return Err(SourceParseError::new(
            source,
            "owner and repo must be non-empty and contain no '/'",
        ));
    }

    Ok(PluginSource::Github {
        owner: owner.to_string(),
        repo: repo.to_string(),
        git_ref,
    })
}

fn parse_npm(source: &str) -> Result<PluginSource, SourceParseError> {
    // The version separator is the first '@' after the (optional) scope.
    let name_start = usize::from(source.starts_with('@'));
    let (package, version) = match source[name_start..].find('@') {
        Some(at) => {
            let split = name_start + at;
            (&source[..split], Some(&source[split + 1..]))
        }
        None => (source, None),
    };

    if !NPM_NAME.is_match(package) {
        return Err(SourceParseError::new(
            source,
            "not a github:, local, URL, or npm package descriptor",
        ));
    }

    let version = match version {
        Some("") => return Err(SourceParseError::new(source, "empty version after '@'")),
        Some(v) if v.chars().any(char::is_whitespace) => {
            return Err(SourceParseError::new(source, "version contains whitespace"));
        }
        Some(v) => Some(v.to_string()),
        None => None,
    };

    Ok(PluginSource::Npm {
        package: package.to_string(),
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_with_ref() {
        assert_eq!(
            parse("github:acme/widgets#v2").unwrap(),
            PluginSource::Github {
                owner: "acme".into(),
                repo: "widgets".into(),
                git_ref: Some("v2".into()),
            }
        );
    }

    #[test]
    fn github_ref_is_not_defaulted_at_parse_time() {
        let source = parse("github:acme/widgets").unwrap();
        assert!(matches!(source, PluginSource::Github { git_ref: None, .. }));
    }

    #[test]
    fn github_rejects_malformed_coordinates() {
        for bad in [
            "github:acme",
            "github:/widgets",
            "github:acme/",
            "github:acme/widgets/extra",
            "github:acme/widgets#",
        ] {
            assert!(parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn local_paths_are_verbatim() {
        assert_eq!(
            parse("./plugins/x").unwrap(),
            PluginSource::Local {
                path: "./plugins/x".into()
            }
        );
        assert_eq!(
            parse("/opt/atlas/plugins/y").unwrap(),
            PluginSource::Local {
                path: "/opt/atlas/plugins/y".into()
            }
        );
    }

    #[test]
    fn urls() {
        assert_eq!(
            parse("https://h/p.tgz").unwrap(),
            PluginSource::Url {
                url: "https://h/p.tgz".into()
            }
        );
        assert!(matches!(
            parse("http://h/p.zip").unwrap(),
            PluginSource::Url { .. }
        ));
    }

    #[test]
    fn scoped_npm_with_version() {
        assert_eq!(
            parse("@acme/widgets@1.2.3").unwrap(),
            PluginSource::Npm {
                package: "@acme/widgets".into(),
                version: Some("1.2.3".into()),
            }
        );
    }

    #[test]
    fn bare_npm_names() {
        assert_eq!(
            parse("left-pad").unwrap(),
            PluginSource::Npm {
                package: "left-pad".into(),
                version: None,
            }
        );
        assert_eq!(
            parse("left-pad@^1.3.0").unwrap(),
            PluginSource::Npm {
                package: "left-pad".into(),
                version: Some("^1.3.0".into()),
            }
        );
        assert_eq!(
            parse("@acme/widgets").unwrap(),
            PluginSource::Npm {
                package: "@acme/widgets".into(),
                version: None,
            }
        );
    }

    #[test]
    fn invalid_descriptors() {
        for bad in ["", "@acme", "@/x", "Has Spaces", "../up", "pkg@", "ftp://h/p"] {
            let err = parse(bad).unwrap_err();
            assert_eq!(err.descriptor, bad);
        }
    }

    #[test]
    fn display_round_trips_descriptor() {
        for descriptor in [
            "github:acme/widgets#v2",
            "github:acme/widgets",
            "./plugins/x",
            "https://h/p.tgz",
            "@acme/widgets@1.2.3",
            "left-pad",
        ] {
            let parsed: PluginSource = descriptor.parse().unwrap();
            assert_eq!(parsed.to_string(), descriptor);
        }
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(parse("github:acme/widgets#v2").unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "github", "owner": "acme", "repo": "widgets", "ref": "v2" })
        );
    }
}
