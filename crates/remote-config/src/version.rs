//! Version gating for messages.
//!
//! Published constraints use the Masterminds/semver dialect (`>= 1.22`,
//! `>=1.20 <1.24`, `1.2 - 1.4`, `^1.23 || ~1.22.1`).
//! They are normalised into one or more [`semver::VersionReq`]s; a version
//! satisfies the constraint when any `||` alternative matches.

use crate::error::{RemoteConfigError, RemoteConfigResult};
use semver::{Version, VersionReq};

/// Parse a DDEV version such as `v1.24.0` or `1.24`.
pub fn parse_version(version: &str) -> RemoteConfigResult<Version> {
    let normalized = pad_version(strip_v(version.trim()));
    Version::parse(&normalized).map_err(|source| RemoteConfigError::InvalidVersion {
        version: version.to_string(),
        source,
    })
}

#[derive(Debug, Clone)]
pub struct VersionConstraint {
    alternatives: Vec<VersionReq>,
}

impl VersionConstraint {
    pub fn parse(constraint: &str) -> RemoteConfigResult<Self> {
        let invalid = |reason: &str| RemoteConfigError::InvalidConstraint {
            constraint: constraint.to_string(),
            reason: reason.to_string(),
        };

        let mut alternatives = Vec::new();
        for alternative in constraint.split("||") {
            let normalized = normalize_alternative(alternative).map_err(|reason| invalid(&reason))?;
            let req = VersionReq::parse(&normalized).map_err(|err| invalid(&err.to_string()))?;
            alternatives.push(req);
        }

        Ok(Self { alternatives })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| matches_req(req, version))
    }
}

/// Pre-release versions only match comparators that mention a pre-release,
/// which would hide every message from dev builds. Compare the release part
/// instead when the requirement carries no pre-release of its own.
fn matches_req(req: &VersionReq, version: &Version) -> bool {
    if req.matches(version) {
        return true;
    }
    if version.pre.is_empty() || req.comparators.iter().any(|c| !c.pre.is_empty()) {
        return false;
    }
    let release = Version::new(version.major, version.minor, version.patch);
    req.matches(&release)
}

fn strip_v(s: &str) -> &str {
    s.strip_prefix('v')
        .or_else(|| s.strip_prefix('V'))
        .unwrap_or(s)
}

/// `1` -> `1.0.0`, `1.2` -> `1.2.0`, keeping any pre-release or build suffix.
fn pad_version(s: &str) -> String {
    let split_at = s.find(['-', '+']).unwrap_or(s.len());
    let (core, suffix) = s.split_at(split_at);
    let parts = core.split('.').count();
    let padding = ".0".repeat(3usize.saturating_sub(parts));
    format!("{core}{padding}{suffix}")
}

fn is_operator(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| matches!(c, '<' | '>' | '=' | '!' | '~' | '^'))
}

fn normalize_alternative(alternative: &str) -> Result<String, String> {
    let alternative = alternative.trim();
    if alternative.is_empty() {
        return Err("empty constraint".to_string());
    }

    if let Some((low, high)) = alternative.split_once(" - ") {
        return Ok(format!(
            ">={}, <={}",
            strip_v(low.trim()),
            strip_v(high.trim())
        ));
    }

    let spaced = alternative.replace(',', " ");
    let mut comparators = Vec::new();
    let mut pending_op: Option<&str> = None;
    for token in spaced.split_whitespace() {
        if is_operator(token) {
            pending_op = Some(token);
            continue;
        }
        let joined = match pending_op.take() {
            Some(op) => format!("{op}{token}"),
            None => token.to_string(),
        };
        comparators.push(normalize_comparator(&joined)?);
    }
    if let Some(op) = pending_op {
        return Err(format!("operator '{op}' without a version"));
    }

    Ok(comparators.join(", "))
}

fn normalize_comparator(comparator: &str) -> Result<String, String> {
    let op_len = comparator
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '!' | '~' | '^'))
        .unwrap_or(comparator.len());
    let (op, version) = comparator.split_at(op_len);
    let version = strip_v(version);

    match op {
        "!=" => Err("'!=' is not supported".to_string()),
        "" if matches!(version, "*" | "x" | "X") => Ok("*".to_string()),
        "" => Ok(format!("={version}")),
        "==" => Ok(format!("={version}")),
        "=>" => Ok(format!(">={version}")),
        "=<" => Ok(format!("<={version}")),
        "~>" => Ok(format!("~{version}")),
        _ => Ok(format!("{op}{version}")),
    }
}
