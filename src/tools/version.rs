//! Version strings reported by utilities.

use semver::Version;

/// A version parsed out of a tool's `-V` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVersion {
    /// The token the version was read from, as printed.
    pub raw: String,
    /// Normalized semantic version.
    pub version: Version,
}

impl std::fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Extract a version from output such as `mkswap from util-linux 2.39.3`
/// or `mkswap (util-linux) 2.40`.
///
/// The last whitespace-separated token starting with a digit is used.
/// Missing minor/patch components are filled with zero and a `-suffix`
/// becomes a pre-release.
pub fn parse_tool_version(output: &str) -> Option<ToolVersion> {
    let line = output.lines().find(|l| !l.trim().is_empty())?;
    let token = line
        .split_whitespace()
        .rev()
        .find(|t| t.starts_with(|c: char| c.is_ascii_digit()))?
        .trim_end_matches(|c: char| !c.is_ascii_alphanumeric());

    let (numeric, pre) = match token.split_once('-') {
        Some((numeric, pre)) => (numeric, Some(pre)),
        None => (token, None),
    };

    let mut parts: Vec<u64> = Vec::with_capacity(3);
    for part in numeric.split('.') {
        parts.push(part.parse().ok()?);
    }
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    parts.resize(3, 0);

    let mut normalized = format!("{}.{}.{}", parts[0], parts[1], parts[2]);
    if let Some(pre) = pre.filter(|p| !p.is_empty()) {
        normalized.push('-');
        normalized.push_str(pre);
    }

    let version = Version::parse(&normalized).ok()?;
    Some(ToolVersion {
        raw: token.to_string(),
        version,
    })
}
