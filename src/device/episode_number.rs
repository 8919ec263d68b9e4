//! Season/episode designators such as `S02E05`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Strict `S<digits>E<digits>` shape; anything else is rejected outright.
#[allow(clippy::expect_used)]
static DESIGNATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^S(\d+)E(\d+)$").expect("designator regex is valid"));

/// A designator that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid season/episode designator {0:?}")]
pub struct InvalidDesignator(pub String);

/// Parsed season/episode designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeNumber {
    /// Season number (digits between `S` and `E`).
    pub season: u32,
    /// Episode number (digits after `E`).
    pub episode: u32,
}

impl FromStr for EpisodeNumber {
    type Err = InvalidDesignator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDesignator(s.to_string());
        let captures = DESIGNATOR_RE.captures(s).ok_or_else(invalid)?;
        let season = captures[1].parse().map_err(|_| invalid())?;
        let episode = captures[2].parse().map_err(|_| invalid())?;
        Ok(Self { season, episode })
    }
}

impl fmt::Display for EpisodeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}
