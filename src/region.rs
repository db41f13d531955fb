use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref RGN_RE: Regex = Regex::new(r"^(.+):([0-9,]+)-([0-9,]+)$").unwrap();
}

/// A window on one chromosome. Coordinates are kept exactly as written on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Region {
    pub name: String,
    pub st: u64,
    pub en: u64,
}

impl Region {
    pub fn len(&self) -> u64 {
        self.en - self.st
    }

    pub fn is_empty(&self) -> bool {
        self.en == self.st
    }

    /// True when `pos` lies strictly inside the window.
    pub fn strictly_contains(&self, pos: u64) -> bool {
        self.st < pos && pos < self.en
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}-{}", self.name, self.st, self.en)
    }
}

/// parse region strings
/// # Example
/// ```
/// let rgn = rustyplot::region::parse_region("chr7:45232945-45240000").unwrap();
/// assert_eq!("chr7", rgn.name);
/// assert_eq!(45232945, rgn.st);
/// assert_eq!(45240000, rgn.en);
///
/// let rgn2 = rustyplot::region::parse_region("chr1:2-2000:1-1,000").unwrap();
/// assert_eq!("chr1:2-2000", rgn2.name);
/// assert_eq!(1000, rgn2.en);
/// ```
pub fn parse_region(region: &str) -> Result<Region> {
    let caps = RGN_RE
        .captures(region.trim())
        .with_context(|| format!("Failed to parse region string: {}", region))?;

    let name = caps[1].to_string();
    let st = caps[2].replace(',', "").parse::<u64>()?;
    let en = caps[3].replace(',', "").parse::<u64>()?;

    if st > en {
        bail!("Region start must be less than end.\n{}", region);
    }
    Ok(Region { name, st, en })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_regions() {
        assert!(parse_region("chr1").is_err());
        assert!(parse_region("chr1:10").is_err());
        assert!(parse_region("chr1:20-10").is_err());
    }

    #[test]
    fn strict_containment() {
        let rgn = parse_region("chr1:10-20").unwrap();
        assert_eq!(rgn.len(), 10);
        assert!(!rgn.strictly_contains(10));
        assert!(rgn.strictly_contains(11));
        assert!(!rgn.strictly_contains(20));
        assert_eq!(rgn.to_string(), "chr1:10-20");
    }
}
