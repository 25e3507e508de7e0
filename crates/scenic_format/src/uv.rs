//! UV normalization applied by the encoder
//!
//! Tiling UVs are folded back into the unit square. This is lossy: a mesh
//! that relied on repeat wrapping loses it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which bound triggers the modulo on each axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UvWrapMode {
    /// Both axes wrap only outside `[-1, 1]`
    #[default]
    Symmetric,
    /// U wraps whenever it is not exactly 1, V outside `[-1, 1]`
    Legacy,
}

impl fmt::Display for UvWrapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UvWrapMode::Symmetric => write!(f, "symmetric"),
            UvWrapMode::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for UvWrapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "symmetric" => Ok(UvWrapMode::Symmetric),
            "legacy" => Ok(UvWrapMode::Legacy),
            _ => Err(format!("Invalid UV wrap mode: {}", s)),
        }
    }
}

impl UvWrapMode {
    /// Fold one UV pair into `[0, 1]`
    pub fn wrap(self, uv: [f32; 2]) -> [f32; 2] {
        let [mut u, mut v] = uv;
        let wrap_u = match self {
            UvWrapMode::Symmetric => !(-1.0..=1.0).contains(&u),
            UvWrapMode::Legacy => u != 1.0,
        };
        if wrap_u {
            u %= 1.0;
        }
        if !(-1.0..=1.0).contains(&v) {
            v %= 1.0;
        }
        [rebias(u), rebias(v)]
    }
}

#[inline]
fn rebias(c: f32) -> f32 {
    if c < 0.0 {
        c + 1.0
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_boundary_values() {
        let m = UvWrapMode::Symmetric;
        assert_eq!(m.wrap([1.0, 1.0]), [1.0, 1.0]);
        assert_eq!(m.wrap([1.5, 1.5]), [0.5, 0.5]);
        let [u, v] = m.wrap([-0.3, -0.3]);
        assert_relative_eq!(u, 0.7, epsilon = 1e-6);
        assert_relative_eq!(v, 0.7, epsilon = 1e-6);
    }

    #[test]
    fn test_far_negative_wraps_then_rebiases() {
        let [u, _] = UvWrapMode::Symmetric.wrap([-2.25, 0.0]);
        assert_relative_eq!(u, 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_legacy_u_axis() {
        // In range and not exactly 1: modulo is a no-op
        assert_eq!(UvWrapMode::Legacy.wrap([0.25, 0.5]), [0.25, 0.5]);
        assert_eq!(UvWrapMode::Legacy.wrap([1.0, 0.5]), [1.0, 0.5]);
        assert_eq!(UvWrapMode::Legacy.wrap([2.0, 0.5]), [0.0, 0.5]);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Legacy".parse::<UvWrapMode>(), Ok(UvWrapMode::Legacy));
        assert!("wrap".parse::<UvWrapMode>().is_err());
        assert_eq!(UvWrapMode::Symmetric.to_string(), "symmetric");
    }
}
