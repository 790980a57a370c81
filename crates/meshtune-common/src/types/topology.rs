//! TopologyTag - cyclic topology label
//!
//! Advanced one step per learning episode, wrapping after the fifth value.

use serde::{Deserialize, Serialize};

/// Topology under which an episode is evaluated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopologyTag {
    #[default]
    Random,
    Linear,
    Elliptical,
    Tree,
    Mobile,
}

impl TopologyTag {
    /// All tags in cycle order
    pub const ALL: [TopologyTag; 5] = [
        TopologyTag::Random,
        TopologyTag::Linear,
        TopologyTag::Elliptical,
        TopologyTag::Tree,
        TopologyTag::Mobile,
    ];

    /// Position in the cycle
    pub fn index(self) -> usize {
        self as usize
    }

    /// Next tag, wrapping from Mobile back to Random
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Advance in place
    pub fn advance(&mut self) {
        *self = self.next();
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TopologyTag::Random => "RANDOM",
            TopologyTag::Linear => "LINEAR",
            TopologyTag::Elliptical => "ELLIPTICAL",
            TopologyTag::Tree => "TREE",
            TopologyTag::Mobile => "MOBILE",
        }
    }
}

impl std::fmt::Display for TopologyTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_order() {
        let mut tag = TopologyTag::default();
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(tag);
            tag.advance();
        }
        assert_eq!(seen, TopologyTag::ALL.to_vec());
        assert_eq!(tag, TopologyTag::Random);
    }

    #[test]
    fn test_wraps_from_any_start() {
        for start in TopologyTag::ALL {
            let mut tag = start;
            for _ in 0..5 {
                tag.advance();
            }
            assert_eq!(tag, start);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&TopologyTag::Elliptical).unwrap();
        assert_eq!(json, "\"ELLIPTICAL\"");
    }
}
