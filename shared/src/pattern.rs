//! Hexagram patterns: six stacked lines, each solid (yang) or broken (yin).

use serde::{Deserialize, Serialize};

/// Number of lines in a hexagram.
pub const LINE_COUNT: usize = 6;

/// Kind of a single hexagram line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineKind {
    /// Solid line, one contiguous segment. Encoded as `1`.
    Yang,
    /// Broken line, two segments around a central gap. Encoded as `0`.
    Yin,
}

impl LineKind {
    pub fn from_bit(bit: u8) -> Option<Self> {
        match bit {
            1 => Some(LineKind::Yang),
            0 => Some(LineKind::Yin),
            _ => None,
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            LineKind::Yang => 1,
            LineKind::Yin => 0,
        }
    }
}

/// Six lines, listed bottom to top (index 0 is formed first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexagramPattern {
    lines: [LineKind; LINE_COUNT],
}

impl HexagramPattern {
    pub fn new(lines: [LineKind; LINE_COUNT]) -> Self {
        Self { lines }
    }

    /// Parse from a bit list such as `[1, 0, 1, 1, 0, 0]`.
    pub fn from_bits(bits: &[u8]) -> Result<Self, String> {
        if bits.len() != LINE_COUNT {
            return Err(format!(
                "hexagram needs exactly {} lines, got {}",
                LINE_COUNT,
                bits.len()
            ));
        }

        let mut lines = [LineKind::Yang; LINE_COUNT];
        for (i, bit) in bits.iter().enumerate() {
            lines[i] = LineKind::from_bit(*bit)
                .ok_or_else(|| format!("line {} must be 0 or 1, got {}", i + 1, bit))?;
        }
        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[LineKind; LINE_COUNT] {
        &self.lines
    }

    pub fn to_bits(&self) -> [u8; LINE_COUNT] {
        self.lines.map(LineKind::bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_pattern() {
        let pattern = HexagramPattern::from_bits(&[1, 0, 1, 1, 0, 0]).unwrap();
        assert_eq!(pattern.lines()[0], LineKind::Yang);
        assert_eq!(pattern.lines()[1], LineKind::Yin);
        assert_eq!(pattern.to_bits(), [1, 0, 1, 1, 0, 0]);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(HexagramPattern::from_bits(&[1, 0, 1]).is_err());
        assert!(HexagramPattern::from_bits(&[1, 0, 1, 1, 0, 0, 1]).is_err());
    }

    #[test]
    fn rejects_non_binary_line() {
        let err = HexagramPattern::from_bits(&[1, 0, 2, 1, 0, 0]).unwrap_err();
        assert!(err.contains("line 3"));
    }
}
