//! Token usage accounting.

use serde::{Deserialize, Serialize};

/// Token usage reported by the oracle for one call, or summed over a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    /// Merge another usage into this one (accumulate).
    pub fn merge(&mut self, other: &Usage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_accumulates_and_saturates() {
        let mut total = Usage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        };
        total.merge(&Usage {
            input_tokens: 1,
            output_tokens: 2,
            total_tokens: 3,
        });
        assert_eq!(total.total_tokens, 18);

        total.merge(&Usage {
            input_tokens: u32::MAX,
            output_tokens: 0,
            total_tokens: u32::MAX,
        });
        assert_eq!(total.input_tokens, u32::MAX);
        assert_eq!(total.output_tokens, 7);
        assert_eq!(total.total_tokens, u32::MAX);
    }
}
