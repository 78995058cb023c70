use serde::{Deserialize, Serialize};
use std::fmt;

/// Position ID. Monotonic within a run, so ordering by id is ordering by
/// entry (FIFO).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionId(pub u64);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pos-{}", self.0)
    }
}

/// Sequential ID generator, owned by one engine run.
#[derive(Debug, Default, Clone)]
pub struct IdGen {
    next_position: u64,
}

impl IdGen {
    pub fn next_position_id(&mut self) -> PositionId {
        self.next_position += 1;
        PositionId(self.next_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let mut gen = IdGen::default();
        let a = gen.next_position_id();
        let b = gen.next_position_id();
        assert!(a < b);
        assert_eq!(a.to_string(), "pos-1");
    }
}
