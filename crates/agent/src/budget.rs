//! Per-turn tool call budget.

/// Bounds the number of tool calls the loop will dispatch within a single
/// user turn, preventing unbounded retry spirals.
///
/// The budget is charged with a whole round's tool-use count before any of
/// that round is dispatched; a charge that pushes the total past the
/// ceiling stops the turn without dispatching. Tripping the budget is a
/// normal stop, not an error.
#[derive(Debug)]
pub struct ToolCallBudget {
    used: usize,
    ceiling: usize,
}

impl ToolCallBudget {
    pub fn new(ceiling: usize) -> Self {
        Self { used: 0, ceiling }
    }

    /// Charge `count` calls against the budget. Returns `false` when the
    /// charge exceeds the ceiling; the caller must not dispatch the round.
    pub fn charge(&mut self, count: usize) -> bool {
        self.used += count;
        self.used <= self.ceiling
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_ceiling() {
        let mut budget = ToolCallBudget::new(5);
        assert!(budget.charge(2));
        assert!(budget.charge(3));
        assert_eq!(budget.used(), 5);
    }

    #[test]
    fn trips_past_ceiling() {
        let mut budget = ToolCallBudget::new(5);
        assert!(budget.charge(5));
        assert!(!budget.charge(1));
    }

    #[test]
    fn whole_round_is_charged_at_once() {
        // A 3-call round against a ceiling of 2 trips before dispatch.
        let mut budget = ToolCallBudget::new(2);
        assert!(!budget.charge(3));
        assert_eq!(budget.used(), 3);
    }
}
