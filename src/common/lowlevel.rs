use std::cmp::Ordering;

/// Space-time A* node. Before the last constraint time step `time_step`
/// equals `g_cost`; past it the time axis is frozen and only `g_cost` keeps
/// growing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LowLevelOpenNode {
    pub(crate) position: (usize, usize),
    pub(crate) f_cost: usize,
    pub(crate) g_cost: usize,
    pub(crate) time_step: usize,
}

impl Ord for LowLevelOpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_cost
            .cmp(&other.f_cost)
            // Higher g cost (deeper in the time axis) has higher priority.
            .then_with(|| other.g_cost.cmp(&self.g_cost))
            .then_with(|| self.position.cmp(&other.position))
            .then_with(|| self.time_step.cmp(&other.time_step))
    }
}

impl PartialOrd for LowLevelOpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_list_order() {
        let shallow = LowLevelOpenNode {
            position: (0, 0),
            f_cost: 4,
            g_cost: 1,
            time_step: 1,
        };
        let deep = LowLevelOpenNode {
            position: (1, 1),
            f_cost: 4,
            g_cost: 3,
            time_step: 3,
        };
        let cheap = LowLevelOpenNode {
            position: (2, 2),
            f_cost: 3,
            g_cost: 0,
            time_step: 0,
        };

        // Lower f first, then the deeper node among equal f.
        assert!(cheap < deep);
        assert!(deep < shallow);
    }
}
