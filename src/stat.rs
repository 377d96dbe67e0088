use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub costs: usize,
    pub makespan: usize,
    pub time_seconds: f64,
    pub high_level_expand_nodes: usize,
    pub low_level_expand_nodes: usize,
    pub num_task_assignments: usize,
}

impl Stats {
    pub fn print(&self) {
        info!(
            "Cost {:?} Makespan {:?} Time(seconds) {:?} High level expand nodes number: {:?} Low level expand nodes number {:?} Task assignments tried {:?}",
            self.costs,
            self.makespan,
            self.time_seconds,
            self.high_level_expand_nodes,
            self.low_level_expand_nodes,
            self.num_task_assignments
        );
    }
}
