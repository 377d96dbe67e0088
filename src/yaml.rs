use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, Write};

use crate::common::{Plan, Problem};
use crate::config::Config;

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentYaml {
    pub name: String,
    pub start: [usize; 2],
    pub goal: [usize; 2],
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MapYaml {
    pub dimensions: [usize; 2],
    #[serde(default)]
    pub obstacles: Vec<[usize; 2]>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemYaml {
    pub map: MapYaml,
    pub agents: Vec<AgentYaml>,
}

impl ProblemYaml {
    pub fn from_file(path: &str) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn from_yaml_str(problem_str: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(problem_str)?)
    }

    /// The goal list, in agent order, doubles as the task pool the
    /// assignment may permute.
    pub fn to_problem(&self, config: &Config) -> Problem {
        Problem {
            width: self.map.dimensions[0],
            height: self.map.dimensions[1],
            obstacles: self
                .map
                .obstacles
                .iter()
                .map(|&[x, y]| (x, y))
                .collect::<HashSet<_>>(),
            starts: self.agents.iter().map(|a| (a.start[0], a.start[1])).collect(),
            goals: self.agents.iter().map(|a| (a.goal[0], a.goal[1])).collect(),
            max_task_assignments: config.max_task_assignments,
            group_size: config.group_size,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatisticsYaml {
    pub cost: usize,
    pub makespan: usize,
    pub runtime: f64,
    #[serde(rename = "highLevelExpanded")]
    pub high_level_expanded: usize,
    #[serde(rename = "lowLevelExpanded")]
    pub low_level_expanded: usize,
    #[serde(rename = "numTaskAssignments")]
    pub num_task_assignments: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StateYaml {
    pub x: usize,
    pub y: usize,
    pub t: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentScheduleYaml {
    pub name: String,
    pub path: Vec<StateYaml>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanYaml {
    pub successful: bool,
    pub statistics: StatisticsYaml,
    pub schedule: Vec<AgentScheduleYaml>,
}

impl PlanYaml {
    pub fn from_plan(plan: &Plan) -> Self {
        PlanYaml {
            successful: plan.successful,
            statistics: StatisticsYaml {
                cost: plan.stats.costs,
                makespan: plan.stats.makespan,
                runtime: plan.stats.time_seconds,
                high_level_expanded: plan.stats.high_level_expand_nodes,
                low_level_expanded: plan.stats.low_level_expand_nodes,
                num_task_assignments: plan.stats.num_task_assignments,
            },
            schedule: plan
                .schedule
                .iter()
                .enumerate()
                .map(|(agent, path)| AgentScheduleYaml {
                    name: format!("agent{}", agent),
                    path: path.iter().map(|&(x, y, t)| StateYaml { x, y, t }).collect(),
                })
                .collect(),
        }
    }

    pub fn write_to_file(&self, path: &str) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        let yaml_data = serde_yaml::to_string(self)?;
        writer.write_all(yaml_data.as_bytes())?;
        Ok(())
    }
}
