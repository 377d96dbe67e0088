use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "rust-cbsta",
    about = "Conflict-Based Search with Task Assignment on 4-connected grids.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, short, help = "Path to the YAML config file")]
    pub config: Option<String>,

    #[arg(long, short, help = "Path to the problem YAML file")]
    pub input: Option<String>,

    #[arg(long, short, help = "Path the schedule YAML file is written to")]
    pub output: Option<String>,

    #[arg(long, help = "Maximum number of task assignments to try")]
    pub max_task_assignments: Option<usize>,

    #[arg(long, help = "Number of agents per assignment group")]
    pub group_size: Option<usize>,
}

#[derive(Serialize, Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub input_path: String,
    pub output_path: String,
    pub max_task_assignments: usize,
    pub group_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: "problem.yaml".to_string(),
            output_path: "plan.yaml".to_string(),
            // Effectively unbounded.
            max_task_assignments: 1_000_000_000,
            group_size: 1_000_000_000,
        }
    }
}

impl Config {
    pub fn from_yaml_str(config_str: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(config_str)?;
        config.validate()
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(input) = &cli.input {
            self.input_path = input.clone();
        }
        if let Some(output) = &cli.output {
            self.output_path = output.clone();
        }
        if let Some(max_task_assignments) = cli.max_task_assignments {
            self.max_task_assignments = max_task_assignments;
        }
        if let Some(group_size) = cli.group_size {
            self.group_size = group_size;
        }
        self.validate()
    }

    pub fn validate(self) -> anyhow::Result<Self> {
        anyhow::ensure!(
            self.max_task_assignments > 0,
            "max_task_assignments must be positive"
        );
        anyhow::ensure!(self.group_size > 0, "group_size must be positive");
        Ok(self)
    }
}
