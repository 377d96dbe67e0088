use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_cbsta::common::Plan;
use rust_cbsta::config::{Cli, Config};
use rust_cbsta::map::Map;
use rust_cbsta::solver::{Solver, CBSTA};
use rust_cbsta::yaml::{PlanYaml, ProblemYaml};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            let config_str = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {path:?}"))?;
            Config::from_yaml_str(&config_str)?
        }
        None => Config::default(),
    };
    let config = config.override_from_command_line(&cli)?;

    let problem_yaml = ProblemYaml::from_file(&config.input_path)
        .with_context(|| format!("failed to load problem {:?}", config.input_path))?;
    let problem = problem_yaml.to_problem(&config);
    problem.validate()?;

    let map = Map::new(&problem);
    let mut solver = CBSTA::new(&problem, &map);

    let plan = match solver.solve() {
        Ok(solution) => {
            info!("planning successful");
            Plan::from_solution(&solution, solver.stats().clone())
        }
        Err(err) => {
            info!("planning not successful: {err}");
            Plan::unsuccessful(solver.stats().clone())
        }
    };

    solver.stats().print();
    PlanYaml::from_plan(&plan).write_to_file(&config.output_path)?;

    Ok(())
}
