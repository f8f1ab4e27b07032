pub mod crossover;
pub mod error;
pub mod fitness;
pub mod ga;
pub mod geometry;
pub mod layout;
pub mod mutation;
pub mod param;
pub mod population;
pub mod replacement;
pub mod selection;
pub mod utils;

use crate::error::Result;
use crate::ga::{ga, RunResult};
use crate::utils::format_layout;
use log::info;
use param::Param;

/// Validates the parameters then runs the genetic algorithm
pub fn run(param: &Param) -> Result<RunResult> {
    param::validate(param)?;

    cinfo!(
        param.general.display_colorful,
        "Optimizing {} turbines on a {}x{} area\n-----------------------------------------------------",
        param.farm.n_turbines,
        param.farm.area_size,
        param.farm.area_size
    );
    let result = ga(param)?;

    cinfo!(
        param.general.display_colorful,
        "\x1b[1;92mBest fitness {:.4} (generation {})\x1b[0m",
        result.best_fitness,
        result.best_generation
    );
    info!("Best layout: {}", format_layout(&result.best_layout));

    Ok(result)
}
