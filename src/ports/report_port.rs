//! Report output port trait.

use std::path::Path;

use crate::domain::error::RsitraderError;
use crate::domain::grid::GridSearchResult;
use crate::domain::simulator::SimulationResult;

/// Port for writing simulation and grid-search reports.
pub trait ReportPort {
    fn write_simulation(
        &self,
        result: &SimulationResult,
        output_path: &Path,
    ) -> Result<(), RsitraderError>;

    fn write_grid(
        &self,
        result: &GridSearchResult,
        output_path: &Path,
    ) -> Result<(), RsitraderError>;
}
