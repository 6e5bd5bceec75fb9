use std::path::Path;

use tracing::{info, warn};
use vaxstat_core::{PopulationTable, input};

use crate::StoreError;
use crate::csv::{Columns, read_csv, utf8};

/// Load `population.csv` (`state`, `pop`). Rows without a population are skipped.
pub fn load_population(path: &Path) -> Result<PopulationTable, StoreError> {
    let schema = input::population_schema();
    let mut table = PopulationTable::new();

    for batch in read_csv(path, &schema, utf8)? {
        let cols = Columns::new(&batch, path);
        let regions = cols.strings("state")?;
        let populations = cols.ints("pop")?;
        for (region, pop) in regions.into_iter().zip(populations) {
            match (region, pop.and_then(|p| u64::try_from(p).ok())) {
                (Some(region), Some(pop)) => table.insert(region, pop),
                (region, _) => warn!(?region, "skipping population row without a value"),
            }
        }
    }

    info!(regions = table.len(), "loaded population table");
    Ok(table)
}
