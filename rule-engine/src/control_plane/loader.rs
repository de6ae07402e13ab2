//! Startup load of the indexes from the store.

use crate::control_plane::registrar::RuleRegistrar;
use crate::error::EngineError;
use crate::observability::events;
use crate::store::EntityStore;
use tracing::{debug, error, info};

const COMPONENT: &str = "loader";

/// Enumerates every cell and registers its rules. One cell's failure is
/// logged and does not stop the others; a failure to enumerate cells at
/// all aborts startup.
pub(crate) async fn load_all(
    store: &dyn EntityStore,
    registrar: &RuleRegistrar,
) -> Result<(), EngineError> {
    let cells = store.list_cells().await?;
    info!(
        event = events::LOAD_START,
        component = COMPONENT,
        cell_count = cells.len(),
        "loading rules from the store"
    );

    let mut loaded = 0usize;
    for cell in &cells {
        match registrar.load_cell(cell).await {
            Ok(()) => {
                loaded += 1;
                debug!(
                    event = events::LOAD_CELL_OK,
                    component = COMPONENT,
                    cell_id = cell.id.as_str(),
                    cell_name = cell.name.as_str(),
                    "loaded cell"
                );
            }
            Err(err) => error!(
                event = events::LOAD_CELL_FAILED,
                component = COMPONENT,
                cell_id = cell.id.as_str(),
                cell_name = cell.name.as_str(),
                err = %err,
                "skipping cell"
            ),
        }
    }

    info!(
        event = events::LOAD_DONE,
        component = COMPONENT,
        loaded,
        cell_count = cells.len(),
        "initial load finished"
    );
    Ok(())
}
