use std::sync::Arc;

use crate::model::{DisplaySet, Viewport};
use crate::runtime::AppContext;

use super::{CommandError, Result};

/// The requested viewport, or the active one when no id is given.
pub fn resolve_viewport(context: &AppContext, viewport_id: Option<&str>) -> Result<Viewport> {
    let grid = context.viewport_grid_service();
    let viewport_id = match viewport_id {
        Some(viewport_id) => viewport_id.to_string(),
        None => grid
            .active_viewport_id()
            .ok_or(CommandError::NoActiveViewport)?,
    };
    grid.viewport(&viewport_id)
        .ok_or(CommandError::ViewportNotFound(viewport_id))
}

pub(crate) fn display_set(context: &AppContext, display_set_uid: &str) -> Result<Arc<DisplaySet>> {
    context
        .display_set_service()
        .display_set(display_set_uid)
        .ok_or_else(|| CommandError::DisplaySetNotFound(display_set_uid.to_string()))
}
