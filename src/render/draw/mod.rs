//! Drawing functions for step charts.
//!
//! This module is organized into focused submodules:
//! - `common`: Shared utilities (borders, transforms, grid lines, axis ticks)
//! - `steps`: The step-after trace with its stage midpoint markers
//! - `legend`: The per-tile legend overlay

mod common;
mod legend;
mod steps;

// Re-export public drawing functions
pub use common::{
    dash_spans, data_to_world, draw_axis_ticks, draw_chart_title, draw_grid_lines,
    draw_tile_border, format_tick, nice_step, world_to_data,
};
pub use legend::draw_legend;
pub use steps::draw_step_chart;
