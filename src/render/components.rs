use bevy::prelude::*;
use bevy_camera::Viewport;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Component, Clone, Copy, Hash, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ChartId(pub u64);

impl Default for ChartId {
    fn default() -> Self {
        static CTR: AtomicU32 = AtomicU32::new(1);
        Self(CTR.fetch_add(1, Ordering::Relaxed).into())
    }
}

impl ChartId {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One chart's screen tile.
#[derive(Component)]
pub struct ChartTile {
    pub id: ChartId,
    pub index: usize,
}

/// Pan/zoom state of a tile. `offset` is in world pixels, `scale` maps data
/// units to world pixels.
#[derive(Component, Clone, Copy)]
pub struct TileView {
    pub offset: Vec2,
    pub scale: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for TileView {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            min_scale: 0.1,
            max_scale: 100.0,
        }
    }
}

#[derive(Component)]
pub struct TileRect {
    pub world_center: Vec2,
    pub world_size: Vec2,
    /// Inset area reserved for chart content; overlays like the legend are
    /// anchored to this rect rather than the tile edge.
    pub content: Rect,
    pub viewport: Viewport,
}

#[derive(Component)]
pub struct TileRenderRoot;

#[derive(Component)]
pub struct TileCamera;

/// Marker for crosshair parent entity
#[derive(Component)]
pub struct Crosshair {
    pub tile_index: usize,
}

/// Marker for crosshair horizontal line
#[derive(Component)]
pub struct CrosshairHLine;

/// Marker for crosshair vertical line
#[derive(Component)]
pub struct CrosshairVLine;

/// Marker for the stage/coordinate readout next to the crosshair
#[derive(Component)]
pub struct CrosshairCoordText;

/// Marker to track if a tile has been auto-fitted to its data
#[derive(Component)]
pub struct AutoFitted;
