use super::*;
use crate::core::StepChart;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_camera::visibility::RenderLayers;
use bevy_camera::{OrthographicProjection, Projection, ScalingMode, Viewport};
use bevy_math::UVec2;
use std::collections::HashSet;

/// Core system: sync figure charts to tile entities
pub fn sync_charts_to_tiles(
    mut commands: Commands,
    fig: Res<FigureRes>,
    mut registry: ResMut<TileRegistry>,
    existing: Query<(Entity, &ChartTile)>,
) {
    let chart_ids: Vec<ChartId> = fig
        .0
        .charts
        .iter()
        .enumerate()
        .map(|(i, _)| ChartId(i as u64))
        .collect();

    // Remove tiles for charts that no longer exist
    for (entity, tile) in existing.iter() {
        if !chart_ids.contains(&tile.id) {
            cleanup_tile(&mut commands, &mut registry, entity, tile.id);
        }
    }

    // Create missing tiles
    for (i, _chart) in fig.0.charts.iter().enumerate() {
        let id = ChartId(i as u64);

        if !registry.by_chart.contains_key(&id) {
            let tile = spawn_tile(&mut commands, id, i);
            registry.by_chart.insert(id, tile);
            registry.dirty.push_back(id);
            debug!("spawned tile {i} for chart {:?}", id);
        }
    }
}

fn spawn_tile(commands: &mut Commands, id: ChartId, index: usize) -> Entity {
    let tile = commands
        .spawn((
            ChartTile { id, index },
            TileView::default(),
            TileRect {
                world_center: Vec2::ZERO,
                world_size: Vec2::new(100.0, 100.0),
                content: Rect::from_center_size(Vec2::ZERO, Vec2::new(70.0, 70.0)),
                viewport: Viewport {
                    physical_position: UVec2::ZERO,
                    physical_size: UVec2::new(100, 100),
                    depth: 0.0..1.0,
                },
            },
            Transform::default(),
            Visibility::default(),
        ))
        .id();

    let root = commands
        .spawn((TileRenderRoot, Transform::default(), Visibility::default()))
        .id();
    commands.entity(tile).add_child(root);

    tile
}

/// Update tile layout when window resizes
pub fn update_tile_layout(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut registry: ResMut<TileRegistry>,
    mut tiles: Query<(&ChartTile, &mut TileRect)>,
    fig: Res<FigureRes>,
) {
    let Ok(window) = windows.single() else {
        return;
    };

    let n = fig.0.charts.len();
    if n == 0 {
        return;
    }

    let (cols, rows) = layout_dims(n, fig.0.columns, window.width() / window.height());

    let margin = 20.0;
    let gap = 10.0;

    let avail_w = window.width() - 2.0 * margin;
    let avail_h = window.height() - 2.0 * margin;

    let tile_w = (avail_w - (cols - 1) as f32 * gap) / cols as f32;
    let tile_h = (avail_h - (rows - 1) as f32 * gap) / rows as f32;

    for (tile, mut rect) in tiles.iter_mut() {
        let col = tile.index % cols;
        let row = tile.index / cols;

        let vp_x = margin + col as f32 * (tile_w + gap);
        let vp_y = margin + row as f32 * (tile_h + gap);

        // Viewports are specified in physical pixels
        let scale = window.resolution.scale_factor() as f32;
        let phys_pos = UVec2::new((vp_x * scale).round() as u32, (vp_y * scale).round() as u32);
        let phys_size = UVec2::new(
            (tile_w * scale).round() as u32,
            (tile_h * scale).round() as u32,
        );

        // World coordinates (centered origin)
        let world_center = Vec2::new(
            vp_x + tile_w * 0.5 - window.width() * 0.5,
            window.height() * 0.5 - vp_y - tile_h * 0.5,
        );

        let new_size = Vec2::new(tile_w, tile_h);

        // Only mark dirty if layout actually changed
        let changed = rect.world_center != world_center
            || rect.world_size != new_size
            || rect.viewport.physical_position != phys_pos
            || rect.viewport.physical_size != phys_size;

        if changed {
            rect.world_center = world_center;
            rect.world_size = new_size;
            rect.content =
                Rect::from_center_size(world_center, Vec2::new(tile_w - 30.0, tile_h - 30.0));
            rect.viewport = Viewport {
                physical_position: phys_pos,
                physical_size: phys_size,
                depth: 0.0..1.0,
            };

            registry.dirty.push_back(tile.id);
        }
    }
}

/// Create/update cameras for each tile
pub fn sync_tile_cameras(
    mut commands: Commands,
    mut registry: ResMut<TileRegistry>,
    tiles: Query<(&ChartTile, &TileRect)>,
    existing: Query<Entity, With<TileCamera>>,
) {
    let mut used = HashSet::new();

    for (tile, rect) in tiles.iter() {
        let layers = tile_layer(tile.index);

        let cam_entity = if let Some(&cam) = registry.camera_of.get(&tile.id) {
            cam
        } else {
            let cam = commands.spawn((TileCamera, Transform::default())).id();
            registry.camera_of.insert(tile.id, cam);
            cam
        };

        used.insert(cam_entity);

        let mut ortho = OrthographicProjection::default_2d();
        ortho.scaling_mode = ScalingMode::FixedVertical {
            viewport_height: rect.world_size.y,
        };

        commands.entity(cam_entity).insert((
            Camera2d::default(),
            Camera {
                viewport: Some(rect.viewport.clone()),
                order: 10 + tile.index as isize,
                ..default()
            },
            Projection::from(ortho),
            Transform::from_translation(rect.world_center.extend(1000.0)),
            layers,
        ));
    }

    // Despawn cameras no longer used
    for cam_entity in existing.iter() {
        if !used.contains(&cam_entity) {
            commands.entity(cam_entity).despawn();
        }
    }
}

/// Handle hover detection
pub fn update_hovered_tile(
    windows: Query<&Window>,
    tiles: Query<(&ChartTile, &TileRect)>,
    mut hovered: ResMut<HoveredTile>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };

    hovered.0 = tiles
        .iter()
        .find(|(_, rect)| {
            let half = rect.world_size * 0.5;
            let min = rect.world_center - half;
            let max = rect.world_center + half;

            let world_x = cursor.x - window.width() * 0.5;
            let world_y = window.height() * 0.5 - cursor.y;

            world_x >= min.x && world_x <= max.x && world_y >= min.y && world_y <= max.y
        })
        .map(|(tile, _)| tile.index);
}

/// Apply mouse pan/zoom to the hovered tile, honoring the chart's
/// interaction flags
pub fn handle_input(
    mut tiles: Query<(&ChartTile, &mut TileView)>,
    mut registry: ResMut<TileRegistry>,
    fig: Res<FigureRes>,
    hovered: Res<HoveredTile>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut wheel: MessageReader<MouseWheel>,
    mut motion: MessageReader<MouseMotion>,
) {
    // Collect events first (they can only be read once)
    let mut zoom_delta = 0.0;
    for event in wheel.read() {
        zoom_delta += event.y;
    }

    let mut pan_delta = Vec2::ZERO;
    if mouse.pressed(MouseButton::Left) {
        for event in motion.read() {
            pan_delta += event.delta;
        }
    }

    let Some(hovered_index) = hovered.0 else { return };

    // Only modify the hovered tile
    for (tile, mut view) in tiles.iter_mut() {
        if tile.index != hovered_index {
            continue;
        }

        let Some(chart) = fig.0.charts.get(tile.index) else {
            continue;
        };

        let mut changed = false;

        if chart.interaction.zoom && zoom_delta != 0.0 {
            view.scale *= 1.0 + zoom_delta * 0.05;
            view.scale = view.scale.clamp(view.min_scale, view.max_scale);
            changed = true;
        }

        // Pan offset is in world coordinates, so don't divide by scale
        if chart.interaction.pan && pan_delta != Vec2::ZERO {
            view.offset.x += pan_delta.x;
            view.offset.y -= pan_delta.y;
            changed = true;
        }

        if changed {
            registry.dirty.push_back(tile.id);
        }
    }
}

/// Auto-fit tiles to their data bounds on first render
pub fn auto_fit_tiles(
    mut commands: Commands,
    mut registry: ResMut<TileRegistry>,
    mut tiles: Query<(Entity, &ChartTile, &TileRect, &mut TileView), Without<AutoFitted>>,
    fig: Res<FigureRes>,
) {
    for (entity, tile, rect, mut view) in tiles.iter_mut() {
        let Some(chart) = fig.0.charts.get(tile.index) else {
            continue;
        };

        let Some((min, max)) = chart.bounds() else {
            // Nothing to fit; keep the default view
            commands.entity(entity).insert(AutoFitted);
            continue;
        };

        let data_width = (max[0] - min[0]).max(0.01);
        let data_height = (max[1] - min[1]).max(0.01);
        let data_center = Vec2::new((min[0] + max[0]) * 0.5, (min[1] + max[1]) * 0.5);

        // Fit the full step path into 85% of the tile, centered
        let padding = 0.85;
        let available_size = rect.world_size * padding;
        let scale_x = available_size.x / data_width;
        let scale_y = available_size.y / data_height;
        let fit_scale = scale_x.min(scale_y);

        view.scale = fit_scale;
        view.offset = -data_center * fit_scale;
        view.min_scale = fit_scale * 0.5;
        view.max_scale = fit_scale * 4.0;

        commands.entity(entity).insert(AutoFitted);
        registry.dirty.push_back(tile.id);
    }
}

/// Draw only dirty tiles
pub fn draw_dirty_tiles(
    mut commands: Commands,
    mut registry: ResMut<TileRegistry>,
    tiles: Query<(Entity, &ChartTile, &TileRect, &TileView)>,
    children_q: Query<&Children>,
    is_root_q: Query<(), With<TileRenderRoot>>,
    fig: Res<FigureRes>,
    unit: Res<UnitMeshes>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    while let Some(id) = registry.dirty.pop_front() {
        // ChartId -> tile entity
        let Some(&tile_entity) = registry.by_chart.get(&id) else {
            continue;
        };

        // Pull current tile state
        let Ok((_e, tile, rect, view)) = tiles.get(tile_entity) else {
            continue;
        };

        // 1) Remove previous render root(s) under this tile (but keep the tile!)
        if let Ok(children) = children_q.get(tile_entity) {
            for child in children.iter() {
                if is_root_q.get(child).is_ok() {
                    // Despawning an entity removes its descendants via relationships.
                    // try_despawn tolerates roots that are already gone.
                    commands.entity(child).try_despawn();
                }
            }
        }

        // 2) Create a fresh render root under the tile
        let root = commands
            .spawn((TileRenderRoot, Transform::default(), Visibility::default()))
            .id();
        commands.entity(tile_entity).add_child(root);

        // 3) Draw the chart, then its axis ticks and value labels
        if let Some(chart) = fig.0.charts.get(tile.index) {
            let layer = tile_layer(tile.index);
            draw_step_chart(
                &mut commands,
                root,
                chart,
                rect,
                view,
                &unit,
                &mut meshes,
                &mut materials,
                layer.clone(),
            );
            draw_axis_ticks(&mut commands, root, rect, view, &unit, &mut materials, layer);
        }
    }
}

// Utility functions for grid layout
fn grid_dims(n: usize, aspect: f32) -> (usize, usize) {
    match n {
        0 => (0, 0),
        1 => (1, 1),
        2 => {
            if aspect > 1.35 {
                (2, 1)
            } else {
                (1, 2)
            }
        }
        3 => {
            if aspect > 1.35 {
                (3, 1)
            } else {
                (2, 2)
            }
        }
        _ => {
            let cols = (n as f32).sqrt().ceil() as usize;
            let rows = (n + cols - 1) / cols;
            (cols, rows)
        }
    }
}

/// Grid dimensions for `n` tiles, honoring an explicit column count when set.
fn layout_dims(n: usize, columns: Option<usize>, aspect: f32) -> (usize, usize) {
    match columns {
        Some(c) => {
            let cols = c.clamp(1, n);
            let rows = (n + cols - 1) / cols;
            (cols, rows)
        }
        None => grid_dims(n, aspect),
    }
}

/// Layer 0 belongs to the background camera; tiles cycle through 1..=31.
/// RenderLayers has 32 usable layers by default.
fn tile_layer_index(index: usize) -> usize {
    1 + index % 31
}

fn tile_layer(index: usize) -> RenderLayers {
    RenderLayers::layer(tile_layer_index(index))
}

fn cleanup_tile(commands: &mut Commands, registry: &mut TileRegistry, entity: Entity, id: ChartId) {
    commands.entity(entity).despawn();
    registry.by_chart.remove(&id);
    registry.camera_of.remove(&id);
}

/// Convert world coordinates back to data coordinates
fn world_to_data(world: Vec2, rect: &TileRect, view: &TileView) -> Vec2 {
    (world - rect.world_center - view.offset) / view.scale
}

/// Convert data coordinates to world coordinates
fn data_to_world_sys(data: Vec2, rect: &TileRect, view: &TileView) -> Vec2 {
    rect.world_center + view.offset + data * view.scale
}

/// Find the measurement midpoint nearest to the cursor, along with the label
/// of its stage when the series carries labels
fn find_nearest_midpoint(cursor_data: Vec2, chart: &StepChart) -> Option<(Vec2, Option<&str>)> {
    let mut nearest: Option<(Vec2, Option<&str>, f32)> = None;

    for trace in &chart.traces {
        let d = trace.series.stage_duration();
        for (i, &v) in trace.series.readings().iter().enumerate() {
            let pt = Vec2::new((i as f32 + 0.5) * d, v);
            let dist_sq = (pt.x - cursor_data.x).powi(2) + (pt.y - cursor_data.y).powi(2);
            let should_update = match &nearest {
                Some((_, _, best_dist)) => dist_sq < *best_dist,
                None => true,
            };
            if should_update {
                nearest = Some((pt, trace.series.label(i), dist_sq));
            }
        }
    }

    nearest.map(|(pt, label, _)| (pt, label))
}

/// Update crosshair position and visibility - snaps to the nearest midpoint
pub fn update_crosshair(
    mut commands: Commands,
    windows: Query<&Window, With<PrimaryWindow>>,
    tiles: Query<(&ChartTile, &TileRect, &TileView)>,
    hovered: Res<HoveredTile>,
    fig: Res<FigureRes>,
    mut cursor_pos: ResMut<CursorWorldPos>,
    crosshairs: Query<(Entity, &Crosshair)>,
    unit: Res<UnitMeshes>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };

    // Crosshairs are rebuilt from scratch every frame
    for (entity, _) in crosshairs.iter() {
        commands.entity(entity).try_despawn();
    }

    let Some(cursor_screen) = window.cursor_position() else {
        cursor_pos.position = None;
        cursor_pos.data_coords = None;
        cursor_pos.tile_index = None;
        return;
    };

    // Convert screen coords to world coords
    let world_x = cursor_screen.x - window.width() * 0.5;
    let world_y = window.height() * 0.5 - cursor_screen.y;
    let cursor_world = Vec2::new(world_x, world_y);

    cursor_pos.position = Some(cursor_world);
    cursor_pos.tile_index = hovered.0;

    let Some(hovered_index) = hovered.0 else {
        return;
    };

    for (tile, rect, view) in tiles.iter() {
        if tile.index != hovered_index {
            continue;
        }

        let Some(chart) = fig.0.charts.get(tile.index) else {
            continue;
        };

        let cursor_data = world_to_data(cursor_world, rect, view);

        // Snap to the nearest measurement; charts with no traces fall back
        // to the raw cursor position
        let (snap_data, stage_label) =
            find_nearest_midpoint(cursor_data, chart).unwrap_or((cursor_data, None));
        let snap_world = data_to_world_sys(snap_data, rect, view);

        cursor_pos.data_coords = Some(snap_data);

        spawn_dashed_crosshair(
            &mut commands,
            tile.index,
            rect,
            snap_world,
            snap_data,
            stage_label,
            &unit,
            &mut materials,
            tile_layer(tile.index),
        );
    }
}

fn spawn_dashed_crosshair(
    commands: &mut Commands,
    tile_index: usize,
    rect: &TileRect,
    snap_world: Vec2,
    snap_data: Vec2,
    stage_label: Option<&str>,
    unit: &UnitMeshes,
    materials: &mut Assets<ColorMaterial>,
    layers: RenderLayers,
) {
    let crosshair_mat = materials.add(ColorMaterial::from(Color::srgba(1.0, 1.0, 1.0, 0.5)));
    let line_thickness = 1.0;
    let dash_length = 4.0;
    let gap_length = 3.0;

    commands
        .spawn((
            Crosshair { tile_index },
            Transform::default(),
            Visibility::Visible,
            InheritedVisibility::default(),
            ViewVisibility::default(),
        ))
        .with_children(|parent| {
            // Dashed vertical line
            let v_start = rect.world_center.y - rect.world_size.y * 0.5;
            let v_end = rect.world_center.y + rect.world_size.y * 0.5;
            for (start, stop) in dash_spans(v_start, v_end, dash_length, gap_length) {
                parent.spawn((
                    Mesh2d(unit.quad.clone()),
                    MeshMaterial2d(crosshair_mat.clone()),
                    Transform {
                        translation: Vec3::new(snap_world.x, (start + stop) * 0.5, 5.0),
                        scale: Vec3::new(line_thickness, stop - start, 1.0),
                        ..default()
                    },
                    CrosshairVLine,
                    layers.clone(),
                ));
            }

            // Dashed horizontal line
            let h_start = rect.world_center.x - rect.world_size.x * 0.5;
            let h_end = rect.world_center.x + rect.world_size.x * 0.5;
            for (start, stop) in dash_spans(h_start, h_end, dash_length, gap_length) {
                parent.spawn((
                    Mesh2d(unit.quad.clone()),
                    MeshMaterial2d(crosshair_mat.clone()),
                    Transform {
                        translation: Vec3::new((start + stop) * 0.5, snap_world.y, 5.0),
                        scale: Vec3::new(stop - start, line_thickness, 1.0),
                        ..default()
                    },
                    CrosshairHLine,
                    layers.clone(),
                ));
            }

            // Marker ring at the snapped measurement
            let point_mat = materials.add(ColorMaterial::from(Color::srgba(1.0, 1.0, 1.0, 0.95)));
            parent.spawn((
                Mesh2d(unit.disc.clone()),
                MeshMaterial2d(point_mat),
                Transform {
                    translation: Vec3::new(snap_world.x, snap_world.y, 5.5),
                    scale: Vec3::splat(6.0),
                    ..default()
                },
                layers.clone(),
            ));

            // Stage label (when known) above the time/current readout
            let readout = match stage_label {
                Some(label) => format!("{label}\n({:.2}, {:.2})", snap_data.x, snap_data.y),
                None => format!("({:.2}, {:.2})", snap_data.x, snap_data.y),
            };
            parent.spawn((
                Text2d::new(readout),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                TextColor(Color::srgba(1.0, 1.0, 1.0, 0.9)),
                Transform::from_translation(Vec3::new(
                    snap_world.x + 10.0,
                    snap_world.y + 12.0,
                    6.0,
                )),
                CrosshairCoordText,
                layers,
            ));
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StageSeries, StepTrace};

    #[test]
    fn test_grid_dims_single_tile() {
        assert_eq!(grid_dims(1, 1.6), (1, 1));
    }

    #[test]
    fn test_grid_dims_two_tiles_follow_aspect() {
        assert_eq!(grid_dims(2, 1.6), (2, 1));
        assert_eq!(grid_dims(2, 1.0), (1, 2));
    }

    #[test]
    fn test_grid_dims_many_tiles_near_square() {
        assert_eq!(grid_dims(5, 1.0), (3, 2));
        assert_eq!(grid_dims(9, 1.0), (3, 3));
    }

    #[test]
    fn test_layout_dims_explicit_columns() {
        assert_eq!(layout_dims(4, Some(2), 1.6), (2, 2));
        assert_eq!(layout_dims(4, None, 1.6), (2, 2));
        // More columns than charts collapses to one row
        assert_eq!(layout_dims(3, Some(8), 1.6), (3, 1));
    }

    #[test]
    fn test_tile_layers_skip_background_layer() {
        assert_eq!(tile_layer_index(0), 1);
        assert_eq!(tile_layer_index(30), 31);
        assert_eq!(tile_layer_index(31), 1);
    }

    #[test]
    fn test_world_data_round_trip() {
        let rect = TileRect {
            world_center: Vec2::new(50.0, -20.0),
            world_size: Vec2::new(400.0, 300.0),
            content: Rect::from_center_size(Vec2::new(50.0, -20.0), Vec2::new(370.0, 270.0)),
            viewport: Viewport {
                physical_position: UVec2::ZERO,
                physical_size: UVec2::new(400, 300),
                depth: 0.0..1.0,
            },
        };
        let view = TileView {
            offset: Vec2::new(12.0, -7.0),
            scale: 3.0,
            min_scale: 0.1,
            max_scale: 100.0,
        };
        let data = Vec2::new(22.5, 4.77);
        let back = world_to_data(data_to_world_sys(data, &rect, &view), &rect, &view);
        assert!((back - data).length() < 1e-4);
    }

    #[test]
    fn test_nearest_midpoint_snaps_to_stage_and_label() {
        let series =
            StageSeries::with_labels(vec![58.7, 4.77], 5.0, ["On", "Power-down"]).unwrap();
        let chart = StepChart::new().with_trace(StepTrace::new(series));

        let (pt, label) = find_nearest_midpoint(Vec2::new(7.0, 10.0), &chart).unwrap();
        assert_eq!(pt, Vec2::new(7.5, 4.77));
        assert_eq!(label, Some("Power-down"));
    }

    #[test]
    fn test_nearest_midpoint_empty_chart() {
        assert!(find_nearest_midpoint(Vec2::ZERO, &StepChart::new()).is_none());
    }
}
