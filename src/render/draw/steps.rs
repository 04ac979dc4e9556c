//! Step chart rendering: step-after traces, stage markers, baseline fills.

#![allow(clippy::too_many_arguments)]

use super::common::{data_to_world, draw_chart_title, draw_grid_lines, draw_tile_border};
use super::legend::draw_legend;
use crate::render::{TileRect, TileView, UnitMeshes};
use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_camera::visibility::RenderLayers;
use bevy_mesh::{Indices, PrimitiveTopology};

/// Draw a step chart: grid, axes, then every trace as a step-after line
/// with markers at the stage midpoints.
pub fn draw_step_chart(
    commands: &mut Commands,
    root: Entity,
    chart: &crate::core::StepChart,
    rect: &TileRect,
    view: &TileView,
    unit: &UnitMeshes,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    layers: RenderLayers,
) {
    draw_tile_border(
        commands,
        root,
        rect,
        unit,
        materials,
        layers.clone(),
        Color::srgb(0.3, 0.3, 0.4),
        1.0,
    );

    if chart.grid.visible {
        draw_grid_lines(
            commands,
            root,
            rect,
            view,
            unit,
            materials,
            layers.clone(),
            chart.grid.alpha,
        );
    }

    // Draw axis at data origin (0,0) - moves with pan/zoom
    let axis_mat = materials.add(ColorMaterial::from(Color::srgb(0.5, 0.5, 0.5)));
    let axis_origin = data_to_world(Vec2::ZERO, rect, view);

    commands.entity(root).with_children(|parent| {
        // X-axis (horizontal line at y=0)
        parent.spawn((
            Mesh2d(unit.quad.clone()),
            MeshMaterial2d(axis_mat.clone()),
            Transform {
                translation: Vec3::new(rect.world_center.x, axis_origin.y, 0.5),
                scale: Vec3::new(rect.world_size.x, 1.0, 1.0),
                ..default()
            },
            layers.clone(),
        ));

        // Y-axis (vertical line at x=0)
        parent.spawn((
            Mesh2d(unit.quad.clone()),
            MeshMaterial2d(axis_mat),
            Transform {
                translation: Vec3::new(axis_origin.x, rect.world_center.y, 0.5),
                scale: Vec3::new(1.0, rect.world_size.y, 1.0),
                ..default()
            },
            layers.clone(),
        ));
    });

    // Draw axis labels
    if let Some(ref x_label) = chart.x_label {
        commands.entity(root).with_children(|parent| {
            parent.spawn((
                Text2d::new(x_label.clone()),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::srgb(0.8, 0.8, 0.8)),
                Transform::from_translation(Vec3::new(
                    rect.world_center.x,
                    rect.world_center.y - rect.world_size.y * 0.5 + 12.0,
                    2.0,
                )),
                layers.clone(),
            ));
        });
    }

    if let Some(ref y_label) = chart.y_label {
        commands.entity(root).with_children(|parent| {
            parent.spawn((
                Text2d::new(y_label.clone()),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::srgb(0.8, 0.8, 0.8)),
                Transform {
                    translation: Vec3::new(
                        rect.world_center.x - rect.world_size.x * 0.5 + 12.0,
                        rect.world_center.y,
                        2.0,
                    ),
                    rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                    ..default()
                },
                layers.clone(),
            ));
        });
    }

    for trace in &chart.traces {
        let path = trace.series.step_path();

        if let Some(opacity) = trace.fill_opacity {
            draw_step_fill(
                commands,
                root,
                &path,
                trace.line_style.color,
                opacity,
                rect,
                view,
                meshes,
                materials,
                &layers,
            );
        }

        let line_color = Color::srgba(
            trace.line_style.color.r,
            trace.line_style.color.g,
            trace.line_style.color.b,
            trace.line_style.opacity,
        );
        let line_mat = materials.add(ColorMaterial::from(line_color));
        draw_step_line(
            commands,
            root,
            &path,
            trace.line_style.size,
            rect,
            view,
            unit,
            &line_mat,
            &layers,
        );

        let marker_color = Color::srgba(
            trace.marker_style.color.r,
            trace.marker_style.color.g,
            trace.marker_style.color.b,
            trace.marker_style.opacity,
        );
        let marker_mat = materials.add(ColorMaterial::from(marker_color));
        draw_stage_markers(
            commands,
            root,
            &trace.series.midpoints(),
            trace.marker_style.size,
            rect,
            view,
            unit,
            &marker_mat,
            &layers,
        );
    }

    draw_chart_title(commands, root, &chart.meta, rect, layers.clone());

    if chart.traces.iter().any(|t| t.label.is_some()) {
        draw_legend(commands, root, chart, rect, unit, materials, layers);
    }
}

fn draw_step_line(
    commands: &mut Commands,
    root: Entity,
    path: &[Vec2],
    thickness: f32,
    rect: &TileRect,
    view: &TileView,
    unit: &UnitMeshes,
    mat: &Handle<ColorMaterial>,
    layers: &RenderLayers,
) {
    if path.len() < 2 {
        return;
    }

    // Compute tile bounds for culling
    let half_size = rect.world_size * 0.5;
    let bounds_min = rect.world_center - half_size;
    let bounds_max = rect.world_center + half_size;

    for window in path.windows(2) {
        let a = data_to_world(window[0], rect, view);
        let b = data_to_world(window[1], rect, view);

        // Skip segments entirely outside tile bounds
        if (a.x < bounds_min.x && b.x < bounds_min.x)
            || (a.x > bounds_max.x && b.x > bounds_max.x)
            || (a.y < bounds_min.y && b.y < bounds_min.y)
            || (a.y > bounds_max.y && b.y > bounds_max.y)
        {
            continue;
        }

        let length = a.distance(b);

        // Equal consecutive readings produce a zero-length riser
        if length < f32::EPSILON {
            continue;
        }

        let angle = (b.y - a.y).atan2(b.x - a.x);

        commands.entity(root).with_children(|parent| {
            parent.spawn((
                Mesh2d(unit.quad.clone()),
                MeshMaterial2d(mat.clone()),
                Transform {
                    translation: ((a + b) * 0.5).extend(0.55),
                    rotation: Quat::from_rotation_z(angle),
                    scale: Vec3::new(length, thickness, 1.0),
                },
                layers.clone(),
            ));
        });
    }
}

fn draw_stage_markers(
    commands: &mut Commands,
    root: Entity,
    midpoints: &[Vec2],
    size: f32,
    rect: &TileRect,
    view: &TileView,
    unit: &UnitMeshes,
    mat: &Handle<ColorMaterial>,
    layers: &RenderLayers,
) {
    let radius = size * 0.5;

    // Compute tile bounds for culling
    let half_size = rect.world_size * 0.5;
    let bounds_min = rect.world_center - half_size;
    let bounds_max = rect.world_center + half_size;

    for &pt in midpoints {
        let world_pos = data_to_world(pt, rect, view);

        // Skip markers entirely outside tile bounds
        if world_pos.x + radius < bounds_min.x || world_pos.x - radius > bounds_max.x {
            continue;
        }
        if world_pos.y + radius < bounds_min.y || world_pos.y - radius > bounds_max.y {
            continue;
        }

        commands.entity(root).with_children(|parent| {
            parent.spawn((
                Mesh2d(unit.disc.clone()),
                MeshMaterial2d(mat.clone()),
                Transform {
                    translation: world_pos.extend(0.65),
                    scale: Vec3::splat(size),
                    ..default()
                },
                layers.clone(),
            ));
        });
    }
}

fn draw_step_fill(
    commands: &mut Commands,
    root: Entity,
    path: &[Vec2],
    color: crate::core::Color,
    opacity: f32,
    rect: &TileRect,
    view: &TileView,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    layers: &RenderLayers,
) {
    let n = path.len();
    if n < 2 {
        return;
    }

    // Build triangle mesh between the step path and the y=0 baseline
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(n * 2);
    let mut indices: Vec<u32> = Vec::with_capacity((n - 1) * 6);

    // Add all vertices: path points first, then their baseline counterparts
    for &pt in path {
        let up = data_to_world(pt, rect, view);
        positions.push([up.x, up.y, 0.0]);
    }
    for &pt in path {
        let lo = data_to_world(Vec2::new(pt.x, 0.0), rect, view);
        positions.push([lo.x, lo.y, 0.0]);
    }

    // Create triangles for each segment
    for i in 0..(n - 1) {
        let u0 = i as u32;
        let u1 = (i + 1) as u32;
        let l0 = (n + i) as u32;
        let l1 = (n + i + 1) as u32;

        // Two triangles per segment (CCW winding for front-facing)
        indices.extend_from_slice(&[u0, l1, l0]);
        indices.extend_from_slice(&[u0, u1, l1]);
    }

    let vertex_count = positions.len();
    let normals: Vec<[f32; 3]> = vec![[0.0, 0.0, 1.0]; vertex_count];
    let uvs: Vec<[f32; 2]> = vec![[0.0, 0.0]; vertex_count];

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));

    let fill_mesh = meshes.add(mesh);
    let fill_mat = materials.add(ColorMaterial::from(Color::srgba(
        color.r, color.g, color.b, opacity,
    )));

    commands.entity(root).with_children(|parent| {
        parent.spawn((
            Mesh2d(fill_mesh),
            MeshMaterial2d(fill_mat),
            Transform::from_translation(Vec3::new(0.0, 0.0, 0.05)),
            layers.clone(),
        ));
    });
}
