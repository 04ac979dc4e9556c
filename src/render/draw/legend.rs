//! Legend overlay listing the labeled traces of a chart.

use crate::render::{TileRect, UnitMeshes};
use bevy::prelude::*;
use bevy_camera::visibility::RenderLayers;

/// Draw a legend box in the top-right corner of the tile's content area,
/// one swatch-plus-label row per labeled trace. Charts whose traces carry
/// no labels get no legend.
pub fn draw_legend(
    commands: &mut Commands,
    root: Entity,
    chart: &crate::core::StepChart,
    rect: &TileRect,
    unit: &UnitMeshes,
    materials: &mut Assets<ColorMaterial>,
    layers: RenderLayers,
) {
    let entries: Vec<(&str, crate::core::Color)> = chart
        .traces
        .iter()
        .filter_map(|t| t.label.as_deref().map(|l| (l, t.marker_style.color)))
        .collect();

    if entries.is_empty() {
        return;
    }

    let row_height = 16.0;
    let swatch_size = 8.0;
    let pad = 8.0;
    let font_size = 11.0;

    // Text2d extents are not measured here, so estimate from glyph count
    let max_chars = entries
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);
    let text_width = max_chars as f32 * 6.5;
    let box_width = pad + swatch_size + 6.0 + text_width + pad;
    let box_height = entries.len() as f32 * row_height + pad;

    // Anchor to the top-right corner of the content rect so the legend
    // stays clear of the tile border and title
    let box_center = Vec2::new(
        rect.content.max.x - box_width * 0.5,
        rect.content.max.y - box_height * 0.5,
    );
    let box_left = box_center.x - box_width * 0.5;
    let box_top = box_center.y + box_height * 0.5;

    let bg_mat = materials.add(ColorMaterial::from(Color::srgba(0.1, 0.1, 0.14, 0.85)));
    let outline_mat = materials.add(ColorMaterial::from(Color::srgba(0.4, 0.4, 0.45, 0.9)));
    let swatch_mats: Vec<Handle<ColorMaterial>> = entries
        .iter()
        .map(|(_, color)| {
            materials.add(ColorMaterial::from(Color::srgba(
                color.r, color.g, color.b, 1.0,
            )))
        })
        .collect();

    commands.entity(root).with_children(|parent| {
        // Background
        parent.spawn((
            Mesh2d(unit.quad.clone()),
            MeshMaterial2d(bg_mat),
            Transform {
                translation: box_center.extend(3.0),
                scale: Vec3::new(box_width, box_height, 1.0),
                ..default()
            },
            layers.clone(),
        ));

        // Outline
        for (dx, dy) in [(0.0, 0.5), (0.0, -0.5), (-0.5, 0.0), (0.5, 0.0)] {
            parent.spawn((
                Mesh2d(unit.quad.clone()),
                MeshMaterial2d(outline_mat.clone()),
                Transform {
                    translation: Vec3::new(
                        box_center.x + dx * box_width,
                        box_center.y + dy * box_height,
                        3.1,
                    ),
                    scale: if dx == 0.0 {
                        Vec3::new(box_width, 1.0, 1.0)
                    } else {
                        Vec3::new(1.0, box_height, 1.0)
                    },
                    ..default()
                },
                layers.clone(),
            ));
        }

        // Rows: swatch on the left, label text beside it
        for (i, (label, _)) in entries.iter().enumerate() {
            let row_y = box_top - pad * 0.5 - (i as f32 + 0.5) * row_height;

            parent.spawn((
                Mesh2d(unit.quad.clone()),
                MeshMaterial2d(swatch_mats[i].clone()),
                Transform {
                    translation: Vec3::new(box_left + pad + swatch_size * 0.5, row_y, 3.2),
                    scale: Vec3::new(swatch_size, swatch_size, 1.0),
                    ..default()
                },
                layers.clone(),
            ));

            // Text2d centers on its transform; shift by half the estimated
            // label width so rows read left-aligned
            let label_width = label.chars().count() as f32 * 6.5;
            parent.spawn((
                Text2d::new((*label).to_string()),
                TextFont {
                    font_size,
                    ..default()
                },
                TextColor(Color::srgba(0.85, 0.85, 0.85, 0.95)),
                Transform::from_translation(Vec3::new(
                    box_left + pad + swatch_size + 6.0 + label_width * 0.5,
                    row_y,
                    3.3,
                )),
                layers.clone(),
            ));
        }
    });
}
