use bevy::prelude::*;

use crate::core::Figure;
use crate::render::{FigureRenderPlugin, FigureRes};

#[cfg(not(target_arch = "wasm32"))]
pub fn run_figure(figure: Figure) {
    let bg = figure.background;
    App::new()
        .insert_resource(ClearColor(Color::srgb(bg.r, bg.g, bg.b)))
        .insert_resource(FigureRes::new(figure))
        .add_plugins((
            DefaultPlugins.set(ImagePlugin::default_nearest()),
            FigureRenderPlugin,
        ))
        .run();
}

#[cfg(target_arch = "wasm32")]
pub fn run_figure(figure: Figure, canvas_id: &str) {
    let bg = figure.background;
    App::new()
        .insert_resource(ClearColor(Color::srgb(bg.r, bg.g, bg.b)))
        .insert_resource(FigureRes::new(figure))
        .add_plugins((
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        canvas: Some(format!("#{}", canvas_id)),
                        fit_canvas_to_parent: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
            FigureRenderPlugin,
        ))
        .run();
}
