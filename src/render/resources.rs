use super::components::ChartId;
use bevy::prelude::*;
use bevy_camera::visibility::RenderLayers;
use std::collections::{HashMap, VecDeque};

#[derive(Resource, Clone)]
pub struct FigureRes(pub crate::core::Figure);

impl FigureRes {
    pub fn new(figure: crate::core::Figure) -> Self {
        Self(figure)
    }
}

#[derive(Resource, Default)]
pub struct TileRegistry {
    pub by_chart: HashMap<ChartId, Entity>,
    pub camera_of: HashMap<ChartId, Entity>,
    pub dirty: VecDeque<ChartId>,
}

#[derive(Resource, Default)]
pub struct HoveredTile(pub Option<usize>);

#[derive(Resource, Default)]
pub struct CursorWorldPos {
    /// World position of cursor (if over a tile)
    pub position: Option<Vec2>,
    /// Data coordinates (converted from world coords)
    pub data_coords: Option<Vec2>,
    /// Which tile the cursor is over
    pub tile_index: Option<usize>,
}

#[derive(Resource)]
pub struct UnitMeshes {
    pub quad: Handle<Mesh>,
    pub disc: Handle<Mesh>,
}

pub fn setup_global_scene(mut commands: Commands) {
    // Background camera on layer 0, rendered before the tile cameras
    // (order 10+). It clears the whole window, including the margins no
    // tile viewport covers.
    commands.spawn((
        Camera2d::default(),
        Camera {
            order: 0,
            ..default()
        },
        RenderLayers::layer(0),
    ));

    info!("figure renderer initialized");
}

pub fn setup_unit_meshes(mut commands: Commands, mut meshes: ResMut<Assets<Mesh>>) {
    let quad = meshes.add(Mesh::from(Rectangle::new(1.0, 1.0)));
    let disc = meshes.add(Mesh::from(Circle::new(0.5)));
    commands.insert_resource(UnitMeshes { quad, disc });
}
