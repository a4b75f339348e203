//! Pulses the tutorial tileset's arrows and captions at 120 BPM
//!
//! Run with: cargo run --example pulse_tiles
//!
//! Space pauses the beat, Up/Down change the tempo, Enter places the
//! captions again (they start their pulse fresh on the current beat).

use beat_tiles_core::TileId;
use beat_tiles_runtime::{PulseCatalogs, PulseRuntimePlugin, PulseSet, PulseTile, TilePulses};
use bevy::prelude::*;

/// Global ids of the tutorial tiles (local 17..=22, first global id 1)
const ARROWS: [TileId; 3] = [TileId(18), TileId(19), TileId(20)];
const CAPTIONS: [(TileId, Vec2); 3] = [
    (TileId(21), Vec2::new(366.0, 42.0)),
    (TileId(22), Vec2::new(141.0, 42.0)),
    (TileId(23), Vec2::new(344.0, 42.0)),
];

#[derive(Component)]
struct Caption;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "beat_tiles - Pulse Tiles Example".to_string(),
                resolution: (800, 600).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(PulseRuntimePlugin {
            bpm: 120.0,
            ..default()
        })
        .add_systems(Startup, setup)
        .add_systems(Update, (tempo_controls, respawn_captions).before(PulseSet))
        .run();
}

fn setup(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut catalogs: ResMut<PulseCatalogs>,
) {
    commands.spawn(Camera2d);
    catalogs.push(asset_server.load("tilesets/tutorial.tiles.json"));

    let colors = [
        Color::srgb(0.9, 0.3, 0.3),
        Color::srgb(0.3, 0.9, 0.4),
        Color::srgb(0.3, 0.5, 0.9),
    ];
    for (i, (tile, color)) in ARROWS.into_iter().zip(colors).enumerate() {
        commands.spawn((
            PulseTile { tile },
            Sprite::from_color(color, Vec2::splat(80.0)),
            Transform::from_xyz(-120.0 + 120.0 * i as f32, 100.0, 0.0),
        ));
    }
    spawn_captions(&mut commands);

    info!("Space: pause, Up/Down: tempo, Enter: respawn captions");
}

fn spawn_captions(commands: &mut Commands) {
    for (i, (tile, size)) in CAPTIONS.into_iter().enumerate() {
        commands.spawn((
            Caption,
            PulseTile { tile },
            Sprite::from_color(Color::srgb(0.9, 0.9, 0.8), size),
            Transform::from_xyz(0.0, -20.0 - 70.0 * i as f32, 0.0),
        ));
    }
}

fn tempo_controls(keyboard: Res<ButtonInput<KeyCode>>, mut pulses: ResMut<TilePulses>) {
    let clock = pulses.clock_mut();

    if keyboard.just_pressed(KeyCode::Space) {
        if clock.is_paused() {
            clock.resume();
        } else {
            clock.pause();
        }
    }

    let step = if keyboard.just_pressed(KeyCode::ArrowUp) {
        10.0
    } else if keyboard.just_pressed(KeyCode::ArrowDown) {
        -10.0
    } else {
        return;
    };
    let bpm = (clock.tempo() + step).max(10.0);
    if let Err(err) = clock.set_tempo(bpm) {
        warn!("{}", err);
    } else {
        info!("Tempo: {} bpm", bpm);
    }
}

fn respawn_captions(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    captions: Query<Entity, With<Caption>>,
) {
    if !keyboard.just_pressed(KeyCode::Enter) {
        return;
    }
    for entity in captions.iter() {
        commands.entity(entity).despawn();
    }
    spawn_captions(&mut commands);
}
