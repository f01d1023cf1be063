//! End-to-end scenarios over a whole generated world.

use bevy::prelude::*;
use pixel_sprawl::procgen::plan::CityPlan;
use pixel_sprawl::world::color::{is_foliage, is_structure};
use pixel_sprawl::world::coords::{BORDER_WIDTH, CHUNK_SIZE, MAX_HEIGHT};
use pixel_sprawl::{
    BurnKind, ChunkKey, Detonate, Ignite, PixelSprawlPlugin, Rgb, TerrainWorld, Theme, WorldConfig,
};

fn config(seed: u64, size: i32, theme: Theme) -> WorldConfig {
    WorldConfig {
        seed,
        width: size,
        height: size,
        theme,
        ..WorldConfig::default()
    }
}

fn find_pixel(world: &mut TerrainWorld, pred: fn(Rgb) -> bool) -> Option<(i32, i32)> {
    let (w, h) = (world.width(), world.height());
    for y in BORDER_WIDTH..h - BORDER_WIDTH {
        for x in BORDER_WIDTH..w - BORDER_WIDTH {
            if world.height_at(x, y) > 0 && pred(world.color_at(x, y)) {
                return Some((x, y));
            }
        }
    }
    None
}

#[test]
fn generation_is_deterministic_in_any_order() {
    let mut forward = TerrainWorld::new(config(42, 384, Theme::city()));
    let mut backward = TerrainWorld::new(config(42, 384, Theme::city()));
    forward.generate_all();

    let side = 384 / CHUNK_SIZE;
    for cy in (0..side).rev() {
        for cx in (0..side).rev() {
            backward.refresh_shadows(ChunkKey::new(cx, cy));
        }
    }
    backward.repair_roads();

    for cy in 0..side {
        for cx in 0..side {
            let key = ChunkKey::new(cx, cy);
            let a = forward.chunk(key).unwrap();
            let b = backward.chunk(key).unwrap();
            assert_eq!(a.colors(), b.colors(), "colors differ in chunk {:?}", key);
            assert_eq!(a.heights(), b.heights(), "heights differ in chunk {:?}", key);
        }
    }
}

#[test]
fn different_seeds_give_different_cities() {
    let mut a = TerrainWorld::new(config(1, 256, Theme::city()));
    let mut b = TerrainWorld::new(config(2, 256, Theme::city()));
    a.generate_all();
    b.generate_all();
    let differs = (0..4).any(|cy| {
        (0..4).any(|cx| {
            let key = ChunkKey::new(cx, cy);
            a.chunk(key).unwrap().colors() != b.chunk(key).unwrap().colors()
        })
    });
    assert!(differs);
}

#[test]
fn road_network_is_connected_for_every_theme() {
    for theme in [Theme::city(), Theme::autumn(), Theme::winter(), Theme::snowfield()] {
        for seed in [7, 99, 2024] {
            let plan = CityPlan::build(seed, &theme, 768, 768);
            let Some(roads) = plan.roads() else {
                continue;
            };
            assert!(roads.is_connected(), "{} seed {} disconnected", theme.name, seed);
            assert!(roads.has_no_dead_ends(), "{} seed {} has dead ends", theme.name, seed);
        }
    }
}

#[test]
fn shadow_recompute_is_idempotent() {
    let mut world = TerrainWorld::new(config(5, 256, Theme::city()));
    world.generate_all();
    let keys = world.prepare_visible(world.bounds());
    let first: Vec<Vec<u8>> = keys
        .iter()
        .map(|k| world.chunk(*k).unwrap().shades().to_vec())
        .collect();

    for key in &keys {
        world.refresh_shadows(*key);
    }
    for (key, shades) in keys.iter().zip(&first) {
        assert_eq!(world.chunk(*key).unwrap().shades(), &shades[..]);
    }
    let shaded = first.iter().flatten().any(|&s| s != first[0][0]);
    assert!(shaded, "buildings should cast some shadow");
}

#[test]
fn border_is_indestructible_everywhere() {
    let mut world = TerrainWorld::new(config(11, 256, Theme::city()));
    world.generate_all();
    for &(x, y) in &[(0, 0), (255, 255), (2, 128), (128, 253)] {
        assert!(world.is_indestructible(x, y));
        world.explode(x, y, 6);
        world.burn_pixel(x, y);
        assert_eq!(world.height_at(x, y), MAX_HEIGHT);
    }
}

#[test]
fn explosions_only_lower_terrain() {
    let mut world = TerrainWorld::new(config(3, 256, Theme::city()));
    world.generate_all();
    let before: Vec<u8> = (60..140)
        .flat_map(|y| (60..140).map(move |x| (x, y)))
        .map(|(x, y)| world.height_at(x, y))
        .collect();

    world.explode(100, 100, 10);
    world.explode(110, 95, 14);

    let mut i = 0;
    for y in 60..140 {
        for x in 60..140 {
            assert!(world.height_at(x, y) <= before[i]);
            i += 1;
        }
    }
    assert_eq!(world.height_at(100, 100), 0);
    assert!(!world.is_blocked(100, 100));
}

#[test]
fn temp_paint_reverts_and_scheduled_paint_lands_later() {
    let mut world = TerrainWorld::new(config(8, 256, Theme::city()));
    let original = world.color_at(90, 90);
    let flash = Rgb::new(250, 10, 10);

    assert!(world.add_temp_paint(90, 90, flash, 0.5));
    assert_eq!(world.color_at(90, 90), flash);
    world.update(0.5);
    assert_eq!(world.color_at(90, 90), original);
    assert_eq!(world.temp_paint_count(), 0);

    assert!(world.add_scheduled_paint(90, 90, flash, 0.2, 0.5));
    world.update(0.1);
    assert_eq!(world.color_at(90, 90), original);
    world.update(0.15);
    assert_eq!(world.color_at(90, 90), flash);
    assert_eq!(world.scheduled_paint_count(), 0);
    world.update(0.5);
    assert_eq!(world.color_at(90, 90), original);
}

#[test]
fn permanent_write_beats_temp_paint_revert() {
    let mut world = TerrainWorld::new(config(8, 256, Theme::city()));
    world.add_temp_paint(70, 70, Rgb::new(1, 200, 1), 0.3);
    world.burn_pixel_with_color(70, 70, Rgb::new(5, 5, 5));
    world.update(1.0);
    assert_eq!(world.color_at(70, 70), Rgb::new(5, 5, 5));
}

#[test]
fn tree_burn_runs_to_completion() {
    let mut world = TerrainWorld::new(config(1337, 512, Theme::city()));
    let (x, y) = find_pixel(&mut world, is_foliage).expect("city has trees");
    assert!(world.start_tree_burn(x, y));
    let pixels = world.tree_burn(x, y).unwrap().pixels().to_vec();
    assert!(!pixels.is_empty());

    for _ in 0..pixels.len() + 10 {
        world.update(0.05);
    }
    assert_eq!(world.active_tree_burns(), 0);
    for p in pixels {
        assert_eq!(world.height_at(p.x, p.y), 0);
        assert!(!is_foliage(world.color_at(p.x, p.y)));
    }
}

#[test]
fn building_burns_terminate() {
    let mut world = TerrainWorld::new(config(21, 384, Theme::city()));
    let (x, y) = find_pixel(&mut world, is_structure).expect("city has buildings");
    assert!(world.start_building_burn(x, y));
    let mut ticks = 0;
    while world.active_building_burns() > 0 {
        world.update(1.0 / 30.0);
        ticks += 1;
        assert!(ticks < 20_000, "building burn never finished");
    }
}

#[test]
fn wilds_theme_has_no_roads() {
    let mut world = TerrainWorld::new(config(4, 256, Theme::wilds()));
    world.generate_all();
    assert!(world.generator().plan().grid().is_none());
    assert_eq!(world.repair_roads(), 0);
}

#[test]
fn headless_app_applies_destruction_events() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(config(9, 256, Theme::city()))
        .add_plugins(PixelSprawlPlugin);

    app.update();
    assert_eq!(app.world().resource::<TerrainWorld>().generated_chunk_count(), 16);

    app.world_mut().send_event(Detonate {
        x: 128,
        y: 128,
        radius: 8,
    });
    app.world_mut().send_event(Ignite {
        x: 20,
        y: 20,
        kind: BurnKind::Tree,
    });
    app.update();

    let mut world = app.world_mut().resource_mut::<TerrainWorld>();
    assert_eq!(world.height_at(128, 128), 0);
    assert!(!world.is_blocked(130, 126));
}
