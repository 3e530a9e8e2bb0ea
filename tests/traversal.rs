use glam::Vec3;

use yaportal_rs::{
    engine::{Engine, FrameStats, RenderConfig},
    renderer::{LineCall, Recorder},
    world::{Camera, Level, TextureBank, fixtures},
};

fn square_config(size: usize) -> RenderConfig {
    RenderConfig {
        width: size,
        height: size,
        fov: 100_f32.to_radians(),
        ..RenderConfig::default()
    }
}

fn engine(level: Level, camera: Camera, config: RenderConfig) -> Engine<Recorder> {
    Engine::new(
        Recorder::default(),
        level,
        camera,
        TextureBank::default_with_checker(),
        config,
    )
}

fn frame(engine: &mut Engine<Recorder>) -> FrameStats {
    engine.render_frame(|_, _, _| {})
}

/// Neighbouring polygons are scan-converted independently, so a shared
/// edge may round differently on the two sides.  Allow one pixel per row.
fn assert_overdraw_free(rec: &Recorder, rows: usize) {
    let extra = rec.overdrawn_pixels();
    assert!(extra <= rows, "{extra} pixels drawn more than once");
}

/// Lines whose two ends both lie within `tol` pixels of the vertical line
/// `x = at`, between rows `y0` and `y1`.
fn lines_along_column(lines: &[LineCall], at: f32, y0: f32, y1: f32, tol: f32) -> usize {
    let near = |x: i32, y: i32| {
        (x as f32 - at).abs() <= tol && (y as f32) >= y0 - tol && (y as f32) <= y1 + tol
    };
    lines
        .iter()
        .filter(|l| near(l.x0, l.y0) && near(l.x1, l.y1))
        .count()
}

#[test]
fn shared_face_edges_are_drawn_once() {
    // camera in the middle of cube 0, looking through the shared face
    let level = fixtures::cube_row(2, 2.0, &[]).unwrap();
    let config = square_config(256);
    let cam = Camera::new(Vec3::new(0.0, 0.0, 1.0), 0.0, 0);
    let focal = config.focal();
    let mut engine = engine(level, cam, config);

    let stats = frame(&mut engine);
    assert_eq!(stats.cells_visited, 2);
    assert!(stats.walls_drawn > 5, "cube 1's far faces were not drawn");

    // every edge of cube 1 is accounted for: the four shared ones by the
    // portal, the rest by cube 1's own walls
    let full = engine.level.segment(1).full_edge_mask();
    assert_eq!(full, 0xFFF);
    assert_eq!(engine.context().edge_bits(1), full);
    assert!(stats.edges_skipped >= 4);

    // the shared square sits one unit in front of the eye: its right side
    // is the column x = half_w + focal; only one line may run along it
    let half = 128.0;
    let n = lines_along_column(
        &engine.renderer.lines,
        half + focal,
        half - focal,
        half + focal,
        3.0,
    );
    assert_eq!(n, 1);
}

#[test]
fn longer_rows_mark_every_entered_cell() {
    let level = fixtures::cube_row(3, 2.0, &[]).unwrap();
    let config = square_config(256);
    let cam = Camera::new(Vec3::new(0.11, 0.07, 1.0), 0.02, 0);
    let mut engine = engine(level, cam, config);

    let stats = frame(&mut engine);
    assert_eq!(stats.cells_visited, 3);
    for cell in 1..3 {
        assert_eq!(engine.context().edge_bits(cell), 0xFFF, "cell {cell}");
    }
    assert_overdraw_free(&engine.renderer, 256);
}

#[test]
fn cyclic_graph_visits_each_cell_once() {
    let level = fixtures::cube_ring(2.0, &[]).unwrap();
    let config = square_config(200);
    // near the centre of cell 0, facing the corner shared by all four cells
    let cam = Camera::new(Vec3::new(0.93, 0.07, 1.04), -44_f32.to_radians(), 0);
    let mut engine = engine(level, cam, config);

    for _ in 0..3 {
        let stats = frame(&mut engine);
        assert_eq!(stats.cells_visited, 4);
        assert!(stats.max_depth <= 4);
        assert_eq!(stats.depth_truncations, 0);
        let now = engine.context().frame();
        for cell in 0..4 {
            assert_eq!(engine.context().cell(cell).rendered_frame, now);
        }
        assert_overdraw_free(&engine.renderer, 200);
    }
}

#[test]
fn depth_cap_truncates_silently() {
    let level = fixtures::cube_row(8, 2.0, &[]).unwrap();
    let config = RenderConfig {
        max_depth: 4,
        ..square_config(256)
    };
    let cam = Camera::new(Vec3::new(0.0, 0.0, 1.0), 0.0, 0);
    let mut engine = engine(level, cam, config);

    let stats = frame(&mut engine);
    assert_eq!(stats.cells_visited, 4);
    assert_eq!(stats.max_depth, 4);
    assert_eq!(stats.depth_truncations, 1);
    assert!(!engine.context().is_rendered(4));
}

#[test]
fn portal_behind_the_camera_is_culled() {
    // standing in cube 1 looking back at cube 0: cube 2 is behind us
    let level = fixtures::cube_row(3, 2.0, &[]).unwrap();
    let config = square_config(128);
    let cam = Camera::new(Vec3::new(0.0, 0.0, 3.0), std::f32::consts::PI, 1);
    let mut engine = engine(level, cam, config);

    let stats = frame(&mut engine);
    assert_eq!(stats.cells_visited, 2);
    assert!(engine.context().is_rendered(0));
    assert!(!engine.context().is_rendered(2));
    assert_eq!(stats.portals_culled, 1);
}

#[test]
fn closed_level_covers_the_screen() {
    let level = fixtures::polygon_hall(6, 4.0, &[]).unwrap();
    let config = square_config(160);
    let cam = Camera::new(Vec3::new(0.21, 0.13, -0.37), 0.4, 0);
    let mut engine = engine(level, cam, config);

    let stats = frame(&mut engine);
    assert!(stats.cells_visited >= 2);
    assert_overdraw_free(&engine.renderer, 160);
    let covered = engine.renderer.covered_pixels();
    assert!(covered.abs_diff(160 * 160) <= 160, "covered {covered}");
}
