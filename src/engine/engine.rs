use crate::{
    engine::{
        context::{FrameStats, RenderContext},
        traversal::{PortalWalk, Scene},
        types::RenderConfig,
    },
    renderer::{Renderer, Rgba},
    world::{Camera, Level, TextureBank},
};

/// Owns everything needed to turn a camera position into a frame.
pub struct Engine<R: Renderer> {
    pub renderer: R,
    pub level: Level,
    pub camera: Camera,
    pub texture_bank: TextureBank,
    pub config: RenderConfig,
    ctx: RenderContext,
}

impl<R: Renderer> Engine<R> {
    pub fn new(
        renderer: R,
        level: Level,
        camera: Camera,
        texture_bank: TextureBank,
        config: RenderConfig,
    ) -> Self {
        let ctx = RenderContext::new(level.len(), config.arena_spans);
        Self {
            renderer,
            level,
            camera,
            texture_bank,
            config,
            ctx,
        }
    }

    /// Render one frame and loan the result to `submit`.
    pub fn render_frame(&mut self, submit: impl FnOnce(&[Rgba], usize, usize)) -> FrameStats {
        self.renderer.begin_frame(self.config.width, self.config.height);
        self.ctx.begin_frame(self.level.len());

        let scene = Scene {
            level: &self.level,
            camera: &self.camera,
            textures: &self.texture_bank,
        };
        let stats = PortalWalk::new(scene, &self.config, &mut self.renderer, &mut self.ctx).run();

        self.renderer.end_frame(submit);
        log::debug!("frame {}: {stats}", self.ctx.frame());
        stats
    }

    /// Per-cell state left behind by the last frame.
    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Walk/strafe the camera; returns `false` if the move was refused.
    pub fn step_camera(&mut self, forward: f32, side: f32) -> bool {
        self.camera.step(&self.level, forward, side)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        renderer::{Recorder, Software},
        world::fixtures,
    };
    use glam::Vec3;

    fn small_config() -> RenderConfig {
        RenderConfig {
            width: 48,
            height: 32,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn frames_advance_and_reuse_state() {
        let level = fixtures::cube_row(3, 2.0, &[]).unwrap();
        let cam = Camera::new(Vec3::new(0.1, 0.05, 1.0), 0.0, 0);
        let mut engine = Engine::new(
            Recorder::default(),
            level,
            cam,
            TextureBank::default_with_checker(),
            small_config(),
        );

        let first = engine.render_frame(|_, _, _| {});
        let second = engine.render_frame(|_, _, _| {});
        assert_eq!(first, second);
        assert_eq!(engine.renderer.frames, 2);
        assert_eq!(engine.context().frame(), 2);
        assert_eq!(first.cells_visited, 3);
    }

    #[test]
    fn software_frame_is_painted() {
        let bank = TextureBank::procedural().unwrap();
        let textures: Vec<_> = bank.ids().collect();
        let level = fixtures::cube_row(2, 2.0, &textures).unwrap();
        let cam = Camera::new(Vec3::new(0.1, 0.05, 1.0), 0.05, 0);
        let mut engine = Engine::new(Software::default(), level, cam, bank, small_config());

        let mut cleared = usize::MAX;
        engine.render_frame(|fb, w, h| {
            assert_eq!(fb.len(), w * h);
            cleared = fb.iter().filter(|&&p| p == 0xFF_202020).count();
        });
        // at most a stray pixel per row where neighbouring walls round apart
        assert!(cleared <= 32, "{cleared} pixels left at clear colour");
    }

    #[test]
    fn field_of_view_comes_from_the_config() {
        let level = fixtures::cube_row(3, 2.0, &[]).unwrap();
        let cam = Camera::new(Vec3::new(0.1, 0.05, 1.0), 0.0, 0);
        let mut engine = Engine::new(
            Recorder::default(),
            level,
            cam,
            TextureBank::default_with_checker(),
            small_config(),
        );

        engine.config.fov = 60_f32.to_radians();
        engine.render_frame(|_, _, _| {});
        let narrow = engine.renderer.spans.clone();

        engine.config.fov = 120_f32.to_radians();
        engine.render_frame(|_, _, _| {});
        let wide = engine.renderer.spans.clone();

        assert_ne!(narrow, wide);
    }

    #[test]
    fn walking_changes_cell() {
        let level = fixtures::cube_row(2, 2.0, &[]).unwrap();
        let cam = Camera::new(Vec3::new(0.0, 0.0, 1.0), 0.0, 0);
        let mut engine = Engine::new(
            Recorder::default(),
            level,
            cam,
            TextureBank::default_with_checker(),
            small_config(),
        );
        assert!(engine.step_camera(1.5, 0.0));
        assert_eq!(engine.camera.cell(), 1);
        let stats = engine.render_frame(|_, _, _| {});
        // looking into the closed end: nothing behind is entered
        assert_eq!(stats.cells_visited, 1);
    }
}
