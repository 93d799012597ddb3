//! Application state and frame driver
//!
//! Input arrives as five held commands plus a quit flag; the platform layer
//! maps keys onto them. Each frame moves the camera, spins the cube and
//! renders it in the current mode.

use crate::config::{LightConfig, RenderConfig};
use crate::texture_file::TextureImage;
use crate::rasterizer::{
    draw_elements, mesh, Camera, ClearMode, Device, DeviceError, FramebufferId, FuncState, Matrix, RenderMode,
    TextureId, Vector, Vertex, MAX_TEXTURE_SIZE, TEXTURE_UNIT_DIFFUSE, TEXTURE_UNIT_SHADOW, UNIFORM_LIGHT_DIRECTION,
    UNIFORM_LIGHT_ENERGY, UNIFORM_LIGHT_VIEW_PROJ, UNIFORM_MATERIAL,
};

/// Camera distance change per frame
pub const MOVE_STEP: f32 = 0.01;
/// Cube rotation per frame, radians
pub const ROTATE_STEP: f32 = 0.01;
/// Closest the camera may get to the origin
pub const MIN_DISTANCE: f32 = 0.5;
/// Light distance from the origin during the shadow pass
pub const LIGHT_DISTANCE: f32 = 6.0;
/// Height of the shadow-receiving ground plane
pub const GROUND_HEIGHT: f32 = -2.0;

const CHECKER_SIZE: usize = 256;
const CHECKER_CELL: usize = 32;

/// Logical input commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    MoveNear = 0,
    MoveFar = 1,
    RotateLeft = 2,
    RotateRight = 3,
    ChangeMode = 4,
}

/// Held state of every command, sampled once per frame
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: [bool; 5],
    quit: bool,
}

impl InputState {
    pub fn set(&mut self, command: Command, held: bool) {
        self.held[command as usize] = held;
    }

    pub fn is_held(&self, command: Command) -> bool {
        self.held[command as usize]
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }
}

type Mesh = (Vec<Vertex>, Vec<u32>);

/// Offscreen resources for the shadow-map pass
struct ShadowResources {
    framebuffer: FramebufferId,
    texture: TextureId,
    depth: Vec<f32>,
}

pub struct AppState {
    mode: RenderMode,
    distance: f32,
    angle: f32,
    /// Set while ChangeMode is held so one press advances one mode
    mode_latched: bool,
    light: LightConfig,
    diffuse: TextureId,
    cube: Mesh,
    ground: Mesh,
    shadow: Option<ShadowResources>,
}

impl AppState {
    /// Create scene resources on `device` and apply the configured state
    pub fn new(device: &mut Device, config: &RenderConfig) -> Result<Self, DeviceError> {
        let checker = device.gen_texture()?;
        let texels = mesh::checkerboard(CHECKER_SIZE, CHECKER_CELL, device.format());
        device.set_texture(&texels, CHECKER_SIZE, CHECKER_SIZE, CHECKER_SIZE, checker)?;
        device.bind_texture(TEXTURE_UNIT_DIFFUSE, checker)?;

        let shadow = match (device.gen_framebuffer(), device.gen_texture()) {
            (Ok(framebuffer), Ok(texture)) => Some(ShadowResources {
                framebuffer,
                texture,
                depth: Vec::new(),
            }),
            (fb, tex) => {
                log::warn!("shadow pass disabled: framebuffer {:?}, texture {:?}", fb, tex);
                None
            }
        };

        device.set_uniform_vector(UNIFORM_LIGHT_ENERGY, config.light.energy());
        device.set_uniform_vector(UNIFORM_LIGHT_DIRECTION, config.light.direction());
        device.set_uniform_vector(UNIFORM_MATERIAL, config.material.as_vector());
        device.set_render_mode(config.render_mode);

        if config.cull_back {
            device.enable_render_func_state(FuncState::CULL_BACK)?;
        }
        if config.anti_alias {
            if let Err(e) = device.enable_render_func_state(FuncState::ANTI_ALIAS_FSAA) {
                log::warn!("anti-aliasing unavailable: {}", e);
            }
        }

        Ok(Self {
            mode: config.render_mode,
            distance: config.camera_distance.max(MIN_DISTANCE),
            angle: 0.0,
            mode_latched: false,
            light: config.light,
            diffuse: checker,
            cube: mesh::cube(),
            ground: mesh::ground(4.0, GROUND_HEIGHT),
            shadow,
        })
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn title(&self) -> String {
        format!("mini3d - {}", self.mode.label())
    }

    /// Replace the diffuse texels, keeping the bound texture slot
    pub fn set_diffuse(&self, device: &mut Device, image: &TextureImage) -> Result<(), DeviceError> {
        device.set_texture(&image.texels, image.width, image.width, image.height, self.diffuse)
    }

    pub fn toggle_cull(&self, device: &mut Device) -> Result<(), DeviceError> {
        if device.is_enabled(FuncState::CULL_BACK) {
            device.disable_render_func_state(FuncState::CULL_BACK);
            Ok(())
        } else {
            device.enable_render_func_state(FuncState::CULL_BACK)
        }
    }

    pub fn toggle_anti_alias(&self, device: &mut Device) -> Result<(), DeviceError> {
        if device.is_enabled(FuncState::ANTI_ALIAS_FSAA) {
            device.disable_render_func_state(FuncState::ANTI_ALIAS_FSAA);
            Ok(())
        } else {
            device.enable_render_func_state(FuncState::ANTI_ALIAS_FSAA)
        }
    }

    /// Apply one frame of held input
    pub fn update(&mut self, device: &mut Device, input: &InputState) {
        if input.is_held(Command::MoveNear) {
            self.distance = (self.distance - MOVE_STEP).max(MIN_DISTANCE);
        }
        if input.is_held(Command::MoveFar) {
            self.distance += MOVE_STEP;
        }
        if input.is_held(Command::RotateLeft) {
            self.angle += ROTATE_STEP;
        }
        if input.is_held(Command::RotateRight) {
            self.angle -= ROTATE_STEP;
        }

        if input.is_held(Command::ChangeMode) {
            if !self.mode_latched {
                self.mode_latched = true;
                self.mode = self.mode.next();
                device.set_render_mode(self.mode);
            }
        } else {
            self.mode_latched = false;
        }
    }

    /// Update from input and render into the device's default target
    pub fn frame(&mut self, device: &mut Device, input: &InputState) -> Result<(), DeviceError> {
        self.update(device, input);
        self.render(device)
    }

    pub fn render(&mut self, device: &mut Device) -> Result<(), DeviceError> {
        device.clear(ClearMode::Gradient);
        Camera::orbit(self.distance).apply(device);

        let cube_world = Matrix::rotate(-1.0, -0.5, 1.0, self.angle);
        if self.mode == RenderMode::ShadowLambertTexture {
            self.render_shadowed(device, cube_world)
        } else {
            device.set_render_mode(self.mode);
            draw_mesh(device, cube_world, &self.cube);
            Ok(())
        }
    }

    /// Two passes: depth from the light into an offscreen target, then the
    /// cube and ground sampling it
    fn render_shadowed(&mut self, device: &mut Device, cube_world: Matrix) -> Result<(), DeviceError> {
        let (width, height) = (device.width(), device.height());
        let Some(shadow) = self.shadow.as_mut() else {
            draw_unshadowed(device, cube_world, &self.cube, &self.ground);
            return Ok(());
        };
        if width > MAX_TEXTURE_SIZE || height > MAX_TEXTURE_SIZE {
            log::debug!("{}x{} target too large for a shadow map, drawing unshadowed", width, height);
            draw_unshadowed(device, cube_world, &self.cube, &self.ground);
            return Ok(());
        }

        let dir = self.light.direction().normalize().scale(LIGHT_DISTANCE);
        let light_view = Matrix::look_at(
            Vector::point(dir.x, dir.y, dir.z),
            Vector::point(0.0, 0.0, 0.0),
            Vector::direction(0.0, 0.0, 1.0),
        );
        let camera_view = device.transform.view;

        device.transform.view = light_view;
        device.bind_framebuffer(shadow.framebuffer)?;
        device.clear_framebuffer(shadow.framebuffer, ClearMode::Background)?;
        device.set_render_mode(RenderMode::ShadowMap);
        draw_mesh(device, cube_world, &self.cube);

        shadow.depth.resize(width * height, 0.0);
        device.copy_framebuffer_z(shadow.framebuffer, &mut shadow.depth)?;
        device.unbind_framebuffer(shadow.framebuffer)?;
        device.set_texture(bytemuck::cast_slice(&shadow.depth), width, width, height, shadow.texture)?;
        device.bind_texture(TEXTURE_UNIT_SHADOW, shadow.texture)?;
        device.set_uniform_matrix(UNIFORM_LIGHT_VIEW_PROJ, light_view * device.transform.projection);

        device.transform.view = camera_view;
        device.set_render_mode(RenderMode::ShadowLambertTexture);
        draw_mesh(device, cube_world, &self.cube);
        draw_mesh(device, Matrix::identity(), &self.ground);
        Ok(())
    }
}

/// Scene of the shadow mode, lit but without the light pass
fn draw_unshadowed(device: &mut Device, cube_world: Matrix, cube: &Mesh, ground: &Mesh) {
    device.set_render_mode(RenderMode::LambertLightTexture);
    draw_mesh(device, cube_world, cube);
    draw_mesh(device, Matrix::identity(), ground);
}

fn draw_mesh(device: &mut Device, world: Matrix, mesh: &Mesh) {
    device.transform.world = world;
    device.transform.update();
    draw_elements(device, &mesh.0, &mesh.1);
}
