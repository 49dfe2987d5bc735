//! The frame pipeline: from a scene graph and a camera to a filled [`FrameBuffer`].
//!
//! Every frame runs through the same stages:
//!
//! 1.  **Clear** the color and depth buffers.
//! 2.  **Transform**: resolve all lights to world space, then take every mesh through its
//!     node's world transform and the camera's view and projection into clip space. Normals
//!     go through the inverse transpose of the model matrix so non-uniform scales keep them
//!     perpendicular to their surfaces.
//! 3.  **Cull/Clip**: meshes whose bounding box is outside the view frustum are skipped, as
//!     are triangles facing away from the camera (if enabled) and triangles trivially outside
//!     the frustum. The rest are clipped, see [`clip`](crate::rendering::clip).
//! 4.  **Rasterize** the clipped polygons, see [`raster`](crate::rendering::raster).
//! 5.  **Shade and depth test** every covered pixel. Only fragments strictly closer than the
//!     pixel's current depth are written, so the result does not depend on the order meshes
//!     are drawn in.
//! 6.  **Resolve**: the buffer is complete and can be borrowed or encoded.
//!
//! Geometry that cannot be drawn, be it degenerate, behind the camera or under a singular
//! transform, is skipped and counted in [`FrameStats`]. A frame always completes.

use crate::config::{RenderConfig, ShadingMode, validate_resolution};
use crate::error::Result;
use crate::lighting::{self, Light, ShadingContext, Surface};
use crate::math::{Mat4, Vec3};
use crate::rendering::clip::{self, ClipPolygon, ClipVertex};
use crate::rendering::color;
use crate::rendering::encoder::{self, HalfBlockEncoder};
use crate::rendering::framebuffer::FrameBuffer;
use crate::rendering::raster::{self, ScreenVertex};
use crate::scene::SceneGraph;
use crate::scene::camera::Camera;
use crate::scene::mesh::{Material, Mesh};
use crate::util::for_coord_in_line;
use smallvec::SmallVec;
use std::io::Write;

/// Counters describing the last rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Meshes reachable from the scene root.
    pub meshes: usize,
    /// Meshes skipped because their bounding box is outside the view frustum.
    pub meshes_culled: usize,
    pub lights: usize,
    pub triangles_submitted: usize,
    /// Back-facing triangles and triangles outside the view frustum.
    pub triangles_culled: usize,
    /// Triangles removed by clipping or by a non-finite transform.
    pub triangles_clipped: usize,
    /// Triangles with zero area in world space.
    pub triangles_degenerate: usize,
    pub triangles_rasterized: usize,
    /// Fragments that passed the depth test.
    pub fragments_written: usize,
}

/// How the covered pixels of a polygon get their color.
enum Fill<'a> {
    Constant([u8; 3]),
    Phong {
        shading: &'a ShadingContext<'a>,
        material: &'a Material,
        face_normal: Vec3,
    },
}

/// Renders scenes into an owned [`FrameBuffer`].
///
/// The frame buffer and all scratch memory are reused from frame to frame.
///
/// ```rust
/// use teng3d::config::RenderConfig;
/// use teng3d::lighting::Light;
/// use teng3d::math::Vec3;
/// use teng3d::rendering::renderer::Renderer;
/// use teng3d::scene::{SceneGraph, camera::Camera, node::SceneNode, shapes};
///
/// let mut scene = SceneGraph::new();
/// scene.spawn(scene.root(), SceneNode::new("cube").with_mesh(shapes::cube(1.0, [200, 80, 80]))).unwrap();
/// scene.spawn(scene.root(), SceneNode::new("sun").with_light(Light::directional(Vec3::new(-1.0, -1.0, -1.0), [255, 255, 255], 1.0))).unwrap();
/// let camera = Camera::looking_at(Vec3::new(2.0, 2.0, 4.0), Vec3::ZERO, Vec3::Y).unwrap();
///
/// let mut renderer = Renderer::new(RenderConfig::with_resolution(40, 20)).unwrap();
/// let frame = renderer.render(&scene, &camera).unwrap();
/// assert!(renderer.stats().fragments_written > 0);
/// print!("{frame}");
/// ```
pub struct Renderer {
    config: RenderConfig,
    framebuffer: FrameBuffer,
    encoder: HalfBlockEncoder,
    stats: FrameStats,
    lights: SmallVec<[Light; 8]>,
    /// Clip space vertices of the mesh being drawn, `None` where the transform failed.
    vertex_cache: Vec<Option<ClipVertex>>,
    polygon: ClipPolygon,
    scratch: ClipPolygon,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let framebuffer = FrameBuffer::new(config.pixel_width(), config.pixel_height(), config.background);
        Ok(Self {
            config,
            framebuffer,
            encoder: HalfBlockEncoder::new(),
            stats: FrameStats::default(),
            lights: SmallVec::new(),
            vertex_cache: Vec::new(),
            polygon: ClipPolygon::new(),
            scratch: ClipPolygon::new(),
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replaces the configuration, resizing the frame buffer if needed.
    pub fn set_config(&mut self, config: RenderConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.framebuffer
            .resize_discard(self.config.pixel_width(), self.config.pixel_height());
        Ok(())
    }

    pub fn set_shading(&mut self, shading: ShadingMode) {
        self.config.shading = shading;
    }

    /// Changes the output resolution, in terminal characters.
    pub fn resize(&mut self, columns: usize, rows: usize) -> Result<()> {
        validate_resolution(columns, rows)?;
        self.config.columns = columns;
        self.config.rows = rows;
        self.framebuffer
            .resize_discard(self.config.pixel_width(), self.config.pixel_height());
        Ok(())
    }

    /// The result of the last frame.
    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Counters of the last frame.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Renders one frame and returns it encoded for the terminal.
    pub fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<String> {
        self.render_frame(scene, camera);
        Ok(self.encoder.encode(&self.framebuffer)?)
    }

    /// Renders one frame and writes it encoded to `sink`.
    pub fn render_to<W: Write>(&mut self, scene: &SceneGraph, camera: &Camera, sink: &mut W) -> Result<()> {
        self.render_frame(scene, camera);
        encoder::encode_into(sink, &self.framebuffer)?;
        Ok(())
    }

    /// Renders one frame into the frame buffer.
    pub fn render_frame(&mut self, scene: &SceneGraph, camera: &Camera) -> &FrameBuffer {
        self.stats = FrameStats::default();
        self.framebuffer.clear(self.config.background);

        let aspect = self.config.pixel_width() as f64 / self.config.pixel_height() as f64;
        let view_projection = camera.projection_matrix(aspect) * camera.view_matrix();
        if !view_projection.is_finite() {
            log::debug!("camera produced a non-finite view projection, skipping frame");
            return &self.framebuffer;
        }

        // taken out of self so the shading context can borrow it while drawing
        let mut lights = std::mem::take(&mut self.lights);
        lights.clear();
        for (id, node, world) in scene.traverse() {
            let Some(light) = node.light() else {
                continue;
            };
            match light.to_world(&world) {
                Some(light) => lights.push(light),
                None => log::trace!("skipping light of node {id} '{}' with degenerate world transform", node.name()),
            }
        }
        self.stats.lights = lights.len();
        let shading = ShadingContext {
            lights: &lights,
            ambient: color::to_float(self.config.ambient),
            eye: camera.position(),
        };

        for (id, node, world) in scene.traverse() {
            let Some(mesh) = node.mesh() else {
                continue;
            };
            log::trace!("drawing mesh of node {id} '{}'", node.name());
            self.stats.meshes += 1;
            self.draw_mesh(mesh, &world, &view_projection, &shading);
        }
        self.lights = lights;

        log::debug!("frame done: {:?}", self.stats);
        &self.framebuffer
    }

    fn draw_mesh(&mut self, mesh: &Mesh, model: &Mat4, view_projection: &Mat4, shading: &ShadingContext) {
        let triangle_count = mesh.triangles().len();
        self.stats.triangles_submitted += triangle_count;
        let mvp = *view_projection * *model;

        if let Some(bounds) = mesh.bounds() {
            if clip::all_outside(bounds.corners().map(|corner| mvp.transform_homogeneous(corner))) {
                self.stats.meshes_culled += 1;
                self.stats.triangles_culled += triangle_count;
                return;
            }
        }

        let Some(normal_matrix) = model.normal_matrix() else {
            log::trace!("skipping mesh with singular world transform");
            self.stats.triangles_clipped += triangle_count;
            return;
        };

        let material = mesh.material();
        self.vertex_cache.clear();
        self.vertex_cache.extend(mesh.vertices().iter().map(|vertex| {
            let clip = mvp.transform_homogeneous(vertex.position);
            let world = model.transform_point(vertex.position)?;
            clip.is_finite().then(|| ClipVertex {
                clip,
                world,
                normal: normal_matrix.transform_vector(vertex.normal).normalized(),
                color: color::to_float(vertex.color.unwrap_or(material.color)),
            })
        }));

        // mirroring transforms flip the winding of every triangle
        let mirrored = model.determinant3() < 0.0;
        let mode = material.shading.unwrap_or(self.config.shading);
        for &[a, b, c] in mesh.triangles() {
            let cache = &self.vertex_cache;
            let (Some(v0), Some(v1), Some(v2)) = (cache[a as usize], cache[b as usize], cache[c as usize]) else {
                self.stats.triangles_clipped += 1;
                continue;
            };
            self.draw_triangle([v0, v1, v2], mirrored, mode, material, shading);
        }
    }

    fn draw_triangle(
        &mut self,
        mut triangle: [ClipVertex; 3],
        mirrored: bool,
        mode: ShadingMode,
        material: &Material,
        shading: &ShadingContext,
    ) {
        let [p0, p1, p2] = triangle.map(|v| v.world);
        let face = (p1 - p0).cross(p2 - p0);
        let face = if mirrored { -face } else { face };
        let face_normal = face.normalized();
        if face_normal == Vec3::ZERO || !face_normal.is_finite() {
            self.stats.triangles_degenerate += 1;
            return;
        }

        let front_facing = face.dot(shading.eye - p0) > 0.0;
        if !front_facing && self.config.backface_culling {
            self.stats.triangles_culled += 1;
            return;
        }
        if clip::all_outside(triangle.iter().map(|v| v.clip)) {
            self.stats.triangles_culled += 1;
            return;
        }

        // a visible back face is shaded as seen from behind
        let face_normal = if front_facing { face_normal } else { -face_normal };
        for v in &mut triangle {
            v.normal = if v.normal == Vec3::ZERO {
                face_normal
            } else if front_facing {
                v.normal
            } else {
                -v.normal
            };
        }

        match mode {
            ShadingMode::Wireframe => self.draw_wireframe(&triangle),
            ShadingMode::Flat => {
                let surface = Surface {
                    position: (p0 + p1 + p2) / 3.0,
                    normal: face_normal,
                    albedo: (triangle[0].color + triangle[1].color + triangle[2].color) / 3.0,
                };
                let color = color::quantize(lighting::shade_diffuse(shading, &surface));
                self.fill(&triangle, Fill::Constant(color));
            }
            ShadingMode::Phong => self.fill(
                &triangle,
                Fill::Phong {
                    shading,
                    material,
                    face_normal,
                },
            ),
        }
    }

    fn fill(&mut self, triangle: &[ClipVertex; 3], fill: Fill) {
        self.polygon.clear();
        self.polygon.extend_from_slice(triangle);
        clip::clip_polygon(&mut self.polygon, &mut self.scratch);
        if self.polygon.len() < 3 {
            self.stats.triangles_clipped += 1;
            return;
        }

        let (width, height) = (self.framebuffer.width(), self.framebuffer.height());
        let mut screen: SmallVec<[ScreenVertex; 9]> = SmallVec::new();
        for v in &self.polygon {
            let Some(s) = ScreenVertex::from_clip(v, width, height) else {
                self.stats.triangles_clipped += 1;
                return;
            };
            screen.push(s);
        }
        self.stats.triangles_rasterized += 1;

        let framebuffer = &mut self.framebuffer;
        let polygon = &self.polygon;
        let mut written = 0;
        // the clipped polygon is convex, a fan covers it
        for i in 1..polygon.len() - 1 {
            let corners = [0, i, i + 1];
            raster::rasterize_triangle(&corners.map(|k| screen[k]), width, height, |frag| {
                if !framebuffer.passes_depth_test(frag.x, frag.y, frag.depth) {
                    return;
                }
                let color = match &fill {
                    Fill::Constant(color) => *color,
                    Fill::Phong {
                        shading,
                        material,
                        face_normal,
                    } => {
                        let vertices = corners.map(|k| &polygon[k]);
                        let normal = frag.interpolate(vertices.map(|v| v.normal)).normalized();
                        let surface = Surface {
                            position: frag.interpolate(vertices.map(|v| v.world)),
                            normal: if normal == Vec3::ZERO { *face_normal } else { normal },
                            albedo: frag.interpolate(vertices.map(|v| v.color)),
                        };
                        color::quantize(lighting::shade_phong(shading, &surface, material))
                    }
                };
                if framebuffer.depth_test_and_set(frag.x, frag.y, frag.depth, color) {
                    written += 1;
                }
            });
        }
        self.stats.fragments_written += written;
    }

    fn draw_wireframe(&mut self, triangle: &[ClipVertex; 3]) {
        let color = color::quantize((triangle[0].color + triangle[1].color + triangle[2].color) / 3.0);
        let (width, height) = (self.framebuffer.width(), self.framebuffer.height());
        let to_pixel = |s: &ScreenVertex| {
            (
                (s.x.floor() as i64).clamp(0, width as i64 - 1),
                (s.y.floor() as i64).clamp(0, height as i64 - 1),
            )
        };

        let framebuffer = &mut self.framebuffer;
        let mut written = 0;
        let mut visible = false;
        for (a, b) in [(0, 1), (1, 2), (2, 0)] {
            let Some((start, end)) = clip::clip_segment(&triangle[a], &triangle[b]) else {
                continue;
            };
            let (Some(start), Some(end)) = (
                ScreenVertex::from_clip(&start, width, height),
                ScreenVertex::from_clip(&end, width, height),
            ) else {
                continue;
            };
            visible = true;
            for_coord_in_line(to_pixel(&start), to_pixel(&end), |x, y, t| {
                let depth = start.depth + (end.depth - start.depth) * t;
                if framebuffer.depth_test_and_set(x as usize, y as usize, depth, color) {
                    written += 1;
                }
            });
        }

        if visible {
            self.stats.triangles_rasterized += 1;
        } else {
            self.stats.triangles_clipped += 1;
        }
        self.stats.fragments_written += written;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::encoder::{FULL_BLOCK, UPPER_HALF_BLOCK};
    use crate::scene::mesh::Vertex;
    use crate::scene::node::SceneNode;
    use crate::scene::shapes;
    use std::f64::consts::{FRAC_PI_2, PI};

    const RED: [u8; 3] = [255, 0, 0];
    const GREEN: [u8; 3] = [0, 255, 0];

    fn renderer(columns: usize, rows: usize, shading: ShadingMode) -> Renderer {
        Renderer::new(RenderConfig {
            columns,
            rows,
            shading,
            ..RenderConfig::default()
        })
        .unwrap()
    }

    /// A renderer whose unlit colors are exactly the material colors.
    fn unlit_renderer(columns: usize, rows: usize) -> Renderer {
        Renderer::new(RenderConfig {
            columns,
            rows,
            ambient: [255, 255, 255],
            ..RenderConfig::default()
        })
        .unwrap()
    }

    fn triangle(points: [Vec3; 3], color: [u8; 3]) -> Mesh {
        let vertices = points.map(|p| Vertex::new(p, Vec3::Z)).to_vec();
        Mesh::new(vertices, vec![[0, 1, 2]])
            .unwrap()
            .with_material(Material::with_color(color))
    }

    /// A square facing +Z.
    fn wall(size: f64, z: f64, color: [u8; 3]) -> SceneNode {
        SceneNode::new("wall")
            .with_mesh(shapes::plane(size, size, color))
            .with_rotation(Vec3::new(FRAC_PI_2, 0.0, 0.0))
            .with_position(Vec3::new(0.0, 0.0, z))
    }

    fn project(renderer: &Renderer, camera: &Camera, point: Vec3) -> (usize, usize) {
        let (w, h) = (renderer.framebuffer().width() as f64, renderer.framebuffer().height() as f64);
        let ndc = (camera.projection_matrix(w / h) * camera.view_matrix())
            .transform_point(point)
            .unwrap();
        (((ndc.x + 1.0) * 0.5 * w) as usize, ((1.0 - ndc.y) * 0.5 * h) as usize)
    }

    fn colors(renderer: &Renderer) -> Vec<[u8; 3]> {
        renderer.framebuffer().iter().map(|(_, _, c)| c).collect()
    }

    fn background_pixels(renderer: &Renderer) -> usize {
        let background = renderer.config().background;
        colors(renderer).iter().filter(|&&c| c == background).count()
    }

    #[test]
    fn test_occlusion_does_not_depend_on_draw_order() {
        let camera = Camera::default().with_position(Vec3::new(0.0, 0.0, 5.0));
        let mut results = vec![];
        for near_first in [true, false] {
            let mut scene = SceneGraph::new();
            let root = scene.root();
            let near = wall(2.0, 1.0, RED);
            let far = wall(5.0, -1.0, GREEN);
            if near_first {
                scene.spawn(root, near).unwrap();
                scene.spawn(root, far).unwrap();
            } else {
                scene.spawn(root, far).unwrap();
                scene.spawn(root, near).unwrap();
            }
            let mut renderer = unlit_renderer(40, 20);
            renderer.render_frame(&scene, &camera);

            let center = project(&renderer, &camera, Vec3::new(0.0, 0.0, 1.0));
            assert_eq!(renderer.framebuffer()[center], RED);
            let side = project(&renderer, &camera, Vec3::new(2.2, 0.0, -1.0));
            assert_eq!(renderer.framebuffer()[side], GREEN);
            results.push(colors(&renderer));
        }
        assert_eq!(results[0], results[1]);
    }

    #[test]
    fn test_cube_lit_from_above_has_brighter_top() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene
            .spawn(root, SceneNode::new("cube").with_mesh(shapes::cube(1.0, [200, 200, 200])))
            .unwrap();
        scene
            .spawn(
                root,
                SceneNode::new("sun").with_light(Light::directional(Vec3::new(0.0, -1.0, 0.0), [255, 255, 255], 1.0)),
            )
            .unwrap();

        // looking down +Z from distance 5, once from slightly above and once from below
        let mut renderer = renderer(80, 40, ShadingMode::Flat);
        let above = Camera::looking_at(Vec3::new(0.0, 3.0, -5.0), Vec3::ZERO, Vec3::Y).unwrap();
        renderer.render_frame(&scene, &above);
        let top = renderer.framebuffer()[project(&renderer, &above, Vec3::new(0.0, 0.5, 0.0))];

        let below = Camera::looking_at(Vec3::new(0.0, -3.0, -5.0), Vec3::ZERO, Vec3::Y).unwrap();
        renderer.render_frame(&scene, &below);
        let bottom = renderer.framebuffer()[project(&renderer, &below, Vec3::new(0.0, -0.5, 0.0))];

        let background = renderer.config().background;
        assert_ne!(top, background);
        assert_ne!(bottom, background);
        assert!(
            color::luminance(top) > color::luminance(bottom),
            "top {top:?} should be brighter than bottom {bottom:?}"
        );

        // straight on, the front face is visible and lit by ambient light only
        let straight = Camera::default()
            .with_position(Vec3::new(0.0, 0.0, -5.0))
            .with_rotation(Vec3::new(0.0, PI, 0.0));
        renderer.render_frame(&scene, &straight);
        let front = renderer.framebuffer()[project(&renderer, &straight, Vec3::new(0.0, 0.0, -0.5))];
        assert_eq!(front, bottom);
    }

    #[test]
    fn test_triangle_behind_camera_draws_nothing() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let points = [Vec3::new(-1.0, -1.0, 2.0), Vec3::new(1.0, -1.0, 2.0), Vec3::new(0.0, 1.0, 2.0)];
        scene
            .spawn(root, SceneNode::new("behind").with_mesh(triangle(points, RED)))
            .unwrap();
        // in front of the camera, but closer than the near plane
        let points = [Vec3::new(-1.0, -1.0, -0.05), Vec3::new(1.0, -1.0, -0.05), Vec3::new(0.0, 1.0, -0.05)];
        scene
            .spawn(root, SceneNode::new("too close").with_mesh(triangle(points, RED)))
            .unwrap();

        let mut renderer = Renderer::new(RenderConfig {
            backface_culling: false,
            ..RenderConfig::with_resolution(20, 10)
        })
        .unwrap();
        renderer.render_frame(&scene, &Camera::default());
        assert_eq!(renderer.stats().fragments_written, 0);
        assert_eq!(background_pixels(&renderer), 20 * 20);
    }

    #[test]
    fn test_triangle_crossing_near_plane_is_clipped() {
        let mut scene = SceneGraph::new();
        let points = [Vec3::new(-1.0, -1.0, 2.0), Vec3::new(1.0, -1.0, -3.0), Vec3::new(0.0, 1.0, -3.0)];
        scene
            .spawn(scene.root(), SceneNode::new("crossing").with_mesh(triangle(points, RED)))
            .unwrap();
        let mut renderer = Renderer::new(RenderConfig {
            backface_culling: false,
            ..RenderConfig::with_resolution(20, 10)
        })
        .unwrap();
        renderer.render_frame(&scene, &Camera::default());
        let stats = renderer.stats();
        assert_eq!(stats.triangles_rasterized, 1);
        assert!(stats.fragments_written > 0);
        let framebuffer = renderer.framebuffer();
        for y in 0..framebuffer.height() {
            for x in 0..framebuffer.width() {
                let depth = framebuffer.depth(x, y).unwrap();
                assert!(depth == f64::INFINITY || (-1e-9..=1.0 + 1e-9).contains(&depth));
            }
        }
    }

    #[test]
    fn test_output_has_one_glyph_per_two_pixels() {
        let mut scene = SceneGraph::new();
        scene
            .spawn(scene.root(), SceneNode::new("cube").with_mesh(shapes::cube(1.0, RED)))
            .unwrap();
        let camera = Camera::default().with_position(Vec3::new(0.0, 0.0, 4.0));
        let mut renderer = renderer(40, 20, ShadingMode::Flat);
        let output = renderer.render(&scene, &camera).unwrap();
        assert_eq!(renderer.framebuffer().width(), 40);
        assert_eq!(renderer.framebuffer().height(), 40);
        let glyphs = output
            .chars()
            .filter(|&c| c == UPPER_HALF_BLOCK || c == FULL_BLOCK)
            .count();
        assert_eq!(glyphs, 800);
    }

    #[test]
    fn test_backface_culling() {
        // wound clockwise as seen from the camera
        let points = [Vec3::new(-1.0, -1.0, -3.0), Vec3::new(0.0, 1.0, -3.0), Vec3::new(1.0, -1.0, -3.0)];
        let mut scene = SceneGraph::new();
        scene
            .spawn(scene.root(), SceneNode::new("back").with_mesh(triangle(points, RED)))
            .unwrap();
        scene
            .spawn(
                scene.root(),
                SceneNode::new("light").with_light(Light::directional(-Vec3::Z, [255, 255, 255], 1.0)),
            )
            .unwrap();

        let mut renderer = renderer(20, 10, ShadingMode::Flat);
        renderer.render_frame(&scene, &Camera::default());
        assert_eq!(renderer.stats().triangles_culled, 1);
        assert_eq!(renderer.stats().fragments_written, 0);

        let mut config = renderer.config().clone();
        config.backface_culling = false;
        renderer.set_config(config).unwrap();
        renderer.render_frame(&scene, &Camera::default());
        assert!(renderer.stats().fragments_written > 0);
        // the visible side faces the light, so it gets the full diffuse term
        let center = renderer.framebuffer()[(10, 10)];
        assert_eq!(center[0], 255);
    }

    #[test]
    fn test_wireframe_draws_only_edges() {
        let mut scene = SceneGraph::new();
        let cube = scene
            .spawn(scene.root(), SceneNode::new("cube").with_mesh(shapes::cube(1.0, RED)))
            .unwrap();
        let camera = Camera::looking_at(Vec3::new(2.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y).unwrap();

        let mut flat = renderer(40, 20, ShadingMode::Flat);
        flat.render_frame(&scene, &camera);
        let mut wire = renderer(40, 20, ShadingMode::Wireframe);
        wire.render_frame(&scene, &camera);

        let covered_flat = 40 * 40 - background_pixels(&flat);
        let covered_wire = 40 * 40 - background_pixels(&wire);
        assert!(covered_wire > 0);
        assert!(covered_wire < covered_flat);
        // edges use the unlit mesh color
        assert!(colors(&wire).contains(&RED));

        // a material override beats the renderer's mode
        scene
            .node_mut(cube)
            .unwrap()
            .mesh_mut()
            .unwrap()
            .material_mut()
            .shading = Some(ShadingMode::Wireframe);
        flat.render_frame(&scene, &camera);
        assert_eq!(colors(&flat), colors(&wire));
    }

    #[test]
    fn test_phong_sphere_has_highlight() {
        let mut scene = SceneGraph::new();
        scene
            .spawn(scene.root(), SceneNode::new("ball").with_mesh(shapes::uv_sphere(1.0, 24, 16, [40, 40, 200])))
            .unwrap();
        scene
            .spawn(
                scene.root(),
                SceneNode::new("lamp").with_light(Light::point(Vec3::new(0.0, 0.0, 4.0), [255, 255, 255], 3.0)),
            )
            .unwrap();
        let camera = Camera::default().with_position(Vec3::new(0.0, 0.0, 4.0));

        let mut phong = renderer(40, 20, ShadingMode::Phong);
        phong.render_frame(&scene, &camera);
        let mut flat = renderer(40, 20, ShadingMode::Flat);
        flat.render_frame(&scene, &camera);

        let brightest = |r: &Renderer| colors(r).iter().map(|&c| color::luminance(c)).fold(0.0, f64::max);
        // the specular term adds white to the blue base color
        assert!(brightest(&phong) > brightest(&flat));
        let center = phong.framebuffer()[project(&phong, &camera, Vec3::new(0.0, 0.0, 1.0))];
        assert!(center[0] > 100, "expected a highlight, got {center:?}");
    }

    #[test]
    fn test_offscreen_and_detached_meshes_are_skipped() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene
            .spawn(
                root,
                SceneNode::new("behind")
                    .with_mesh(shapes::cube(1.0, RED))
                    .with_position(Vec3::new(0.0, 0.0, 10.0)),
            )
            .unwrap();
        let detached = scene.create_node(
            SceneNode::new("detached")
                .with_mesh(shapes::cube(1.0, GREEN))
                .with_position(Vec3::new(0.0, 0.0, -4.0)),
        );
        let mut renderer = renderer(20, 10, ShadingMode::Flat);
        renderer.render_frame(&scene, &Camera::default());
        let stats = renderer.stats();
        assert_eq!(stats.meshes, 1);
        assert_eq!(stats.meshes_culled, 1);
        assert_eq!(stats.triangles_culled, 12);
        assert_eq!(stats.fragments_written, 0);

        scene.add_child(root, detached).unwrap();
        renderer.render_frame(&scene, &Camera::default());
        assert_eq!(renderer.stats().meshes, 2);
        assert!(renderer.stats().fragments_written > 0);
    }

    #[test]
    fn test_singular_transform_is_skipped() {
        let mut scene = SceneGraph::new();
        scene
            .spawn(
                scene.root(),
                SceneNode::new("flat")
                    .with_mesh(shapes::cube(1.0, RED))
                    .with_position(Vec3::new(0.0, 0.0, -4.0))
                    .with_scale(Vec3::new(1.0, 0.0, 1.0)),
            )
            .unwrap();
        let mut renderer = renderer(20, 10, ShadingMode::Phong);
        renderer.render_frame(&scene, &Camera::default());
        assert_eq!(renderer.stats().triangles_clipped, 12);
        assert_eq!(background_pixels(&renderer), 20 * 20);
    }

    #[test]
    fn test_resize() {
        let mut renderer = renderer(10, 5, ShadingMode::Flat);
        renderer.resize(30, 7).unwrap();
        assert_eq!(renderer.framebuffer().width(), 30);
        assert_eq!(renderer.framebuffer().height(), 14);
        assert!(renderer.resize(0, 7).is_err());
        assert!(renderer.resize(30, MAX_ROWS_PLUS_ONE).is_err());
        assert_eq!(renderer.config().columns, 30);
        let output = renderer.render(&SceneGraph::new(), &Camera::default()).unwrap();
        assert_eq!(output.chars().filter(|&c| c == FULL_BLOCK).count(), 30 * 7);
    }

    const MAX_ROWS_PLUS_ONE: usize = crate::config::MAX_DIMENSION + 1;

    #[test]
    fn test_rejects_invalid_config() {
        assert!(Renderer::new(RenderConfig::with_resolution(0, 10)).is_err());
    }

    #[test]
    fn test_mirrored_cube_shows_its_front_faces() {
        let camera = Camera::default().with_position(Vec3::new(0.0, 0.0, 4.0));
        for shading in [ShadingMode::Flat, ShadingMode::Phong] {
            let mut frames = vec![];
            for scale in [Vec3::ONE, Vec3::new(-1.0, 1.0, 1.0)] {
                let mut scene = SceneGraph::new();
                let root = scene.root();
                scene
                    .spawn(
                        root,
                        SceneNode::new("cube")
                            .with_mesh(shapes::cube(1.0, [200, 200, 200]))
                            .with_scale(scale),
                    )
                    .unwrap();
                scene
                    .spawn(
                        root,
                        SceneNode::new("sun").with_light(Light::directional(Vec3::new(0.0, 0.0, -1.0), [255, 255, 255], 1.0)),
                    )
                    .unwrap();
                let mut renderer = renderer(40, 20, shading);
                renderer.render_frame(&scene, &camera);
                let center = (20, 20);
                frames.push((
                    renderer.framebuffer().color(center.0, center.1).unwrap(),
                    renderer.framebuffer().depth(center.0, center.1).unwrap(),
                    renderer.stats().triangles_culled,
                ));
            }
            let (plain, mirrored) = (frames[0], frames[1]);
            assert_eq!(plain.0, mirrored.0, "{shading} color differs");
            assert!((plain.1 - mirrored.1).abs() < 1e-9, "{shading}: {} vs {}", plain.1, mirrored.1);
            assert_eq!(plain.2, mirrored.2);
        }
    }

    #[test]
    fn test_small_scale_on_large_mesh_is_drawn() {
        let mut scene = SceneGraph::new();
        scene
            .spawn(
                scene.root(),
                SceneNode::new("shrunk")
                    .with_mesh(shapes::cube(2000.0, RED))
                    .with_scale(Vec3::splat(5e-5)),
            )
            .unwrap();
        let mut renderer = unlit_renderer(40, 20);
        renderer.render_frame(&scene, &Camera::default().with_position(Vec3::new(0.0, 0.0, 4.0)));
        assert_eq!(renderer.stats().triangles_clipped, 0);
        assert!(renderer.stats().fragments_written > 0);
        assert!(colors(&renderer).contains(&RED));
    }

    #[test]
    fn test_light_under_degenerate_transform_is_skipped() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene
            .spawn(
                root,
                SceneNode::new("squashed")
                    .with_light(Light::directional(Vec3::new(0.0, -1.0, 0.0), [255, 255, 255], 1.0))
                    .with_scale(Vec3::new(1.0, 0.0, 1.0)),
            )
            .unwrap();
        scene
            .spawn(
                root,
                SceneNode::new("sun").with_light(Light::directional(Vec3::new(0.0, 0.0, -1.0), [255, 255, 255], 1.0)),
            )
            .unwrap();
        let mut renderer = renderer(10, 5, ShadingMode::Flat);
        renderer.render_frame(&scene, &Camera::default());
        assert_eq!(renderer.stats().lights, 1);
    }
}
