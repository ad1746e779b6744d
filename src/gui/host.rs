use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kiss3d::camera::Camera;
use kiss3d::resource::MeshManager;
use kiss3d::scene::SceneNode;
use kiss3d::text::Font;
use kiss3d::window::Window;
use nalgebra::{Point2, Point3, Translation3, Vector2, Vector3};

use crate::anim::{AnimationData, Easing, Tween, TweenSet};
use crate::error::{HostError, HostResult};
use crate::host::{
    compose_world, AnimationId, Collider, HostEvent, LoadedAsset, NodeContent, NodeId, NodeSpec,
    PrefabId, SceneHost,
};
use crate::math::geometry::ray_sphere_distance;
use crate::math::Transform;

const LID_COLOR: [f32; 3] = [0.55, 0.4, 0.25];
const LABEL_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
// Label text heights are in world units; this turns them into font pixels
const LABEL_PIXELS_PER_UNIT: f32 = 400.0;

/// One mesh of a loaded model, registered with the global mesh manager.
struct PrefabUnit {
    geometry: String,
    color: Option<Vector3<f32>>,
}

struct Kiss3dNode {
    scene: SceneNode,
    parent: Option<NodeId>,
    transform: Transform,
    visible: bool,
    label: Option<(String, f32)>,
    collider: Option<Collider>,
    interactive: bool,
}

/// Scene host backed by a kiss3d scene graph.
///
/// Each node gets its own group under a shared root, so transforms and
/// visibility propagate the same way they do in the app's model. Models are
/// parsed during `advance`, which runs inside the render loop and therefore
/// with a live GL context.
pub struct Kiss3dHost {
    root: SceneNode,
    nodes: Vec<Option<Kiss3dNode>>,
    names: HashMap<String, NodeId>,
    prefabs: Vec<Vec<PrefabUnit>>,
    animations: Vec<AnimationData>,
    tweens: TweenSet,
    pending_loads: Vec<PathBuf>,
    events: Vec<HostEvent>,
    hovered: Option<NodeId>,
}

impl Kiss3dHost {
    pub fn new(window: &mut Window) -> Self {
        Kiss3dHost {
            root: window.add_group(),
            nodes: vec![],
            names: HashMap::new(),
            prefabs: vec![],
            animations: vec![],
            tweens: TweenSet::new(),
            pending_loads: vec![],
            events: vec![],
            hovered: None,
        }
    }

    fn get(&self, node: NodeId) -> HostResult<&Kiss3dNode> {
        self.nodes
            .get(node.0)
            .and_then(Option::as_ref)
            .ok_or(HostError::UnknownNode(node))
    }

    fn get_mut(&mut self, node: NodeId) -> HostResult<&mut Kiss3dNode> {
        self.nodes
            .get_mut(node.0)
            .and_then(Option::as_mut)
            .ok_or(HostError::UnknownNode(node))
    }

    pub fn world_transform(&self, node: NodeId) -> HostResult<Transform> {
        compose_world(node, |id| self.get(id).ok().map(|entry| (entry.transform, entry.parent)))
    }

    /// Visible only if every ancestor is visible too.
    fn is_shown(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            match self.get(id) {
                Ok(entry) if entry.visible => current = entry.parent,
                _ => return false,
            }
        }
        true
    }

    fn insert(&mut self, spec: NodeSpec) -> HostResult<NodeId> {
        let mut scene = match spec.parent {
            Some(parent) => self.get_mut(parent)?.scene.add_group(),
            None => self.root.add_group(),
        };
        apply_transform(&mut scene, &spec.transform);

        let label = match spec.content {
            NodeContent::Empty => None,
            NodeContent::Text { text, height } => Some((text, height)),
            NodeContent::Cuboid { extents } => {
                let mut cube = scene.add_cube(extents.x, extents.y, extents.z);
                cube.set_color(LID_COLOR[0], LID_COLOR[1], LID_COLOR[2]);
                None
            }
        };

        let id = NodeId(self.nodes.len());
        self.names.entry(spec.name.clone()).or_insert(id);
        self.nodes.push(Some(Kiss3dNode {
            scene,
            parent: spec.parent,
            transform: spec.transform,
            visible: true,
            label,
            collider: None,
            interactive: false,
        }));
        Ok(id)
    }

    fn load(&mut self, path: &Path) -> HostResult<LoadedAsset> {
        let load_error = |reason: String| HostError::Load {
            path: path.to_owned(),
            reason,
        };
        let mtl_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path.to_string_lossy().into_owned();

        let meshes =
            MeshManager::load_obj(path, mtl_dir, &name).map_err(|e| load_error(e.to_string()))?;
        let units: Vec<PrefabUnit> = meshes
            .into_iter()
            .enumerate()
            .map(|(idx, (_, mesh, material))| {
                let geometry = format!("{}#{}", name, idx);
                MeshManager::get_global_manager(|manager| manager.add(mesh.clone(), &geometry));
                PrefabUnit {
                    geometry,
                    color: material.map(|material| material.diffuse),
                }
            })
            .collect();

        if units.is_empty() {
            return Ok(LoadedAsset { units: vec![] });
        }
        let prefab = PrefabId(self.prefabs.len());
        self.prefabs.push(units);
        Ok(LoadedAsset {
            units: vec![Some(prefab)],
        })
    }

    fn live_nodes(&self) -> impl Iterator<Item = (NodeId, &Kiss3dNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| node.as_ref().map(|node| (NodeId(idx), node)))
    }

    /// The node and all of its descendants, parents first.
    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = vec![node];
        let mut next = 0;
        while next < out.len() {
            let parent = out[next];
            out.extend(
                self.live_nodes()
                    .filter(|(_, entry)| entry.parent == Some(parent))
                    .map(|(id, _)| id),
            );
            next += 1;
        }
        out
    }

    /// Nearest interactive node whose collider the ray hits.
    fn pick(&self, origin: &Point3<f32>, direction: &Vector3<f32>) -> Option<NodeId> {
        let mut best: Option<(f32, NodeId)> = None;
        for (id, node) in self.live_nodes() {
            let radius = match node.collider {
                Some(Collider::Sphere { radius }) if node.interactive => radius,
                _ => continue,
            };
            if !self.is_shown(id) {
                continue;
            }
            let world = match self.world_transform(id) {
                Ok(world) => world,
                Err(_) => continue,
            };
            let fit = world.scale.max();
            let radius = if radius == 0.0 { fit } else { radius * fit };

            let center = Point3::from(world.position);
            if let Some(distance) = ray_sphere_distance(origin, direction, &center, radius) {
                if best.map_or(true, |(closest, _)| distance < closest) {
                    best = Some((distance, id));
                }
            }
        }
        best.map(|(_, id)| id)
    }

    /// Updates hover state from the pointer ray, or from no ray when the
    /// pointer is outside the window.
    pub fn update_pointer(&mut self, ray: Option<(Point3<f32>, Vector3<f32>)>) {
        let picked = ray.and_then(|(origin, direction)| self.pick(&origin, &direction));
        if picked == self.hovered {
            return;
        }
        if let Some(old) = self.hovered {
            self.events.push(HostEvent::HoverExit(old));
        }
        if let Some(new) = picked {
            self.events.push(HostEvent::HoverEnter(new));
        }
        self.hovered = picked;
    }

    pub fn click(&mut self) {
        if let Some(node) = self.hovered {
            self.events.push(HostEvent::Click(node));
        }
    }

    /// Draws every visible text node at its projected position.
    pub fn draw_labels(&self, window: &mut Window, camera: &dyn Camera) {
        let size = Vector2::new(window.width() as f32, window.height() as f32);
        let scale_factor = window.scale_factor() as f32;
        let font = Font::default();
        let color = Point3::from(LABEL_COLOR);

        for (id, node) in self.live_nodes() {
            let (text, height) = match &node.label {
                Some(label) => label,
                None => continue,
            };
            if !self.is_shown(id) {
                continue;
            }
            let world = match self.world_transform(id) {
                Ok(world) => world,
                Err(_) => continue,
            };

            // Skip anything behind the camera
            let position = Point3::from(world.position);
            if (camera.view_transform() * position).z >= 0.0 {
                continue;
            }

            let projected = camera.project(&position, &size);
            let screen = Point2::new(projected.x * scale_factor, (size.y - projected.y) * scale_factor);
            let pixels = height * world.scale.y.abs().max(1.0) * LABEL_PIXELS_PER_UNIT;
            window.draw_text(text, &screen, pixels, &font, &color);
        }
    }
}

fn apply_transform(scene: &mut SceneNode, transform: &Transform) {
    scene.set_local_translation(Translation3::from(transform.position));
    scene.set_local_rotation(transform.rotation);
    scene.set_local_scale(transform.scale.x, transform.scale.y, transform.scale.z);
}

impl SceneHost for Kiss3dHost {
    fn create_node(&mut self, spec: NodeSpec) -> HostResult<NodeId> {
        self.insert(spec)
    }

    fn instantiate(&mut self, prefab: PrefabId, spec: NodeSpec) -> HostResult<NodeId> {
        if prefab.0 >= self.prefabs.len() {
            return Err(HostError::NodeCreation {
                name: spec.name,
                reason: format!("no such prefab {:?}", prefab),
            });
        }
        let id = self.insert(spec)?;

        let units = &self.prefabs[prefab.0];
        let scene = match self.nodes.get_mut(id.0).and_then(Option::as_mut) {
            Some(entry) => &mut entry.scene,
            None => return Err(HostError::UnknownNode(id)),
        };
        for unit in units.iter() {
            match scene.add_geom_with_name(&unit.geometry, Vector3::repeat(1.0)) {
                Some(mut mesh) => {
                    if let Some(color) = unit.color {
                        mesh.set_color(color.x, color.y, color.z);
                    }
                }
                None => tracing::warn!(geometry = %unit.geometry, "mesh missing from manager"),
            }
        }
        Ok(id)
    }

    fn destroy_node(&mut self, node: NodeId) -> HostResult<()> {
        self.get(node)?;
        for id in self.subtree(node) {
            let mut entry = match self.nodes.get_mut(id.0).and_then(Option::take) {
                Some(entry) => entry,
                None => continue,
            };
            if id == node {
                entry.scene.unlink();
            }
            self.names.retain(|_, named| *named != id);
            if self.hovered == Some(id) {
                self.hovered = None;
            }
            self.tweens.cancel(id);
        }
        Ok(())
    }

    fn find_node(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    fn parent(&self, node: NodeId) -> HostResult<Option<NodeId>> {
        Ok(self.get(node)?.parent)
    }

    fn transform(&self, node: NodeId) -> HostResult<Transform> {
        Ok(self.get(node)?.transform)
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform) -> HostResult<()> {
        let entry = self.get_mut(node)?;
        entry.transform = transform;
        apply_transform(&mut entry.scene, &transform);
        Ok(())
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) -> HostResult<()> {
        let entry = self.get_mut(node)?;
        entry.visible = visible;
        entry.scene.set_visible(visible);
        Ok(())
    }

    fn set_collider(&mut self, node: NodeId, collider: Collider) -> HostResult<()> {
        self.get_mut(node)?.collider = Some(collider);
        Ok(())
    }

    fn set_interactive(&mut self, node: NodeId) -> HostResult<()> {
        self.get_mut(node)?.interactive = true;
        Ok(())
    }

    fn begin_load(&mut self, path: &Path) -> HostResult<()> {
        self.pending_loads.push(path.to_owned());
        Ok(())
    }

    fn animate_to(
        &mut self,
        node: NodeId,
        target: Transform,
        duration: Duration,
        easing: Easing,
    ) -> HostResult<()> {
        let from = self.get(node)?.transform;
        self.tweens
            .start_tween(node, Tween::new(from, target, duration, easing));
        Ok(())
    }

    fn create_animation(&mut self, data: AnimationData) -> HostResult<AnimationId> {
        if data.period.is_zero() {
            return Err(HostError::Animation(String::from("zero-length animation")));
        }
        self.animations.push(data);
        Ok(AnimationId(self.animations.len() - 1))
    }

    fn play_animation(&mut self, animation: AnimationId, node: NodeId) -> HostResult<()> {
        let data = *self
            .animations
            .get(animation.0)
            .ok_or_else(|| HostError::Animation(format!("no such animation {:?}", animation)))?;
        let base = self.get(node)?.transform;
        self.tweens.start_spin(node, base, data);
        Ok(())
    }

    fn advance(&mut self, dt: Duration) {
        for (node, transform) in self.tweens.advance(dt) {
            if let Ok(entry) = self.get_mut(node) {
                entry.transform = transform;
                apply_transform(&mut entry.scene, &transform);
            }
        }

        for path in std::mem::take(&mut self.pending_loads) {
            let result = self.load(&path);
            self.events.push(HostEvent::AssetLoaded { path, result });
        }
    }

    fn poll_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }
}
