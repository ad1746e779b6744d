use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{
    compose_world, AnimationId, Collider, HostEvent, LoadedAsset, NodeContent, NodeId, NodeSpec, PrefabId,
    SceneHost,
};
use crate::anim::{AnimationData, Easing, Tween, TweenSet};
use crate::error::{HostError, HostResult};
use crate::math::Transform;

#[derive(Debug, Clone)]
pub struct MemoryNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transform: Transform,
    pub content: NodeContent,
    pub prefab: Option<PrefabId>,
    pub visible: bool,
    pub collider: Option<Collider>,
    pub interactive: bool,
}

/// A scene host that keeps the whole scene graph in memory.
///
/// Loads finish on the next `advance`, so requests made in the same frame
/// are all in flight together. Interaction events are injected with
/// `push_event`.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<Option<MemoryNode>>,
    names: HashMap<String, NodeId>,
    prefabs: Vec<PathBuf>,
    animations: Vec<AnimationData>,
    tweens: TweenSet,
    events: Vec<HostEvent>,
    // Loading
    pending_loads: Vec<PathBuf>,
    load_counts: HashMap<PathBuf, usize>,
    check_files: bool,
    failing_loads: HashSet<PathBuf>,
    failing_nodes: HashSet<String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, loads of paths that don't exist on disk fail.
    pub fn check_files(mut self, check_files: bool) -> Self {
        self.check_files = check_files;
        self
    }

    pub fn fail_loads_of(&mut self, path: impl Into<PathBuf>) {
        self.failing_loads.insert(path.into());
    }

    pub fn fail_node_creation(&mut self, name: impl Into<String>) {
        self.failing_nodes.insert(name.into());
    }

    pub fn allow_node_creation(&mut self, name: &str) {
        self.failing_nodes.remove(name);
    }

    pub fn push_event(&mut self, event: HostEvent) {
        self.events.push(event);
    }

    pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Live nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &MemoryNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| node.as_ref().map(|node| (NodeId(idx), node)))
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn load_count(&self, path: impl AsRef<Path>) -> usize {
        self.load_counts.get(path.as_ref()).copied().unwrap_or(0)
    }

    pub fn prefab_path(&self, prefab: PrefabId) -> Option<&Path> {
        self.prefabs.get(prefab.0).map(PathBuf::as_path)
    }

    pub fn is_animating(&self, node: NodeId) -> bool {
        self.tweens.is_tweening(node) || self.tweens.is_spinning(node)
    }

    pub fn tween_target(&self, node: NodeId) -> Option<Transform> {
        self.tweens.tween_target(node)
    }

    pub fn world_transform(&self, node: NodeId) -> HostResult<Transform> {
        compose_world(node, |id| self.node(id).map(|entry| (entry.transform, entry.parent)))
    }

    /// Finishes every load in flight, queueing their events.
    pub fn finish_loads(&mut self) {
        for path in std::mem::take(&mut self.pending_loads) {
            let result = self.resolve_load(&path);
            self.events.push(HostEvent::AssetLoaded { path, result });
        }
    }

    fn resolve_load(&mut self, path: &Path) -> HostResult<LoadedAsset> {
        if self.failing_loads.contains(path) || (self.check_files && !path.exists()) {
            return Err(HostError::Load {
                path: path.to_owned(),
                reason: String::from("file not found"),
            });
        }

        let prefab = PrefabId(self.prefabs.len());
        self.prefabs.push(path.to_owned());
        Ok(LoadedAsset {
            units: vec![None, Some(prefab)],
        })
    }

    fn get(&self, node: NodeId) -> HostResult<&MemoryNode> {
        self.node(node).ok_or(HostError::UnknownNode(node))
    }

    fn get_mut(&mut self, node: NodeId) -> HostResult<&mut MemoryNode> {
        self.nodes
            .get_mut(node.0)
            .and_then(Option::as_mut)
            .ok_or(HostError::UnknownNode(node))
    }

    fn insert(&mut self, spec: NodeSpec, prefab: Option<PrefabId>) -> HostResult<NodeId> {
        if self.failing_nodes.contains(&spec.name) {
            return Err(HostError::NodeCreation {
                name: spec.name,
                reason: String::from("creation refused"),
            });
        }
        if let Some(parent) = spec.parent {
            self.get(parent)?;
        }

        let id = NodeId(self.nodes.len());
        if let Some(parent) = spec.parent {
            self.get_mut(parent)?.children.push(id);
        }
        self.names.entry(spec.name.clone()).or_insert(id);
        self.nodes.push(Some(MemoryNode {
            name: spec.name,
            parent: spec.parent,
            children: vec![],
            transform: spec.transform,
            content: spec.content,
            prefab,
            visible: true,
            collider: None,
            interactive: false,
        }));
        Ok(id)
    }

    /// Indented dump of the scene graph.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (id, node) in self.nodes() {
            if node.parent.is_none() {
                self.describe_node(id, 0, &mut out);
            }
        }
        out
    }

    fn describe_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = match self.node(id) {
            Some(node) => node,
            None => return,
        };
        let p = node.transform.position;
        let _ = write!(
            out,
            "{:indent$}{} ({:.3}, {:.3}, {:.3})",
            "",
            node.name,
            p.x,
            p.y,
            p.z,
            indent = depth * 2
        );
        match &node.content {
            NodeContent::Text { text, .. } => {
                let _ = write!(out, " text={:?}", text);
            }
            NodeContent::Cuboid { .. } => out.push_str(" cuboid"),
            NodeContent::Empty => {}
        }
        if let Some(path) = node.prefab.and_then(|prefab| self.prefab_path(prefab)) {
            let _ = write!(out, " model={}", path.display());
        }
        if !node.visible {
            out.push_str(" hidden");
        }
        out.push('\n');

        for child in node.children.iter() {
            self.describe_node(*child, depth + 1, out);
        }
    }
}

impl SceneHost for MemoryHost {
    fn create_node(&mut self, spec: NodeSpec) -> HostResult<NodeId> {
        self.insert(spec, None)
    }

    fn instantiate(&mut self, prefab: PrefabId, spec: NodeSpec) -> HostResult<NodeId> {
        if prefab.0 >= self.prefabs.len() {
            return Err(HostError::NodeCreation {
                name: spec.name,
                reason: format!("no such prefab {:?}", prefab),
            });
        }
        self.insert(spec, Some(prefab))
    }

    fn destroy_node(&mut self, node: NodeId) -> HostResult<()> {
        if let Some(parent) = self.get(node)?.parent {
            if let Ok(entry) = self.get_mut(parent) {
                entry.children.retain(|child| *child != node);
            }
        }

        let mut doomed = vec![node];
        while let Some(id) = doomed.pop() {
            let entry = match self.nodes.get_mut(id.0).and_then(Option::take) {
                Some(entry) => entry,
                None => continue,
            };
            if self.names.get(&entry.name) == Some(&id) {
                self.names.remove(&entry.name);
            }
            self.tweens.cancel(id);
            doomed.extend(entry.children);
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
        self.get_mut(node)?.transform = transform;
        Ok(())
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) -> HostResult<()> {
        self.get_mut(node)?.visible = visible;
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
        *self.load_counts.entry(path.to_owned()).or_insert(0) += 1;
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
            }
        }
        self.finish_loads();
    }

    fn poll_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }
}
