//! The boundary to the runtime that actually owns the scene.
//!
//! Everything the app does to the world (creating nodes, loading models,
//! tweening, picking up pointer events) goes through `SceneHost`. The host is
//! driven from a single thread: `advance` moves its animations forward, and
//! `poll_events` drains whatever happened since the last poll.

use std::path::{Path, PathBuf};
use std::time::Duration;

use nalgebra::Vector3;

use crate::anim::{AnimationData, Easing};
use crate::error::{HostError, HostResult};
use crate::math::Transform;

mod memory;

pub use memory::MemoryHost;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One instantiable unit inside a loaded asset.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrefabId(pub usize);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AnimationId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Empty,
    Text { text: String, height: f32 },
    Cuboid { extents: Vector3<f32> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub name: String,
    pub parent: Option<NodeId>,
    pub transform: Transform,
    pub content: NodeContent,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        NodeSpec {
            name: name.into(),
            parent: None,
            transform: Transform::identity(),
            content: NodeContent::Empty,
        }
    }

    pub fn parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn content(mut self, content: NodeContent) -> Self {
        self.content = content;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    /// A radius of zero fits the sphere to the node's own scale.
    Sphere { radius: f32 },
}

/// What a finished load produced: a list of units, some of which may be
/// missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAsset {
    pub units: Vec<Option<PrefabId>>,
}

impl LoadedAsset {
    pub fn first_unit(&self, path: &Path) -> HostResult<PrefabId> {
        self.units
            .iter()
            .flatten()
            .next()
            .copied()
            .ok_or_else(|| HostError::NoLoadableUnit(path.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    HoverEnter(NodeId),
    HoverExit(NodeId),
    Click(NodeId),
    AssetLoaded {
        path: PathBuf,
        result: HostResult<LoadedAsset>,
    },
}

/// Walks up from `node` composing local transforms into a world transform.
/// `lookup` returns a node's local transform and parent.
pub fn compose_world<F>(node: NodeId, lookup: F) -> HostResult<Transform>
where
    F: Fn(NodeId) -> Option<(Transform, Option<NodeId>)>,
{
    let mut chain = vec![];
    let mut current = Some(node);
    while let Some(id) = current {
        let (local, parent) = lookup(id).ok_or(HostError::UnknownNode(id))?;
        chain.push(local);
        current = parent;
    }

    Ok(chain
        .iter()
        .rev()
        .fold(Transform::identity(), |world, local| world.compose(local)))
}

pub trait SceneHost {
    fn create_node(&mut self, spec: NodeSpec) -> HostResult<NodeId>;

    /// Creates a node showing the given unit of a loaded asset.
    fn instantiate(&mut self, prefab: PrefabId, spec: NodeSpec) -> HostResult<NodeId>;

    /// Removes a node together with everything below it.
    fn destroy_node(&mut self, node: NodeId) -> HostResult<()>;

    fn find_node(&self, name: &str) -> Option<NodeId>;

    fn parent(&self, node: NodeId) -> HostResult<Option<NodeId>>;

    fn transform(&self, node: NodeId) -> HostResult<Transform>;

    fn set_transform(&mut self, node: NodeId, transform: Transform) -> HostResult<()>;

    fn set_visible(&mut self, node: NodeId, visible: bool) -> HostResult<()>;

    fn set_collider(&mut self, node: NodeId, collider: Collider) -> HostResult<()>;

    /// Makes the node report hover and click events.
    fn set_interactive(&mut self, node: NodeId) -> HostResult<()>;

    /// Starts loading an asset. The outcome arrives later as
    /// `HostEvent::AssetLoaded` with the same path.
    fn begin_load(&mut self, path: &Path) -> HostResult<()>;

    /// Tweens the node from where it is now to `target`.
    fn animate_to(
        &mut self,
        node: NodeId,
        target: Transform,
        duration: Duration,
        easing: Easing,
    ) -> HostResult<()>;

    fn create_animation(&mut self, data: AnimationData) -> HostResult<AnimationId>;

    /// Plays an animation on a node, looping forever.
    fn play_animation(&mut self, animation: AnimationId, node: NodeId) -> HostResult<()>;

    fn advance(&mut self, dt: Duration);

    fn poll_events(&mut self) -> Vec<HostEvent>;
}
