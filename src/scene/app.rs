use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use nalgebra::Vector3;

use super::assets::{AssetCache, AssetRequest};
use super::body::{BodyGeometry, CelestialBodyActors};
use super::orbit::orbital_angles;
use crate::anim::{AnimationData, BodyAnimation, TimerHandle, TimerQueue};
use crate::config::{self, GearMotion, LidConfig, SceneConfig};
use crate::error::{HostResult, SceneError, SceneResult};
use crate::host::{Collider, HostEvent, NodeContent, NodeId, NodeSpec, PrefabId, SceneHost};
use crate::math::geometry::about_up;
use crate::math::Transform;
use crate::model::BodyRegistry;

const ROOT_NAME: &str = "solar-system";
const POPUP_NAME: &str = "popup";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    BobTick(String),
    GearTick(String),
    PopupShrink,
}

/// A body whose frame nodes exist but whose model is still loading.
#[derive(Debug)]
struct PartialBody {
    key: String,
    orbital_plane: NodeId,
    orbital_position: NodeId,
    obliquity_carrier: NodeId,
    obliquity_tilt: NodeId,
}

/// Whatever is waiting for an asset to finish loading.
#[derive(Debug)]
enum AssetWaiter {
    Body(PartialBody),
    Popup(NodeSpec),
}

#[derive(Debug, Default)]
struct Showcase {
    lids: Vec<(NodeId, LidConfig)>,
    popup: Option<NodeId>,
    shrink_timer: Option<TimerHandle>,
}

/// The whole scene: builds a node graph per body on the host, then drives
/// the label bob, gear, box and popup animations from hover and click events.
pub struct OrreryApp<H: SceneHost> {
    host: H,
    registry: BodyRegistry,
    config: SceneConfig,
    root: Option<NodeId>,
    assets: AssetCache<AssetWaiter>,
    timers: TimerQueue<TimerAction>,
    bodies: HashMap<String, CelestialBodyActors>,
    animations: HashMap<String, BodyAnimation>,
    building: HashSet<String>,
    // Model node -> body key, for bodies that respond to the pointer
    interactive: HashMap<NodeId, String>,
    showcase: Showcase,
    elapsed_days: f64,
}

impl<H: SceneHost> OrreryApp<H> {
    pub fn new(host: H, registry: BodyRegistry, config: SceneConfig) -> Self {
        OrreryApp {
            host,
            registry,
            config,
            root: None,
            assets: AssetCache::new(),
            timers: TimerQueue::new(),
            bodies: HashMap::new(),
            animations: HashMap::new(),
            building: HashSet::new(),
            interactive: HashMap::new(),
            showcase: Showcase::default(),
            elapsed_days: 0.0,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn timers(&self) -> &TimerQueue<TimerAction> {
        &self.timers
    }

    pub fn actors(&self, key: &str) -> Option<&CelestialBodyActors> {
        self.bodies.get(key)
    }

    pub fn animation(&self, key: &str) -> Option<&BodyAnimation> {
        self.animations.get(key)
    }

    pub fn built_bodies(&self) -> impl Iterator<Item = (&str, &CelestialBodyActors)> + '_ {
        self.bodies.iter().map(|(key, actors)| (key.as_str(), actors))
    }

    /// Number of bodies still waiting on their model.
    pub fn pending_bodies(&self) -> usize {
        self.building.len()
    }

    pub fn body_for_node(&self, node: NodeId) -> Option<&str> {
        self.interactive.get(&node).map(String::as_str)
    }

    pub fn bob_running(&self, key: &str) -> bool {
        self.animations
            .get(key)
            .map_or(false, |anim| anim.bob_running(&self.timers))
    }

    pub fn popup(&self) -> Option<NodeId> {
        self.showcase.popup
    }

    pub fn popup_shrink_pending(&self) -> bool {
        self.showcase
            .shrink_timer
            .map_or(false, |handle| self.timers.is_active(handle))
    }

    pub fn lids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.showcase.lids.iter().map(|(node, _)| *node)
    }

    pub fn elapsed_days(&self) -> f64 {
        self.elapsed_days
    }

    pub fn orbits_enabled(&self) -> bool {
        self.config.orbits.enabled
    }

    pub fn set_orbits_enabled(&mut self, enabled: bool) {
        self.config.orbits.enabled = enabled;
    }

    /// Simulated days per real second.
    pub fn time_scale(&self) -> f32 {
        self.config.orbits.time_scale
    }

    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.config.orbits.time_scale = time_scale;
    }

    /// Creates the scene root and the showcase props, then builds every body
    /// in the order the data file lists them. A body that fails to build is
    /// logged and skipped.
    pub fn start(&mut self) -> SceneResult<()> {
        let root = self.host.create_node(NodeSpec::new(ROOT_NAME))?;
        self.root = Some(root);

        self.create_showcase(root);

        let keys: Vec<String> = self.registry.names().map(str::to_owned).collect();
        tracing::info!("building {} bodies", keys.len());
        for key in keys.iter() {
            if let Err(e) = self.build_body(key) {
                log_build_failure(key, &e);
            }
        }
        Ok(())
    }

    fn create_showcase(&mut self, root: NodeId) {
        for lid in self.config.showcase.lids.clone() {
            let spec = NodeSpec::new(lid.name.as_str())
                .parent(root)
                .transform(Transform::from_position(lid.rest_position()))
                .content(NodeContent::Cuboid {
                    extents: Vector3::from(lid.size),
                });
            match self.host.create_node(spec) {
                Ok(node) => self.showcase.lids.push((node, lid)),
                Err(e) => tracing::warn!(lid = %lid.name, error = %e, "could not create lid"),
            }
        }

        let showcase = &self.config.showcase;
        let path = self.config.asset_path(&showcase.popup_model);
        let spec = NodeSpec::new(POPUP_NAME).parent(root).transform(
            Transform::from_position(showcase.popup_position()).with_uniform_scale(0.0),
        );
        if let Err(e) = self.request_asset(&path, AssetWaiter::Popup(spec)) {
            tracing::warn!(error = %e, "popup model unavailable");
        }
    }

    /// Creates the frame nodes for a body and requests its model. The body
    /// is finished (and registered) once the model is available, which may
    /// be immediately if another body already loaded it.
    pub fn build_body(&mut self, key: &str) -> SceneResult<()> {
        if self.bodies.contains_key(key) || self.building.contains(key) {
            return Err(SceneError::AlreadyBuilt(key.to_owned()));
        }
        let record = self.registry.get(key)?;
        let geometry = BodyGeometry::new(record, &self.config);
        let path = self.config.asset_path(&record.model);
        let root = self.root;

        let mut spec = NodeSpec::new(format!("{}-inclination", key))
            .transform(Transform::from_rotation(geometry.plane_tilt));
        spec.parent = root;
        let orbital_plane = self.host.create_node(spec)?;

        let partial = match self.create_frames(key, &geometry, orbital_plane) {
            Ok(partial) => partial,
            Err(e) => {
                self.discard_frames(key, orbital_plane);
                return Err(e.into());
            }
        };

        self.building.insert(key.to_owned());
        if let Err(e) = self.request_asset(&path, AssetWaiter::Body(partial)) {
            self.building.remove(key);
            self.discard_frames(key, orbital_plane);
            return Err(e.into());
        }
        Ok(())
    }

    /// Creates the frame nodes below the orbital plane.
    fn create_frames(
        &mut self,
        key: &str,
        geometry: &BodyGeometry,
        orbital_plane: NodeId,
    ) -> HostResult<PartialBody> {
        let orbital_position = self.host.create_node(
            NodeSpec::new(format!("{}-position", key))
                .parent(orbital_plane)
                .transform(Transform::from_position(geometry.orbital_position)),
        )?;
        let obliquity_carrier = self.host.create_node(
            NodeSpec::new(format!("{}-obliquity0", key)).parent(orbital_position),
        )?;
        let obliquity_tilt = self.host.create_node(
            NodeSpec::new(format!("{}-obliquity1", key))
                .parent(obliquity_carrier)
                .transform(Transform::from_rotation(geometry.axial_tilt)),
        )?;

        Ok(PartialBody {
            key: key.to_owned(),
            orbital_plane,
            orbital_position,
            obliquity_carrier,
            obliquity_tilt,
        })
    }

    /// Removes a half-built body, so a later build starts from scratch.
    fn discard_frames(&mut self, key: &str, orbital_plane: NodeId) {
        if let Err(e) = self.host.destroy_node(orbital_plane) {
            tracing::warn!(body = %key, error = %e, "could not remove partial body");
        }
    }

    fn request_asset(&mut self, path: &Path, waiter: AssetWaiter) -> HostResult<()> {
        match self.assets.request(path, waiter) {
            AssetRequest::Ready(prefab, waiter) => self.resume(waiter, Ok(prefab)),
            AssetRequest::Queued => {
                tracing::debug!(path = %path.display(), "waiting on in-flight load");
            }
            AssetRequest::Started => {
                tracing::debug!(path = %path.display(), "loading asset");
                if let Err(e) = self.host.begin_load(path) {
                    // Only the waiter we just added can be here
                    for waiter in self.assets.abandon(path) {
                        if let AssetWaiter::Body(partial) = waiter {
                            self.building.remove(&partial.key);
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn resume(&mut self, waiter: AssetWaiter, result: HostResult<PrefabId>) {
        match waiter {
            AssetWaiter::Body(partial) => {
                let key = partial.key.clone();
                let orbital_plane = partial.orbital_plane;
                self.building.remove(&key);
                let result = result
                    .map_err(SceneError::from)
                    .and_then(|prefab| self.finish_body(partial, prefab));
                if let Err(e) = result {
                    log_build_failure(&key, &e);
                    self.discard_frames(&key, orbital_plane);
                }
            }
            AssetWaiter::Popup(spec) => {
                match result.and_then(|prefab| self.host.instantiate(prefab, spec)) {
                    Ok(node) => {
                        if let Err(e) = self.host.set_visible(node, false) {
                            tracing::warn!(error = %e, "could not hide popup");
                        }
                        self.showcase.popup = Some(node);
                    }
                    Err(e) => tracing::warn!(error = %e, "popup model unavailable"),
                }
            }
        }
    }

    fn finish_body(&mut self, partial: PartialBody, prefab: PrefabId) -> SceneResult<()> {
        let key = partial.key;
        let record = self.registry.get(&key)?.clone();
        let geometry = BodyGeometry::new(&record, &self.config);

        let model = self.host.instantiate(
            prefab,
            NodeSpec::new(format!("{}-model", key))
                .parent(partial.obliquity_tilt)
                .transform(geometry.model),
        )?;
        self.host.set_collider(model, Collider::Sphere { radius: 0.0 })?;
        self.host.set_visible(model, record.visible)?;
        self.host.set_interactive(model)?;

        let label = self.host.create_node(
            NodeSpec::new(format!("{}-label", key))
                .parent(partial.orbital_position)
                .transform(geometry.label)
                .content(NodeContent::Text {
                    text: record.name.clone(),
                    height: self.config.label_height,
                }),
        )?;

        self.bodies.insert(
            key.clone(),
            CelestialBodyActors {
                orbital_plane: partial.orbital_plane,
                orbital_position: partial.orbital_position,
                label,
                obliquity_carrier: partial.obliquity_carrier,
                obliquity_tilt: partial.obliquity_tilt,
                model,
            },
        );

        let mut animation = BodyAnimation::new(geometry.label, self.config.bob.step);
        if record.is_interactive() {
            self.interactive.insert(model, key.clone());
            animation.start_bob(
                &mut self.timers,
                self.config.bob_interval(),
                TimerAction::BobTick(key.clone()),
            );
        }

        let is_gear = self.config.gear.as_ref().map_or(false, |gear| gear.body == key);
        if is_gear {
            self.start_gear(&key, model, geometry.model, &mut animation);
        }
        self.animations.insert(key.clone(), animation);

        tracing::info!(body = %key, interactive = record.is_interactive(), "built body");
        Ok(())
    }

    fn start_gear(
        &mut self,
        key: &str,
        model: NodeId,
        rest: Transform,
        animation: &mut BodyAnimation,
    ) {
        let motion = match &self.config.gear {
            Some(gear) => gear.motion,
            None => return,
        };

        match motion {
            GearMotion::Spin { period_secs } => {
                let data = AnimationData::spin(
                    Vector3::z_axis(),
                    config::seconds(period_secs),
                );
                let result = self
                    .host
                    .create_animation(data)
                    .and_then(|anim| self.host.play_animation(anim, model));
                if let Err(e) = result {
                    tracing::warn!(body = %key, error = %e, "could not start gear spin");
                }
            }
            GearMotion::Oscillate {
                step_degrees,
                interval_ms,
                limit,
            } => {
                animation.set_gear(rest, step_degrees, limit);
                animation.start_gear(
                    &mut self.timers,
                    Duration::from_millis(interval_ms),
                    TimerAction::GearTick(key.to_owned()),
                );
            }
        }
    }

    /// Whether pointer events on this body do anything.
    fn responds_to_pointer(&self, key: &str) -> SceneResult<bool> {
        if !self.bodies.contains_key(key) {
            return Err(SceneError::UnknownBody(key.to_owned()));
        }
        Ok(self.registry.get(key)?.is_interactive())
    }

    /// Pointer entered a body: the bob pauses and the box opens.
    pub fn hover_enter(&mut self, key: &str) -> SceneResult<()> {
        if !self.responds_to_pointer(key)? {
            return Ok(());
        }
        tracing::debug!(body = %key, "hover enter");

        if let Some(animation) = self.animations.get_mut(key) {
            animation.stop_bob(&mut self.timers);
        }
        self.open_box();
        Ok(())
    }

    /// Pointer left a body: the bob resumes and the box closes.
    pub fn hover_exit(&mut self, key: &str) -> SceneResult<()> {
        if !self.responds_to_pointer(key)? {
            return Ok(());
        }
        tracing::debug!(body = %key, "hover exit");

        let interval = self.config.bob_interval();
        if let Some(animation) = self.animations.get_mut(key) {
            animation.start_bob(
                &mut self.timers,
                interval,
                TimerAction::BobTick(key.to_owned()),
            );
        }
        self.close_box();
        Ok(())
    }

    /// Body clicked: the popup appears.
    pub fn click(&mut self, key: &str) -> SceneResult<()> {
        if !self.responds_to_pointer(key)? {
            return Ok(());
        }
        tracing::debug!(body = %key, "click");

        self.reveal_popup();
        Ok(())
    }

    fn animate(&mut self, node: NodeId, target: Transform) {
        let showcase = &self.config.showcase;
        let result = self
            .host
            .animate_to(node, target, showcase.open_duration(), showcase.easing);
        if let Err(e) = result {
            tracing::warn!(node = ?node, error = %e, "animation failed");
        }
    }

    fn move_lids(&mut self, open: bool) {
        let moves: Vec<_> = self
            .showcase
            .lids
            .iter()
            .map(|(node, lid)| {
                let position = if open {
                    lid.open_position()
                } else {
                    lid.rest_position()
                };
                (*node, position)
            })
            .collect();

        for (node, position) in moves {
            let current = self.host.transform(node).unwrap_or_default();
            self.animate(node, current.with_position(position));
        }
    }

    fn open_box(&mut self) {
        self.move_lids(true);
    }

    fn close_box(&mut self) {
        self.move_lids(false);

        if let Some(handle) = self.showcase.shrink_timer.take() {
            self.timers.cancel(handle);
        }
        let delay = self.config.showcase.close_delay();
        self.showcase.shrink_timer = Some(self.timers.set_timeout(delay, TimerAction::PopupShrink));
    }

    fn reveal_popup(&mut self) {
        if let Some(handle) = self.showcase.shrink_timer.take() {
            self.timers.cancel(handle);
        }
        let popup = match self.showcase.popup {
            Some(node) => node,
            None => return,
        };

        let current = self.host.transform(popup).unwrap_or_default();
        let collapsed = current.with_uniform_scale(0.0);
        let result = self
            .host
            .set_visible(popup, true)
            .and_then(|_| self.host.set_transform(popup, collapsed));
        if let Err(e) = result {
            tracing::warn!(error = %e, "could not show popup");
            return;
        }
        let scale = self.config.showcase.popup_scale;
        self.animate(popup, collapsed.with_uniform_scale(scale));
    }

    fn shrink_popup(&mut self) {
        self.showcase.shrink_timer = None;
        if let Some(popup) = self.showcase.popup {
            let current = self.host.transform(popup).unwrap_or_default();
            self.animate(popup, current.with_uniform_scale(0.0));
        }
    }

    /// Runs one frame: host animations, host events, timers and orbits.
    pub fn update(&mut self, dt: Duration) {
        self.host.advance(dt);

        for event in self.host.poll_events() {
            self.handle_event(event);
        }

        let until = self.timers.now() + dt;
        while let Some((_, action)) = self.timers.pop_due(until) {
            self.run_timer(action);
        }
        self.timers.advance_to(until);

        if self.config.orbits.enabled {
            self.elapsed_days += dt.as_secs_f64() * f64::from(self.config.orbits.time_scale);
            self.update_orbits();
        }
    }

    fn handle_event(&mut self, event: HostEvent) {
        let result = match event {
            HostEvent::HoverEnter(node) => match self.interactive.get(&node).cloned() {
                Some(key) => self.hover_enter(&key),
                None => Ok(()),
            },
            HostEvent::HoverExit(node) => match self.interactive.get(&node).cloned() {
                Some(key) => self.hover_exit(&key),
                None => Ok(()),
            },
            HostEvent::Click(node) => match self.interactive.get(&node).cloned() {
                Some(key) => self.click(&key),
                None => Ok(()),
            },
            HostEvent::AssetLoaded { path, result } => {
                let (outcome, waiters) = self.assets.complete(&path, result);
                match &outcome {
                    Ok(_) => tracing::debug!(path = %path.display(), "asset loaded"),
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "asset failed to load"),
                }
                for waiter in waiters {
                    self.resume(waiter, outcome.clone());
                }
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "could not handle host event");
        }
    }

    fn run_timer(&mut self, action: TimerAction) {
        match action {
            TimerAction::BobTick(key) => {
                let (anim, actors) = match (self.animations.get_mut(&key), self.bodies.get(&key)) {
                    (Some(anim), Some(actors)) => (anim, actors),
                    _ => return,
                };
                let label = anim.tick_bob();
                if let Err(e) = self.host.set_transform(actors.label, label) {
                    tracing::warn!(body = %key, error = %e, "bob tick failed");
                }
            }
            TimerAction::GearTick(key) => {
                let (anim, actors) = match (self.animations.get_mut(&key), self.bodies.get(&key)) {
                    (Some(anim), Some(actors)) => (anim, actors),
                    _ => return,
                };
                if let Some(transform) = anim.tick_gear() {
                    if let Err(e) = self.host.set_transform(actors.model, transform) {
                        tracing::warn!(body = %key, error = %e, "gear tick failed");
                    }
                }
            }
            TimerAction::PopupShrink => self.shrink_popup(),
        }
    }

    fn update_orbits(&mut self) {
        let spinning_gear = match &self.config.gear {
            Some(gear) if matches!(gear.motion, GearMotion::Spin { .. }) => Some(gear.body.as_str()),
            _ => None,
        };

        for (key, record) in self.registry.iter() {
            let actors = match self.bodies.get(key) {
                Some(actors) => actors,
                None => continue,
            };
            let geometry = BodyGeometry::new(record, &self.config);
            let angles = orbital_angles(record, self.elapsed_days);

            // The carrier undoes the orbit rotation, so the tilt keeps pointing
            // the same way all year.
            let mut updates = vec![
                (
                    actors.orbital_plane,
                    Transform::from_rotation(geometry.plane_tilt * about_up(angles.orbit)),
                ),
                (
                    actors.obliquity_carrier,
                    Transform::from_rotation(about_up(-angles.orbit)),
                ),
            ];
            let has_gear = self
                .animations
                .get(key)
                .map_or(false, BodyAnimation::has_gear);
            if spinning_gear != Some(key) && !has_gear {
                let model = geometry
                    .model
                    .with_rotation(about_up(angles.spin) * geometry.model.rotation);
                updates.push((actors.model, model));
            }

            for (node, transform) in updates {
                if let Err(e) = self.host.set_transform(node, transform) {
                    tracing::warn!(body = %key, error = %e, "orbit update failed");
                }
            }
        }
    }
}

fn log_build_failure(key: &str, error: &SceneError) {
    tracing::error!(body = %key, error = %error, "failed to construct body");
}
