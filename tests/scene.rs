use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use approx::assert_relative_eq;
use nalgebra::{UnitQuaternion, Vector3};

use mr_orrery::config::{GearMotion, SceneConfig};
use mr_orrery::error::SceneError;
use mr_orrery::host::{HostEvent, MemoryHost, NodeId, SceneHost};
use mr_orrery::model::BodyRegistry;
use mr_orrery::scene::OrreryApp;

const FRAME: Duration = Duration::from_millis(16);

/// Earth and its twin share a model, the moon has no name, and the gear gets
/// the default spin.
const BODIES: &str = r#"{
    "earth": {
        "name": "Earth", "model": "planet.obj", "parent": "sun",
        "diameter": 12742, "labelOffsetY": 0.6,
        "distance": 7, "day": 1, "year": 365, "inclination": 0, "obliquity": 23.44
    },
    "twin": {
        "name": "Counter-Earth", "model": "planet.obj", "parent": "sun",
        "diameter": 12742, "labelOffsetY": 0.6,
        "distance": 7, "day": 1, "year": 365, "inclination": 0, "obliquity": 90
    },
    "moon": {
        "name": "", "model": "moon.obj", "parent": "earth",
        "diameter": 3475,
        "distance": 7.9, "day": 27, "year": 27, "inclination": 5, "obliquity": 6.7
    },
    "dust": {
        "name": "Dust", "model": "dust.obj",
        "diameter": 0,
        "distance": 3, "day": 0, "year": 0, "inclination": 0, "obliquity": 0
    },
    "gear": {
        "name": "Gear", "model": "gear.obj",
        "diameter": 1000, "visible": false,
        "distance": -3, "day": 0, "year": 0, "inclination": 0, "obliquity": 0
    }
}"#;

fn registry() -> BodyRegistry {
    BodyRegistry::from_json_str(BODIES).unwrap()
}

fn started_app(host: MemoryHost, config: SceneConfig) -> OrreryApp<MemoryHost> {
    let mut app = OrreryApp::new(host, registry(), config);
    app.start().unwrap();
    // Loads finish on the first frame
    app.update(FRAME);
    app
}

fn model_of(app: &OrreryApp<MemoryHost>, key: &str) -> NodeId {
    app.actors(key).unwrap().model
}

fn run_for(app: &mut OrreryApp<MemoryHost>, duration: Duration) {
    let frames = duration.as_millis() / FRAME.as_millis() + 1;
    for _ in 0..frames {
        app.update(FRAME);
    }
}

#[test]
fn test_construction() {
    let app = started_app(MemoryHost::new(), SceneConfig::default());

    assert_eq!(app.built_bodies().count(), 5);
    assert_eq!(app.pending_bodies(), 0);

    let root = app.host().find_node("solar-system").unwrap();
    for (key, actors) in app.built_bodies() {
        for (child, parent) in actors.parent_links() {
            assert_eq!(app.host().parent(child).unwrap(), Some(parent), "{}", key);
        }
        assert_eq!(app.host().parent(actors.orbital_plane).unwrap(), Some(root));
    }

    let earth = app.actors("earth").unwrap();
    assert_eq!(app.host().find_node("earth-obliquity1"), Some(earth.obliquity_tilt));
    assert_eq!(app.host().find_node("earth-model"), Some(earth.model));

    // Shared models load once
    assert_eq!(app.host().load_count("assets/planet.obj"), 1);
    assert_eq!(app.host().load_count("assets/popup.obj"), 1);

    let gear = app.host().node(model_of(&app, "gear")).unwrap();
    assert!(!gear.visible);
}

#[test]
fn test_one_bob_per_named_body() {
    let app = started_app(MemoryHost::new(), SceneConfig::default());

    // earth, twin, dust and gear bob; the moon has no name
    assert_eq!(app.timers().len(), 4);
    for key in ["earth", "twin", "dust", "gear"] {
        assert!(app.bob_running(key), "{}", key);
    }
    assert!(!app.bob_running("moon"));
    assert_eq!(app.body_for_node(model_of(&app, "moon")), None);
    assert_eq!(app.body_for_node(model_of(&app, "earth")), Some("earth"));
}

#[test]
fn test_already_built() {
    let mut app = started_app(MemoryHost::new(), SceneConfig::default());
    assert!(matches!(
        app.build_body("earth"),
        Err(SceneError::AlreadyBuilt(_))
    ));
    assert!(matches!(
        app.build_body("pluto"),
        Err(SceneError::UnknownBody(_))
    ));
}

#[test]
fn test_geometry_edge_cases() {
    let app = started_app(MemoryHost::new(), SceneConfig::default());

    let dust = app.host().transform(model_of(&app, "dust")).unwrap();
    assert_eq!(dust.scale, Vector3::zeros());

    let tilt = app
        .host()
        .transform(app.actors("twin").unwrap().obliquity_tilt)
        .unwrap();
    let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
    assert_relative_eq!(tilt.rotation, expected, epsilon = 1e-6);

    let position = app
        .host()
        .transform(app.actors("earth").unwrap().orbital_position)
        .unwrap();
    assert_relative_eq!(position.position, Vector3::new(7.0, 0.0, 0.0));
}

#[test]
fn test_hover_cycles_keep_one_timer() {
    let mut app = started_app(MemoryHost::new(), SceneConfig::default());
    let earth = model_of(&app, "earth");

    for _ in 0..5 {
        app.host_mut().push_event(HostEvent::HoverEnter(earth));
        app.host_mut().push_event(HostEvent::HoverEnter(earth));
        app.update(FRAME);
        assert!(!app.bob_running("earth"));

        app.host_mut().push_event(HostEvent::HoverExit(earth));
        app.host_mut().push_event(HostEvent::HoverExit(earth));
        app.update(FRAME);
        assert!(app.bob_running("earth"));
    }

    // Four bobs plus the one pending popup shrink
    assert_eq!(app.timers().len(), 5);
    assert!(app.popup_shrink_pending());
}

#[test]
fn test_box_opens_and_closes() {
    let mut app = started_app(MemoryHost::new(), SceneConfig::default());
    let earth = model_of(&app, "earth");
    let lids: Vec<_> = app.lids().collect();
    assert_eq!(lids.len(), 2);

    app.host_mut().push_event(HostEvent::HoverEnter(earth));
    app.update(FRAME);
    for lid in lids.iter() {
        let target = app.host().tween_target(*lid).unwrap();
        assert_relative_eq!(target.position.y, 0.9);
    }

    app.host_mut().push_event(HostEvent::HoverExit(earth));
    app.update(FRAME);
    for lid in lids.iter() {
        let target = app.host().tween_target(*lid).unwrap();
        assert_relative_eq!(target.position.y, 0.5);
    }

    run_for(&mut app, Duration::from_secs(2));
    for lid in lids.iter() {
        assert!(!app.host().is_animating(*lid));
        assert_relative_eq!(app.host().transform(*lid).unwrap().position.y, 0.5);
    }
}

#[test]
fn test_click_reveals_popup_and_cancels_shrink() {
    let mut app = started_app(MemoryHost::new(), SceneConfig::default());
    let earth = model_of(&app, "earth");
    let popup = app.popup().unwrap();
    assert!(!app.host().node(popup).unwrap().visible);

    app.host_mut().push_event(HostEvent::HoverEnter(earth));
    app.host_mut().push_event(HostEvent::HoverExit(earth));
    app.update(FRAME);
    assert!(app.popup_shrink_pending());

    app.host_mut().push_event(HostEvent::Click(earth));
    app.update(FRAME);
    assert!(!app.popup_shrink_pending());
    assert!(app.host().node(popup).unwrap().visible);
    let target = app.host().tween_target(popup).unwrap();
    assert_relative_eq!(target.scale, Vector3::repeat(0.5));

    // Nothing shrinks it while the timer is cancelled
    run_for(&mut app, Duration::from_secs(4));
    assert_relative_eq!(
        app.host().transform(popup).unwrap().scale,
        Vector3::repeat(0.5)
    );

    // The next hover exit schedules the shrink again, which fires after the delay
    app.host_mut().push_event(HostEvent::HoverExit(earth));
    app.update(FRAME);
    run_for(&mut app, Duration::from_millis(3100));
    assert!(!app.popup_shrink_pending());
    run_for(&mut app, Duration::from_millis(1100));
    assert_relative_eq!(app.host().transform(popup).unwrap().scale, Vector3::zeros());
}

#[test]
fn test_unnamed_body_ignores_pointer() {
    let mut app = started_app(MemoryHost::new(), SceneConfig::default());
    let moon = model_of(&app, "moon");
    let timers_before = app.timers().len();

    app.host_mut().push_event(HostEvent::HoverEnter(moon));
    app.host_mut().push_event(HostEvent::Click(moon));
    app.host_mut().push_event(HostEvent::HoverExit(moon));
    app.update(FRAME);

    assert_eq!(app.timers().len(), timers_before);
    assert!(!app.popup_shrink_pending());
    assert!(!app.host().node(app.popup().unwrap()).unwrap().visible);
    assert!(app.lids().all(|lid| !app.host().is_animating(lid)));
}

#[test]
fn test_label_bob_stays_bounded() {
    let mut app = started_app(MemoryHost::new(), SceneConfig::default());
    let label = app.actors("earth").unwrap().label;
    let rest = app.animation("earth").unwrap().label_rest().position.y;
    let amplitude = app.animation("earth").unwrap().bob_amplitude();
    assert_relative_eq!(amplitude, 0.05);

    let mut highest = rest;
    for _ in 0..300 {
        app.update(FRAME);
        let y = app.host().transform(label).unwrap().position.y;
        assert!(y >= rest - 1e-6 && y <= rest + amplitude + 1e-6, "label at {}", y);
        highest = highest.max(y);
    }
    assert_relative_eq!(highest, rest + amplitude, epsilon = 1e-6);
}

#[test]
fn test_body_failure_is_isolated() {
    let mut host = MemoryHost::new();
    host.fail_node_creation("twin-position");
    host.fail_loads_of("assets/moon.obj");
    let app = started_app(host, SceneConfig::default());

    assert!(app.actors("twin").is_none());
    assert!(app.actors("moon").is_none());
    assert!(app.actors("earth").is_some());
    assert!(app.actors("gear").is_some());
    assert_eq!(app.pending_bodies(), 0);
    assert!(!app.bob_running("twin"));
}

#[test]
fn test_failed_build_leaves_no_nodes() {
    let mut host = MemoryHost::new();
    host.fail_node_creation("twin-obliquity1");
    let mut app = started_app(host, SceneConfig::default());

    assert!(app.actors("twin").is_none());
    for name in ["twin-inclination", "twin-position", "twin-obliquity0"] {
        assert_eq!(app.host().find_node(name), None, "{}", name);
    }
    assert!(app.host().nodes().all(|(_, node)| !node.name.starts_with("twin-")));

    // A retry builds fresh nodes that the names resolve to
    app.host_mut().allow_node_creation("twin-obliquity1");
    app.build_body("twin").unwrap();
    let twin = app.actors("twin").unwrap();
    assert_eq!(app.host().find_node("twin-inclination"), Some(twin.orbital_plane));
    assert_eq!(app.host().find_node("twin-position"), Some(twin.orbital_position));
}

#[test]
fn test_failed_load_removes_frames() {
    let mut host = MemoryHost::new();
    host.fail_loads_of("assets/moon.obj");
    let app = started_app(host, SceneConfig::default());

    assert!(app.actors("moon").is_none());
    assert_eq!(app.host().find_node("moon-inclination"), None);
    assert_eq!(app.host().find_node("moon-obliquity1"), None);
}

#[test]
fn test_cached_model_builds_immediately() {
    let mut host = MemoryHost::new();
    host.fail_node_creation("twin-position");
    let mut app = started_app(host, SceneConfig::default());
    assert!(app.actors("earth").is_some());
    assert!(app.actors("twin").is_none());
    assert_eq!(app.host().load_count("assets/planet.obj"), 1);

    // Earth's load has finished, so the twin reuses it without a frame
    app.host_mut().allow_node_creation("twin-position");
    app.build_body("twin").unwrap();
    assert!(app.actors("twin").is_some());
    assert_eq!(app.pending_bodies(), 0);
    assert!(app.bob_running("twin"));
    assert_eq!(app.host().load_count("assets/planet.obj"), 1);

    let earth = app.host().node(model_of(&app, "earth")).unwrap().prefab;
    let twin = app.host().node(model_of(&app, "twin")).unwrap().prefab;
    assert_eq!(earth, twin);
}

#[test]
fn test_oversized_durations_do_not_panic() {
    let config: SceneConfig = serde_json::from_str(
        r#"{
            "showcase": { "open_secs": 1e30, "close_delay_secs": 1e30 },
            "gear": { "body": "gear", "motion": { "kind": "spin", "period_secs": 1e30 } }
        }"#,
    )
    .unwrap();
    let mut app = started_app(MemoryHost::new(), config);
    let earth = model_of(&app, "earth");

    app.host_mut().push_event(HostEvent::HoverEnter(earth));
    app.update(FRAME);
    app.host_mut().push_event(HostEvent::Click(earth));
    app.host_mut().push_event(HostEvent::HoverExit(earth));
    app.update(FRAME);
    run_for(&mut app, Duration::from_secs(1));

    assert!(app.popup_shrink_pending());
    assert!(app.host().is_animating(model_of(&app, "gear")));
}

#[test]
fn test_missing_popup_keeps_clicks_harmless() {
    let mut host = MemoryHost::new();
    host.fail_loads_of("assets/popup.obj");
    let mut app = started_app(host, SceneConfig::default());
    assert_eq!(app.popup(), None);

    let earth = model_of(&app, "earth");
    app.host_mut().push_event(HostEvent::Click(earth));
    app.update(FRAME);
    assert_eq!(app.built_bodies().count(), 5);
}

#[test]
fn test_gear_spins() {
    let app = started_app(MemoryHost::new(), SceneConfig::default());
    assert!(app.host().is_animating(model_of(&app, "gear")));
    assert!(!app.host().is_animating(model_of(&app, "earth")));
}

#[test]
fn test_gear_oscillates_on_timer() {
    let mut config = SceneConfig::default();
    if let Some(gear) = config.gear.as_mut() {
        gear.motion = GearMotion::Oscillate {
            step_degrees: 10.0,
            interval_ms: 50,
            limit: 3,
        };
    }
    let mut app = started_app(MemoryHost::new(), config);
    let gear = model_of(&app, "gear");
    assert!(!app.host().is_animating(gear));
    // Four bobs and the gear
    assert_eq!(app.timers().len(), 5);

    let rest = app.host().transform(gear).unwrap().rotation;
    run_for(&mut app, Duration::from_millis(60));
    let rocked = app.host().transform(gear).unwrap().rotation;
    assert!(rest.angle_to(&rocked) > 0.1);
}

#[test]
fn test_orbits_move_bodies() {
    let mut config = SceneConfig::default();
    config.orbits.enabled = true;
    // A quarter of Earth's year per second
    config.orbits.time_scale = 365.0 / 4.0;
    let mut app = started_app(MemoryHost::new(), config);

    run_for(&mut app, Duration::from_millis(984));
    let earth = app.actors("earth").unwrap();
    let world = app.host().world_transform(earth.orbital_position).unwrap();
    // About a quarter turn around the Sun
    assert!(world.position.z.abs() > 1.0);
    assert_relative_eq!(world.position.norm(), 7.0, epsilon = 1e-3);

    // The carrier cancels the orbit, so the axial tilt keeps its direction
    let tilt = app.host().world_transform(earth.obliquity_tilt).unwrap();
    let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 23.44f32.to_radians());
    assert_relative_eq!(tilt.rotation, expected, epsilon = 1e-4);
}

#[test]
fn test_headless_describe() {
    let app = started_app(MemoryHost::new(), SceneConfig::default());
    let tree = app.host().describe();
    assert!(tree.starts_with("solar-system"));
    assert!(tree.contains("earth-model"));
    assert!(tree.contains("model=assets/planet.obj"));
    assert!(tree.contains("text=\"Earth\""));
}
