extern crate emlab;

use assert_approx_eq::assert_approx_eq;
use emlab::constant::SANDBOX_STORAGE_KEY;
use emlab::experiment::Experiment;
use emlab::host::{KeyValueStore, MemoryStore, NodeSet};
use emlab::magnetic::bar_magnet::BarMagnet;
use emlab::magnetic::solenoid::{CurrentDirection, Solenoid};
use emlab::pose::Pose;
use emlab::sandbox::encode_sources;
use emlab::simulation::Simulation;
use emlab::source::Source;
use nalgebra::{UnitQuaternion, Vector3};

const DT: f64 = 1.0 / 60.0;

fn sample_points() -> Vec<Vector3<f64>> {
    vec![
        Vector3::new(3.0, 0.2, -1.0),
        Vector3::new(-2.5, 0.0, 2.0),
        Vector3::new(0.5, 1.5, 0.5),
    ]
}

#[test]
fn save_then_load_restores_sources() {
    let mut simulation = Simulation::default();
    let mut scene = NodeSet::default();
    simulation.activate(Experiment::Sandbox);
    simulation.add_source(
        Pose::new(
            Vector3::new(2.0, 0.0, 1.0),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.7),
        ),
        Source::Solenoid(Solenoid::new(25, 2.0, CurrentDirection::Reverse, 0.5, 2.0)),
    );
    let extra = simulation.add_source(
        Pose::at(Vector3::new(-3.0, 0.0, 0.0)),
        Source::BarMagnet(BarMagnet::new(1.5, 2.0, 0.5, 0.5)),
    );
    simulation.tick(DT, &mut scene);

    let before = encode_sources(simulation.world());
    let fields: Vec<_> = sample_points().iter().map(|p| simulation.field_at(p)).collect();
    let lines = simulation.readout().streamlines;

    let mut store = MemoryStore::default();
    assert_eq!(simulation.save_sandbox(&mut store).ok(), Some(3));
    assert!(store.get(SANDBOX_STORAGE_KEY).is_some());

    simulation.remove_source(extra);
    simulation.tick(DT, &mut scene);
    assert_eq!(encode_sources(simulation.world()).len(), 2);

    assert_eq!(simulation.load_sandbox(&store).ok(), Some(3));
    simulation.tick(DT, &mut scene);

    let after = encode_sources(simulation.world());
    assert_eq!(after.len(), before.len());
    for (a, b) in before.iter().zip(after.iter()) {
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.user_data, b.user_data);
        assert_approx_eq!(a.position.x, b.position.x, 1e-12);
        assert_approx_eq!(a.position.y, b.position.y, 1e-12);
        assert_approx_eq!(a.position.z, b.position.z, 1e-12);
        assert_approx_eq!(a.rotation.x, b.rotation.x, 1e-9);
        assert_approx_eq!(a.rotation.y, b.rotation.y, 1e-9);
        assert_approx_eq!(a.rotation.z, b.rotation.z, 1e-9);
    }
    for (point, field) in sample_points().iter().zip(fields.iter()) {
        assert!((simulation.field_at(point) - field).norm() < 1e-9);
    }
    assert_eq!(simulation.readout().streamlines, lines);
    assert_eq!(scene.count_streamlines(), lines);
}

#[test]
fn load_switches_to_sandbox() {
    let mut store = MemoryStore::default();
    store.set(
        SANDBOX_STORAGE_KEY,
        r#"[{"type":"barMagnet","position":{"x":1,"y":0,"z":0},"rotation":{"x":0,"y":0,"z":0},"userData":{"strength":2}}]"#
            .to_string(),
    );
    let mut simulation = Simulation::default();
    simulation.activate(Experiment::LenzLaw);
    assert_eq!(simulation.load_sandbox(&store).ok(), Some(1));
    assert_eq!(simulation.active(), Some(Experiment::Sandbox));
    let saved = encode_sources(simulation.world());
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].user_data.strength, Some(2.0));
}
