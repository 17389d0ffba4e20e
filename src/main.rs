extern crate emlab as lib;

use lib::configuration::EmLabConfiguration;
use lib::drag::DragEvent;
use lib::experiment::Experiment;
use lib::host::{MemoryStore, NodeSet};
use lib::simulation::Simulation;
use lib::slider::{SliderEvent, SliderId};
use nalgebra::Vector3;
use specs::WorldExt;
use tracing_subscriber::EnvFilter;

const DT: f64 = 1.0 / 60.0;

fn main() -> Result<(), lib::error::EmLabError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EmLabConfiguration::from_yaml_file(path)?,
        None => EmLabConfiguration::default(),
    };
    let mut simulation = Simulation::new(config);
    let mut scene = NodeSet::default();

    for experiment in Experiment::ALL.iter() {
        simulation.activate(*experiment);
        match experiment {
            Experiment::Induction => drag_magnet_through_coil(&mut simulation, &mut scene),
            Experiment::LenzLaw => simulation.release_bodies(),
            Experiment::InductionCooktop => simulation.push_slider(SliderEvent {
                id: SliderId::CooktopField,
                value: 1.0,
            }),
            _ => {}
        }
        for _ in 0..300 {
            simulation.tick(DT, &mut scene);
        }
        println!("{:?}: {:?}", experiment, simulation.readout());
        println!("live scene nodes: {}", scene.live.len());
    }

    simulation.activate(Experiment::Sandbox);
    simulation.tick(DT, &mut scene);
    let mut store = MemoryStore::default();
    let saved = simulation.save_sandbox(&mut store)?;
    let restored = simulation.load_sandbox(&store)?;
    println!("sandbox: saved {} sources, restored {}", saved, restored);
    Ok(())
}

fn drag_magnet_through_coil(simulation: &mut Simulation, scene: &mut NodeSet) {
    let magnet = match simulation.world().read_resource::<lib::source::SourceRegistry>().list().first() {
        Some(magnet) => *magnet,
        None => return,
    };
    simulation.push_drag(DragEvent::Start { target: magnet });
    for i in 0..=10 {
        let y = 3.0 - 0.2 * i as f64;
        simulation.push_drag(DragEvent::Move {
            point: Vector3::new(0.0, y, 0.0),
        });
        simulation.tick(DT, scene);
        println!("magnet y {:.1}: {:?}", y, simulation.readout().galvanometer);
    }
    simulation.push_drag(DragEvent::End);
}
