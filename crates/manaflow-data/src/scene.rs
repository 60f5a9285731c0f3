//! Scenes: a simulation configuration, a set of template placements and
//! an optional starting pool.

use crate::library::TemplateLibrary;
use crate::loader::{DataLoadError, check_non_negative, deserialize_file, require_data_file};
use crate::schema::SceneData;
use manaflow_core::direction::DirectionMask;
use manaflow_core::engine::Simulation;
use manaflow_core::flow::FlowUnit;
use manaflow_core::grid::GridPosition;
use std::path::Path;
use tracing::info;

/// A loaded scene, ready to step.
#[derive(Debug)]
pub struct Scene {
    pub simulation: Simulation,
    pub library: TemplateLibrary,
}

/// Load `templates.*` and `scene.*` from `dir` and build the simulation.
pub fn load_scene(dir: &Path) -> Result<Scene, DataLoadError> {
    let library = TemplateLibrary::load(dir)?;
    let scene_path = require_data_file(dir, "scene")?;
    let data: SceneData = deserialize_file(&scene_path)?;
    let simulation = build_simulation(&data, &library, &scene_path)?;

    info!(
        dir = %dir.display(),
        templates = library.len(),
        nodes = simulation.node_count(),
        "scene loaded"
    );
    Ok(Scene {
        simulation,
        library,
    })
}

/// Place every template named in `data` and seed the pool. `file` is only
/// used in error messages.
pub fn build_simulation(
    data: &SceneData,
    library: &TemplateLibrary,
    file: &Path,
) -> Result<Simulation, DataLoadError> {
    let mut simulation = Simulation::new(data.simulation.clone());

    for placement in &data.placements {
        let template =
            library
                .get(&placement.template)
                .ok_or_else(|| DataLoadError::UnresolvedRef {
                    file: file.to_path_buf(),
                    name: placement.template.clone(),
                    expected_kind: "template",
                })?;
        simulation
            .place(
                GridPosition::new(placement.x, placement.y),
                template,
                placement.rotations,
            )
            .map_err(|source| DataLoadError::Placement {
                file: file.to_path_buf(),
                source,
            })?;
    }

    for seed in &data.pool {
        let amount = check_non_negative(seed.amount, "amount", &seed.item, file)?;
        let unit = FlowUnit::new(seed.item.as_str(), 0.0, DirectionMask::DISPERSE)
            .with_quantity(amount);
        simulation.pool_mut().merge(&unit);
    }

    Ok(simulation)
}
