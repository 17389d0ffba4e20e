//! Lifetime of experiment-owned entities.

use crate::arrows::FlowArrow;
use specs::{Component, Entities, Join, NullStorage, ReadStorage, World};

/// Marks an entity created by the active experiment. Teardown deletes every marked entity.
#[derive(Component, Default)]
#[storage(NullStorage)]
pub struct ExperimentOwned;

/// Deletes every experiment-owned entity and every flow arrow. Returns the number deleted.
///
/// Deletion takes effect at the next `world.maintain()`.
pub fn delete_owned_entities(world: &mut World) -> usize {
    let (entities, owned, arrows): (
        Entities,
        ReadStorage<ExperimentOwned>,
        ReadStorage<FlowArrow>,
    ) = world.system_data();
    let mut deleted = 0;
    for (entity, _) in (&entities, &owned).join() {
        if entities.delete(entity).is_ok() {
            deleted += 1;
        }
    }
    for (entity, _) in (&entities, &arrows).join() {
        if entities.delete(entity).is_ok() {
            deleted += 1;
        }
    }
    deleted
}
