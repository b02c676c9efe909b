use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Runs last each tick. A broken invariant is a bug: debug builds stop on it, release
/// builds log it and clamp the world back into shape.
pub struct BookkeepingSystem;

impl BookkeepingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BookkeepingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BookkeepingSystem {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if let Err(violation) = world.check_invariants() {
            debug_assert!(false, "invariant violated at tick {}: {violation}", ctx.tick);
            tracing::warn!(tick = ctx.tick, %violation, "invariant violated; clamping");
            world.repair_invariants();
        }
        Ok(())
    }
}
