use std::collections::BTreeMap;

use crate::world::{RegionId, World};

pub const DIFFUSION_RATE: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollutionTransfer {
    pub from: RegionId,
    pub to: RegionId,
    pub amount: f64,
}

/// Every downhill flow for one pass, computed from a single pre-pass reading so that the
/// order regions are visited in cannot matter.
pub fn pollution_transfers(world: &World) -> Vec<PollutionTransfer> {
    let levels: BTreeMap<RegionId, f64> = world
        .regions()
        .map(|region| (region.id, region.climate.pollution()))
        .collect();
    let mut transfers = Vec::new();
    for (&id, &level) in &levels {
        for neighbor in world.neighbors(id) {
            let Some(&neighbor_level) = levels.get(&neighbor) else {
                continue;
            };
            if level > neighbor_level {
                transfers.push(PollutionTransfer {
                    from: id,
                    to: neighbor,
                    amount: (level - neighbor_level) * DIFFUSION_RATE,
                });
            }
        }
    }
    transfers
}

/// Spreads pollution along the adjacency graph, then lets each biome absorb its share.
pub fn diffuse_pollution(world: &mut World) {
    let mut deltas: BTreeMap<RegionId, f64> = BTreeMap::new();
    for transfer in pollution_transfers(world) {
        *deltas.entry(transfer.from).or_default() -= transfer.amount;
        *deltas.entry(transfer.to).or_default() += transfer.amount;
    }
    for region in world.regions.values_mut() {
        let delta = deltas.get(&region.id).copied().unwrap_or(0.0);
        let absorption = region.biome.profile().pollution_absorption;
        let level = (region.climate.pollution() + delta) * (1.0 - absorption);
        region.climate.set_pollution(level);
    }
}
