/// Roaming creatures: population, respawn, adjacency and catching.
///
/// Creatures live in a fixed-capacity arena. A slot is allocated once and
/// then recycled: catching marks it, respawning re-rolls its room and cell.
/// Slots are never freed, so `creatures.len()` is a high-water mark.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::grid::{GridCell, GRID_HEIGHT, GRID_WIDTH};
use super::room::{GridWorld, RoomId, ROOM_COUNT};
use super::species::{PerSpecies, Species};

pub const MAX_CREATURES: usize = 20;

/// Creatures keep this many cells away from every edge.
const SPAWN_MARGIN: i32 = 2;
const SPAWN_TRIALS: usize = 100;

#[derive(Clone, Debug)]
pub struct Creature {
    pub id: usize,
    pub species: Species,
    pub cell: GridCell,
    pub room: RoomId,
    pub caught: bool,
}

/// A cell no creature may spawn on, typically where the player stands.
pub type Reserved = Option<(RoomId, GridCell)>;

pub struct CreatureManager {
    creatures: Vec<Creature>,
    total_caught: u32,
    rng: StdRng,
}

impl CreatureManager {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    #[cfg(test)]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        CreatureManager {
            creatures: Vec::with_capacity(MAX_CREATURES),
            total_caught: 0,
            rng,
        }
    }

    #[cfg(test)]
    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    #[cfg(test)]
    pub fn get(&self, id: usize) -> Option<&Creature> {
        self.creatures.get(id)
    }

    #[cfg(test)]
    pub fn total_caught(&self) -> u32 {
        self.total_caught
    }

    /// Uncaught creatures currently in `room`.
    pub fn creatures_in(&self, room: RoomId) -> impl Iterator<Item = &Creature> {
        self.creatures.iter().filter(move |c| !c.caught && c.room == room)
    }

    pub fn active_counts(&self) -> PerSpecies<u32> {
        let mut counts = PerSpecies::default();
        for c in self.creatures.iter().filter(|c| !c.caught) {
            counts[c.species] += 1;
        }
        counts
    }

    // ── Population ──

    pub fn spawn_initial(&mut self, targets: &PerSpecies<u32>, world: &GridWorld, reserved: Reserved) {
        info!(
            "Spawning initial creatures (Bear:{}, Raccoon:{}, Deer:{}, BigDeer:{})",
            targets[Species::Bear], targets[Species::Raccoon],
            targets[Species::Deer], targets[Species::BigDeer],
        );

        for (species, count) in targets.iter() {
            for _ in 0..count {
                if self.creatures.len() >= MAX_CREATURES {
                    warn!("Creature capacity ({}) reached, spawning stopped", MAX_CREATURES);
                    return;
                }
                let room = self.random_room();
                let Some(cell) = self.find_spawn_position(world, room, reserved) else {
                    warn!("No spawn position for {} in {}", species.name(), world.room(room).name);
                    continue;
                };
                let id = self.creatures.len();
                debug!("Spawned {} #{} at ({}, {}) in {}", species.name(), id, cell.x, cell.y, world.room(room).name);
                self.creatures.push(Creature { id, species, cell, room, caught: false });
            }
        }

        info!("Spawned {} creatures total", self.creatures.len());
    }

    /// Top each species back up to its target, reusing caught slots of the
    /// same species before allocating new ones.
    pub fn check_respawn(&mut self, targets: &PerSpecies<u32>, world: &GridWorld, reserved: Reserved) {
        let active = self.active_counts();

        for (species, target) in targets.iter() {
            let needed = target.saturating_sub(active[species]);
            for _ in 0..needed {
                let reuse = self.creatures.iter().position(|c| c.caught && c.species == species);
                if reuse.is_none() && self.creatures.len() >= MAX_CREATURES {
                    warn!("Creature capacity ({}) reached, cannot respawn {}", MAX_CREATURES, species.name());
                    break;
                }

                let room = self.random_room();
                let Some(cell) = self.find_spawn_position(world, room, reserved) else {
                    warn!("No respawn position for {} in {}", species.name(), world.room(room).name);
                    break;
                };

                let id = reuse.unwrap_or_else(|| {
                    let id = self.creatures.len();
                    self.creatures.push(Creature { id, species, cell, room, caught: true });
                    id
                });

                let c = &mut self.creatures[id];
                c.room = room;
                c.cell = cell;
                c.caught = false;
                info!("Respawned {} #{} at ({}, {}) in {}", species.name(), id, cell.x, cell.y, world.room(room).name);
            }
        }
    }

    fn random_room(&mut self) -> RoomId {
        // from_index on 0..ROOM_COUNT is always Some
        RoomId::from_index(self.rng.gen_range(0..ROOM_COUNT)).unwrap_or(RoomId::MainHall)
    }

    fn is_valid_spawn(&self, world: &GridWorld, room: RoomId, cell: GridCell, reserved: Reserved) -> bool {
        world.is_free_for_spawn(room, cell)
            && reserved != Some((room, cell))
            && !self.blocks(cell, room)
    }

    /// Random trials inside the margin band, then a row-major sweep of the
    /// same band. `None` only when the band has no valid cell at all.
    pub fn find_spawn_position(&mut self, world: &GridWorld, room: RoomId, reserved: Reserved) -> Option<GridCell> {
        let (x_lo, x_hi) = (SPAWN_MARGIN, GRID_WIDTH as i32 - SPAWN_MARGIN);
        let (y_lo, y_hi) = (SPAWN_MARGIN, GRID_HEIGHT as i32 - SPAWN_MARGIN);

        for _ in 0..SPAWN_TRIALS {
            let cell = GridCell::new(self.rng.gen_range(x_lo..x_hi), self.rng.gen_range(y_lo..y_hi));
            if self.is_valid_spawn(world, room, cell, reserved) {
                return Some(cell);
            }
        }

        (y_lo..y_hi)
            .flat_map(|y| (x_lo..x_hi).map(move |x| GridCell::new(x, y)))
            .find(|&cell| self.is_valid_spawn(world, room, cell, reserved))
    }

    /// Put an uncaught creature on a chosen cell.
    #[cfg(test)]
    pub fn place(&mut self, species: Species, room: RoomId, cell: GridCell) -> Option<usize> {
        if self.creatures.len() >= MAX_CREATURES {
            return None;
        }
        let id = self.creatures.len();
        self.creatures.push(Creature { id, species, cell, room, caught: false });
        Some(id)
    }

    // ── Queries ──

    /// First uncaught creature in `room` exactly one orthogonal step from
    /// `cell`. Lowest slot wins.
    pub fn adjacent_to(&self, cell: GridCell, room: RoomId) -> Option<&Creature> {
        self.creatures_in(room).find(|c| c.cell.is_orthogonally_adjacent(cell))
    }

    pub fn blocks(&self, cell: GridCell, room: RoomId) -> bool {
        self.creatures_in(room).any(|c| c.cell == cell)
    }

    /// Mark caught. Returns the species on the first catch only.
    pub fn catch(&mut self, id: usize) -> Option<Species> {
        let c = self.creatures.get_mut(id)?;
        if c.caught {
            return None;
        }
        c.caught = true;
        self.total_caught += 1;
        info!("Caught {} #{} ({} total this session)", c.species.name(), id, self.total_caught);
        Some(c.species)
    }
}

impl Default for CreatureManager {
    fn default() -> Self {
        Self::new()
    }
}
