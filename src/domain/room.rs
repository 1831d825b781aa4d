/// Static room topology: obstacle masks, doors and NPCs.
///
/// Rooms are built once from layout tables (see `layout.rs`) and never
/// change shape afterwards. The only runtime mutation is which room is
/// current, which `GridWorld::transition` owns.
///
/// All queries fail closed: anything outside the grid is an obstacle.

use log::{info, warn};

use super::grid::{GridCell, GRID_HEIGHT, GRID_WIDTH};
use super::species::Species;

pub const MAX_DOORS: usize = 4;
pub const MAX_NPCS_PER_ROOM: usize = 10;
pub const ROOM_COUNT: usize = 3;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RoomId {
    Basement,
    MainHall,
    Classroom,
}

impl RoomId {
    pub const ALL: [RoomId; ROOM_COUNT] = [RoomId::Basement, RoomId::MainHall, RoomId::Classroom];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<RoomId> {
        RoomId::ALL.get(i).copied()
    }
}

/// Cosmetic only: the renderer picks a colour per kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DoorKind {
    StairsUp,
    StairsDown,
    Plain,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Door {
    pub cell: GridCell,
    pub kind: DoorKind,
    pub target: RoomId,
    pub spawn: GridCell,
}

/// The catch quota an NPC hands out.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct QuestOffer {
    pub species: Species,
    pub required: u32,
}

/// What an NPC says at each stage of its quest.
#[derive(Clone, Copy, Debug)]
pub struct NpcLines {
    pub opening: &'static str,
    pub progress: &'static str,
    pub turn_in: &'static str,
}

#[derive(Clone, Debug)]
pub struct Npc {
    pub name: &'static str,
    pub cell: GridCell,
    pub caught: bool,
    pub portrait: &'static str,
    /// Track that replaces the room music while the player is nearby.
    pub theme: Option<&'static str>,
    pub offer: QuestOffer,
    pub lines: NpcLines,
}

/// Static description of one room, as written in the layout tables.
pub struct RoomLayout {
    pub id: RoomId,
    pub name: &'static str,
    pub music: &'static str,
    /// `GRID_HEIGHT` rows of `GRID_WIDTH` chars: `#` blocks, anything else is floor.
    pub rows: &'static [&'static str],
    pub doors: &'static [Door],
    pub npcs: &'static [Npc],
}

pub struct Room {
    pub id: RoomId,
    pub name: &'static str,
    pub music: &'static str,
    obstacles: [[bool; GRID_WIDTH]; GRID_HEIGHT],
    pub doors: Vec<Door>,
    pub npcs: Vec<Npc>,
}

impl Room {
    pub fn from_layout(layout: &RoomLayout) -> Self {
        let mut obstacles = [[false; GRID_WIDTH]; GRID_HEIGHT];
        for (y, row) in layout.rows.iter().take(GRID_HEIGHT).enumerate() {
            for (x, ch) in row.chars().take(GRID_WIDTH).enumerate() {
                obstacles[y][x] = ch == '#';
            }
        }
        if layout.rows.len() != GRID_HEIGHT {
            warn!("Room {}: layout has {} rows, expected {}", layout.name, layout.rows.len(), GRID_HEIGHT);
        }

        if layout.doors.len() > MAX_DOORS {
            warn!("Room {}: {} doors, keeping first {}", layout.name, layout.doors.len(), MAX_DOORS);
        }
        if layout.npcs.len() > MAX_NPCS_PER_ROOM {
            warn!("Room {}: {} NPCs, keeping first {}", layout.name, layout.npcs.len(), MAX_NPCS_PER_ROOM);
        }

        Room {
            id: layout.id,
            name: layout.name,
            music: layout.music,
            obstacles,
            doors: layout.doors.iter().take(MAX_DOORS).copied().collect(),
            npcs: layout.npcs.iter().take(MAX_NPCS_PER_ROOM).cloned().collect(),
        }
    }

    pub fn obstacle_at(&self, cell: GridCell) -> bool {
        if !cell.in_bounds() {
            return true;
        }
        self.obstacles[cell.y as usize][cell.x as usize]
    }

    pub fn door_at(&self, cell: GridCell) -> Option<Door> {
        self.doors.iter().find(|d| d.cell == cell).copied()
    }

    /// Uncaught NPC standing on `cell`.
    pub fn npc_at(&self, cell: GridCell) -> Option<&Npc> {
        self.npcs.iter().find(|n| !n.caught && n.cell == cell)
    }
}

/// Owns every room for the lifetime of the game plus the current-room pointer.
pub struct GridWorld {
    rooms: Vec<Room>,
    current: RoomId,
}

impl GridWorld {
    /// Build from layout tables. Tables must cover every `RoomId` in order.
    pub fn new(layouts: &[RoomLayout], start: RoomId) -> Self {
        let mut rooms: Vec<Room> = layouts.iter().map(Room::from_layout).collect();
        rooms.sort_by_key(|r| r.id.index());
        debug_assert_eq!(rooms.len(), ROOM_COUNT);
        info!("World: {} rooms, starting in {}", rooms.len(), rooms[start.index()].name);
        GridWorld { rooms, current: start }
    }

    pub fn room(&self, id: RoomId) -> &Room {
        &self.rooms[id.index()]
    }

    pub fn current_room_id(&self) -> RoomId {
        self.current
    }

    pub fn current_room(&self) -> &Room {
        self.room(self.current)
    }

    pub fn obstacle_at(&self, room: RoomId, x: i32, y: i32) -> bool {
        self.room(room).obstacle_at(GridCell::new(x, y))
    }

    pub fn door_at(&self, room: RoomId, x: i32, y: i32) -> Option<Door> {
        self.room(room).door_at(GridCell::new(x, y))
    }

    #[cfg(test)]
    pub fn npc_at(&self, room: RoomId, x: i32, y: i32) -> Option<&Npc> {
        self.room(room).npc_at(GridCell::new(x, y))
    }

    /// A creature may appear here: open floor, no door, no NPC.
    pub fn is_free_for_spawn(&self, room: RoomId, cell: GridCell) -> bool {
        let r = self.room(room);
        !r.obstacle_at(cell) && r.door_at(cell).is_none() && r.npc_at(cell).is_none()
    }

    /// Switch to `target` and return where the player appears.
    pub fn transition(&mut self, target: RoomId, door: &Door) -> GridCell {
        info!(
            "Transitioning from {} to {}, entering at ({}, {})",
            self.current_room().name, self.room(target).name, door.spawn.x, door.spawn.y,
        );
        self.current = target;
        door.spawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout;

    fn world() -> GridWorld {
        GridWorld::new(&layout::ROOMS, RoomId::MainHall)
    }

    #[test]
    fn out_of_bounds_is_obstacle() {
        let w = world();
        assert!(w.obstacle_at(RoomId::MainHall, -1, 5));
        assert!(w.obstacle_at(RoomId::MainHall, 5, -1));
        assert!(w.obstacle_at(RoomId::MainHall, GRID_WIDTH as i32, 5));
        assert!(w.obstacle_at(RoomId::MainHall, 5, GRID_HEIGHT as i32));
    }

    #[test]
    fn border_walls_and_open_floor() {
        let w = world();
        assert!(w.obstacle_at(RoomId::Basement, 0, 0));
        assert!(w.obstacle_at(RoomId::Basement, 0, 10));
        assert!(!w.obstacle_at(RoomId::Basement, 3, 3));
        // pillar
        assert!(w.obstacle_at(RoomId::Basement, 10, 5));
    }

    #[test]
    fn door_lookup_is_exact_cell() {
        let w = world();
        let d = w.door_at(RoomId::MainHall, 28, 10).expect("classroom door");
        assert_eq!(d.target, RoomId::Classroom);
        assert!(w.door_at(RoomId::MainHall, 27, 10).is_none());
        assert!(w.door_at(RoomId::MainHall, 28, 11).is_none());
    }

    #[test]
    fn transition_moves_current_room() {
        let mut w = world();
        let door = w.door_at(RoomId::MainHall, 10, 12).expect("stairs down");
        let spawn = w.transition(door.target, &door);
        assert_eq!(w.current_room_id(), RoomId::Basement);
        assert_eq!(spawn, GridCell::new(15, 3));
        assert!(!w.obstacle_at(RoomId::Basement, spawn.x, spawn.y));
    }

    #[test]
    fn every_door_spawn_is_walkable_and_not_a_door() {
        let w = world();
        for id in RoomId::ALL {
            for d in &w.room(id).doors {
                assert!(!w.obstacle_at(d.target, d.spawn.x, d.spawn.y), "{:?} spawn blocked", d);
                assert!(w.door_at(d.target, d.spawn.x, d.spawn.y).is_none());
                assert!(!w.obstacle_at(id, d.cell.x, d.cell.y), "{:?} door on wall", d);
            }
        }
    }

    #[test]
    fn npc_lookup_is_per_room() {
        let w = world();
        assert_eq!(w.npc_at(RoomId::MainHall, 12, 10).map(|n| n.name), Some("TA Navid"));
        assert!(w.npc_at(RoomId::Classroom, 12, 10).is_none());
        assert!(w.npc_at(RoomId::MainHall, 12, 11).is_none());
    }

    #[test]
    fn spawn_cells_exclude_doors_and_npcs() {
        let w = world();
        assert!(!w.is_free_for_spawn(RoomId::MainHall, GridCell::new(10, 12)));
        let npc = &w.room(RoomId::MainHall).npcs[0];
        assert!(!w.is_free_for_spawn(RoomId::MainHall, npc.cell));
        assert!(w.is_free_for_spawn(RoomId::MainHall, GridCell::new(3, 3)));
    }
}
