/// Built-in room data.
///
/// ## Tile legend:
///   '#' = Wall / furniture (impassable)
///   ' ' = Floor
///
/// Doors and NPCs are listed separately; a door cell must be floor.

use super::grid::GridCell;
use super::room::{Door, DoorKind, Npc, NpcLines, QuestOffer, RoomId, RoomLayout};
use super::species::Species;

pub const START_ROOM: RoomId = RoomId::MainHall;
pub const START_CELL: GridCell = GridCell::new(10, 7);

// ── Basement ──

const BASEMENT_ROWS: &[&str] = &[
    "##############################",
    "#              #             #",
    "#             # #            #",
    "#                            #",
    "#                            #",
    "#         ##        ##       #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#         ##        ##       #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "##############################",
];

const BASEMENT_DOORS: &[Door] = &[Door {
    cell: GridCell::new(15, 2),
    kind: DoorKind::StairsUp,
    target: RoomId::MainHall,
    spawn: GridCell::new(10, 11),
}];

const BASEMENT_NPCS: &[Npc] = &[Npc {
    name: "Basement Janitor",
    cell: GridCell::new(8, 8),
    caught: false,
    portrait: "assets/dialogue/janitorDialogue.png",
    theme: None,
    offer: QuestOffer { species: Species::Deer, required: 4 },
    lines: NpcLines {
        opening: "Deer keep wandering down here and knocking over my mop bucket. Catch four of them for me?",
        progress: "Still hearing hooves in the boiler room. Keep at it.",
        turn_in: "Four deer! The floors might actually stay clean tonight. Thanks, kid.",
    },
}];

// ── Main Hall ──

const MAIN_HALL_ROWS: &[&str] = &[
    "##############################",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#     ##                     #",
    "#     ##                     #",
    "#                            #",
    "#                            #",
    "#                           ##",
    "#                            #",
    "#                           ##",
    "#        # #                 #",
    "#         #                  #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "##############################",
];

const MAIN_HALL_DOORS: &[Door] = &[
    Door {
        cell: GridCell::new(10, 12),
        kind: DoorKind::StairsDown,
        target: RoomId::Basement,
        spawn: GridCell::new(15, 3),
    },
    Door {
        cell: GridCell::new(28, 10),
        kind: DoorKind::Plain,
        target: RoomId::Classroom,
        spawn: GridCell::new(3, 10),
    },
];

const MAIN_HALL_NPCS: &[Npc] = &[
    Npc {
        name: "Professor Matthew",
        cell: GridCell::new(15, 7),
        caught: false,
        portrait: "assets/dialogue/matthewDialogue.png",
        theme: Some("assets/music/matthew.ogg"),
        offer: QuestOffer { species: Species::BigDeer, required: 2 },
        lines: NpcLines {
            opening: "Ah, a student with free time. Two big deer have escaped from the lab. Bring them back and I'll round up your grade.",
            progress: "The big deer are still loose. They're hard to miss.",
            turn_in: "Both big deer accounted for. Consider the midterm curved.",
        },
    },
    Npc {
        name: "TA Navid",
        cell: GridCell::new(12, 10),
        caught: false,
        portrait: "assets/dialogue/navidDialogue.png",
        theme: None,
        offer: QuestOffer { species: Species::Raccoon, required: 3 },
        lines: NpcLines {
            opening: "Raccoons got into the office hours snacks again. Catch three and I'll owe you one.",
            progress: "I can still hear rustling in the trash cans.",
            turn_in: "Three raccoons, nice work. Office hours are safe again.",
        },
    },
];

// ── Classroom ──

const CLASSROOM_ROWS: &[&str] = &[
    "##############################",
    "#                            #",
    "#                            #",
    "#    ##  ##  ##  ##  ##      #",
    "#                            #",
    "#                            #",
    "#    ##  ##  ##  ##  ##      #",
    "#                            #",
    "#                            #",
    "# #  ##  ##  ##  ##  ##      #",
    "##                           #",
    "# #                          #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "##############################",
];

const CLASSROOM_DOORS: &[Door] = &[Door {
    cell: GridCell::new(2, 10),
    kind: DoorKind::Plain,
    target: RoomId::MainHall,
    spawn: GridCell::new(27, 10),
}];

const CLASSROOM_NPCS: &[Npc] = &[Npc {
    name: "TA Soroush",
    cell: GridCell::new(15, 8),
    caught: false,
    portrait: "assets/dialogue/soroushDialogue.png",
    theme: None,
    offer: QuestOffer { species: Species::Bear, required: 5 },
    lines: NpcLines {
        opening: "There are bears in the lecture hall. Five of them, I think. Could you deal with that before the lab section?",
        progress: "Not all of the bears are gone yet.",
        turn_in: "Five bears! Lab section can start on time for once.",
    },
}];

// ══════════════════════════════════════════════════════════════
// Room table
// ══════════════════════════════════════════════════════════════

pub const ROOMS: [RoomLayout; 3] = [
    RoomLayout {
        id: RoomId::Basement,
        name: "Basement",
        music: "assets/music/basement.ogg",
        rows: BASEMENT_ROWS,
        doors: BASEMENT_DOORS,
        npcs: BASEMENT_NPCS,
    },
    RoomLayout {
        id: RoomId::MainHall,
        name: "Main Hall",
        music: "assets/music/main_hall.ogg",
        rows: MAIN_HALL_ROWS,
        doors: MAIN_HALL_DOORS,
        npcs: MAIN_HALL_NPCS,
    },
    RoomLayout {
        id: RoomId::Classroom,
        name: "Classroom",
        music: "assets/music/classroom.ogg",
        rows: CLASSROOM_ROWS,
        doors: CLASSROOM_DOORS,
        npcs: CLASSROOM_NPCS,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::{GRID_HEIGHT, GRID_WIDTH};

    #[test]
    fn rows_are_full_grid() {
        for layout in &ROOMS {
            assert_eq!(layout.rows.len(), GRID_HEIGHT, "{}", layout.name);
            for row in layout.rows {
                assert_eq!(row.chars().count(), GRID_WIDTH, "{}: {:?}", layout.name, row);
            }
        }
    }

    #[test]
    fn npc_names_are_unique() {
        let names: Vec<&str> = ROOMS.iter().flat_map(|l| l.npcs.iter().map(|n| n.name)).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len());
    }

    #[test]
    fn start_cell_is_floor() {
        let row = ROOMS[START_ROOM.index()].rows[START_CELL.y as usize];
        assert_eq!(row.as_bytes()[START_CELL.x as usize], b' ');
    }
}
