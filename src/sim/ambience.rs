/// Background-track selection.
///
/// Music stays silent until the start-up delay has passed. After that the
/// wanted track is the current room's, unless the player stands within
/// `THEME_RADIUS` of an NPC that has a theme of its own. A cue is emitted
/// only when the wanted track changes.

use log::debug;

use crate::domain::grid::GridCell;
use crate::domain::room::Room;

pub const THEME_RADIUS: i32 = 3;

pub struct Ambience {
    delay_ms: u64,
    current: Option<&'static str>,
}

impl Ambience {
    pub fn new(delay_ms: u64) -> Self {
        Ambience { delay_ms, current: None }
    }

    fn wanted(room: &Room, player: GridCell) -> &'static str {
        room.npcs
            .iter()
            .filter(|n| !n.caught && n.cell.manhattan(player) <= THEME_RADIUS)
            .find_map(|n| n.theme)
            .unwrap_or(room.music)
    }

    /// Returns the track to switch to, if it changed this frame.
    pub fn update(&mut self, now_ms: u64, room: &Room, player: GridCell) -> Option<&'static str> {
        if now_ms < self.delay_ms {
            return None;
        }
        let wanted = Self::wanted(room, player);
        if self.current == Some(wanted) {
            return None;
        }
        debug!("Music: {:?} -> {}", self.current, wanted);
        self.current = Some(wanted);
        Some(wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout;
    use crate::domain::room::{GridWorld, RoomId};

    fn world() -> GridWorld {
        GridWorld::new(&layout::ROOMS, RoomId::MainHall)
    }

    #[test]
    fn silent_until_delay() {
        let w = world();
        let mut a = Ambience::new(12_000);
        let far = GridCell::new(3, 15);
        assert_eq!(a.update(11_999, w.room(RoomId::MainHall), far), None);
        assert_eq!(a.update(12_000, w.room(RoomId::MainHall), far), Some("assets/music/main_hall.ogg"));
        assert_eq!(a.update(12_033, w.room(RoomId::MainHall), far), None);
    }

    #[test]
    fn theme_on_approach_and_restore_on_leave() {
        let w = world();
        let hall = w.room(RoomId::MainHall);
        let matthew = hall.npcs.iter().find(|n| n.theme.is_some()).unwrap();
        let mut a = Ambience::new(0);

        a.update(0, hall, GridCell::new(3, 15));
        let near = GridCell::new(matthew.cell.x - 3, matthew.cell.y);
        assert_eq!(a.update(1, hall, near), matthew.theme);
        assert_eq!(a.update(2, hall, near), None);

        let away = GridCell::new(matthew.cell.x - 4, matthew.cell.y);
        assert_eq!(a.update(3, hall, away), Some(hall.music));
    }

    #[test]
    fn room_change_switches_track() {
        let w = world();
        let mut a = Ambience::new(0);
        a.update(0, w.room(RoomId::MainHall), GridCell::new(3, 15));
        assert_eq!(
            a.update(1, w.room(RoomId::Basement), GridCell::new(15, 3)),
            Some("assets/music/basement.ogg")
        );
    }
}
