/// The player avatar and the per-frame input it reacts to.
///
/// Movement is tile-to-tile: a step is validated and committed as a
/// target cell, then the render position glides toward it a fixed number
/// of pixels per frame. The logical cell only changes on arrival.

use super::creature::CreatureManager;
use super::grid::{Direction, GridCell};
use super::room::Room;

pub const MOVE_DELAY_MS: u64 = 200;
pub const ANIMATION_SPEED: f32 = 8.0;

/// Frame input: movement is continuous (held key), buttons are edges that
/// are true for exactly one frame per press.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub direction: Option<Direction>,
    pub catch: bool,
    pub interact: bool,
    pub reset: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub cell: GridCell,
    pub target: GridCell,
    pub moving: bool,
    pub render_x: f32,
    pub render_y: f32,
    pub facing: Direction,
    /// Set on arrival through a door; cleared on any frame the player's
    /// cell holds no door, including the frame a step off the spawn begins.
    pub just_teleported: bool,
    last_step_ms: Option<u64>,
}

impl Player {
    pub fn new(cell: GridCell) -> Self {
        let (render_x, render_y) = cell.to_pixels();
        Player {
            cell,
            target: cell,
            moving: false,
            render_x,
            render_y,
            facing: Direction::Down,
            just_teleported: false,
            last_step_ms: None,
        }
    }

    fn cooldown_elapsed(&self, now_ms: u64, move_delay_ms: u64) -> bool {
        match self.last_step_ms {
            None => true,
            Some(t) => now_ms.saturating_sub(t) > move_delay_ms,
        }
    }

    /// Try to start a one-cell step. Facing turns even if the step is
    /// refused, but only while a step could have been taken at all.
    pub fn attempt_step(
        &mut self,
        dir: Direction,
        now_ms: u64,
        move_delay_ms: u64,
        room: &Room,
        creatures: &CreatureManager,
    ) -> bool {
        if self.moving || !self.cooldown_elapsed(now_ms, move_delay_ms) {
            return false;
        }
        self.facing = dir;

        let next = self.cell.offset(dir);
        if room.obstacle_at(next) || room.npc_at(next).is_some() || creatures.blocks(next, room.id) {
            return false;
        }

        self.target = next;
        self.moving = true;
        self.last_step_ms = Some(now_ms);
        true
    }

    /// Glide toward the target. Returns true on the frame the step lands.
    pub fn advance_animation(&mut self, speed: f32) -> bool {
        if !self.moving {
            return false;
        }
        let (tx, ty) = self.target.to_pixels();
        self.render_x = approach(self.render_x, tx, speed);
        self.render_y = approach(self.render_y, ty, speed);

        if self.render_x == tx && self.render_y == ty {
            self.cell = self.target;
            self.moving = false;
            return true;
        }
        false
    }

    pub fn teleport_to(&mut self, cell: GridCell) {
        self.cell = cell;
        self.target = cell;
        self.moving = false;
        (self.render_x, self.render_y) = cell.to_pixels();
    }
}

fn approach(current: f32, target: f32, step: f32) -> f32 {
    if current < target {
        (current + step).min(target)
    } else if current > target {
        (current - step).max(target)
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::TILE_SIZE;
    use crate::domain::layout;
    use crate::domain::room::{GridWorld, RoomId};
    use crate::domain::species::{PerSpecies, Species};

    fn world() -> GridWorld {
        GridWorld::new(&layout::ROOMS, RoomId::MainHall)
    }

    #[test]
    fn step_into_obstacle_is_refused_but_turns() {
        let w = world();
        let c = CreatureManager::with_seed(0);
        // Main Hall pillar at (6,5); approach from (6,4) facing down.
        let mut p = Player::new(GridCell::new(6, 4));
        p.facing = Direction::Up;
        assert!(!p.attempt_step(Direction::Down, 1000, MOVE_DELAY_MS, w.room(RoomId::MainHall), &c));
        assert_eq!(p.facing, Direction::Down);
        assert!(!p.moving);
        assert_eq!(p.cell, GridCell::new(6, 4));
    }

    #[test]
    fn npcs_and_creatures_block() {
        let w = world();
        let room = w.room(RoomId::MainHall);
        let npc = room.npcs[0].cell;
        let mut c = CreatureManager::with_seed(0);

        let mut p = Player::new(GridCell::new(npc.x - 1, npc.y));
        assert!(!p.attempt_step(Direction::Right, 0, MOVE_DELAY_MS, room, &c));

        let mut targets = PerSpecies::default();
        targets[Species::Bear] = 1;
        c.spawn_initial(&targets, &w, None);
        let bear = c.creatures()[0].clone();
        let from = GridCell::new(bear.cell.x, bear.cell.y - 1);
        let mut p = Player::new(from);
        assert!(!p.attempt_step(Direction::Down, 0, MOVE_DELAY_MS, w.room(bear.room), &c));
    }

    #[test]
    fn cooldown_must_be_strictly_exceeded() {
        let w = world();
        let c = CreatureManager::with_seed(0);
        let room = w.room(RoomId::MainHall);
        let mut p = Player::new(GridCell::new(3, 3));

        assert!(p.attempt_step(Direction::Right, 500, MOVE_DELAY_MS, room, &c));
        while p.moving {
            p.advance_animation(ANIMATION_SPEED);
        }
        assert_eq!(p.cell, GridCell::new(4, 3));
        assert!(!p.attempt_step(Direction::Right, 700, MOVE_DELAY_MS, room, &c));
        assert!(p.attempt_step(Direction::Right, 701, MOVE_DELAY_MS, room, &c));
    }

    #[test]
    fn animation_lands_after_tile_over_speed_frames() {
        let w = world();
        let c = CreatureManager::with_seed(0);
        let mut p = Player::new(GridCell::new(3, 3));
        p.attempt_step(Direction::Down, 0, MOVE_DELAY_MS, w.room(RoomId::MainHall), &c);

        let frames = (TILE_SIZE / ANIMATION_SPEED) as usize;
        for _ in 0..frames - 1 {
            assert!(!p.advance_animation(ANIMATION_SPEED));
            assert_eq!(p.cell, GridCell::new(3, 3));
        }
        assert!(p.advance_animation(ANIMATION_SPEED));
        assert_eq!(p.cell, GridCell::new(3, 4));
        assert_eq!(p.render_y, 4.0 * TILE_SIZE);
    }

    #[test]
    fn teleport_snaps_everything() {
        let mut p = Player::new(GridCell::new(3, 3));
        p.moving = true;
        p.teleport_to(GridCell::new(15, 3));
        assert!(!p.moving);
        assert_eq!(p.target, GridCell::new(15, 3));
        assert_eq!((p.render_x, p.render_y), GridCell::new(15, 3).to_pixels());
    }
}
