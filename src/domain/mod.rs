pub mod creature;
pub mod dialogue;
pub mod grid;
pub mod layout;
pub mod player;
pub mod quest;
pub mod room;
pub mod species;
