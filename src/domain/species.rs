/// Creature species and a fixed-size per-species table.

use std::ops::{Index, IndexMut};

pub const SPECIES_COUNT: usize = 4;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Species {
    Bear,
    Raccoon,
    Deer,
    BigDeer,
}

impl Species {
    pub const ALL: [Species; SPECIES_COUNT] = [
        Species::Bear,
        Species::Raccoon,
        Species::Deer,
        Species::BigDeer,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Bear    => "Bear",
            Species::Raccoon => "Raccoon",
            Species::Deer    => "Deer",
            Species::BigDeer => "Big Deer",
        }
    }

    /// Plural label used by the HUD and quest lines.
    pub fn plural(self) -> &'static str {
        match self {
            Species::Bear    => "Bears",
            Species::Raccoon => "Raccoons",
            Species::Deer    => "Deer",
            Species::BigDeer => "Big Deer",
        }
    }
}

/// One value per species, indexed by `Species`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PerSpecies<T>(pub [T; SPECIES_COUNT]);

impl<T: Copy> PerSpecies<T> {
    pub fn iter(&self) -> impl Iterator<Item = (Species, T)> + '_ {
        Species::ALL.iter().map(move |&s| (s, self.0[s.index()]))
    }
}

impl PerSpecies<u32> {
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

impl<T> Index<Species> for PerSpecies<T> {
    type Output = T;
    fn index(&self, s: Species) -> &T {
        &self.0[s.index()]
    }
}

impl<T> IndexMut<Species> for PerSpecies<T> {
    fn index_mut(&mut self, s: Species) -> &mut T {
        &mut self.0[s.index()]
    }
}
