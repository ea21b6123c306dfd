/// Cell kinds and per-frame light classification.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    #[default]
    Open,
    Blocking, // Occludes light, cannot be occupied
}

impl Cell {
    /// Does this cell stop light and movement?
    pub fn is_blocking(self) -> bool {
        matches!(self, Cell::Blocking)
    }

    /// Can the character stand here?
    pub fn is_passable(self) -> bool {
        !self.is_blocking()
    }
}

/// Visibility classification of one cell relative to the current orb.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Light {
    Lit,
    Unlit,
    Blocking, // Walls render as walls, never lit through
}

impl Light {
    pub fn is_lit(self) -> bool {
        matches!(self, Light::Lit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cell_is_open() {
        assert_eq!(Cell::default(), Cell::Open);
        assert!(Cell::Open.is_passable());
        assert!(!Cell::Blocking.is_passable());
    }

    #[test]
    fn only_lit_is_lit() {
        assert!(Light::Lit.is_lit());
        assert!(!Light::Unlit.is_lit());
        assert!(!Light::Blocking.is_lit());
    }
}
