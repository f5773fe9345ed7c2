/// Maze text legend.
/// Properties are queried via methods so the character set lives in one place.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    #[default]
    Floor,
    Wall,
    Start,
    Goal,
}

impl Cell {
    /// `#` wall, `.` or space floor, `P` player start, `G` goal.
    pub fn from_char(ch: char) -> Option<Cell> {
        match ch {
            '#' => Some(Cell::Wall),
            '.' | ' ' => Some(Cell::Floor),
            'P' | 'p' => Some(Cell::Start),
            'G' | 'g' => Some(Cell::Goal),
            _ => None,
        }
    }

    /// Does this cell become a wall box?
    pub fn is_solid(self) -> bool {
        matches!(self, Cell::Wall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_covers_every_cell() {
        assert_eq!(Cell::from_char('#'), Some(Cell::Wall));
        assert_eq!(Cell::from_char('.'), Some(Cell::Floor));
        assert_eq!(Cell::from_char('P'), Some(Cell::Start));
        assert_eq!(Cell::from_char('g'), Some(Cell::Goal));
    }

    #[test]
    fn space_is_floor_and_unknown_is_rejected() {
        assert_eq!(Cell::from_char(' '), Some(Cell::Floor));
        assert_eq!(Cell::from_char('x'), None);
        assert_eq!(Cell::from_char('\t'), None);
    }

    #[test]
    fn only_walls_are_solid() {
        assert!(Cell::Wall.is_solid());
        assert!(!Cell::Start.is_solid());
        assert!(!Cell::Goal.is_solid());
        assert!(!Cell::Floor.is_solid());
    }
}
