/// Maze layouts.
///
/// ## Sources (priority order):
///   1. `[maze] file` from config.toml (text grid)
///   2. Built-in layout
///
/// ## Text grid format:
///   ```text
///   ; comment lines start with ';'
///   #########
///   #.......#
///   #.P...G.#
///   #.......#
///   #########
///   ```
///
/// ## Cell legend:
///   '#' = Wall        '.' or ' ' = Floor
///   'P' = Start       'G' = Goal
///
/// Column index maps to +X, row index to +Z, one cell = `cell_size` units.
/// Short rows are padded with floor. Exactly one `P` and one `G`.
///
/// Touching a wall face counts as a hit, so with the default 1×1 player
/// corridors need three cells across and `P` must not border a wall.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::MazeConfig;
use crate::domain::cell::Cell;
use crate::domain::entity::{Goal, Maze, Wall};
use crate::domain::math::{vec3, Vec3};

/// Height of the player's and goal's center above the floor.
pub const ACTOR_Y: f32 = 0.5;

#[derive(Clone, Debug)]
pub struct MazeLayout {
    pub name: String,
    pub walls: Maze,
    pub goal: Goal,
    pub start: Vec3,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read maze file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("maze has no rows")]
    Empty,
    #[error("unknown cell {ch:?} at row {row}, column {col}")]
    UnknownCell { ch: char, row: usize, col: usize },
    #[error("maze has no start cell 'P'")]
    MissingStart,
    #[error("maze has no goal cell 'G'")]
    MissingGoal,
    #[error("second {what} at row {row}, column {col}")]
    Duplicate { what: &'static str, row: usize, col: usize },
    #[error("cell_size {cell_size} and wall_height {wall_height} must be > 0")]
    BadDimensions { cell_size: f32, wall_height: f32 },
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Pick the layout for this run. A broken maze file is logged and the
/// built-in layout is used instead.
pub fn resolve_layout(cfg: &MazeConfig) -> MazeLayout {
    let path = match &cfg.file {
        Some(p) => p,
        None => return builtin(cfg),
    };
    match load_layout(path, cfg) {
        Ok(layout) => {
            log::info!(
                "maze {:?}: {} walls, start {:?}, goal {:?}",
                layout.name, layout.walls.len(), layout.start, layout.goal.position,
            );
            layout
        }
        Err(e) => {
            log::warn!("{e}");
            log::warn!("falling back to the built-in maze");
            builtin(cfg)
        }
    }
}

pub fn load_layout(path: &Path, cfg: &MazeConfig) -> Result<MazeLayout, LevelError> {
    let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "custom".to_string());
    parse_layout(&name, &text, cfg)
}

/// Corridor maze: start at (-3, 0.5, 0), goal at (21, 0.5, 0).
/// The first obstacle is the 1×1×4 wall at the origin, dead ahead of the
/// start, so walking straight right ends in a collision.
pub fn builtin(cfg: &MazeConfig) -> MazeLayout {
    let walls = vec![
        // obstacles, alternating gaps
        Wall::new(vec3(0.0, 0.0, 0.0), vec3(1.0, 1.0, 4.0)),
        Wall::new(vec3(7.0, 0.0, -1.5), vec3(1.0, 1.0, 5.0)),
        Wall::new(vec3(14.0, 0.0, 1.5), vec3(1.0, 1.0, 5.0)),
        // side walls
        Wall::new(vec3(9.0, 0.0, -4.0), vec3(31.0, 1.0, 1.0)),
        Wall::new(vec3(9.0, 0.0, 4.0), vec3(31.0, 1.0, 1.0)),
        // end caps
        Wall::new(vec3(-6.0, 0.0, 0.0), vec3(1.0, 1.0, 9.0)),
        Wall::new(vec3(24.0, 0.0, 0.0), vec3(1.0, 1.0, 9.0)),
    ];
    MazeLayout {
        name: "corridor".to_string(),
        walls,
        goal: Goal::new(vec3(21.0, ACTOR_Y, 0.0), cfg.goal_radius),
        start: vec3(-3.0, ACTOR_Y, 0.0),
    }
}

pub fn parse_layout(name: &str, text: &str, cfg: &MazeConfig) -> Result<MazeLayout, LevelError> {
    if !(cfg.cell_size > 0.0 && cfg.wall_height > 0.0) {
        return Err(LevelError::BadDimensions {
            cell_size: cfg.cell_size,
            wall_height: cfg.wall_height,
        });
    }

    let grid = parse_grid(text)?;

    let cell = cfg.cell_size;
    let wall_extents = vec3(cell, cfg.wall_height, cell);
    let mut walls = Vec::new();
    let mut start = None;
    let mut goal = None;

    for (row, cells) in grid.iter().enumerate() {
        for (col, &c) in cells.iter().enumerate() {
            let x = col as f32 * cell;
            let z = row as f32 * cell;
            if c.is_solid() {
                // Wall::try_new cannot fail here: extents checked above.
                if let Some(w) = Wall::try_new(vec3(x, 0.0, z), wall_extents) {
                    walls.push(w);
                }
                continue;
            }
            match c {
                Cell::Start => {
                    if start.is_some() {
                        return Err(LevelError::Duplicate { what: "start", row, col });
                    }
                    start = Some(vec3(x, ACTOR_Y, z));
                }
                Cell::Goal => {
                    if goal.is_some() {
                        return Err(LevelError::Duplicate { what: "goal", row, col });
                    }
                    goal = Some(vec3(x, ACTOR_Y, z));
                }
                Cell::Floor | Cell::Wall => {}
            }
        }
    }

    Ok(MazeLayout {
        name: name.to_string(),
        walls,
        goal: Goal::new(goal.ok_or(LevelError::MissingGoal)?, cfg.goal_radius),
        start: start.ok_or(LevelError::MissingStart)?,
    })
}

// ══════════════════════════════════════════════════════════════
// Grid parsing
// ══════════════════════════════════════════════════════════════

fn parse_grid(text: &str) -> Result<Vec<Vec<Cell>>, LevelError> {
    let mut grid: Vec<Vec<Cell>> = Vec::new();

    for (row, line) in text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim_start().starts_with(';') && !l.trim().is_empty())
        .enumerate()
    {
        let cells = line
            .chars()
            .enumerate()
            .map(|(col, ch)| Cell::from_char(ch).ok_or(LevelError::UnknownCell { ch, row, col }))
            .collect::<Result<Vec<_>, _>>()?;
        grid.push(cells);
    }

    if grid.is_empty() {
        return Err(LevelError::Empty);
    }

    // Equalize row lengths
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    for r in &mut grid {
        r.resize(width, Cell::Floor);
    }
    Ok(grid)
}
