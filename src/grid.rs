use std::collections::BTreeSet;

use crate::constants::PLAYABLE_MARGIN;
use crate::error::LayoutError;
use crate::types::{PursuerState, TilePos};

/// The 27x27 classic maze. Two columns of open mask tiles surround the walls
/// so agents can leave through the tunnel on row 13 and wrap.
pub const CLASSIC_MAZE: [&str; 27] = [
    "___________________________",
    "___________________________",
    "__#######################__",
    "__#..........#..........#__",
    "__#.###.####.#.####.###.#__",
    "__#o#_#.#__#.#.#__#.#_#o#__",
    "__#.###.####.#.####.###.#__",
    "__#.....................#__",
    "__#.###.#.#######.#.###.#__",
    "__#.....#....#....#.....#__",
    "__#####.####_#_####.#####__",
    "______#.#_________#.#______",
    "#######.#_###-###_#.#######",
    "__sssss.__#_____#__.sssss__",
    "#######.#_#######_#.#######",
    "______#.#_________#.#______",
    "__#####.#_#######_#.#####__",
    "__#..........#..........#__",
    "__#.###.####.#.####.###.#__",
    "__#o..#......P......#..o#__",
    "__###.#.#.#######.#.#.###__",
    "__#.....#....#....#.....#__",
    "__#.########.#.########.#__",
    "__#.....................#__",
    "__#######################__",
    "___________________________",
    "___________________________",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    pub is_wall: bool,
    pub is_ghost_door: bool,
    pub is_slow: bool,
    pub can_player_start: bool,
}

impl Tile {
    pub const OPEN: Tile = Tile {
        is_wall: false,
        is_ghost_door: false,
        is_slow: false,
        can_player_start: false,
    };

    pub const WALL: Tile = Tile {
        is_wall: true,
        ..Tile::OPEN
    };

    pub const DOOR: Tile = Tile {
        is_ghost_door: true,
        ..Tile::OPEN
    };

    pub const SLOW: Tile = Tile {
        is_slow: true,
        ..Tile::OPEN
    };

    pub const PLAYER_START: Tile = Tile {
        can_player_start: true,
        ..Tile::OPEN
    };
}

/// Who is asking whether a tile can be entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Walker {
    Player,
    Pursuer(PursuerState),
}

#[derive(Clone, Debug)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![Tile::OPEN; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn index_of(&self, pos: TilePos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        Some((pos.y * self.width + pos.x) as usize)
    }

    /// Writes outside the grid are ignored.
    pub fn set_tile(&mut self, pos: TilePos, tile: Tile) {
        if let Some(idx) = self.index_of(pos) {
            self.tiles[idx] = tile;
        }
    }

    pub fn tile_at(&self, pos: TilePos) -> Option<Tile> {
        self.index_of(pos).and_then(|idx| self.tiles.get(idx).copied())
    }

    pub fn is_wall(&self, pos: TilePos) -> bool {
        self.tile_at(pos).map_or(true, |tile| tile.is_wall)
    }

    pub fn is_slow(&self, pos: TilePos) -> bool {
        self.tile_at(pos).is_some_and(|tile| tile.is_slow)
    }

    pub fn is_walkable_at(&self, pos: TilePos, walker: Walker) -> bool {
        is_walkable(self.tile_at(pos), walker)
    }

    pub fn find_ghost_door(&self) -> Option<TilePos> {
        self.find_first(|tile| tile.is_ghost_door)
    }

    pub fn find_player_start(&self) -> Option<TilePos> {
        self.find_first(|tile| tile.can_player_start)
    }

    fn find_first(&self, pred: impl Fn(&Tile) -> bool) -> Option<TilePos> {
        let idx = self.tiles.iter().position(pred)?;
        let idx = idx as i32;
        Some(TilePos::new(idx % self.width, idx / self.width))
    }

    /// Region where pursuers steer; outside of it they keep their heading
    /// through the wrap corridor.
    pub fn in_playable_region(&self, pos: TilePos) -> bool {
        let max_x = self.width - PLAYABLE_MARGIN - 2;
        let max_y = self.height - PLAYABLE_MARGIN - 2;
        pos.x >= PLAYABLE_MARGIN && pos.x <= max_x && pos.y >= PLAYABLE_MARGIN && pos.y <= max_y
    }
}

pub fn is_walkable(tile: Option<Tile>, walker: Walker) -> bool {
    let Some(tile) = tile else {
        return false;
    };
    if tile.is_wall {
        return false;
    }
    if !tile.is_ghost_door {
        return true;
    }
    match walker {
        Walker::Player => false,
        Walker::Pursuer(state) => state.may_cross_door(),
    }
}

#[derive(Clone, Debug)]
pub struct ParsedMaze {
    pub grid: Grid,
    pub pellets: BTreeSet<TilePos>,
    pub power_pellets: BTreeSet<TilePos>,
    pub ghost_door: TilePos,
    pub player_start: TilePos,
}

pub fn parse_layout<S: AsRef<str>>(rows: &[S]) -> Result<ParsedMaze, LayoutError> {
    let Some(first) = rows.first() else {
        return Err(LayoutError::Empty);
    };
    let width = first.as_ref().chars().count();
    if width == 0 {
        return Err(LayoutError::Empty);
    }

    let mut grid = Grid::new(width as i32, rows.len() as i32);
    let mut pellets = BTreeSet::new();
    let mut power_pellets = BTreeSet::new();

    for (y, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        let found = row.chars().count();
        if found != width {
            return Err(LayoutError::RaggedRow {
                row: y,
                expected: width,
                found,
            });
        }
        for (x, glyph) in row.chars().enumerate() {
            let pos = TilePos::new(x as i32, y as i32);
            let tile = match glyph {
                '#' => Tile::WALL,
                '_' | ' ' => Tile::OPEN,
                '.' => {
                    pellets.insert(pos);
                    Tile::OPEN
                }
                'o' => {
                    power_pellets.insert(pos);
                    Tile::OPEN
                }
                's' => Tile::SLOW,
                'P' => Tile::PLAYER_START,
                '-' => Tile::DOOR,
                _ => return Err(LayoutError::UnknownGlyph { glyph, x, y }),
            };
            grid.set_tile(pos, tile);
        }
    }

    let ghost_door = grid.find_ghost_door().ok_or(LayoutError::MissingGhostDoor)?;
    let player_start = grid
        .find_player_start()
        .ok_or(LayoutError::MissingPlayerStart)?;

    Ok(ParsedMaze {
        grid,
        pellets,
        power_pellets,
        ghost_door,
        player_start,
    })
}

pub fn classic_maze() -> Result<ParsedMaze, LayoutError> {
    parse_layout(&CLASSIC_MAZE)
}
