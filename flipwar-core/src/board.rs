//! Grid geometry: positions, directions, and the per-map transition table

use serde::{Deserialize, Serialize};

/// Number of walk directions from a cell
pub const NUM_DIRECTIONS: usize = 8;

/// Row/column offsets (dy, dx) per direction.
/// Index: 0=N, 1=NE, 2=E, 3=SE, 4=S, 5=SW, 6=W, 7=NW
pub const OFFSETS: [(i8, i8); NUM_DIRECTIONS] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// Direction pointing back the way we came
pub const fn opposite(dir: u8) -> u8 {
    (dir + 4) % 8
}

/// Cell coordinates; (0, 0) is the upper-left corner, `x` grows east, `y` south
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: u8,
    pub y: u8,
}

impl Pos {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

/// One hop through the transition table: the cell reached and the direction in
/// which the walk continues (special transitions relabel the direction).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub pos: Pos,
    pub dir: u8,
}

/// Cell classification by reachable-neighbour count, fixed at map load.
/// Corner cells have at most 3 neighbours, edge cells 4 or 5. Fully isolated
/// cells count as default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellClass {
    Default,
    Corner,
    Edge,
}

/// A non-local adjacency between two cells, declared in the map description.
/// Walking out of `a` in `dir_a` lands on `b` facing away from `dir_b`, and
/// vice versa.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpecialTransition {
    pub a: Pos,
    pub dir_a: u8,
    pub b: Pos,
    pub dir_b: u8,
}

/// Precomputed adjacency for every cell and direction. Built once per map and
/// shared read-only for the rest of the game.
#[derive(Clone, Debug)]
pub struct Topology {
    width: u8,
    height: u8,
    steps: Box<[[Option<Step>; NUM_DIRECTIONS]]>,
    classes: Box<[CellClass]>,
}

impl Topology {
    /// Build the transition table: default 8-neighbour adjacency with holes
    /// and map boundaries excluded, then the special pairs spliced in with
    /// their direction relabeling, then the per-cell classification.
    pub fn build(
        width: u8,
        height: u8,
        is_hole: impl Fn(Pos) -> bool,
        specials: &[SpecialTransition],
    ) -> Self {
        let cells = width as usize * height as usize;
        let mut steps = vec![[None; NUM_DIRECTIONS]; cells].into_boxed_slice();

        for y in 0..height {
            for x in 0..width {
                let idx = y as usize * width as usize + x as usize;
                for (dir, &(dy, dx)) in OFFSETS.iter().enumerate() {
                    let ny = y as i16 + dy as i16;
                    let nx = x as i16 + dx as i16;
                    if nx < 0 || nx >= width as i16 || ny < 0 || ny >= height as i16 {
                        continue;
                    }
                    let npos = Pos::new(nx as u8, ny as u8);
                    if is_hole(npos) {
                        continue;
                    }
                    steps[idx][dir] = Some(Step {
                        pos: npos,
                        dir: dir as u8,
                    });
                }
            }
        }

        let mut topology = Self {
            width,
            height,
            steps,
            classes: vec![CellClass::Default; cells].into_boxed_slice(),
        };

        for sp in specials {
            let ia = topology.index(sp.a);
            let ib = topology.index(sp.b);
            topology.steps[ia][sp.dir_a as usize] = Some(Step {
                pos: sp.b,
                dir: opposite(sp.dir_b),
            });
            topology.steps[ib][sp.dir_b as usize] = Some(Step {
                pos: sp.a,
                dir: opposite(sp.dir_a),
            });
        }

        for y in 0..height {
            for x in 0..width {
                let pos = Pos::new(x, y);
                let neighbours = (0..NUM_DIRECTIONS as u8)
                    .filter(|&d| topology.step(pos, d).is_some())
                    .count();
                topology.classes[y as usize * width as usize + x as usize] = match neighbours {
                    1..=3 => CellClass::Corner,
                    4..=5 => CellClass::Edge,
                    _ => CellClass::Default,
                };
            }
        }

        topology
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Neighbour of `pos` in `dir`, or `None` at holes and map boundaries
    pub fn step(&self, pos: Pos, dir: u8) -> Option<Step> {
        self.steps[self.index(pos)][dir as usize]
    }

    pub fn class(&self, pos: Pos) -> CellClass {
        self.classes[self.index(pos)]
    }

    fn index(&self, pos: Pos) -> usize {
        debug_assert!(self.contains(pos), "position {pos:?} is outside the map");
        pos.y as usize * self.width as usize + pos.x as usize
    }
}
