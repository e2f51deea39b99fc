//! Workload-balanced quadtree decomposition with 8-direction neighbor
//! discovery.
//!
//! Neighbor finding is table driven (Bhattacharya, "Efficient Neighbor
//! Finding Algorithms in Quadtree and Octree", 2001): a leaf's path from
//! the root is rewritten level by level using [`NBR_PRESENT`],
//! [`NBR_INDEX`] and [`VTX_NBR`] until the path of the same-size neighbor
//! is known, then the tree is walked to the actual node.

use raster_common::Area;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{ReprojectError, Result};

/// Child position inside a divided node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    NorthWest = 0,
    NorthEast = 1,
    SouthWest = 2,
    SouthEast = 3,
}

/// One of the eight mesh directions, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshDir {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

/// What to do at one level while building a vertex neighbor's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexStep {
    /// The neighbor is outside this node's parent; keep climbing.
    Up,
    /// The neighbor shares this node's parent.
    Same,
    /// The neighbor is across the parent's edge in this direction.
    Edge(MeshDir),
}

use MeshDir as D;
use Quadrant::{NorthEast as NE, NorthWest as NW, SouthEast as SE, SouthWest as SW};
use VertexStep::{Same as S2, Up as S1};

/// 1 when the edge neighbor of a quadrant (row) in a primary direction
/// (column: N, W, E, S) lies outside the quadrant's parent.
pub const NBR_PRESENT: [[u8; 4]; 4] = [
    [1, 1, 0, 0],
    [1, 0, 1, 0],
    [0, 1, 0, 1],
    [0, 0, 1, 1],
];

/// Quadrant of the edge neighbor, same layout as [`NBR_PRESENT`].
pub const NBR_INDEX: [[Quadrant; 4]; 4] = [
    [SW, NE, NE, SW],
    [SE, NW, NW, SE],
    [NW, SE, SE, NW],
    [NE, SW, SW, NE],
];

/// Vertex neighbor step for a quadrant (row) in a diagonal direction
/// (column: NW, NE, SW, SE).
pub const VTX_NBR: [[VertexStep; 4]; 4] = [
    [S1, VertexStep::Edge(D::North), VertexStep::Edge(D::West), S2],
    [VertexStep::Edge(D::North), S1, S2, VertexStep::Edge(D::East)],
    [VertexStep::Edge(D::West), S2, S1, VertexStep::Edge(D::South)],
    [S2, VertexStep::Edge(D::East), VertexStep::Edge(D::South), S1],
];

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [NW, NE, SW, SE];

    /// The diagonally opposite quadrant.
    pub fn flip(self) -> Self {
        match self {
            NW => SE,
            NE => SW,
            SW => NE,
            SE => NW,
        }
    }

    /// `None` for diagonal directions.
    pub fn neighbor_present(self, dir: MeshDir) -> Option<u8> {
        dir.primary_index().map(|i| NBR_PRESENT[self as usize][i])
    }

    pub fn edge_neighbor(self, dir: MeshDir) -> Option<Quadrant> {
        dir.primary_index().map(|i| NBR_INDEX[self as usize][i])
    }

    /// `None` for primary directions.
    pub fn vertex_neighbor(self, dir: MeshDir) -> Option<VertexStep> {
        dir.diagonal_index().map(|i| VTX_NBR[self as usize][i])
    }
}

impl MeshDir {
    pub const ALL: [MeshDir; 8] = [
        D::North,
        D::NorthEast,
        D::East,
        D::SouthEast,
        D::South,
        D::SouthWest,
        D::West,
        D::NorthWest,
    ];

    pub fn opposite(self) -> Self {
        Self::ALL[(self as usize + 4) % 8]
    }

    pub fn is_diagonal(self) -> bool {
        (self as usize) % 2 == 1
    }

    fn primary_index(self) -> Option<usize> {
        match self {
            D::North => Some(0),
            D::West => Some(1),
            D::East => Some(2),
            D::South => Some(3),
            _ => None,
        }
    }

    fn diagonal_index(self) -> Option<usize> {
        match self {
            D::NorthWest => Some(0),
            D::NorthEast => Some(1),
            D::SouthWest => Some(2),
            D::SouthEast => Some(3),
            _ => None,
        }
    }

    /// Children of a divided node that touch its side facing `self`.
    fn facing_children(self) -> &'static [Quadrant] {
        match self {
            D::North => &[NW, NE],
            D::West => &[NW, SW],
            D::East => &[NE, SE],
            D::South => &[SW, SE],
            D::NorthWest => &[NW],
            D::NorthEast => &[NE],
            D::SouthWest => &[SW],
            D::SouthEast => &[SE],
        }
    }
}

/// Path from the root to a node, one quadrant per level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QuadId(pub Vec<Quadrant>);

impl QuadId {
    pub fn level(&self) -> usize {
        self.0.len()
    }

    /// Decimal encoding with one digit `quadrant + 1` per level.
    pub fn to_int(&self) -> i64 {
        self.0
            .iter()
            .fold(0i64, |id, q| id.saturating_mul(10).saturating_add(*q as i64 + 1))
    }

    /// Path of the same-level edge neighbor in primary direction `dir`,
    /// with the number of levels that had to be rewritten (plus one).
    /// `None` on the raster border or for a diagonal `dir`.
    pub fn edge_neighbor_id(&self, dir: MeshDir) -> Option<(QuadId, usize)> {
        let mut neighbor = self.0.clone();
        let mut count = 1;
        let mut i = self.0.len();
        while i > 0 {
            let quadrant = self.0[i - 1];
            let present = quadrant.neighbor_present(dir)?;
            neighbor[i - 1] = quadrant.edge_neighbor(dir)?;
            i -= 1;
            if present == 0 {
                // Remaining ancestors are shared.
                return Some((QuadId(neighbor), count));
            }
            count += 1;
        }
        None
    }

    /// Path of the same-level vertex neighbor in diagonal direction `dir`.
    pub fn vertex_neighbor_id(&self, dir: MeshDir) -> Option<(QuadId, usize)> {
        let mut neighbor = self.0.clone();
        let mut count = 1;
        let mut i = self.0.len();
        while i > 0 {
            let quadrant = self.0[i - 1];
            neighbor[i - 1] = quadrant.flip();
            let step = quadrant.vertex_neighbor(dir)?;
            i -= 1;
            match step {
                VertexStep::Up => count += 1,
                VertexStep::Same => return Some((QuadId(neighbor), count)),
                VertexStep::Edge(edge_dir) => {
                    let prefix = QuadId(self.0[..i].to_vec());
                    let (edge_id, edge_count) = prefix.edge_neighbor_id(edge_dir)?;
                    neighbor[..i].copy_from_slice(&edge_id.0);
                    return Some((QuadId(neighbor), count + edge_count));
                }
            }
        }
        None
    }
}

impl fmt::Display for QuadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, q) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "-")?;
            }
            write!(f, "{}", *q as u8)?;
        }
        Ok(())
    }
}

/// How a decomposition cut the space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecompositionType {
    Block,
}

/// One leaf of a decomposition: where it sits, what it must compute and
/// who it borders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSpaceInfo {
    pub id: i64,
    pub decomposition: DecompositionType,
    /// Rows and columns of the whole space.
    pub global_dims: (u64, u64),
    /// Leaf extent grown by the halo, in global pixel coordinates.
    pub mbr: Area,
    /// Cells the leaf computes, relative to `mbr`.
    pub work_rect: Area,
    /// Leaf ids per [`MeshDir`], indexed by `dir as usize`.
    pub neighbors: [Vec<i64>; 8],
    pub workload: u64,
}

impl SubSpaceInfo {
    /// The computed cells in global pixel coordinates.
    pub fn work_area(&self) -> Area {
        self.work_rect.translate(self.mbr.ul.x, self.mbr.ul.y)
    }
}

const ROOT: usize = 0;

#[derive(Debug, Clone)]
struct Node {
    id: QuadId,
    parent: Option<usize>,
    children: Option<[usize; 4]>,
    /// Inclusive pixel extent without halo.
    mbr: Area,
    workload: Option<u64>,
    neighbors: Option<[Vec<usize>; 8]>,
}

type Workload = Box<dyn Fn(&Area) -> u64 + Send + Sync>;

/// Quadtree over a `row_count` x `column_count` cell space.
///
/// The root is divided on construction; [`QuadTree::grow`] then splits the
/// heaviest leaf until the leaf budget or the minimum workload is reached.
pub struct QuadTree {
    nodes: Vec<Node>,
    leaves: Vec<usize>,
    global_dims: (u64, u64),
    halo: u64,
    max_leaves: usize,
    min_workload: u64,
    workload: Workload,
}

impl fmt::Debug for QuadTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadTree")
            .field("global_dims", &self.global_dims)
            .field("halo", &self.halo)
            .field("max_leaves", &self.max_leaves)
            .field("min_workload", &self.min_workload)
            .field("leaves", &self.leaves.len())
            .finish()
    }
}

impl QuadTree {
    /// Tree without halo whose leaf workload is its pixel count.
    pub fn new(row_count: u64, column_count: u64, max_leaves: usize, min_workload: u64) -> Result<Self> {
        Self::with_workload(row_count, column_count, 0, max_leaves, min_workload, |area: &Area| {
            area.pixel_count()
        })
    }

    /// Tree whose leaves need `halo` extra cells on every side and whose
    /// leaf workload is computed by `workload`.
    pub fn with_workload<F>(
        row_count: u64,
        column_count: u64,
        halo: u64,
        max_leaves: usize,
        min_workload: u64,
        workload: F,
    ) -> Result<Self>
    where
        F: Fn(&Area) -> u64 + Send + Sync + 'static,
    {
        if max_leaves < 4 {
            return Err(ReprojectError::partition(
                "a quadtree needs a budget of at least 4 leaves",
            ));
        }
        if row_count <= 2 * halo || column_count <= 2 * halo {
            return Err(ReprojectError::partition(format!(
                "a {row_count}x{column_count} space has no cells inside a halo of {halo}"
            )));
        }

        let root = Node {
            id: QuadId::default(),
            parent: None,
            children: None,
            mbr: Area::pixels(halo, halo, column_count - 1 - halo, row_count - 1 - halo),
            workload: None,
            neighbors: None,
        };
        let mut tree = Self {
            nodes: vec![root],
            leaves: Vec::new(),
            global_dims: (row_count, column_count),
            halo,
            max_leaves,
            min_workload,
            workload: Box::new(workload),
        };
        if !tree.divide(ROOT) {
            return Err(ReprojectError::partition(format!(
                "cannot divide a {}x{} root",
                tree.nodes[ROOT].mbr.row_count(),
                tree.nodes[ROOT].mbr.column_count()
            )));
        }
        tree.leaves = tree.collect_leaves(ROOT);
        tree.update_workloads();
        Ok(tree)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Extents of the current leaves, in leaf order.
    pub fn leaf_areas(&self) -> Vec<Area> {
        self.leaves.iter().map(|&leaf| self.nodes[leaf].mbr).collect()
    }

    /// Split the heaviest leaf. Returns false once the leaf budget or the
    /// minimum workload is reached, or the heaviest leaf is too small.
    pub fn grow(&mut self) -> bool {
        if self.max_leaves.saturating_sub(self.leaves.len()) < 3 {
            debug!(leaves = self.leaves.len(), "Quadtree growth stopped at the leaf budget");
            return false;
        }

        let mut heaviest = 0;
        let mut max_workload = self.leaf_workload(0);
        for i in 1..self.leaves.len() {
            let workload = self.leaf_workload(i);
            if max_workload < workload {
                heaviest = i;
                max_workload = workload;
            }
        }
        if max_workload <= self.min_workload {
            debug!(leaves = self.leaves.len(), "Quadtree growth stopped at the minimum workload");
            return false;
        }

        let node = self.leaves[heaviest];
        if !self.divide(node) {
            return false;
        }
        self.leaves.remove(heaviest);
        if let Some(children) = self.nodes[node].children {
            self.leaves.extend(children);
        }
        self.update_workloads();
        true
    }

    /// Grow until [`QuadTree::grow`] stops.
    pub fn grow_fully(&mut self) {
        while self.grow() {}
    }

    /// Find every leaf's neighbors in all eight directions.
    pub fn update_neighbors(&mut self) {
        for i in 0..self.leaves.len() {
            let leaf = self.leaves[i];
            let neighbors = self.find_neighbors(leaf);
            self.nodes[leaf].neighbors = Some(neighbors);
        }
    }

    /// Describe every leaf, heaviest first. Neighbors must have been found.
    pub fn decompose(&self) -> Result<Vec<SubSpaceInfo>> {
        let (rows, columns) = self.global_dims;
        let mut infos = Vec::with_capacity(self.leaves.len());
        for &leaf in &self.leaves {
            let node = &self.nodes[leaf];
            let neighbors = node.neighbors.as_ref().ok_or_else(|| {
                ReprojectError::partition(format!("leaf {} has no neighbor map yet", node.id))
            })?;

            let quad = node.mbr;
            let mbr = Area::pixels(
                quad.first_column().saturating_sub(self.halo),
                quad.first_row().saturating_sub(self.halo),
                (quad.last_column() + self.halo).min(columns - 1),
                (quad.last_row() + self.halo).min(rows - 1),
            );
            let work_rect = quad.translate(-mbr.ul.x, -mbr.ul.y);

            infos.push(SubSpaceInfo {
                id: node.id.to_int(),
                decomposition: DecompositionType::Block,
                global_dims: self.global_dims,
                mbr,
                work_rect,
                neighbors: std::array::from_fn(|dir| {
                    neighbors[dir].iter().map(|&n| self.nodes[n].id.to_int()).collect()
                }),
                workload: node.workload.unwrap_or(0),
            });
        }
        infos.sort_by(|a, b| b.workload.cmp(&a.workload));
        Ok(infos)
    }

    fn leaf_workload(&self, i: usize) -> u64 {
        self.nodes[self.leaves[i]].workload.unwrap_or(0)
    }

    fn divide(&mut self, node: usize) -> bool {
        let parent = &self.nodes[node];
        let mbr = parent.mbr;
        if parent.children.is_some() || mbr.row_count() < 2 || mbr.column_count() < 2 {
            return false;
        }

        let (min_row, min_col) = (mbr.first_row(), mbr.first_column());
        let (max_row, max_col) = (mbr.last_row(), mbr.last_column());
        let center_row = min_row + mbr.row_count() / 2 - 1;
        let center_col = min_col + mbr.column_count() / 2 - 1;

        let extents = [
            Area::pixels(min_col, min_row, center_col, center_row),
            Area::pixels(center_col + 1, min_row, max_col, center_row),
            Area::pixels(min_col, center_row + 1, center_col, max_row),
            Area::pixels(center_col + 1, center_row + 1, max_col, max_row),
        ];
        let parent_id = parent.id.clone();
        let first = self.nodes.len();
        for (quadrant, extent) in Quadrant::ALL.into_iter().zip(extents) {
            let mut id = parent_id.clone();
            id.0.push(quadrant);
            self.nodes.push(Node {
                id,
                parent: Some(node),
                children: None,
                mbr: extent,
                workload: None,
                neighbors: None,
            });
        }
        self.nodes[node].children = Some([first, first + 1, first + 2, first + 3]);
        true
    }

    fn collect_leaves(&self, node: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        self.push_leaves(node, &mut leaves);
        leaves
    }

    fn push_leaves(&self, node: usize, leaves: &mut Vec<usize>) {
        match self.nodes[node].children {
            Some(children) => children.iter().for_each(|&c| self.push_leaves(c, leaves)),
            None => leaves.push(node),
        }
    }

    fn update_workloads(&mut self) {
        for &leaf in &self.leaves {
            if self.nodes[leaf].workload.is_none() {
                let workload = (self.workload)(&self.nodes[leaf].mbr);
                self.nodes[leaf].workload = Some(workload);
            }
        }
    }

    fn find_neighbors(&self, leaf: usize) -> [Vec<usize>; 8] {
        let mut found: [Vec<usize>; 8] = Default::default();
        let id = &self.nodes[leaf].id;
        for dir in MeshDir::ALL {
            let path = if dir.is_diagonal() {
                id.vertex_neighbor_id(dir)
            } else {
                id.edge_neighbor_id(dir)
            };
            let Some((path, count)) = path else {
                continue;
            };
            let neighbor = self.node_at(leaf, &path, count);
            if !self.leaves_facing(neighbor, dir.opposite(), &mut found[dir as usize]) {
                found[dir as usize].push(neighbor);
            }
        }

        // A corner touching a leaf already listed along an adjacent edge
        // is not reported twice.
        for diagonal in (1..8).step_by(2) {
            let before = found[diagonal - 1].clone();
            let after = found[(diagonal + 1) % 8].clone();
            found[diagonal].retain(|n| !before.contains(n) && !after.contains(n));
        }
        found
    }

    /// Deepest existing node on `path`, reached from the root or by
    /// climbing `count` levels from `from`, whichever is shorter.
    fn node_at(&self, from: usize, path: &QuadId, count: usize) -> usize {
        let depth = self.nodes[from].id.level();
        let (mut node, start) = if count > depth / 2 {
            (ROOT, 0)
        } else {
            let mut node = from;
            for _ in 0..count {
                node = self.nodes[node].parent.unwrap_or(ROOT);
            }
            (node, depth - count)
        };
        for quadrant in &path.0[start..depth] {
            match self.nodes[node].children {
                Some(children) => node = children[*quadrant as usize],
                None => return node,
            }
        }
        node
    }

    /// Leaves under `node` along its side facing `dir`. False when `node`
    /// is itself a leaf.
    fn leaves_facing(&self, node: usize, dir: MeshDir, out: &mut Vec<usize>) -> bool {
        let Some(children) = self.nodes[node].children else {
            return false;
        };
        for quadrant in dir.facing_children() {
            let child = children[*quadrant as usize];
            if !self.leaves_facing(child, dir, out) {
                out.push(child);
            }
        }
        true
    }
}

/// Grow a pixel-count quadtree over the space and decompose it.
pub fn decompose(row_count: u64, column_count: u64, max_leaves: usize) -> Result<Vec<SubSpaceInfo>> {
    let mut tree = QuadTree::new(row_count, column_count, max_leaves, 0)?;
    tree.grow_fully();
    tree.update_neighbors();
    tree.decompose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(quadrants: &[Quadrant]) -> QuadId {
        QuadId(quadrants.to_vec())
    }

    #[test]
    fn test_to_int_digits() {
        assert_eq!(id(&[NW]).to_int(), 1);
        assert_eq!(id(&[SE, NW, NE]).to_int(), 412);
        assert_eq!(QuadId::default().to_int(), 0);
    }

    #[test]
    fn test_flip_is_involution() {
        for q in Quadrant::ALL {
            assert_eq!(q.flip().flip(), q);
            assert_ne!(q.flip(), q);
        }
    }

    #[test]
    fn test_edge_neighbor_same_parent() {
        let (nbr, count) = id(&[NW, NW]).edge_neighbor_id(MeshDir::East).unwrap();
        assert_eq!(nbr, id(&[NW, NE]));
        assert_eq!(count, 1);
    }

    #[test]
    fn test_edge_neighbor_across_parents() {
        // East of NW.NE is NE.NW.
        let (nbr, count) = id(&[NW, NE]).edge_neighbor_id(MeshDir::East).unwrap();
        assert_eq!(nbr, id(&[NE, NW]));
        assert_eq!(count, 2);
        // South of NW.SW is SW.NW.
        let (nbr, _) = id(&[NW, SW]).edge_neighbor_id(MeshDir::South).unwrap();
        assert_eq!(nbr, id(&[SW, NW]));
    }

    #[test]
    fn test_edge_neighbor_off_the_border() {
        assert!(id(&[NW, NW]).edge_neighbor_id(MeshDir::North).is_none());
        assert!(id(&[SE, SE]).edge_neighbor_id(MeshDir::East).is_none());
        assert!(id(&[NW]).edge_neighbor_id(MeshDir::NorthEast).is_none());
    }

    #[test]
    fn test_vertex_neighbors() {
        // Same parent.
        let (nbr, count) = id(&[NW, NW]).vertex_neighbor_id(MeshDir::SouthEast).unwrap();
        assert_eq!(nbr, id(&[NW, SE]));
        assert_eq!(count, 1);
        // Across the parent's east edge.
        let (nbr, _) = id(&[NW, NE]).vertex_neighbor_id(MeshDir::SouthEast).unwrap();
        assert_eq!(nbr, id(&[NE, SW]));
        // Across the parent's corner.
        let (nbr, count) = id(&[NW, SE]).vertex_neighbor_id(MeshDir::SouthEast).unwrap();
        assert_eq!(nbr, id(&[SE, NW]));
        assert_eq!(count, 2);
        // Off the border.
        assert!(id(&[NW, NW]).vertex_neighbor_id(MeshDir::NorthWest).is_none());
    }

    #[test]
    fn test_root_division() {
        let tree = QuadTree::new(10, 7, 4, 0).unwrap();
        assert_eq!(
            tree.leaf_areas(),
            vec![
                Area::pixels(0, 0, 2, 4),
                Area::pixels(3, 0, 6, 4),
                Area::pixels(0, 5, 2, 9),
                Area::pixels(3, 5, 6, 9),
            ]
        );
    }

    #[test]
    fn test_construction_errors() {
        assert!(QuadTree::new(10, 10, 3, 0).is_err());
        assert!(QuadTree::new(1, 10, 4, 0).is_err());
        assert!(QuadTree::with_workload(4, 4, 2, 4, 0, |a: &Area| a.pixel_count()).is_err());
    }

    #[test]
    fn test_grow_respects_budget() {
        let mut tree = QuadTree::new(64, 64, 10, 0).unwrap();
        tree.grow_fully();
        // 4 -> 7 -> 10 leaves, then 10 - 10 < 3 stops.
        assert_eq!(tree.leaf_count(), 10);
        let total: u64 = tree.leaf_areas().iter().map(|a| a.pixel_count()).sum();
        assert_eq!(total, 64 * 64);
    }

    #[test]
    fn test_grow_respects_min_workload() {
        let mut tree = QuadTree::new(16, 16, 1000, 64).unwrap();
        tree.grow_fully();
        assert!(tree.leaf_areas().iter().all(|a| a.pixel_count() <= 64));
        assert_eq!(tree.leaf_count(), 4);
    }

    #[test]
    fn test_custom_workload_splits_heavy_corner() {
        let mut tree = QuadTree::with_workload(32, 32, 0, 7, 0, |a: &Area| {
            if a.contains_pixel(0, 0) {
                1000
            } else {
                a.pixel_count()
            }
        })
        .unwrap();
        tree.grow_fully();
        assert_eq!(tree.leaf_count(), 7);
        assert!(tree.leaf_areas().contains(&Area::pixels(0, 0, 7, 7)));
    }

    #[test]
    fn test_neighbors_of_uniform_grid() {
        // 16 equal leaves on a 4x4 grid of 2x2 blocks.
        let mut tree = QuadTree::new(8, 8, 16, 4).unwrap();
        tree.grow_fully();
        assert_eq!(tree.leaf_count(), 16);
        tree.update_neighbors();
        let infos = tree.decompose().unwrap();

        let at = |col: u64, row: u64| {
            infos
                .iter()
                .find(|i| i.mbr == Area::pixels(col, row, col + 1, row + 1))
                .unwrap()
                .id
        };

        let centre = infos.iter().find(|i| i.id == at(2, 2)).unwrap();
        assert_eq!(centre.neighbors[MeshDir::North as usize], vec![at(2, 0)]);
        assert_eq!(centre.neighbors[MeshDir::NorthEast as usize], vec![at(4, 0)]);
        assert_eq!(centre.neighbors[MeshDir::East as usize], vec![at(4, 2)]);
        assert_eq!(centre.neighbors[MeshDir::SouthEast as usize], vec![at(4, 4)]);
        assert_eq!(centre.neighbors[MeshDir::South as usize], vec![at(2, 4)]);
        assert_eq!(centre.neighbors[MeshDir::SouthWest as usize], vec![at(0, 4)]);
        assert_eq!(centre.neighbors[MeshDir::West as usize], vec![at(0, 2)]);
        assert_eq!(centre.neighbors[MeshDir::NorthWest as usize], vec![at(0, 0)]);

        let corner = infos.iter().find(|i| i.id == at(0, 0)).unwrap();
        assert!(corner.neighbors[MeshDir::North as usize].is_empty());
        assert!(corner.neighbors[MeshDir::West as usize].is_empty());
        assert!(corner.neighbors[MeshDir::NorthWest as usize].is_empty());
        assert_eq!(corner.neighbors[MeshDir::SouthEast as usize], vec![at(2, 2)]);
    }

    #[test]
    fn test_neighbors_across_levels() {
        // Split only the NW quadrant: its east side borders the big NE leaf,
        // and NE sees both small leaves to its west.
        let mut tree = QuadTree::with_workload(8, 8, 0, 7, 0, |a: &Area| {
            if a.contains_pixel(0, 0) {
                100
            } else {
                1
            }
        })
        .unwrap();
        tree.grow_fully();
        assert_eq!(tree.leaf_count(), 7);
        tree.update_neighbors();
        let infos = tree.decompose().unwrap();
        let by_mbr = |area: Area| infos.iter().find(|i| i.mbr == area).unwrap();

        let ne = by_mbr(Area::pixels(4, 0, 7, 3));
        let nw_ne = by_mbr(Area::pixels(2, 0, 3, 1));
        let nw_se = by_mbr(Area::pixels(2, 2, 3, 3));
        assert_eq!(nw_ne.neighbors[MeshDir::East as usize], vec![ne.id]);
        let mut west = ne.neighbors[MeshDir::West as usize].clone();
        west.sort();
        let mut expected = vec![nw_ne.id, nw_se.id];
        expected.sort();
        assert_eq!(west, expected);
        // Across NE's south-west corner lies the undivided SW leaf.
        assert_eq!(ne.neighbors[MeshDir::SouthWest as usize], vec![3]);
        assert_eq!(nw_se.neighbors[MeshDir::East as usize], vec![ne.id]);
        // NE is east of NW.SE, so it is not repeated as its north-east
        // corner neighbor.
        assert!(!nw_se.neighbors[MeshDir::NorthEast as usize].contains(&ne.id));
    }

    #[test]
    fn test_decompose_sorted_by_workload_with_halo() {
        let mut tree = QuadTree::with_workload(10, 10, 1, 4, 0, |a: &Area| a.ul.x as u64 + a.ul.y as u64)
            .unwrap();
        tree.update_neighbors();
        let infos = tree.decompose().unwrap();
        assert!(infos.windows(2).all(|w| w[0].workload >= w[1].workload));

        // Root work area is 1..=8; NW leaf is 1..=4 grown to 0..=5.
        let nw = infos.iter().find(|i| i.id == 1).unwrap();
        assert_eq!(nw.mbr, Area::pixels(0, 0, 5, 5));
        assert_eq!(nw.work_rect, Area::pixels(1, 1, 4, 4));
        assert_eq!(nw.work_area(), Area::pixels(1, 1, 4, 4));
    }

    #[test]
    fn test_decompose_requires_neighbors() {
        let tree = QuadTree::new(8, 8, 4, 0).unwrap();
        assert!(tree.decompose().is_err());
    }
}
