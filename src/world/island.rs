//! Islands: groups of dynamic bodies connected through constraints.
//!
//! Islands fall asleep and wake up as a unit. Static and kinematic bodies
//! never join an island, so two bodies pinned to the same ground are
//! independent.

use crate::objects::Body;

/// Disjoint-set forest with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return;
        }

        match self.rank[root_x].cmp(&self.rank[root_y]) {
            std::cmp::Ordering::Less => self.parent[root_x] = root_y,
            std::cmp::Ordering::Greater => self.parent[root_y] = root_x,
            std::cmp::Ordering::Equal => {
                self.parent[root_y] = root_x;
                self.rank[root_x] += 1;
            }
        }
    }
}

/// Partitions the dynamic bodies into islands.
///
/// `links` are pairs of body indices joined by a constraint. Islands are
/// ordered by their lowest body index and list members in ascending order.
pub(crate) fn build_islands(bodies: &[Body], links: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut uf = UnionFind::new(bodies.len());
    for &(a, b) in links {
        if bodies[a].is_dynamic() && bodies[b].is_dynamic() {
            uf.union(a, b);
        }
    }

    let mut root_to_island = vec![usize::MAX; bodies.len()];
    let mut islands: Vec<Vec<usize>> = Vec::new();
    for (idx, body) in bodies.iter().enumerate() {
        if !body.is_dynamic() {
            continue;
        }
        let root = uf.find(idx);
        if root_to_island[root] == usize::MAX {
            root_to_island[root] = islands.len();
            islands.push(Vec::new());
        }
        islands[root_to_island[root]].push(idx);
    }
    islands
}

/// The island containing body `idx`, or an empty list for non-dynamic bodies.
pub(crate) fn island_of(bodies: &[Body], links: &[(usize, usize)], idx: usize) -> Vec<usize> {
    build_islands(bodies, links)
        .into_iter()
        .find(|island| island.contains(&idx))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic() -> Body {
        Body::new(1.0, 1.0).unwrap()
    }

    #[test]
    fn test_union_find() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(3, 4);
        uf.union(1, 2);
        assert_eq!(uf.find(0), uf.find(2));
        assert_eq!(uf.find(3), uf.find(4));
        assert_ne!(uf.find(0), uf.find(3));
    }

    #[test]
    fn test_two_chains_form_two_islands() {
        let bodies = vec![dynamic(), dynamic(), dynamic(), dynamic(), dynamic()];
        let islands = build_islands(&bodies, &[(0, 1), (1, 2), (3, 4)]);
        assert_eq!(islands, vec![vec![0, 1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_unconnected_bodies_are_singletons() {
        let bodies = vec![dynamic(), dynamic()];
        assert_eq!(build_islands(&bodies, &[]), vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_static_body_does_not_join_islands() {
        let bodies = vec![dynamic(), Body::new_static(), dynamic()];
        let islands = build_islands(&bodies, &[(0, 1), (1, 2)]);
        assert_eq!(islands, vec![vec![0], vec![2]]);
        assert!(island_of(&bodies, &[(0, 1)], 1).is_empty());
        assert_eq!(island_of(&bodies, &[(0, 2)], 2), vec![0, 2]);
    }
}
