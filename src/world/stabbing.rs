//! Stabbing trees: per-sector precomputed sets of sectors visible through portals.
//!
//! A tree is built once from authoring data and never changes. Every
//! root-to-leaf path is checked at build time so traversal can recurse
//! without tracking visited sectors.

use crate::core::types::Result;
use crate::core::Error;
use super::sector::SectorId;

/// Authored branch before validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StabbingBranch {
    pub sector: SectorId,
    pub children: Vec<StabbingBranch>,
}

impl StabbingBranch {
    pub fn new(sector: SectorId, children: Vec<StabbingBranch>) -> Self {
        Self { sector, children }
    }

    pub fn leaf(sector: SectorId) -> Self {
        Self::new(sector, Vec::new())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StabbingTreeNode {
    pub sector: SectorId,
    pub children: Vec<usize>,
}

/// Immutable tree stored as a flat node list; index 0 is the owning sector
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StabbingTree {
    nodes: Vec<StabbingTreeNode>,
}

impl StabbingTree {
    pub const ROOT: usize = 0;

    /// Tree with only the owning sector
    pub fn leaf(sector: SectorId) -> Self {
        Self {
            nodes: vec![StabbingTreeNode { sector, children: Vec::new() }],
        }
    }

    /// Validate and flatten authored branches under `root`.
    /// `name_of` is only used to describe a cycle in the error.
    pub fn build<F>(root: SectorId, branches: &[StabbingBranch], name_of: F) -> Result<Self>
    where
        F: Fn(SectorId) -> String,
    {
        let mut tree = Self::leaf(root);
        let mut path = vec![root];
        for branch in branches {
            let child = tree.push(branch, &mut path, &name_of)?;
            tree.nodes[Self::ROOT].children.push(child);
        }
        Ok(tree)
    }

    fn push<F>(&mut self, branch: &StabbingBranch, path: &mut Vec<SectorId>, name_of: &F) -> Result<usize>
    where
        F: Fn(SectorId) -> String,
    {
        if path.contains(&branch.sector) {
            let mut names: Vec<String> = path.iter().map(|s| name_of(*s)).collect();
            names.push(name_of(branch.sector));
            return Err(Error::StabbingTreeCycle {
                sector: name_of(path[0]),
                path: names,
            });
        }

        let index = self.nodes.len();
        self.nodes.push(StabbingTreeNode {
            sector: branch.sector,
            children: Vec::new(),
        });

        path.push(branch.sector);
        for child in &branch.children {
            let child_index = self.push(child, path, name_of)?;
            self.nodes[index].children.push(child_index);
        }
        path.pop();

        Ok(index)
    }

    pub fn root(&self) -> &StabbingTreeNode {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, index: usize) -> &StabbingTreeNode {
        &self.nodes[index]
    }

    /// Children of `index` with their own indices
    pub fn children(&self, index: usize) -> impl Iterator<Item = (usize, &StabbingTreeNode)> + '_ {
        self.nodes[index].children.iter().map(move |&c| (c, &self.nodes[c]))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sectors reachable in exactly one hop from the owner
    pub fn direct_sectors(&self) -> impl Iterator<Item = SectorId> + '_ {
        self.children(Self::ROOT).map(|(_, n)| n.sector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(id: SectorId) -> String {
        format!("s{}", id.0)
    }

    #[test]
    fn test_build_flattens() {
        let branches = vec![
            StabbingBranch::new(SectorId(1), vec![StabbingBranch::leaf(SectorId(2))]),
            StabbingBranch::leaf(SectorId(3)),
        ];
        let tree = StabbingTree::build(SectorId(0), &branches, name).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root().sector, SectorId(0));
        let direct: Vec<_> = tree.direct_sectors().collect();
        assert_eq!(direct, vec![SectorId(1), SectorId(3)]);

        let (first, _) = tree.children(StabbingTree::ROOT).next().unwrap();
        let grandchildren: Vec<_> = tree.children(first).map(|(_, n)| n.sector).collect();
        assert_eq!(grandchildren, vec![SectorId(2)]);
    }

    #[test]
    fn test_same_sector_in_sibling_branches_is_allowed() {
        let branches = vec![
            StabbingBranch::new(SectorId(1), vec![StabbingBranch::leaf(SectorId(3))]),
            StabbingBranch::new(SectorId(2), vec![StabbingBranch::leaf(SectorId(3))]),
        ];
        assert!(StabbingTree::build(SectorId(0), &branches, name).is_ok());
    }

    #[test]
    fn test_cycle_rejected() {
        let branches = vec![StabbingBranch::new(
            SectorId(1),
            vec![StabbingBranch::new(SectorId(2), vec![StabbingBranch::leaf(SectorId(1))])],
        )];
        let err = StabbingTree::build(SectorId(0), &branches, name).unwrap_err();
        match err {
            Error::StabbingTreeCycle { sector, path } => {
                assert_eq!(sector, "s0");
                assert_eq!(path, vec!["s0", "s1", "s2", "s1"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_root_revisit_rejected() {
        let branches = vec![StabbingBranch::new(SectorId(1), vec![StabbingBranch::leaf(SectorId(0))])];
        assert!(StabbingTree::build(SectorId(0), &branches, name).is_err());
    }
}
