//! Distributed nodal fields as seen by one rank.
//!
//! The solver owns its solution, mesh velocity and mesh displacement vectors;
//! this crate only needs each rank's local array, laid out node-major with a
//! fixed number of values per node.

use crate::mesh_error::SlidingMeshError;
use serde::{Deserialize, Serialize};

/// The nodal quantities gathered for the opposite side of an interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldKind {
    /// Flow unknowns, `dof_sol` values per node.
    Solution,
    /// Mesh velocity, three components per node.
    MeshVelocity,
    /// Mesh displacement from the reference configuration, three components per node.
    MeshDisplacement,
}

impl FieldKind {
    pub const ALL: [FieldKind; 3] = [
        FieldKind::Solution,
        FieldKind::MeshVelocity,
        FieldKind::MeshDisplacement,
    ];
}

/// Access to the local part of a distributed nodal vector.
pub trait DistributedField {
    /// Values stored per node.
    fn dof_per_node(&self) -> usize;

    /// Local values, node-major: node `n` occupies `[dof*n, dof*(n+1))`.
    fn local_array(&self) -> &[f64];
}

/// Plain owned local array.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalField {
    dof: usize,
    values: Vec<f64>,
}

impl LocalField {
    pub fn new(dof: usize, values: Vec<f64>) -> Result<Self, SlidingMeshError> {
        if dof == 0 || values.len() % dof != 0 {
            return Err(SlidingMeshError::RaggedField {
                len: values.len(),
                dof,
            });
        }
        Ok(Self { dof, values })
    }

    pub fn zeros(dof: usize, num_nodes: usize) -> Self {
        Self {
            dof,
            values: vec![0.0; dof * num_nodes],
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.values.len() / self.dof
    }

    pub fn node(&self, n: usize) -> &[f64] {
        &self.values[self.dof * n..self.dof * (n + 1)]
    }

    pub fn node_mut(&mut self, n: usize) -> &mut [f64] {
        &mut self.values[self.dof * n..self.dof * (n + 1)]
    }
}

impl DistributedField for LocalField {
    fn dof_per_node(&self) -> usize {
        self.dof
    }

    fn local_array(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_slices_are_node_major() {
        let mut f = LocalField::zeros(3, 2);
        f.node_mut(1).copy_from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(f.local_array(), &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(f.num_nodes(), 2);
    }

    #[test]
    fn ragged_array_is_rejected() {
        assert_eq!(
            LocalField::new(4, vec![0.0; 6]).unwrap_err(),
            SlidingMeshError::RaggedField { len: 6, dof: 4 }
        );
        assert!(matches!(
            LocalField::new(0, vec![]),
            Err(SlidingMeshError::RaggedField { dof: 0, .. })
        ));
    }
}
