#![allow(dead_code)]
use sliding_mesh::prelude::*;
use std::f64::consts::TAU;

/// Cylindrical rotor/stator pair meeting at radius `radius`, axis along z.
///
/// The rotor (rotated side) is a ring of `num_tags * per_tag` hexahedra between
/// `radius - thickness` and `radius`; the stator (fixed side) a ring of
/// `num_fixed` hexahedra between `radius` and `radius + thickness`, rotated by
/// `fixed_offset`. Both span `0..height` in z with one layer.
#[derive(Clone, Debug)]
pub struct RingSpec {
    pub radius: f64,
    pub thickness: f64,
    pub height: f64,
    pub num_tags: usize,
    pub per_tag: usize,
    pub num_fixed: usize,
    pub fixed_offset: f64,
    pub dof_sol: usize,
}

impl Default for RingSpec {
    fn default() -> Self {
        Self {
            radius: 1.0,
            thickness: 0.2,
            height: 0.5,
            num_tags: 4,
            per_tag: 2,
            num_fixed: 8,
            fixed_offset: 0.0,
            dof_sol: 1,
        }
    }
}

impl RingSpec {
    pub fn num_rotated(&self) -> usize {
        self.num_tags * self.per_tag
    }

    /// Largest distance between a chord of either ring and the true circle.
    pub fn max_sag(&self) -> f64 {
        let n = self.num_rotated().min(self.num_fixed) as f64;
        self.radius * (1.0 - (TAU / (2.0 * n)).cos())
    }

    /// Total area of the fixed-side interface faces.
    pub fn fixed_area(&self) -> f64 {
        let m = self.num_fixed as f64;
        m * 2.0 * self.radius * (TAU / (2.0 * m)).sin() * self.height
    }
}

pub struct Ring {
    pub spec: RingSpec,
    pub size: usize,
    pub topology: LocalInterface,
    pub nodes: Vec<InterfaceNodes>,
    /// Reference position of every fixed interface node slot.
    pub fixed_ref: Vec<Point3>,
    /// Reference position of every rotated interface node slot.
    pub rotated_ref: Vec<Point3>,
    /// Local array length on each rank.
    pub local_len: Vec<usize>,
}

pub fn polar(r: f64, theta: f64, z: f64) -> Point3 {
    [r * theta.cos(), r * theta.sin(), z]
}

/// Rotate `p` about the z axis.
pub fn rotate(p: &Point3, angle: f64) -> Point3 {
    let (s, c) = angle.sin_cos();
    [c * p[0] - s * p[1], s * p[0] + c * p[1], p[2]]
}

pub fn dist(a: &Point3, b: &Point3) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

// Slot of node (z layer, radial layer, angular index) in an `n`-element ring.
fn slot(n: usize, zi: usize, ri: usize, a: usize) -> usize {
    (zi * 2 + ri) * n + a
}

fn ring_points(n: usize, r: [f64; 2], height: f64, theta0: f64) -> Vec<Point3> {
    let mut pts = vec![[0.0; 3]; 4 * n];
    for zi in 0..2 {
        for ri in 0..2 {
            for a in 0..n {
                let theta = theta0 + TAU * a as f64 / n as f64;
                pts[slot(n, zi, ri, a)] = polar(r[ri], theta, zi as f64 * height);
            }
        }
    }
    pts
}

// Hex8 connectivity of element `i`: bottom quad (r0,a) (r1,a) (r1,a+1) (r0,a+1), then top.
fn hex_ien(n: usize, i: usize) -> Vec<usize> {
    let j = (i + 1) % n;
    vec![
        slot(n, 0, 0, i),
        slot(n, 0, 1, i),
        slot(n, 0, 1, j),
        slot(n, 0, 0, j),
        slot(n, 1, 0, i),
        slot(n, 1, 1, i),
        slot(n, 1, 1, j),
        slot(n, 1, 0, j),
    ]
}

/// Hex8 face on the outer radius of the element.
pub const OUTER_FACE: usize = 3;
/// Hex8 face on the inner radius of the element.
pub const INNER_FACE: usize = 5;

/// Build the ring; `owner(side, slot)` assigns every interface node to a rank.
pub fn build_ring(spec: RingSpec, size: usize, owner: impl Fn(NodeSide, usize) -> usize) -> Ring {
    let nr = spec.num_rotated();
    let nf = spec.num_fixed;
    let rotated_ref = ring_points(
        nr,
        [spec.radius - spec.thickness, spec.radius],
        spec.height,
        0.0,
    );
    let fixed_ref = ring_points(
        nf,
        [spec.radius, spec.radius + spec.thickness],
        spec.height,
        spec.fixed_offset,
    );

    let bin = TAU / spec.num_tags as f64;
    let fixed_elements = (0..nf)
        .map(|j| {
            let ien = hex_ien(nf, j);
            let center = spec.fixed_offset + TAU * (j as f64 + 0.5) / nf as f64;
            let tag = (center.rem_euclid(TAU) / bin) as usize % spec.num_tags;
            FixedElement {
                ctrl_pts: ien.iter().map(|&s| fixed_ref[s]).collect(),
                face: INNER_FACE,
                tag,
                ien,
            }
        })
        .collect();
    let rotated_elements = (0..spec.num_tags)
        .map(|t| {
            (t * spec.per_tag..(t + 1) * spec.per_tag)
                .map(|i| {
                    let ien = hex_ien(nr, i);
                    RotatedElement {
                        ctrl_pts: ien.iter().map(|&s| rotated_ref[s]).collect(),
                        face: OUTER_FACE,
                        ien,
                    }
                })
                .collect()
        })
        .collect();

    // Local arrays hold each rank's fixed nodes first, then its rotated nodes.
    let mut local_len = vec![0usize; size];
    let mut node_set = |side: NodeSide, count: usize, base: usize| {
        let mut set = InterfaceNodeSet::default();
        for s in 0..count {
            let r = owner(side, s);
            set.node_map.push(base + s);
            set.part_tag.push(r);
            set.loc_pos.push(local_len[r]);
            local_len[r] += 1;
        }
        set
    };
    let fixed = node_set(NodeSide::Fixed, 4 * nf, 0);
    let rotated = node_set(NodeSide::Rotated, 4 * nr, 4 * nf);

    let topology = LocalInterface::new(
        ElementKind::Hex8,
        vec![InterfaceData {
            fixed_elements,
            rotated_elements,
            tag_angles: None,
        }],
    );
    Ring {
        spec,
        size,
        topology,
        nodes: vec![InterfaceNodes { fixed, rotated }],
        fixed_ref,
        rotated_ref,
        local_len,
    }
}

/// Every node on rank 0.
pub fn serial_ring(spec: RingSpec) -> Ring {
    build_ring(spec, 1, |_, _| 0)
}

/// Nodes dealt round-robin over `size` ranks.
pub fn striped_ring(spec: RingSpec, size: usize) -> Ring {
    build_ring(spec, size, move |side, s| match side {
        NodeSide::Fixed => s % size,
        NodeSide::Rotated => (s + 1) % size,
    })
}

impl Ring {
    fn set(&self, side: NodeSide) -> &InterfaceNodeSet {
        self.nodes[0].side(side)
    }

    /// Local field of `rank` with `f(side, slot)` as the values of each owned node.
    pub fn local_field(
        &self,
        rank: usize,
        dof: usize,
        f: impl Fn(NodeSide, usize) -> Vec<f64>,
    ) -> LocalField {
        let mut field = LocalField::zeros(dof, self.local_len[rank]);
        for side in [NodeSide::Fixed, NodeSide::Rotated] {
            for rec in self.set(side).owned_by(rank) {
                field.node_mut(rec.local_pos).copy_from_slice(&f(side, rec.slot));
            }
        }
        field
    }

    /// Solution: a smooth function of the reference position, `dof_sol` components.
    pub fn solution(&self, rank: usize) -> LocalField {
        let dof = self.spec.dof_sol;
        self.local_field(rank, dof, |side, s| {
            let x = self.reference(side, s);
            (0..dof).map(|d| x[0] + 2.0 * x[1] - x[2] + d as f64).collect()
        })
    }

    /// Rigid rotation of the rotor by `angle`; the stator stays put.
    pub fn displacement(&self, rank: usize, angle: f64) -> LocalField {
        self.local_field(rank, 3, |side, s| match side {
            NodeSide::Fixed => vec![0.0; 3],
            NodeSide::Rotated => {
                let x = self.rotated_ref[s];
                let y = rotate(&x, angle);
                vec![y[0] - x[0], y[1] - x[1], y[2] - x[2]]
            }
        })
    }

    /// Mesh velocity `omega e_z x x` of the rotor at `angle`.
    pub fn velocity(&self, rank: usize, omega: f64, angle: f64) -> LocalField {
        self.local_field(rank, 3, |side, s| match side {
            NodeSide::Fixed => vec![0.0; 3],
            NodeSide::Rotated => {
                let y = rotate(&self.rotated_ref[s], angle);
                vec![-omega * y[1], omega * y[0], 0.0]
            }
        })
    }

    pub fn reference(&self, side: NodeSide, s: usize) -> Point3 {
        match side {
            NodeSide::Fixed => self.fixed_ref[s],
            NodeSide::Rotated => self.rotated_ref[s],
        }
    }

    /// Topology seen by `rank`: all rotated elements, every `size`-th fixed element.
    pub fn topology_for_rank(&self, rank: usize) -> LocalInterface {
        let mut topo = self.topology.clone();
        let data = &mut topo.interfaces[0];
        data.fixed_elements = data
            .fixed_elements
            .iter()
            .enumerate()
            .filter(|(j, _)| j % self.size == rank)
            .map(|(_, e)| e.clone())
            .collect();
        topo
    }

    /// Partition artifact for `rank`.
    pub fn partition(&self, rank: usize) -> InterfacePartition {
        InterfacePartition::new(
            rank,
            self.size,
            self.spec.dof_sol,
            self.topology_for_rank(rank),
            self.nodes.clone(),
        )
    }
}

pub fn gauss(name: &str) -> QuadratureRule {
    QuadratureRule::from_name(name, FaceKind::Quad4).unwrap()
}

/// Serial driver over `ring` with the default projector.
pub fn serial_driver(ring: &Ring, rule: &str) -> SlidingInterface<NoComm> {
    SlidingInterface::from_parts(
        NoComm,
        ring.topology.clone(),
        ring.nodes.clone(),
        ring.spec.dof_sol,
        ClosestPointProjector::default(),
        gauss(rule),
    )
    .unwrap()
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("sliding-mesh-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
