//! Per-task scratch storage of the RHS kernel.

use crate::field::{Scalar2d, ScalarField, VectorField};
use crate::pack::{LevelLayout, VECTOR_SIZE};
use crate::scratch::Tracked;
use crate::sphere::SphereScratch;

const NUM_3D_SCALAR_BUFFERS: usize = 7;
const NUM_3D_VECTOR_BUFFERS: usize = 5;
const NUM_COLUMN_BUFFERS: usize = 2;

/// Intermediate fields of one cell's RHS evaluation.
///
/// Every buffer is overwritten for each cell; nothing survives from one cell
/// to the next.
#[derive(Clone, Debug)]
pub struct CaarBuffers {
    pub pressure: Tracked<ScalarField>,
    pub temperature_virt: Tracked<ScalarField>,
    pub omega_p: Tracked<ScalarField>,
    pub div_vdp: Tracked<ScalarField>,
    /// Geopotential, then geopotential plus kinetic energy.
    pub ephi: Tracked<ScalarField>,
    pub vorticity: Tracked<ScalarField>,
    pub t_vadv: Tracked<ScalarField>,
    /// Vertical mass flux on the `L + 1` interfaces.
    pub eta_dot_dpdn: Tracked<ScalarField>,

    pub pressure_grad: Tracked<VectorField>,
    pub temperature_grad: Tracked<VectorField>,
    pub vdp: Tracked<VectorField>,
    pub energy_grad: Tracked<VectorField>,
    pub v_vadv: Tracked<VectorField>,

    pub sdot_sum: Tracked<Scalar2d>,
}

impl CaarBuffers {
    pub fn new(np: usize, layout: LevelLayout) -> Self {
        let interfaces = LevelLayout::new(layout.num_physical() + 1);
        let scalar = |name| Tracked::new(name, ScalarField::zeros(np, layout));
        let vector = |name| Tracked::new(name, VectorField::zeros(np, layout));
        Self {
            pressure: scalar("pressure"),
            temperature_virt: scalar("temperature_virt"),
            omega_p: scalar("omega_p"),
            div_vdp: scalar("div_vdp"),
            ephi: scalar("ephi"),
            vorticity: scalar("vorticity"),
            t_vadv: scalar("t_vadv"),
            eta_dot_dpdn: Tracked::new("eta_dot_dpdn", ScalarField::zeros(np, interfaces)),
            pressure_grad: vector("pressure_grad"),
            temperature_grad: vector("temperature_grad"),
            vdp: vector("vdp"),
            energy_grad: vector("energy_grad"),
            v_vadv: vector("v_vadv"),
            sdot_sum: Tracked::new("sdot_sum", Scalar2d::zeros(np)),
        }
    }

    /// Declared number of values.
    pub fn size(np: usize, layout: LevelLayout) -> usize {
        let nodes = np * np;
        let padded = layout.padded_len();
        NUM_3D_SCALAR_BUFFERS * nodes * padded
            + nodes * layout.num_interface_packs() * VECTOR_SIZE
            + NUM_3D_VECTOR_BUFFERS * 2 * nodes * padded
            + nodes
    }

    /// Number of values actually allocated.
    pub fn num_values(&self) -> usize {
        let scalars = [
            &self.pressure,
            &self.temperature_virt,
            &self.omega_p,
            &self.div_vdp,
            &self.ephi,
            &self.vorticity,
            &self.t_vadv,
            &self.eta_dot_dpdn,
        ];
        let vectors = [
            &self.pressure_grad,
            &self.temperature_grad,
            &self.vdp,
            &self.energy_grad,
            &self.v_vadv,
        ];
        scalars.iter().map(|b| b.storage().num_values()).sum::<usize>()
            + vectors.iter().map(|b| b.storage().num_values()).sum::<usize>()
            + self.sdot_sum.storage().as_slice().len()
    }

    pub fn retire_all(&mut self) {
        for b in [
            &mut self.pressure,
            &mut self.temperature_virt,
            &mut self.omega_p,
            &mut self.div_vdp,
            &mut self.ephi,
            &mut self.vorticity,
            &mut self.t_vadv,
            &mut self.eta_dot_dpdn,
        ] {
            b.retire();
        }
        for b in [
            &mut self.pressure_grad,
            &mut self.temperature_grad,
            &mut self.vdp,
            &mut self.energy_grad,
            &mut self.v_vadv,
        ] {
            b.retire();
        }
        self.sdot_sum.retire();
    }
}

/// Single-column work vectors for the vertical integrations.
#[derive(Clone, Debug)]
pub struct ColumnScratch {
    pub a: Vec<f64>,
    pub b: Vec<f64>,
}

impl ColumnScratch {
    pub fn new(num_levels: usize) -> Self {
        Self {
            a: vec![0.0; num_levels],
            b: vec![0.0; num_levels],
        }
    }

    pub fn num_values(&self) -> usize {
        self.a.len() + self.b.len()
    }
}

/// Everything one task needs: kernel buffers plus operator scratch.
#[derive(Clone, Debug)]
pub struct CaarSlot {
    pub caar: CaarBuffers,
    pub sphere: SphereScratch,
    pub column: ColumnScratch,
}

impl CaarSlot {
    pub fn new(np: usize, layout: LevelLayout) -> Self {
        Self {
            caar: CaarBuffers::new(np, layout),
            sphere: SphereScratch::new(np, layout),
            column: ColumnScratch::new(layout.num_physical()),
        }
    }

    /// Declared size of one slot, in values.
    pub fn size(np: usize, layout: LevelLayout) -> usize {
        CaarBuffers::size(np, layout)
            + SphereScratch::size(np, layout)
            + NUM_COLUMN_BUFFERS * layout.num_physical()
    }

    /// Values allocated in this slot.
    pub fn num_values(&self) -> usize {
        self.caar.num_values() + self.sphere.num_values() + self.column.num_values()
    }
}
