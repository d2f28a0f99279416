//! Setup and dispatch of the RHS kernel over all cells.

use std::sync::Arc;

use super::buffers::CaarSlot;
use super::kernel::{CaarKernel, KernelVariables, StageData};
use crate::config::DycoreConfig;
use crate::constants::{NUM_TIME_LEVELS, Q_NUM_TIME_LEVELS};
use crate::element::{Element, Elements, ReferenceElement};
use crate::error::{DycoreError, Result};
use crate::exchange::{BoundaryExchange, ExchangeField};
use crate::pack::LevelLayout;
use crate::scratch::{ScratchArena, SlotPolicy};
use crate::sphere::SphereOperators;
use crate::vertical::HybridVCoord;

/// Number of 3-d slots each time level registers for exchange.
const NUM_EXCHANGED_SLOTS: usize = 4;

/// Right-hand-side kernel of the primitive equations.
///
/// Lifecycle: construct, [`allocate_buffers`](Self::allocate_buffers) once,
/// then per sub-stage [`set_rk_stage_data`](Self::set_rk_stage_data) followed
/// by [`run`](Self::run).
///
/// # Example
///
/// ```
/// use se_dycore::{CaarFunctor, DycoreConfig, Element, ElementGeometry, Elements, ReferenceElement};
///
/// let config = DycoreConfig::new(4, 6);
/// let reference = ReferenceElement::shared(4);
/// let mut elements = Elements::new(
///     (0..3)
///         .map(|_| Element::new(ElementGeometry::flat(&reference), 6, 0))
///         .collect(),
/// );
/// for elem in elements.as_mut_slice() {
///     for tl in 0..3 {
///         elem.state.dp3d.get_mut(tl).fill(1000.0);
///         elem.state.t.get_mut(tl).fill(300.0);
///     }
/// }
///
/// let mut caar = CaarFunctor::new(&config, reference).unwrap();
/// caar.allocate_buffers(2, elements.len()).unwrap();
/// caar.set_rk_stage_data(0, 1, 2, 10.0, 1.0, false).unwrap();
/// caar.run(&mut elements).unwrap();
/// ```
#[derive(Debug)]
pub struct CaarFunctor {
    kernel: CaarKernel,
    np: usize,
    num_tracers: usize,
    slot_policy: SlotPolicy,
    stage: Option<StageData>,
    n0_qdp: Option<usize>,
    arena: Option<ScratchArena<CaarSlot>>,
}

impl CaarFunctor {
    /// Kernel for `config` on the shared reference element.
    pub fn new(config: &DycoreConfig, reference: Arc<ReferenceElement>) -> Result<Self> {
        config.validate()?;
        if reference.np() != config.np {
            return Err(DycoreError::dimension_mismatch(
                "reference element np",
                config.np,
                reference.np(),
            ));
        }
        let layout = LevelLayout::new(config.num_levels);
        let hvcoord = config.hybrid_vcoord()?;
        log::debug!(
            "caar setup: np = {}, levels = {} in {} packs, rsplit = {}, scan = {:?}",
            config.np,
            config.num_levels,
            layout.num_packs(),
            config.rsplit,
            config.scan
        );
        Ok(Self {
            kernel: CaarKernel {
                sphere: SphereOperators::new(reference, layout, config.constants.rrearth()),
                hvcoord,
                constants: config.constants,
                scan: config.scan,
                rsplit: config.rsplit,
            },
            np: config.np,
            num_tracers: config.num_tracers,
            slot_policy: config.slot_policy,
            stage: None,
            n0_qdp: None,
            arena: None,
        })
    }

    /// Vertical layout of the state.
    pub fn layout(&self) -> LevelLayout {
        self.kernel.sphere.layout()
    }

    pub fn hybrid_vcoord(&self) -> &HybridVCoord {
        &self.kernel.hvcoord
    }

    pub fn sphere_operators(&self) -> &SphereOperators {
        &self.kernel.sphere
    }

    /// Size the scratch arena for `num_tasks` cells run `concurrency` at a time.
    pub fn allocate_buffers(&mut self, concurrency: usize, num_tasks: usize) -> Result<()> {
        if let Some(arena) = &self.arena {
            return Err(DycoreError::AlreadyAllocated { slots: arena.len() });
        }
        let (np, layout) = (self.np, self.layout());
        let declared = CaarSlot::size(np, layout);
        let arena = ScratchArena::allocate(self.slot_policy, concurrency, num_tasks, || {
            CaarSlot::new(np, layout)
        })?;
        let laid_out = arena.slot(0).num_values();
        if laid_out != declared {
            return Err(DycoreError::ArenaLayout { declared, laid_out });
        }
        log::debug!(
            "caar buffers: {} slots of {} values ({:?} policy, {} tasks per slot)",
            arena.len(),
            declared,
            arena.policy(),
            arena.tasks_per_slot()
        );
        self.arena = Some(arena);
        Ok(())
    }

    /// Drop the scratch arena so it can be allocated again.
    pub fn reset_buffers(&mut self) {
        self.arena = None;
    }

    /// Scratch arena, if allocated.
    pub fn arena(&self) -> Option<&ScratchArena<CaarSlot>> {
        self.arena.as_ref()
    }

    /// Configure the next sub-stage.
    pub fn set_rk_stage_data(
        &mut self,
        nm1: usize,
        n0: usize,
        np1: usize,
        dt: f64,
        eta_ave_w: f64,
        compute_diagnostics: bool,
    ) -> Result<()> {
        let data = StageData::new(nm1, n0, np1, dt, eta_ave_w, compute_diagnostics)?;
        self.stage = Some(data);
        Ok(())
    }

    /// Tracer time level coupled into the virtual temperature; `None` runs dry.
    pub fn set_n0_qdp(&mut self, n0_qdp: Option<usize>) -> Result<()> {
        if let Some(qtl) = n0_qdp {
            if qtl >= Q_NUM_TIME_LEVELS {
                return Err(DycoreError::InvalidTimeLevel(format!(
                    "n0_qdp = {qtl} is outside 0..{Q_NUM_TIME_LEVELS}"
                )));
            }
        }
        self.n0_qdp = n0_qdp;
        Ok(())
    }

    /// Integer form of [`set_n0_qdp`](Self::set_n0_qdp): negative means dry.
    pub fn set_n0_qdp_raw(&mut self, n0_qdp: i32) -> Result<()> {
        self.set_n0_qdp(usize::try_from(n0_qdp).ok())
    }

    /// Stage parameters the next run will use.
    pub fn stage_data(&self) -> Option<StageData> {
        self.stage.map(|s| StageData {
            n0_qdp: self.n0_qdp,
            ..s
        })
    }

    fn prepare(&self, num_cells: usize) -> Result<StageData> {
        let data = self.stage_data().ok_or_else(|| {
            DycoreError::InvalidTimeLevel("stage data not set before run".to_string())
        })?;
        let arena = self.arena.as_ref().ok_or(DycoreError::NotAllocated)?;
        if arena.num_tasks() != num_cells {
            return Err(DycoreError::dimension_mismatch(
                "cells",
                arena.num_tasks(),
                num_cells,
            ));
        }
        Ok(data)
    }

    fn check_element(&self, data: &StageData, elem: &Element) -> Result<()> {
        if elem.layout() != self.layout() {
            return Err(DycoreError::dimension_mismatch(
                "element levels",
                self.layout().num_physical(),
                elem.layout().num_physical(),
            ));
        }
        if elem.geometry.np() != self.np {
            return Err(DycoreError::dimension_mismatch("element np", self.np, elem.geometry.np()));
        }
        if elem.tracers.num_tracers() != self.num_tracers {
            return Err(DycoreError::dimension_mismatch(
                "element tracers",
                self.num_tracers,
                elem.tracers.num_tracers(),
            ));
        }
        if data.n0_qdp.is_some() && self.num_tracers == 0 {
            return Err(DycoreError::invalid_config(
                "tracer coupling requested but elements carry no tracers",
            ));
        }
        Ok(())
    }

    /// Evaluate the RHS on every cell and write time level `np1`.
    pub fn run(&mut self, elements: &mut Elements) -> Result<()> {
        let data = self.prepare(elements.len())?;
        for elem in elements.iter() {
            self.check_element(&data, elem)?;
        }
        let kernel = &self.kernel;
        let arena = self.arena.as_mut().ok_or(DycoreError::NotAllocated)?;
        let chunk = arena.tasks_per_slot();
        log::debug!(
            "caar run: {} cells, nm1 = {}, n0 = {}, np1 = {}, dt = {}",
            elements.len(),
            data.nm1,
            data.n0,
            data.np1,
            data.dt
        );

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            elements
                .as_mut_slice()
                .par_chunks_mut(chunk)
                .zip(arena.slots_mut().par_iter_mut())
                .enumerate()
                .for_each(|(team_idx, (cells, slot))| {
                    for (offset, elem) in cells.iter_mut().enumerate() {
                        let mut kv = KernelVariables::new(team_idx * chunk + offset, team_idx);
                        kernel.run_cell(&mut kv, &data, elem, slot);
                    }
                });
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (team_idx, (cells, slot)) in elements
                .as_mut_slice()
                .chunks_mut(chunk)
                .zip(arena.slots_mut().iter_mut())
                .enumerate()
            {
                for (offset, elem) in cells.iter_mut().enumerate() {
                    let mut kv = KernelVariables::new(team_idx * chunk + offset, team_idx);
                    kernel.run_cell(&mut kv, &data, elem, slot);
                }
            }
        }

        Ok(())
    }

    /// Evaluate the RHS on one cell `ie` using the slot assigned to it.
    pub fn run_element(&mut self, ie: usize, elem: &mut Element) -> Result<KernelVariables> {
        let data = self.stage_data().ok_or_else(|| {
            DycoreError::InvalidTimeLevel("stage data not set before run".to_string())
        })?;
        self.check_element(&data, elem)?;
        let arena = self.arena.as_mut().ok_or(DycoreError::NotAllocated)?;
        if ie >= arena.num_tasks() {
            return Err(DycoreError::dimension_mismatch("cell index", arena.num_tasks(), ie));
        }
        let team_idx = arena.slot_for(ie);
        let mut kv = KernelVariables::new(ie, team_idx);
        self.kernel
            .run_cell(&mut kv, &data, elem, arena.slot_mut(team_idx));
        Ok(kv)
    }

    /// Register the prognostic fields of every time level with exchanges
    /// produced by `factory`.
    pub fn init_boundary_exchanges<B, F>(&self, mut factory: F) -> Result<Vec<B>>
    where
        B: BoundaryExchange,
        F: FnMut(usize) -> B,
    {
        (0..NUM_TIME_LEVELS)
            .map(|tl| {
                let mut be = factory(tl);
                be.set_num_fields(NUM_EXCHANGED_SLOTS);
                for (name, components) in [("v", 2), ("t", 1), ("dp3d", 1)] {
                    be.register_field(ExchangeField {
                        name,
                        time_level: tl,
                        components,
                    })?;
                }
                be.registration_completed()?;
                Ok(be)
            })
            .collect()
    }
}
