//! The three-stage RHS pipeline for one cell.

use super::buffers::CaarSlot;
use crate::constants::{NUM_TIME_LEVELS, PhysicalConstants, Q_NUM_TIME_LEVELS};
use crate::element::Element;
use crate::error::{DycoreError, Result};
use crate::pack::Pack;
use crate::sphere::SphereOperators;
use crate::vertical::{HybridVCoord, ScanStrategy, column};

/// Time levels and weights of one sub-stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageData {
    /// Leapfrog base level.
    pub nm1: usize,
    /// Level the tendencies are evaluated at.
    pub n0: usize,
    /// Level being written.
    pub np1: usize,
    pub dt: f64,
    /// Weight of this sub-stage in the time-averaged diagnostics.
    pub eta_ave_w: f64,
    /// Tracer time level coupling moisture into the virtual temperature.
    pub n0_qdp: Option<usize>,
    pub compute_diagnostics: bool,
}

impl StageData {
    /// Validated stage parameters without tracer coupling.
    pub fn new(
        nm1: usize,
        n0: usize,
        np1: usize,
        dt: f64,
        eta_ave_w: f64,
        compute_diagnostics: bool,
    ) -> Result<Self> {
        for (name, tl) in [("nm1", nm1), ("n0", n0), ("np1", np1)] {
            if tl >= NUM_TIME_LEVELS {
                return Err(DycoreError::InvalidTimeLevel(format!(
                    "{name} = {tl} is outside 0..{NUM_TIME_LEVELS}"
                )));
            }
        }
        if np1 == n0 || np1 == nm1 {
            return Err(DycoreError::InvalidTimeLevel(format!(
                "np1 = {np1} must differ from n0 = {n0} and nm1 = {nm1}"
            )));
        }
        Ok(Self {
            nm1,
            n0,
            np1,
            dt,
            eta_ave_w,
            n0_qdp: None,
            compute_diagnostics,
        })
    }

    /// Couple tracer 0 at tracer level `n0_qdp` into the virtual temperature.
    pub fn with_n0_qdp(mut self, n0_qdp: Option<usize>) -> Result<Self> {
        if let Some(qtl) = n0_qdp {
            if qtl >= Q_NUM_TIME_LEVELS {
                return Err(DycoreError::InvalidTimeLevel(format!(
                    "n0_qdp = {qtl} is outside 0..{Q_NUM_TIME_LEVELS}"
                )));
            }
        }
        self.n0_qdp = n0_qdp;
        Ok(self)
    }
}

/// Identity of the running task and its phase counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KernelVariables {
    /// Cell being processed.
    pub ie: usize,
    /// Scratch slot owned by the task.
    pub team_idx: usize,
    barriers: u32,
}

impl KernelVariables {
    pub fn new(ie: usize, team_idx: usize) -> Self {
        Self {
            ie,
            team_idx,
            barriers: 0,
        }
    }

    /// Phase boundary. Work inside a cell runs on one thread, so this only
    /// counts phases.
    #[inline]
    pub fn team_barrier(&mut self) {
        self.barriers += 1;
    }

    /// Phase boundaries crossed so far.
    #[inline]
    pub fn barriers(&self) -> u32 {
        self.barriers
    }
}

/// Immutable parameters shared by every task of a run.
#[derive(Clone, Debug)]
pub(crate) struct CaarKernel {
    pub(crate) sphere: SphereOperators,
    pub(crate) hvcoord: HybridVCoord,
    pub(crate) constants: PhysicalConstants,
    pub(crate) scan: ScanStrategy,
    pub(crate) rsplit: usize,
}

impl CaarKernel {
    #[inline]
    fn is_eulerian(&self) -> bool {
        self.rsplit == 0
    }

    /// Run all three stages on one cell.
    pub(crate) fn run_cell(
        &self,
        kv: &mut KernelVariables,
        data: &StageData,
        elem: &mut Element,
        slot: &mut CaarSlot,
    ) {
        self.compute_temperature_div_vdp(kv, data, elem, slot);
        kv.team_barrier();
        log::trace!("element {}: thermodynamic stage done", kv.ie);

        self.compute_scan_properties(kv, data, elem, slot);
        kv.team_barrier();
        log::trace!("element {}: vertical stage done", kv.ie);

        self.compute_phase_3(kv, data, elem, slot);
        log::trace!(
            "element {}: time update done after {} phases",
            kv.ie,
            kv.barriers()
        );

        if data.compute_diagnostics {
            self.log_extrema(kv, data, elem);
        }
        slot.caar.retire_all();
    }

    // ---------------------------------------------------------------------
    // Stage 1
    // ---------------------------------------------------------------------

    fn compute_temperature_div_vdp(
        &self,
        kv: &mut KernelVariables,
        data: &StageData,
        elem: &mut Element,
        slot: &mut CaarSlot,
    ) {
        let np = self.sphere.np();
        let layout = self.sphere.layout();
        let nlev = layout.num_packs();
        let caar = &mut slot.caar;

        let t = elem.state.t.get(data.n0);
        let dp = elem.state.dp3d.get(data.n0);
        let v = elem.state.v.get(data.n0);

        let tv = caar.temperature_virt.write();
        match data.n0_qdp {
            None => tv.copy_from(t),
            Some(qtl) => {
                let qdp = elem.tracers.qdp(qtl, 0);
                let factor = self.constants.virtual_factor();
                for igp in 0..np {
                    for jgp in 0..np {
                        for ilev in 0..nlev {
                            let mut qt = qdp.pack(igp, jgp, ilev) / dp.pack(igp, jgp, ilev);
                            qt *= factor;
                            qt += 1.0;
                            *tv.pack_mut(igp, jgp, ilev) = t.pack(igp, jgp, ilev) * qt;
                        }
                    }
                }
            }
        }
        kv.team_barrier();

        let vdp = caar.vdp.write();
        let vn0 = &mut elem.derived.vn0;
        for igp in 0..np {
            for jgp in 0..np {
                for ilev in 0..nlev {
                    let lanes = layout.lanes_in_pack(ilev);
                    let dpk = dp.pack(igp, jgp, ilev);
                    for c in 0..2 {
                        let flux = v.comps[c].pack(igp, jgp, ilev) * dpk;
                        *vdp.comps[c].pack_mut(igp, jgp, ilev) = flux;
                        let acc = vn0.comps[c].pack_mut(igp, jgp, ilev);
                        *acc = (*acc + data.eta_ave_w * flux).blend(*acc, lanes);
                    }
                }
            }
        }
        kv.team_barrier();

        self.sphere.divergence_sphere(
            &elem.geometry,
            &mut slot.sphere,
            caar.vdp.read(),
            caar.div_vdp.write(),
            nlev,
        );
        caar.vdp.retire();
    }

    // ---------------------------------------------------------------------
    // Stage 2
    // ---------------------------------------------------------------------

    fn compute_scan_properties(
        &self,
        kv: &mut KernelVariables,
        data: &StageData,
        elem: &mut Element,
        slot: &mut CaarSlot,
    ) {
        let np = self.sphere.np();
        let layout = self.sphere.layout();
        let nphys = layout.num_physical();
        let caar = &mut slot.caar;
        let col = &mut slot.column;
        let dp = elem.state.dp3d.get(data.n0);

        let p_top = self.hvcoord.ptop();
        let p = caar.pressure.write();
        for igp in 0..np {
            for jgp in 0..np {
                column::pressure(
                    &self.scan,
                    p_top,
                    dp.physical_column(igp, jgp),
                    p.physical_column_mut(igp, jgp),
                );
            }
        }
        kv.team_barrier();

        let p = caar.pressure.read();
        let tv = caar.temperature_virt.read();
        let phi = caar.ephi.write();
        for igp in 0..np {
            for jgp in 0..np {
                column::hydrostatic_geopotential(
                    &self.scan,
                    self.constants.rgas,
                    elem.phis[(igp, jgp)],
                    tv.physical_column(igp, jgp),
                    dp.physical_column(igp, jgp),
                    p.physical_column(igp, jgp),
                    &mut col.a[..nphys],
                    phi.physical_column_mut(igp, jgp),
                );
            }
        }
        kv.team_barrier();

        self.sphere.gradient_sphere(
            &elem.geometry,
            caar.pressure.read(),
            caar.pressure_grad.write(),
            layout.num_packs(),
        );
        kv.team_barrier();

        let v = elem.state.v.get(data.n0);
        let grad_p = caar.pressure_grad.read();
        let div = caar.div_vdp.read();
        let p = caar.pressure.read();
        let omega = caar.omega_p.write();
        for igp in 0..np {
            for jgp in 0..np {
                let vgrad_p = &mut col.a[..nphys];
                let (u0, u1) = (
                    v.comps[0].physical_column(igp, jgp),
                    v.comps[1].physical_column(igp, jgp),
                );
                let (g0, g1) = (
                    grad_p.comps[0].physical_column(igp, jgp),
                    grad_p.comps[1].physical_column(igp, jgp),
                );
                for k in 0..nphys {
                    vgrad_p[k] = u0[k] * g0[k] + u1[k] * g1[k];
                }
                column::omega(
                    &self.scan,
                    div.physical_column(igp, jgp),
                    &col.a[..nphys],
                    p.physical_column(igp, jgp),
                    &mut col.b[..nphys],
                    omega.physical_column_mut(igp, jgp),
                );
            }
        }
    }

    // ---------------------------------------------------------------------
    // Stage 3
    // ---------------------------------------------------------------------

    fn compute_phase_3(
        &self,
        kv: &mut KernelVariables,
        data: &StageData,
        elem: &mut Element,
        slot: &mut CaarSlot,
    ) {
        if self.is_eulerian() {
            self.compute_eta_dot_dpdn_vertadv(kv, data, elem, slot);
        }
        self.accumulate_omega_p(kv, data, elem, slot);
        self.compute_temperature_np1(kv, data, elem, slot);
        self.compute_velocity_np1(kv, data, elem, slot);
        self.compute_dp3d_np1(kv, data, elem, slot);
    }

    fn compute_eta_dot_dpdn_vertadv(
        &self,
        kv: &mut KernelVariables,
        data: &StageData,
        elem: &mut Element,
        slot: &mut CaarSlot,
    ) {
        let np = self.sphere.np();
        let caar = &mut slot.caar;

        caar.sdot_sum.write().fill(0.0);
        kv.team_barrier();

        let div = caar.div_vdp.read();
        let eta = caar.eta_dot_dpdn.write();
        let sdot_sum = caar.sdot_sum.modify();
        for igp in 0..np {
            for jgp in 0..np {
                sdot_sum[(igp, jgp)] += column::vertical_mass_flux(
                    &self.scan,
                    self.hvcoord.hybrid_bi(),
                    div.physical_column(igp, jgp),
                    eta.physical_column_mut(igp, jgp),
                );
            }
        }
        kv.team_barrier();

        let eta = caar.eta_dot_dpdn.read();
        let dp = elem.state.dp3d.get(data.n0);
        let t = elem.state.t.get(data.n0);
        let v = elem.state.v.get(data.n0);
        let t_vadv = caar.t_vadv.write();
        let v_vadv = caar.v_vadv.write();
        for igp in 0..np {
            for jgp in 0..np {
                let eta_col = eta.physical_column(igp, jgp);
                let dp_col = dp.physical_column(igp, jgp);
                column::vertical_advection(
                    eta_col,
                    dp_col,
                    t.physical_column(igp, jgp),
                    t_vadv.physical_column_mut(igp, jgp),
                );
                for c in 0..2 {
                    column::vertical_advection(
                        eta_col,
                        dp_col,
                        v.comps[c].physical_column(igp, jgp),
                        v_vadv.comps[c].physical_column_mut(igp, jgp),
                    );
                }
            }
        }
        kv.team_barrier();

        let mean = &mut elem.derived.eta_dot_dpdn;
        for igp in 0..np {
            for jgp in 0..np {
                let src = eta.physical_column(igp, jgp);
                for (acc, e) in mean.physical_column_mut(igp, jgp).iter_mut().zip(src) {
                    *acc += data.eta_ave_w * e;
                }
            }
        }
        kv.team_barrier();
    }

    fn accumulate_omega_p(
        &self,
        kv: &mut KernelVariables,
        data: &StageData,
        elem: &mut Element,
        slot: &mut CaarSlot,
    ) {
        let np = self.sphere.np();
        let layout = self.sphere.layout();
        let omega = slot.caar.omega_p.read();
        let mean = &mut elem.derived.omega_p;
        for igp in 0..np {
            for jgp in 0..np {
                for ilev in 0..layout.num_packs() {
                    let lanes = layout.lanes_in_pack(ilev);
                    let acc = mean.pack_mut(igp, jgp, ilev);
                    *acc = (*acc + data.eta_ave_w * omega.pack(igp, jgp, ilev)).blend(*acc, lanes);
                }
            }
        }
        kv.team_barrier();
    }

    fn compute_temperature_np1(
        &self,
        kv: &mut KernelVariables,
        data: &StageData,
        elem: &mut Element,
        slot: &mut CaarSlot,
    ) {
        let np = self.sphere.np();
        let layout = self.sphere.layout();
        let nlev = layout.num_packs();
        let caar = &mut slot.caar;

        self.sphere.gradient_sphere(
            &elem.geometry,
            elem.state.t.get(data.n0),
            caar.temperature_grad.write(),
            nlev,
        );
        kv.team_barrier();

        let kappa = self.constants.kappa();
        let v = elem.state.v.get(data.n0);
        let grad_t = caar.temperature_grad.read();
        let tv = caar.temperature_virt.read();
        let omega = caar.omega_p.read();
        let t_vadv = self.is_eulerian().then(|| caar.t_vadv.read());
        let mut t = elem.state.t.split_update(data.np1);
        let t_nm1 = t.get(data.nm1);
        for igp in 0..np {
            for jgp in 0..np {
                let sp = elem.geometry.spheremp[(igp, jgp)];
                for ilev in 0..nlev {
                    let vgrad_t = v.comps[0].pack(igp, jgp, ilev)
                        * grad_t.comps[0].pack(igp, jgp, ilev)
                        + v.comps[1].pack(igp, jgp, ilev) * grad_t.comps[1].pack(igp, jgp, ilev);
                    let vadv = t_vadv.map_or(Pack::ZERO, |b| -b.pack(igp, jgp, ilev));
                    let ttens = vadv - vgrad_t
                        + kappa * tv.pack(igp, jgp, ilev) * omega.pack(igp, jgp, ilev);
                    let mut t_np1 = ttens * data.dt + t_nm1.pack(igp, jgp, ilev);
                    t_np1 *= sp;
                    let out = t.target.pack_mut(igp, jgp, ilev);
                    *out = t_np1.blend(*out, layout.lanes_in_pack(ilev));
                }
            }
        }
        kv.team_barrier();
    }

    /// Energy gradient `Rgas·Tv/p·∇p + ∇(phi + |v|²/2)` into `energy_grad`.
    fn compute_energy_grad(
        &self,
        kv: &mut KernelVariables,
        data: &StageData,
        elem: &Element,
        slot: &mut CaarSlot,
    ) {
        let np = self.sphere.np();
        let nlev = self.sphere.layout().num_packs();
        let caar = &mut slot.caar;
        let v = elem.state.v.get(data.n0);

        let tv = caar.temperature_virt.read();
        let p = caar.pressure.read();
        let grad_p = caar.pressure_grad.read();
        let energy_grad = caar.energy_grad.write();
        let ephi = caar.ephi.modify();
        for igp in 0..np {
            for jgp in 0..np {
                for ilev in 0..nlev {
                    let coeff =
                        self.constants.rgas * (tv.pack(igp, jgp, ilev) / p.pack(igp, jgp, ilev));
                    for c in 0..2 {
                        *energy_grad.comps[c].pack_mut(igp, jgp, ilev) =
                            coeff * grad_p.comps[c].pack(igp, jgp, ilev);
                    }
                    let u0 = v.comps[0].pack(igp, jgp, ilev);
                    let u1 = v.comps[1].pack(igp, jgp, ilev);
                    *ephi.pack_mut(igp, jgp, ilev) += 0.5 * (u0 * u0 + u1 * u1);
                }
            }
        }
        kv.team_barrier();

        self.sphere.gradient_sphere_update(
            &elem.geometry,
            caar.ephi.read(),
            caar.energy_grad.modify(),
            nlev,
        );
    }

    fn compute_velocity_np1(
        &self,
        kv: &mut KernelVariables,
        data: &StageData,
        elem: &mut Element,
        slot: &mut CaarSlot,
    ) {
        self.compute_energy_grad(kv, data, elem, slot);

        let np = self.sphere.np();
        let layout = self.sphere.layout();
        let nlev = layout.num_packs();
        let caar = &mut slot.caar;

        self.sphere.vorticity_sphere(
            &elem.geometry,
            &mut slot.sphere,
            elem.state.v.get(data.n0),
            caar.vorticity.write(),
            nlev,
        );
        kv.team_barrier();

        let vort = caar.vorticity.read();
        let energy_grad = caar.energy_grad.read();
        let v_vadv = self.is_eulerian().then(|| caar.v_vadv.read());
        let mut v = elem.state.v.split_update(data.np1);
        let v_n0 = v.get(data.n0);
        let v_nm1 = v.get(data.nm1);
        for igp in 0..np {
            for jgp in 0..np {
                let sp = elem.geometry.spheremp[(igp, jgp)];
                let fcor = elem.geometry.fcor[(igp, jgp)];
                for ilev in 0..nlev {
                    let lanes = layout.lanes_in_pack(ilev);
                    let zeta = vort.pack(igp, jgp, ilev) + fcor;
                    let u0 = v_n0.comps[0].pack(igp, jgp, ilev);
                    let u1 = v_n0.comps[1].pack(igp, jgp, ilev);
                    let (vadv0, vadv1) = v_vadv.map_or((Pack::ZERO, Pack::ZERO), |b| {
                        (
                            -b.comps[0].pack(igp, jgp, ilev),
                            -b.comps[1].pack(igp, jgp, ilev),
                        )
                    });
                    let tend = [
                        -energy_grad.comps[0].pack(igp, jgp, ilev) + (vadv0 + u1 * zeta),
                        -energy_grad.comps[1].pack(igp, jgp, ilev) + (vadv1 - u0 * zeta),
                    ];
                    for c in 0..2 {
                        let base = tend[c] * data.dt + v_nm1.comps[c].pack(igp, jgp, ilev);
                        let out = v.target.comps[c].pack_mut(igp, jgp, ilev);
                        *out = (sp * base).blend(*out, lanes);
                    }
                }
            }
        }
        kv.team_barrier();
    }

    fn compute_dp3d_np1(
        &self,
        kv: &mut KernelVariables,
        data: &StageData,
        elem: &mut Element,
        slot: &mut CaarSlot,
    ) {
        let np = self.sphere.np();
        let caar = &slot.caar;
        let div = caar.div_vdp.read();
        let eta = self.is_eulerian().then(|| caar.eta_dot_dpdn.read());
        let mut dp = elem.state.dp3d.split_update(data.np1);
        let dp_nm1 = dp.get(data.nm1);
        for igp in 0..np {
            for jgp in 0..np {
                let sp = elem.geometry.spheremp[(igp, jgp)];
                let old = dp_nm1.physical_column(igp, jgp);
                let div_col = div.physical_column(igp, jgp);
                let out = dp.target.physical_column_mut(igp, jgp);
                match eta {
                    Some(eta) => {
                        let e = eta.physical_column(igp, jgp);
                        for k in 0..out.len() {
                            let flux = e[k + 1] + div_col[k] - e[k];
                            out[k] = sp * (old[k] - flux * data.dt);
                        }
                    }
                    None => {
                        for k in 0..out.len() {
                            out[k] = sp * (old[k] - div_col[k] * data.dt);
                        }
                    }
                }
            }
        }
        kv.team_barrier();
    }

    fn log_extrema(&self, kv: &KernelVariables, data: &StageData, elem: &Element) {
        let layout = self.sphere.layout();
        let max_abs = |field: &crate::field::ScalarField| {
            field
                .packs()
                .chunks(layout.num_packs())
                .flat_map(|col| {
                    col.iter()
                        .enumerate()
                        .map(|(ilev, p)| p.max_abs(layout.lanes_in_pack(ilev)))
                })
                .fold(0.0_f64, f64::max)
        };
        let v = elem.state.v.get(data.np1);
        log::debug!(
            "element {}: max|T| = {:.6e}, max|u| = {:.6e}, max|v| = {:.6e}, max|dp3d| = {:.6e}",
            kv.ie,
            max_abs(elem.state.t.get(data.np1)),
            max_abs(&v.comps[0]),
            max_abs(&v.comps[1]),
            max_abs(elem.state.dp3d.get(data.np1)),
        );
    }
}
