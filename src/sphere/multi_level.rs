//! Multi-level (vertically packed) operators.

use super::{SphereOperators, SphereScratch};
use crate::element::ElementGeometry;
use crate::field::{ScalarField, VectorField};
use crate::pack::Pack;
use crate::scratch::Tracked;

impl SphereOperators {
    /// Gradient of a packed scalar over the first `nlev` packs.
    pub fn gradient_sphere(
        &self,
        geo: &ElementGeometry,
        scalar: &ScalarField,
        grad: &mut VectorField,
        nlev: usize,
    ) {
        self.gradient_impl(geo, scalar, grad, nlev, false);
    }

    /// Gradient of a packed scalar added into `grad`.
    pub fn gradient_sphere_update(
        &self,
        geo: &ElementGeometry,
        scalar: &ScalarField,
        grad: &mut VectorField,
        nlev: usize,
    ) {
        self.gradient_impl(geo, scalar, grad, nlev, true);
    }

    fn gradient_impl(
        &self,
        geo: &ElementGeometry,
        scalar: &ScalarField,
        grad: &mut VectorField,
        nlev: usize,
        accumulate: bool,
    ) {
        self.check_levels(nlev);
        let np = self.np();
        for igp in 0..np {
            for jgp in 0..np {
                let dinv = [
                    [geo.dinv[(0, 0, igp, jgp)], geo.dinv[(0, 1, igp, jgp)]],
                    [geo.dinv[(1, 0, igp, jgp)], geo.dinv[(1, 1, igp, jgp)]],
                ];
                for ilev in 0..nlev {
                    let mut v0 = Pack::ZERO;
                    let mut v1 = Pack::ZERO;
                    for k in 0..np {
                        v0 += self.deriv(jgp, k) * scalar.pack(igp, k, ilev);
                        v1 += self.deriv(igp, k) * scalar.pack(k, jgp, ilev);
                    }
                    v0 *= self.rrearth;
                    v1 *= self.rrearth;
                    for h in 0..2 {
                        let g = dinv[h][0] * v0 + dinv[h][1] * v1;
                        let out = grad.comps[h].pack_mut(igp, jgp, ilev);
                        if accumulate {
                            *out += g;
                        } else {
                            *out = g;
                        }
                    }
                }
            }
        }
    }

    /// Strong divergence of a packed vector.
    pub fn divergence_sphere(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        v: &VectorField,
        div: &mut ScalarField,
        nlev: usize,
    ) {
        self.divergence_with(geo, &mut scratch.vector_ml[0], v, div, nlev);
    }

    pub(super) fn divergence_with(
        &self,
        geo: &ElementGeometry,
        gv_buf: &mut Tracked<VectorField>,
        v: &VectorField,
        div: &mut ScalarField,
        nlev: usize,
    ) {
        self.check_levels(nlev);
        self.contravariant_flux(geo, gv_buf.write(), nlev, |igp, jgp, ilev| {
            (v.comps[0].pack(igp, jgp, ilev), v.comps[1].pack(igp, jgp, ilev))
        });

        let gv = gv_buf.read();
        let np = self.np();
        for igp in 0..np {
            for jgp in 0..np {
                let scale = (1.0 / geo.metdet[(igp, jgp)]) * self.rrearth;
                for ilev in 0..nlev {
                    let (dudx, dvdy) = self.flux_derivatives(gv, igp, jgp, ilev);
                    *div.pack_mut(igp, jgp, ilev) = (dudx + dvdy) * scale;
                }
            }
        }
        gv_buf.retire();
    }

    /// Flux-form update of a tracer mass:
    ///
    /// ```text
    /// qtens = qdp + alpha · div(vstar · qdp) [+ qtens]
    /// ```
    ///
    /// On input `qtens` holds the hyperviscosity tendency if
    /// `add_hyperviscosity` is set and is ignored otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn divergence_sphere_update(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        alpha: f64,
        add_hyperviscosity: bool,
        vstar: &VectorField,
        qdp: &ScalarField,
        qtens: &mut ScalarField,
        nlev: usize,
    ) {
        self.check_levels(nlev);
        let gv_buf = &mut scratch.vector_ml[0];
        self.contravariant_flux(geo, gv_buf.write(), nlev, |igp, jgp, ilev| {
            let q = qdp.pack(igp, jgp, ilev);
            (
                vstar.comps[0].pack(igp, jgp, ilev) * q,
                vstar.comps[1].pack(igp, jgp, ilev) * q,
            )
        });

        let gv = gv_buf.read();
        let np = self.np();
        for igp in 0..np {
            for jgp in 0..np {
                let scale = (1.0 / geo.metdet[(igp, jgp)]) * self.rrearth;
                for ilev in 0..nlev {
                    let (dudx, dvdy) = self.flux_derivatives(gv, igp, jgp, ilev);
                    let out = qtens.pack_mut(igp, jgp, ilev);
                    let hv = if add_hyperviscosity { *out } else { Pack::ZERO };
                    *out = qdp.pack(igp, jgp, ilev) + alpha * ((dudx + dvdy) * scale) + hv;
                }
            }
        }
        gv_buf.retire();
    }

    /// Vorticity of the vector `(u, v)` given as two packed scalars.
    pub fn vorticity_sphere_uv(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        u: &ScalarField,
        v: &ScalarField,
        vort: &mut ScalarField,
        nlev: usize,
    ) {
        self.vorticity_with(geo, &mut scratch.vector_ml[0], u, v, vort, nlev);
    }

    /// Vorticity of a packed vector.
    pub fn vorticity_sphere(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        v: &VectorField,
        vort: &mut ScalarField,
        nlev: usize,
    ) {
        self.vorticity_with(geo, &mut scratch.vector_ml[0], &v.comps[0], &v.comps[1], vort, nlev);
    }

    pub(super) fn vorticity_with(
        &self,
        geo: &ElementGeometry,
        vcov_buf: &mut Tracked<VectorField>,
        u: &ScalarField,
        v: &ScalarField,
        vort: &mut ScalarField,
        nlev: usize,
    ) {
        self.check_levels(nlev);
        let np = self.np();
        let vcov = vcov_buf.write();
        for igp in 0..np {
            for jgp in 0..np {
                let d = [
                    [geo.d[(0, 0, igp, jgp)], geo.d[(0, 1, igp, jgp)]],
                    [geo.d[(1, 0, igp, jgp)], geo.d[(1, 1, igp, jgp)]],
                ];
                for ilev in 0..nlev {
                    let u_ijk = u.pack(igp, jgp, ilev);
                    let v_ijk = v.pack(igp, jgp, ilev);
                    *vcov.comps[0].pack_mut(igp, jgp, ilev) = d[0][0] * u_ijk + d[0][1] * v_ijk;
                    *vcov.comps[1].pack_mut(igp, jgp, ilev) = d[1][0] * u_ijk + d[1][1] * v_ijk;
                }
            }
        }

        let vcov = vcov_buf.read();
        for igp in 0..np {
            for jgp in 0..np {
                let scale = (1.0 / geo.metdet[(igp, jgp)]) * self.rrearth;
                for ilev in 0..nlev {
                    let mut dudy = Pack::ZERO;
                    let mut dvdx = Pack::ZERO;
                    for k in 0..np {
                        dvdx += self.deriv(jgp, k) * vcov.comps[1].pack(igp, k, ilev);
                        dudy += self.deriv(igp, k) * vcov.comps[0].pack(k, jgp, ilev);
                    }
                    *vort.pack_mut(igp, jgp, ilev) = (dvdx - dudy) * scale;
                }
            }
        }
        vcov_buf.retire();
    }

    /// Weak divergence, destroying its input.
    ///
    /// `v` is overwritten with its contravariant components and must be
    /// treated as garbage afterwards. Use
    /// [`divergence_sphere_wk`](Self::divergence_sphere_wk) to keep the input.
    pub fn divergence_sphere_wk_in_place(
        &self,
        geo: &ElementGeometry,
        v: &mut VectorField,
        div: &mut ScalarField,
        nlev: usize,
    ) {
        self.check_levels(nlev);
        let np = self.np();
        for igp in 0..np {
            for jgp in 0..np {
                let dinv = [
                    [geo.dinv[(0, 0, igp, jgp)], geo.dinv[(0, 1, igp, jgp)]],
                    [geo.dinv[(1, 0, igp, jgp)], geo.dinv[(1, 1, igp, jgp)]],
                ];
                for ilev in 0..nlev {
                    let v0 = v.comps[0].pack(igp, jgp, ilev);
                    let v1 = v.comps[1].pack(igp, jgp, ilev);
                    *v.comps[0].pack_mut(igp, jgp, ilev) = dinv[0][0] * v0 + dinv[1][0] * v1;
                    *v.comps[1].pack_mut(igp, jgp, ilev) = dinv[0][1] * v0 + dinv[1][1] * v1;
                }
            }
        }

        for ngp in 0..np {
            for mgp in 0..np {
                for ilev in 0..nlev {
                    let mut dd = Pack::ZERO;
                    for j in 0..np {
                        dd -= (geo.spheremp[(ngp, j)]
                            * v.comps[0].pack(ngp, j, ilev)
                            * self.deriv(j, mgp)
                            + geo.spheremp[(j, mgp)]
                                * v.comps[1].pack(j, mgp, ilev)
                                * self.deriv(j, ngp))
                            * self.rrearth;
                    }
                    *div.pack_mut(ngp, mgp, ilev) = dd;
                }
            }
        }
    }

    /// Weak divergence; `v` is copied to scratch first and survives the call.
    pub fn divergence_sphere_wk(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        v: &VectorField,
        div: &mut ScalarField,
        nlev: usize,
    ) {
        let tmp = &mut scratch.vector_ml[0];
        tmp.write().copy_from(v);
        self.divergence_sphere_wk_in_place(geo, tmp.modify(), div, nlev);
        tmp.retire();
    }

    /// Phase one of the strong divergence: `gv = Dinvᵀ · flux · metdet`.
    fn contravariant_flux(
        &self,
        geo: &ElementGeometry,
        gv: &mut VectorField,
        nlev: usize,
        flux: impl Fn(usize, usize, usize) -> (Pack, Pack),
    ) {
        let np = self.np();
        for igp in 0..np {
            for jgp in 0..np {
                let dinv = [
                    [geo.dinv[(0, 0, igp, jgp)], geo.dinv[(0, 1, igp, jgp)]],
                    [geo.dinv[(1, 0, igp, jgp)], geo.dinv[(1, 1, igp, jgp)]],
                ];
                let md = geo.metdet[(igp, jgp)];
                for ilev in 0..nlev {
                    let (v0, v1) = flux(igp, jgp, ilev);
                    *gv.comps[0].pack_mut(igp, jgp, ilev) = (dinv[0][0] * v0 + dinv[1][0] * v1) * md;
                    *gv.comps[1].pack_mut(igp, jgp, ilev) = (dinv[0][1] * v0 + dinv[1][1] * v1) * md;
                }
            }
        }
    }

    /// Phase two of the strong divergence: derivative contractions of `gv`.
    #[inline(always)]
    fn flux_derivatives(&self, gv: &VectorField, igp: usize, jgp: usize, ilev: usize) -> (Pack, Pack) {
        let mut dudx = Pack::ZERO;
        let mut dvdy = Pack::ZERO;
        for k in 0..self.np() {
            dudx += self.deriv(jgp, k) * gv.comps[0].pack(igp, k, ilev);
            dvdy += self.deriv(igp, k) * gv.comps[1].pack(k, jgp, ilev);
        }
        (dudx, dvdy)
    }
}
