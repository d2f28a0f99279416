//! Single-level (2-D) operators.

use super::{SphereOperators, SphereScratch};
use crate::element::ElementGeometry;
use crate::field::{Scalar2d, Vector2d};
use crate::scratch::Tracked;

impl SphereOperators {
    /// Gradient of a 2-D scalar: `grad = Dinv · (∂s/∂ξ₁, ∂s/∂ξ₂) / rearth`.
    pub fn gradient_sphere_sl(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        scalar: &Scalar2d,
        grad: &mut Vector2d,
    ) {
        self.gradient_sl_with(geo, &mut scratch.vector_sl[0], scalar, grad, false);
    }

    /// Like [`gradient_sphere_sl`](Self::gradient_sphere_sl) but adds into `grad`.
    pub fn gradient_sphere_update_sl(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        scalar: &Scalar2d,
        grad: &mut Vector2d,
    ) {
        self.gradient_sl_with(geo, &mut scratch.vector_sl[0], scalar, grad, true);
    }

    /// Strong divergence of a 2-D vector.
    pub fn divergence_sphere_sl(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        v: &Vector2d,
        div: &mut Scalar2d,
    ) {
        let np = self.np();
        let gv_buf = &mut scratch.vector_sl[0];
        let gv = gv_buf.write();
        for igp in 0..np {
            for jgp in 0..np {
                let v0 = v.comps[0][(igp, jgp)];
                let v1 = v.comps[1][(igp, jgp)];
                let md = geo.metdet[(igp, jgp)];
                gv.comps[0][(igp, jgp)] =
                    (geo.dinv[(0, 0, igp, jgp)] * v0 + geo.dinv[(1, 0, igp, jgp)] * v1) * md;
                gv.comps[1][(igp, jgp)] =
                    (geo.dinv[(0, 1, igp, jgp)] * v0 + geo.dinv[(1, 1, igp, jgp)] * v1) * md;
            }
        }

        let gv = gv_buf.read();
        for igp in 0..np {
            for jgp in 0..np {
                let mut dudx = 0.0;
                let mut dvdy = 0.0;
                for k in 0..np {
                    dudx += self.deriv(jgp, k) * gv.comps[0][(igp, k)];
                    dvdy += self.deriv(igp, k) * gv.comps[1][(k, jgp)];
                }
                div[(igp, jgp)] =
                    (dudx + dvdy) * ((1.0 / geo.metdet[(igp, jgp)]) * self.rrearth);
            }
        }
        gv_buf.retire();
    }

    /// Weak divergence of a 2-D vector. The input is left untouched.
    pub fn divergence_sphere_wk_sl(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        v: &Vector2d,
        div: &mut Scalar2d,
    ) {
        self.divergence_wk_sl_with(geo, &mut scratch.vector_sl[0], v, div);
    }

    /// Vorticity of the 2-D vector `(u, v)`.
    pub fn vorticity_sphere_sl(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        u: &Scalar2d,
        v: &Scalar2d,
        vort: &mut Scalar2d,
    ) {
        let np = self.np();
        let vcov_buf = &mut scratch.vector_sl[0];
        let vcov = vcov_buf.write();
        for igp in 0..np {
            for jgp in 0..np {
                let u_ij = u[(igp, jgp)];
                let v_ij = v[(igp, jgp)];
                vcov.comps[0][(igp, jgp)] =
                    geo.d[(0, 0, igp, jgp)] * u_ij + geo.d[(0, 1, igp, jgp)] * v_ij;
                vcov.comps[1][(igp, jgp)] =
                    geo.d[(1, 0, igp, jgp)] * u_ij + geo.d[(1, 1, igp, jgp)] * v_ij;
            }
        }

        let vcov = vcov_buf.read();
        for igp in 0..np {
            for jgp in 0..np {
                let mut dudy = 0.0;
                let mut dvdx = 0.0;
                for k in 0..np {
                    dvdx += self.deriv(jgp, k) * vcov.comps[1][(igp, k)];
                    dudy += self.deriv(igp, k) * vcov.comps[0][(k, jgp)];
                }
                vort[(igp, jgp)] =
                    (dvdx - dudy) * ((1.0 / geo.metdet[(igp, jgp)]) * self.rrearth);
            }
        }
        vcov_buf.retire();
    }

    /// Weak Laplacian of a 2-D scalar: `div_wk(grad(field))`.
    pub fn laplace_wk_sl(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        field: &Scalar2d,
        laplace: &mut Scalar2d,
    ) {
        let [tmp, grad] = &mut scratch.vector_sl;
        self.gradient_sl_with(geo, tmp, field, grad.write(), false);
        self.divergence_wk_sl_with(geo, tmp, grad.read(), laplace);
        grad.retire();
    }

    fn gradient_sl_with(
        &self,
        geo: &ElementGeometry,
        tmp: &mut Tracked<Vector2d>,
        scalar: &Scalar2d,
        grad: &mut Vector2d,
        accumulate: bool,
    ) {
        let np = self.np();
        let cov = tmp.write();
        for igp in 0..np {
            for jgp in 0..np {
                let mut dsdx = 0.0;
                let mut dsdy = 0.0;
                for k in 0..np {
                    dsdx += self.deriv(jgp, k) * scalar[(igp, k)];
                    dsdy += self.deriv(igp, k) * scalar[(k, jgp)];
                }
                cov.comps[0][(igp, jgp)] = dsdx * self.rrearth;
                cov.comps[1][(igp, jgp)] = dsdy * self.rrearth;
            }
        }

        let cov = tmp.read();
        for igp in 0..np {
            for jgp in 0..np {
                let v0 = cov.comps[0][(igp, jgp)];
                let v1 = cov.comps[1][(igp, jgp)];
                for h in 0..2 {
                    let g = geo.dinv[(h, 0, igp, jgp)] * v0 + geo.dinv[(h, 1, igp, jgp)] * v1;
                    if accumulate {
                        grad.comps[h][(igp, jgp)] += g;
                    } else {
                        grad.comps[h][(igp, jgp)] = g;
                    }
                }
            }
        }
        tmp.retire();
    }

    fn divergence_wk_sl_with(
        &self,
        geo: &ElementGeometry,
        tmp: &mut Tracked<Vector2d>,
        v: &Vector2d,
        div: &mut Scalar2d,
    ) {
        let np = self.np();
        let gv = tmp.write();
        for igp in 0..np {
            for jgp in 0..np {
                let v0 = v.comps[0][(igp, jgp)];
                let v1 = v.comps[1][(igp, jgp)];
                gv.comps[0][(igp, jgp)] =
                    geo.dinv[(0, 0, igp, jgp)] * v0 + geo.dinv[(1, 0, igp, jgp)] * v1;
                gv.comps[1][(igp, jgp)] =
                    geo.dinv[(0, 1, igp, jgp)] * v0 + geo.dinv[(1, 1, igp, jgp)] * v1;
            }
        }

        let gv = tmp.read();
        for ngp in 0..np {
            for mgp in 0..np {
                let mut dd = 0.0;
                for j in 0..np {
                    dd -= (geo.spheremp[(ngp, j)] * gv.comps[0][(ngp, j)] * self.deriv(j, mgp)
                        + geo.spheremp[(j, mgp)] * gv.comps[1][(j, mgp)] * self.deriv(j, ngp))
                        * self.rrearth;
                }
                div[(ngp, mgp)] = dd;
            }
        }
        tmp.retire();
    }
}
