//! Weak curl and gradient with covariant test functions.
//!
//! These apply the mass weights directly instead of contracting with
//! `spheremp`, and are the building blocks of the contravariant vector
//! Laplacian.

use super::{SphereOperators, SphereScratch};
use crate::element::ElementGeometry;
use crate::field::{ScalarField, VectorField};
use crate::pack::Pack;

impl SphereOperators {
    /// Weak curl of a packed scalar.
    pub fn curl_sphere_wk_testcov(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        scalar: &ScalarField,
        curls: &mut VectorField,
        nlev: usize,
    ) {
        self.check_levels(nlev);
        let np = self.np();
        let sphere_buf = &mut scratch.vector_ml[0];
        let sb = sphere_buf.write();
        for ngp in 0..np {
            for mgp in 0..np {
                for ilev in 0..nlev {
                    let (sb0, sb1) = self.curl_contraction(scalar, ngp, mgp, ilev);
                    *sb.comps[0].pack_mut(ngp, mgp, ilev) = sb0;
                    *sb.comps[1].pack_mut(ngp, mgp, ilev) = sb1;
                }
            }
        }

        let sb = sphere_buf.read();
        for igp in 0..np {
            for jgp in 0..np {
                for ilev in 0..nlev {
                    let sb0 = sb.comps[0].pack(igp, jgp, ilev);
                    let sb1 = sb.comps[1].pack(igp, jgp, ilev);
                    for h in 0..2 {
                        *curls.comps[h].pack_mut(igp, jgp, ilev) = (geo.d[(0, h, igp, jgp)] * sb0
                            + geo.d[(1, h, igp, jgp)] * sb1)
                            * self.rrearth;
                    }
                }
            }
        }
        sphere_buf.retire();
    }

    /// `curls = beta · curls + alpha · curl_wk(scalar)`.
    pub fn curl_sphere_wk_testcov_update(
        &self,
        geo: &ElementGeometry,
        alpha: f64,
        beta: f64,
        scalar: &ScalarField,
        curls: &mut VectorField,
        nlev: usize,
    ) {
        self.check_levels(nlev);
        let np = self.np();
        for ngp in 0..np {
            for mgp in 0..np {
                for ilev in 0..nlev {
                    let (sb0, sb1) = self.curl_contraction(scalar, ngp, mgp, ilev);
                    for h in 0..2 {
                        let out = curls.comps[h].pack_mut(ngp, mgp, ilev);
                        *out = beta * *out
                            + alpha
                                * (geo.d[(0, h, ngp, mgp)] * sb0 + geo.d[(1, h, ngp, mgp)] * sb1)
                                * self.rrearth;
                    }
                }
            }
        }
    }

    /// Weak gradient of a packed scalar.
    pub fn grad_sphere_wk_testcov(
        &self,
        geo: &ElementGeometry,
        scalar: &ScalarField,
        grads: &mut VectorField,
        nlev: usize,
    ) {
        self.check_levels(nlev);
        let np = self.np();
        for ngp in 0..np {
            for mgp in 0..np {
                let md = geo.metdet[(ngp, mgp)];
                let metinv = |i: usize, j: usize| geo.metinv[(i, j, ngp, mgp)];
                for ilev in 0..nlev {
                    let mut b0 = Pack::ZERO;
                    let mut b1 = Pack::ZERO;
                    for j in 0..np {
                        let mpnj = self.mass(ngp, j);
                        let mpjm = self.mass(j, mgp);
                        let snj = scalar.pack(ngp, j, ilev);
                        let sjm = scalar.pack(j, mgp, ilev);
                        let djm = self.deriv(j, mgp);
                        let djn = self.deriv(j, ngp);
                        b0 -= mpnj * metinv(0, 0) * md * snj * djm
                            + mpjm * metinv(0, 1) * md * sjm * djn;
                        b1 -= mpnj * metinv(1, 0) * md * snj * djm
                            + mpjm * metinv(1, 1) * md * sjm * djn;
                    }
                    for h in 0..2 {
                        *grads.comps[h].pack_mut(ngp, mgp, ilev) = (geo.d[(0, h, ngp, mgp)] * b0
                            + geo.d[(1, h, ngp, mgp)] * b1)
                            * self.rrearth;
                    }
                }
            }
        }
    }

    /// Mass-weighted derivative contractions shared by both curl forms.
    #[inline(always)]
    fn curl_contraction(&self, scalar: &ScalarField, ngp: usize, mgp: usize, ilev: usize) -> (Pack, Pack) {
        let mut sb0 = Pack::ZERO;
        let mut sb1 = Pack::ZERO;
        for j in 0..self.np() {
            sb0 -= self.mass(j, mgp) * scalar.pack(j, mgp, ilev) * self.deriv(j, ngp);
            sb1 += self.mass(ngp, j) * scalar.pack(ngp, j, ilev) * self.deriv(j, mgp);
        }
        (sb0, sb1)
    }
}
