//! Scalar and vector weak Laplacians.

use super::{SphereOperators, SphereScratch};
use crate::element::ElementGeometry;
use crate::field::{ScalarField, Tensor2d, VectorField};
use crate::scratch::Tracked;

impl SphereOperators {
    /// Weak Laplacian: `div_wk(grad(field))`.
    pub fn laplace_simple(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        field: &ScalarField,
        laplace: &mut ScalarField,
        nlev: usize,
    ) {
        let grad = &mut scratch.vector_ml[0];
        self.gradient_sphere(geo, field, grad.write(), nlev);
        self.divergence_sphere_wk_in_place(geo, grad.modify(), laplace, nlev);
        grad.retire();
    }

    /// Anisotropic weak Laplacian: `div_wk(tensor · grad(field))`.
    pub fn laplace_tensor(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        tensor: &Tensor2d,
        field: &ScalarField,
        laplace: &mut ScalarField,
        nlev: usize,
    ) {
        let [_, grad_s, sphere_buf] = &mut scratch.vector_ml;
        self.tensor_flux(geo, grad_s, sphere_buf, tensor, field, nlev);
        self.divergence_sphere_wk_in_place(geo, sphere_buf.modify(), laplace, nlev);
        sphere_buf.retire();
    }

    /// Fill `sphere_buf` with `tensor · grad(field)`.
    fn tensor_flux(
        &self,
        geo: &ElementGeometry,
        grad_s: &mut Tracked<VectorField>,
        sphere_buf: &mut Tracked<VectorField>,
        tensor: &Tensor2d,
        field: &ScalarField,
        nlev: usize,
    ) {
        self.gradient_sphere(geo, field, grad_s.write(), nlev);

        let np = self.np();
        let grad = grad_s.read();
        let out = sphere_buf.write();
        for igp in 0..np {
            for jgp in 0..np {
                for ilev in 0..nlev {
                    let g0 = grad.comps[0].pack(igp, jgp, ilev);
                    let g1 = grad.comps[1].pack(igp, jgp, ilev);
                    for h in 0..2 {
                        *out.comps[h].pack_mut(igp, jgp, ilev) =
                            tensor[(0, h, igp, jgp)] * g0 + tensor[(1, h, igp, jgp)] * g1;
                    }
                }
            }
        }
        grad_s.retire();
    }

    /// Vector Laplacian through Cartesian components.
    ///
    /// Each of the three Cartesian components gets the tensor Laplacian, the
    /// result is projected back, and the curvature term
    /// `2 · spheremp · v / rearth²` is added.
    pub fn vlaplace_sphere_wk_cartesian(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        tensor: &Tensor2d,
        vector: &VectorField,
        laplace: &mut VectorField,
        nlev: usize,
    ) {
        self.check_levels(nlev);
        let np = self.np();
        let [_, grad_s, sphere_buf] = &mut scratch.vector_ml;
        let cart = &mut scratch.scalar_ml;

        for (c, buf) in cart.iter_mut().enumerate() {
            let lap = buf.write();
            for igp in 0..np {
                for jgp in 0..np {
                    let s0 = geo.sph2cart(0, c, igp, jgp);
                    let s1 = geo.sph2cart(1, c, igp, jgp);
                    for ilev in 0..nlev {
                        *lap.pack_mut(igp, jgp, ilev) = s0 * vector.comps[0].pack(igp, jgp, ilev)
                            + s1 * vector.comps[1].pack(igp, jgp, ilev);
                    }
                }
            }
        }

        // Each Cartesian buffer is both input and output of its Laplacian.
        for buf in cart.iter_mut() {
            self.tensor_flux(geo, grad_s, sphere_buf, tensor, buf.read(), nlev);
            self.divergence_sphere_wk_in_place(geo, sphere_buf.modify(), buf.modify(), nlev);
            sphere_buf.retire();
        }

        let rr2 = self.rrearth * self.rrearth;
        let [l0, l1, l2] = cart.each_ref().map(|b| b.read());
        for igp in 0..np {
            for jgp in 0..np {
                let sp2 = 2.0 * geo.spheremp[(igp, jgp)];
                for ilev in 0..nlev {
                    for h in 0..2 {
                        *laplace.comps[h].pack_mut(igp, jgp, ilev) = geo.sph2cart(h, 0, igp, jgp)
                            * l0.pack(igp, jgp, ilev)
                            + geo.sph2cart(h, 1, igp, jgp) * l1.pack(igp, jgp, ilev)
                            + geo.sph2cart(h, 2, igp, jgp) * l2.pack(igp, jgp, ilev)
                            + sp2 * vector.comps[h].pack(igp, jgp, ilev) * rr2;
                    }
                }
            }
        }
        cart.iter_mut().for_each(|b| b.retire());
    }

    /// Vector Laplacian from `grad(div v) − curl(curl v)` in weak form.
    ///
    /// The divergence is scaled by `nu_ratio` before its gradient is taken,
    /// unless `nu_ratio` is non-positive or exactly one.
    pub fn vlaplace_sphere_wk_contra(
        &self,
        geo: &ElementGeometry,
        scratch: &mut SphereScratch,
        nu_ratio: f64,
        vector: &VectorField,
        laplace: &mut VectorField,
        nlev: usize,
    ) {
        self.check_levels(nlev);
        let np = self.np();
        // Divergence and vorticity share one buffer.
        let div_vort = &mut scratch.scalar_ml[0];
        let [gv, grad_curl_cov, _] = &mut scratch.vector_ml;

        self.divergence_with(geo, gv, vector, div_vort.write(), nlev);
        if nu_ratio > 0.0 && nu_ratio != 1.0 {
            let div = div_vort.modify();
            for igp in 0..np {
                for jgp in 0..np {
                    for ilev in 0..nlev {
                        *div.pack_mut(igp, jgp, ilev) *= nu_ratio;
                    }
                }
            }
        }
        self.grad_sphere_wk_testcov(geo, div_vort.read(), grad_curl_cov.write(), nlev);
        div_vort.retire();

        self.vorticity_with(
            geo,
            gv,
            &vector.comps[0],
            &vector.comps[1],
            div_vort.write(),
            nlev,
        );
        self.curl_sphere_wk_testcov_update(
            geo,
            -1.0,
            1.0,
            div_vort.read(),
            grad_curl_cov.modify(),
            nlev,
        );
        div_vort.retire();

        let rr2 = self.rrearth * self.rrearth;
        let gcc = grad_curl_cov.read();
        for igp in 0..np {
            for jgp in 0..np {
                let f = 2.0 * geo.spheremp[(igp, jgp)];
                for ilev in 0..nlev {
                    for h in 0..2 {
                        *laplace.comps[h].pack_mut(igp, jgp, ilev) =
                            f * vector.comps[h].pack(igp, jgp, ilev) * rr2
                                + gcc.comps[h].pack(igp, jgp, ilev);
                    }
                }
            }
        }
        grad_curl_cov.retire();
    }
}
