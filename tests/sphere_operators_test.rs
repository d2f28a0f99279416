//! Integration tests for the spectral-element sphere operators.
//!
//! These tests verify:
//! 1. Discrete adjointness of the weak divergence and the gradient
//! 2. Null spaces (Laplacian of a constant, vorticity of a gradient)
//! 3. Bitwise agreement of single-level and multi-level variants
//! 4. Consistency between related operators (tensor vs simple Laplacian,
//!    update forms vs plain forms)
//! 5. Vector Laplacians of constant fields on a flat cell

use std::sync::Arc;

use se_dycore::element::{ElementGeometry, ReferenceElement};
use se_dycore::field::{Scalar2d, ScalarField, Tensor2d, Vector2d, VectorField};
use se_dycore::pack::LevelLayout;
use se_dycore::sphere::SphereOperators;

const NP: usize = 4;
const NUM_LEVELS: usize = 7;
const RR: f64 = 0.5;

fn layout() -> LevelLayout {
    LevelLayout::new(NUM_LEVELS)
}

fn operators(reference: &Arc<ReferenceElement>) -> SphereOperators {
    SphereOperators::new(reference.clone(), layout(), RR)
}

/// A cell with a non-orthogonal, spatially varying covariant matrix.
fn skewed_geometry(reference: &ReferenceElement) -> ElementGeometry {
    let d = Tensor2d::from_fn(NP, |i, j, igp, jgp| {
        let base = [[1.2, 0.3], [-0.25, 0.9]][i][j];
        base + 0.04 * igp as f64 - 0.03 * jgp as f64 + 0.01 * (i + j) as f64
    });
    ElementGeometry::from_covariant(reference, d)
}

fn smooth_scalar(reference: &ReferenceElement) -> ScalarField {
    let x = reference.nodes().to_vec();
    ScalarField::from_fn(NP, layout(), |i, j, k| {
        let (a, b) = (x[j], x[i]);
        (1.0 + 0.1 * k as f64) * (a * a * b - 0.5 * b + 0.3 * (k as f64 * a).sin())
    })
}

fn smooth_vector(reference: &ReferenceElement) -> VectorField {
    let x = reference.nodes().to_vec();
    VectorField::from_fn(NP, layout(), |c, i, j, k| {
        let (a, b) = (x[j], x[i]);
        let kf = k as f64;
        if c == 0 {
            0.7 * a * b + kf * 0.1 - b * b
        } else {
            (a + 0.2 * kf).cos() + 0.4 * a * a * a
        }
    })
}

fn level_2d(field: &ScalarField, k: usize) -> Scalar2d {
    Scalar2d::from_fn(NP, |i, j| field.level(i, j, k))
}

fn vector_level_2d(field: &VectorField, k: usize) -> Vector2d {
    Vector2d::from_fn(NP, |c, i, j| field.comps[c].level(i, j, k))
}

fn max_abs(field: &ScalarField) -> f64 {
    let mut m: f64 = 0.0;
    for i in 0..NP {
        for j in 0..NP {
            for x in field.physical_column(i, j) {
                m = m.max(x.abs());
            }
        }
    }
    m
}

// ============================================================================
// Adjointness and null spaces
// ============================================================================

/// Σ s · div_wk(v) = −Σ spheremp · (v · grad s) on every level.
#[test]
fn test_weak_divergence_is_adjoint_of_gradient() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = skewed_geometry(&reference);
    let mut scratch = ops.scratch();
    let nlev = layout().num_packs();

    let s = smooth_scalar(&reference);
    let v = smooth_vector(&reference);
    let mut div = ScalarField::zeros(NP, layout());
    let mut grad = VectorField::zeros(NP, layout());
    ops.divergence_sphere_wk(&geo, &mut scratch, &v, &mut div, nlev);
    ops.gradient_sphere(&geo, &s, &mut grad, nlev);

    for k in 0..NUM_LEVELS {
        let mut lhs = 0.0;
        let mut rhs = 0.0;
        for i in 0..NP {
            for j in 0..NP {
                lhs += s.level(i, j, k) * div.level(i, j, k);
                let vg = v.comps[0].level(i, j, k) * grad.comps[0].level(i, j, k)
                    + v.comps[1].level(i, j, k) * grad.comps[1].level(i, j, k);
                rhs -= geo.spheremp[(i, j)] * vg;
            }
        }
        assert!(
            (lhs - rhs).abs() < 1e-11 * (1.0 + lhs.abs()),
            "level {k}: {lhs} vs {rhs}"
        );
    }
}

/// The non-destructive weak divergence leaves its input untouched and
/// matches the destructive form.
#[test]
fn test_weak_divergence_forms_agree() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = skewed_geometry(&reference);
    let mut scratch = ops.scratch();
    let nlev = layout().num_packs();

    let v = smooth_vector(&reference);
    let mut pure = ScalarField::zeros(NP, layout());
    ops.divergence_sphere_wk(&geo, &mut scratch, &v, &mut pure, nlev);
    assert_eq!(v, smooth_vector(&reference));

    let mut consumed = v.clone();
    let mut destructive = ScalarField::zeros(NP, layout());
    ops.divergence_sphere_wk_in_place(&geo, &mut consumed, &mut destructive, nlev);
    assert_eq!(pure, destructive);
}

#[test]
fn test_laplace_of_constant_vanishes() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = skewed_geometry(&reference);
    let mut scratch = ops.scratch();

    let c = ScalarField::from_fn(NP, layout(), |_, _, k| 3.0 + k as f64);
    let mut lap = ScalarField::zeros(NP, layout());
    ops.laplace_simple(&geo, &mut scratch, &c, &mut lap, layout().num_packs());
    assert!(max_abs(&lap) < 1e-12, "max |lap| = {}", max_abs(&lap));
}

#[test]
fn test_vorticity_of_gradient_vanishes() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = skewed_geometry(&reference);
    let mut scratch = ops.scratch();
    let nlev = layout().num_packs();

    let s = smooth_scalar(&reference);
    let mut grad = VectorField::zeros(NP, layout());
    let mut vort = ScalarField::zeros(NP, layout());
    ops.gradient_sphere(&geo, &s, &mut grad, nlev);
    ops.vorticity_sphere(&geo, &mut scratch, &grad, &mut vort, nlev);
    assert!(max_abs(&vort) < 1e-11, "max |vort| = {}", max_abs(&vort));
}

/// Strong divergence of a constant field on the flat cell vanishes.
#[test]
fn test_divergence_of_constant_on_flat_cell() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = ElementGeometry::flat(&reference);
    let mut scratch = ops.scratch();

    let v = VectorField::from_fn(NP, layout(), |c, _, _, _| if c == 0 { 2.0 } else { -1.5 });
    let mut div = ScalarField::zeros(NP, layout());
    ops.divergence_sphere(&geo, &mut scratch, &v, &mut div, layout().num_packs());
    assert!(max_abs(&div) < 1e-12);
}

// ============================================================================
// Single-level vs multi-level
// ============================================================================

#[test]
fn test_single_level_matches_multi_level_bitwise() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = skewed_geometry(&reference);
    let mut scratch = ops.scratch();
    let nlev = layout().num_packs();

    let s = smooth_scalar(&reference);
    let v = smooth_vector(&reference);

    let mut grad = VectorField::zeros(NP, layout());
    let mut div = ScalarField::zeros(NP, layout());
    let mut div_wk = ScalarField::zeros(NP, layout());
    let mut vort = ScalarField::zeros(NP, layout());
    let mut lap = ScalarField::zeros(NP, layout());
    ops.gradient_sphere(&geo, &s, &mut grad, nlev);
    ops.divergence_sphere(&geo, &mut scratch, &v, &mut div, nlev);
    ops.divergence_sphere_wk(&geo, &mut scratch, &v, &mut div_wk, nlev);
    ops.vorticity_sphere(&geo, &mut scratch, &v, &mut vort, nlev);
    ops.laplace_simple(&geo, &mut scratch, &s, &mut lap, nlev);

    for k in 0..NUM_LEVELS {
        let s2 = level_2d(&s, k);
        let v2 = vector_level_2d(&v, k);

        let mut grad2 = Vector2d::zeros(NP);
        let mut div2 = Scalar2d::zeros(NP);
        let mut div_wk2 = Scalar2d::zeros(NP);
        let mut vort2 = Scalar2d::zeros(NP);
        let mut lap2 = Scalar2d::zeros(NP);
        ops.gradient_sphere_sl(&geo, &mut scratch, &s2, &mut grad2);
        ops.divergence_sphere_sl(&geo, &mut scratch, &v2, &mut div2);
        ops.divergence_sphere_wk_sl(&geo, &mut scratch, &v2, &mut div_wk2);
        ops.vorticity_sphere_sl(&geo, &mut scratch, &v2.comps[0], &v2.comps[1], &mut vort2);
        ops.laplace_wk_sl(&geo, &mut scratch, &s2, &mut lap2);

        for i in 0..NP {
            for j in 0..NP {
                for c in 0..2 {
                    assert_eq!(grad2.comps[c][(i, j)], grad.comps[c].level(i, j, k));
                }
                assert_eq!(div2[(i, j)], div.level(i, j, k));
                assert_eq!(div_wk2[(i, j)], div_wk.level(i, j, k));
                assert_eq!(vort2[(i, j)], vort.level(i, j, k));
                assert_eq!(lap2[(i, j)], lap.level(i, j, k));
            }
        }
    }
}

/// Operators restricted to the leading packs leave the others alone.
#[test]
fn test_partial_pack_count() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = skewed_geometry(&reference);

    let s = smooth_scalar(&reference);
    let mut grad = VectorField::from_fn(NP, layout(), |_, _, _, _| 42.0);
    ops.gradient_sphere(&geo, &s, &mut grad, 1);
    for i in 0..NP {
        for j in 0..NP {
            assert_ne!(grad.comps[0].level(i, j, 0), 42.0);
            assert_eq!(grad.comps[0].level(i, j, NUM_LEVELS - 1), 42.0);
        }
    }
}

// ============================================================================
// Related operators
// ============================================================================

#[test]
fn test_gradient_update_accumulates() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = skewed_geometry(&reference);
    let nlev = layout().num_packs();

    let s = smooth_scalar(&reference);
    let mut grad = VectorField::zeros(NP, layout());
    ops.gradient_sphere(&geo, &s, &mut grad, nlev);
    let mut twice = grad.clone();
    ops.gradient_sphere_update(&geo, &s, &mut twice, nlev);
    for c in 0..2 {
        for i in 0..NP {
            for j in 0..NP {
                for k in 0..NUM_LEVELS {
                    let g = grad.comps[c].level(i, j, k);
                    assert!((twice.comps[c].level(i, j, k) - 2.0 * g).abs() < 1e-13 * (1.0 + g.abs()));
                }
            }
        }
    }
}

/// qtens = qdp + div(v* · qdp) when alpha = 1 and no hyperviscosity is added.
#[test]
fn test_divergence_update_identity() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = skewed_geometry(&reference);
    let mut scratch = ops.scratch();
    let nlev = layout().num_packs();

    let vstar = smooth_vector(&reference);
    let qdp = ScalarField::from_fn(NP, layout(), |i, j, k| 1.0 + 0.1 * (i + 2 * j + k) as f64);

    let mut qtens = ScalarField::from_fn(NP, layout(), |_, _, _| 99.0);
    ops.divergence_sphere_update(&geo, &mut scratch, 1.0, false, &vstar, &qdp, &mut qtens, nlev);

    let flux = VectorField::from_fn(NP, layout(), |c, i, j, k| {
        vstar.comps[c].level(i, j, k) * qdp.level(i, j, k)
    });
    let mut div = ScalarField::zeros(NP, layout());
    ops.divergence_sphere(&geo, &mut scratch, &flux, &mut div, nlev);

    for i in 0..NP {
        for j in 0..NP {
            for k in 0..NUM_LEVELS {
                let expected = qdp.level(i, j, k) + div.level(i, j, k);
                let got = qtens.level(i, j, k);
                assert!((got - expected).abs() < 1e-12 * (1.0 + expected.abs()));
            }
        }
    }

    // With hyperviscosity the previous qtens is added on top.
    let mut with_hv = ScalarField::from_fn(NP, layout(), |_, _, _| 0.25);
    ops.divergence_sphere_update(&geo, &mut scratch, 1.0, true, &vstar, &qdp, &mut with_hv, nlev);
    for i in 0..NP {
        for j in 0..NP {
            let diff = with_hv.level(i, j, 3) - qtens.level(i, j, 3);
            assert!((diff - 0.25).abs() < 1e-12);
        }
    }
}

#[test]
fn test_vorticity_uv_matches_vector_form() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = skewed_geometry(&reference);
    let mut scratch = ops.scratch();
    let nlev = layout().num_packs();

    let v = smooth_vector(&reference);
    let mut a = ScalarField::zeros(NP, layout());
    let mut b = ScalarField::zeros(NP, layout());
    ops.vorticity_sphere(&geo, &mut scratch, &v, &mut a, nlev);
    ops.vorticity_sphere_uv(&geo, &mut scratch, &v.comps[0], &v.comps[1], &mut b, nlev);
    assert_eq!(a, b);
}

#[test]
fn test_laplace_tensor_identity_matches_simple() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = skewed_geometry(&reference);
    let mut scratch = ops.scratch();
    let nlev = layout().num_packs();

    let s = smooth_scalar(&reference);
    let mut simple = ScalarField::zeros(NP, layout());
    let mut tensor = ScalarField::zeros(NP, layout());
    ops.laplace_simple(&geo, &mut scratch, &s, &mut simple, nlev);
    ops.laplace_tensor(&geo, &mut scratch, &Tensor2d::identity(NP), &s, &mut tensor, nlev);

    for i in 0..NP {
        for j in 0..NP {
            for k in 0..NUM_LEVELS {
                let a = simple.level(i, j, k);
                let b = tensor.level(i, j, k);
                assert!((a - b).abs() < 1e-13 * (1.0 + a.abs()), "{a} vs {b}");
            }
        }
    }
}

/// Doubling the viscosity tensor doubles the Laplacian.
#[test]
fn test_laplace_tensor_is_linear_in_tensor() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = skewed_geometry(&reference);
    let mut scratch = ops.scratch();
    let nlev = layout().num_packs();

    let s = smooth_scalar(&reference);
    let t1 = Tensor2d::from_fn(NP, |i, j, _, _| [[1.0, 0.2], [0.2, 0.5]][i][j]);
    let t2 = Tensor2d::from_fn(NP, |i, j, _, _| 2.0 * [[1.0, 0.2], [0.2, 0.5]][i][j]);
    let mut a = ScalarField::zeros(NP, layout());
    let mut b = ScalarField::zeros(NP, layout());
    ops.laplace_tensor(&geo, &mut scratch, &t1, &s, &mut a, nlev);
    ops.laplace_tensor(&geo, &mut scratch, &t2, &s, &mut b, nlev);
    for i in 0..NP {
        for j in 0..NP {
            let (x, y) = (a.level(i, j, 2), b.level(i, j, 2));
            assert!((y - 2.0 * x).abs() < 1e-12 * (1.0 + x.abs()));
        }
    }
}

#[test]
fn test_curl_update_with_unit_alpha_matches_curl() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = skewed_geometry(&reference);
    let mut scratch = ops.scratch();
    let nlev = layout().num_packs();

    let s = smooth_scalar(&reference);
    let mut curl = VectorField::zeros(NP, layout());
    ops.curl_sphere_wk_testcov(&geo, &mut scratch, &s, &mut curl, nlev);

    let mut updated = VectorField::zeros(NP, layout());
    ops.curl_sphere_wk_testcov_update(&geo, 1.0, 0.0, &s, &mut updated, nlev);
    for c in 0..2 {
        for i in 0..NP {
            for j in 0..NP {
                for k in 0..NUM_LEVELS {
                    let a = curl.comps[c].level(i, j, k);
                    let b = updated.comps[c].level(i, j, k);
                    assert!((a - b).abs() < 1e-13 * (1.0 + a.abs()));
                }
            }
        }
    }

    // beta keeps a scaled copy of the previous contents.
    let mut mixed = curl.clone();
    ops.curl_sphere_wk_testcov_update(&geo, -1.0, 3.0, &s, &mut mixed, nlev);
    for i in 0..NP {
        for j in 0..NP {
            let a = curl.comps[1].level(i, j, 0);
            assert!((mixed.comps[1].level(i, j, 0) - 2.0 * a).abs() < 1e-12 * (1.0 + a.abs()));
        }
    }
}

/// Weak gradient and weak curl of a constant integrate to zero over a flat cell.
#[test]
fn test_weak_testcov_totals_of_constant() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = ElementGeometry::flat(&reference);
    let mut scratch = ops.scratch();
    let nlev = layout().num_packs();

    let c = ScalarField::from_fn(NP, layout(), |_, _, _| 5.0);
    let mut grads = VectorField::zeros(NP, layout());
    let mut curls = VectorField::zeros(NP, layout());
    ops.grad_sphere_wk_testcov(&geo, &c, &mut grads, nlev);
    ops.curl_sphere_wk_testcov(&geo, &mut scratch, &c, &mut curls, nlev);

    for h in 0..2 {
        for k in 0..NUM_LEVELS {
            let grad_total: f64 = (0..NP)
                .flat_map(|i| (0..NP).map(move |j| (i, j)))
                .map(|(i, j)| grads.comps[h].level(i, j, k))
                .sum();
            let curl_total: f64 = (0..NP)
                .flat_map(|i| (0..NP).map(move |j| (i, j)))
                .map(|(i, j)| curls.comps[h].level(i, j, k))
                .sum();
            assert!(grad_total.abs() < 1e-12, "grad total {grad_total}");
            assert!(curl_total.abs() < 1e-12, "curl total {curl_total}");
        }
    }
}

// ============================================================================
// Vector Laplacians
// ============================================================================

fn constant_vector() -> VectorField {
    VectorField::from_fn(NP, layout(), |c, _, _, k| if c == 0 { 1.5 + k as f64 } else { -0.75 })
}

fn assert_curvature_only(geo: &ElementGeometry, v: &VectorField, lap: &VectorField) {
    for c in 0..2 {
        for i in 0..NP {
            for j in 0..NP {
                for k in 0..NUM_LEVELS {
                    let expected = 2.0 * geo.spheremp[(i, j)] * v.comps[c].level(i, j, k) * RR * RR;
                    let got = lap.comps[c].level(i, j, k);
                    assert!(
                        (got - expected).abs() < 1e-11,
                        "c={c} node=({i},{j}) k={k}: {got} vs {expected}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_vlaplace_cartesian_of_constant_on_flat_cell() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = ElementGeometry::flat(&reference);
    let mut scratch = ops.scratch();

    let v = constant_vector();
    let mut lap = VectorField::zeros(NP, layout());
    ops.vlaplace_sphere_wk_cartesian(
        &geo,
        &mut scratch,
        &Tensor2d::identity(NP),
        &v,
        &mut lap,
        layout().num_packs(),
    );
    assert_curvature_only(&geo, &v, &lap);
}

#[test]
fn test_vlaplace_contra_of_constant_on_flat_cell() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = ElementGeometry::flat(&reference);
    let mut scratch = ops.scratch();
    let nlev = layout().num_packs();

    let v = constant_vector();
    for nu_ratio in [1.0, 2.5, -1.0] {
        let mut lap = VectorField::zeros(NP, layout());
        ops.vlaplace_sphere_wk_contra(&geo, &mut scratch, nu_ratio, &v, &mut lap, nlev);
        assert_curvature_only(&geo, &v, &lap);
    }
}

/// For a divergent field the ratio scales only the divergence part.
#[test]
fn test_vlaplace_contra_nu_ratio_scaling() {
    let reference = ReferenceElement::shared(NP);
    let ops = operators(&reference);
    let geo = ElementGeometry::flat(&reference);
    let mut scratch = ops.scratch();
    let nlev = layout().num_packs();

    // Irrotational field v = grad(x² + y²)/2 on the flat cell: vorticity vanishes.
    let x = reference.nodes().to_vec();
    let v = VectorField::from_fn(NP, layout(), |c, i, j, _| if c == 0 { x[j] } else { x[i] });

    let mut base = VectorField::zeros(NP, layout());
    let mut scaled = VectorField::zeros(NP, layout());
    ops.vlaplace_sphere_wk_contra(&geo, &mut scratch, 1.0, &v, &mut base, nlev);
    ops.vlaplace_sphere_wk_contra(&geo, &mut scratch, 3.0, &v, &mut scaled, nlev);

    for c in 0..2 {
        for i in 0..NP {
            for j in 0..NP {
                let curv = 2.0 * geo.spheremp[(i, j)] * v.comps[c].level(i, j, 0) * RR * RR;
                let b = base.comps[c].level(i, j, 0) - curv;
                let s = scaled.comps[c].level(i, j, 0) - curv;
                assert!((s - 3.0 * b).abs() < 1e-11, "c={c} ({i},{j}): {s} vs {}", 3.0 * b);
            }
        }
    }
}
