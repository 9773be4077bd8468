//! Cross-backend tests: the same transform through different engines.
//!
//! The reference backend and the execution-mode operators must agree, and a
//! shared library built against a generated interface stub must be callable
//! through the same buffer contract.

use fftx_rs::backend::{CompiledTransform, ReferenceBatchDft, ReferenceBatchPrdft, TransformBackend};
use fftx_rs::ops::verify::DEFAULT_TOLERANCE;
use fftx_rs::ops::{compare_complex, compare_real, imddft, mddft};
use fftx_rs::trace::{BatchDftProblem, BatchLayout, BatchPrdftProblem, DagKind, Distribution};
use fftx_rs::{Array, Complex64, Direction, FftxError, IndexBox, InterfaceStub, Point, TraceContext};
use std::path::Path;
use std::process::Command;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn interleave(v: &[Complex64]) -> Vec<f64> {
    v.iter().flat_map(|c| [c.re, c.im]).collect()
}

fn test_signal(len: usize) -> Vec<Complex64> {
    (0..len)
        .map(|i| Complex64::new((i as f64 * 0.41).sin(), (i as f64 * 0.17).cos() - 0.5))
        .collect()
}

fn all_layouts() -> Vec<BatchLayout> {
    let tags = [Distribution::Contiguous, Distribution::Interleaved];
    tags.iter()
        .flat_map(|&r| tags.iter().map(move |&w| BatchLayout::new(r, w)))
        .collect()
}

// =============================================================================
// REFERENCE BACKEND VS OPERATORS
// =============================================================================

#[test]
fn test_reference_matches_operator_all_layouts() {
    init_logger();
    let (n, batch) = (16, 4);
    for direction in [Direction::Forward, Direction::Inverse] {
        for layout in all_layouts() {
            let data = test_signal(n * batch);

            let problem = BatchDftProblem::new("b1", n, batch, layout, direction).unwrap();
            let mut backend = ReferenceBatchDft::new(problem).unwrap();
            let x = interleave(&data);
            let mut y = vec![0.0; x.len()];
            backend.transform(&mut [&mut y[..]], &[&x[..]], &[]).unwrap();

            let mut ctx = TraceContext::new();
            let d = IndexBox::from_extents(&[n * batch]).unwrap();
            let xa = Array::from_vec(&ctx, data, d.clone()).unwrap();
            let mut ya = Array::new(&mut ctx, d).unwrap();
            let ext = Point::new(&[n as i64]).unwrap();
            match direction {
                Direction::Forward => mddft(&mut ctx, &ext, batch, layout, &mut ya, &xa).unwrap(),
                Direction::Inverse => imddft(&mut ctx, &ext, batch, layout, &mut ya, &xa).unwrap(),
            }

            let cmp = compare_real(&y, &interleave(ya.as_slice().unwrap()), 1e-12).unwrap();
            assert!(cmp.correct, "{:?} {:?}: {}", direction, layout, cmp);
        }
    }
}

#[test]
fn test_reference_round_trip() {
    let (n, batch) = (32, 2);
    let layout = BatchLayout::interleaved();
    let forward = BatchDftProblem::new("f", n, batch, layout, Direction::Forward).unwrap();
    let inverse = BatchDftProblem::new("i", n, batch, layout, Direction::Inverse).unwrap();
    let mut f = ReferenceBatchDft::new(forward).unwrap();
    let mut i = ReferenceBatchDft::new(inverse).unwrap();

    let data = test_signal(n * batch);
    let x = interleave(&data);
    let mut spec = vec![0.0; x.len()];
    let mut back = vec![0.0; x.len()];
    f.transform(&mut [&mut spec[..]], &[&x[..]], &[]).unwrap();
    i.transform(&mut [&mut back[..]], &[&spec[..]], &[]).unwrap();

    let scaled: Vec<Complex64> = data.iter().map(|v| *v * n as f64).collect();
    let back: &[Complex64] = bytemuck::cast_slice(&back[..]);
    let cmp = compare_complex(back, &scaled, DEFAULT_TOLERANCE).unwrap();
    assert!(cmp.correct, "{}", cmp);
}

#[test]
fn test_real_reference_matches_complex_reference() {
    init_logger();
    let (n, batch) = (16, 3);
    let half = n / 2 + 1;
    for layout in all_layouts() {
        let real: Vec<f64> = test_signal(n * batch).iter().map(|c| c.re).collect();

        let problem = BatchPrdftProblem::new("b1prdft", n, batch, layout, Direction::Forward).unwrap();
        let mut backend = ReferenceBatchPrdft::new(problem).unwrap();
        let mut spectrum = vec![0.0; 2 * half * batch];
        backend.transform(&mut [&mut spectrum[..]], &[&real[..]], &[]).unwrap();

        // Same data as a complex batch, full spectrum written lane by lane.
        let full_layout = BatchLayout::new(layout.read, Distribution::Contiguous);
        let problem = BatchDftProblem::new("b1dft", n, batch, full_layout, Direction::Forward).unwrap();
        let mut complex = ReferenceBatchDft::new(problem).unwrap();
        let x: Vec<f64> = real.iter().flat_map(|&v| [v, 0.0]).collect();
        let mut full = vec![0.0; x.len()];
        complex.transform(&mut [&mut full[..]], &[&x[..]], &[]).unwrap();

        let full: &[Complex64] = bytemuck::cast_slice(&full[..]);
        let got: &[Complex64] = bytemuck::cast_slice(&spectrum[..]);
        let mut expected = vec![Complex64::new(0.0, 0.0); half * batch];
        for b in 0..batch {
            for k in 0..half {
                expected[layout.write.offset(b, k, batch, half)] = full[b * n + k];
            }
        }
        let cmp = compare_complex(got, &expected, 1e-12).unwrap();
        assert!(cmp.correct, "{:?}: {}", layout, cmp);
    }
}

#[test]
fn test_real_reference_round_trip() {
    let (n, batch) = (32, 4);
    for layout in all_layouts() {
        let forward = BatchPrdftProblem::new("b1prdft", n, batch, layout, Direction::Forward).unwrap();
        // The inverse reads what the forward wrote.
        let back_layout = BatchLayout::new(layout.write, layout.read);
        let inverse =
            BatchPrdftProblem::new("ib1prdft", n, batch, back_layout, Direction::Inverse).unwrap();
        let mut f = ReferenceBatchPrdft::new(forward).unwrap();
        let mut i = ReferenceBatchPrdft::new(inverse).unwrap();

        let x: Vec<f64> = test_signal(n * batch).iter().map(|c| c.im).collect();
        let mut spectrum = vec![0.0; 2 * (n / 2 + 1) * batch];
        let mut back = vec![0.0; x.len()];
        f.transform(&mut [&mut spectrum[..]], &[&x[..]], &[]).unwrap();
        i.transform(&mut [&mut back[..]], &[&spectrum[..]], &[]).unwrap();

        let normalized: Vec<f64> = back.iter().map(|v| v / n as f64).collect();
        let cmp = compare_real(&normalized, &x, DEFAULT_TOLERANCE).unwrap();
        assert!(cmp.correct, "{:?}: {}", layout, cmp);
    }
}

// =============================================================================
// COMPILED BACKEND
// =============================================================================

/// Naive DFT of one length-8 complex signal, built against the generated
/// header so that any drift in the stub signatures fails to compile.
const NAIVE_DFT_SOURCE: &str = r#"
#include <math.h>
#include "b1dft.fftx.codegen.h"

static double twiddle_sign = 0.0;

void init_b1dft_spiral(void) { twiddle_sign = -1.0; }

void b1dft_spiral(double** Y, double** X, double** symvar) {
    const int n = 8;
    const double pi = 3.14159265358979323846;
    (void)symvar;
    for (int k = 0; k < n; k++) {
        double re = 0.0, im = 0.0;
        for (int j = 0; j < n; j++) {
            double t = twiddle_sign * 2.0 * pi * (double)((j * k) % n) / n;
            re += X[0][2 * j] * cos(t) - X[0][2 * j + 1] * sin(t);
            im += X[0][2 * j] * sin(t) + X[0][2 * j + 1] * cos(t);
        }
        Y[0][2 * k] = re;
        Y[0][2 * k + 1] = im;
    }
}

void destroy_b1dft_spiral(void) { twiddle_sign = 0.0; }
"#;

/// Build a shared library from `source` in `dir`, or None if no C compiler
/// is available.
fn build_shared_library(dir: &Path, source: &str) -> Option<std::path::PathBuf> {
    let src = dir.join("kernel.c");
    let lib = dir.join("libkernel.so");
    std::fs::write(&src, source).ok()?;
    let status = Command::new("cc")
        .arg("-shared")
        .arg("-fPIC")
        .arg("-O1")
        .arg("-I")
        .arg(dir)
        .arg("-o")
        .arg(&lib)
        .arg(&src)
        .arg("-lm")
        .status()
        .ok()?;
    status.success().then_some(lib)
}

#[test]
fn test_compiled_matches_reference() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let problem =
        BatchDftProblem::new("b1dft", 8, 1, BatchLayout::contiguous(), Direction::Forward).unwrap();
    let stub = problem.stub().unwrap();
    std::fs::write(dir.path().join(stub.file_name()), stub.render()).unwrap();

    let Some(lib) = build_shared_library(dir.path(), NAIVE_DFT_SOURCE) else {
        eprintln!("skipping: no C compiler available");
        return;
    };

    let mut compiled = unsafe { CompiledTransform::load(&lib, &stub) }.unwrap();
    assert_eq!(compiled.name(), "b1dft_spiral");
    let mut reference = ReferenceBatchDft::new(problem).unwrap();

    let x = interleave(&test_signal(8));
    let mut y_compiled = vec![0.0; 16];
    let mut y_reference = vec![0.0; 16];
    compiled.transform(&mut [&mut y_compiled[..]], &[&x[..]], &[]).unwrap();
    reference.transform(&mut [&mut y_reference[..]], &[&x[..]], &[]).unwrap();

    let cmp = compare_real(&y_compiled, &y_reference, 1e-9).unwrap();
    assert!(cmp.correct, "{}", cmp);
}

#[test]
fn test_compiled_requires_all_entry_points() {
    let dir = tempfile::tempdir().unwrap();
    let source = "void only_entry_spiral(double** Y, double** X, double** s) { (void)Y; (void)X; (void)s; }\n";
    let Some(lib) = build_shared_library(dir.path(), source) else {
        eprintln!("skipping: no C compiler available");
        return;
    };
    let stub = InterfaceStub::new("only_entry", DagKind::Batched).unwrap();
    let result = unsafe { CompiledTransform::load(&lib, &stub) };
    assert!(matches!(result, Err(FftxError::Library(_))));
}
