use fftplan::{
    alloc_1d, alloc_2d, alloc_3d, alloc_real_1d, alloc_real_2d, alloc_real_3d, plan_dft_1d,
    plan_dft_2d, plan_dft_3d, plan_dft_c2r_1d, plan_dft_c2r_2d, plan_dft_c2r_3d, plan_dft_r2c_1d,
    plan_dft_r2c_2d, AlignedBuf, Complex32, Direction, FftError, Flag,
};
use proptest::prelude::*;
use std::f32::consts::PI;

fn assert_close(a: Complex32, b: Complex32, tol: f32) {
    assert!(
        (a - b).norm() <= tol,
        "expected {} but got {} (tolerance {})",
        b,
        a,
        tol
    );
}

fn fill_signal(buf: &mut AlignedBuf<Complex32>, seed: f32) {
    for (i, x) in buf.iter_mut().enumerate() {
        let t = i as f32 + seed;
        *x = Complex32::new((0.37 * t).sin(), (1.3 * t).cos() * 0.5);
    }
}

/// Forward then backward, scaled by 1/n, for a complex buffer of any rank.
fn c2c_round_trip(dims: &[usize]) {
    let mut data = AlignedBuf::<Complex32>::with_dims(dims).unwrap();
    let mut spectrum = AlignedBuf::<Complex32>::with_dims(dims).unwrap();
    let mut back = AlignedBuf::<Complex32>::with_dims(dims).unwrap();

    let planner = match dims.len() {
        1 => plan_dft_1d,
        2 => plan_dft_2d,
        _ => plan_dft_3d,
    };
    let mut forward = planner(&mut data, &mut spectrum, Direction::Forward, Flag::Estimate).unwrap();
    let mut backward =
        planner(&mut spectrum, &mut back, Direction::Backward, Flag::Estimate).unwrap();

    fill_signal(&mut data, 0.25);
    forward.execute_new_array(&mut data, &mut spectrum).unwrap();
    backward.execute_new_array(&mut spectrum, &mut back).unwrap();

    let n = data.len() as f32;
    for (got, want) in back.iter().zip(data.iter()) {
        assert_close(*got / n, *want, 1e-4);
    }
}

#[test]
fn test_c2c_1d_round_trip() {
    for n in [1, 2, 3, 7, 8, 64, 100, 257] {
        c2c_round_trip(&[n]);
    }
}

#[test]
fn test_c2c_2d_and_3d_round_trip() {
    c2c_round_trip(&[4, 6]);
    c2c_round_trip(&[1, 9]);
    c2c_round_trip(&[5, 1]);
    c2c_round_trip(&[2, 3, 4]);
    c2c_round_trip(&[3, 1, 5]);
}

#[test]
fn test_pure_tone_scenario() {
    let n = 8;
    let mut input = alloc_1d(n).unwrap();
    let mut output = alloc_1d(n).unwrap();
    let mut plan = plan_dft_1d(&mut input, &mut output, Direction::Forward, Flag::Estimate).unwrap();

    for (j, x) in input.iter_mut().enumerate() {
        *x = Complex32::new((2.0 * PI * j as f32 / n as f32).cos(), 0.0);
    }
    // Safety: both planned buffers are alive and not otherwise borrowed.
    unsafe { plan.execute().unwrap() };

    for (k, bin) in output.iter().enumerate() {
        if k == 1 || k == n - 1 {
            assert_close(*bin, Complex32::new(4.0, 0.0), 1e-4);
        } else {
            assert!(bin.norm() < 1e-4, "bin {} leaked {}", k, bin);
        }
    }
}

#[test]
fn test_c2c_leaves_input_intact() {
    let mut input = alloc_1d(12).unwrap();
    let mut output = alloc_1d(12).unwrap();
    let mut plan = plan_dft_1d(&mut input, &mut output, Direction::Forward, Flag::Estimate).unwrap();

    fill_signal(&mut input, 3.0);
    let before = input.to_vec();
    plan.execute_new_array(&mut input, &mut output).unwrap();
    assert_eq!(input.to_vec(), before);
}

#[test]
fn test_2d_axes_follow_row_major_layout() {
    // An impulse at (0, 1) transforms to exp(-2πi k1 / n1), independent of k0.
    let (n0, n1) = (3, 5);
    let mut input = alloc_2d(n0, n1).unwrap();
    let mut output = alloc_2d(n0, n1).unwrap();
    let mut plan = plan_dft_2d(&mut input, &mut output, Direction::Forward, Flag::Estimate).unwrap();

    *input.at_mut(&[0, 1]) = Complex32::new(1.0, 0.0);
    plan.execute_new_array(&mut input, &mut output).unwrap();

    for k0 in 0..n0 {
        for k1 in 0..n1 {
            let expected = Complex32::from_polar(1.0, -2.0 * PI * k1 as f32 / n1 as f32);
            assert_close(*output.at(&[k0, k1]), expected, 1e-5);
        }
    }
}

#[test]
fn test_3d_impulse_on_outer_axis() {
    // An impulse at (1, 0, 0) transforms to exp(-2πi k0 / n0).
    let (n0, n1, n2) = (4, 2, 3);
    let mut input = alloc_3d(n0, n1, n2).unwrap();
    let mut output = alloc_3d(n0, n1, n2).unwrap();
    let mut plan = plan_dft_3d(&mut input, &mut output, Direction::Forward, Flag::Estimate).unwrap();

    input.slab_mut(1).row_mut(0)[0] = Complex32::new(1.0, 0.0);
    unsafe { plan.execute().unwrap() };

    for k0 in 0..n0 {
        let expected = Complex32::from_polar(1.0, -2.0 * PI * k0 as f32 / n0 as f32);
        for row in output.slab(k0).rows() {
            for bin in row {
                assert_close(*bin, expected, 1e-5);
            }
        }
    }
}

#[test]
fn test_alloc_2d_contiguity() {
    let (n0, n1) = (4, 6);
    let mut buf = alloc_2d(n0, n1).unwrap();
    assert_eq!(buf.rows().count(), n0);
    assert!(buf.rows().all(|row| row.len() == n1));

    for i in 0..n0 - 1 {
        let marker = Complex32::new(i as f32, -1.0);
        buf.row_mut(i + 1)[0] = marker;
        assert_eq!(buf[i * n1 + n1], marker);

        let end_of_row = &buf.row(i)[n1 - 1] as *const Complex32;
        let start_of_next = &buf.row(i + 1)[0] as *const Complex32;
        assert_eq!(unsafe { end_of_row.add(1) }, start_of_next);
    }
}

#[test]
fn test_r2c_then_c2r_scales_by_n() {
    for n in [1, 2, 5, 16, 33] {
        let mut signal = alloc_real_1d(n).unwrap();
        let mut spectrum = alloc_1d(n / 2 + 1).unwrap();
        let mut restored = alloc_real_1d(n).unwrap();

        let mut r2c = plan_dft_r2c_1d(&mut signal, &mut spectrum, Flag::Estimate).unwrap();
        let mut c2r = plan_dft_c2r_1d(&mut spectrum, &mut restored, Flag::Estimate).unwrap();

        for (i, x) in signal.iter_mut().enumerate() {
            *x = (i as f32 * 0.7).sin() + 0.25;
        }
        unsafe {
            r2c.execute().unwrap();
            c2r.execute().unwrap();
        }

        for (got, want) in restored.iter().zip(signal.iter()) {
            assert!(
                (got - want * n as f32).abs() < 1e-3 * n as f32,
                "n={}: {} vs {}",
                n,
                got,
                want * n as f32
            );
        }
    }
}

#[test]
fn test_c2r_consumes_input_so_refill_first() {
    let n = 32;
    let mut signal = alloc_real_1d(n).unwrap();
    let mut spectrum = alloc_1d(n / 2 + 1).unwrap();
    let mut out = alloc_real_1d(n).unwrap();

    let mut r2c = plan_dft_r2c_1d(&mut signal, &mut spectrum, Flag::Estimate).unwrap();
    let mut c2r = plan_dft_c2r_1d(&mut spectrum, &mut out, Flag::Estimate).unwrap();

    for (i, x) in signal.iter_mut().enumerate() {
        *x = (i as f32 * 0.3).cos();
    }

    // Two full round trips, re-running r2c before every c2r.
    for _ in 0..2 {
        r2c.execute_new_array(&mut signal, &mut spectrum).unwrap();
        c2r.execute_new_array(&mut spectrum, &mut out).unwrap();
        for (got, want) in out.iter().zip(signal.iter()) {
            assert!((got / n as f32 - want).abs() < 1e-4);
        }
    }
}

#[test]
fn test_r2c_2d_matches_half_of_c2c() {
    let (n0, n1) = (3, 6);
    let mut real = alloc_real_2d(n0, n1).unwrap();
    let mut half = alloc_2d(n0, n1 / 2 + 1).unwrap();
    let mut complex = alloc_2d(n0, n1).unwrap();
    let mut full = alloc_2d(n0, n1).unwrap();

    let mut r2c = plan_dft_r2c_2d(&mut real, &mut half, Flag::Estimate).unwrap();
    let mut c2c = plan_dft_2d(&mut complex, &mut full, Direction::Forward, Flag::Estimate).unwrap();

    for (i, (r, c)) in real.iter_mut().zip(complex.iter_mut()).enumerate() {
        *r = ((i * 7) % 5) as f32 - 2.0;
        *c = Complex32::new(*r, 0.0);
    }
    r2c.execute_new_array(&mut real, &mut half).unwrap();
    c2c.execute_new_array(&mut complex, &mut full).unwrap();

    for k0 in 0..n0 {
        for k1 in 0..n1 / 2 + 1 {
            assert_close(*half.at(&[k0, k1]), *full.at(&[k0, k1]), 1e-4);
        }
    }
}

#[test]
fn test_multi_dimensional_real_round_trip() {
    let mut real = alloc_real_3d(2, 3, 5).unwrap();
    let mut half = alloc_3d(2, 3, 3).unwrap();
    let mut back = alloc_real_3d(2, 3, 5).unwrap();

    let mut r2c = fftplan::plan_dft_r2c_3d(&mut real, &mut half, Flag::Estimate).unwrap();
    let mut c2r = plan_dft_c2r_3d(&mut half, &mut back, Flag::Estimate).unwrap();

    for (i, x) in real.iter_mut().enumerate() {
        *x = (i as f32).sqrt() - 1.5;
    }
    r2c.execute_new_array(&mut real, &mut half).unwrap();
    c2r.execute_new_array(&mut half, &mut back).unwrap();

    let n = real.len() as f32;
    for (got, want) in back.iter().zip(real.iter()) {
        assert!((got / n - want).abs() < 1e-4, "{} vs {}", got / n, want);
    }

    let mut real2 = alloc_real_2d(4, 4).unwrap();
    let mut half2 = alloc_2d(4, 3).unwrap();
    let mut back2 = alloc_real_2d(4, 4).unwrap();
    let mut r2c = plan_dft_r2c_2d(&mut real2, &mut half2, Flag::Estimate).unwrap();
    let mut c2r = plan_dft_c2r_2d(&mut half2, &mut back2, Flag::Estimate).unwrap();
    real2.fill(0.0);
    *real2.at_mut(&[1, 2]) = 1.0;
    r2c.execute_new_array(&mut real2, &mut half2).unwrap();
    c2r.execute_new_array(&mut half2, &mut back2).unwrap();
    assert!((back2.at(&[1, 2]) - 16.0).abs() < 1e-4);
    assert!(back2.at(&[2, 1]).abs() < 1e-4);
}

#[test]
fn test_execute_new_array_rejects_other_shapes() {
    let mut input = alloc_2d(4, 4).unwrap();
    let mut output = alloc_2d(4, 4).unwrap();
    let mut plan = plan_dft_2d(&mut input, &mut output, Direction::Forward, Flag::Estimate).unwrap();

    let mut other_in = alloc_2d(2, 8).unwrap();
    let mut other_out = alloc_2d(4, 4).unwrap();
    let err = plan
        .execute_new_array(&mut other_in, &mut other_out)
        .unwrap_err();
    assert!(matches!(err, FftError::ShapeMismatch { .. }));

    let mut same_in = alloc_2d(4, 4).unwrap();
    assert!(plan.execute_new_array(&mut same_in, &mut other_out).is_ok());
}

#[test]
fn test_measure_plan_then_fill() {
    let mut input = alloc_1d(64).unwrap();
    let mut output = alloc_1d(64).unwrap();
    let mut plan = plan_dft_1d(&mut input, &mut output, Direction::Forward, Flag::Measure).unwrap();

    // Measure may have scribbled over the buffers: fill after planning.
    input.fill(Complex32::new(1.0, 0.0));
    unsafe { plan.execute().unwrap() };
    assert_close(output[0], Complex32::new(64.0, 0.0), 1e-3);
    assert!(output[1..].iter().all(|bin| bin.norm() < 1e-3));
}

#[test]
fn test_plan_moves_across_threads() {
    let mut input = alloc_1d(16).unwrap();
    let mut output = alloc_1d(16).unwrap();
    let mut plan = plan_dft_1d(&mut input, &mut output, Direction::Forward, Flag::Estimate).unwrap();

    let handle = std::thread::spawn(move || {
        input.fill(Complex32::new(0.5, 0.0));
        plan.execute_new_array(&mut input, &mut output).unwrap();
        output[0]
    });
    assert_close(handle.join().unwrap(), Complex32::new(8.0, 0.0), 1e-4);
}

proptest! {
    #[test]
    fn prop_c2c_round_trip(signal in proptest::collection::vec((-100.0f32..100.0, -100.0f32..100.0), 1..96)) {
        let n = signal.len();
        let mut data = alloc_1d(n).unwrap();
        let mut spectrum = alloc_1d(n).unwrap();
        let mut back = alloc_1d(n).unwrap();
        let mut forward = plan_dft_1d(&mut data, &mut spectrum, Direction::Forward, Flag::Estimate).unwrap();
        let mut backward = plan_dft_1d(&mut spectrum, &mut back, Direction::Backward, Flag::Estimate).unwrap();

        for (x, &(re, im)) in data.iter_mut().zip(&signal) {
            *x = Complex32::new(re, im);
        }
        forward.execute_new_array(&mut data, &mut spectrum).unwrap();
        backward.execute_new_array(&mut spectrum, &mut back).unwrap();

        for (got, want) in back.iter().zip(data.iter()) {
            prop_assert!((*got / n as f32 - *want).norm() < 1e-2);
        }
    }

    #[test]
    fn prop_real_round_trip(signal in proptest::collection::vec(-100.0f32..100.0, 1..96)) {
        let n = signal.len();
        let mut real = alloc_real_1d(n).unwrap();
        let mut spectrum = alloc_1d(n / 2 + 1).unwrap();
        let mut back = alloc_real_1d(n).unwrap();
        let mut r2c = plan_dft_r2c_1d(&mut real, &mut spectrum, Flag::Estimate).unwrap();
        let mut c2r = plan_dft_c2r_1d(&mut spectrum, &mut back, Flag::Estimate).unwrap();

        real.copy_from_slice(&signal);
        r2c.execute_new_array(&mut real, &mut spectrum).unwrap();
        c2r.execute_new_array(&mut spectrum, &mut back).unwrap();

        for (got, want) in back.iter().zip(signal.iter()) {
            prop_assert!((got / n as f32 - want).abs() < 1e-2);
        }
    }
}
