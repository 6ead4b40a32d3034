//! Plans a forward transform, feeds it a pure tone and prints the spectrum.
//!
//! Run with `RUST_LOG=debug` to see plan creation and destruction.
use std::f32::consts::PI;

use fftplan::{alloc_1d, plan_dft_1d, stats, Complex32, Direction, Flag};

fn main() -> fftplan::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let n = 8;
    let mut input = alloc_1d(n)?;
    let mut output = alloc_1d(n)?;
    let mut plan = plan_dft_1d(&mut input, &mut output, Direction::Forward, Flag::Estimate)?;

    for (j, x) in input.iter_mut().enumerate() {
        *x = Complex32::new((2.0 * PI * j as f32 / n as f32).cos(), 0.0);
    }
    plan.execute_new_array(&mut input, &mut output)?;

    println!("engine: {}", fftplan::engine());
    for (k, bin) in output.iter().enumerate() {
        println!("bin {}: {:>8.4} {:+.4}i  |{:.4}|", k, bin.re, bin.im, bin.norm());
    }

    plan.destroy();
    log::info!("{:?}", stats());
    Ok(())
}
