// Reports how many table slots hold a zero fingerprint, overall and in the
// densest/sparsest 2000-slot windows. Zero-heavy regions inflate the false
// positive rate for keys whose own fingerprint is zero; rebuild with
// `--features binfuse/uniform-random` to compare profiles.

use binfuse::{BinaryFuse16, BinaryFuse8, Filter};
use core::convert::TryFrom;
use rand::Rng;

const SIZE: usize = 1_000_000;
const WINDOW: usize = 2000;

fn random_keys() -> Vec<u64> {
    let mut rng = rand::thread_rng();
    (0..SIZE).map(|_| rng.gen()).collect()
}

fn report(name: &str, zero_flags: &[bool], slots: usize) {
    let total: usize = zero_flags.iter().filter(|&&z| z).count();

    let mut in_window: usize = zero_flags[..WINDOW].iter().filter(|&&z| z).count();
    let (mut min_window, mut max_window) = (in_window, in_window);
    for i in WINDOW..zero_flags.len() {
        in_window += zero_flags[i] as usize;
        in_window -= zero_flags[i - WINDOW] as usize;
        min_window = min_window.min(in_window);
        max_window = max_window.max(in_window);
    }

    println!(
        "{name}: {slots} slots, {total} zero ({:.3}%), per {WINDOW}-slot window min {min_window} max {max_window}",
        total as f64 * 100.0 / slots as f64,
    );
}

fn main() {
    let filter = BinaryFuse8::try_from(random_keys()).unwrap();
    let zeroes: Vec<bool> = filter.fingerprints.iter().map(|&fp| fp == 0).collect();
    report("BinaryFuse8", &zeroes, filter.len());

    let filter = BinaryFuse16::try_from(random_keys()).unwrap();
    let zeroes: Vec<bool> = filter.fingerprints.iter().map(|&fp| fp == 0).collect();
    report("BinaryFuse16", &zeroes, filter.len());
}
