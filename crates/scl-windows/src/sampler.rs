use std::collections::VecDeque;

use scl_schemas::{Bar, SamplingMode, WindowSamplingConfig};

use crate::{window_stats, WindowDef, WindowStats};

/// FNV-1a, 32-bit. The sampler's only tie-breaker; seeded through the input
/// string so different arenas shuffle differently but identically per seed.
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 16_777_619;

    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

fn seeded_hash(seed: &str, tag: &str) -> u32 {
    fnv1a32(format!("{seed}:{tag}").as_bytes())
}

/// Select the round's window subset.
///
/// Deterministic for identical `(windows, bars, cfg, target, seed)`:
/// - `target <= 0` selects nothing; `|windows| <= target` selects everything
///   in enumeration order.
/// - `sequential` takes the first `target` windows.
/// - `stratified` takes the top-volatility stress windows first, then
///   round-robins across hash-ordered (volatility, trend, volume) bucket
///   groups of the remainder.
pub fn select_windows(
    windows: &[WindowDef],
    bars: &[Bar],
    cfg: &WindowSamplingConfig,
    target: usize,
    seed: &str,
) -> Vec<WindowDef> {
    if target == 0 {
        return Vec::new();
    }
    if windows.len() <= target {
        return windows.to_vec();
    }

    match cfg.mode {
        SamplingMode::Sequential => windows[..target].to_vec(),
        SamplingMode::Stratified => select_stratified(windows, bars, cfg, target, seed),
    }
}

fn select_stratified(
    windows: &[WindowDef],
    bars: &[Bar],
    cfg: &WindowSamplingConfig,
    target: usize,
    seed: &str,
) -> Vec<WindowDef> {
    let stats: Vec<WindowStats> = windows
        .iter()
        .map(|w| window_stats(&bars[w.start_bar..w.end_bar]))
        .collect();

    // Stress: highest volatility first, hash tie-break.
    let stress_n = cfg.stress_count.min(target).min(windows.len());
    let mut by_vol: Vec<usize> = (0..windows.len()).collect();
    by_vol.sort_by(|&a, &b| {
        stats[b]
            .volatility
            .total_cmp(&stats[a].volatility)
            .then_with(|| {
                seeded_hash(seed, &windows[a].id).cmp(&seeded_hash(seed, &windows[b].id))
            })
    });
    let stress: Vec<usize> = by_vol[..stress_n].to_vec();

    // Composite bucket key per window, ranked over the full candidate set.
    let vol_bucket = axis_buckets(&stats, cfg.volatility_buckets, |s| s.volatility);
    let trend_bucket = axis_buckets(&stats, cfg.trend_buckets, |s| s.trend);
    let volume_bucket = axis_buckets(&stats, cfg.volume_buckets, |s| s.mean_volume);

    // Group the non-stress remainder; order inside each group and the group
    // list itself by the seeded hash.
    let mut is_stress = vec![false; windows.len()];
    for &i in &stress {
        is_stress[i] = true;
    }

    let mut groups: Vec<((usize, usize, usize), Vec<usize>)> = Vec::new();
    for i in 0..windows.len() {
        if is_stress[i] {
            continue;
        }
        let key = (vol_bucket[i], trend_bucket[i], volume_bucket[i]);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(i),
            None => groups.push((key, vec![i])),
        }
    }
    for (_, members) in groups.iter_mut() {
        members.sort_by_key(|&i| seeded_hash(seed, &windows[i].id));
    }
    groups.sort_by_key(|(key, _)| seeded_hash(seed, &format!("{key:?}")));

    // Stress first, then round-robin across group order.
    let mut selected: Vec<WindowDef> = stress.iter().map(|&i| windows[i].clone()).collect();
    let mut queues: Vec<VecDeque<usize>> = groups
        .into_iter()
        .map(|(_, members)| members.into())
        .collect();
    'outer: loop {
        let mut popped_any = false;
        for q in queues.iter_mut() {
            if selected.len() >= target {
                break 'outer;
            }
            if let Some(i) = q.pop_front() {
                selected.push(windows[i].clone());
                popped_any = true;
            }
        }
        if !popped_any {
            break;
        }
    }

    selected
}

/// `bucket = min(B - 1, floor(rank * B / n))` with rank taken over the
/// axis-sorted candidate list (stable for equal values).
fn axis_buckets(stats: &[WindowStats], buckets: usize, axis: impl Fn(&WindowStats) -> f64) -> Vec<usize> {
    let n = stats.len();
    let b = buckets.max(1);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&x, &y| axis(&stats[x]).total_cmp(&axis(&stats[y])));

    let mut out = vec![0usize; n];
    for (rank, &i) in order.iter().enumerate() {
        out[i] = (rank * b / n).min(b - 1);
    }
    out
}
