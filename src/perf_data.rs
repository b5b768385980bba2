use crate::perf::Series;

/// Floyd-Warshall speedups recorded on 1000 nodes with 50% edge probability.
pub const THREADS: [u32; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
pub const SPEEDUPS: [f64; 8] = [1.00564, 1.91536, 2.75457, 3.68615, 3.83974, 4.25977, 4.43579, 4.64856];

pub fn recorded_series() -> Series {
    Series::new(&THREADS, &SPEEDUPS)
        .unwrap_or_else(|e| unreachable!("recorded speedups are well formed: {e}"))
}
