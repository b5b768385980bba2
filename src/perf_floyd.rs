use parking_lot::RwLock;
use rand::Rng;
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};
use thousands::Separable;

use crate::error::PlotError;
use crate::perf::{Series, SeriesPoint};

/// Distance used for "no path".
pub const INF: u32 = 1_000_000_000;

/// Dense adjacency matrix of a weighted directed graph, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    nodes: usize,
    adj: Vec<u32>,
}

impl Graph {
    pub fn new(nodes: usize) -> Self {
        let mut adj = vec![INF; nodes * nodes];
        for i in 0..nodes {
            adj[i * nodes + i] = 0;
        }
        Self { nodes, adj }
    }

    /// Every ordered pair `i != j` gets an edge with the given probability,
    /// weighted uniformly in `1..=100`.
    pub fn random<R: Rng>(nodes: usize, probability: f64, rng: &mut R) -> Self {
        let mut graph = Self::new(nodes);
        for i in 0..nodes {
            for j in 0..nodes {
                if i != j && rng.gen_bool(probability) {
                    graph.add_edge(i, j, rng.gen_range(1..=100));
                }
            }
        }
        graph
    }

    pub fn add_edge(&mut self, src: usize, dest: usize, weight: u32) {
        self.adj[src * self.nodes + dest] = weight;
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    pub fn edges(&self) -> usize {
        self.adj.iter().filter(|&&d| d != 0 && d < INF).count()
    }
}

/// All-pairs shortest distances, row-major, `INF` where unreachable.
pub type Matrix = Vec<u32>;

/// Relax every row in `rows` through pivot `k`, whose row is `row_k`.
#[inline]
fn relax(rows: &mut [u32], row_k: &[u32], k: usize) {
    let n = row_k.len();
    for row in rows.chunks_mut(n) {
        let d_ik = row[k];
        if d_ik >= INF {
            continue;
        }
        for (d_ij, &d_kj) in row.iter_mut().zip(row_k) {
            if d_kj < INF {
                let through_k = d_ik + d_kj;
                if through_k < *d_ij {
                    *d_ij = through_k;
                }
            }
        }
    }
}

pub fn floyd_warshall_sequential(graph: &Graph) -> Matrix {
    let n = graph.nodes;
    let mut dist = graph.adj.clone();
    let mut row_k = vec![INF; n];

    for k in 0..n {
        // row k is a fixed point of pivot k, so a copy is as good as the original
        row_k.copy_from_slice(&dist[k * n..(k + 1) * n]);
        relax(&mut dist, &row_k, k);
    }

    dist
}

/// Same result as [`floyd_warshall_sequential`], with rows split into
/// contiguous blocks that `thread_count` workers relax in lock step.
pub fn floyd_warshall_parallel(graph: &Graph, thread_count: usize) -> Matrix {
    let n = graph.nodes;
    let mut dist = graph.adj.clone();
    if n == 0 {
        return dist;
    }

    let rows_per_worker = n.div_ceil(thread_count.max(1));
    let workers = n.div_ceil(rows_per_worker);

    let pivot = RwLock::new(vec![INF; n]);
    let barrier = Barrier::new(workers);

    thread::scope(|s| {
        for (w, block) in dist.chunks_mut(rows_per_worker * n).enumerate() {
            let pivot = &pivot;
            let barrier = &barrier;
            let first = w * rows_per_worker;
            let owned = first..first + block.len() / n;

            s.spawn(move || {
                for k in 0..n {
                    if owned.contains(&k) {
                        let local = k - first;
                        pivot.write().copy_from_slice(&block[local * n..(local + 1) * n]);
                    }
                    barrier.wait();

                    relax(block, &pivot.read(), k);

                    // nobody may publish pivot k + 1 while others still read pivot k
                    barrier.wait();
                }
            });
        }
    });

    dist
}

fn time<F: FnOnce() -> Matrix>(f: F) -> (Duration, Matrix) {
    let start = Instant::now();
    let dist = f();
    (start.elapsed(), dist)
}

/// Time the sequential run once, then the parallel run for `1..=max_threads`
/// threads, and report `sequential / parallel` for each.
pub fn measure_speedup(graph: &Graph, max_threads: u32) -> Result<Series, PlotError> {
    if max_threads == 0 {
        return Err(PlotError::InvalidInput(
            "at least one thread is needed".to_string(),
        ));
    }

    println!(
        "Graph generated with {} nodes and {} edges.",
        graph.nodes().separate_with_commas(),
        graph.edges().separate_with_commas()
    );

    let (sequential, expected) = time(|| floyd_warshall_sequential(graph));
    tracing::info!("sequential run took {:?}", sequential);

    let mut points = Vec::with_capacity(max_threads as usize);
    for threads in 1..=max_threads {
        let (parallel, dist) = time(|| floyd_warshall_parallel(graph, threads as usize));
        debug_assert_eq!(dist, expected, "{threads} threads");

        let speedup = sequential.as_secs_f64() / parallel.as_secs_f64().max(f64::EPSILON);
        println!("Threads: {:>3} Speedup: {:.5}", threads, speedup);
        tracing::debug!("{} threads took {:?}", threads, parallel);

        points.push(SeriesPoint { threads, speedup });
    }

    Series::from_points(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn at(dist: &Matrix, n: usize, i: usize, j: usize) -> u32 {
        dist[i * n + j]
    }

    #[test]
    fn finds_shortest_paths() {
        // 0 -> 1 -> 2 -> 3 is cheaper than the direct 0 -> 3 edge
        let mut graph = Graph::new(4);
        graph.add_edge(0, 1, 5);
        graph.add_edge(1, 2, 3);
        graph.add_edge(2, 3, 1);
        graph.add_edge(0, 3, 10);

        let dist = floyd_warshall_sequential(&graph);

        assert_eq!(at(&dist, 4, 0, 3), 9);
        assert_eq!(at(&dist, 4, 0, 2), 8);
        assert_eq!(at(&dist, 4, 3, 0), INF);
        assert_eq!(at(&dist, 4, 2, 2), 0);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut rng = SmallRng::seed_from_u64(7);
        let graph = Graph::random(37, 0.2, &mut rng);
        let expected = floyd_warshall_sequential(&graph);

        for threads in 1..=8 {
            assert_eq!(floyd_warshall_parallel(&graph, threads), expected, "{threads} threads");
        }
    }

    #[test]
    fn more_threads_than_rows() {
        let mut rng = SmallRng::seed_from_u64(3);
        let graph = Graph::random(3, 0.5, &mut rng);
        assert_eq!(floyd_warshall_parallel(&graph, 16), floyd_warshall_sequential(&graph));
    }

    #[test]
    fn empty_graph() {
        let graph = Graph::new(0);
        assert!(floyd_warshall_parallel(&graph, 4).is_empty());
        assert!(floyd_warshall_sequential(&graph).is_empty());
    }

    #[test]
    fn random_graph_respects_probability_bounds() {
        let mut rng = SmallRng::seed_from_u64(11);
        assert_eq!(Graph::random(20, 0.0, &mut rng).edges(), 0);
        assert_eq!(Graph::random(20, 1.0, &mut rng).edges(), 20 * 19);
    }

    #[test]
    fn measures_one_point_per_thread_count() {
        let mut rng = SmallRng::seed_from_u64(5);
        let graph = Graph::random(40, 0.5, &mut rng);

        let series = measure_speedup(&graph, 4).unwrap();

        let threads: Vec<u32> = series.points().iter().map(|p| p.threads).collect();
        assert_eq!(threads, vec![1, 2, 3, 4]);
        assert!(series.points().iter().all(|p| p.speedup.is_finite() && p.speedup > 0.0));
    }

    #[test]
    fn zero_threads_is_invalid() {
        let graph = Graph::new(2);
        assert!(matches!(measure_speedup(&graph, 0), Err(PlotError::InvalidInput(_))));
    }
}
