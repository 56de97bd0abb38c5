use crate::calculations::forward_pass::ForwardPass;
use crate::graph::TaskGraph;
use crate::task::Task;
use log::debug;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;

const EPSILON: f64 = 1e-9;

/// Iterations are processed in batches so a cancelled run stops promptly
/// without checking the flag on every sample.
const BATCH_SIZE: usize = 128;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub iterations: usize,
    /// Fixed seed for reproducible runs; a random seed is drawn when absent.
    pub seed: Option<u64>,
    /// Fallback spread for tasks without a three-point estimate: durations
    /// sample uniformly within this fraction of the deterministic duration.
    pub variance_fraction: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: None,
            variance_fraction: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DurationSampler {
    Fixed(f64),
    Triangular { min: f64, mode: f64, max: f64 },
    Uniform { min: f64, max: f64 },
}

impl DurationSampler {
    fn for_task(task: &Task, variance_fraction: f64) -> Self {
        if let Some(estimate) = &task.estimate {
            if estimate.spread() <= EPSILON {
                DurationSampler::Fixed(estimate.most_likely)
            } else {
                DurationSampler::Triangular {
                    min: estimate.optimistic,
                    mode: estimate.most_likely,
                    max: estimate.pessimistic,
                }
            }
        } else {
            let duration = task.duration_days as f64;
            let band = duration * variance_fraction;
            if band <= EPSILON {
                DurationSampler::Fixed(duration)
            } else {
                DurationSampler::Uniform {
                    min: duration - band,
                    max: duration + band,
                }
            }
        }
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        match *self {
            DurationSampler::Fixed(value) => value,
            DurationSampler::Uniform { min, max } => rng.random_range(min..=max),
            DurationSampler::Triangular { min, mode, max } => {
                // Inverse transform over the triangular CDF.
                let u: f64 = rng.random();
                let fc = (mode - min) / (max - min);
                if u < fc {
                    min + (u * (max - min) * (mode - min)).sqrt()
                } else {
                    max - ((1.0 - u) * (max - min) * (max - mode)).sqrt()
                }
            }
        }
    }
}

/// Distribution of simulated project durations.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutcome {
    pub iterations: usize,
    pub mean_duration: f64,
    pub std_dev: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    #[serde(skip)]
    samples: Vec<f64>,
}

impl SimulationOutcome {
    fn from_samples(mut samples: Vec<f64>) -> Self {
        samples.sort_by(f64::total_cmp);
        let n = samples.len();
        let mean = if n == 0 {
            0.0
        } else {
            samples.iter().sum::<f64>() / n as f64
        };
        let variance = if n == 0 {
            0.0
        } else {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64
        };

        let mut outcome = Self {
            iterations: n,
            mean_duration: mean,
            std_dev: variance.sqrt(),
            p10: 0.0,
            p50: 0.0,
            p90: 0.0,
            samples,
        };
        outcome.p10 = outcome.percentile(0.10);
        outcome.p50 = outcome.percentile(0.50);
        outcome.p90 = outcome.percentile(0.90);
        outcome
    }

    /// Percentile over the sorted samples, linearly interpolated between
    /// ranks.
    pub fn percentile(&self, quantile: f64) -> f64 {
        let n = self.samples.len();
        if n == 0 {
            return 0.0;
        }
        let rank = quantile.clamp(0.0, 1.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = rank.ceil() as usize;
        if lower == upper {
            return self.samples[lower];
        }
        let fraction = rank - lower as f64;
        self.samples[lower] + fraction * (self.samples[upper] - self.samples[lower])
    }

    /// Fraction of simulated durations at or under the given span. This is
    /// the on-time probability when called with the planned duration.
    pub fn probability_not_exceeding(&self, duration_days: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let within = self.samples.partition_point(|&s| s <= duration_days);
        within as f64 / self.samples.len() as f64
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}

fn iteration_seed(base: u64, index: u64) -> u64 {
    // splitmix64 step: decorrelates consecutive iteration indices so every
    // iteration owns an independent deterministic stream.
    let mut z = base.wrapping_add(index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn run_simulation(
    tasks: &[Task],
    graph: &TaskGraph,
    config: &SimulationConfig,
    cancel: Option<&AtomicBool>,
) -> Option<SimulationOutcome> {
    let samplers: Vec<(i32, DurationSampler)> = tasks
        .iter()
        .map(|task| (task.id, DurationSampler::for_task(task, config.variance_fraction)))
        .collect();
    let forward = ForwardPass::new(graph);
    let base_seed = config.seed.unwrap_or_else(rand::random);

    let mut samples = Vec::with_capacity(config.iterations);
    let mut next = 0usize;
    while next < config.iterations {
        if let Some(flag) = cancel {
            if flag.load(Ordering::Relaxed) {
                return None;
            }
        }
        let upper = (next + BATCH_SIZE).min(config.iterations);
        let batch: Vec<f64> = (next..upper)
            .into_par_iter()
            .map(|iteration| {
                let mut rng = StdRng::seed_from_u64(iteration_seed(base_seed, iteration as u64));
                let durations: HashMap<i32, f64> = samplers
                    .iter()
                    .map(|(id, sampler)| (*id, sampler.sample(&mut rng)))
                    .collect();
                forward.total_duration_with(&durations)
            })
            .collect();
        samples.extend(batch);
        next = upper;
    }

    Some(SimulationOutcome::from_samples(samples))
}

/// Blocking simulation for callers that do not need the background runner.
pub fn simulate(tasks: &[Task], graph: &TaskGraph, config: &SimulationConfig) -> SimulationOutcome {
    run_simulation(tasks, graph, config, None)
        .unwrap_or_else(|| SimulationOutcome::from_samples(Vec::new()))
}

/// Handle on an in-flight simulation run. Dropping the handle leaves the
/// worker running to completion; cancelling stops it at the next batch
/// boundary. A cancelled or superseded run yields `None`, never a stale
/// outcome.
#[derive(Debug)]
pub struct SimulationHandle {
    cancel: Arc<AtomicBool>,
    receiver: mpsc::Receiver<SimulationOutcome>,
}

impl SimulationHandle {
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Non-blocking poll for a completed outcome.
    pub fn try_outcome(&self) -> Option<SimulationOutcome> {
        self.receiver.try_recv().ok()
    }

    /// Blocks until the run completes or is cancelled. `None` means the run
    /// was cancelled or superseded. The outcome is delivered once; later
    /// calls return `None`.
    pub fn wait(&self) -> Option<SimulationOutcome> {
        self.receiver.recv().ok()
    }
}

/// Spawns simulation runs on a background thread. Submitting a new run
/// cancels and supersedes any run still in flight, so results never arrive
/// out of order.
pub struct SimulationRunner {
    run_counter: AtomicU64,
    in_flight: Mutex<Option<Arc<AtomicBool>>>,
}

impl SimulationRunner {
    pub fn new() -> Self {
        Self {
            run_counter: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    pub fn submit(
        &self,
        tasks: &[Task],
        graph: &TaskGraph,
        config: SimulationConfig,
    ) -> SimulationHandle {
        let cancel = Arc::new(AtomicBool::new(false));
        {
            let mut slot = self.in_flight.lock();
            if let Some(previous) = slot.replace(Arc::clone(&cancel)) {
                previous.store(true, Ordering::Relaxed);
            }
        }

        let run = self.run_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let (sender, receiver) = mpsc::channel();
        let flag = Arc::clone(&cancel);
        let tasks = tasks.to_vec();
        let graph = graph.clone();
        thread::spawn(move || {
            debug!(
                "simulation run {run} started ({} iterations)",
                config.iterations
            );
            match run_simulation(&tasks, &graph, &config, Some(&flag)) {
                Some(outcome) => {
                    debug!(
                        "simulation run {run} completed (mean {:.1} days)",
                        outcome.mean_duration
                    );
                    // The receiver may be gone if the handle was dropped.
                    let _ = sender.send(outcome);
                }
                None => debug!("simulation run {run} cancelled"),
            }
        });

        SimulationHandle { cancel, receiver }
    }
}

impl Default for SimulationRunner {
    fn default() -> Self {
        Self::new()
    }
}
