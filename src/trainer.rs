//! Multi-threaded mini-batch training and evaluation
//!
//! Each batch is split into partitions of `ceil(train_batch_size /
//! num_threads)` samples. Every partition becomes one pool job that reads a
//! shared `Arc<NeuralNetwork>` snapshot and returns its own gradient sums
//! and [`Stats`]. The calling thread waits for all of them, adds them up and
//! applies one update. That wait is the only synchronization point; no job
//! ever writes to the network.

use std::fmt;
use std::sync::Arc;

use crate::config::TrainParameters;
use crate::error::{NetworkError, Result};
use crate::io::{Sample, SampleSource};
use crate::layers::LayerGradients;
use crate::matrix::Matrix;
use crate::network::NeuralNetwork;
use crate::pool::WorkerPool;

/// Running accuracy and cost totals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub correct: u64,
    pub total: u64,
    /// Sum of the per-sample cost.
    pub cost: f64,
}

impl Stats {
    pub fn record(&mut self, correct: bool, cost: f64) {
        self.correct += u64::from(correct);
        self.total += 1;
        self.cost += cost;
    }

    pub fn merge(&mut self, other: &Stats) {
        self.correct += other.correct;
        self.total += other.total;
        self.cost += other.cost;
    }

    /// Fraction of correct classifications, 0 when nothing was recorded.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    pub fn mean_cost(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.cost / self.total as f64
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "correct: {}/{} accuracy: {:.4} mean_cost: {:.6}",
            self.correct,
            self.total,
            self.accuracy(),
            self.mean_cost()
        )
    }
}

/// What one training job hands back.
#[derive(Debug, Clone)]
pub struct PartitionOutput {
    pub stats: Stats,
    /// Gradients summed over the partition, one pair per layer.
    pub gradients: Vec<LayerGradients>,
}

/// Summary passed to the per-epoch callback of [`Trainer::train`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// 1-based epoch number.
    pub epoch: usize,
    pub train: Stats,
    pub test: Option<Stats>,
}

/// Scale the raw input and build the one-hot expected row.
fn prepare_sample(sample: &Sample, output_width: usize, input_scale: f64) -> (Matrix, Matrix) {
    let input = sample.input.map(|x| x / input_scale);
    let expected = Matrix::one_hot(output_width, sample.label as usize);
    (input, expected)
}

/// Forward and backward pass over `samples`, summing gradients locally.
///
/// Only reads `network`.
pub fn train_partition(
    network: &NeuralNetwork,
    samples: &[Sample],
    params: &TrainParameters,
) -> PartitionOutput {
    let mut stats = Stats::default();
    let mut gradients = network.zero_gradients();

    for sample in samples {
        let (input, expected) = prepare_sample(sample, network.output_size(), params.input_scale);
        let (output, mut cache) = network.feed_forward(&input);
        stats.record(
            output.classify() == sample.label as usize,
            params.cost.total(&output, &expected),
        );
        for (acc, grad) in gradients
            .iter_mut()
            .zip(network.back_propagate(&mut cache, params.cost, &expected))
        {
            *acc += &grad;
        }
    }

    PartitionOutput { stats, gradients }
}

/// Inference-only accuracy and cost over `samples`.
pub fn evaluate_partition(
    network: &NeuralNetwork,
    samples: &[Sample],
    params: &TrainParameters,
) -> Stats {
    let mut stats = Stats::default();
    for sample in samples {
        let (input, expected) = prepare_sample(sample, network.output_size(), params.input_scale);
        let output = network.infer(&input);
        stats.record(
            output.classify() == sample.label as usize,
            params.cost.total(&output, &expected),
        );
    }
    stats
}

/// Split `batch` into chunks of `ceil(batch_size / workers)` samples.
///
/// The last chunk may be shorter.
pub fn partition(mut batch: Vec<Sample>, batch_size: usize, workers: usize) -> Vec<Vec<Sample>> {
    let ideal = batch_size.div_ceil(workers.max(1)).max(1);
    let mut partitions = Vec::with_capacity(batch.len().div_ceil(ideal));
    while !batch.is_empty() {
        let take = ideal.min(batch.len());
        let rest = batch.split_off(take);
        partitions.push(std::mem::replace(&mut batch, rest));
    }
    partitions
}

fn check_batch(network: &NeuralNetwork, batch: &[Sample]) -> Result<()> {
    for sample in batch {
        if sample.label as usize >= network.output_size() {
            return Err(NetworkError::LabelOutOfRange {
                label: sample.label,
                width: network.output_size(),
            });
        }
        if sample.input.shape() != (1, network.input_size()) {
            return Err(NetworkError::dimension_mismatch(format!(
                "sample input is {}x{}, network expects 1x{}",
                sample.input.rows(),
                sample.input.cols(),
                network.input_size()
            )));
        }
    }
    Ok(())
}

/// Drives training and evaluation on a private worker pool.
pub struct Trainer {
    params: Arc<TrainParameters>,
    pool: WorkerPool,
}

impl Trainer {
    pub fn new(params: TrainParameters) -> Result<Self> {
        params.validate()?;
        if params.num_threads > params.train_batch_size {
            tracing::warn!(
                num_threads = params.num_threads,
                train_batch_size = params.train_batch_size,
                "more threads than samples per batch; some workers will stay idle"
            );
        }
        let pool = WorkerPool::new(params.num_threads)?;
        Ok(Self {
            params: Arc::new(params),
            pool,
        })
    }

    pub fn params(&self) -> &TrainParameters {
        &self.params
    }

    /// Train on one batch and apply a single update.
    pub fn train_batch(&self, network: &mut Arc<NeuralNetwork>, batch: Vec<Sample>) -> Result<Stats> {
        if batch.is_empty() {
            return Ok(Stats::default());
        }
        check_batch(network, &batch)?;
        let partitions = partition(batch, self.params.train_batch_size, self.pool.size());
        let partition_count = partitions.len();

        let handles = partitions
            .into_iter()
            .map(|samples| {
                let snapshot = Arc::clone(network);
                let params = Arc::clone(&self.params);
                self.pool
                    .submit(move || train_partition(&snapshot, &samples, &params))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut gradients = network.zero_gradients();
        let mut stats = Stats::default();
        for handle in handles {
            let output = handle.wait()?;
            stats.merge(&output.stats);
            for (acc, grad) in gradients.iter_mut().zip(&output.gradients) {
                *acc += grad;
            }
        }

        // Every job has finished, so this is normally the only reference.
        Arc::make_mut(network).apply_gradients(gradients, &self.params);
        tracing::debug!(partitions = partition_count, %stats, "batch applied");
        Ok(stats)
    }

    /// One pass over `source` from its current position to the end.
    pub fn train_epoch(
        &self,
        network: &mut Arc<NeuralNetwork>,
        source: &mut dyn SampleSource,
    ) -> Result<Stats> {
        let mut epoch_stats = Stats::default();
        loop {
            let batch = source.next_batch(self.params.train_batch_size)?;
            if batch.is_empty() {
                break;
            }
            let batch_stats = self.train_batch(network, batch)?;
            epoch_stats.merge(&batch_stats);
        }
        Ok(epoch_stats)
    }

    /// Read-only evaluation over `source` from its current position.
    pub fn test(&self, network: &Arc<NeuralNetwork>, source: &mut dyn SampleSource) -> Result<Stats> {
        let mut total = Stats::default();
        loop {
            let batch = source.next_batch(self.params.test_batch_size)?;
            if batch.is_empty() {
                break;
            }
            check_batch(network, &batch)?;
            let handles = partition(batch, self.params.test_batch_size, self.pool.size())
                .into_iter()
                .map(|samples| {
                    let snapshot = Arc::clone(network);
                    let params = Arc::clone(&self.params);
                    self.pool
                        .submit(move || evaluate_partition(&snapshot, &samples, &params))
                })
                .collect::<Result<Vec<_>>>()?;
            for handle in handles {
                total.merge(&handle.wait()?);
            }
        }
        tracing::info!(%total, "test");
        Ok(total)
    }

    /// Run `num_epochs` epochs, rewinding the sources after each pass.
    ///
    /// `on_epoch` sees every epoch's report and the updated network; an
    /// error from it stops training.
    pub fn train<F>(
        &self,
        network: NeuralNetwork,
        train_source: &mut dyn SampleSource,
        mut test_source: Option<&mut dyn SampleSource>,
        mut on_epoch: F,
    ) -> Result<NeuralNetwork>
    where
        F: FnMut(&EpochReport, &NeuralNetwork) -> Result<()>,
    {
        tracing::info!(params = %self.params, "training started");
        let mut network = Arc::new(network);

        for epoch in 1..=self.params.num_epochs {
            let train = self.train_epoch(&mut network, train_source)?;
            train_source.reset()?;
            tracing::info!(epoch, %train, "epoch finished");

            let test = match test_source.as_deref_mut() {
                Some(source) => {
                    let stats = self.test(&network, source)?;
                    source.reset()?;
                    Some(stats)
                }
                None => None,
            };

            on_epoch(&EpochReport { epoch, train, test }, &*network)?;
        }

        Ok(Arc::try_unwrap(network).unwrap_or_else(|shared| (*shared).clone()))
    }
}
