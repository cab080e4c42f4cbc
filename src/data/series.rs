use std::marker::PhantomData;
use std::sync::Arc;

use burn::config::Config;
use burn::data::dataloader::batcher::Batcher;
use burn::data::dataloader::{DataLoader, DataLoaderBuilder, DataLoaderIterator, Progress};
use burn::data::dataset::InMemDataset;
use burn::tensor::backend::Backend;
use burn::tensor::{Data, Shape, Tensor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::batch::WindowBatch;
use crate::error::ConfigError;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WindowSample {
    pub window: Vec<Vec<f32>>, // [T][F]
    pub target: f32,
}

pub struct TimeSeries {
    columns: Vec<String>,
    rows: Vec<Vec<f32>>,
    target: usize,
}

impl TimeSeries {
    // Rows come in newest-first, the way market data exports usually do. They
    // are reversed exactly once here; every index afterwards ascends in time.
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Vec<f32>>,
        target: &str,
    ) -> Result<Self, ConfigError> {
        let target = columns
            .iter()
            .position(|name| name == target)
            .ok_or_else(|| ConfigError::UnknownTargetColumn(target.to_string()))?;

        for (row, values) in rows.iter().enumerate() {
            if values.len() != columns.len() {
                return Err(ConfigError::RaggedRow {
                    row,
                    expected: columns.len(),
                    got: values.len(),
                });
            }
        }

        let rows = rows.into_iter().rev().collect();

        Ok(Self {
            columns,
            rows,
            target,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    // Every start index i in [0, len - seq_length) yields the window
    // rows[i..i + seq_length] over all columns and the target column's value
    // at row i + seq_length. A slice no longer than seq_length yields nothing.
    pub fn build_windows(&self, rows: &[Vec<f32>], seq_length: usize) -> Vec<WindowSample> {
        if rows.len() <= seq_length {
            return Vec::new();
        }

        (0..rows.len() - seq_length)
            .map(|i| WindowSample {
                window: rows[i..i + seq_length].to_vec(),
                target: rows[i + seq_length][self.target],
            })
            .collect()
    }

    pub fn make_dataset<B: Backend>(
        &self,
        options: &DatasetOptions,
    ) -> Result<DataSplit<B>, ConfigError> {
        let seq_length = options.seq_length;

        if seq_length == 0 {
            return Err(ConfigError::InvalidSequenceLength);
        }
        if options.train_fraction <= 0.0 || options.train_fraction >= 1.0 {
            return Err(ConfigError::InvalidTrainFraction(options.train_fraction));
        }
        if options.train_batch_size == 0 || options.valid_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }

        let split = (self.rows.len() as f64 * options.train_fraction).floor() as usize;

        // The validation slice borrows the last seq_length training rows so
        // its first window is fully populated (look-back stitching).
        if split < seq_length {
            return Err(ConfigError::SliceTooShort {
                slice: "train",
                rows: split,
                needed: seq_length,
            });
        }

        let train_rows = &self.rows[0..split];
        let valid_rows = &self.rows[split - seq_length..];

        debug!(
            "train slice: {} rows, head {:?}",
            train_rows.len(),
            &train_rows[..train_rows.len().min(5)]
        );

        let train_samples = self.build_windows(train_rows, seq_length);
        let valid_samples = self.build_windows(valid_rows, seq_length);

        if train_samples.is_empty() && !options.allow_empty_train {
            return Err(ConfigError::EmptyWindowSet {
                slice: "train",
                rows: train_rows.len(),
                seq_length,
            });
        }

        let train_loader = batch_loader(&train_samples, options.train_batch_size, options.seed);
        let valid_loader = batch_loader(&valid_samples, options.valid_batch_size, options.seed);

        Ok(DataSplit {
            train_loader,
            valid_loader,
            train_samples: InMemDataset::new(train_samples),
            valid_samples: InMemDataset::new(valid_samples),
        })
    }
}

fn batch_loader<B: Backend>(
    samples: &[WindowSample],
    batch_size: usize,
    seed: u64,
) -> Arc<dyn DataLoader<WindowBatch<B>>> {
    let inner = DataLoaderBuilder::new(WindowBatcher::<B>::new())
        .batch_size(batch_size)
        .shuffle(seed)
        .build(InMemDataset::new(samples.to_vec()));

    Arc::new(FullBatchLoader { inner, batch_size })
}

// Drops the undersized trailing batch of each traversal, after the
// per-epoch shuffle.
struct FullBatchLoader<B: Backend> {
    inner: Arc<dyn DataLoader<WindowBatch<B>>>,
    batch_size: usize,
}

impl<B: Backend> DataLoader<WindowBatch<B>> for FullBatchLoader<B> {
    fn iter<'a>(&'a self) -> Box<dyn DataLoaderIterator<WindowBatch<B>> + 'a> {
        Box::new(FullBatchIterator {
            inner: self.inner.iter(),
            batch_size: self.batch_size,
        })
    }
}

struct FullBatchIterator<'a, B: Backend> {
    inner: Box<dyn DataLoaderIterator<WindowBatch<B>> + 'a>,
    batch_size: usize,
}

impl<'a, B: Backend> Iterator for FullBatchIterator<'a, B> {
    type Item = WindowBatch<B>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .find(|batch| batch.inputs.dims()[0] == self.batch_size)
    }
}

impl<'a, B: Backend> DataLoaderIterator<WindowBatch<B>> for FullBatchIterator<'a, B> {
    fn progress(&self) -> Progress {
        self.inner.progress()
    }
}

pub struct DataSplit<B: Backend> {
    pub train_loader: Arc<dyn DataLoader<WindowBatch<B>>>,
    pub valid_loader: Arc<dyn DataLoader<WindowBatch<B>>>,
    pub train_samples: InMemDataset<WindowSample>,
    pub valid_samples: InMemDataset<WindowSample>,
}

#[derive(Config, Debug)]
pub struct DatasetOptions {
    pub train_fraction: f64,
    pub train_batch_size: usize,
    pub valid_batch_size: usize,
    pub seq_length: usize,

    #[config(default = false)]
    pub allow_empty_train: bool,

    #[config(default = 42)]
    pub seed: u64,
}

pub struct WindowBatcher<B: Backend> {
    _backend: PhantomData<B>,
}

impl<B: Backend> WindowBatcher<B> {
    pub fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> Default for WindowBatcher<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Batcher<WindowSample, WindowBatch<B>> for WindowBatcher<B> {
    fn batch(&self, items: Vec<WindowSample>) -> WindowBatch<B> {
        assert!(!items.is_empty(), "cannot batch zero window samples");

        let batch_size = items.len();

        let inputs: Vec<Tensor<B, 3>> = items
            .iter()
            .map(|item| {
                let seq_length = item.window.len();
                let feat_count = item.window.first().map(|row| row.len()).unwrap_or(0);

                let data = Data::new(
                    item.window.iter().flatten().copied().collect(),
                    Shape {
                        dims: [seq_length, feat_count],
                    },
                );
                let tensor: Tensor<B, 2> = Tensor::from_data(data.convert());

                tensor.reshape([1, seq_length, feat_count])
            })
            .collect();
        let inputs = Tensor::cat(inputs, 0);

        let targets = {
            let values: Vec<f32> = items.iter().map(|item| item.target).collect();
            let data = Data::new(
                values,
                Shape {
                    dims: [batch_size, 1],
                },
            );
            Tensor::from_data(data.convert())
        };

        WindowBatch { inputs, targets }
    }
}
