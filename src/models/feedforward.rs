use burn::config::Config;
use burn::module::Module;
use burn::nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear,
    LinearConfig,
};
use burn::tensor::activation;
use burn::tensor::{backend::Backend, Int, Tensor};

use crate::config::HyperParameters;
use crate::error::ConfigError;

#[derive(Module, Debug)]
pub struct FeedForwardNet<B: Backend> {
    embeddings: Vec<Embedding<B>>,
    joint_linear: Linear<B>,
    joint_norm: BatchNorm<B, 0>,
    joint_dropout: Dropout,
    hidden_linears: Vec<Linear<B>>,
    hidden_norms: Vec<BatchNorm<B, 0>>,
    hidden_dropouts: Vec<Dropout>,
    output: Linear<B>,
}

impl<B: Backend> FeedForwardNet<B> {
    // continuous is [batch, num_continuous], categorical is [batch, num_columns]
    // with one index per categorical column. Out-of-range indices propagate
    // from the embedding lookup.
    pub fn forward(&self, continuous: Tensor<B, 2>, categorical: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, _] = categorical.dims();

        let mut features = vec![continuous];
        for (i, embedding) in self.embeddings.iter().enumerate() {
            let indices = categorical.clone().slice([0..batch_size, i..i + 1]);
            let embedded: Tensor<B, 2> = embedding.forward(indices).squeeze(1);
            features.push(embedded);
        }

        let x = Tensor::cat(features, 1);

        // The joint stage activates before normalizing; the hidden stages
        // normalize before activating.
        let x = activation::relu(self.joint_linear.forward(x));
        let x = self.joint_norm.forward(x);
        let mut x = self.joint_dropout.forward(x);

        for ((linear, norm), dropout) in self
            .hidden_linears
            .iter()
            .zip(self.hidden_norms.iter())
            .zip(self.hidden_dropouts.iter())
        {
            x = activation::relu(norm.forward(linear.forward(x)));
            x = dropout.forward(x);
        }

        self.output.forward(x)
    }
}

#[derive(Config, Debug)]
pub struct FeedForwardNetConfig {
    num_continuous: usize,
    cardinalities: Vec<usize>,
    hyper: HyperParameters,
}

impl FeedForwardNetConfig {
    pub fn init<B: Backend>(&self) -> Result<FeedForwardNet<B>, ConfigError> {
        let hyper = &self.hyper;

        if self.cardinalities.len() != hyper.embedding_dims.len() {
            return Err(ConfigError::MismatchedLengths {
                left: "cardinalities",
                left_len: self.cardinalities.len(),
                right: "embedding_dims",
                right_len: hyper.embedding_dims.len(),
            });
        }
        if hyper.hidden_units.len() < 2 {
            return Err(ConfigError::TooFewHiddenUnits(hyper.hidden_units.len()));
        }
        if hyper.drop_outs.len() != hyper.hidden_units.len() {
            return Err(ConfigError::MismatchedLengths {
                left: "drop_outs",
                left_len: hyper.drop_outs.len(),
                right: "hidden_units",
                right_len: hyper.hidden_units.len(),
            });
        }
        for &rate in &hyper.drop_outs {
            if !(0.0..1.0).contains(&rate) {
                return Err(ConfigError::InvalidDropout(rate));
            }
        }

        let embeddings: Vec<Embedding<B>> = self
            .cardinalities
            .iter()
            .zip(hyper.embedding_dims.iter())
            .map(|(c, e)| EmbeddingConfig::new(*c, *e).init())
            .collect();

        let d_embedded: usize = hyper.embedding_dims.iter().sum();
        let widths = &hyper.hidden_units;

        // norm widths track the stage outputs, hidden_units[1..]
        let joint_linear = LinearConfig::new(self.num_continuous + d_embedded, widths[1]).init();
        let joint_norm = BatchNormConfig::new(widths[1]).init();
        let joint_dropout = DropoutConfig::new(hyper.drop_outs[0]).init();

        let mut hidden_linears = Vec::new();
        let mut hidden_norms = Vec::new();
        let mut hidden_dropouts = Vec::new();
        for i in 1..widths.len() - 1 {
            hidden_linears.push(LinearConfig::new(widths[i], widths[i + 1]).init());
            hidden_norms.push(BatchNormConfig::new(widths[i + 1]).init());
            hidden_dropouts.push(DropoutConfig::new(hyper.drop_outs[i]).init());
        }

        let output = LinearConfig::new(widths[widths.len() - 1], 1).init();

        Ok(FeedForwardNet {
            embeddings,
            joint_linear,
            joint_norm,
            joint_dropout,
            hidden_linears,
            hidden_norms,
            hidden_dropouts,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::AutodiffModule;
    use burn::tensor::{Data, Shape};

    type B = NdArray<f32>;
    type AB = Autodiff<B>;

    fn hyper(drop_outs: Vec<f64>) -> HyperParameters {
        HyperParameters::new(vec![4, 5], vec![3], drop_outs, 6, 2)
    }

    fn batch<Bk: Backend>() -> (Tensor<Bk, 2>, Tensor<Bk, 2, Int>) {
        let continuous = Tensor::from_data(
            Data::new(
                vec![0.1f32, 0.2, 0.3, 0.4, 0.5, 0.6],
                Shape { dims: [2, 3] },
            )
            .convert(),
        );
        let categorical = Tensor::from_data(
            Data::new(vec![0i64, 1], Shape { dims: [2, 1] }).convert(),
        );

        (continuous, categorical)
    }

    // The network has no continuous-only preamble stage: raw continuous
    // features go straight into the joint stage, so nothing is computed and
    // then discarded and the parameter count reflects only the stages the
    // forward pass uses.
    #[test]
    fn forward_yields_one_output_per_sample() {
        let model = FeedForwardNetConfig::new(3, vec![2], hyper(vec![0.1, 0.2]))
            .init::<B>()
            .unwrap();
        let (continuous, categorical) = batch::<B>();

        let out = model.forward(continuous, categorical);

        assert_eq!(out.dims(), [2, 1]);
    }

    #[test]
    fn dropout_count_must_match_hidden_widths() {
        let result = FeedForwardNetConfig::new(3, vec![2], hyper(vec![0.1])).init::<B>();

        assert!(matches!(
            result,
            Err(ConfigError::MismatchedLengths {
                left: "drop_outs",
                ..
            })
        ));
    }

    #[test]
    fn embedding_dims_must_match_cardinalities() {
        let result =
            FeedForwardNetConfig::new(3, vec![2, 4], hyper(vec![0.1, 0.2])).init::<B>();

        assert!(matches!(
            result,
            Err(ConfigError::MismatchedLengths {
                left: "cardinalities",
                ..
            })
        ));
    }

    #[test]
    fn at_least_two_hidden_widths_are_required() {
        let hyper = HyperParameters::new(vec![4], vec![3], vec![0.1], 6, 2);
        let result = FeedForwardNetConfig::new(3, vec![2], hyper).init::<B>();

        assert!(matches!(result, Err(ConfigError::TooFewHiddenUnits(1))));
    }

    #[test]
    fn dropout_rates_must_be_probabilities() {
        let result = FeedForwardNetConfig::new(3, vec![2], hyper(vec![0.1, 1.0])).init::<B>();

        assert!(matches!(result, Err(ConfigError::InvalidDropout(_))));
    }

    #[test]
    fn batch_norm_statistics_shift_between_modes() {
        // Dropout pinned to zero so the norms are the only mode-dependent
        // part of the pass.
        let model = FeedForwardNetConfig::new(3, vec![2], hyper(vec![0.0, 0.0]))
            .init::<AB>()
            .unwrap();

        let (continuous, categorical) = batch::<AB>();
        let train_out = model.forward(continuous, categorical);

        let eval_model = model.valid();
        let (continuous, categorical) = batch::<B>();
        let eval_out = eval_model.forward(continuous, categorical);

        assert_ne!(train_out.into_data(), eval_out.into_data());
    }
}
