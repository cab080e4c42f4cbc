use burn::config::Config;
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig};
use burn::tensor::{backend::Backend, Tensor};

use crate::config::HyperParameters;
use crate::error::ConfigError;

#[derive(Module, Debug)]
pub struct LstmNet<B: Backend> {
    layers: Vec<Lstm<B>>,
    dropout: Dropout,
    output: Linear<B>,
    hidden_size: usize,
}

impl<B: Backend> LstmNet<B> {
    // Input is [batch, seq_length, input_size]; only the final time step's
    // hidden output is projected. No state survives the call.
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let last = self.layers.len() - 1;

        let mut x = x;
        for (i, lstm) in self.layers.iter().enumerate() {
            let (_, hidden) = lstm.forward(x, None);
            // dropout between stacked layers only, never after the last
            x = if i < last {
                self.dropout.forward(hidden)
            } else {
                hidden
            };
        }

        self.project_last(x)
    }

    // Same pass, threading caller-managed (cell, hidden) state through each
    // layer. Pair with init_state.
    pub fn forward_with_state(
        &self,
        x: Tensor<B, 3>,
        states: Vec<(Tensor<B, 2>, Tensor<B, 2>)>,
    ) -> Tensor<B, 2> {
        assert_eq!(states.len(), self.layers.len());

        let last = self.layers.len() - 1;

        let mut x = x;
        for (i, (lstm, state)) in self.layers.iter().zip(states).enumerate() {
            let (_, hidden) = lstm.forward(x, Some(state));
            x = if i < last {
                self.dropout.forward(hidden)
            } else {
                hidden
            };
        }

        self.project_last(x)
    }

    // Zeroed (cell, hidden) pair per layer, [batch_size, hidden_size] each.
    pub fn init_state(&self, batch_size: usize) -> Vec<(Tensor<B, 2>, Tensor<B, 2>)> {
        self.layers
            .iter()
            .map(|_| {
                (
                    Tensor::zeros([batch_size, self.hidden_size]),
                    Tensor::zeros([batch_size, self.hidden_size]),
                )
            })
            .collect()
    }

    fn project_last(&self, encodings: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch_size, seq_length, d_hidden] = encodings.dims();
        let last_step: Tensor<B, 2> = encodings
            .slice([0..batch_size, seq_length - 1..seq_length, 0..d_hidden])
            .squeeze(1);

        self.output.forward(last_step)
    }
}

#[derive(Config, Debug)]
pub struct LstmNetConfig {
    input_size: usize,
    hidden_size: usize,
    output_size: usize,
    hyper: HyperParameters,
}

impl LstmNetConfig {
    pub fn init<B: Backend>(&self) -> Result<LstmNet<B>, ConfigError> {
        let hyper = &self.hyper;

        if hyper.num_layers == 0 {
            return Err(ConfigError::InvalidLayerCount);
        }
        if hyper.seq_length == 0 {
            return Err(ConfigError::InvalidSequenceLength);
        }
        if !(0.0..1.0).contains(&hyper.drop_out) {
            return Err(ConfigError::InvalidDropout(hyper.drop_out));
        }

        let layers: Vec<Lstm<B>> = (0..hyper.num_layers)
            .map(|i| {
                let d_input = if i == 0 { self.input_size } else { self.hidden_size };
                LstmConfig::new(d_input, self.hidden_size, true).init()
            })
            .collect();

        Ok(LstmNet {
            layers,
            dropout: DropoutConfig::new(hyper.drop_out).init(),
            output: LinearConfig::new(self.hidden_size, self.output_size).init(),
            hidden_size: self.hidden_size,
        })
    }
}
