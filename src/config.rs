use burn::config::Config;

#[derive(Config, Debug)]
pub struct HyperParameters {
    pub hidden_units: Vec<usize>,
    pub embedding_dims: Vec<usize>,
    pub drop_outs: Vec<f64>,
    pub seq_length: usize,
    pub num_layers: usize,

    #[config(default = 0.0)]
    pub drop_out: f64,

    #[config(default = 1e-3)]
    pub learning_rate: f64,
}
