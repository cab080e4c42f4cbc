use burn::tensor::{backend::Backend, Tensor};

#[derive(Clone, Debug)]
pub struct WindowBatch<B: Backend> {
    pub inputs: Tensor<B, 3>,  // [N, T, F]
    pub targets: Tensor<B, 2>, // [N, 1]
}
