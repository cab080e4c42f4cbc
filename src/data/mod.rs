pub mod batch;
pub mod series;

pub use batch::WindowBatch;
pub use series::{DataSplit, DatasetOptions, TimeSeries, WindowBatcher, WindowSample};
