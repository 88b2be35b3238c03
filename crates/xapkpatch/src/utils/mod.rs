pub mod java;
pub mod writer;
