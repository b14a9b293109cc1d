mod similarity;

pub use similarity::Similarity;
