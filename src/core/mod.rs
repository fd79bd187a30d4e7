pub mod match_result;
pub mod series;
