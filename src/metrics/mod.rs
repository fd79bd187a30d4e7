pub mod zscore;
