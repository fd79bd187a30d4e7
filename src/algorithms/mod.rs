pub mod compare;
pub mod scan;
pub mod topk;
