//! # Nested Torch
//!
//! `nested_torch`把任意单张量算子（前向、反向、参数梯度累积）与二元损失函数
//! 推广到**嵌套的张量树**上：树的深度与分支数在构造时未知，每次调用时才被发现。
//!
//! 张量运算、自动求导与具体网络层均由外部提供，本 crate 只负责在嵌套结构上编排它们。
//!

pub mod errors;
pub mod nested;
pub mod utils;
