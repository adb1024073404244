/*
 * @Author       : 老董
 * @Date         : 2026-10-12
 * @Description  : 负责把单张量算子/损失函数推广到嵌套张量树上
 */

mod capability;
mod config;
mod criterion;
mod key;
mod operator;
pub mod traverse;
mod tree;

pub use capability::{Criterion, GradScale, Operator};
pub use config::{Aggregation, DEFAULT_MAX_DEPTH, NestedConfig};
pub use criterion::NestedCriterionAdapter;
pub use key::{Key, KeyPath};
pub use operator::NestedOperatorAdapter;
pub use tree::Tree;

#[cfg(test)]
mod tests;
