use crate::nested::{Aggregation, KeyPath};
use std::convert::Infallible;
use thiserror::Error;

/// 嵌套遍历的错误类型
///
/// `E`为被包装的算子/损失函数自身的错误类型。
/// 结构类错误（深度、形状）与叶节点上的计算错误彼此区分，便于调用方分别处理。
#[derive(Error, Debug, PartialEq)]
pub enum NestedError<E> {
    // 深度超限：可能是嵌套过深，也可能是输入意外地构成了（逻辑上的）环
    #[error("嵌套深度超出上限：配置的最大深度为{configured}，实际到达{reached}")]
    DepthExceeded { configured: usize, reached: usize },

    #[error("无效的树节点`{node}`：{reason}")]
    InvalidShape { node: KeyPath, reason: String },

    #[error("两棵树在`{path_hint}`处结构不一致：{message}")]
    ShapeMismatch { path_hint: KeyPath, message: String },

    #[error("聚合模式`{0}`尚未实现，目前仅支持`preserve`")]
    UnsupportedAggregation(Aggregation),

    // 叶节点上被包装对象自身的错误，原样保留
    #[error("叶节点`{path}`计算失败：{error}")]
    Leaf { path: KeyPath, error: E },
}

/// 纯结构操作（不涉及算子）使用的错误类型
pub type TreeError = NestedError<Infallible>;

impl<E> NestedError<E> {
    pub(crate) fn shape_mismatch(path_hint: &KeyPath, message: impl Into<String>) -> Self {
        NestedError::ShapeMismatch {
            path_hint: path_hint.clone(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_shape(node: &KeyPath, reason: impl Into<String>) -> Self {
        NestedError::InvalidShape {
            node: node.clone(),
            reason: reason.into(),
        }
    }

    /// 是否为结构类错误（深度/形状），而非叶节点计算错误
    pub fn is_structural(&self) -> bool {
        !matches!(self, NestedError::Leaf { .. })
    }

    /// 出错节点的路径（若有）
    pub fn path(&self) -> Option<&KeyPath> {
        match self {
            NestedError::InvalidShape { node, .. } => Some(node),
            NestedError::ShapeMismatch { path_hint, .. } => Some(path_hint),
            NestedError::Leaf { path, .. } => Some(path),
            NestedError::DepthExceeded { .. } | NestedError::UnsupportedAggregation(_) => None,
        }
    }

    /// 取回被包装对象抛出的原始错误
    pub fn into_leaf_error(self) -> Option<E> {
        match self {
            NestedError::Leaf { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl TreeError {
    /// 把纯结构错误提升为任意叶错误类型下的同名错误
    pub fn widen<E>(self) -> NestedError<E> {
        match self {
            NestedError::DepthExceeded {
                configured,
                reached,
            } => NestedError::DepthExceeded {
                configured,
                reached,
            },
            NestedError::InvalidShape { node, reason } => NestedError::InvalidShape { node, reason },
            NestedError::ShapeMismatch { path_hint, message } => {
                NestedError::ShapeMismatch { path_hint, message }
            }
            NestedError::UnsupportedAggregation(mode) => NestedError::UnsupportedAggregation(mode),
            NestedError::Leaf { error, .. } => match error {},
        }
    }
}

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置解析失败：{0}")]
    Parse(#[from] serde_json::Error),
}
