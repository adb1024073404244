/*
 * @Author       : 老董
 * @Date         : 2026-10-12
 * @Description  : 嵌套适配器的配置（最大深度、聚合模式）
 */

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// 默认的最大嵌套深度
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// 算子适配器输出的聚合模式
///
/// 目前只有`Preserve`（输出树与输入树同构）有明确定义；
/// `Flatten`与`Mean`如何重塑树结构、如何回传梯度尚无定论，调用时一律报错。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Preserve,
    Flatten,
    Mean,
}

impl Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregation::Preserve => "preserve",
            Aggregation::Flatten => "flatten",
            Aggregation::Mean => "mean",
        };
        write!(f, "{}", name)
    }
}

/// 嵌套适配器配置
///
/// 可从JSON加载，缺省字段取默认值：
/// ```
/// use nested_torch::nested::{Aggregation, NestedConfig};
///
/// let config = NestedConfig::from_json(r#"{"max_depth": 4}"#).unwrap();
/// assert_eq!(config.max_depth, 4);
/// assert_eq!(config.aggregation, Aggregation::Preserve);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedConfig {
    pub max_depth: usize,
    pub aggregation: Aggregation,
}

impl Default for NestedConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            aggregation: Aggregation::Preserve,
        }
    }
}

impl NestedConfig {
    pub fn new(max_depth: usize, aggregation: Aggregation) -> Self {
        Self {
            max_depth,
            aggregation,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
