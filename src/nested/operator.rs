/*
 * @Author       : 老董
 * @Date         : 2026-10-13
 * @Description  : 嵌套算子适配器：让单张量算子可直接作用于嵌套张量树
 *
 * # 用法
 * ```ignore
 * let mut nested = NestedOperatorAdapter::new(linear);
 * let output = nested.forward(&input_tree)?;
 * let grad_input = nested.backward(&input_tree, &grad_output_tree)?;
 * nested.accumulate_parameters(&input_tree, &grad_output_tree, 1.0)?;
 * ```
 */

use super::traverse;
use super::{Aggregation, NestedConfig, Operator, Tree};
use crate::errors::NestedError;

/// 嵌套算子适配器
///
/// 持有一个被包装的算子，每次调用时递归下降输入树，在每个叶节点上调用该算子，
/// 再按原有的键与顺序重组结果。
///
/// # 约定
/// - 结构类错误（深度超限、形状不一致）在调用任何叶节点计算之前就会被检出，
///   因此出错时被包装算子的状态不会被部分修改；
/// - `forward()`会记录输出树的结构，随后的`backward()`/`accumulate_parameters()`
///   要求输出梯度树与之同构；
/// - 配置在构造后不会被适配器自身修改。
#[derive(Debug)]
pub struct NestedOperatorAdapter<O: Operator> {
    operator: O,
    config: NestedConfig,
    /// 最近一次`forward()`输出树的结构
    output_shape: Option<Tree<()>>,
}

impl<O: Operator> NestedOperatorAdapter<O> {
    /// 使用默认配置（最大深度10，`preserve`聚合）包装算子
    pub fn new(operator: O) -> Self {
        Self::with_config(operator, NestedConfig::default())
    }

    pub fn with_config(operator: O, config: NestedConfig) -> Self {
        Self {
            operator,
            config,
            output_shape: None,
        }
    }

    pub fn with_max_depth(operator: O, max_depth: usize) -> Self {
        Self::with_config(
            operator,
            NestedConfig {
                max_depth,
                ..NestedConfig::default()
            },
        )
    }

    pub fn config(&self) -> &NestedConfig {
        &self.config
    }

    pub fn max_depth(&self) -> usize {
        self.config.max_depth
    }

    pub fn aggregation(&self) -> Aggregation {
        self.config.aggregation
    }

    pub fn inner(&self) -> &O {
        &self.operator
    }

    pub fn inner_mut(&mut self) -> &mut O {
        &mut self.operator
    }

    pub fn into_inner(self) -> O {
        self.operator
    }

    /// 前向传播：对每个叶节点调用被包装算子的`forward()`，输出树与输入树同构
    pub fn forward(&mut self, input: &Tree<O::Input>) -> Result<Tree<O::Output>, NestedError<O::Error>> {
        self.ensure_supported()?;
        let max_depth = self.config.max_depth;
        traverse::validate::<_, O::Error>(input, max_depth)?;
        log::debug!("嵌套算子前向传播：{}个叶节点", input.leaf_count());

        // 本次前向一旦失败，之前记录的输出结构也不再对应最近一次前向
        self.output_shape = None;
        let operator = &mut self.operator;
        let output = traverse::walk(input, max_depth, |_, x| operator.forward(x))?;
        self.output_shape = Some(output.shape());
        Ok(output)
    }

    /// 反向传播：对每个叶节点对调用被包装算子的`backward()`，返回与输入树同构的梯度树
    pub fn backward(
        &mut self,
        input: &Tree<O::Input>,
        grad_output: &Tree<O::Output>,
    ) -> Result<Tree<O::Input>, NestedError<O::Error>> {
        self.ensure_supported()?;
        self.check_grad_output(input, grad_output)?;
        log::debug!("嵌套算子反向传播：{}个叶节点", input.leaf_count());

        let operator = &mut self.operator;
        traverse::walk_pair(input, grad_output, self.config.max_depth, |_, x, g| {
            operator.backward(x, g)
        })
    }

    /// 对每个叶节点对以同一`scale`累积参数梯度；唯一可观察的效果是被包装算子内部状态的变化
    pub fn accumulate_parameters(
        &mut self,
        input: &Tree<O::Input>,
        grad_output: &Tree<O::Output>,
        scale: f32,
    ) -> Result<(), NestedError<O::Error>> {
        self.ensure_supported()?;
        self.check_grad_output(input, grad_output)?;
        log::debug!(
            "嵌套算子累积参数梯度：{}个叶节点，scale={}",
            input.leaf_count(),
            scale
        );

        let operator = &mut self.operator;
        traverse::visit_pair(input, grad_output, self.config.max_depth, |_, x, g| {
            operator.accumulate_parameters(x, g, scale)
        })
    }

    /// `backward()`与`accumulate_parameters()`合并为一次遍历，返回输入梯度树
    pub fn update(
        &mut self,
        input: &Tree<O::Input>,
        grad_output: &Tree<O::Output>,
        scale: f32,
    ) -> Result<Tree<O::Input>, NestedError<O::Error>> {
        self.ensure_supported()?;
        self.check_grad_output(input, grad_output)?;

        let operator = &mut self.operator;
        traverse::walk_pair(input, grad_output, self.config.max_depth, |_, x, g| -> Result<O::Input, O::Error> {
            let grad_input = operator.backward(x, g)?;
            operator.accumulate_parameters(x, g, scale)?;
            Ok(grad_input)
        })
    }

    /// 重新初始化被包装算子，并清除记录的前向输出结构
    pub fn reset(&mut self, seed: Option<u64>) {
        self.operator.reset(seed);
        self.output_shape = None;
    }

    pub fn cast(&mut self, type_name: &str) {
        self.operator.cast(type_name);
    }

    fn ensure_supported(&self) -> Result<(), NestedError<O::Error>> {
        match self.config.aggregation {
            Aggregation::Preserve => Ok(()),
            mode => Err(NestedError::UnsupportedAggregation(mode)),
        }
    }

    fn check_grad_output(
        &self,
        input: &Tree<O::Input>,
        grad_output: &Tree<O::Output>,
    ) -> Result<(), NestedError<O::Error>> {
        let max_depth = self.config.max_depth;
        traverse::validate_pair::<_, _, O::Error>(input, grad_output, max_depth)?;
        match &self.output_shape {
            Some(shape) => traverse::validate_pair::<_, _, O::Error>(shape, grad_output, max_depth),
            None => {
                log::warn!("在没有前向传播记录的情况下调用反向传播，这通常是误用");
                Ok(())
            }
        }
    }
}
