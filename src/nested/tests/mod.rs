/*
 * @Author       : 老董
 * @Date         : 2026-10-14
 * @Description  : 嵌套适配器单元测试共用的测试替身（算子/损失函数）
 */

mod config;

use super::{Criterion, Operator, Tree};
use ndarray::{ArrayD, arr1};
use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub(super) enum LeafError {
    #[error("张量为空")]
    EmptyTensor,
    #[error("形状不一致：{left:?} 与 {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },
}

pub(super) fn vector(values: &[f32]) -> ArrayD<f32> {
    arr1(values).into_dyn()
}

/// 用`depth`层单子节点分支把`leaf`包起来
pub(super) fn nest<T>(depth: usize, leaf: T) -> Tree<T> {
    (0..depth).fold(Tree::leaf(leaf), |tree, _| Tree::branch([("x", tree)]))
}

fn check_same_shape(left: &ArrayD<f32>, right: &ArrayD<f32>) -> Result<(), LeafError> {
    if left.shape() != right.shape() {
        return Err(LeafError::ShapeMismatch {
            left: left.shape().to_vec(),
            right: right.shape().to_vec(),
        });
    }
    Ok(())
}

/// y = weight * x，带一个可累积梯度的标量参数
#[derive(Debug)]
pub(super) struct Scale {
    pub weight: f32,
    pub grad_weight: f32,
    pub forward_calls: usize,
    pub accumulate_calls: usize,
    pub cast_to: Option<String>,
}

impl Scale {
    pub fn new(weight: f32) -> Self {
        Self {
            weight,
            grad_weight: 0.,
            forward_calls: 0,
            accumulate_calls: 0,
            cast_to: None,
        }
    }
}

impl Operator for Scale {
    type Input = ArrayD<f32>;
    type Output = ArrayD<f32>;
    type Error = LeafError;

    fn forward(&mut self, input: &ArrayD<f32>) -> Result<ArrayD<f32>, LeafError> {
        if input.is_empty() {
            return Err(LeafError::EmptyTensor);
        }
        self.forward_calls += 1;
        Ok(input * self.weight)
    }

    fn backward(
        &mut self,
        input: &ArrayD<f32>,
        grad_output: &ArrayD<f32>,
    ) -> Result<ArrayD<f32>, LeafError> {
        check_same_shape(input, grad_output)?;
        Ok(grad_output * self.weight)
    }

    fn accumulate_parameters(
        &mut self,
        input: &ArrayD<f32>,
        grad_output: &ArrayD<f32>,
        scale: f32,
    ) -> Result<(), LeafError> {
        check_same_shape(input, grad_output)?;
        self.accumulate_calls += 1;
        self.grad_weight += scale * (input * grad_output).sum();
        Ok(())
    }

    fn reset(&mut self, seed: Option<u64>) {
        let mut rng = StdRng::seed_from_u64(seed.unwrap_or(0));
        self.weight = rng.gen_range(-1.0..1.0);
        self.grad_weight = 0.;
    }

    fn cast(&mut self, type_name: &str) {
        self.cast_to = Some(type_name.to_string());
    }
}

/// 恒等算子，不实现任何可选钩子
pub(super) struct Identity;

impl Operator for Identity {
    type Input = f32;
    type Output = f32;
    type Error = LeafError;

    fn forward(&mut self, input: &f32) -> Result<f32, LeafError> {
        Ok(*input)
    }

    fn backward(&mut self, _input: &f32, grad_output: &f32) -> Result<f32, LeafError> {
        Ok(*grad_output)
    }

    fn accumulate_parameters(&mut self, _: &f32, _: &f32, _: f32) -> Result<(), LeafError> {
        Ok(())
    }
}

/// 均方误差
pub(super) struct Mse;

impl Criterion for Mse {
    type Input = ArrayD<f32>;
    type Target = ArrayD<f32>;
    type Error = LeafError;

    fn forward(&mut self, input: &ArrayD<f32>, target: &ArrayD<f32>) -> Result<f32, LeafError> {
        check_same_shape(input, target)?;
        let diff = input - target;
        Ok((&diff * &diff).sum() / diff.len() as f32)
    }

    fn backward(
        &mut self,
        input: &ArrayD<f32>,
        target: &ArrayD<f32>,
    ) -> Result<ArrayD<f32>, LeafError> {
        check_same_shape(input, target)?;
        let n = input.len() as f32;
        Ok((input - target) * (2. / n))
    }
}

/// 每个叶节点返回固定的损失与梯度，便于检查分支处的缩放
pub(super) struct Constant {
    pub loss: f32,
    pub grad: f32,
    /// 叶节点上`forward()`与`backward()`被调用的总次数
    pub calls: usize,
}

impl Constant {
    pub fn new(loss: f32, grad: f32) -> Self {
        Self { loss, grad, calls: 0 }
    }
}

impl Criterion for Constant {
    type Input = f32;
    type Target = f32;
    type Error = LeafError;

    fn forward(&mut self, _input: &f32, _target: &f32) -> Result<f32, LeafError> {
        self.calls += 1;
        Ok(self.loss)
    }

    fn backward(&mut self, _input: &f32, _target: &f32) -> Result<f32, LeafError> {
        self.calls += 1;
        Ok(self.grad)
    }
}
