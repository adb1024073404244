/*
 * @Author       : 老董
 * @Date         : 2026-10-12
 * @Description  : 被包装对象需要提供的能力：单张量算子（Operator）与损失函数（Criterion）
 *
 * 张量运算、自动求导、具体的网络层都由外部提供，本 crate 只负责把它们推广到嵌套树上。
 */

use ndarray::{Array, Dimension};

/// 单张量算子
///
/// # 设计原则
/// - 有状态：`accumulate_parameters()`累积的参数梯度一直保留，直到调用方自行清零；
/// - `backward()`应与同一输入上最近一次`forward()`配对调用，这一约定由实现方自己保证；
/// - `reset()`与`cast()`为可选钩子，默认什么也不做。
///
/// # 使用示例
/// ```
/// use nested_torch::nested::Operator;
///
/// /// y = 2x
/// struct Double;
///
/// impl Operator for Double {
///     type Input = f32;
///     type Output = f32;
///     type Error = std::convert::Infallible;
///
///     fn forward(&mut self, input: &f32) -> Result<f32, Self::Error> {
///         Ok(input * 2.0)
///     }
///
///     fn backward(&mut self, _input: &f32, grad_output: &f32) -> Result<f32, Self::Error> {
///         Ok(grad_output * 2.0)
///     }
///
///     fn accumulate_parameters(&mut self, _: &f32, _: &f32, _: f32) -> Result<(), Self::Error> {
///         Ok(())
///     }
/// }
/// ```
pub trait Operator {
    type Input;
    type Output;
    type Error;

    /// 前向传播
    fn forward(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error>;

    /// 由输出梯度计算输入梯度
    fn backward(
        &mut self,
        input: &Self::Input,
        grad_output: &Self::Output,
    ) -> Result<Self::Input, Self::Error>;

    /// 以`scale`为系数把参数梯度累加到内部状态
    fn accumulate_parameters(
        &mut self,
        input: &Self::Input,
        grad_output: &Self::Output,
        scale: f32,
    ) -> Result<(), Self::Error>;

    /// 重新初始化参数
    fn reset(&mut self, _seed: Option<u64>) {}

    /// 转换参数的数据类型/设备
    fn cast(&mut self, _type_name: &str) {}
}

/// 二元损失函数
pub trait Criterion {
    type Input;
    type Target;
    type Error;

    /// 计算标量损失
    fn forward(&mut self, input: &Self::Input, target: &Self::Target) -> Result<f32, Self::Error>;

    /// 计算损失对`input`的梯度
    fn backward(
        &mut self,
        input: &Self::Input,
        target: &Self::Target,
    ) -> Result<Self::Input, Self::Error>;
}

/// 可被分支子节点数整除的梯度类型
///
/// 损失在分支处取均值，梯度就需要在同一处除以子节点数。
pub trait GradScale {
    fn div_count(&self, count: usize) -> Self;
}

impl GradScale for f32 {
    fn div_count(&self, count: usize) -> Self {
        self / count as f32
    }
}

impl GradScale for f64 {
    fn div_count(&self, count: usize) -> Self {
        self / count as f64
    }
}

impl<D: Dimension> GradScale for Array<f32, D> {
    fn div_count(&self, count: usize) -> Self {
        self / count as f32
    }
}

impl<D: Dimension> GradScale for Array<f64, D> {
    fn div_count(&self, count: usize) -> Self {
        self / count as f64
    }
}
