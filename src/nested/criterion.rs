/*
 * @Author       : 老董
 * @Date         : 2026-10-13
 * @Description  : 嵌套损失函数适配器：对两棵同构的张量树计算损失，并在每个分支处取均值
 *
 * # 聚合规则
 * - 前向：叶节点对上取被包装损失函数的标量损失；分支处对子节点损失取**算术平均**（不是求和），
 *   因此损失大小与任何一层的分支数无关；
 * - 反向：分支处把每个子节点的梯度除以该分支的子节点数，与前向的均值保持一致。
 *   每层只除一次，嵌套k层、各层分支数为n₁…n_k的叶节点累计除以n₁·n₂·…·n_k。
 */

use super::traverse;
use super::{Criterion, GradScale, Key, KeyPath, NestedConfig, Tree, DEFAULT_MAX_DEPTH};
use crate::errors::NestedError;

/// 嵌套损失函数适配器
#[derive(Debug)]
pub struct NestedCriterionAdapter<C: Criterion> {
    criterion: C,
    max_depth: usize,
    /// 最近一次`forward()`得到的损失
    last_loss: Option<f32>,
}

impl<C: Criterion> NestedCriterionAdapter<C> {
    pub fn new(criterion: C) -> Self {
        Self::with_max_depth(criterion, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(criterion: C, max_depth: usize) -> Self {
        Self {
            criterion,
            max_depth,
            last_loss: None,
        }
    }

    /// 只使用配置中的`max_depth`
    pub fn with_config(criterion: C, config: NestedConfig) -> Self {
        Self::with_max_depth(criterion, config.max_depth)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn last_loss(&self) -> Option<f32> {
        self.last_loss
    }

    pub fn inner(&self) -> &C {
        &self.criterion
    }

    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.criterion
    }

    pub fn into_inner(self) -> C {
        self.criterion
    }

    /// 计算整棵树的损失（根节点各子节点损失的均值，子节点本身可能已是均值）
    pub fn forward(
        &mut self,
        input: &Tree<C::Input>,
        target: &Tree<C::Target>,
    ) -> Result<f32, NestedError<C::Error>> {
        check_structure::<_, _, C::Error>(input, target, self.max_depth)?;

        let criterion = &mut self.criterion;
        let loss = traverse::fold_pair(
            input,
            target,
            self.max_depth,
            |_, x, t| criterion.forward(x, t),
            |path, children| mean_loss(path, children),
        )?;

        log::debug!("嵌套损失：{}", loss);
        self.last_loss = Some(loss);
        Ok(loss)
    }

    /// 计算损失对输入树的梯度，返回与输入树同构的梯度树
    pub fn backward(
        &mut self,
        input: &Tree<C::Input>,
        target: &Tree<C::Target>,
    ) -> Result<Tree<C::Input>, NestedError<C::Error>>
    where
        C::Input: GradScale,
    {
        check_structure::<_, _, C::Error>(input, target, self.max_depth)?;

        let criterion = &mut self.criterion;
        traverse::fold_pair(
            input,
            target,
            self.max_depth,
            |_, x, t| criterion.backward(x, t).map(Tree::Leaf),
            |path, children| {
                let count = non_empty_count::<_, C::Error>(path, &children)?;
                Ok(Tree::Branch(
                    children
                        .into_iter()
                        .map(|(key, grad)| (key, grad.map(|g| g.div_count(count))))
                        .collect(),
                ))
            },
        )
    }
}

/// 在调用任何叶节点计算之前检查深度、两棵树是否同构以及是否存在空分支
fn check_structure<A, B, E>(input: &Tree<A>, target: &Tree<B>, max_depth: usize) -> Result<(), NestedError<E>> {
    traverse::fold_pair(
        input,
        target,
        max_depth,
        |_, _, _| Ok(()),
        |path, children| non_empty_count::<_, E>(path, &children).map(|_| ()),
    )
}

fn non_empty_count<U, E>(path: &KeyPath, children: &[(Key, U)]) -> Result<usize, NestedError<E>> {
    if children.is_empty() {
        return Err(NestedError::invalid_shape(path, "空分支无法求平均损失"));
    }
    Ok(children.len())
}

fn mean_loss<E>(path: &KeyPath, children: Vec<(Key, f32)>) -> Result<f32, NestedError<E>> {
    let count = non_empty_count::<_, E>(path, &children)?;
    let sum: f32 = children.iter().map(|(_, loss)| loss).sum();
    Ok(sum / count as f32)
}
