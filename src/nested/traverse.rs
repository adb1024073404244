/*
 * @Author       : 老董
 * @Date         : 2026-10-12
 * @Description  : 嵌套树的深度优先遍历原语（单树 / 双树同步）
 *
 * 深度从根节点的0开始，每进入一层分支加1；任一节点深度超过`max_depth`即整体失败，不返回部分结果。
 * 双树遍历时两棵树按同一键序同步下降，任一层键集合不一致即报`ShapeMismatch`。
 */

use super::{Key, KeyPath, Tree};
use crate::errors::NestedError;
use std::collections::BTreeMap;

fn check_depth<E>(path: &KeyPath, max_depth: usize) -> Result<(), NestedError<E>> {
    let depth = path.len();
    if depth > max_depth {
        return Err(NestedError::DepthExceeded {
            configured: max_depth,
            reached: depth,
        });
    }
    Ok(())
}

// ========== 单树 ==========

/// 对每个叶节点调用`leaf`，并按原有键与顺序重组出新树
pub fn walk<T, U, E, F>(tree: &Tree<T>, max_depth: usize, mut leaf: F) -> Result<Tree<U>, NestedError<E>>
where
    F: FnMut(&KeyPath, &T) -> Result<U, E>,
{
    fn go<T, U, E, F>(
        node: &Tree<T>,
        path: &mut KeyPath,
        max_depth: usize,
        leaf: &mut F,
    ) -> Result<Tree<U>, NestedError<E>>
    where
        F: FnMut(&KeyPath, &T) -> Result<U, E>,
    {
        check_depth::<E>(path, max_depth)?;
        match node {
            Tree::Leaf(value) => {
                log::trace!("访问叶节点 {}", path);
                leaf(path, value)
                    .map(Tree::Leaf)
                    .map_err(|error| NestedError::Leaf {
                        path: path.clone(),
                        error,
                    })
            }
            Tree::Branch(children) => {
                let mut out = BTreeMap::new();
                for (key, child) in children {
                    path.push(key.clone());
                    let result = go(child, path, max_depth, leaf);
                    path.pop();
                    out.insert(key.clone(), result?);
                }
                Ok(Tree::Branch(out))
            }
        }
    }

    go(tree, &mut KeyPath::root(), max_depth, &mut leaf)
}

/// 只检查深度，不访问叶节点内容
pub fn validate<T, E>(tree: &Tree<T>, max_depth: usize) -> Result<(), NestedError<E>> {
    fn go<T, E>(node: &Tree<T>, path: &mut KeyPath, max_depth: usize) -> Result<(), NestedError<E>> {
        check_depth::<E>(path, max_depth)?;
        if let Tree::Branch(children) = node {
            for (key, child) in children {
                path.push(key.clone());
                let result = go::<T, E>(child, path, max_depth);
                path.pop();
                result?;
            }
        }
        Ok(())
    }

    go(tree, &mut KeyPath::root(), max_depth)
}

// ========== 双树同步 ==========

/// 两棵树同步下降并自底向上折叠
///
/// - 叶节点对：调用`leaf`；
/// - 分支对：先折叠全部子节点，再把`(键, 子结果)`按键序交给`branch`合并。
pub fn fold_pair<A, B, U, E, L, R>(
    a: &Tree<A>,
    b: &Tree<B>,
    max_depth: usize,
    mut leaf: L,
    mut branch: R,
) -> Result<U, NestedError<E>>
where
    L: FnMut(&KeyPath, &A, &B) -> Result<U, E>,
    R: FnMut(&KeyPath, Vec<(Key, U)>) -> Result<U, NestedError<E>>,
{
    fn go<A, B, U, E, L, R>(
        a: &Tree<A>,
        b: &Tree<B>,
        path: &mut KeyPath,
        max_depth: usize,
        leaf: &mut L,
        branch: &mut R,
    ) -> Result<U, NestedError<E>>
    where
        L: FnMut(&KeyPath, &A, &B) -> Result<U, E>,
        R: FnMut(&KeyPath, Vec<(Key, U)>) -> Result<U, NestedError<E>>,
    {
        check_depth::<E>(path, max_depth)?;
        match (a, b) {
            (Tree::Leaf(x), Tree::Leaf(y)) => {
                log::trace!("访问叶节点对 {}", path);
                leaf(path, x, y).map_err(|error| NestedError::Leaf {
                    path: path.clone(),
                    error,
                })
            }
            (Tree::Branch(children_a), Tree::Branch(children_b)) => {
                match_keys::<A, B, E>(children_a, children_b, path)?;
                let mut folded = Vec::with_capacity(children_a.len());
                for ((key, child_a), child_b) in children_a.iter().zip(children_b.values()) {
                    path.push(key.clone());
                    let result = go(child_a, child_b, path, max_depth, leaf, branch);
                    path.pop();
                    folded.push((key.clone(), result?));
                }
                branch(path, folded)
            }
            (Tree::Leaf(_), Tree::Branch(_)) => Err(NestedError::shape_mismatch(
                path,
                "第一棵树为叶节点，第二棵树为分支",
            )),
            (Tree::Branch(_), Tree::Leaf(_)) => Err(NestedError::shape_mismatch(
                path,
                "第一棵树为分支，第二棵树为叶节点",
            )),
        }
    }

    go(a, b, &mut KeyPath::root(), max_depth, &mut leaf, &mut branch)
}

/// 两棵树同步下降，对每个叶节点对调用`leaf`，并按第一棵树的结构重组结果
pub fn walk_pair<A, B, U, E, L>(
    a: &Tree<A>,
    b: &Tree<B>,
    max_depth: usize,
    leaf: L,
) -> Result<Tree<U>, NestedError<E>>
where
    L: FnMut(&KeyPath, &A, &B) -> Result<U, E>,
{
    let mut leaf = leaf;
    fold_pair(
        a,
        b,
        max_depth,
        |path, x, y| leaf(path, x, y).map(Tree::Leaf),
        |_, children| Ok(Tree::Branch(children.into_iter().collect())),
    )
}

/// 两棵树同步下降，对每个叶节点对调用`leaf`，不产生结果树
pub fn visit_pair<A, B, E, L>(a: &Tree<A>, b: &Tree<B>, max_depth: usize, leaf: L) -> Result<(), NestedError<E>>
where
    L: FnMut(&KeyPath, &A, &B) -> Result<(), E>,
{
    fold_pair(a, b, max_depth, leaf, |_, _| Ok(()))
}

/// 只检查两棵树是否同构且未超出深度上限
pub fn validate_pair<A, B, E>(a: &Tree<A>, b: &Tree<B>, max_depth: usize) -> Result<(), NestedError<E>> {
    visit_pair(a, b, max_depth, |_, _, _| Ok(()))
}

fn match_keys<A, B, E>(
    children_a: &BTreeMap<Key, Tree<A>>,
    children_b: &BTreeMap<Key, Tree<B>>,
    path: &KeyPath,
) -> Result<(), NestedError<E>> {
    if let Some(key) = children_a.keys().find(|key| !children_b.contains_key(*key)) {
        return Err(NestedError::shape_mismatch(
            &path.child(key.clone()),
            format!("键`{}`只存在于第一棵树", key),
        ));
    }
    if let Some(key) = children_b.keys().find(|key| !children_a.contains_key(*key)) {
        return Err(NestedError::shape_mismatch(
            &path.child(key.clone()),
            format!("键`{}`只存在于第二棵树", key),
        ));
    }
    Ok(())
}
