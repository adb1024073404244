/*
 * @Author       : 老董
 * @Date         : 2026-10-12
 * @Description  : 嵌套张量树（Tree）：叶节点持有一个张量，分支节点持有“键 -> 子树”的有序映射
 */

use super::{Key, KeyPath};
use crate::errors::{NestedError, TreeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 嵌套的张量集合
///
/// 叶节点中的`T`对本模块是不透明的（通常是张量，也可以是任意值）。
/// 分支使用`BTreeMap`保存子节点，因此遍历顺序只取决于键本身，
/// 同一棵树的前向与反向、以及两棵同构的树之间的遍历顺序总是一致的。
///
/// 由于子树按值持有，树不可能成环。
///
/// 序列化时分支写成`(键, 子树)`序列而不是映射，这样JSON中整数下标与数字名字
/// （如`0`与`"0"`）在读回后仍能区分。
///
/// # 示例
/// ```
/// use nested_torch::nested::Tree;
///
/// let tree = Tree::branch([
///     ("a", Tree::leaf(1.0_f32)),
///     ("b", Tree::list([Tree::leaf(2.0), Tree::leaf(3.0)])),
/// ]);
/// assert_eq!(tree.depth(), 2);
/// assert_eq!(tree.leaf_count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tree<T> {
    Leaf(T),
    Branch(#[serde(with = "branch_entries")] BTreeMap<Key, Tree<T>>),
}

impl<T> Tree<T> {
    pub fn leaf(value: T) -> Self {
        Tree::Leaf(value)
    }

    /// 由若干`(键, 子树)`构建分支；重复的键以后出现者为准
    pub fn branch<K, I>(children: I) -> Self
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, Tree<T>)>,
    {
        Tree::Branch(
            children
                .into_iter()
                .map(|(key, child)| (key.into(), child))
                .collect(),
        )
    }

    /// 由子树序列构建分支，键依次为`0, 1, 2...`
    pub fn list<I>(children: I) -> Self
    where
        I: IntoIterator<Item = Tree<T>>,
    {
        Tree::Branch(
            children
                .into_iter()
                .enumerate()
                .map(|(i, child)| (Key::Index(i), child))
                .collect(),
        )
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&T> {
        match self {
            Tree::Leaf(value) => Some(value),
            Tree::Branch(_) => None,
        }
    }

    pub fn children(&self) -> Option<&BTreeMap<Key, Tree<T>>> {
        match self {
            Tree::Leaf(_) => None,
            Tree::Branch(children) => Some(children),
        }
    }

    /// 树的深度：叶节点为0，每多一层分支加1（空分支也算一层）
    pub fn depth(&self) -> usize {
        match self {
            Tree::Leaf(_) => 0,
            Tree::Branch(children) => 1 + children.values().map(Tree::depth).max().unwrap_or(0),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Leaf(_) => 1,
            Tree::Branch(children) => children.values().map(Tree::leaf_count).sum(),
        }
    }

    /// 按路径取子树，路径不存在时返回`None`
    pub fn get(&self, path: &KeyPath) -> Option<&Tree<T>> {
        let mut node = self;
        for key in path.keys() {
            node = match node {
                Tree::Branch(children) => children.get(key)?,
                Tree::Leaf(_) => return None,
            };
        }
        Some(node)
    }

    /// 按遍历顺序列出所有叶节点及其路径
    ///
    /// 注：空分支不产生任何叶节点，因而不会出现在结果中。
    pub fn flatten(&self) -> Vec<(KeyPath, &T)> {
        fn collect<'a, T>(node: &'a Tree<T>, path: &mut KeyPath, out: &mut Vec<(KeyPath, &'a T)>) {
            match node {
                Tree::Leaf(value) => out.push((path.clone(), value)),
                Tree::Branch(children) => {
                    for (key, child) in children {
                        path.push(key.clone());
                        collect(child, path, out);
                        path.pop();
                    }
                }
            }
        }

        let mut out = Vec::with_capacity(self.leaf_count());
        collect(self, &mut KeyPath::root(), &mut out);
        out
    }

    /// 同`flatten`，但交出叶节点的所有权
    pub fn into_flat(self) -> Vec<(KeyPath, T)> {
        fn collect<T>(node: Tree<T>, path: &mut KeyPath, out: &mut Vec<(KeyPath, T)>) {
            match node {
                Tree::Leaf(value) => out.push((path.clone(), value)),
                Tree::Branch(children) => {
                    for (key, child) in children {
                        path.push(key);
                        collect(child, path, out);
                        path.pop();
                    }
                }
            }
        }

        let mut out = Vec::new();
        collect(self, &mut KeyPath::root(), &mut out);
        out
    }

    /// 由`(路径, 叶值)`列表重建树，是`flatten`/`into_flat`的逆操作
    ///
    /// - 空列表得到空分支；
    /// - 根路径的叶节点只能单独出现；
    /// - 同一路径出现两次，或某路径既被当作叶又被当作分支，均返回`InvalidShape`。
    pub fn from_flat<I>(leaves: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = (KeyPath, T)>,
    {
        let mut leaves = leaves.into_iter().peekable();
        let mut root = BTreeMap::new();

        while let Some((path, value)) = leaves.next() {
            if path.is_root() {
                if !root.is_empty() || leaves.peek().is_some() {
                    return Err(NestedError::invalid_shape(
                        &path,
                        "根节点为叶时不能再有其他节点",
                    ));
                }
                return Ok(Tree::Leaf(value));
            }
            insert_at(&mut root, path.keys(), value, &path)?;
        }

        Ok(Tree::Branch(root))
    }

    /// 对每个叶节点应用`f`，保持结构不变
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Tree<U> {
        fn go<T, U>(node: &Tree<T>, f: &mut impl FnMut(&T) -> U) -> Tree<U> {
            match node {
                Tree::Leaf(value) => Tree::Leaf(f(value)),
                Tree::Branch(children) => Tree::Branch(
                    children
                        .iter()
                        .map(|(key, child)| (key.clone(), go(child, &mut *f)))
                        .collect(),
                ),
            }
        }
        go(self, &mut f)
    }

    /// 可失败版本的`map`，遇到第一个错误即停止
    pub fn try_map<U, E>(&self, mut f: impl FnMut(&T) -> Result<U, E>) -> Result<Tree<U>, E> {
        fn go<T, U, E>(
            node: &Tree<T>,
            f: &mut impl FnMut(&T) -> Result<U, E>,
        ) -> Result<Tree<U>, E> {
            match node {
                Tree::Leaf(value) => Ok(Tree::Leaf(f(value)?)),
                Tree::Branch(children) => {
                    let mut mapped = BTreeMap::new();
                    for (key, child) in children {
                        mapped.insert(key.clone(), go(child, &mut *f)?);
                    }
                    Ok(Tree::Branch(mapped))
                }
            }
        }
        go(self, &mut f)
    }

    /// 树的结构（忽略叶节点内容）
    pub fn shape(&self) -> Tree<()> {
        self.map(|_| ())
    }

    /// 两棵树是否同构（每个分支的键集合都相同）
    pub fn same_shape<U>(&self, other: &Tree<U>) -> bool {
        match (self, other) {
            (Tree::Leaf(_), Tree::Leaf(_)) => true,
            (Tree::Branch(a), Tree::Branch(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|((ka, ca), (kb, cb))| {
                        ka == kb && ca.same_shape(cb)
                    })
            }
            _ => false,
        }
    }
}

fn insert_at<T>(
    children: &mut BTreeMap<Key, Tree<T>>,
    keys: &[Key],
    value: T,
    full_path: &KeyPath,
) -> Result<(), TreeError> {
    let Some((head, rest)) = keys.split_first() else {
        return Err(NestedError::invalid_shape(full_path, "路径为空"));
    };

    if rest.is_empty() {
        if children.contains_key(head) {
            return Err(NestedError::invalid_shape(full_path, "该路径已存在节点"));
        }
        children.insert(head.clone(), Tree::Leaf(value));
        return Ok(());
    }

    match children
        .entry(head.clone())
        .or_insert_with(|| Tree::Branch(BTreeMap::new()))
    {
        Tree::Branch(grandchildren) => insert_at(grandchildren, rest, value, full_path),
        Tree::Leaf(_) => Err(NestedError::invalid_shape(
            full_path,
            "该路径的前缀已是叶节点",
        )),
    }
}

mod branch_entries {
    use super::{Key, Tree};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<T, S>(children: &BTreeMap<Key, Tree<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(children.iter())
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<BTreeMap<Key, Tree<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let entries = Vec::<(Key, Tree<T>)>::deserialize(deserializer)?;
        let mut children = BTreeMap::new();
        for (key, child) in entries {
            if children.contains_key(&key) {
                return Err(D::Error::custom(format!("分支中出现重复的键`{}`", key)));
            }
            children.insert(key, child);
        }
        Ok(children)
    }
}
