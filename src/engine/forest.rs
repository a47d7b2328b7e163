// ==========================================
// 医院就诊负荷预测 - 随机森林回归
// ==========================================
// CART 回归树（MSE 划分准则）+ 自助采样集成
// 聚合方式: 成员预测均值
// 特征重要度: 不纯度下降（单树归一化后取平均）
// ==========================================

use crate::domain::prediction::{FeatureVector, FEATURE_COUNT};
use crate::engine::error::{ModelError, ModelResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// 平方误差低于此值视为纯节点
const PURITY_EPSILON: f64 = 1e-12;

// ==========================================
// TrainingSample - 训练样本
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSample {
    pub features: FeatureVector,
    pub target: f64,
}

// ==========================================
// ForestParams - 森林超参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,      // 树数量
    pub max_depth: usize,         // 单树最大深度
    pub min_samples_split: usize, // 节点可继续划分的最少样本数
    pub seed: u64,                // 随机种子
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

// ==========================================
// TreeNode - 树节点（扁平存储，按下标引用子节点）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        value: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        samples: usize,
    },
}

/// 最优划分候选
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    children_sse: f64,
}

// ==========================================
// RegressionTree - CART 回归树
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
    importances: Vec<f64>, // 单树归一化后的特征重要度
}

impl RegressionTree {
    /// 在 `samples[indices]` 上拟合一棵树（indices 可重复，对应自助采样）
    pub fn fit(
        samples: &[TrainingSample],
        indices: &[usize],
        max_depth: usize,
        min_samples_split: usize,
    ) -> Self {
        let mut builder = TreeBuilder {
            samples,
            max_depth,
            min_samples_split: min_samples_split.max(2),
            nodes: Vec::new(),
            raw_importances: vec![0.0; FEATURE_COUNT],
        };

        builder.build(indices, 0);

        let total: f64 = builder.raw_importances.iter().sum();
        let importances = if total > 0.0 {
            builder.raw_importances.iter().map(|v| v / total).collect()
        } else {
            vec![0.0; FEATURE_COUNT]
        };

        Self {
            nodes: builder.nodes,
            importances,
        }
    }

    /// 单树预测
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let x = features.as_slice();
        let mut idx = 0;

        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// 树深度（根节点深度为 0）
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
            }
        }

        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// 结构合法性检查（反序列化后使用）
    fn is_well_formed(&self) -> bool {
        if self.nodes.is_empty() || self.importances.len() != FEATURE_COUNT {
            return false;
        }
        self.nodes.iter().enumerate().all(|(idx, node)| match node {
            TreeNode::Leaf { value, .. } => value.is_finite(),
            TreeNode::Split {
                feature,
                left,
                right,
                ..
            } => {
                *feature < FEATURE_COUNT
                    && *left > idx
                    && *right > idx
                    && *left < self.nodes.len()
                    && *right < self.nodes.len()
            }
        })
    }
}

// ==========================================
// TreeBuilder - 递归建树
// ==========================================
struct TreeBuilder<'a> {
    samples: &'a [TrainingSample],
    max_depth: usize,
    min_samples_split: usize,
    nodes: Vec<TreeNode>,
    raw_importances: Vec<f64>,
}

impl<'a> TreeBuilder<'a> {
    /// 构建以 indices 为样本的子树，返回节点下标
    fn build(&mut self, indices: &[usize], depth: usize) -> usize {
        let n = indices.len();
        let node_idx = self.nodes.len();
        if n == 0 {
            self.nodes.push(TreeNode::Leaf {
                value: 0.0,
                samples: 0,
            });
            return node_idx;
        }

        let (sum, sum_sq) = indices.iter().fold((0.0, 0.0), |(s, sq), &i| {
            let y = self.samples[i].target;
            (s + y, sq + y * y)
        });
        let mean = sum / n as f64;
        let node_sse = sse(sum, sum_sq, n);

        self.nodes.push(TreeNode::Leaf {
            value: mean,
            samples: n,
        });

        let first = self.samples[indices[0]].target;
        let pure = node_sse <= PURITY_EPSILON
            || indices.iter().all(|&i| self.samples[i].target == first);

        if depth >= self.max_depth || n < self.min_samples_split || pure {
            return node_idx;
        }

        let Some(split) = self.best_split(indices) else {
            return node_idx;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.samples[i].features.0[split.feature] <= split.threshold);

        if left.is_empty() || right.is_empty() {
            return node_idx;
        }

        self.raw_importances[split.feature] += (node_sse - split.children_sse).max(0.0);

        let left_idx = self.build(&left, depth + 1);
        let right_idx = self.build(&right, depth + 1);

        self.nodes[node_idx] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_idx,
            right: right_idx,
            samples: n,
        };

        node_idx
    }

    /// 遍历全部特征，寻找子节点平方误差和最小的划分点
    fn best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let n = indices.len();
        let (total_sum, total_sq) = indices.iter().fold((0.0, 0.0), |(s, sq), &i| {
            let y = self.samples[i].target;
            (s + y, sq + y * y)
        });

        let mut best: Option<SplitCandidate> = None;
        let mut order: Vec<usize> = indices.to_vec();

        for feature in 0..FEATURE_COUNT {
            order.sort_by(|&a, &b| {
                self.samples[a].features.0[feature].total_cmp(&self.samples[b].features.0[feature])
            });

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for k in 1..n {
                let prev = &self.samples[order[k - 1]];
                left_sum += prev.target;
                left_sq += prev.target * prev.target;

                let lo = prev.features.0[feature];
                let hi = self.samples[order[k]].features.0[feature];
                if lo >= hi {
                    continue;
                }

                let children_sse = sse(left_sum, left_sq, k)
                    + sse(total_sum - left_sum, total_sq - left_sq, n - k);

                let better = match &best {
                    Some(b) => children_sse < b.children_sse,
                    None => true,
                };
                if better {
                    let mid = lo + (hi - lo) / 2.0;
                    // 中点因舍入落到 hi 时退回 lo，保证右子树非空
                    let threshold = if mid < hi { mid } else { lo };
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        children_sse,
                    });
                }
            }
        }

        best
    }
}

/// 平方误差和: Σy² - (Σy)²/n
fn sse(sum: f64, sum_sq: f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (sum_sq - sum * sum / n as f64).max(0.0)
}

// ==========================================
// RandomForest - 随机森林回归器
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// 拟合随机森林
    ///
    /// 每棵树在等量有放回自助样本上训练，随机源为固定种子的 ChaCha8，结果可复现
    pub fn fit(samples: &[TrainingSample], params: ForestParams) -> ModelResult<Self> {
        if samples.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if params.n_estimators == 0 {
            return Err(ModelError::InternalError("n_estimators 必须大于 0".to_string()));
        }

        let n = samples.len();
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(RegressionTree::fit(
                samples,
                &bootstrap,
                params.max_depth,
                params.min_samples_split,
            ));
        }

        tracing::debug!(
            n_samples = n,
            n_trees = trees.len(),
            max_depth = params.max_depth,
            "随机森林拟合完成"
        );

        Ok(Self { params, trees })
    }

    /// 聚合预测（成员均值）
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let members = self.member_predictions(features);
        members.iter().sum::<f64>() / members.len() as f64
    }

    /// 各成员树的预测值
    pub fn member_predictions(&self, features: &FeatureVector) -> Vec<f64> {
        self.trees.iter().map(|t| t.predict(features)).collect()
    }

    /// 聚合特征重要度（总和为 1；全部为叶节点时全 0）
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut importances = vec![0.0; FEATURE_COUNT];
        for tree in &self.trees {
            for (acc, imp) in importances.iter_mut().zip(tree.feature_importances()) {
                *acc += imp;
            }
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        importances
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// 反序列化后的结构校验
    pub fn validate(&self) -> ModelResult<()> {
        if self.trees.is_empty() {
            return Err(ModelError::ArtifactFormat("森林不包含任何树".to_string()));
        }
        if let Some(idx) = self.trees.iter().position(|t| !t.is_well_formed()) {
            return Err(ModelError::ArtifactFormat(format!("第 {} 棵树结构非法", idx)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 目标值只依赖 AQI: AQI > 200 时 400，否则 300
    fn step_samples() -> Vec<TrainingSample> {
        (0..40)
            .map(|i| {
                let aqi = 100.0 + i as f64 * 5.0;
                let mut x = [0.0; FEATURE_COUNT];
                x[2] = aqi;
                x[9] = 300.0;
                TrainingSample {
                    features: FeatureVector(x),
                    target: if aqi > 200.0 { 400.0 } else { 300.0 },
                }
            })
            .collect()
    }

    fn features_with_aqi(aqi: f64) -> FeatureVector {
        let mut x = [0.0; FEATURE_COUNT];
        x[2] = aqi;
        x[9] = 300.0;
        FeatureVector(x)
    }

    #[test]
    fn test_tree_learns_step_function() {
        let samples = step_samples();
        let indices: Vec<usize> = (0..samples.len()).collect();
        let tree = RegressionTree::fit(&samples, &indices, 10, 2);

        assert_eq!(tree.predict(&features_with_aqi(120.0)), 300.0);
        assert_eq!(tree.predict(&features_with_aqi(280.0)), 400.0);
        // 单次划分即可完全分开
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.feature_importances()[2], 1.0);
    }

    #[test]
    fn test_tree_respects_max_depth() {
        let samples: Vec<TrainingSample> = (0..64)
            .map(|i| {
                let mut x = [0.0; FEATURE_COUNT];
                x[4] = i as f64;
                TrainingSample {
                    features: FeatureVector(x),
                    target: i as f64,
                }
            })
            .collect();
        let indices: Vec<usize> = (0..samples.len()).collect();

        let tree = RegressionTree::fit(&samples, &indices, 3, 2);
        assert!(tree.depth() <= 3);
    }

    #[test]
    fn test_constant_target_yields_single_leaf() {
        let samples: Vec<TrainingSample> = step_samples()
            .into_iter()
            .map(|s| TrainingSample { target: 320.0, ..s })
            .collect();
        let indices: Vec<usize> = (0..samples.len()).collect();

        let tree = RegressionTree::fit(&samples, &indices, 10, 2);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.feature_importances().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_forest_is_deterministic_for_seed() {
        let samples = step_samples();
        let params = ForestParams {
            n_estimators: 10,
            ..ForestParams::default()
        };

        let a = RandomForest::fit(&samples, params).unwrap();
        let b = RandomForest::fit(&samples, params).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.n_trees(), 10);
    }

    #[test]
    fn test_forest_prediction_is_member_mean() {
        let samples = step_samples();
        let params = ForestParams {
            n_estimators: 8,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&samples, params).unwrap();

        let x = features_with_aqi(205.0);
        let members = forest.member_predictions(&x);
        let mean = members.iter().sum::<f64>() / members.len() as f64;
        assert!((forest.predict(&x) - mean).abs() < 1e-9);
        assert!(members.iter().all(|v| (300.0..=400.0).contains(v)));
    }

    #[test]
    fn test_forest_importances_sum_to_one() {
        let forest = RandomForest::fit(&step_samples(), ForestParams::default()).unwrap();
        let importances = forest.feature_importances();
        let total: f64 = importances.iter().sum();

        assert_eq!(importances.len(), FEATURE_COUNT);
        assert!((total - 1.0).abs() < 1e-9);
        assert!(importances[2] > 0.99);
    }

    #[test]
    fn test_forest_rejects_empty_samples() {
        let result = RandomForest::fit(&[], ForestParams::default());
        assert!(matches!(result, Err(ModelError::EmptyTrainingSet)));
    }

    #[test]
    fn test_forest_serde_keeps_predictions() {
        let params = ForestParams {
            n_estimators: 5,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&step_samples(), params).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let restored: RandomForest = serde_json::from_str(&json).unwrap();

        assert!(restored.validate().is_ok());
        let x = features_with_aqi(230.0);
        assert_eq!(forest.predict(&x), restored.predict(&x));
    }
}
