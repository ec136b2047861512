//! 2層の全結合ネットワーク。隠れ層は ReLU、出力層は softmax。
use std::f32::consts::PI;

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use rand::Rng;

/// 全結合層。`weights` は `入力数 × 出力数`。
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Dense {
    pub(super) weights: Array2<f32>,
    pub(super) bias: Array1<f32>,
}

impl Dense {
    /// Xavier 正規分布（分散 `2 / (fan_in + fan_out)`）で重みを初期化する。バイアスは0。
    fn xavier<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let std_dev = (2.0 / (fan_in + fan_out) as f32).sqrt();
        let weights =
            Array2::from_shape_simple_fn((fan_in, fan_out), || std_dev * standard_normal(rng));
        Self {
            weights,
            bias: Array1::zeros(fan_out),
        }
    }

    fn forward(&self, input: ArrayView2<'_, f32>) -> Array2<f32> {
        input.dot(&self.weights) + &self.bias
    }
}

/// Box-Muller 法による標準正規乱数。
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let u1: f32 = rng.random_range(f32::EPSILON..1.0);
    let u2: f32 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// 1ミニバッチ分の勾配。形状はパラメータと同じ。
#[derive(Debug, Clone)]
pub(super) struct Gradients {
    pub(super) hidden_weights: Array2<f32>,
    pub(super) hidden_bias: Array1<f32>,
    pub(super) output_weights: Array2<f32>,
    pub(super) output_bias: Array1<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Network {
    pub(super) hidden: Dense,
    pub(super) output: Dense,
}

impl Network {
    /// 隠れ層、出力層の順に同じ乱数列から初期化する。
    pub(super) fn new<R: Rng + ?Sized>(
        inputs: usize,
        hidden: usize,
        classes: usize,
        rng: &mut R,
    ) -> Self {
        let hidden = Dense::xavier(inputs, hidden, rng);
        let output = Dense::xavier(hidden.weights.ncols(), classes, rng);
        Self { hidden, output }
    }

    pub(super) fn input_dim(&self) -> usize {
        self.hidden.weights.nrows()
    }

    /// 各行のクラス確率を返す。
    pub(super) fn forward(&self, input: ArrayView2<'_, f32>) -> Array2<f32> {
        let activated = self.hidden.forward(input).mapv(relu);
        softmax_rows(self.output.forward(activated.view()))
    }

    /// softmax 出力に対するヒンジ損失（目標は ±1）と、その勾配を計算する。
    ///
    /// 損失・勾配ともにバッチ平均。L2 正則化は含まない。
    pub(super) fn hinge_gradients(
        &self,
        input: ArrayView2<'_, f32>,
        targets: ArrayView2<'_, f32>,
    ) -> (f32, Gradients) {
        #[allow(clippy::cast_precision_loss)]
        let batch = input.nrows().max(1) as f32;

        let pre_activation = self.hidden.forward(input);
        let activated = pre_activation.mapv(relu);
        let probabilities = softmax_rows(self.output.forward(activated.view()));

        let signs = targets.mapv(|t| 2.0 * t - 1.0);
        let margins = Zip::from(&signs)
            .and(&probabilities)
            .map_collect(|&y, &p| 1.0 - y * p);
        let loss = margins.mapv(|m| m.max(0.0)).sum() / batch;

        // 損失が正の成分だけ -y を流す
        let grad_probabilities = Zip::from(&signs)
            .and(&margins)
            .map_collect(|&y, &m| if m > 0.0 { -y } else { 0.0 });

        // softmax の逆伝播: dz = p * (g - Σ g·p)
        let weighted = (&grad_probabilities * &probabilities)
            .sum_axis(Axis(1))
            .insert_axis(Axis(1));
        let grad_logits = &probabilities * &(&grad_probabilities - &weighted) / batch;

        let output_weights = activated.t().dot(&grad_logits);
        let output_bias = grad_logits.sum_axis(Axis(0));

        let grad_activated = grad_logits.dot(&self.output.weights.t());
        let grad_pre = Zip::from(&grad_activated)
            .and(&pre_activation)
            .map_collect(|&g, &z| if z > 0.0 { g } else { 0.0 });

        let hidden_weights = input.t().dot(&grad_pre);
        let hidden_bias = grad_pre.sum_axis(Axis(0));

        (
            loss,
            Gradients {
                hidden_weights,
                hidden_bias,
                output_weights,
                output_bias,
            },
        )
    }
}

fn relu(value: f32) -> f32 {
    value.max(0.0)
}

fn softmax_rows(mut logits: Array2<f32>) -> Array2<f32> {
    for mut row in logits.rows_mut() {
        let max = row.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }
    logits
}
