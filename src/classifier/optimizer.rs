//! Adam オプティマイザ。L2 正則化は重みにだけ掛け、バイアスには掛けない。
use ndarray::{Array, Dimension, Zip};

use super::network::{Gradients, Network};

/// Adam のハイパーパラメータ。
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct AdamConfig {
    pub(super) learning_rate: f32,
    pub(super) beta1: f32,
    pub(super) beta2: f32,
    pub(super) epsilon: f32,
    pub(super) l2: f32,
}

/// 1パラメータ分の一次・二次モーメント。
#[derive(Debug, Clone)]
struct Moments<D: Dimension> {
    first: Array<f32, D>,
    second: Array<f32, D>,
}

impl<D: Dimension> Moments<D> {
    fn like(param: &Array<f32, D>) -> Self {
        Self {
            first: Array::zeros(param.raw_dim()),
            second: Array::zeros(param.raw_dim()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Step {
    config: AdamConfig,
    first_correction: f32,
    second_correction: f32,
}

impl Step {
    fn apply<D: Dimension>(
        self,
        param: &mut Array<f32, D>,
        moments: &mut Moments<D>,
        grad: &Array<f32, D>,
        decay: f32,
    ) {
        let AdamConfig {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            ..
        } = self.config;
        Zip::from(param)
            .and(&mut moments.first)
            .and(&mut moments.second)
            .and(grad)
            .for_each(|p, m, v, &g| {
                let g = g + decay * *p;
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let m_hat = *m / self.first_correction;
                let v_hat = *v / self.second_correction;
                *p -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
            });
    }
}

#[derive(Debug, Clone)]
pub(super) struct Adam {
    config: AdamConfig,
    step: i32,
    hidden_weights: Moments<ndarray::Ix2>,
    hidden_bias: Moments<ndarray::Ix1>,
    output_weights: Moments<ndarray::Ix2>,
    output_bias: Moments<ndarray::Ix1>,
}

impl Adam {
    pub(super) fn new(config: AdamConfig, network: &Network) -> Self {
        Self {
            config,
            step: 0,
            hidden_weights: Moments::like(&network.hidden.weights),
            hidden_bias: Moments::like(&network.hidden.bias),
            output_weights: Moments::like(&network.output.weights),
            output_bias: Moments::like(&network.output.bias),
        }
    }

    /// 勾配を1回適用する。
    pub(super) fn step(&mut self, network: &mut Network, gradients: &Gradients) {
        self.step = self.step.saturating_add(1);
        let step = Step {
            config: self.config,
            first_correction: 1.0 - self.config.beta1.powi(self.step),
            second_correction: 1.0 - self.config.beta2.powi(self.step),
        };
        let l2 = self.config.l2;

        step.apply(
            &mut network.hidden.weights,
            &mut self.hidden_weights,
            &gradients.hidden_weights,
            l2,
        );
        step.apply(
            &mut network.hidden.bias,
            &mut self.hidden_bias,
            &gradients.hidden_bias,
            0.0,
        );
        step.apply(
            &mut network.output.weights,
            &mut self.output_weights,
            &gradients.output_weights,
            l2,
        );
        step.apply(
            &mut network.output.bias,
            &mut self.output_bias,
            &gradients.output_bias,
            0.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    fn config(l2: f32) -> AdamConfig {
        AdamConfig {
            learning_rate: 0.02,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            l2,
        }
    }

    #[test]
    fn first_step_moves_each_parameter_by_learning_rate() {
        let mut moments = Moments::like(&array![0.0_f32, 0.0]);
        let mut param = array![1.0_f32, -1.0];
        let step = Step {
            config: config(0.0),
            first_correction: 0.1,
            second_correction: 0.001,
        };
        step.apply(&mut param, &mut moments, &array![0.5, -3.0], 0.0);
        assert!((param[0] - 0.98).abs() < 1e-5);
        assert!((param[1] + 0.98).abs() < 1e-5);
    }

    #[test]
    fn zero_gradient_leaves_biases_untouched_but_decays_weights() {
        let mut network = Network::new(2, 3, 2, &mut StdRng::seed_from_u64(42));
        let before = network.clone();
        let mut adam = Adam::new(config(1e-4), &network);
        let gradients = Gradients {
            hidden_weights: ndarray::Array2::zeros((2, 3)),
            hidden_bias: ndarray::Array1::zeros(3),
            output_weights: ndarray::Array2::zeros((3, 2)),
            output_bias: ndarray::Array1::zeros(2),
        };
        adam.step(&mut network, &gradients);

        assert_eq!(network.hidden.bias, before.hidden.bias);
        assert_eq!(network.output.bias, before.output.bias);
        assert_ne!(network.hidden.weights, before.hidden.weights);
    }

    #[test]
    fn repeated_steps_reduce_training_loss() {
        let mut network = Network::new(2, 15, 2, &mut StdRng::seed_from_u64(42));
        let mut adam = Adam::new(config(1e-4), &network);
        let input = array![[1.0, 0.1], [0.9, 0.0], [0.1, 1.0], [0.0, 0.8]];
        let targets = array![[1.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 1.0]];

        let (initial, _) = network.hinge_gradients(input.view(), targets.view());
        for _ in 0..50 {
            let (_, gradients) = network.hinge_gradients(input.view(), targets.view());
            adam.step(&mut network, &gradients);
        }
        let (trained, _) = network.hinge_gradients(input.view(), targets.view());
        assert!(trained < initial);
    }
}
