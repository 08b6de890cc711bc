use rand::Rng;

fn relu(x: f64) -> f64 {
    x.max(0.0)
}

/// Fully connected layer, weights stored row-major as `[output][input]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    inputs: usize,
    outputs: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl DenseLayer {
    /// He-uniform initialisation, zero biases.
    pub fn new<R: Rng + ?Sized>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let limit = (6.0 / inputs as f64).sqrt();
        let weights = (0..inputs * outputs).map(|_| rng.random_range(-limit..limit)).collect();
        Self { inputs, outputs, weights, biases: vec![0.0; outputs] }
    }

    fn forward(&self, input: &[f64], activate: bool) -> Vec<f64> {
        (0..self.outputs)
            .map(|o| {
                let row = &self.weights[o * self.inputs..(o + 1) * self.inputs];
                let z = self.biases[o] + row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>();
                if activate { relu(z) } else { z }
            })
            .collect()
    }
}

/// Parameter-shaped accumulator for one network.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    layers: Vec<(Vec<f64>, Vec<f64>)>,
}

impl Gradients {
    pub fn zeros_like(network: &ValueNetwork) -> Self {
        Self { layers: network.layers.iter().map(|l| (vec![0.0; l.weights.len()], vec![0.0; l.biases.len()])).collect() }
    }

    pub fn scale(&mut self, factor: f64) {
        for (weights, biases) in &mut self.layers {
            weights.iter_mut().chain(biases.iter_mut()).for_each(|g| *g *= factor);
        }
    }
}

/// Activations recorded during a forward pass, input first, network output last.
#[derive(Debug, Clone)]
pub struct ForwardTrace {
    activations: Vec<Vec<f64>>,
}

impl ForwardTrace {
    pub fn output(&self) -> &[f64] {
        self.activations.last().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Feed-forward value approximator: input -> hidden (ReLU) -> hidden (ReLU) -> one value per action.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNetwork {
    layers: Vec<DenseLayer>,
}

impl ValueNetwork {
    pub fn new<R: Rng + ?Sized>(inputs: usize, hidden: usize, outputs: usize, rng: &mut R) -> Self {
        Self { layers: vec![DenseLayer::new(inputs, hidden, rng), DenseLayer::new(hidden, hidden, rng), DenseLayer::new(hidden, outputs, rng)] }
    }

    pub fn forward_trace(&self, input: &[f64]) -> ForwardTrace {
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.to_vec());
        let last = self.layers.len() - 1;

        for (i, layer) in self.layers.iter().enumerate() {
            let next = layer.forward(&activations[i], i != last);
            activations.push(next);
        }

        ForwardTrace { activations }
    }

    pub fn predict(&self, input: &[f64]) -> Vec<f64> {
        let mut activations = input.to_vec();
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            activations = layer.forward(&activations, i != last);
        }
        activations
    }

    /// Backpropagates `output_grad` (dLoss/dOutput) through the pass recorded in `trace`
    /// and adds the parameter gradients to `grads`.
    pub fn accumulate_gradients(&self, trace: &ForwardTrace, output_grad: &[f64], grads: &mut Gradients) {
        let mut delta = output_grad.to_vec();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let input = &trace.activations[i];
            let (weight_grads, bias_grads) = &mut grads.layers[i];

            for o in 0..layer.outputs {
                bias_grads[o] += delta[o];
                for (k, x) in input.iter().enumerate() {
                    weight_grads[o * layer.inputs + k] += delta[o] * x;
                }
            }

            if i == 0 {
                break;
            }
            // The input of layer i is the ReLU output of layer i - 1; its derivative is 1 where positive.
            delta = (0..layer.inputs)
                .map(|k| {
                    if input[k] <= 0.0 {
                        return 0.0;
                    }
                    (0..layer.outputs).map(|o| layer.weights[o * layer.inputs + k] * delta[o]).sum()
                })
                .collect();
        }
    }

    /// Hard copy of every parameter of `source`.
    pub fn copy_from(&mut self, source: &ValueNetwork) {
        self.layers.clone_from(&source.layers);
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.weights.len() + l.biases.len()).sum()
    }
}

/// Adam with the usual defaults for the moment decay rates.
#[derive(Debug, Clone)]
pub struct AdamOptimizer {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
    first_moment: Gradients,
    second_moment: Gradients,
}

impl AdamOptimizer {
    pub fn new(network: &ValueNetwork, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            step: 0,
            first_moment: Gradients::zeros_like(network),
            second_moment: Gradients::zeros_like(network),
        }
    }

    pub fn step(&mut self, network: &mut ValueNetwork, grads: &Gradients) {
        self.step = self.step.saturating_add(1);
        let bias1 = 1.0 - self.beta1.powi(self.step);
        let bias2 = 1.0 - self.beta2.powi(self.step);

        for (layer_index, layer) in network.layers.iter_mut().enumerate() {
            let (grad_w, grad_b) = &grads.layers[layer_index];
            let (m_w, m_b) = &mut self.first_moment.layers[layer_index];
            let (v_w, v_b) = &mut self.second_moment.layers[layer_index];

            let params = layer.weights.iter_mut().chain(layer.biases.iter_mut());
            let gradients = grad_w.iter().chain(grad_b.iter());
            let firsts = m_w.iter_mut().chain(m_b.iter_mut());
            let seconds = v_w.iter_mut().chain(v_b.iter_mut());

            for (((param, grad), m), v) in params.zip(gradients).zip(firsts).zip(seconds) {
                *m = self.beta1 * *m + (1.0 - self.beta1) * grad;
                *v = self.beta2 * *v + (1.0 - self.beta2) * grad * grad;
                let m_hat = *m / bias1;
                let v_hat = *v / bias2;
                *param -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            }
        }
    }
}
