// ============================================================
// Layer 5 — Parameter Initialisation
// ============================================================
// Glorot / Xavier uniform for every parameter with two or more
// dimensions; vectors (biases, LayerNorm gamma/beta) keep the
// values Burn gave them.
//
//   bound = gain · sqrt(6 / (fan_in + fan_out))
//   w ~ U(-bound, bound)
//
// Reference: Glorot & Bengio (2010)

use burn::{
    module::{ModuleMapper, Param},
    prelude::*,
    tensor::Distribution,
};

#[derive(Debug, Clone, Copy)]
pub struct XavierUniform {
    gain: f64,
}

impl XavierUniform {
    pub fn new() -> Self {
        Self { gain: 1.0 }
    }

    /// Sampling bound for a weight of the given shape.
    pub fn bound(&self, dims: &[usize]) -> f64 {
        let (fan_in, fan_out) = fans(dims);
        self.gain * (6.0 / (fan_in + fan_out) as f64).sqrt()
    }
}

impl Default for XavierUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// (fan_in, fan_out) with trailing dims treated as a receptive field.
fn fans(dims: &[usize]) -> (usize, usize) {
    let receptive: usize = dims.iter().skip(2).product();
    (dims[1] * receptive, dims[0] * receptive)
}

impl<B: Backend> ModuleMapper<B> for XavierUniform {
    fn map_float<const D: usize>(&mut self, param: Param<Tensor<B, D>>) -> Param<Tensor<B, D>> {
        param.map(|tensor| {
            if D < 2 {
                return tensor;
            }
            let dims  = tensor.dims();
            let bound = self.bound(&dims);
            Tensor::random(dims, Distribution::Uniform(-bound, bound), &tensor.device())
                .set_require_grad(tensor.is_require_grad())
        })
    }
}
