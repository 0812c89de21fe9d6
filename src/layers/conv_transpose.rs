use super::conv::{col2im, im2col, planes_to_positions, positions_to_planes, square_side, Geometry};
use super::layer::{Layer, LayerError};
use super::param::Param;
use crate::math::Matrix;
use rand::Rng;

/// Transposed 2D convolution (fractionally strided convolution).
///
/// Implemented as the adjoint of [`super::Conv2d`]: every input pixel is
/// multiplied by the `(in_channels, out_channels * k * k)` kernel and the
/// resulting windows are scatter-added onto the output with `col2im`. The
/// output side is `(side - 1) * stride - 2 * padding + kernel`, so a kernel
/// of 4 with stride 2 and padding 1 exactly doubles the input.
pub struct ConvTranspose2d {
    pub w: Param,
    pub b: Param,
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    stride: usize,
    padding: usize,
    last_x: Matrix,
    last_geometry: Geometry,
}

impl ConvTranspose2d {
    pub fn new<R: Rng>(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        rng: &mut R,
    ) -> Self {
        let kk = kernel_size * kernel_size;
        Self {
            w: Param::glorot(
                in_channels,
                out_channels * kk,
                in_channels * kk,
                out_channels * kk,
                rng,
            ),
            b: Param::zeros(1, out_channels),
            in_channels,
            out_channels,
            kernel_size,
            stride,
            padding,
            last_x: Matrix::zeros(0, 0),
            last_geometry: Geometry::default(),
        }
    }

    /// Output side length for an input of side `size`.
    pub fn output_side(&self, size: usize) -> usize {
        (size - 1) * self.stride + self.kernel_size - 2 * self.padding
    }

    // The geometry describes the *output* image: the kernel slides over it
    // and each input pixel is one kernel position.
    fn geometry(&self, x: &Matrix) -> Result<Geometry, LayerError> {
        let side = square_side(x.cols, self.in_channels)?;
        Ok(Geometry {
            channels: self.out_channels,
            size: self.output_side(side),
            out: side,
            kernel: self.kernel_size,
            stride: self.stride,
            padding: self.padding,
        })
    }

    fn run(&self, x: &Matrix, g: &Geometry) -> Matrix {
        let plane = g.size * g.size;
        let out_features = self.out_channels * plane;
        let mut out = Matrix::zeros(x.rows, out_features);
        for b in 0..x.rows {
            let pixels = planes_to_positions(x.row(b), self.in_channels);
            let cols = Matrix::matmul(&pixels, &self.w.value);
            let dst = &mut out.data[b * out_features..(b + 1) * out_features];
            col2im(&cols, g, dst);
            for (c, &bias) in self.b.value.data.iter().enumerate() {
                for v in &mut dst[c * plane..(c + 1) * plane] {
                    *v += bias;
                }
            }
        }
        out
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }
}

impl Layer for ConvTranspose2d {
    fn forward(&self, x: &Matrix) -> Result<Matrix, LayerError> {
        let g = self.geometry(x)?;
        Ok(self.run(x, &g))
    }

    fn forward_train(&mut self, x: &Matrix) -> Result<Matrix, LayerError> {
        let g = self.geometry(x)?;
        self.last_x = x.clone();
        self.last_geometry = g;
        Ok(self.run(x, &g))
    }

    fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        let g = self.last_geometry;
        let plane = g.size * g.size;
        let w_t = self.w.value.transpose();
        let in_features = self.last_x.cols;
        let mut grad_in = Matrix::zeros(self.last_x.rows, in_features);
        let mut grad_w = vec![0.0; self.w.len()];
        let mut grad_b = vec![0.0; self.out_channels];
        for b in 0..grad_out.rows {
            let gy = grad_out.row(b);
            for (c, acc) in grad_b.iter_mut().enumerate() {
                *acc += gy[c * plane..(c + 1) * plane].iter().sum::<f32>();
            }
            let grad_cols = im2col(gy, &g);
            let pixels = planes_to_positions(self.last_x.row(b), self.in_channels);
            let gw = Matrix::matmul(&pixels.transpose(), &grad_cols);
            for (acc, v) in grad_w.iter_mut().zip(&gw.data) {
                *acc += v;
            }
            let grad_pixels = Matrix::matmul(&grad_cols, &w_t);
            positions_to_planes(
                &grad_pixels,
                &mut grad_in.data[b * in_features..(b + 1) * in_features],
            );
        }
        self.w.accumulate(&grad_w);
        self.b.accumulate(&grad_b);
        grad_in
    }

    fn parameters(&mut self) -> Vec<&mut Param> {
        vec![&mut self.w, &mut self.b]
    }

    fn params(&self) -> Vec<&Param> {
        vec![&self.w, &self.b]
    }
}
