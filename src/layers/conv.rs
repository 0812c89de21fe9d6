use super::layer::{Layer, LayerError};
use super::param::Param;
use crate::math::Matrix;
use rand::Rng;

/// Sliding-window geometry shared by convolution and its transpose.
///
/// `size` is the side of the (square) image the kernel slides over and
/// `out` the number of kernel positions along each side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Geometry {
    pub channels: usize,
    pub size: usize,
    pub out: usize,
    pub kernel: usize,
    pub stride: usize,
    pub padding: usize,
}

impl Geometry {
    /// Number of kernel positions, i.e. rows of the im2col matrix.
    pub fn positions(&self) -> usize {
        self.out * self.out
    }

    /// Length of one unrolled patch, i.e. columns of the im2col matrix.
    pub fn patch(&self) -> usize {
        self.channels * self.kernel * self.kernel
    }

    /// Image coordinate covered by kernel offset `k` at output index `o`, or
    /// `None` when it falls into the zero padding.
    fn source(&self, o: usize, k: usize) -> Option<usize> {
        let i = (o * self.stride + k) as isize - self.padding as isize;
        if i >= 0 && (i as usize) < self.size {
            Some(i as usize)
        } else {
            None
        }
    }
}

/// Unroll every kernel window of a single channel-major image into a row.
pub fn im2col(img: &[f32], g: &Geometry) -> Matrix {
    let plane = g.size * g.size;
    let mut cols = Matrix::zeros(g.positions(), g.patch());
    for oh in 0..g.out {
        for ow in 0..g.out {
            let row = oh * g.out + ow;
            let dst = &mut cols.data[row * g.patch()..(row + 1) * g.patch()];
            let mut col_idx = 0;
            for ic in 0..g.channels {
                for kh in 0..g.kernel {
                    for kw in 0..g.kernel {
                        if let (Some(ih), Some(iw)) = (g.source(oh, kh), g.source(ow, kw)) {
                            dst[col_idx] = img[ic * plane + ih * g.size + iw];
                        }
                        col_idx += 1;
                    }
                }
            }
        }
    }
    cols
}

/// Scatter-add unrolled windows back onto a channel-major image.
pub fn col2im(cols: &Matrix, g: &Geometry, img: &mut [f32]) {
    let plane = g.size * g.size;
    for oh in 0..g.out {
        for ow in 0..g.out {
            let row = cols.row(oh * g.out + ow);
            let mut col_idx = 0;
            for ic in 0..g.channels {
                for kh in 0..g.kernel {
                    for kw in 0..g.kernel {
                        if let (Some(ih), Some(iw)) = (g.source(oh, kh), g.source(ow, kw)) {
                            img[ic * plane + ih * g.size + iw] += row[col_idx];
                        }
                        col_idx += 1;
                    }
                }
            }
        }
    }
}

/// Convert a `(positions, channels)` matrix into one channel-major row.
pub(crate) fn positions_to_planes(m: &Matrix, out: &mut [f32]) {
    let positions = m.rows;
    for p in 0..positions {
        for (c, &v) in m.row(p).iter().enumerate() {
            out[c * positions + p] = v;
        }
    }
}

/// Inverse of [`positions_to_planes`].
pub(crate) fn planes_to_positions(planes: &[f32], channels: usize) -> Matrix {
    let positions = planes.len() / channels;
    let mut m = Matrix::zeros(positions, channels);
    for c in 0..channels {
        for p in 0..positions {
            m.data[p * channels + c] = planes[c * positions + p];
        }
    }
    m
}

/// Split a row of `features` values into `channels` square planes and
/// return the side length.
pub(crate) fn square_side(features: usize, channels: usize) -> Result<usize, LayerError> {
    if channels == 0 || features % channels != 0 {
        return Err(LayerError::ChannelMismatch {
            features,
            in_channels: channels,
        });
    }
    let hw = features / channels;
    let side = (hw as f64).sqrt().round() as usize;
    if side * side != hw {
        return Err(LayerError::NonSquareInput { size: hw });
    }
    Ok(side)
}

/// 2D convolution layer using im2col and a dense kernel matrix.
///
/// Only square inputs are supported. Each input row holds
/// `in_channels * height * width` values with `height == width`. The
/// kernel is stored as a `(in_channels * k * k, out_channels)` matrix and a
/// bias per output channel. The im2col buffer is built one sample at a time,
/// which keeps memory bounded for large kernels.
pub struct Conv2d {
    pub w: Param,
    pub b: Param,
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    stride: usize,
    padding: usize,
    // Cached input and window geometry from the last training forward pass.
    last_x: Matrix,
    last_geometry: Geometry,
}

impl Conv2d {
    /// Create a new convolution layer.
    pub fn new<R: Rng>(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        rng: &mut R,
    ) -> Self {
        let patch = in_channels * kernel_size * kernel_size;
        let fan_out = out_channels * kernel_size * kernel_size;
        Self {
            w: Param::glorot(patch, out_channels, patch, fan_out, rng),
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

    /// Convolution whose output keeps the input side length when
    /// `stride == 1`, and is `ceil(side / stride)` for odd kernels otherwise.
    pub fn same<R: Rng>(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        rng: &mut R,
    ) -> Self {
        Self::new(in_channels, out_channels, kernel_size, stride, kernel_size / 2, rng)
    }

    fn geometry(&self, x: &Matrix) -> Result<Geometry, LayerError> {
        let size = square_side(x.cols, self.in_channels)?;
        let out = (size + 2 * self.padding - self.kernel_size) / self.stride + 1;
        Ok(Geometry {
            channels: self.in_channels,
            size,
            out,
            kernel: self.kernel_size,
            stride: self.stride,
            padding: self.padding,
        })
    }

    /// Output side length for an input of side `size`.
    pub fn output_side(&self, size: usize) -> usize {
        (size + 2 * self.padding - self.kernel_size) / self.stride + 1
    }

    fn run(&self, x: &Matrix, g: &Geometry) -> Matrix {
        let out_features = self.out_channels * g.positions();
        let mut out = Matrix::zeros(x.rows, out_features);
        for b in 0..x.rows {
            let cols = im2col(x.row(b), g);
            let y = Matrix::matmul(&cols, &self.w.value);
            let dst = &mut out.data[b * out_features..(b + 1) * out_features];
            positions_to_planes(&y, dst);
            for (c, &bias) in self.b.value.data.iter().enumerate() {
                for v in &mut dst[c * g.positions()..(c + 1) * g.positions()] {
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

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn padding(&self) -> usize {
        self.padding
    }
}

impl Layer for Conv2d {
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
        let w_t = self.w.value.transpose();
        let mut grad_in = Matrix::zeros(self.last_x.rows, self.last_x.cols);
        let mut grad_w = vec![0.0; self.w.len()];
        let mut grad_b = vec![0.0; self.out_channels];
        for b in 0..grad_out.rows {
            let gy = planes_to_positions(grad_out.row(b), self.out_channels);
            for (acc, v) in grad_b.iter_mut().zip(gy.sum_rows()) {
                *acc += v;
            }
            let cols = im2col(self.last_x.row(b), &g);
            let gw = Matrix::matmul(&cols.transpose(), &gy);
            for (acc, v) in grad_w.iter_mut().zip(&gw.data) {
                *acc += v;
            }
            let grad_cols = Matrix::matmul(&gy, &w_t);
            let cols_n = self.last_x.cols;
            col2im(&grad_cols, &g, &mut grad_in.data[b * cols_n..(b + 1) * cols_n]);
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
