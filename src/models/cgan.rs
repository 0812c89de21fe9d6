use crate::config::{ModelConfig, OptimConfig};
use crate::error::{Error, Result};
use crate::layers::{
    sigmoid, Conv2d, ConvTranspose2d, DropoutT, EmbeddingT, Layer, LeakyReLUT, LinearT, Param,
    TanhT,
};
use crate::math::{self, Matrix};
use crate::models::Sequential;
use crate::optim::Optimizer;
use crate::rng;
use rand::rngs::StdRng;

/// Side of every image handled by the models.
pub const IMAGE_SIDE: usize = 28;
/// Pixels per single-channel image.
pub const IMAGE_PIXELS: usize = IMAGE_SIDE * IMAGE_SIDE;
/// Side of the generator's foundation feature map.
const BASE_SIDE: usize = 7;
const BASE_PIXELS: usize = BASE_SIDE * BASE_SIDE;

fn check_batch(rows: usize, labels: &[usize], n_classes: usize) -> Result<()> {
    if rows != labels.len() {
        return Err(Error::BatchMismatch {
            inputs: rows,
            labels: labels.len(),
        });
    }
    if let Some(&label) = labels.iter().find(|&&l| l >= n_classes) {
        return Err(Error::InvalidLabel { label, n_classes });
    }
    Ok(())
}

/// Conditional discriminator.
///
/// The label is embedded, projected to a 28x28 plane and stacked behind the
/// image as a second channel. Two strided 3x3 convolutions downsample to
/// 7x7 before dropout and a single-logit head.
pub struct Discriminator {
    cfg: ModelConfig,
    label_embedding: EmbeddingT,
    label_dense: LinearT,
    trunk: Sequential,
}

impl Discriminator {
    pub fn new(cfg: &ModelConfig, rng: &mut StdRng) -> Self {
        let f = cfg.filters;
        let label_embedding = EmbeddingT::new(cfg.n_classes, cfg.embedding_dim, rng);
        let label_dense = LinearT::new(cfg.embedding_dim, IMAGE_PIXELS, rng);
        let conv1 = Conv2d::same(2, f, 3, 2, rng);
        let conv2 = Conv2d::same(f, f, 3, 2, rng);
        let dropout = DropoutT::new(cfg.dropout, rng::fork(rng));
        let head = LinearT::new(f * BASE_PIXELS, 1, rng);
        let trunk = Sequential::new()
            .with(conv1)
            .with(LeakyReLUT::new(cfg.leaky_slope))
            .with(conv2)
            .with(LeakyReLUT::new(cfg.leaky_slope))
            .with(dropout)
            .with(head);
        Self {
            cfg: cfg.clone(),
            label_embedding,
            label_dense,
            trunk,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.cfg
    }

    fn stack_inputs(images: &Matrix, label_plane: &Matrix) -> Matrix {
        Matrix::hcat(images, label_plane)
    }

    /// Inference-mode logits, one per row.
    pub fn logits(&self, images: &Matrix, labels: &[usize]) -> Result<Matrix> {
        check_batch(images.rows, labels, self.cfg.n_classes)?;
        let li = self.label_embedding.forward(labels);
        let li = self.label_dense.forward(&li)?;
        Ok(self.trunk.forward(&Self::stack_inputs(images, &li))?)
    }

    /// Probability that each image is a real drawing of its label.
    pub fn predict(&self, images: &Matrix, labels: &[usize]) -> Result<Vec<f32>> {
        let mut probs = self.logits(images, labels)?;
        sigmoid::forward_matrix(&mut probs);
        Ok(probs.data)
    }

    /// Training forward pass returning logits.
    pub fn forward_train(&mut self, images: &Matrix, labels: &[usize]) -> Result<Matrix> {
        check_batch(images.rows, labels, self.cfg.n_classes)?;
        let li = self.label_embedding.forward_train(labels);
        let li = self.label_dense.forward_train(&li)?;
        Ok(self.trunk.forward_train(&Self::stack_inputs(images, &li))?)
    }

    /// Backward pass from the logit gradient. Returns the gradient with
    /// respect to the image input.
    pub fn backward(&mut self, grad_logits: &Matrix) -> Matrix {
        let grad = self.trunk.backward(grad_logits);
        let (grad_images, grad_label_plane) = grad.hsplit(IMAGE_PIXELS);
        let grad_embedding = self.label_dense.backward(&grad_label_plane);
        self.label_embedding.backward(&grad_embedding);
        grad_images
    }

    pub fn zero_grad(&mut self) {
        self.label_embedding.zero_grad();
        self.label_dense.zero_grad();
        self.trunk.zero_grad();
    }

    pub fn parameters(&mut self) -> Vec<&mut Param> {
        let mut params = self.label_embedding.parameters();
        params.extend(self.label_dense.parameters());
        params.extend(self.trunk.parameters());
        params
    }

    pub fn params(&self) -> Vec<&Param> {
        let mut params = self.label_embedding.params();
        params.extend(self.label_dense.params());
        params.extend(self.trunk.params());
        params
    }
}

/// Conditional generator.
///
/// The latent vector is projected to a `filters x 7 x 7` foundation and the
/// embedded label to one extra 7x7 plane. Two transposed convolutions
/// upsample to 28x28 and a 7x7 convolution with tanh produces the image in
/// `[-1, 1]`.
pub struct Generator {
    cfg: ModelConfig,
    label_embedding: EmbeddingT,
    label_dense: LinearT,
    latent_dense: LinearT,
    latent_act: LeakyReLUT,
    upsample: Sequential,
}

impl Generator {
    pub fn new(cfg: &ModelConfig, rng: &mut StdRng) -> Self {
        let f = cfg.filters;
        let label_embedding = EmbeddingT::new(cfg.n_classes, cfg.embedding_dim, rng);
        let label_dense = LinearT::new(cfg.embedding_dim, BASE_PIXELS, rng);
        let latent_dense = LinearT::new(cfg.latent_dim, f * BASE_PIXELS, rng);
        let up1 = ConvTranspose2d::new(f + 1, f, 4, 2, 1, rng);
        let up2 = ConvTranspose2d::new(f, f, 4, 2, 1, rng);
        let out = Conv2d::same(f, 1, 7, 1, rng);
        let upsample = Sequential::new()
            .with(up1)
            .with(LeakyReLUT::new(cfg.leaky_slope))
            .with(up2)
            .with(LeakyReLUT::new(cfg.leaky_slope))
            .with(out)
            .with(TanhT::new());
        Self {
            cfg: cfg.clone(),
            label_embedding,
            label_dense,
            latent_dense,
            latent_act: LeakyReLUT::new(cfg.leaky_slope),
            upsample,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.cfg
    }

    /// Generate images in inference mode. Rows of the result are 28x28
    /// images with values in `[-1, 1]`.
    pub fn forward(&self, z: &Matrix, labels: &[usize]) -> Result<Matrix> {
        check_batch(z.rows, labels, self.cfg.n_classes)?;
        let foundation = self.latent_act.forward(&self.latent_dense.forward(z)?)?;
        let li = self.label_dense.forward(&self.label_embedding.forward(labels))?;
        Ok(self.upsample.forward(&Matrix::hcat(&foundation, &li))?)
    }

    pub fn forward_train(&mut self, z: &Matrix, labels: &[usize]) -> Result<Matrix> {
        check_batch(z.rows, labels, self.cfg.n_classes)?;
        let foundation = self.latent_dense.forward_train(z)?;
        let foundation = self.latent_act.forward_train(&foundation)?;
        let li = self.label_embedding.forward_train(labels);
        let li = self.label_dense.forward_train(&li)?;
        Ok(self.upsample.forward_train(&Matrix::hcat(&foundation, &li))?)
    }

    /// Backward pass from the gradient with respect to the generated images.
    pub fn backward(&mut self, grad_images: &Matrix) {
        let grad = self.upsample.backward(grad_images);
        let (grad_foundation, grad_label_plane) = grad.hsplit(self.cfg.filters * BASE_PIXELS);
        let grad_foundation = self.latent_act.backward(&grad_foundation);
        self.latent_dense.backward(&grad_foundation);
        let grad_embedding = self.label_dense.backward(&grad_label_plane);
        self.label_embedding.backward(&grad_embedding);
    }

    pub fn zero_grad(&mut self) {
        self.label_embedding.zero_grad();
        self.label_dense.zero_grad();
        self.latent_dense.zero_grad();
        self.upsample.zero_grad();
    }

    pub fn parameters(&mut self) -> Vec<&mut Param> {
        let mut params = self.label_embedding.parameters();
        params.extend(self.label_dense.parameters());
        params.extend(self.latent_dense.parameters());
        params.extend(self.upsample.parameters());
        params
    }

    pub fn params(&self) -> Vec<&Param> {
        let mut params = self.label_embedding.params();
        params.extend(self.label_dense.params());
        params.extend(self.latent_dense.params());
        params.extend(self.upsample.params());
        params
    }
}

/// Generator, discriminator and the two optimizers that update them.
///
/// The combined model is not a separate network: a generator step runs the
/// generator into the discriminator, backpropagates through both and only
/// applies the update to the generator.
pub struct CGan {
    pub generator: Generator,
    pub discriminator: Discriminator,
    d_opt: Box<dyn Optimizer>,
    g_opt: Box<dyn Optimizer>,
}

impl CGan {
    pub fn new(cfg: &ModelConfig, optim: &OptimConfig, rng: &mut StdRng) -> Self {
        Self {
            discriminator: Discriminator::new(cfg, rng),
            generator: Generator::new(cfg, rng),
            d_opt: Box::new(optim.build()),
            g_opt: Box::new(optim.build()),
        }
    }

    /// One discriminator update on a batch that is entirely real
    /// (`target = 1.0`) or entirely generated (`target = 0.0`).
    ///
    /// Returns `(loss, accuracy)`.
    pub fn train_discriminator(
        &mut self,
        images: &Matrix,
        labels: &[usize],
        target: f32,
    ) -> Result<(f32, f32)> {
        self.discriminator.zero_grad();
        let logits = self.discriminator.forward_train(images, labels)?;
        let targets = vec![target; logits.rows];
        let (loss, grad) = math::binary_cross_entropy(&logits, &targets);
        let mut probs = logits;
        sigmoid::forward_matrix(&mut probs);
        let acc = math::binary_accuracy(&probs.data, &targets);
        self.discriminator.backward(&grad);
        self.d_opt.step(&mut self.discriminator.parameters());
        Ok((loss, acc))
    }

    /// One update of the combined model: generated images are labelled real
    /// and the error flows back through the frozen discriminator into the
    /// generator. Returns the generator loss.
    pub fn train_generator(&mut self, z: &Matrix, labels: &[usize]) -> Result<f32> {
        self.generator.zero_grad();
        self.discriminator.zero_grad();
        let fake = self.generator.forward_train(z, labels)?;
        let logits = self.discriminator.forward_train(&fake, labels)?;
        let targets = vec![1.0; logits.rows];
        let (loss, grad) = math::binary_cross_entropy(&logits, &targets);
        let grad_images = self.discriminator.backward(&grad);
        self.generator.backward(&grad_images);
        self.g_opt.step(&mut self.generator.parameters());
        // Discriminator gradients from this pass must not leak into its next
        // update.
        self.discriminator.zero_grad();
        Ok(loss)
    }

    /// Generate images in inference mode.
    pub fn generate(&self, z: &Matrix, labels: &[usize]) -> Result<Matrix> {
        self.generator.forward(z, labels)
    }
}
