use doodlegan::layers::{
    Conv2d, ConvTranspose2d, DropoutT, EmbeddingT, Layer, LayerError, LeakyReLUT, LinearT, TanhT,
};
use doodlegan::math::Matrix;
use doodlegan::rng::rng_from_seed;
use rand::Rng;

fn random_matrix(rows: usize, cols: usize, seed: u64) -> Matrix {
    let mut rng = rng_from_seed(Some(seed));
    let data = (0..rows * cols).map(|_| rng.gen_range(-1.0..1.0)).collect();
    Matrix::from_vec(rows, cols, data)
}

fn weighted_sum(y: &Matrix, r: &Matrix) -> f32 {
    y.data.iter().zip(&r.data).map(|(a, b)| a * b).sum()
}

#[test]
fn conv_forward_accepts_valid_square() {
    let mut rng = rng_from_seed(Some(1));
    let conv = Conv2d::new(1, 1, 1, 1, 0, &mut rng);
    let x = Matrix::from_vec(1, 4, vec![1.0, 2.0, 3.0, 4.0]);
    assert!(conv.forward(&x).is_ok());
}

#[test]
fn conv_forward_errors_on_channel_mismatch() {
    let mut rng = rng_from_seed(Some(1));
    let conv = Conv2d::new(3, 1, 1, 1, 0, &mut rng);
    let x = Matrix::from_vec(1, 7, vec![0.0; 7]);
    assert!(matches!(
        conv.forward(&x),
        Err(LayerError::ChannelMismatch { .. })
    ));
}

#[test]
fn conv_forward_errors_on_non_square_input() {
    let mut rng = rng_from_seed(Some(1));
    let conv = Conv2d::new(1, 1, 1, 1, 0, &mut rng);
    let x = Matrix::from_vec(1, 3, vec![0.0; 3]);
    assert!(matches!(
        conv.forward(&x),
        Err(LayerError::NonSquareInput { .. })
    ));
}

#[test]
fn strided_same_conv_halves_the_side() {
    let mut rng = rng_from_seed(Some(2));
    let conv = Conv2d::same(2, 4, 3, 2, &mut rng);
    let x = random_matrix(3, 2 * 28 * 28, 3);
    let y = conv.forward(&x).unwrap();
    assert_eq!((y.rows, y.cols), (3, 4 * 14 * 14));
    assert_eq!(conv.output_side(14), 7);
}

#[test]
fn identity_kernel_copies_input() {
    let mut rng = rng_from_seed(Some(4));
    let mut conv = Conv2d::same(1, 1, 3, 1, &mut rng);
    conv.w.value.data = vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    let x = random_matrix(2, 16, 5);
    assert_eq!(conv.forward(&x).unwrap(), x);
}

#[test]
fn transposed_conv_doubles_the_side() {
    let mut rng = rng_from_seed(Some(6));
    let up = ConvTranspose2d::new(3, 2, 4, 2, 1, &mut rng);
    let x = random_matrix(2, 3 * 7 * 7, 7);
    let y = up.forward(&x).unwrap();
    assert_eq!((y.rows, y.cols), (2, 2 * 14 * 14));
    assert_eq!(up.output_side(14), 28);
}

// The loss sum(y * r) is linear in both the input and the weights, so central
// differences match the analytic gradient up to rounding.
#[test]
fn transposed_conv_gradients_match_finite_differences() {
    let mut rng = rng_from_seed(Some(8));
    let mut up = ConvTranspose2d::new(2, 3, 4, 2, 1, &mut rng);
    let x = random_matrix(1, 2 * 3 * 3, 9);
    let y = up.forward_train(&x).unwrap();
    let r = random_matrix(1, y.cols, 10);
    let grad_x = up.backward(&r);
    let eps = 1e-2;

    for i in [0, 5, 11, 17] {
        let mut plus = x.clone();
        plus.data[i] += eps;
        let mut minus = x.clone();
        minus.data[i] -= eps;
        let numeric = (weighted_sum(&up.forward(&plus).unwrap(), &r)
            - weighted_sum(&up.forward(&minus).unwrap(), &r))
            / (2.0 * eps);
        assert!(
            (numeric - grad_x.data[i]).abs() < 1e-2,
            "input {i}: numeric {numeric} analytic {}",
            grad_x.data[i]
        );
    }

    let analytic_w = up.w.grad.data.clone();
    for i in [0, 7, 40, analytic_w.len() - 1] {
        let orig = up.w.value.data[i];
        up.w.value.data[i] = orig + eps;
        let lp = weighted_sum(&up.forward(&x).unwrap(), &r);
        up.w.value.data[i] = orig - eps;
        let lm = weighted_sum(&up.forward(&x).unwrap(), &r);
        up.w.value.data[i] = orig;
        let numeric = (lp - lm) / (2.0 * eps);
        assert!(
            (numeric - analytic_w[i]).abs() < 1e-2,
            "weight {i}: numeric {numeric} analytic {}",
            analytic_w[i]
        );
    }
}

#[test]
fn conv_input_gradient_matches_finite_differences() {
    let mut rng = rng_from_seed(Some(11));
    let mut conv = Conv2d::same(2, 3, 3, 2, &mut rng);
    let x = random_matrix(1, 2 * 6 * 6, 12);
    let y = conv.forward_train(&x).unwrap();
    let r = random_matrix(1, y.cols, 13);
    let grad_x = conv.backward(&r);
    let eps = 1e-2;
    for i in [0, 13, 35, 71] {
        let mut plus = x.clone();
        plus.data[i] += eps;
        let mut minus = x.clone();
        minus.data[i] -= eps;
        let numeric = (weighted_sum(&conv.forward(&plus).unwrap(), &r)
            - weighted_sum(&conv.forward(&minus).unwrap(), &r))
            / (2.0 * eps);
        assert!((numeric - grad_x.data[i]).abs() < 1e-2);
    }
}

#[test]
fn linear_accumulates_bias_gradient() {
    let mut rng = rng_from_seed(Some(14));
    let mut lin = LinearT::new(3, 2, &mut rng);
    let x = random_matrix(2, 3, 15);
    lin.forward_train(&x).unwrap();
    lin.backward(&Matrix::from_vec(2, 2, vec![1.0; 4]));
    assert_eq!(lin.b.grad.data, vec![2.0, 2.0]);
    lin.zero_grad();
    assert!(lin.b.grad.data.iter().all(|&g| g == 0.0));
}

#[test]
fn linear_rejects_wrong_width() {
    let mut rng = rng_from_seed(Some(16));
    let lin = LinearT::new(3, 2, &mut rng);
    assert_eq!(
        lin.forward(&Matrix::zeros(1, 4)),
        Err(LayerError::FeatureMismatch {
            expected: 3,
            got: 4
        })
    );
}

#[test]
fn embedding_backward_scatters_into_looked_up_rows() {
    let mut rng = rng_from_seed(Some(17));
    let mut emb = EmbeddingT::new(3, 2, &mut rng);
    let out = emb.forward_train(&[1, 1, 0]);
    assert_eq!(out.row(0), emb.table.value.row(1));
    emb.backward(&Matrix::from_vec(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    assert_eq!(emb.table.grad.row(0), &[5.0, 6.0]);
    assert_eq!(emb.table.grad.row(1), &[4.0, 6.0]);
    assert_eq!(emb.table.grad.row(2), &[0.0, 0.0]);
}

#[test]
fn leaky_relu_scales_negatives() {
    let mut act = LeakyReLUT::new(0.2);
    let x = Matrix::from_vec(1, 3, vec![-1.0, 0.0, 2.0]);
    let y = act.forward_train(&x).unwrap();
    assert!((y.data[0] + 0.2).abs() < 1e-6);
    assert_eq!(&y.data[1..], &[0.0, 2.0]);
    let g = act.backward(&Matrix::from_vec(1, 3, vec![1.0; 3]));
    assert!((g.data[0] - 0.2).abs() < 1e-6);
    assert_eq!(g.data[2], 1.0);
}

#[test]
fn dropout_is_identity_at_inference() {
    let drop = DropoutT::new(0.4, rng_from_seed(Some(18)));
    let x = random_matrix(2, 5, 19);
    assert_eq!(drop.forward(&x).unwrap(), x);
}

#[test]
fn dropout_zeroes_and_rescales_in_training() {
    let mut drop = DropoutT::new(0.5, rng_from_seed(Some(20)));
    let x = Matrix::from_vec(1, 200, vec![1.0; 200]);
    let y = drop.forward_train(&x).unwrap();
    assert!(y.data.iter().all(|&v| v == 0.0 || (v - 2.0).abs() < 1e-6));
    let kept = y.data.iter().filter(|&&v| v > 0.0).count();
    assert!(kept > 50 && kept < 150);
}

#[test]
fn tanh_gradient_vanishes_when_saturated() {
    let mut act = TanhT::new();
    let x = Matrix::from_vec(1, 2, vec![0.0, 20.0]);
    let y = act.forward_train(&x).unwrap();
    assert_eq!(y.data[0], 0.0);
    assert!((y.data[1] - 1.0).abs() < 1e-6);
    let g = act.backward(&Matrix::from_vec(1, 2, vec![1.0, 1.0]));
    assert_eq!(g.data[0], 1.0);
    assert!(g.data[1].abs() < 1e-5);
}
