use crate::math::{self, Matrix};

/// Apply sigmoid activation in place on a matrix.
///
/// Training goes through [`math::binary_cross_entropy`], which folds the
/// sigmoid into the loss gradient, so there is no separate backward here.
pub fn forward_matrix(m: &mut Matrix) {
    for v in m.data.iter_mut() {
        *v = math::sigmoid(*v);
    }
}
