//! The message vector type and the numerical kernel of the sum-product update.
//!
//! A `Message` is an unnormalized distribution over the domain of a variable,
//! attached to a single (variable, factor) edge and direction. Both node kinds
//! compute outgoing messages as leave-one-out products of incoming messages;
//! the helpers here implement that product together with the zero-substitution
//! trick that keeps it well defined when incoming messages contain zeros.

use ndarray::prelude as nd;

/// Alias f64 ndarray::Array as Message: one nonnegative entry per domain value.
pub type Message = nd::Array1<f64>;

/// Threshold below which a message entry is considered to have vanished.
pub const EPSILON: f64 = 1e-11;

/// The uniform distribution over a domain of the given cardinality.
pub fn uniform(cardinality: usize) -> Message {
    Message::from_elem(cardinality, 1.0 / cardinality as f64)
}

/// Normalize `weights` to sum to 1.
///
/// A degenerate vector (sum at or below `EPSILON`) becomes the uniform
/// distribution instead of an error, so reads never divide by zero.
pub fn normalized(weights: &Message) -> Message {
    let total = weights.scalar_sum();
    if total > EPSILON {
        weights / total
    } else {
        uniform(weights.len())
    }
}

/// In-place variant of `normalized`, used when committing variable messages.
pub fn normalize_in_place(msg: &mut Message) {
    let total = msg.scalar_sum();
    if total > EPSILON {
        msg.mapv_inplace(|w| w / total);
    } else {
        let w = 1.0 / msg.len() as f64;
        msg.fill(w);
    }
}

/// Fold one incoming value into the running `product` and `nonzero_product`.
///
/// `product` is the plain running product of every incoming value.
/// `nonzero_product` substitutes 1 for a value that has vanished (fallen below
/// `EPSILON`) while the running product of the values folded before it is
/// still above `EPSILON`; once the running product has itself vanished, the
/// substitution stops and the near-zero value is folded in as-is. The result
/// approximates the product of all values that are not themselves the unique
/// zero contributor.
pub fn fold_value(product: &mut f64, nonzero_product: &mut f64, inbound: f64) {
    *nonzero_product *= if inbound < EPSILON && *product > EPSILON { 1.0 } else { inbound };
    *product *= inbound;
}

/// Elementwise form of `fold_value` over whole messages, used by the variable
/// update where the products are tracked at every domain position at once.
pub fn fold_message(product: &mut Message, nonzero_product: &mut Message, inbound: &Message) {
    for i in 0..product.len() {
        fold_value(&mut product[i], &mut nonzero_product[i], inbound[i]);
    }
}

/// The leave-one-out product: every folded value except `inbound`.
///
/// Where `inbound` is above `EPSILON` the exclusion is the exact division
/// `product / inbound`. Dividing out a vanished value is undefined, so below
/// the threshold the result falls back to `nonzero_product` - the product of
/// the values known not to have vanished. The fallback is an approximation
/// when two or more values vanish together; that case collapses toward zero
/// instead of propagating NaN or Inf.
pub fn leave_one_out(product: f64, nonzero_product: f64, inbound: f64) -> f64 {
    if inbound < EPSILON {
        nonzero_product
    } else {
        product / inbound
    }
}

// Unit tests for the numerical kernel.
#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn normalized_sums_to_one() {
        let msg = normalized(&Message::from_vec(vec![2.0, 6.0]));
        assert!((msg[0] - 0.25).abs() < 1e-12);
        assert!((msg[1] - 0.75).abs() < 1e-12);
        assert!((msg.scalar_sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_weights_become_uniform() {
        let msg = normalized(&Message::zeros(4));
        for i in 0..4 {
            assert!((msg[i] - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn normalize_in_place_matches_normalized() {
        let mut msg = Message::from_vec(vec![1.0, 3.0]);
        normalize_in_place(&mut msg);
        assert!((msg[0] - 0.25).abs() < 1e-12);
        assert!((msg[1] - 0.75).abs() < 1e-12);

        let mut degenerate = Message::zeros(2);
        normalize_in_place(&mut degenerate);
        assert!((degenerate[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn fold_without_zeros_tracks_plain_product() {
        let mut product = 1.0;
        let mut nonzero = 1.0;
        for &m in [0.5, 0.25, 0.8].iter() {
            fold_value(&mut product, &mut nonzero, m);
        }
        assert!((product - 0.1).abs() < 1e-12);
        assert!((nonzero - product).abs() < 1e-12);
    }

    #[test]
    fn unique_zero_contributor_is_substituted() {
        let mut product = 1.0;
        let mut nonzero = 1.0;
        fold_value(&mut product, &mut nonzero, 0.5);
        fold_value(&mut product, &mut nonzero, 0.0);
        fold_value(&mut product, &mut nonzero, 0.25);

        // the vanished value drops out of the nonzero product entirely
        assert_eq!(product, 0.0);
        assert!((nonzero - 0.125).abs() < 1e-12);

        // excluding the zero falls back to the product of the others
        assert!((leave_one_out(product, nonzero, 0.0) - 0.125).abs() < 1e-12);
        // excluding a live value divides it out of the plain product
        assert_eq!(leave_one_out(0.125, 1.0, 0.5), 0.25);
    }

    #[test]
    fn second_zero_stops_the_substitution() {
        let mut product = 1.0;
        let mut nonzero = 1.0;
        fold_value(&mut product, &mut nonzero, 0.0);
        assert!((nonzero - 1.0).abs() < 1e-12);

        // the running product has already vanished, so the substitution no
        // longer applies and the nonzero product collapses as well
        fold_value(&mut product, &mut nonzero, 0.0);
        assert_eq!(nonzero, 0.0);
    }

    #[test]
    fn fold_message_is_elementwise() {
        let mut product = Message::ones(2);
        let mut nonzero = Message::ones(2);
        fold_message(&mut product, &mut nonzero, &Message::from_vec(vec![0.5, 0.0]));
        fold_message(&mut product, &mut nonzero, &Message::from_vec(vec![0.4, 0.7]));

        assert!((product[0] - 0.2).abs() < 1e-12);
        assert_eq!(product[1], 0.0);
        assert!((nonzero[0] - 0.2).abs() < 1e-12);
        assert!((nonzero[1] - 0.7).abs() < 1e-12);
    }

}
