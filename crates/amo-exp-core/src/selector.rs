//! Weighted variant selection by inverse-CDF sampling.

use crate::errors::ExpError;
use crate::rng::RandomSource;
use crate::variant::{validate_variants, Variant, VariantSet, NOT_IN_EXPERIMENT};

/// Validates `variants` and returns the id chosen by one draw of `random`.
///
/// The weight sum and variant id checks run before the draw, so a broken
/// variant list fails with [`ExpError::Configuration`] every time rather than
/// only when an unlucky sample walks off the end of the distribution.
pub fn select_variant<'a, R>(variants: &'a [Variant], random: &mut R) -> Result<&'a str, ExpError>
where
    R: RandomSource + ?Sized,
{
    validate_variants(variants)?;
    Ok(walk(variants, random.next_unit()))
}

/// Returns the first variant whose cumulative weight strictly exceeds `sample`.
///
/// A sample sitting exactly on a bucket boundary belongs to the next bucket.
pub fn pick_variant(set: &VariantSet, sample: f64) -> &str {
    walk(set.variants(), sample)
}

impl VariantSet {
    /// Draws one sample from `random` and picks the matching variant.
    pub fn sample<R>(&self, random: &mut R) -> &str
    where
        R: RandomSource + ?Sized,
    {
        pick_variant(self, random.next_unit())
    }
}

fn walk(variants: &[Variant], sample: f64) -> &str {
    let mut cumulative = 0.0;
    for variant in variants {
        cumulative += variant.weight;
        if cumulative > sample {
            return &variant.id;
        }
    }
    // Rounding can leave the final cumulative weight just below the sample.
    variants
        .last()
        .map(|variant| variant.id.as_str())
        .unwrap_or(NOT_IN_EXPERIMENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_shortfall_falls_back_to_last_variant() {
        let variants = vec![Variant::new("a", 0.5), Variant::new("b", 0.4999999999)];
        assert_eq!(walk(&variants, 0.99999999999), "b");
    }

    #[test]
    fn sample_below_zero_lands_in_first_bucket() {
        let variants = vec![Variant::new("a", 0.5), Variant::new("b", 0.5)];
        assert_eq!(walk(&variants, -0.25), "a");
    }
}
