use assert_approx_eq::assert_approx_eq;
use enrichkit::prelude::*;
use rand::{
    Rng,
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use rstest::rstest;

#[rstest]
#[case(Tail::Lower)]
#[case(Tail::Upper)]
#[case(Tail::TwoSided)]
fn fisher_is_symmetric_in_table_orientation(#[case] tail: Tail) -> anyhow::Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    for _ in 0..200 {
        let table = ContingencyTable::new(
            rng.gen_range(0..30),
            rng.gen_range(0..30),
            rng.gen_range(0..30),
            rng.gen_range(1..200),
        );
        // Swapping rows and columns keeps N, k and exchanges m with n.
        let transposed = ContingencyTable::new(table.a, table.c, table.b, table.d);
        let p = fisher_exact(&table, tail)?.to_f64();
        let q = fisher_exact(&transposed, tail)?.to_f64();
        assert_approx_eq!(p, q, 1e-12);
    }
    Ok(())
}

#[test]
fn fisher_lower_and_upper_cover_the_support() -> anyhow::Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    for _ in 0..200 {
        let table = ContingencyTable::new(
            rng.gen_range(0..50),
            rng.gen_range(0..50),
            rng.gen_range(0..50),
            rng.gen_range(0..500),
        );
        if table.total() == 0 {
            continue;
        }
        let dist = Hypergeometric::new(table.total(), table.category_size(), table.test_size())?;
        let lower = fisher_exact(&table, Tail::Lower)?.to_f64();
        let upper = fisher_exact(&table, Tail::Upper)?.to_f64();
        let point = dist.pmf(table.hits())?.to_f64();
        assert_approx_eq!(lower + upper - point, 1.0, 1e-9);
    }
    Ok(())
}

#[test]
fn tiny_p_values_keep_their_exponent() -> anyhow::Result<()> {
    let dist = Hypergeometric::new(20_000, 1_000, 1_000)?;
    let mut previous = PValue::one();
    for k in [200, 300, 400, 500, 600, 700] {
        let p = dist.upper_tail(k)?;
        assert!(p.log10().is_finite());
        assert!(p < previous, "upper tail must shrink with k");
        previous = p;
    }
    assert!(previous.is_extended());
    assert_eq!(previous.to_f64(), 0.0);

    let text = previous.to_string();
    let parsed: PValue = text.parse()?;
    assert_approx_eq!(parsed.log10(), previous.log10(), 1e-5);
    Ok(())
}

#[test]
fn binomial_limit_of_hypergeometric() -> anyhow::Result<()> {
    // Drawing 20 of a million with 10% successes is nearly binomial.
    let hyper = Hypergeometric::new(1_000_000, 100_000, 20)?;
    let binom = Binomial::new(20, 0.1)?;
    for k in 0..=10 {
        assert_approx_eq!(
            hyper.upper_tail(k)?.to_f64(),
            binom.upper_tail(k)?.to_f64(),
            1e-4
        );
    }
    Ok(())
}
