//! Property-based tests for `pointdata`.
//!
//! Covers visitation across strategies, CSR point access against the dense
//! source, persistence round trips and safe numeric casts.

use std::collections::BTreeSet;
use std::sync::Mutex;

use pointdata::{
    safe_numeric_cast, Coverage, CsrMatrix, DenseMatrix, ElementSelection, ElementType,
    MatrixVariant, PointMatrix, StorageConfiguration, StorageKind, Strategy as VisitStrategy,
    VisitElements,
};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────────

/// A small dense i32 matrix with roughly half of its cells zero.
fn arb_dense() -> impl Strategy<Value = DenseMatrix<i32>> {
    (0usize..8, 0usize..8).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(prop_oneof![Just(0i32), -50i32..50], rows * cols)
            .prop_map(move |values| DenseMatrix::from_vec(rows, cols, values).unwrap())
    })
}

fn arb_coverage() -> impl Strategy<Value = Coverage> {
    prop_oneof![Just(Coverage::Dense), Just(Coverage::Sparse)]
}

fn all_strategies() -> [VisitStrategy; 3] {
    [
        VisitStrategy::Sequential,
        VisitStrategy::RowParallel,
        VisitStrategy::ColumnParallel,
    ]
}

/// Every visited triple, failing on duplicates.
fn visited<M>(
    matrix: &M,
    coverage: Coverage,
    strategy: VisitStrategy,
) -> BTreeSet<(usize, usize, i64)>
where
    M: VisitElements,
    M::Element: Into<i64>,
{
    let seen = Mutex::new(Vec::new());
    matrix.visit(
        coverage,
        strategy,
        |row, col, value| seen.lock().unwrap().push((row, col, value.into())),
        None,
    );
    let seen = seen.into_inner().unwrap();
    let set: BTreeSet<_> = seen.iter().copied().collect();
    assert_eq!(set.len(), seen.len(), "a cell was visited twice");
    set
}

// ── Visitation ──────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn strategies_visit_identical_triples(dense in arb_dense(), coverage in arb_coverage()) {
        let csr = CsrMatrix::<i32, u32>::from_dense(&dense).unwrap();
        let expected = visited(&dense, coverage, VisitStrategy::Sequential);

        let cells = match coverage {
            Coverage::Dense => dense.rows() * dense.cols(),
            Coverage::Sparse => csr.nnz(),
        };
        prop_assert_eq!(expected.len(), cells);

        for strategy in all_strategies() {
            prop_assert_eq!(&visited(&dense, coverage, strategy), &expected);
            prop_assert_eq!(&visited(&csr, coverage, strategy), &expected);
        }
    }

    #[test]
    fn row_subset_visits_requested_rows(
        dense in arb_dense(),
        pick in prop::collection::vec(0usize..8, 0..6),
    ) {
        let rows: Vec<usize> = pick.into_iter().filter(|&r| r < dense.rows()).collect();
        let csr = CsrMatrix::<i32, u32>::from_dense(&dense).unwrap();

        let seen = Mutex::new(Vec::new());
        csr.visit_rows(&rows, Coverage::Dense, VisitStrategy::RowParallel, |r, c, _| {
            seen.lock().unwrap().push((r, c));
        }, None).unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        let mut expected: Vec<(usize, usize)> = rows
            .iter()
            .flat_map(|&r| (0..dense.cols()).map(move |c| (r, c)))
            .collect();
        expected.sort_unstable();
        prop_assert_eq!(seen, expected);
    }

    // ── CSR point access ────────────────────────────────────────────────────

    #[test]
    fn csr_point_access_matches_dense(dense in arb_dense()) {
        let csr = CsrMatrix::<i32, u32>::from_dense(&dense).unwrap();
        prop_assert_eq!(csr.nnz(), dense.values().iter().filter(|&&v| v != 0).count());
        for row in 0..dense.rows() {
            for col in 0..dense.cols() {
                prop_assert_eq!(csr.get(row, col), dense.get(row, col));
            }
        }
        prop_assert_eq!(csr.get(dense.rows(), 0), None);
        prop_assert_eq!(DenseMatrix::from_csr(&csr).unwrap(), dense);
    }

    // ── Persistence ─────────────────────────────────────────────────────────

    #[test]
    fn document_round_trip(
        dense in arb_dense(),
        storage in prop_oneof![Just(StorageKind::Dense), Just(StorageKind::Csr)],
        block_size in 1usize..64,
    ) {
        let values = dense.values().to_vec();
        let cols = dense.cols().max(1);
        let values = if dense.cols() == 0 { Vec::new() } else { values };

        let mut variant = MatrixVariant::default();
        let config = StorageConfiguration::new(storage, ElementSelection::Lossless);
        variant.set_data_as(config, values.clone(), cols).unwrap();

        let document = variant.to_document_with_block_size(block_size);
        let mut restored = MatrixVariant::default();
        restored.from_document(&document).unwrap();
        prop_assert_eq!(&restored, &variant);
        prop_assert_eq!(restored.to_dense_values::<i32>().unwrap(), values);
    }

    #[test]
    fn lossless_storage_reproduces_floats(
        values in prop::collection::vec(-1.0e6f64..1.0e6, 1..40),
    ) {
        let mut variant = MatrixVariant::default();
        let config = StorageConfiguration::new(StorageKind::Dense, ElementSelection::Lossless);
        let chosen = variant.set_data_as(config, values.clone(), 1).unwrap();
        prop_assert!(chosen.size_bytes() <= 8);
        prop_assert_eq!(variant.to_dense_values::<f64>().unwrap(), values);
    }

    // ── Numeric casts ───────────────────────────────────────────────────────

    #[test]
    fn widening_casts_are_identity(v in any::<i16>()) {
        prop_assert_eq!(safe_numeric_cast::<i32, i16>(v).unwrap(), v as i32);
        prop_assert_eq!(safe_numeric_cast::<f32, i16>(v).unwrap(), v as f32);
        prop_assert_eq!(safe_numeric_cast::<i64, i16>(v).unwrap(), v as i64);
    }

    #[test]
    fn narrowing_casts_check_range(v in any::<i32>()) {
        let narrowed = safe_numeric_cast::<u8, i32>(v);
        prop_assert_eq!(narrowed.is_ok(), (0..=255).contains(&v));
        if let Ok(n) = narrowed {
            prop_assert_eq!(n as i32, v);
        }
    }

    #[test]
    fn case_index_round_trips(index in 0usize..pointdata::CASE_COUNT) {
        let mut variant = MatrixVariant::default();
        prop_assert!(variant.set_case_index(index));
        prop_assert_eq!(variant.case_index(), index);
        let (storage, element) = pointdata::case_at(index).unwrap();
        prop_assert_eq!(variant.storage_kind(), storage);
        prop_assert_eq!(variant.element_type(), element);
        prop_assert!(ElementType::ALL.contains(&element));
    }
}
