//! Load synthetic point data, visit it with progress and persist it
//!
//! Run with `RUST_LOG=pointdata=debug` to see storage decisions.

use std::time::Instant;

use pointdata::{
    Coverage, ElementSelection, ExecutionConfig, MatrixVariant, ProgressSink,
    StorageConfiguration, StorageKind, Strategy,
};

/// Prints every tenth finished subtask
struct ConsoleProgress {
    total: usize,
    done: usize,
}

impl ProgressSink for ConsoleProgress {
    fn set_subtasks(&mut self, count: usize) {
        self.total = count;
        self.done = 0;
    }

    fn subtask_finished(&mut self, _index: usize) {
        self.done += 1;
        if self.done % (self.total / 10).max(1) == 0 {
            println!("   {}/{} subtasks", self.done, self.total);
        }
    }

    fn set_finished(&mut self) {
        println!("   done");
    }
}

fn main() -> pointdata::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let points = 50_000;
    let dimensions = 32;
    println!("Generating {points} points with {dimensions} dimensions...");
    let values: Vec<f64> = (0..points * dimensions)
        .map(|i| if i % 7 == 0 { (i % 1000) as f64 } else { 0.0 })
        .collect();

    let mut matrix = MatrixVariant::default();
    for storage in [StorageKind::Dense, StorageKind::Csr] {
        let config = StorageConfiguration::new(storage, ElementSelection::Lossless);
        let start = Instant::now();
        let chosen = matrix.set_data_as(config, values.clone(), dimensions)?;
        println!(
            "\n{} as {chosen}: {} bytes, {} stored values ({:.3}ms)",
            storage,
            matrix.bytes(),
            matrix.nnz(),
            start.elapsed().as_secs_f64() * 1000.0
        );
    }

    println!("\nVisiting column-parallel on 4 workers:");
    let mut progress = ConsoleProgress { total: 0, done: 0 };
    let total = ExecutionConfig::with_workers(4).install(|| {
        let sum = std::sync::Mutex::new(0.0);
        matrix.visit_f64(
            Coverage::Sparse,
            Strategy::ColumnParallel,
            |_, _, value| *sum.lock().unwrap() += value,
            Some(&mut progress),
        );
        sum.into_inner().unwrap()
    })?;
    println!("   sum of stored values = {total}");

    let column = matrix.extract_column(0, None)?;
    println!("\nColumn 0 holds {} non-zero values", column.iter().filter(|v| **v != 0.0).count());

    let start = Instant::now();
    let document = matrix.to_document();
    let text = serde_json::to_string(&document)
        .map_err(|e| pointdata::MatrixError::malformed(e.to_string()))?;
    println!(
        "\nDocument: {} bytes of JSON ({:.3}ms)",
        text.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let mut restored = MatrixVariant::default();
    restored.from_document(&document)?;
    println!("Restored {} as {}", restored.configuration(), restored.element_type());
    Ok(())
}
