//! Deduplicate a small stream of person records.
//!
//! Run with `RUST_LOG=dedupe=debug` to see merges and splits.

use std::sync::Arc;

use dedupe::cluster::{ids, ConsistentClustering, RefineCluster, RefinedTransitiveClosure};
use dedupe::{Candidate, ClassificationResult, ErrorPolicy, PairBasedDuplicateDetection};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct Person {
    id: u32,
    first_name: &'static str,
    last_name: &'static str,
}

const fn person(id: u32, first_name: &'static str, last_name: &'static str) -> Person {
    Person {
        id,
        first_name,
        last_name,
    }
}

/// Same last name, and first names that agree on their first three letters.
fn similar_names(a: &Person, b: &Person) -> dedupe::Result<ClassificationResult> {
    if a.last_name.is_empty() || b.last_name.is_empty() {
        return Err(dedupe::Error::classifier(format!(
            "missing last name for record {} or {}",
            a.id, b.id
        )));
    }
    let prefix = |s: &str| s.chars().take(3).collect::<String>();
    let result = if a.last_name == b.last_name && prefix(a.first_name) == prefix(b.first_name) {
        ClassificationResult::duplicate(0.9)
    } else {
        ClassificationResult::non_duplicate(0.8)
    };
    Ok(result.with_explanation(format!("{} vs {}", a.first_name, b.first_name)))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let refine = RefineCluster::new(similar_names, Arc::new(|p: &Person| p.id), ids::sequential())
        .with_seed(42);
    let clustering = ConsistentClustering::new(
        RefinedTransitiveClosure::new(refine),
        Arc::new(|p: &Person| p.id),
    );
    let mut detection = PairBasedDuplicateDetection::new(
        // The upstream candidate selection is generous: it links on last name only.
        |a: &Person, b: &Person| -> dedupe::Result<ClassificationResult> {
            if a.last_name.is_empty() || b.last_name.is_empty() {
                return similar_names(a, b);
            }
            Ok(if a.last_name == b.last_name {
                ClassificationResult::duplicate(0.6)
            } else {
                ClassificationResult::non_duplicate(0.6)
            })
        },
        clustering,
    )
    .with_error_policy(ErrorPolicy::Collect);

    let batches = [
        vec![(person(1, "Joanna", "Smith"), person(2, "Joanna", "Smith"))],
        vec![
            (person(3, "Johanna", "Smith"), person(2, "Joanna", "Smith")),
            (person(4, "Johanna", "Smith"), person(3, "Johanna", "Smith")),
        ],
        vec![(person(5, "Carl", ""), person(1, "Joanna", "Smith"))],
    ];

    for (round, batch) in batches.into_iter().enumerate() {
        let candidates = batch
            .into_iter()
            .map(|(a, b)| Candidate::new(a, b))
            .collect();
        match detection.detect(candidates) {
            Ok(clusters) => {
                println!("=== batch {round} ===");
                for cluster in clusters {
                    let members: Vec<String> = cluster
                        .iter()
                        .map(|p| format!("{} {} ({})", p.first_name, p.last_name, p.id))
                        .collect();
                    println!("  cluster {} => {}", cluster.id(), members.join(", "));
                }
            }
            Err(err) => eprintln!("batch {round} failed: {err}"),
        }
    }

    for err in detection.error_context().take_errors() {
        println!("skipped: {err}");
    }
}
