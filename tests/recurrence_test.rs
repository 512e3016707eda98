/*!
# Recurrence solving tests

Textual recurrences through [`RecurrenceSolver`].
*/

use complexity_analyzer::config::RecurrenceConfig;
use complexity_analyzer::recurrence::{Classification, Method};
use complexity_analyzer::{Confidence, RecurrenceSolver};
use pretty_assertions::assert_eq;

fn solver() -> RecurrenceSolver {
    RecurrenceSolver::new(&RecurrenceConfig::default())
}

#[test]
fn textbook_recurrences() {
    let cases = [
        ("T(n) = T(n/2) + 1", Classification::F0, Method::Master, "Θ(log n)"),
        ("T(n) = 2T(n/2) + n", Classification::F1, Method::Master, "Θ(n log n)"),
        ("T(n) = 3T(n/4) + n^2", Classification::F1, Method::Master, "Θ(n^2)"),
        ("T(n) = T(n-1) + 1", Classification::F4, Method::Characteristic, "Θ(n)"),
        (
            "T(n) = T(n-1) + T(n-2) + 1",
            Classification::F6,
            Method::Characteristic,
            "Θ(φ^n)",
        ),
    ];

    let solver = solver();
    for (text, classification, method, solution) in cases {
        let info = solver.solve_text(text);
        assert_eq!(info.classification, classification, "{}", text);
        assert_eq!(info.best_method, method, "{}", text);
        assert_eq!(info.final_solution, solution, "{}", text);
        assert_eq!(info.confidence, Confidence::Exact, "{}", text);
    }
}

#[test]
fn all_five_methods_are_reported() {
    let info = solver().solve_text("T(n) = T(n-1) + T(n-2) + 1");
    assert_eq!(info.methods_tried.len(), 5);
    assert_eq!(info.methods_tried[0].method, Method::Characteristic);
    assert!(info.method(Method::Substitution).unwrap().applicable);
    assert!(!info.method(Method::Master).unwrap().applicable);
}

#[test]
fn merge_sort_tree_lists_levels() {
    let info = solver().solve_text("T(n) = 2T(n/2) + n");
    let tree = info
        .method(Method::Tree)
        .and_then(|m| m.tree.as_ref())
        .expect("tree data");
    assert_eq!(tree.levels.len(), RecurrenceConfig::default().tree_levels);
    assert_eq!(tree.levels[0].num_nodes, "1");
    assert!(tree.diagram.as_deref().unwrap().starts_with("graph TD"));
}

#[test]
fn garbage_degrades_instead_of_failing() {
    let info = solver().solve_text("T(n) = T(n/2) + T(n-1) + n");
    assert_eq!(info.confidence, Confidence::BestEffort);
    assert!(!info.notes.is_empty());
    assert!(!info.final_solution.is_empty());
}

#[test]
fn solving_is_deterministic() {
    let first = solver().solve_text("T(n) = 3T(n/4) + n^2");
    let second = solver().solve_text("T(n) = 3T(n/4) + n^2");
    assert_eq!(first, second);
}

#[test]
fn root_work_stays_out_of_the_recursive_terms() {
    let info = solver().solve_text("T(n) = 2T(n/4) + sqrt(n/2)");
    assert_eq!(info.classification, Classification::F1);
    assert_eq!(info.best_method, Method::Master);
    assert_eq!(info.final_solution, "Θ(n^(1/2) log n)");
    let master = info.method(Method::Master).unwrap();
    assert_eq!(master.case, Some(2));
}
