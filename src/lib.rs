/*!
# Complexity Analyzer

Static time and space complexity analysis for algorithms written in a
structured pseudocode.

## Pipeline

```text
Complexity Analyzer
├── Parser      - logos lexer, precedence-table grammar, typed AST with line spans
├── Cost Model  - best/average/worst symbolic costs per node and per line
├── Symbolic    - exact rationals, summation closed forms, dominant terms
├── Series      - closed forms, Big-O/Θ/Ω bounds, derivation steps
├── Recursion   - self-call detection
└── Recurrence  - F0..F6 classification, master/iteration/tree/characteristic/substitution
```

Iterative programs go through the cost model and the series solver.
Recursive ones have their recurrence derived from the body and solved.

## Usage

```rust
use complexity_analyzer::{AnalysisEngine, AnalyzerConfig};

let engine = AnalysisEngine::new(&AnalyzerConfig::default())?;
let report = engine.analyze_source(
    "suma(n)\nbegin\n  for i 🡨 1 to n do\n  begin\n    s 🡨 s + i\n  end\nend\n",
)?;
assert_eq!(report.solution.unwrap().big_o.worst, "O(n)");

let info = engine.solve_recurrence("T(n) = 2T(n/2) + n");
assert_eq!(info.final_solution, "Θ(n log n)");
# Ok::<(), complexity_analyzer::AnalysisError>(())
```

Every stage is a pure function of its input and configuration. Results that
had to fall back on a default carry [`core::Degradation`] notes and
[`core::Confidence::BestEffort`].
*/

pub mod config;
pub mod core;
pub mod cost_model;
pub mod engine;
pub mod parser;
pub mod recurrence;
pub mod recursion;
pub mod series;
pub mod symbolic;

pub use config::AnalyzerConfig;
pub use core::{AnalysisError, AnalysisResult, Confidence, ParseError};
pub use cost_model::{CostAnalyzer, CostExpr, CostsOut};
pub use engine::{AnalysisEngine, AnalysisMode, AnalysisReport};
pub use parser::{parse, Program, PseudoParser};
pub use recurrence::{RecurrenceInfo, RecurrenceSolver};
pub use recursion::RecursionDetector;
pub use series::{SeriesSolver, SolveOutput};
