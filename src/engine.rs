/*!
# Analysis Engine

Deterministic pipeline over one source text:

```text
parse → detect recursion ─┬─ iterative: cost model → series solver
                          └─ recursive: derive T(n) per function → classify → solve
```

The engine owns no mutable state; the same source and configuration always
produce the same [`AnalysisReport`].
*/

use anyhow::Context;
use serde::Serialize;
use std::path::Path;

use crate::config::AnalyzerConfig;
use crate::core::{AnalysisResult, Confidence, DegradationLog};
use crate::cost_model::{CostAnalyzer, CostsOut};
use crate::parser::{read_source_file, Function, Program, PseudoParser};
use crate::recurrence::{
    analyze_space, DerivedRecurrence, RecurrenceBuilder, RecurrenceInfo, RecurrenceSolver,
    SpaceAnalysis,
};
use crate::recursion::{RecursionDetector, RecursionReport};
use crate::series::{solver::combined_confidence, SeriesSolver, SolveOutput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    Iterative,
    Recursive,
}

/// Recurrence analysis of one recursive function
#[derive(Debug, Clone, Serialize)]
pub struct RecursiveAnalysis {
    pub function: String,
    pub derived: DerivedRecurrence,
    pub recurrence: RecurrenceInfo,
    pub space: SpaceAnalysis,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub mode: AnalysisMode,
    pub ast: Program,
    pub recursion: RecursionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costs: Option<CostsOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<SolveOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recurrences: Vec<RecursiveAnalysis>,
    pub confidence: Confidence,
}

pub struct AnalysisEngine {
    parser: PseudoParser,
    detector: RecursionDetector,
    costs: CostAnalyzer,
    series: SeriesSolver,
    builder: RecurrenceBuilder,
    recurrences: RecurrenceSolver,
}

impl AnalysisEngine {
    pub fn new(config: &AnalyzerConfig) -> AnalysisResult<Self> {
        config.validate()?;
        Ok(Self {
            parser: PseudoParser::new(),
            detector: RecursionDetector::new(),
            costs: CostAnalyzer::new(&config.cost_model)?,
            series: SeriesSolver::new(&config.solver),
            builder: RecurrenceBuilder::new(config)?,
            recurrences: RecurrenceSolver::new(&config.recurrence),
        })
    }

    pub fn parse(&self, source: &str) -> AnalysisResult<Program> {
        Ok(self.parser.parse_text(source)?)
    }

    /// Cost model only, regardless of recursion
    pub fn costs(&self, source: &str) -> AnalysisResult<(Program, CostsOut)> {
        let program = self.parse(source)?;
        let costs = self.costs.analyze(&program, source);
        Ok((program, costs))
    }

    pub fn solve_recurrence(&self, text: &str) -> RecurrenceInfo {
        self.recurrences.solve_text(text)
    }

    pub fn analyze_source(&self, source: &str) -> AnalysisResult<AnalysisReport> {
        let program = self.parse(source)?;
        let recursion = self.detector.detect(&program);

        if !recursion.is_recursive {
            tracing::info!("no self-calls; taking the iterative path");
            let costs = self.costs.analyze(&program, source);
            let solution = self.series.solve_costs(&costs);
            let confidence = combined_confidence(&costs, &solution);
            return Ok(AnalysisReport {
                mode: AnalysisMode::Iterative,
                ast: program,
                recursion,
                costs: Some(costs),
                solution: Some(solution),
                recurrences: Vec::new(),
                confidence,
            });
        }

        tracing::info!(
            "{} recursive function(s); taking the recursive path",
            recursion.recursive_functions.len()
        );
        let recurrences = recursion
            .recursive_functions
            .iter()
            .map(|f| self.analyze_recursive(&program, &f.name, source))
            .collect::<AnalysisResult<Vec<_>>>()?;
        let confidence = if recurrences
            .iter()
            .all(|r| r.recurrence.confidence == Confidence::Exact)
        {
            Confidence::Exact
        } else {
            Confidence::BestEffort
        };

        Ok(AnalysisReport {
            mode: AnalysisMode::Recursive,
            ast: program,
            recursion,
            costs: None,
            solution: None,
            recurrences,
            confidence,
        })
    }

    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<AnalysisReport> {
        let source = read_source_file(path.as_ref())
            .with_context(|| format!("Failed to read file: {}", path.as_ref().display()))?;
        self.analyze_source(&source)
            .with_context(|| format!("Analysis of {} failed", path.as_ref().display()))
    }

    fn analyze_recursive(&self, program: &Program, name: &str, source: &str) -> AnalysisResult<RecursiveAnalysis> {
        let derived = self.builder.build(program, name, source)?;
        let mut notes = DegradationLog::new();
        notes.extend(derived.notes.iter().cloned());

        let mut recurrence = self.recurrences.solve_terms(
            &derived.text,
            derived.terms.clone(),
            derived.work.clone(),
            notes,
        );
        recurrence.base_cases = derived.base_cases.clone();

        let functions: Vec<&Function> = std::iter::once(name)
            .chain(derived.auxiliary.iter().map(String::as_str))
            .filter_map(|n| program.function(n))
            .collect();
        let space = analyze_space(&recurrence.terms, &functions);

        Ok(RecursiveAnalysis {
            function: name.to_string(),
            derived,
            recurrence,
            space,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Classification, Method};
    use pretty_assertions::assert_eq;

    fn engine() -> AnalysisEngine {
        AnalysisEngine::new(&AnalyzerConfig::default()).unwrap()
    }

    #[test]
    fn iterative_program_goes_through_the_series_solver() {
        let report = engine()
            .analyze_source("f(n)\nbegin\n  for i 🡨 1 to n do\n  begin\n    x 🡨 x + 1\n  end\nend\n")
            .unwrap();
        assert_eq!(report.mode, AnalysisMode::Iterative);
        assert!(report.recurrences.is_empty());
        assert_eq!(report.solution.unwrap().big_o.worst, "O(n)");
    }

    #[test]
    fn factorial_goes_through_the_recurrence_solver() {
        let report = engine()
            .analyze_source(
                "fact(n)\nbegin\n  if n <= 1 then\n  begin\n    return 1\n  end\n  return n * CALL fact(n - 1)\nend\n",
            )
            .unwrap();
        assert_eq!(report.mode, AnalysisMode::Recursive);
        assert!(report.costs.is_none());

        let fact = &report.recurrences[0];
        assert_eq!(fact.recurrence.classification, Classification::F4);
        assert_eq!(fact.recurrence.best_method, Method::Characteristic);
        assert_eq!(fact.recurrence.final_solution, "Θ(n)");
        assert_eq!(fact.recurrence.base_cases, vec!["n<=1".to_string()]);
        assert_eq!(fact.space.recursion_depth, "O(n)");
        assert_eq!(report.confidence, Confidence::Exact);
    }

    #[test]
    fn parse_errors_are_fatal() {
        let err = engine().analyze_source("f(n)\nbegin\n  x 🡨\nend\n").unwrap_err();
        assert!(matches!(err, crate::core::AnalysisError::Parse(_)));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let mut config = AnalyzerConfig::default();
        config.cost_model.branch_probability = 1.5;
        assert!(AnalysisEngine::new(&config).is_err());
    }
}
