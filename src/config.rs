/*!
# Analyzer Configuration

Tunable parameters of the cost model, the series solver and the recurrence
solver. Every field has a default, so an empty file is a valid configuration.
Supports TOML and YAML files.

```toml
[cost_model]
branch_probability = 0.5
count_loop_control = false
increment_style = "unit"
while_average_bound = "n/2"
while_worst_bound = "n"

[solver]
parallel_cases = false
line_steps = true

[recurrence]
master_epsilon = 0.0001
tree_levels = 4
render_tree_diagram = true
```
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{AnalysisError, AnalysisResult};
use crate::symbolic::{Rational, SymExpr};

/// How a for loop's increment is charged when loop control is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IncrementStyle {
    /// `i 🡨 i + 1` counted as one operation
    #[default]
    Unit,
    /// Addition and assignment counted separately
    Double,
}

impl IncrementStyle {
    pub fn operations(&self) -> i64 {
        match self {
            IncrementStyle::Unit => 1,
            IncrementStyle::Double => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostModelConfig {
    /// Probability that an `if` guard is true in the average case
    #[serde(default = "default_branch_probability")]
    pub branch_probability: f64,

    /// Charge the initialization, comparisons and increments of for loops
    #[serde(default)]
    pub count_loop_control: bool,

    #[serde(default)]
    pub increment_style: IncrementStyle,

    /// Iteration count of a while loop outside any for loop, average case
    #[serde(default = "default_while_average_bound")]
    pub while_average_bound: String,

    /// Iteration count of a while loop outside any for loop, worst case
    #[serde(default = "default_while_worst_bound")]
    pub while_worst_bound: String,
}

fn default_branch_probability() -> f64 {
    0.5
}

fn default_while_average_bound() -> String {
    "n/2".to_string()
}

fn default_while_worst_bound() -> String {
    "n".to_string()
}

impl Default for CostModelConfig {
    fn default() -> Self {
        Self {
            branch_probability: default_branch_probability(),
            count_loop_control: false,
            increment_style: IncrementStyle::Unit,
            while_average_bound: default_while_average_bound(),
            while_worst_bound: default_while_worst_bound(),
        }
    }
}

impl CostModelConfig {
    /// Branch probability as an exact fraction
    pub fn probability(&self) -> Rational {
        Rational::from_f64(self.branch_probability).unwrap_or_else(|| {
            Rational::new(1, 2).unwrap_or(Rational::ONE)
        })
    }

    /// Parsed `(average, worst)` while-loop iteration bounds
    pub fn while_bounds(&self) -> AnalysisResult<(SymExpr, SymExpr)> {
        Ok((
            SymExpr::parse(&self.while_average_bound)?,
            SymExpr::parse(&self.while_worst_bound)?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Solve the best, average and worst cases on the rayon pool
    #[serde(default)]
    pub parallel_cases: bool,

    /// Produce the line-by-line derivation
    #[serde(default = "default_true")]
    pub line_steps: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            parallel_cases: false,
            line_steps: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    /// Tolerance when comparing the degree of f(n) with log_b(a)
    #[serde(default = "default_master_epsilon")]
    pub master_epsilon: f64,

    /// Levels listed in recursion-tree data
    #[serde(default = "default_tree_levels")]
    pub tree_levels: usize,

    /// Attach a Mermaid diagram to recursion-tree results
    #[serde(default = "default_true")]
    pub render_tree_diagram: bool,

    /// Try candidate methods on the rayon pool
    #[serde(default)]
    pub parallel_methods: bool,
}

fn default_master_epsilon() -> f64 {
    1e-4
}

fn default_tree_levels() -> usize {
    4
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            master_epsilon: default_master_epsilon(),
            tree_levels: default_tree_levels(),
            render_tree_diagram: true,
            parallel_methods: false,
        }
    }
}

/// Complete analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub cost_model: CostModelConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub recurrence: RecurrenceConfig,
}

impl AnalyzerConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read analyzer config from {}",
                path.as_ref().display()
            )
        })?;

        let config: Self = toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse TOML config from {}",
                path.as_ref().display()
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from YAML file
    pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Failed to read analyzer config from {}",
                path.as_ref().display()
            )
        })?;

        let config: Self = serde_yaml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse YAML config from {}",
                path.as_ref().display()
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Picks the format from the extension (`.yaml`/`.yml`, otherwise TOML)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::load_from_yaml(path),
            _ => Self::load_from_file(path),
        }
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize analyzer config to TOML")?;

        std::fs::write(&path, content).with_context(|| {
            format!(
                "Failed to write analyzer config to {}",
                path.as_ref().display()
            )
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> AnalysisResult<()> {
        let p = self.cost_model.branch_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(AnalysisError::Config(format!(
                "branch_probability must be within [0, 1], got {}",
                p
            )));
        }

        for (field, text) in [
            ("while_average_bound", &self.cost_model.while_average_bound),
            ("while_worst_bound", &self.cost_model.while_worst_bound),
        ] {
            SymExpr::parse(text).map_err(|e| {
                AnalysisError::Config(format!("{} '{}' is not an expression: {}", field, text, e))
            })?;
        }

        if !(self.recurrence.master_epsilon > 0.0 && self.recurrence.master_epsilon < 1.0) {
            return Err(AnalysisError::Config(format!(
                "master_epsilon must be within (0, 1), got {}",
                self.recurrence.master_epsilon
            )));
        }

        if self.recurrence.tree_levels == 0 {
            return Err(AnalysisError::Config(
                "tree_levels must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.cost_model.branch_probability, 0.5);
        assert_eq!(config.cost_model.probability(), Rational::new(1, 2).unwrap());
        assert!(config.solver.line_steps);
        assert_eq!(config.recurrence.tree_levels, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let mut config = AnalyzerConfig::default();
        config.cost_model.count_loop_control = true;
        config.cost_model.increment_style = IncrementStyle::Double;

        let temp_file = NamedTempFile::new().unwrap();
        config.save_to_file(temp_file.path()).unwrap();

        let loaded = AnalyzerConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "cost_model:\n  branch_probability: 0.25").unwrap();

        let config = AnalyzerConfig::load(file.path()).unwrap();
        assert_eq!(config.cost_model.probability(), Rational::new(1, 4).unwrap());
        assert_eq!(config.cost_model.while_worst_bound, "n");
    }

    #[test]
    fn test_config_validation() {
        let mut config = AnalyzerConfig::default();
        config.cost_model.branch_probability = 1.5;
        assert!(matches!(config.validate(), Err(AnalysisError::Config(_))));

        let mut config = AnalyzerConfig::default();
        config.cost_model.while_worst_bound = "n +".to_string();
        assert!(config.validate().is_err());

        let mut config = AnalyzerConfig::default();
        config.recurrence.tree_levels = 0;
        assert!(config.validate().is_err());
    }
}
