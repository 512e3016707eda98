/*!
# Complexity Analyzer CLI

Command-line interface for the pseudocode complexity analyzer.
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use std::path::{Path, PathBuf};

use complexity_analyzer::parser::read_source_file;
use complexity_analyzer::recurrence::{Method, RecurrenceInfo};
use complexity_analyzer::series::SolveOutput;
use complexity_analyzer::{AnalysisEngine, AnalysisMode, AnalyzerConfig, Confidence};

#[derive(Parser)]
#[command(
    name = "complexity-analyzer",
    version = env!("CARGO_PKG_VERSION"),
    about = "Asymptotic complexity of structured pseudocode: symbolic costs, series and recurrences"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Analyzer configuration (TOML or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a pseudocode file and print its AST
    Parse {
        /// Pseudocode file
        file: PathBuf,
    },

    /// Per-line and total symbolic costs
    Costs {
        /// Pseudocode file
        file: PathBuf,
    },

    /// Full analysis: iterative series or recurrence solving
    Analyze {
        /// Pseudocode file
        file: PathBuf,
    },

    /// Classify and solve a recurrence such as "T(n) = 2T(n/2) + n"
    Recurrence {
        /// Recurrence text
        text: String,
    },

    /// Write the default configuration
    Config {
        /// Output file (TOML)
        #[arg(short, long, default_value = "complexity-analyzer.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("complexity_analyzer={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => AnalyzerConfig::load(path)?,
        None => AnalyzerConfig::default(),
    };

    match cli.command {
        Commands::Parse { file } => parse_command(&file, cli.format),
        Commands::Costs { file } => costs_command(&file, &config, cli.format),
        Commands::Analyze { file } => analyze_command(&file, &config, cli.format),
        Commands::Recurrence { text } => recurrence_command(&text, &config, cli.format),
        Commands::Config { output } => config_command(&output),
    }
}

fn read(file: &Path) -> Result<String> {
    read_source_file(file).with_context(|| format!("Failed to read file: {}", file.display()))
}

fn parse_command(file: &Path, format: OutputFormat) -> Result<()> {
    let source = read(file)?;
    let program = complexity_analyzer::parse(&source)
        .with_context(|| format!("Syntax analysis of {} failed", file.display()))?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&program)?);
        return Ok(());
    }

    let term = Term::stdout();
    term.write_line(&format!("🌳 {}", style("Parsed program").bold().cyan()))?;
    for function in &program.functions {
        let params: Vec<String> = function
            .params
            .iter()
            .map(|p| {
                if p.is_array {
                    format!("{}[]", p.name)
                } else {
                    p.name.clone()
                }
            })
            .collect();
        term.write_line(&format!(
            "   {}({})  {} statement(s)",
            style(&function.name).bold(),
            params.join(", "),
            style(function.body.statement_count()).green()
        ))?;
    }
    Ok(())
}

fn costs_command(file: &Path, config: &AnalyzerConfig, format: OutputFormat) -> Result<()> {
    let source = read(file)?;
    let engine = AnalysisEngine::new(config)?;
    let (_, costs) = engine.costs(&source)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&costs)?);
        return Ok(());
    }

    let term = Term::stdout();
    term.write_line(&format!("🧮 {}", style("Line costs").bold().cyan()))?;
    for line in &costs.per_line {
        term.write_line(&format!(
            "   {:>3} │ {:<40} │ {}",
            style(line.line_number).dim(),
            line.code.trim(),
            style(&line.cost.worst).yellow()
        ))?;
    }
    term.write_line(&format!("   best:  {}", costs.total.best))?;
    term.write_line(&format!("   avg:   {}", costs.total.avg))?;
    term.write_line(&format!("   worst: {}", costs.total.worst))?;
    print_notes(&term, costs.confidence, costs.notes.iter().map(ToString::to_string))?;
    Ok(())
}

fn analyze_command(file: &Path, config: &AnalyzerConfig, format: OutputFormat) -> Result<()> {
    let engine = AnalysisEngine::new(config)?;
    let report = engine.analyze_file(file)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let term = Term::stdout();
    term.write_line(&format!(
        "📊 {} {}",
        style("Complexity analysis").bold().cyan(),
        style(file.display()).dim()
    ))?;
    match report.mode {
        AnalysisMode::Iterative => {
            if let Some(solution) = &report.solution {
                print_solution(&term, solution)?;
            }
        }
        AnalysisMode::Recursive => {
            for analysis in &report.recurrences {
                term.write_line(&format!("\n🔁 {}", style(&analysis.function).bold()))?;
                print_recurrence(&term, &analysis.recurrence)?;
                term.write_line(&format!(
                    "   Space: {} (depth {}, auxiliary {})",
                    style(&analysis.space.total_space).green(),
                    analysis.space.recursion_depth,
                    analysis.space.auxiliary_space
                ))?;
            }
        }
    }
    term.write_line(&format!("\n   Confidence: {}", confidence_label(report.confidence)))?;
    Ok(())
}

fn recurrence_command(text: &str, config: &AnalyzerConfig, format: OutputFormat) -> Result<()> {
    let engine = AnalysisEngine::new(config)?;
    let info = engine.solve_recurrence(text);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let term = Term::stdout();
    print_recurrence(&term, &info)?;
    print_notes(&term, info.confidence, info.notes.iter().map(ToString::to_string))?;
    Ok(())
}

fn config_command(output: &Path) -> Result<()> {
    AnalyzerConfig::default().save_to_file(output)?;
    let term = Term::stdout();
    term.write_line(&format!(
        "✅ Configuration created: {}",
        style(output.display()).green()
    ))?;
    Ok(())
}

fn print_solution(term: &Term, solution: &SolveOutput) -> Result<()> {
    term.write_line(&format!("   Exact (worst): {}", style(&solution.exact.worst).yellow()))?;
    term.write_line(&format!(
        "   Bounds: {}  {}  {}",
        style(&solution.bounds.omega).green(),
        style(&solution.bounds.theta).bold().green(),
        style(&solution.bounds.big_o).green()
    ))?;
    term.write_line(&format!("   {}", style("Derivation").bold()))?;
    for step in &solution.steps {
        let case = step.case.map(|c| format!("[{}] ", c)).unwrap_or_default();
        term.write_line(&format!(
            "   {:>2}. {}{}: {}",
            step.step,
            style(case).dim(),
            step.description,
            step.expression
        ))?;
    }
    Ok(())
}

fn print_recurrence(term: &Term, info: &RecurrenceInfo) -> Result<()> {
    term.write_line(&format!("   {}", style(&info.raw).bold()))?;
    term.write_line(&format!(
        "   Class {}: {}",
        style(info.classification).cyan(),
        info.classification.description()
    ))?;
    for result in &info.methods_tried {
        let marker = if result.method == info.best_method {
            style("★").yellow().to_string()
        } else if result.applicable {
            style("✓").green().to_string()
        } else {
            style("✗").dim().to_string()
        };
        let outcome = result
            .complexity
            .clone()
            .unwrap_or_else(|| result.explanation.clone());
        term.write_line(&format!(
            "   {} {:<15} {}",
            marker,
            result.method.to_string(),
            outcome
        ))?;
        if result.method == info.best_method {
            for step in &result.steps {
                term.write_line(&format!("       {}", style(step).dim()))?;
            }
        }
    }
    if let Some(tree) = info
        .method(Method::Tree)
        .and_then(|m| m.tree.as_ref())
        .filter(|_| info.best_method == Method::Tree)
    {
        term.write_line(&format!("   Tree height: {}", tree.height))?;
    }
    if !info.base_cases.is_empty() {
        term.write_line(&format!("   Base cases: {}", info.base_cases.join(", ")))?;
    }
    term.write_line(&format!(
        "   Solution: {}",
        style(&info.final_solution).bold().green()
    ))?;
    Ok(())
}

fn print_notes(term: &Term, confidence: Confidence, notes: impl Iterator<Item = String>) -> Result<()> {
    term.write_line(&format!("   Confidence: {}", confidence_label(confidence)))?;
    for note in notes {
        term.write_line(&format!("   - {}", style(note).yellow()))?;
    }
    Ok(())
}

fn confidence_label(confidence: Confidence) -> String {
    match confidence {
        Confidence::Exact => style(confidence).green().to_string(),
        Confidence::BestEffort => style(confidence).yellow().to_string(),
    }
}
