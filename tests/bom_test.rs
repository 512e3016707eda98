/*!
Byte-order marks and legacy encodings in source files
*/

use complexity_analyzer::parser::read_source_file;
use complexity_analyzer::{AnalysisEngine, AnalyzerConfig};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_file_reading_with_bom() -> std::io::Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all("\u{FEFF}suma(n)\nbegin\n  s 🡨 0\nend\n".as_bytes())?;

    let content = read_source_file(temp_file.path())?;
    assert!(!content.starts_with('\u{FEFF}'));
    assert!(content.starts_with("suma"));
    Ok(())
}

#[test]
fn test_bom_file_analyzes_like_plain_file() -> std::io::Result<()> {
    let source = "f(n)\nbegin\n  for i 🡨 1 to n do\n  begin\n    x 🡨 x + 1\n  end\nend\n";
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(source.as_bytes());
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(&bytes)?;

    let engine = AnalysisEngine::new(&AnalyzerConfig::default()).unwrap();
    let from_file = engine.analyze_file(temp_file.path()).unwrap();
    let from_text = engine.analyze_source(source).unwrap();
    assert_eq!(from_file.solution, from_text.solution);
    Ok(())
}
