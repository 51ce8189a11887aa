use crate::{language::errors::SyntaxError, runtime::error::RuntimeError};
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SyntaxDiagnostic {
    #[source_code]
    src: NamedSource,
    #[label("{label}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
    label: String,
}

impl SyntaxDiagnostic {
    pub fn from_error(src: NamedSource, err: SyntaxError) -> Self {
        Self {
            src,
            span: err.to_source_span(),
            help: err.help,
            message: err.message,
            label: err.label,
        }
    }
}

pub fn syntax_diagnostics(name: &str, source: &str, errors: &[SyntaxError]) -> Vec<SyntaxDiagnostic> {
    errors
        .iter()
        .map(|err| {
            let src = NamedSource::new(name, source.to_string());
            SyntaxDiagnostic::from_error(src, err.clone())
        })
        .collect()
}

pub fn emit_syntax_errors(name: &str, source: &str, errors: &[SyntaxError]) {
    for diagnostic in syntax_diagnostics(name, source, errors) {
        eprintln!("{:?}", Report::new(diagnostic));
    }
}

pub fn report_runtime_error(error: &RuntimeError) {
    eprintln!("Runtime error: {}", error);
}

pub fn report_io_error(path: &Path, error: &std::io::Error) {
    eprintln!("Failed to access {}: {}", path.display(), error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parser::parse_source;

    #[test]
    fn syntax_errors_become_labelled_diagnostics() {
        let source = "let x 5;";
        let errors = parse_source(source).unwrap_err();
        let diagnostics = syntax_diagnostics("demo.kite", source, &errors);
        assert_eq!(diagnostics.len(), 1);

        let diagnostic = &diagnostics[0];
        assert_eq!(
            diagnostic.to_string(),
            "Expected `=` after the binding name: found integer `5`"
        );
        let help = diagnostic.help().map(|help| help.to_string());
        assert_eq!(help.as_deref(), Some("Try: let x = <value>;"));
        let labels: Vec<_> = diagnostic.labels().into_iter().flatten().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 6);
        assert_eq!(labels[0].len(), 1);
    }
}
