//! Source-annotated errors for config and transcript files.

use std::ops::Range;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};

/// An error pointing at one span of a TOML file, optionally with a second
/// span giving context such as the first definition of a duplicate key.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub message: String,
    pub span: Range<usize>,
    pub label: String,
    pub context: Option<(Range<usize>, String)>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: Range<usize>) -> Self {
        Self { message: message.into(), span, label: String::new(), context: None, notes: Vec::new() }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn context(mut self, span: Range<usize>, label: impl Into<String>) -> Self {
        self.context = Some((span, label.into()));
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

pub fn render_diagnostic(file_name: &str, content: &str, diagnostic: &Diagnostic, styled: bool) -> String {
    let mut primary = AnnotationKind::Primary.span(diagnostic.span.clone());
    if !diagnostic.label.is_empty() {
        primary = primary.label(&diagnostic.label);
    }
    let mut snippet = Snippet::source(content).path(file_name).annotation(primary);
    if let Some((span, label)) = &diagnostic.context {
        snippet = snippet.annotation(AnnotationKind::Context.span(span.clone()).label(label));
    }

    let mut groups: Vec<Group> = vec![Level::ERROR.primary_title(&diagnostic.message).element(snippet)];
    groups.extend(diagnostic.notes.iter().map(|note| Group::with_title(Level::NOTE.secondary_title(note))));

    let renderer = if styled { Renderer::styled() } else { Renderer::plain() };
    renderer.render(&groups).to_string()
}

/// Writes to stderr, with color only when stderr is a terminal.
pub fn emit_diagnostic(file_name: &str, content: &str, diagnostic: &Diagnostic) {
    use std::io::IsTerminal;
    let styled = std::io::stderr().is_terminal();
    eprint!("{}", render_diagnostic(file_name, content, diagnostic, styled));
}

pub fn toml_error_to_diagnostic(err: &toml_spanner::Error) -> Diagnostic {
    use toml_spanner::ErrorKind;

    let span: Range<usize> = err.span.into();
    match &err.kind {
        ErrorKind::DuplicateKey { key, first } => Diagnostic::new(format!("duplicate key: `{key}`"), span)
            .label("duplicate key")
            .context((*first).into(), "first defined here"),
        ErrorKind::DuplicateTable { name, first } => Diagnostic::new(format!("redefinition of table `{name}`"), span)
            .label("duplicate table")
            .context((*first).into(), "first defined here"),
        _ => Diagnostic::new(err.to_string(), span),
    }
}
