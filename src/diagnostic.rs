use log::warn;
use std::cell::RefCell;
use std::fmt::{Display, Formatter};

/// Non-fatal conditions met while running a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    MissingDimension {
        element_id: u32,
        width: Option<f32>,
        height: Option<f32>,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MissingDimension { element_id, width, height } => write!(
                f,
                "element {} has no dimension from its parameters or its children (width: {:?}, height: {:?})",
                element_id, width, height
            ),
        }
    }
}

pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic);
}

/// Default sink, forwards everything to the `log` facade.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
    }
}

/// Keeps reported diagnostics in memory.
#[derive(Default)]
pub struct RecordingSink {
    records: RefCell<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Diagnostic> {
        self.records.borrow().clone()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        self.records.take()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.records.borrow_mut().push(diagnostic);
    }
}
