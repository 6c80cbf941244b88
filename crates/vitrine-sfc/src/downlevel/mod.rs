//! Syntax downleveling of generated programs.
//!
//! Targets resolve to the newest edition every listed environment runs.
//! Newer syntax is rewritten where an older form exists; whatever is left
//! above that edition fails the program instead of shipping code the
//! targets cannot parse.

mod check;
mod level;
mod lower;

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};

use crate::error::SfcError;

pub use check::{find_unsupported, Unsupported};
pub use level::EsLevel;
pub use lower::{lower, Helper, Lowered};

/// Browserslist-style queries naming the environments output must run on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Targets(Vec<String>);

impl Targets {
    pub fn new<I, S>(queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(queries.into_iter().map(Into::into).collect())
    }

    /// The combined browserslist query.
    pub fn query(&self) -> String {
        self.0.join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Newest edition every target runs. No targets means no lowering.
    pub fn level(&self) -> Result<EsLevel, SfcError> {
        EsLevel::resolve(&self.0)
    }

    /// Check that the queries resolve to a set of environments.
    pub fn validate(&self) -> Result<(), SfcError> {
        self.level().map(|_| ())
    }
}

impl Default for Targets {
    fn default() -> Self {
        Self::new(["last 2 versions", "ie >= 9"])
    }
}

/// Rewrite `source` so it runs on every environment in `targets`.
///
/// The source is parsed as a classic script since render procedures use
/// `with`. Helpers needed by the rewritten code are defined at the top of the
/// program. Nothing is returned unless the whole program fits the targets.
pub fn downlevel(source: &str, targets: &Targets) -> Result<String, SfcError> {
    let level = targets.level()?;
    let lowered = lower(source, level)?;

    let mut code = String::new();
    for helper in &lowered.helpers {
        code.push_str(helper.source());
    }
    code.push_str(&lowered.code);

    let printed = check_and_print(&code, level, source)?;
    tracing::debug!(
        targets = %targets.query(),
        level = %level,
        "Downleveled {} bytes",
        printed.len()
    );
    Ok(printed)
}

/// Like [`downlevel`] for a single expression; the result is an expression too.
///
/// When the rewritten expression needs helpers they are defined inside an
/// immediately invoked function returning it.
pub fn downlevel_expression(source: &str, targets: &Targets) -> Result<String, SfcError> {
    let level = targets.level()?;
    let lowered = lower(&format!("({});", source), level)?;
    let expression = lowered.code.trim_end().trim_end_matches(';');

    let code = if lowered.helpers.is_empty() {
        format!("{};", expression)
    } else {
        let mut code = String::from("(function () {\n");
        for helper in &lowered.helpers {
            code.push_str(helper.source());
        }
        code.push_str(&format!("return {};\n}})();", expression));
        code
    };

    let printed = check_and_print(&code, level, source)?;
    let printed = printed.trim_end().trim_end_matches(';').to_string();
    tracing::debug!(
        targets = %targets.query(),
        level = %level,
        "Downleveled expression of {} bytes",
        printed.len()
    );
    Ok(printed)
}

/// Parse the rewritten `code`, reject anything above `level`, print it.
fn check_and_print(code: &str, level: EsLevel, source: &str) -> Result<String, SfcError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::cjs()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return Err(syntax_error(
            ret.errors.iter().map(|e| e.to_string()),
            source,
        ));
    }

    if let Some(unsupported) = find_unsupported(&ret.program, level) {
        return Err(SfcError::DownlevelSyntax {
            message: unsupported.describe(code, level),
            program: source.to_string(),
        });
    }

    Ok(Codegen::new().build(&ret.program).code)
}

fn syntax_error(messages: impl Iterator<Item = String>, source: &str) -> SfcError {
    let messages: Vec<String> = messages.collect();
    SfcError::DownlevelSyntax {
        message: if messages.is_empty() {
            "parser gave up".to_string()
        } else {
            messages.join("; ")
        },
        program: source.to_string(),
    }
}
