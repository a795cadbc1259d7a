mod command_risk;
mod completeness;
mod lexer;

pub use command_risk::CommandRisk;
pub use command_risk::classify;
pub use completeness::BashOracle;
pub use completeness::Completeness;
pub use completeness::ContinuationHint;
pub use completeness::SyntaxOracle;

#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("failed to load the bash grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),
}
