pub mod analyzer;
pub mod cli;
pub mod config;
pub mod fixer;
pub mod mcp;
pub mod rules;
pub mod scan;
pub mod symbols;
pub mod syntax;
pub mod text;

pub use analyzer::Analyzer;
pub use rules::registry::RuleRegistry;
pub use rules::{Finding, Rule};
pub use symbols::KnownSymbols;
pub use syntax::SyntaxCheck;
