//! 编译模块：将原始规则词元编译为精确集合与锚定正则
pub mod token;
pub mod pattern;
pub mod compiler;

pub use self::token::{classify_token, token_source, TokenKind};
pub use self::pattern::{CompiledPattern, ProviderRule, RuleSet};
pub use self::compiler::RuleCompiler;
