mod builtin;
pub mod directives;
pub mod loader;
pub mod parser;
pub mod selector;

pub use directives::{Directive, RetryPattern, RewriteRule, SiteOverride};
pub use loader::{ConfigLoader, ConfigLoaderBuilder, OverrideRegistry};
pub use parser::ConfigParser;
pub use selector::{SelectorTerm, TitleSelector};
