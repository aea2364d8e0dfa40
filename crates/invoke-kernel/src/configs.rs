//! Loaded configuration
//!
//! The declaration model the engine consumes. Parsing is done elsewhere; these
//! types are what a loader hands over: action declarations with their
//! unevaluated configuration bodies, and the provider configurations each
//! module declares.
//!
//! Declarations are shared as `Arc<ActionDecl>` and never mutated after load.

use indexmap::IndexMap;
use invoke_addrs::{
    AbsProviderConfig, Action, ConfigAction, LocalProviderConfig, Module, Provider,
};
use invoke_value::Value;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Position in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourcePos {
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

/// Span of source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    /// File the span is in
    pub filename: String,
    /// First position
    pub start: SourcePos,
    /// Position after the last character
    pub end: SourcePos,
}

impl SourceRange {
    /// Create a range from `(line, column)` pairs
    #[must_use]
    pub fn new(filename: impl Into<String>, start: (usize, usize), end: (usize, usize)) -> Self {
        Self {
            filename: filename.into(),
            start: SourcePos {
                line: start.0,
                column: start.1,
            },
            end: SourcePos {
                line: end.0,
                column: end.1,
            },
        }
    }
}

impl Display for SourceRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{}-{},{}",
            self.filename, self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// Unevaluated expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant
    Literal(Value),
    /// Reference to another object's value, by traversal (`data.secrets.token`)
    Reference(String),
    /// `each.key`
    EachKey,
    /// `each.value`
    EachValue,
    /// `count.index`
    CountIndex,
    /// `[a, b]`
    List(Vec<Expr>),
    /// `{ k = v }`
    Object(Vec<(String, Expr)>),
    /// `"${a}-${b}"`
    Concat(Vec<Expr>),
}

impl Expr {
    /// Literal string
    #[inline]
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::Literal(Value::string(s))
    }

    /// Reference by traversal
    #[inline]
    #[must_use]
    pub fn reference(traversal: impl Into<String>) -> Self {
        Self::Reference(traversal.into())
    }
}

/// One `name = expr` in a body
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Argument name
    pub name: String,
    /// Unevaluated value
    pub expr: Expr,
    /// Where the attribute is written
    pub range: SourceRange,
}

/// Configuration body of a declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Attributes in source order
    pub attributes: IndexMap<String, Attribute>,
    /// Span of the whole body
    pub range: SourceRange,
}

impl Body {
    /// Empty body
    #[inline]
    #[must_use]
    pub fn new(range: SourceRange) -> Self {
        Self {
            attributes: IndexMap::new(),
            range,
        }
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, expr: Expr, range: SourceRange) -> Self {
        let name = name.into();
        self.attributes.insert(
            name.clone(),
            Attribute { name, expr, range },
        );
        self
    }

    /// Look up an attribute
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }
}

/// Explicit `provider = <name>.<alias>` on a declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfigRef {
    /// Local provider name
    pub name: String,
    /// Configuration alias
    pub alias: Option<String>,
}

/// Parsed `action "<type>" "<name>" { ... }` block
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDecl {
    /// Action type
    pub type_name: String,
    /// Declared name
    pub name: String,
    /// Provider serving this action type
    pub provider: Provider,
    /// Explicit provider configuration, if any
    pub provider_config_ref: Option<ProviderConfigRef>,
    /// Nested `config` body, if any
    pub config: Option<Body>,
    /// Span of the block header
    pub decl_range: SourceRange,
}

impl ActionDecl {
    /// Declaration with the provider implied by its type and no body
    #[must_use]
    pub fn new(type_name: impl Into<String>, name: impl Into<String>, decl_range: SourceRange) -> Self {
        let type_name = type_name.into();
        Self {
            provider: Provider::implied_by_action_type(&type_name),
            type_name,
            name: name.into(),
            provider_config_ref: None,
            config: None,
            decl_range,
        }
    }

    /// Attach a configuration body
    #[inline]
    #[must_use]
    pub fn with_config(mut self, body: Body) -> Self {
        self.config = Some(body);
        self
    }

    /// Set the provider source address
    #[inline]
    #[must_use]
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// Point at an explicit provider configuration
    #[inline]
    #[must_use]
    pub fn with_provider_ref(mut self, name: impl Into<String>, alias: Option<String>) -> Self {
        self.provider_config_ref = Some(ProviderConfigRef {
            name: name.into(),
            alias,
        });
        self
    }

    /// Module-relative address of this declaration
    #[inline]
    #[must_use]
    pub fn addr(&self) -> Action {
        Action::new(&self.type_name, &self.name)
    }

    /// Provider configuration this declaration asks for
    ///
    /// The explicit `provider` argument when given, otherwise the default
    /// configuration of the provider implied by the action type.
    #[must_use]
    pub fn provider_config_addr(&self) -> LocalProviderConfig {
        match &self.provider_config_ref {
            Some(r) => LocalProviderConfig {
                local_name: r.name.clone(),
                alias: r.alias.clone(),
            },
            None => LocalProviderConfig::implied_by_action_type(&self.type_name),
        }
    }
}

/// Everything loaded from configuration that the engine needs
#[derive(Debug, Clone, Default)]
pub struct Config {
    actions: IndexMap<ConfigAction, Arc<ActionDecl>>,
    provider_configs: HashSet<(Module, LocalProviderConfig)>,
}

impl Config {
    /// Empty configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration in `module`
    pub fn add_action(&mut self, module: &Module, decl: ActionDecl) -> Arc<ActionDecl> {
        let decl = Arc::new(decl);
        self.actions
            .insert(decl.addr().in_module(module), Arc::clone(&decl));
        decl
    }

    /// Register a `provider` block in `module`
    pub fn add_provider_config(&mut self, module: &Module, local: LocalProviderConfig) {
        self.provider_configs.insert((module.clone(), local));
    }

    /// Declaration at `addr`
    #[must_use]
    pub fn action(&self, addr: &ConfigAction) -> Option<Arc<ActionDecl>> {
        self.actions.get(addr).cloned()
    }

    /// All declarations in load order
    pub fn actions(&self) -> impl Iterator<Item = (&ConfigAction, &Arc<ActionDecl>)> {
        self.actions.iter()
    }

    /// Resolve a module-relative provider reference
    ///
    /// Searches `module` and then each ancestor for a matching `provider`
    /// block. Without one, the reference binds to the root module's
    /// configuration of that provider.
    #[must_use]
    pub fn resolve_provider(
        &self,
        module: &Module,
        local: &LocalProviderConfig,
        provider: &Provider,
    ) -> AbsProviderConfig {
        let declaring = module
            .self_and_ancestors()
            .find(|m| self.provider_configs.contains(&(m.clone(), local.clone())))
            .unwrap_or_else(Module::root);
        AbsProviderConfig::new(declaring, provider.clone(), local.alias.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> SourceRange {
        SourceRange::new("main.tf", (1, 1), (1, 20))
    }

    #[test]
    fn implied_provider_config() {
        let decl = ActionDecl::new("webhook_notify", "notify", range());
        assert_eq!(decl.provider, Provider::new("webhook"));
        assert_eq!(decl.provider_config_addr(), LocalProviderConfig::new("webhook"));
    }

    #[test]
    fn explicit_provider_config() {
        let decl = ActionDecl::new("webhook_notify", "notify", range())
            .with_provider_ref("webhook", Some("eu".into()));
        assert_eq!(
            decl.provider_config_addr(),
            LocalProviderConfig::new("webhook").with_alias("eu")
        );
    }

    #[test]
    fn lookup_by_config_action() {
        let mut config = Config::new();
        let module = Module::root().child("app");
        config.add_action(&module, ActionDecl::new("t", "n", range()));

        assert!(config.action(&Action::new("t", "n").in_module(&module)).is_some());
        assert!(config.action(&Action::new("t", "n").in_module(&Module::root())).is_none());
    }

    #[test]
    fn provider_resolution_prefers_nearest_module() {
        let mut config = Config::new();
        let app = Module::root().child("app");
        let nested = app.child("inner");
        let local = LocalProviderConfig::new("webhook");
        config.add_provider_config(&app, local.clone());

        let resolved = config.resolve_provider(&nested, &local, &Provider::new("webhook"));
        assert_eq!(resolved.module, app);

        let other = config.resolve_provider(
            &nested,
            &LocalProviderConfig::new("webhook").with_alias("eu"),
            &Provider::new("webhook"),
        );
        assert_eq!(other.module, Module::root());
        assert_eq!(other.alias.as_deref(), Some("eu"));
    }

    #[test]
    fn source_range_display() {
        assert_eq!(range().to_string(), "main.tf:1,1-1,20");
    }
}
