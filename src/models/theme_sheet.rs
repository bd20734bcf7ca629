//! Theme variable tables.
//!
//! A theme maps CSS custom property names (stored without the leading `--`)
//! to color values. Values may reference other variables of the same theme
//! through `var(--name)` or `var(--name, fallback)`.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::ResolveError;

/// Maximum `var()` nesting followed before giving up.
pub const MAX_VAR_DEPTH: usize = 32;

/// Variables of a single theme plus the colors of its page background and
/// foreground, used when a theme variable does not yield a usable color.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ThemeDefinition {
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    #[serde(default)]
    pub ambient_background: Option<String>,

    #[serde(default)]
    pub ambient_foreground: Option<String>,
}

impl ThemeDefinition {
    /// Add or replace a variable. The name may be given with or without `--`.
    pub fn with_variable(mut self, name: &str, value: &str) -> Self {
        self.variables
            .insert(strip_dashes(name).to_string(), value.to_string());
        self
    }

    pub fn with_ambient(mut self, background: &str, foreground: &str) -> Self {
        self.ambient_background = Some(background.to_string());
        self.ambient_foreground = Some(foreground.to_string());
        self
    }

    /// Computed value of a variable, following `var()` references.
    pub fn variable(&self, name: &str) -> Result<String, ResolveError> {
        let mut stack = Vec::new();
        self.lookup(strip_dashes(name), &mut stack)
    }

    /// Computed value of an arbitrary declaration such as `var(--x)` or `#fff`.
    pub fn resolve_value(&self, value: &str) -> Result<String, ResolveError> {
        let mut stack = Vec::new();
        self.substitute(value, &mut stack)
    }

    fn lookup<'a>(&'a self, name: &'a str, stack: &mut Vec<&'a str>) -> Result<String, ResolveError> {
        let value = self
            .variables
            .get(name)
            .ok_or_else(|| ResolveError::UndefinedVariable(name.to_string()))?;

        if stack.contains(&name) {
            return Err(ResolveError::Cycle(name.to_string()));
        }
        if stack.len() >= MAX_VAR_DEPTH {
            return Err(ResolveError::TooDeep(name.to_string()));
        }

        stack.push(name);
        let resolved = self.substitute(value, stack);
        stack.pop();
        resolved
    }

    fn substitute<'a>(&'a self, value: &'a str, stack: &mut Vec<&'a str>) -> Result<String, ResolveError> {
        let Some((name, fallback)) = parse_var(value) else {
            return Ok(value.trim().to_string());
        };

        match (self.lookup(name, stack), fallback) {
            (Err(ResolveError::UndefinedVariable(_)), Some(fallback)) => {
                self.substitute(fallback, stack)
            }
            (resolved, _) => resolved,
        }
    }
}

/// Theme name -> definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ThemeSheet {
    themes: BTreeMap<String, ThemeDefinition>,
}

impl ThemeSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `light` and `dark` themes shipped with the server.
    pub fn builtin() -> Self {
        Self::new()
            .with_theme(
                "light",
                ThemeDefinition::default()
                    .with_variable("color-white", "rgb(255, 255, 255)")
                    .with_variable("color-black", "rgb(0, 0, 0)")
                    .with_variable("color-gray-70", "#b3b3b3")
                    .with_variable("theme-background", "var(--color-white)")
                    .with_variable("theme-text", "var(--color-black)")
                    .with_variable("theme-focused-foreground", "var(--color-gray-70)")
                    .with_ambient("var(--color-white)", "var(--color-black)"),
            )
            .with_theme(
                "dark",
                ThemeDefinition::default()
                    .with_variable("color-white", "rgb(255, 255, 255)")
                    .with_variable("color-black", "rgb(0, 0, 0)")
                    .with_variable("color-gray-20", "#333333")
                    .with_variable("theme-background", "var(--color-black)")
                    .with_variable("theme-text", "var(--color-white)")
                    .with_variable("theme-focused-foreground", "var(--color-gray-20)")
                    .with_ambient("var(--color-black)", "var(--color-white)"),
            )
    }

    pub fn with_theme(mut self, name: &str, theme: ThemeDefinition) -> Self {
        self.themes.insert(name.to_string(), theme);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ThemeDefinition> {
        self.themes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.themes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}

fn strip_dashes(name: &str) -> &str {
    name.trim().trim_start_matches("--")
}

/// Split `var(--name, fallback)` into its variable name and optional fallback.
fn parse_var(value: &str) -> Option<(&str, Option<&str>)> {
    let value = value.trim();
    let head = value.get(..4)?;
    if !head.eq_ignore_ascii_case("var(") || !value.ends_with(')') {
        return None;
    }

    let inner = &value[4..value.len() - 1];
    let (name, fallback) = match inner.split_once(',') {
        Some((name, fallback)) => (name, Some(fallback.trim())),
        None => (inner, None),
    };

    let name = name.trim().strip_prefix("--")?;
    if name.is_empty() {
        return None;
    }
    Some((name, fallback))
}
