//! Read-only view of the types known to a project.

pub mod index;

use crate::language::LanguageSupport;
use crate::parser::Outline;

pub use index::TypeIndex;

/// Name resolution consumed by proposals and import synchronization
pub trait SymbolEnvironment: Send + Sync {
    /// True if `name` (fully qualified, or simple) names a known type
    fn type_exists(&self, name: &str) -> bool;

    /// Fully qualified name `simple_name` refers to from `context_package`.
    ///
    /// A type declared in the context package wins; otherwise the name resolves only
    /// when exactly one package declares it.
    fn resolve_type(&self, simple_name: &str, context_package: Option<&str>) -> Option<String>;

    /// `base` and every type that embeds it, directly or transitively
    fn subtypes_of(&self, base: &str) -> Vec<String>;

    /// Types embedded by `qualified`, fully qualified
    fn embedded_types(&self, _qualified: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Split `import/path.Name` into its package path and simple name
pub fn split_qualified(qualified: &str) -> (&str, &str) {
    let slash = qualified.rfind('/').map(|i| i + 1).unwrap_or(0);
    match qualified[slash..].rfind('.') {
        Some(dot) => (&qualified[..slash + dot], &qualified[slash + dot + 1..]),
        None => ("", qualified),
    }
}

/// Fully qualified name of a type reference written in a file with `outline`.
///
/// Unqualified references belong to `package`; qualifiers map through the file's imports.
pub fn qualify_reference(
    outline: &Outline,
    language: &dyn LanguageSupport,
    package: Option<&str>,
    type_ref: &str,
) -> Option<String> {
    let simple = language.simple_name(type_ref);
    match language.qualifier(type_ref) {
        Some(qualifier) => Some(match outline.import_by_qualifier(qualifier) {
            Some(import) => format!("{}.{}", import.path, simple),
            None => format!("{}.{}", qualifier, simple),
        }),
        None => package.map(|package| format!("{}.{}", package, simple)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qualified() {
        assert_eq!(
            split_qualified("github.com/acme/ui/fields.StringField"),
            ("github.com/acme/ui/fields", "StringField")
        );
        assert_eq!(split_qualified("forms.Form"), ("forms", "Form"));
        assert_eq!(split_qualified("Form"), ("", "Form"));
    }
}
