//! Override-file loader.
//!
//! Override files pin configurations for elements outside the analyzed
//! code (SDK and package APIs). The YAML schema mirrors the recursive
//! shape of a configuration:
//!
//! ```yaml
//! checked_exceptions:
//!   - library: dart:core
//!     element: int.parse
//!     imports: [dart:core]
//!     invoke:
//!       throws: [FormatException]
//!       allows_undeclared: true
//! ```
//!
//! Loading is layered, lowest precedence first: the packaged defaults,
//! each package's `checked_exceptions.yaml`, then the project's
//! `lib/checked_exceptions.yaml`. A malformed file is skipped with a
//! warning; the other layers still load. Type expressions inside `throws`
//! are resolved against `imports ∪ library` through the host-provided
//! [`TypeResolver`].

use anyhow::Context;
use excheck_model::{ElementLocation, Program, TypeId};
use excheck_resolver::{Configuration, OverrideTable, PromotionKind, PromotionMap, Throws};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Resolves a type expression from an override file against a library
/// scope. Provided by the host, which owns name resolution.
pub trait TypeResolver {
    fn resolve_type(&self, expression: &str, scope: &[String]) -> Option<TypeId>;
}

/// Top-level document of an override file.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct OverrideFile {
    pub checked_exceptions: Vec<OverrideEntry>,
}

/// One pinned element.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OverrideEntry {
    pub library: String,
    /// Dotted element path, e.g. `Outer.member.$0` or `Outer.new`.
    pub element: String,
    /// Scope for resolving the type expressions in `throws`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(flatten)]
    pub configuration: ConfigurationNode,
}

/// Recursive configuration shape: throws at this level plus optional
/// `invoke`/`await` slots.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ConfigurationNode {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub throws: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allows_undeclared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoke: Option<Box<ConfigurationNode>>,
    #[serde(default, rename = "await", skip_serializing_if = "Option::is_none")]
    pub awaited: Option<Box<ConfigurationNode>>,
}

/// Defaults shipped with the analyzer, loaded below every other layer.
pub static PACKAGED_DEFAULTS: &str = include_str!("../defaults/checked_exceptions.yaml");

static PARSED_DEFAULTS: Lazy<OverrideFile> = Lazy::new(|| {
    match parse_str(PACKAGED_DEFAULTS) {
        Ok(file) => file,
        Err(error) => {
            warn!(%error, "packaged defaults failed to parse; starting empty");
            OverrideFile::default()
        }
    }
});

/// Parse one override document.
pub fn parse_str(yaml: &str) -> anyhow::Result<OverrideFile> {
    serde_yaml::from_str(yaml).context("malformed override file")
}

/// Read and parse one override file from disk.
pub fn load_path(path: &Path) -> anyhow::Result<OverrideFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading override file {}", path.display()))?;
    parse_str(&text)
}

/// Convert a parsed file into table entries.
pub fn table_from_file(
    program: &Program,
    resolver: &dyn TypeResolver,
    file: &OverrideFile,
) -> OverrideTable {
    let mut table = OverrideTable::new();
    for entry in &file.checked_exceptions {
        let mut scope: Vec<String> = entry.imports.clone();
        scope.push(entry.library.clone());
        let location =
            ElementLocation::parse(&program.interner, &entry.library, &entry.element);
        let configuration =
            configuration_from_node(program, resolver, &entry.configuration, &scope);
        table.insert(location, configuration);
    }
    table
}

/// Load the full layered table: packaged defaults, then each package
/// file, then the project file. Malformed files are skipped; later layers
/// win on conflicting locations.
pub fn load_layered(
    program: &Program,
    resolver: &dyn TypeResolver,
    package_files: &[&Path],
    project_file: Option<&Path>,
) -> OverrideTable {
    let mut table = table_from_file(program, resolver, &PARSED_DEFAULTS);

    for path in package_files {
        match load_path(path) {
            Ok(file) => table.extend(table_from_file(program, resolver, &file)),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping override file");
            }
        }
    }
    if let Some(path) = project_file {
        match load_path(path) {
            Ok(file) => table.extend(table_from_file(program, resolver, &file)),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping project override file");
            }
        }
    }
    debug!(entries = table.len(), "override table loaded");
    table
}

fn configuration_from_node(
    program: &Program,
    resolver: &dyn TypeResolver,
    node: &ConfigurationNode,
    scope: &[String],
) -> Configuration {
    let mut thrown = Vec::new();
    for expression in &node.throws {
        match resolver.resolve_type(expression, scope) {
            Some(ty) => thrown.push(ty),
            None => {
                warn!(expression, "unresolvable throws type in override entry");
            }
        }
    }
    // Override entries anchor configurations: never inferred.
    let throws = Throws::explicit(&program.types, thrown, node.allows_undeclared);

    let mut value = PromotionMap::new();
    if let Some(invoke) = &node.invoke {
        value.insert(
            PromotionKind::Invoke,
            configuration_from_node(program, resolver, invoke, scope),
        );
    }
    if let Some(awaited) = &node.awaited {
        value.insert(
            PromotionKind::Await,
            configuration_from_node(program, resolver, awaited, scope),
        );
    }
    Configuration::new(throws, value)
}

/// Serialize a table back to the file schema (consumed by the bootstrap
/// tooling that seeds defaults for whole libraries).
pub fn to_yaml(program: &Program, table: &OverrideTable) -> anyhow::Result<String> {
    let mut file = OverrideFile::default();
    for (location, configuration) in table.iter() {
        let library = program.interner.resolve(location.library).to_string();
        let element = location
            .path
            .iter()
            .map(|&segment| program.interner.resolve(segment).to_string())
            .collect::<Vec<_>>()
            .join(".");
        file.checked_exceptions.push(OverrideEntry {
            library,
            element,
            imports: Vec::new(),
            configuration: node_from_configuration(program, configuration),
        });
    }
    serde_yaml::to_string(&file).context("serializing override table")
}

fn node_from_configuration(program: &Program, configuration: &Configuration) -> ConfigurationNode {
    ConfigurationNode {
        throws: configuration
            .throws
            .thrown_types()
            .iter()
            .map(|&ty| program.types.display(ty))
            .collect(),
        allows_undeclared: configuration.throws.can_throw_undeclared,
        invoke: configuration
            .invoke()
            .map(|slot| Box::new(node_from_configuration(program, slot))),
        awaited: configuration
            .awaited()
            .map(|slot| Box::new(node_from_configuration(program, slot))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use excheck_model::ProgramBuilder;
    use support::NameResolver;

    /// Test resolver backed by a plain name table.
    mod support {
        use super::TypeResolver;
        use excheck_model::TypeId;
        use std::collections::HashMap;

        pub struct NameResolver {
            pub names: HashMap<String, TypeId>,
        }

        impl TypeResolver for NameResolver {
            fn resolve_type(&self, expression: &str, _scope: &[String]) -> Option<TypeId> {
                self.names.get(expression).copied()
            }
        }
    }

    fn name_resolver() -> NameResolver {
        let mut names = std::collections::HashMap::new();
        names.insert("FormatException".to_string(), TypeId::EXCEPTION);
        names.insert("StateError".to_string(), TypeId::STATE_ERROR);
        NameResolver { names }
    }

    #[test]
    fn parses_recursive_schema() {
        let file = parse_str(
            r#"
checked_exceptions:
  - library: dart:core
    element: int.parse
    imports: [dart:core]
    invoke:
      throws: [FormatException]
      allows_undeclared: true
"#,
        )
        .unwrap();
        assert_eq!(file.checked_exceptions.len(), 1);
        let entry = &file.checked_exceptions[0];
        assert_eq!(entry.element, "int.parse");
        let invoke = entry.configuration.invoke.as_ref().unwrap();
        assert_eq!(invoke.throws, vec!["FormatException"]);
        assert!(invoke.allows_undeclared);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(parse_str("checked_exceptions: 12").is_err());
    }

    #[test]
    fn table_conversion_resolves_types() {
        let builder = ProgramBuilder::new("package:app/app.dart");
        let program = builder.finish();
        let file = parse_str(
            r#"
checked_exceptions:
  - library: dart:core
    element: Iterable.first
    throws: [StateError]
    allows_undeclared: true
"#,
        )
        .unwrap();
        let table = table_from_file(&program, &name_resolver(), &file);
        let location = ElementLocation::parse(&program.interner, "dart:core", "Iterable.first");
        let configuration = table.get(&location).unwrap();
        assert_eq!(
            configuration.throws.thrown_types(),
            &[TypeId::STATE_ERROR]
        );
        assert!(configuration.throws.can_throw_undeclared);
        assert!(!configuration.throws.inferred);
    }

    #[test]
    fn unresolvable_type_is_skipped_not_fatal() {
        let builder = ProgramBuilder::new("package:app/app.dart");
        let program = builder.finish();
        let file = parse_str(
            r#"
checked_exceptions:
  - library: dart:core
    element: f
    throws: [NoSuchType]
"#,
        )
        .unwrap();
        let table = table_from_file(&program, &name_resolver(), &file);
        let location = ElementLocation::parse(&program.interner, "dart:core", "f");
        assert!(table.get(&location).unwrap().throws.thrown_types().is_empty());
    }

    #[test]
    fn layered_loading_skips_malformed_and_later_wins() {
        let builder = ProgramBuilder::new("package:app/app.dart");
        let program = builder.finish();
        let dir = tempfile::tempdir().unwrap();

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "checked_exceptions: {not: a list}").unwrap();

        let package = dir.path().join("checked_exceptions.yaml");
        std::fs::write(
            &package,
            r#"
checked_exceptions:
  - library: dart:core
    element: int.parse
    invoke:
      throws: [StateError]
"#,
        )
        .unwrap();

        let table = load_layered(
            &program,
            &name_resolver(),
            &[broken.as_path(), package.as_path()],
            None,
        );
        let location = ElementLocation::parse(&program.interner, "dart:core", "int.parse");
        let configuration = table.get(&location).unwrap();
        // The package layer replaced the packaged default for int.parse.
        let invoke = configuration.invoke().unwrap();
        assert_eq!(invoke.throws.thrown_types(), &[TypeId::STATE_ERROR]);
    }

    #[test]
    fn yaml_round_trip_preserves_shape() {
        let builder = ProgramBuilder::new("package:app/app.dart");
        let program = builder.finish();
        let file = parse_str(PACKAGED_DEFAULTS).unwrap();
        let table = table_from_file(&program, &name_resolver(), &file);
        let rendered = to_yaml(&program, &table).unwrap();
        let reparsed = parse_str(&rendered).unwrap();
        assert_eq!(reparsed.checked_exceptions.len(), file.checked_exceptions.len());
    }
}
