//! Scripted value domains.
//!
//! A script is a plain rhai source file defining the domain contract as
//! methods on a per-column state map:
//!
//! ```text
//! fn reset(column) { this.i = 0; }
//! fn next() { this.i += 1; this.i <= 3 }
//! fn value() { `row-${this.i}` }
//! ```
//!
//! and optionally a check-table function returning explicit check values
//! per column name:
//!
//! ```text
//! fn table_checks(table) { #{ email: ["", "a@b.c"] } }
//! ```
//!
//! `column` and `table` are maps with the column/table metadata. The engine
//! is sandboxed: no file or module access, bounded operations and sizes.

use super::ValueDomain;
use crate::error::DomainError;
use crate::schema::{Column, Table};
use rhai::module_resolvers::DummyModuleResolver;
use rhai::{CallFnOptions, Dynamic, Engine, Map, Scope, AST};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Operation budget for a single script call
const MAX_OPERATIONS: u64 = 1_000_000;

/// Loads scripted domains and check tables from script source.
pub trait ScriptHost {
    /// Compile `source` and bind it to `column` as a value domain
    fn load_domain(
        &self,
        script: &str,
        source: &str,
        table: &Table,
        column: &Column,
    ) -> Result<Box<dyn ValueDomain>, DomainError>;

    /// Run the script's check-table function for `table`
    fn table_checks(
        &self,
        script: &str,
        source: &str,
        table: &Table,
    ) -> Result<BTreeMap<String, Vec<Option<String>>>, DomainError>;
}

/// [`ScriptHost`] backed by a sandboxed rhai engine
#[derive(Clone)]
pub struct RhaiHost {
    engine: Rc<Engine>,
}

impl Default for RhaiHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RhaiHost {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(MAX_OPERATIONS);
        engine.set_max_call_levels(32);
        engine.set_max_expr_depths(64, 32);
        engine.set_max_string_size(64 * 1024);
        engine.set_max_array_size(10_000);
        engine.set_max_map_size(10_000);
        engine.disable_symbol("eval");
        engine.set_module_resolver(DummyModuleResolver::new());
        engine.on_print(|_| {});
        engine.on_debug(|_, _, _| {});
        Self {
            engine: Rc::new(engine),
        }
    }

    fn compile(&self, script: &str, source: &str) -> Result<AST, DomainError> {
        self.engine
            .compile(source)
            .map_err(|e| script_error(script, e.to_string()))
    }
}

impl ScriptHost for RhaiHost {
    fn load_domain(
        &self,
        script: &str,
        source: &str,
        table: &Table,
        column: &Column,
    ) -> Result<Box<dyn ValueDomain>, DomainError> {
        let ast = self.compile(script, source)?;
        for required in ["reset", "next", "value"] {
            if !ast.iter_functions().any(|f| f.name == required) {
                return Err(script_error(
                    script,
                    format!("missing required function '{required}'"),
                ));
            }
        }
        Ok(Box::new(ScriptedDomain {
            engine: Rc::clone(&self.engine),
            ast,
            script: script.to_string(),
            column: column_metadata(table, column),
            limit: column.col_type.max_length.map(|l| l as usize),
            state: Dynamic::from_map(Map::new()),
        }))
    }

    fn table_checks(
        &self,
        script: &str,
        source: &str,
        table: &Table,
    ) -> Result<BTreeMap<String, Vec<Option<String>>>, DomainError> {
        let ast = self.compile(script, source)?;
        let mut scope = Scope::new();
        let result: Dynamic = self
            .engine
            .call_fn(&mut scope, &ast, "table_checks", (table_metadata(table),))
            .map_err(|e| script_error(script, e.to_string()))?;

        let map = result
            .try_cast::<Map>()
            .ok_or_else(|| script_error(script, "table_checks must return a map".into()))?;

        let mut checks = BTreeMap::new();
        for (name, values) in map {
            let values = values.into_array().map_err(|kind| {
                script_error(script, format!("checks for '{name}' must be an array, got {kind}"))
            })?;
            let values = values.into_iter().map(dynamic_to_value).collect();
            checks.insert(name.to_string(), values);
        }
        Ok(checks)
    }
}

/// A value domain whose operations run inside a script
pub struct ScriptedDomain {
    engine: Rc<Engine>,
    ast: AST,
    script: String,
    column: Map,
    limit: Option<usize>,
    state: Dynamic,
}

impl ScriptedDomain {
    fn call(&mut self, name: &str, args: Vec<Dynamic>) -> Result<Dynamic, DomainError> {
        let mut scope = Scope::new();
        let options = CallFnOptions::new()
            .eval_ast(false)
            .bind_this_ptr(&mut self.state);
        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut scope, &self.ast, name, args)
            .map_err(|e| script_error(&self.script, format!("{name}(): {e}")))
    }
}

impl ValueDomain for ScriptedDomain {
    fn reset(&mut self) -> Result<(), DomainError> {
        self.state = Dynamic::from_map(Map::new());
        let column = Dynamic::from_map(self.column.clone());
        self.call("reset", vec![column])?;
        Ok(())
    }

    fn next(&mut self) -> Result<bool, DomainError> {
        let result = self.call("next", Vec::new())?;
        result
            .as_bool()
            .map_err(|kind| script_error(&self.script, format!("next() must return bool, got {kind}")))
    }

    fn value(&mut self) -> Result<String, DomainError> {
        let result = self.call("value", Vec::new())?;
        Ok(dynamic_to_value(result).unwrap_or_default())
    }

    fn char_limit(&self) -> Option<usize> {
        self.limit
    }
}

fn script_error(script: &str, message: String) -> DomainError {
    DomainError::Script {
        script: script.to_string(),
        message,
    }
}

/// `()` maps to NULL, strings pass through, anything else is displayed
fn dynamic_to_value(value: Dynamic) -> Option<String> {
    if value.is_unit() {
        return None;
    }
    if value.is_string() {
        return value.into_string().ok();
    }
    Some(value.to_string())
}

fn column_metadata(table: &Table, column: &Column) -> Map {
    let mut map = Map::new();
    let col_type = &column.col_type;
    map.insert("table".into(), table.name.canonical().into());
    map.insert("name".into(), column.name.clone().into());
    map.insert("ordinal".into(), Dynamic::from(column.ordinal.0 as i64));
    map.insert("type_name".into(), col_type.name.clone().into());
    map.insert("type_schema".into(), col_type.schema.clone().into());
    map.insert("nullable".into(), Dynamic::from(column.is_nullable));
    map.insert("has_default".into(), Dynamic::from(column.has_default));
    map.insert(
        "max_length".into(),
        col_type
            .max_length
            .map_or(Dynamic::UNIT, |l| Dynamic::from(l as i64)),
    );
    map.insert(
        "precision".into(),
        col_type
            .precision
            .map_or(Dynamic::UNIT, |p| Dynamic::from(p as i64)),
    );
    map.insert(
        "scale".into(),
        col_type.scale.map_or(Dynamic::UNIT, |s| Dynamic::from(s as i64)),
    );
    map
}

fn table_metadata(table: &Table) -> Map {
    let mut map = Map::new();
    map.insert("schema".into(), table.name.schema.clone().into());
    map.insert("name".into(), table.name.name.clone().into());
    let columns: rhai::Array = table
        .columns
        .iter()
        .map(|c| Dynamic::from_map(column_metadata(table, c)))
        .collect();
    map.insert("columns".into(), columns.into());
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enumerate;
    use crate::schema::{ColumnType, Identifier, TableId};

    fn table() -> Table {
        let mut table = Table::new(Identifier::parse("public.users"), TableId(0));
        table
            .add_column("email", ColumnType::base("varchar").with_length(20))
            .is_nullable = false;
        table
    }

    const COUNTER: &str = r#"
        fn reset(column) { this.i = 0; this.prefix = column.name; }
        fn next() { this.i += 1; this.i <= 3 }
        fn value() { `${this.prefix}-${this.i}` }
    "#;

    #[test]
    fn test_scripted_domain_contract() {
        let host = RhaiHost::new();
        let table = table();
        let mut domain = host
            .load_domain("counter.rhai", COUNTER, &table, &table.columns[0])
            .unwrap();
        assert_eq!(
            enumerate(domain.as_mut(), 10).unwrap(),
            vec!["email-1", "email-2", "email-3"]
        );
        assert_eq!(domain.char_limit(), Some(20));
        // Reset replays the sequence
        assert_eq!(enumerate(domain.as_mut(), 1).unwrap(), vec!["email-1"]);
    }

    #[test]
    fn test_missing_function_rejected() {
        let host = RhaiHost::new();
        let table = table();
        let err = host
            .load_domain("bad.rhai", "fn reset(c) {}", &table, &table.columns[0])
            .err()
            .unwrap();
        assert!(matches!(err, DomainError::Script { .. }));
    }

    #[test]
    fn test_runtime_error_is_tagged() {
        let host = RhaiHost::new();
        let table = table();
        let source = r#"
            fn reset(column) { this.i = 0; }
            fn next() { throw "boom"; }
            fn value() { "" }
        "#;
        let mut domain = host
            .load_domain("boom.rhai", source, &table, &table.columns[0])
            .unwrap();
        domain.reset().unwrap();
        match domain.next() {
            Err(DomainError::Script { script, message }) => {
                assert_eq!(script, "boom.rhai");
                assert!(message.contains("boom"));
            }
            other => panic!("expected script error, got {other:?}"),
        }
    }

    #[test]
    fn test_table_checks() {
        let host = RhaiHost::new();
        let source = r#"
            fn table_checks(table) {
                #{ email: ["", "x@example.com", ()] }
            }
        "#;
        let checks = host.table_checks("checks.rhai", source, &table()).unwrap();
        assert_eq!(
            checks["email"],
            vec![Some(String::new()), Some("x@example.com".into()), None]
        );
    }

    #[test]
    fn test_import_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("secret.rhai"), "export const secret = \"leaked\";").unwrap();
        let module = dir.path().join("secret").to_string_lossy().replace('\\', "/");
        let source = format!(
            r#"
            fn reset(column) {{ }}
            fn next() {{ true }}
            fn value() {{ import "{module}" as m; m::secret }}
        "#
        );
        let table = table();
        let mut domain = RhaiHost::new()
            .load_domain("import.rhai", &source, &table, &table.columns[0])
            .unwrap();
        domain.reset().unwrap();
        assert!(domain.next().unwrap());
        assert!(matches!(domain.value(), Err(DomainError::Script { .. })));
    }

    #[test]
    fn test_infinite_loop_is_bounded() {
        let host = RhaiHost::new();
        let source = r#"
            fn reset(column) { }
            fn next() { loop { } }
            fn value() { "" }
        "#;
        let table = table();
        let mut domain = host
            .load_domain("spin.rhai", source, &table, &table.columns[0])
            .unwrap();
        domain.reset().unwrap();
        assert!(domain.next().is_err());
    }
}
