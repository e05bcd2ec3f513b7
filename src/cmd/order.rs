use rowseed::error::Error;
use rowseed::schema::{load_schema, SchemaGraph};
use schemars::JsonSchema;
use serde::Serialize;
use std::path::PathBuf;

/// JSON output for the order command
#[derive(Serialize, JsonSchema)]
pub(crate) struct OrderJsonOutput {
    pub input_file: String,
    pub reverse: bool,
    /// Canonical table names, parents before children unless reversed
    pub tables: Vec<String>,
    /// Tables with a foreign key to themselves
    pub self_referential: Vec<String>,
}

pub fn run(file: PathBuf, reverse: bool, json: bool) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("input file does not exist: {}", file.display());
    }

    let schema = load_schema(&file)?;
    let graph = SchemaGraph::from_schema(&schema);

    let order = match graph.insertion_order() {
        Ok(order) => order,
        Err(Error::Cycle { tables }) => {
            anyhow::bail!(
                "foreign keys form a cycle; no insertion order exists.\n  Tables in cycle: {}",
                tables.join(", ")
            );
        }
        Err(e) => return Err(e.into()),
    };

    let mut tables: Vec<String> = order
        .iter()
        .filter_map(|&id| schema.table(id))
        .map(|t| t.name.canonical())
        .collect();
    if reverse {
        tables.reverse();
    }
    let self_referential: Vec<String> = graph
        .self_referential_tables()
        .into_iter()
        .filter_map(|id| schema.table(id))
        .map(|t| t.name.canonical())
        .collect();

    if json {
        let out = OrderJsonOutput {
            input_file: file.display().to_string(),
            reverse,
            tables,
            self_referential,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for name in &tables {
        println!("{}", name);
    }
    if !self_referential.is_empty() {
        eprintln!(
            "\nSelf-referential tables (order rows within the table yourself): {}",
            self_referential.join(", ")
        );
    }
    Ok(())
}
