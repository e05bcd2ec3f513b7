//! Unit tests for the schema model and DDL loader.

use rowseed::schema::{
    ColumnId, ColumnType, Identifier, Schema, SchemaBuilder, Table, TableId, TypeKind,
};

fn build(sql: &str) -> Schema {
    let mut builder = SchemaBuilder::new();
    builder.parse_sql(sql);
    builder.build()
}

mod model_tests {
    use super::*;

    #[test]
    fn test_schema_table_lookup() {
        let mut schema = Schema::new();
        let id = schema.add_table(Table::new(Identifier::parse("Sales.Orders"), TableId(99)));
        assert_eq!(id, TableId(0));
        assert_eq!(schema.get_table_id("Sales.Orders"), Some(id));
        assert_eq!(schema.get_table_id("sales.orders"), Some(id));
        assert_eq!(schema.get_table_id("orders"), Some(id));
        assert_eq!(schema.get_table_id("public.orders"), None);
    }

    #[test]
    fn test_primary_key_mirrors_unique_index() {
        let mut table = Table::new(Identifier::parse("t"), TableId(0));
        table.add_column("a", ColumnType::base("int4"));
        table.add_column("b", ColumnType::base("int4"));
        table.set_primary_key(vec![ColumnId(0), ColumnId(1)]);
        table.add_unique_index("dup".into(), vec![ColumnId(0), ColumnId(1)], false);

        let unique: Vec<_> = table.unique_indexes().collect();
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].name, "t_pkey");
        assert!(unique[0].is_primary);
        assert!(!table.get_column("a").unwrap().is_nullable);
    }

    #[test]
    fn test_identifier_equality_ignores_oid() {
        let a = Identifier::new("public", "users").with_oid(5);
        let b = Identifier::parse("users");
        assert_eq!(a, b);
        assert_eq!(a.canonical(), "public.users");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            ColumnType::base("numeric").with_precision(10, Some(2)).display_name(),
            "numeric(10,2)"
        );
        assert_eq!(
            ColumnType::base("varchar").with_length(64).display_name(),
            "varchar(64)"
        );
    }
}

mod ddl_tests {
    use super::*;

    #[test]
    fn test_parse_create_table_simple() {
        let schema = build(
            r#"
CREATE TABLE public.users (
    id BIGSERIAL PRIMARY KEY,
    email VARCHAR(255) NOT NULL UNIQUE,
    score NUMERIC(5, 2) DEFAULT 0,
    created_at TIMESTAMP WITH TIME ZONE NOT NULL
);
"#,
        );
        let users = schema.get_table("users").unwrap();
        assert_eq!(users.columns.len(), 4);

        let id = users.get_column("id").unwrap();
        assert_eq!(id.col_type.name, "bigserial");
        assert!(id.has_default);
        assert!(!id.is_nullable);

        let email = users.get_column("email").unwrap();
        assert_eq!(email.col_type.max_length, Some(255));
        assert!(!email.is_nullable);

        let score = users.get_column("score").unwrap();
        assert_eq!(score.col_type.precision, Some(5));
        assert_eq!(score.col_type.scale, Some(2));
        assert!(score.has_default);

        let created = users.get_column("created_at").unwrap();
        assert_eq!(created.col_type.name, "timestamptz");

        let unique: Vec<&str> = users.unique_indexes().map(|i| i.name.as_str()).collect();
        assert_eq!(unique, vec!["users_pkey", "users_email_key"]);
    }

    #[test]
    fn test_parse_table_constraints() {
        let schema = build(
            r#"
CREATE TABLE order_items (
    order_id INT NOT NULL,
    line INT NOT NULL,
    sku TEXT,
    CONSTRAINT order_items_pk PRIMARY KEY (order_id, line),
    CONSTRAINT order_items_order_fk FOREIGN KEY (order_id) REFERENCES orders (id),
    UNIQUE NULLS NOT DISTINCT (sku),
    CHECK (line > 0)
);
CREATE TABLE orders (id INT PRIMARY KEY);
"#,
        );
        let items = schema.get_table("order_items").unwrap();
        let pk = items.primary_key.as_ref().unwrap();
        assert_eq!(pk.name, "order_items_pk");
        assert_eq!(pk.columns, vec![ColumnId(0), ColumnId(1)]);

        let fk = &items.foreign_keys[0];
        assert_eq!(fk.name.as_deref(), Some("order_items_order_fk"));
        assert_eq!(fk.referenced_table_id, schema.get_table_id("orders"));

        let sku = items
            .unique_indexes()
            .find(|i| i.columns == vec![ColumnId(2)])
            .unwrap();
        assert!(sku.nulls_not_distinct);

        let orders = schema.get_table("orders").unwrap();
        assert_eq!(orders.referenced_by.len(), 1);
        assert_eq!(orders.referenced_by[0].table, items.id);
    }

    #[test]
    fn test_parse_create_index_and_alter() {
        let schema = build(
            r#"
CREATE TABLE accounts (id INT, handle TEXT, tenant INT, name TEXT);
ALTER TABLE accounts ADD CONSTRAINT accounts_pkey PRIMARY KEY (id);
ALTER TABLE accounts ALTER COLUMN name SET NOT NULL;
ALTER TABLE accounts ADD COLUMN region TEXT DEFAULT 'eu';
CREATE UNIQUE INDEX accounts_handle_uq ON accounts (tenant, handle);
CREATE INDEX accounts_name_idx ON accounts USING btree (name);
CREATE UNIQUE INDEX accounts_lower_handle ON accounts (lower(handle));
"#,
        );
        let accounts = schema.get_table("accounts").unwrap();
        assert!(accounts.primary_key.is_some());
        assert!(!accounts.get_column("name").unwrap().is_nullable);

        let region = accounts.get_column("region").unwrap();
        assert!(region.has_default);

        let unique: Vec<&str> = accounts.unique_indexes().map(|i| i.name.as_str()).collect();
        assert_eq!(unique, vec!["accounts_pkey", "accounts_handle_uq"]);
        let handle_uq = accounts
            .unique_indexes()
            .find(|i| i.name == "accounts_handle_uq")
            .unwrap();
        assert_eq!(handle_uq.columns, vec![ColumnId(2), ColumnId(1)]);
        assert!(accounts.indexes.iter().any(|i| i.name == "accounts_name_idx" && !i.is_unique));
    }

    #[test]
    fn test_enum_and_domain_types() {
        let schema = build(
            r#"
CREATE TYPE mood AS ENUM ('sad', 'ok', 'it''s fine');
CREATE TYPE point3 AS (x INT, y INT, z INT);
CREATE DOMAIN email AS TEXT CHECK (VALUE LIKE '%@%');
CREATE TABLE people (
    feeling mood,
    location point3,
    contact email,
    size ENUM('s','m','l'),
    tags TEXT[]
);
"#,
        );
        let people = schema.get_table("people").unwrap();
        assert_eq!(
            people.get_column("feeling").unwrap().col_type.kind,
            TypeKind::Enum(vec!["sad".into(), "ok".into(), "it's fine".into()])
        );
        assert_eq!(
            people.get_column("location").unwrap().col_type.kind,
            TypeKind::Composite
        );
        assert_eq!(
            people.get_column("contact").unwrap().col_type.kind,
            TypeKind::Domain
        );
        assert_eq!(
            people.get_column("size").unwrap().col_type.kind,
            TypeKind::Enum(vec!["s".into(), "m".into(), "l".into()])
        );
        assert_eq!(
            people.get_column("tags").unwrap().col_type.kind,
            TypeKind::Array
        );
    }

    #[test]
    fn test_generated_columns() {
        let schema = build(
            r#"
CREATE TABLE lines (
    id INT GENERATED BY DEFAULT AS IDENTITY,
    qty INT,
    total INT GENERATED ALWAYS AS (qty * 2) STORED
);
"#,
        );
        let lines = schema.get_table("lines").unwrap();
        assert!(!lines.get_column("id").unwrap().is_generated);
        assert!(lines.get_column("id").unwrap().has_default);
        assert!(lines.get_column("total").unwrap().is_generated);
    }

    #[test]
    fn test_quoted_identifiers_and_schemas() {
        let schema = build(
            r#"
CREATE TABLE "billing"."Invoice Lines" ("Line No" INT PRIMARY KEY);
CREATE TABLE `shop`.`items` (`id` INT);
"#,
        );
        let lines = schema.get_table("billing.Invoice Lines").unwrap();
        assert_eq!(lines.name.schema, "billing");
        assert!(lines.get_column("Line No").is_some());
        assert!(schema.get_table("shop.items").is_some());
    }

    #[test]
    fn test_statements_without_schema_are_ignored() {
        let mut builder = SchemaBuilder::new();
        let understood = builder.parse_sql(
            "-- comment; with semicolon\nSET search_path = public;\nCREATE TABLE a (id INT);\nINSERT INTO a VALUES (1);",
        );
        assert_eq!(understood, 1);
        assert_eq!(builder.build().len(), 1);
    }

    #[test]
    fn test_load_schema_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("schema.sql");
        std::fs::write(&path, "CREATE TABLE a (id INT);").unwrap();
        let schema = rowseed::schema::load_schema(&path).unwrap();
        assert_eq!(schema.len(), 1);

        let empty = dir.path().join("empty.sql");
        std::fs::write(&empty, "SELECT 1;").unwrap();
        assert!(rowseed::schema::load_schema(&empty).is_err());
        assert!(rowseed::schema::load_schema(&dir.path().join("missing.sql")).is_err());
    }
}
