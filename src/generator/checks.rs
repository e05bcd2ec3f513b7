//! Default check rows built from each column type's boundary values.

use crate::domain::{TypeFamily, BOOLEAN_LABELS};
use crate::record::{PartialRecord, PartialRecords, Value};
use crate::schema::{Column, ColumnId, Table, TypeKind};

/// Longest string check emitted for length-limited text columns
const MAX_FILLER_LEN: u32 = 4096;

/// Canonical boundary values for a column, or an empty list when its type
/// has no built-in family
pub fn boundary_values(column: &Column) -> Vec<Value> {
    let col_type = &column.col_type;
    let Some(family) = TypeFamily::classify(col_type) else {
        return Vec::new();
    };

    let mut values: Vec<Value> = match family {
        TypeFamily::Boolean => BOOLEAN_LABELS.iter().map(|s| Some(s.to_string())).collect(),
        TypeFamily::Enum => match &col_type.kind {
            TypeKind::Enum(labels) => labels.iter().cloned().map(Some).collect(),
            _ => Vec::new(),
        },
        TypeFamily::SmallInt => int_bounds(i16::MIN as i64, i16::MAX as i64),
        TypeFamily::Integer => int_bounds(i32::MIN as i64, i32::MAX as i64),
        TypeFamily::BigInt => int_bounds(i64::MIN, i64::MAX),
        TypeFamily::Float => ["0", "Infinity", "-Infinity", "NaN"]
            .iter()
            .map(|s| Some(s.to_string()))
            .collect(),
        TypeFamily::Numeric => numeric_bounds(col_type.precision, col_type.scale),
        TypeFamily::Text => {
            let mut values = vec![Some(String::new())];
            if let Some(len) = col_type.max_length {
                values.push(Some("x".repeat(len.min(MAX_FILLER_LEN) as usize)));
            }
            values
        }
        TypeFamily::Binary => vec![Some("\\x".to_string())],
        TypeFamily::Bit => {
            let len = col_type.max_length.unwrap_or(1).min(MAX_FILLER_LEN) as usize;
            vec![Some("0".repeat(len)), Some("1".repeat(len))]
        }
        TypeFamily::Uuid => vec![Some("00000000-0000-0000-0000-000000000000".to_string())],
        TypeFamily::Date => vec![Some("1970-01-01".to_string())],
        TypeFamily::Time => vec![
            Some("00:00:00".to_string()),
            Some("23:59:59".to_string()),
        ],
        TypeFamily::Timestamp => vec![Some("1970-01-01T00:00:00Z".to_string())],
    };

    if column.is_nullable {
        values.push(None);
    }
    values
}

fn int_bounds(min: i64, max: i64) -> Vec<Value> {
    [0, -1, 1, max, min]
        .iter()
        .map(|v| Some(v.to_string()))
        .collect()
}

fn numeric_bounds(precision: Option<u32>, scale: Option<u32>) -> Vec<Value> {
    let mut values = vec![Some("0".to_string())];
    let Some(precision) = precision else {
        return values;
    };
    let scale = scale.unwrap_or(0);
    if precision == 0 || scale > precision {
        return values;
    }
    let whole = "9".repeat((precision - scale) as usize);
    let whole = if whole.is_empty() { "0".to_string() } else { whole };
    let top = if scale == 0 {
        whole
    } else {
        format!("{whole}.{}", "9".repeat(scale as usize))
    };
    values.push(Some(top.clone()));
    values.push(Some(format!("-{top}")));
    values
}

/// Default check rows for a table: every emitted column's boundary values,
/// combined with first-fit merging so unrelated columns share rows
pub fn default_checks(table: &Table, emitted: &[ColumnId]) -> PartialRecords {
    let mut checks = PartialRecords::new();
    for &column_id in emitted {
        let Some(column) = table.column(column_id) else {
            continue;
        };
        for value in boundary_values(column) {
            checks.merge_add(PartialRecord::new().with(column_id, value));
        }
    }
    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    #[test]
    fn test_integer_bounds() {
        let column = Column::new(ColumnId(0), "id", ColumnType::base("int4")).not_null();
        let values = boundary_values(&column);
        assert_eq!(
            values,
            vec![
                Some("0".to_string()),
                Some("-1".to_string()),
                Some("1".to_string()),
                Some("2147483647".to_string()),
                Some("-2147483648".to_string()),
            ]
        );
    }

    #[test]
    fn test_nullable_adds_null() {
        let column = Column::new(ColumnId(0), "flag", ColumnType::base("bool"));
        let values = boundary_values(&column);
        assert_eq!(values.last(), Some(&None));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_numeric_bounds() {
        assert_eq!(
            numeric_bounds(Some(5), Some(2)),
            vec![
                Some("0".to_string()),
                Some("999.99".to_string()),
                Some("-999.99".to_string())
            ]
        );
        assert_eq!(
            numeric_bounds(Some(2), Some(2))[1],
            Some("0.99".to_string())
        );
    }

    #[test]
    fn test_unsupported_type_has_no_checks() {
        let column = Column::new(ColumnId(0), "doc", ColumnType::base("jsonb"));
        assert!(boundary_values(&column).is_empty());
    }
}
