use sqlparser::{
    ast::{ObjectName, SetExpr, Statement},
    dialect::SQLiteDialect,
    parser::Parser,
};

use crate::sql::{ConvertError, COLUMNS, PAGE_TABLE};

/// Parses generated sql back with the SQLite dialect and makes sure it is the
/// insert we meant to write: into `page`, all columns, one row per record.
pub fn check_generated_sql(
    sql: &str,
    expected_rows: usize,
    with_schema: bool,
) -> Result<(), ConvertError> {
    let dialect = SQLiteDialect {};
    let statements = Parser::parse_sql(&dialect, sql)?;
    let mut statements = statements.iter();

    if with_schema {
        match statements.next() {
            Some(Statement::CreateTable { name, columns, .. }) => {
                if !is_page_table(name) {
                    return Err(ConvertError::Check("CREATE TABLE is not for 'page'"));
                }

                let names: Vec<&str> = columns
                    .iter()
                    .map(|column| column.name.value.as_str())
                    .collect();
                if names != COLUMNS {
                    return Err(ConvertError::Check("CREATE TABLE has the wrong columns"));
                }
            }
            _ => return Err(ConvertError::Check("expected CREATE TABLE before the insert")),
        }
    }

    let insert = statements
        .next()
        .ok_or(ConvertError::Check("expected an INSERT statement"))?;
    if statements.next().is_some() {
        return Err(ConvertError::Check("unexpected statement after the insert"));
    }

    let Statement::Insert {
        table_name,
        columns,
        source,
        ..
    } = insert
    else {
        return Err(ConvertError::Check("expected an INSERT statement"));
    };

    if !is_page_table(table_name) {
        return Err(ConvertError::Check("INSERT is not into 'page'"));
    }

    let names: Vec<&str> = columns.iter().map(|ident| ident.value.as_str()).collect();
    if names != COLUMNS {
        return Err(ConvertError::Check("INSERT has the wrong column list"));
    }

    let SetExpr::Values(values) = source.body.as_ref() else {
        return Err(ConvertError::Check("INSERT has no VALUES clause"));
    };

    if values.rows.len() != expected_rows {
        return Err(ConvertError::RowCount {
            expected: expected_rows,
            found: values.rows.len(),
        });
    }

    if values.rows.iter().any(|row| row.len() != COLUMNS.len()) {
        return Err(ConvertError::Check("a value tuple has the wrong arity"));
    }

    Ok(())
}

fn is_page_table(name: &ObjectName) -> bool {
    name.0
        .last()
        .map_or(false, |ident| ident.value.eq_ignore_ascii_case(PAGE_TABLE))
}
