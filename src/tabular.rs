use std::io::Read;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Int,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

impl Column {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Text,
            required: true,
        }
    }

    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Int,
            required: true,
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell<'a> {
    Text(&'a str),
    Int(u32),
}

pub trait TableRecord: Default {
    const COLUMNS: &'static [Column];

    fn set(&mut self, column: &str, cell: Cell<'_>);
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing header row")]
    MissingHeader,
    #[error("unknown column {0:?}")]
    UnknownColumn(String),
    #[error("duplicate column {0:?}")]
    DuplicateColumn(String),
    #[error("missing column(s) {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("row {row}: column {column} has non-numeric value {value:?}")]
    BadInt {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },
}

pub fn read_records<T, R>(input: R) -> Result<Vec<T>, ParseError>
where
    T: TableRecord,
    R: Read,
{
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(input);
    let mut rows = reader.into_records();

    let header = match rows.next() {
        Some(record) => record.map_err(|source| ParseError::Row { row: 1, source })?,
        None => return Err(ParseError::MissingHeader),
    };
    let bindings = bind_header(&header, T::COLUMNS)?;

    let mut records = Vec::new();
    for (idx, row) in rows.enumerate() {
        let row_number = idx + 2;
        let row = row.map_err(|source| ParseError::Row {
            row: row_number,
            source,
        })?;
        let mut record = T::default();
        for (value, column) in row.iter().zip(bindings.iter()) {
            if value.is_empty() && !column.required {
                continue;
            }
            match column.kind {
                ColumnKind::Text => record.set(column.name, Cell::Text(value)),
                ColumnKind::Int => {
                    let parsed = value.parse::<u32>().map_err(|_| ParseError::BadInt {
                        row: row_number,
                        column: column.name,
                        value: value.to_string(),
                    })?;
                    record.set(column.name, Cell::Int(parsed));
                }
            }
        }
        records.push(record);
    }
    Ok(records)
}

fn bind_header(
    header: &csv::StringRecord,
    columns: &'static [Column],
) -> Result<Vec<&'static Column>, ParseError> {
    let mut bindings = Vec::with_capacity(header.len());
    let mut seen = vec![false; columns.len()];
    for name in header.iter() {
        let idx = columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| ParseError::UnknownColumn(name.to_string()))?;
        if seen[idx] {
            return Err(ParseError::DuplicateColumn(name.to_string()));
        }
        seen[idx] = true;
        bindings.push(&columns[idx]);
    }

    let missing: Vec<String> = columns
        .iter()
        .zip(seen.iter())
        .filter(|(column, bound)| column.required && !**bound)
        .map(|(column, _)| column.name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::MissingColumns(missing));
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Eq)]
    struct Widget {
        id: String,
        label: String,
        count: u32,
        note: String,
    }

    impl TableRecord for Widget {
        const COLUMNS: &'static [Column] = &[
            Column::text("id"),
            Column::text("label"),
            Column::int("count"),
            Column::text("note").optional(),
        ];

        fn set(&mut self, column: &str, cell: Cell<'_>) {
            match (column, cell) {
                ("id", Cell::Text(v)) => self.id = v.to_string(),
                ("label", Cell::Text(v)) => self.label = v.to_string(),
                ("count", Cell::Int(v)) => self.count = v,
                ("note", Cell::Text(v)) => self.note = v.to_string(),
                _ => {}
            }
        }
    }

    fn widget(id: &str, label: &str, count: u32, note: &str) -> Widget {
        Widget {
            id: id.to_string(),
            label: label.to_string(),
            count,
            note: note.to_string(),
        }
    }

    #[test]
    fn parses_rows_in_input_order() {
        let input = "id,label,count,note\nw2,second,3,spare\nw1,first,1,\n";
        let rows: Vec<Widget> = read_records(input.as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![widget("w2", "second", 3, "spare"), widget("w1", "first", 1, "")]
        );
    }

    #[test]
    fn header_columns_may_come_in_any_order() {
        let input = "count,id,note,label\n7,w9,x,ninth\n";
        let rows: Vec<Widget> = read_records(input.as_bytes()).unwrap();
        assert_eq!(rows, vec![widget("w9", "ninth", 7, "x")]);
    }

    #[test]
    fn empty_input_is_a_missing_header() {
        let err = read_records::<Widget, _>("".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingHeader));
    }

    #[test]
    fn header_without_rows_yields_no_records() {
        let rows: Vec<Widget> = read_records("id,label,count,note\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn unknown_column_is_rejected() {
        let err =
            read_records::<Widget, _>("id,label,count,note,extra\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::UnknownColumn(name) if name == "extra"));
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let err = read_records::<Widget, _>("id,label,count,id\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::DuplicateColumn(name) if name == "id"));
    }

    #[test]
    fn missing_columns_are_listed() {
        let err = read_records::<Widget, _>("id,note\n".as_bytes()).unwrap_err();
        match err {
            ParseError::MissingColumns(names) => assert_eq!(names, vec!["label", "count"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn optional_column_may_be_left_out_of_the_header() {
        let rows: Vec<Widget> = read_records("id,label,count\nw1,first,1\n".as_bytes()).unwrap();
        assert_eq!(rows, vec![widget("w1", "first", 1, "")]);
    }

    #[test]
    fn blank_optional_cell_keeps_the_default() {
        let rows: Vec<Widget> =
            read_records("id,label,count,note\nw1,first,1,\n".as_bytes()).unwrap();
        assert_eq!(rows[0].note, "");
    }

    #[test]
    fn blank_required_text_becomes_empty() {
        let rows: Vec<Widget> =
            read_records("id,label,count,note\nw1,,1,\n".as_bytes()).unwrap();
        assert_eq!(rows[0].label, "");
    }

    #[test]
    fn non_numeric_int_reports_row_and_column() {
        let input = "id,label,count,note\nw1,first,1,\nw2,second,lots,\n";
        let err = read_records::<Widget, _>(input.as_bytes()).unwrap_err();
        match err {
            ParseError::BadInt { row, column, value } => {
                assert_eq!(row, 3);
                assert_eq!(column, "count");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn blank_required_int_is_rejected() {
        let err =
            read_records::<Widget, _>("id,label,count,note\nw1,first,,\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::BadInt { row: 2, .. }));
    }

    #[test]
    fn negative_int_is_rejected() {
        let err = read_records::<Widget, _>("id,label,count,note\nw1,first,-2,\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, ParseError::BadInt { row: 2, .. }));
    }

    #[test]
    fn ragged_row_reports_its_row_number() {
        let input = "id,label,count,note\nw1,first,1,\nw2,second\n";
        let err = read_records::<Widget, _>(input.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Row { row: 3, .. }));
    }
}
