use tourlens_common::{RawRecord, RawTable, TourlensError};

/// Read a CSV export into a raw table, pairing every cell with its header.
/// Headers are kept verbatim; normalization happens downstream.
pub fn read_csv(text: &str, source_name: impl Into<String>) -> Result<RawTable, TourlensError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TourlensError::Parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = RawTable {
        source_name: source_name.into(),
        rows: Vec::new(),
    };

    for record in reader.records() {
        let record = record.map_err(|e| TourlensError::Parse(e.to_string()))?;
        let cells = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        table.rows.push(RawRecord { cells });
    }

    Ok(table)
}
