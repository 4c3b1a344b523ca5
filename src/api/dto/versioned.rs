//! Envelope for versioned updates.

use serde::Deserialize;

/// Request body of the `PUT` endpoints: the full entity plus the
/// `row_version` the client last read.
///
/// ```json
/// { "row_version": 3, "name": "New Year", "start_date": "2027-01-01", "end_date": "2027-01-01" }
/// ```
#[derive(Debug, Deserialize)]
pub struct Versioned<T> {
    pub row_version: i32,

    #[serde(flatten)]
    pub body: T,
}
