use serde::Deserialize;

/// Top-level Distance Matrix API response.
#[derive(Debug, Deserialize)]
pub struct MatrixResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixRow {
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixElement {
    pub status: String,
    #[serde(default)]
    pub duration: Option<TextValue>,
    /// Present only when a departure time was supplied.
    #[serde(default)]
    pub duration_in_traffic: Option<TextValue>,
    #[serde(default)]
    pub distance: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
pub struct TextValue {
    pub value: i64,
    pub text: String,
}

/// A resolved origin→destination leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelLeg {
    pub duration_seconds: i64,
    pub distance_meters: Option<i64>,
}
