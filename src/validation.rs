//! Field-level validation of `POST /predict` bodies
//!
//! The body is checked as raw JSON so that every offending field can be
//! reported with its location, e.g. `["body", "flights", 0, "MES"]`, instead
//! of stopping at the first serde error.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{Airline, FlightRecord, FlightType, FlightsRequest, Month};

/// One segment of an error location: an object key or an array index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Loc {
    Key(String),
    Index(usize),
}

impl From<&str> for Loc {
    fn from(key: &str) -> Self {
        Loc::Key(key.to_string())
    }
}

impl From<usize> for Loc {
    fn from(index: usize) -> Self {
        Loc::Index(index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: Vec<Loc>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Value>,
}

impl FieldError {
    fn new(loc: Vec<Loc>, msg: impl Into<String>, kind: &str) -> Self {
        FieldError {
            loc,
            msg: msg.into(),
            kind: kind.to_string(),
            ctx: None,
        }
    }

    fn with_ctx(mut self, ctx: Value) -> Self {
        self.ctx = Some(ctx);
        self
    }

    pub fn body(msg: impl Into<String>, kind: &str) -> Self {
        FieldError::new(vec![Loc::from("body")], msg, kind)
    }
}

/// Validate a decoded JSON body into typed flights, collecting all field errors
pub fn validate_flights_request(body: &Value) -> Result<FlightsRequest, Vec<FieldError>> {
    let root = vec![Loc::from("body")];
    let object = match body.as_object() {
        Some(object) => object,
        None => {
            return Err(vec![FieldError::new(
                root,
                "value is not a valid dict",
                "type_error.dict",
            )])
        }
    };

    let flights_loc = child(&root, "flights");
    let items = match object.get("flights") {
        None => return Err(vec![missing(flights_loc)]),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(vec![FieldError::new(
                flights_loc,
                "value is not a valid list",
                "type_error.list",
            )])
        }
    };

    let mut errors = Vec::new();
    let mut flights = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let item_loc = child(&flights_loc, i);
        match item.as_object() {
            Some(fields) => {
                if let Some(flight) = validate_flight(fields, &item_loc, &mut errors) {
                    flights.push(flight);
                }
            }
            None => errors.push(FieldError::new(
                item_loc,
                "value is not a valid dict",
                "type_error.dict",
            )),
        }
    }

    if errors.is_empty() {
        Ok(FlightsRequest { flights })
    } else {
        Err(errors)
    }
}

fn validate_flight(
    fields: &Map<String, Value>,
    loc: &[Loc],
    errors: &mut Vec<FieldError>,
) -> Option<FlightRecord> {
    let airline = validate_enum(fields, loc, "OPERA", errors, |s| Airline::from_name(s), || {
        Airline::ALL.iter().map(|a| a.name()).collect()
    });
    let flight_type = validate_enum(fields, loc, "TIPOVUELO", errors, FlightType::from_code, || {
        FlightType::ALL.iter().map(|t| t.code()).collect()
    });
    let month = validate_month(fields, loc, errors);

    Some(FlightRecord::new(airline?, flight_type?, month?))
}

fn validate_enum<T>(
    fields: &Map<String, Value>,
    loc: &[Loc],
    key: &str,
    errors: &mut Vec<FieldError>,
    parse: impl Fn(&str) -> Option<T>,
    permitted: impl Fn() -> Vec<&'static str>,
) -> Option<T> {
    let loc = child(loc, key);
    let value = match fields.get(key) {
        None => {
            errors.push(missing(loc));
            return None;
        }
        Some(value) => value,
    };
    let Some(s) = value.as_str() else {
        errors.push(FieldError::new(loc, "str type expected", "type_error.str"));
        return None;
    };

    match parse(s) {
        Some(parsed) => Some(parsed),
        None => {
            let permitted = permitted();
            let listed = permitted
                .iter()
                .map(|p| format!("'{}'", p))
                .collect::<Vec<_>>()
                .join(", ");
            errors.push(
                FieldError::new(
                    loc,
                    format!("value is not a valid enumeration member; permitted: {}", listed),
                    "type_error.enum",
                )
                .with_ctx(serde_json::json!({ "enum_values": permitted })),
            );
            None
        }
    }
}

fn validate_month(
    fields: &Map<String, Value>,
    loc: &[Loc],
    errors: &mut Vec<FieldError>,
) -> Option<Month> {
    let loc = child(loc, "MES");
    let value = match fields.get("MES") {
        None => {
            errors.push(missing(loc));
            return None;
        }
        Some(value) => value,
    };
    let Some(n) = month_number(value) else {
        errors.push(FieldError::new(
            loc,
            "value is not a valid integer",
            "type_error.integer",
        ));
        return None;
    };

    if n < Month::MIN {
        errors.push(
            FieldError::new(
                loc,
                format!("ensure this value is greater than or equal to {}", Month::MIN),
                "value_error.number.not_ge",
            )
            .with_ctx(serde_json::json!({ "limit_value": Month::MIN })),
        );
        return None;
    }
    if n > Month::MAX {
        errors.push(
            FieldError::new(
                loc,
                format!("ensure this value is less than or equal to {}", Month::MAX),
                "value_error.number.not_le",
            )
            .with_ctx(serde_json::json!({ "limit_value": Month::MAX })),
        );
        return None;
    }
    Month::new(n).ok()
}

/// Integers, whole floats (`7.0`) and integer strings (`"7"`) all coerce
fn month_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn child(loc: &[Loc], segment: impl Into<Loc>) -> Vec<Loc> {
    let mut loc = loc.to_vec();
    loc.push(segment.into());
    loc
}

fn missing(loc: Vec<Loc>) -> FieldError {
    FieldError::new(loc, "field required", "value_error.missing")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loc_of(err: &FieldError) -> Value {
        serde_json::to_value(&err.loc).unwrap()
    }

    #[test]
    fn test_valid_request() {
        let body = json!({
            "flights": [
                {"OPERA": "Aerolineas Argentinas", "TIPOVUELO": "N", "MES": 3},
                {"OPERA": "K.L.M.", "TIPOVUELO": "I", "MES": 12, "extra": true}
            ]
        });
        let request = validate_flights_request(&body).unwrap();

        assert_eq!(request.flights.len(), 2);
        assert_eq!(request.flights[0].airline, Airline::AerolineasArgentinas);
        assert_eq!(request.flights[1].flight_type, FlightType::International);
        assert_eq!(request.flights[1].month.get(), 12);
    }

    #[test]
    fn test_month_out_of_range() {
        let body = json!({"flights": [{"OPERA": "Avianca", "TIPOVUELO": "N", "MES": 13}]});
        let errors = validate_flights_request(&body).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(loc_of(&errors[0]), json!(["body", "flights", 0, "MES"]));
        assert_eq!(errors[0].kind, "value_error.number.not_le");

        let body = json!({"flights": [{"OPERA": "Avianca", "TIPOVUELO": "N", "MES": 0}]});
        let errors = validate_flights_request(&body).unwrap_err();
        assert_eq!(errors[0].kind, "value_error.number.not_ge");
    }

    #[test]
    fn test_unknown_airline() {
        let body = json!({"flights": [{"OPERA": "Aerolineas Argentinas", "TIPOVUELO": "N", "MES": 3},
                                      {"OPERA": "Argentinas", "TIPOVUELO": "N", "MES": 3}]});
        let errors = validate_flights_request(&body).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(loc_of(&errors[0]), json!(["body", "flights", 1, "OPERA"]));
        assert_eq!(errors[0].kind, "type_error.enum");
        assert!(errors[0].msg.contains("'Grupo LATAM'"));
    }

    #[test]
    fn test_collects_every_error() {
        let body = json!({"flights": [{"OPERA": 5, "TIPOVUELO": "O", "MES": "July"}, 3]});
        let errors = validate_flights_request(&body).unwrap_err();

        let kinds: Vec<&str> = errors.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "type_error.str",
                "type_error.enum",
                "type_error.integer",
                "type_error.dict"
            ]
        );
        assert_eq!(loc_of(&errors[3]), json!(["body", "flights", 1]));
    }

    #[test]
    fn test_missing_fields() {
        let errors = validate_flights_request(&json!({})).unwrap_err();
        assert_eq!(loc_of(&errors[0]), json!(["body", "flights"]));
        assert_eq!(errors[0].kind, "value_error.missing");

        let errors = validate_flights_request(&json!({"flights": [{}]})).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.kind == "value_error.missing"));
    }

    #[test]
    fn test_wrong_container_types() {
        let errors = validate_flights_request(&json!([1, 2])).unwrap_err();
        assert_eq!(errors[0].kind, "type_error.dict");

        let errors = validate_flights_request(&json!({"flights": "none"})).unwrap_err();
        assert_eq!(errors[0].kind, "type_error.list");
    }

    #[test]
    fn test_empty_flights_is_valid() {
        let request = validate_flights_request(&json!({"flights": []})).unwrap();
        assert!(request.flights.is_empty());
    }

    #[test]
    fn test_error_serialization() {
        let body = json!({"flights": [{"OPERA": "Avianca", "TIPOVUELO": "N", "MES": 13}]});
        let errors = validate_flights_request(&body).unwrap_err();
        let value = serde_json::to_value(&errors[0]).unwrap();

        assert_eq!(value["type"], "value_error.number.not_le");
        assert_eq!(value["ctx"]["limit_value"], 12);
        assert!(value["msg"].as_str().unwrap().contains("less than or equal to 12"));
    }

    #[test]
    fn test_month_coercion() {
        for mes in [json!(7), json!(7.0), json!("7"), json!(" 7 ")] {
            let body = json!({"flights": [{"OPERA": "Avianca", "TIPOVUELO": "N", "MES": mes}]});
            let request = validate_flights_request(&body).unwrap();
            assert_eq!(request.flights[0].month.get(), 7);
        }

        for mes in [json!(7.5), json!("7.5"), json!(true), json!(null)] {
            let body = json!({"flights": [{"OPERA": "Avianca", "TIPOVUELO": "N", "MES": mes}]});
            let errors = validate_flights_request(&body).unwrap_err();
            assert_eq!(errors[0].kind, "type_error.integer");
        }

        let body = json!({"flights": [{"OPERA": "Avianca", "TIPOVUELO": "N", "MES": "13"}]});
        let errors = validate_flights_request(&body).unwrap_err();
        assert_eq!(errors[0].kind, "value_error.number.not_le");
    }
}
