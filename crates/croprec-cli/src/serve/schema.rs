//! Request and response bodies of the prediction service.
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use croprec_classifiers::{FeatureVector, Prediction, FEATURE_NAMES, N_FEATURES};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Request body must be a JSON object")]
    NotAnObject,
    #[error("Missing required field: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {0}")]
    Invalid(&'static str),
}

/// Validated body of `POST /predict`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictRequest {
    pub features: FeatureVector,
}

impl PredictRequest {
    /// Check the seven feature fields in column order and stop at the first
    /// missing or invalid one.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let object = body.as_object().ok_or(ValidationError::NotAnObject)?;
        let mut values = [0.0f64; N_FEATURES];
        for (slot, name) in values.iter_mut().zip(FEATURE_NAMES) {
            *slot = field_value(object, name)?;
        }
        Ok(PredictRequest {
            features: FeatureVector::from_array(values),
        })
    }

    /// Parse raw request bytes. Bytes that are not JSON are treated like any
    /// other non-object body.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        let body: Value = serde_json::from_slice(bytes).map_err(|_| ValidationError::NotAnObject)?;
        Self::from_json(&body)
    }
}

fn field_value(object: &Map<String, Value>, name: &'static str) -> Result<f64, ValidationError> {
    let raw = object.get(name).ok_or(ValidationError::Missing(name))?;
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .filter(|v| v.is_finite())
        .ok_or(ValidationError::Invalid(name))
}

/// Body of a successful `POST /predict`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub recommended_crop: String,
    /// Ranked crops, most probable first.
    pub probabilities: Map<String, Value>,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        let probabilities = prediction
            .probabilities
            .into_iter()
            .map(|(crop, p)| (crop, Value::from(p)))
            .collect();
        PredictResponse {
            recommended_crop: prediction.recommended_crop,
            probabilities,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub classes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn example() -> Value {
        json!({
            "N": 90, "P": 42, "K": 43,
            "temperature": 20.87, "humidity": 82.0,
            "ph": 6.5, "rainfall": 202.93
        })
    }

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let mut body = example();
        body["ph"] = json!(" 6.5 ");
        let req = PredictRequest::from_json(&body).unwrap();
        assert_eq!(
            req.features.to_array(),
            [90.0, 42.0, 43.0, 20.87, 82.0, 6.5, 202.93]
        );
    }

    #[test]
    fn missing_field_is_named() {
        let mut body = example();
        body.as_object_mut().unwrap().remove("rainfall");
        assert_eq!(
            PredictRequest::from_json(&body),
            Err(ValidationError::Missing("rainfall"))
        );
    }

    #[test]
    fn first_bad_field_in_column_order_wins() {
        let mut body = example();
        body["N"] = json!("abc");
        body.as_object_mut().unwrap().remove("ph");
        let err = PredictRequest::from_json(&body).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for N");
    }

    #[test]
    fn rejects_non_numeric_json_types() {
        for bad in [json!(true), json!(null), json!([1.0]), json!({"v": 1}), json!("NaN"), json!("inf")] {
            let mut body = example();
            body["K"] = bad.clone();
            assert_eq!(
                PredictRequest::from_json(&body),
                Err(ValidationError::Invalid("K")),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert_eq!(
            PredictRequest::from_json(&json!([1, 2, 3])),
            Err(ValidationError::NotAnObject)
        );
        assert_eq!(
            PredictRequest::from_slice(b"not json"),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn response_keeps_ranked_order() {
        let prediction = Prediction {
            recommended_crop: "rice".to_string(),
            probabilities: vec![
                ("rice".to_string(), 0.7),
                ("jute".to_string(), 0.2),
                ("apple".to_string(), 0.1),
            ],
        };
        let body = serde_json::to_string(&PredictResponse::from(prediction)).unwrap();
        assert_eq!(
            body,
            r#"{"recommendedCrop":"rice","probabilities":{"rice":0.7,"jute":0.2,"apple":0.1}}"#
        );
    }
}
