use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};

use dealroom_core::{DomainError, Money};
use dealroom_transactions::{
    CoreFields, CounterpartyInvited, CreateTransaction, DetailsPayload, ParticipantView,
    TransactionRecord, TransactionView,
};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub property_description: String,
    pub purchase_price: JsonValue,
    pub earnest_deposit: JsonValue,
    pub due_diligence_end_date: NaiveDate,
    pub estimated_closing_date: NaiveDate,
    #[serde(default)]
    pub depositor_name: Option<String>,
    #[serde(default)]
    pub property_address: Option<String>,
    #[serde(default)]
    pub payload: DetailsPayload,
}

/// Amounts arrive as strings or numbers; a bad one is reported under its own field.
fn amount(field: &'static str, value: JsonValue) -> Result<Money, DomainError> {
    Money::deserialize(value).map_err(|e| DomainError::invalid_field(field, e.to_string()))
}

impl TryFrom<CreateTransactionRequest> for CreateTransaction {
    type Error = DomainError;

    fn try_from(req: CreateTransactionRequest) -> Result<Self, Self::Error> {
        Ok(CreateTransaction {
            kind: req.kind,
            core: CoreFields {
                title: req.title,
                property_description: req.property_description,
                purchase_price: amount("purchase_price", req.purchase_price)?,
                earnest_deposit: amount("earnest_deposit", req.earnest_deposit)?,
                due_diligence_end_date: req.due_diligence_end_date,
                estimated_closing_date: req.estimated_closing_date,
                depositor_name: req.depositor_name,
                property_address: req.property_address,
            },
            payload: req.payload,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct InviteCounterpartyRequest {
    pub counterparty_email: String,
}

/// Decode a JSON body, reporting failures as a 400 in the standard error shape.
pub fn parse_body<T: DeserializeOwned>(body: JsonValue) -> Result<T, axum::response::Response> {
    serde_json::from_value(body).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_input", format!("invalid request body: {e}"))
    })
}

/// Body of a details merge: any JSON object.
pub fn parse_details_patch(body: JsonValue) -> Result<DetailsPayload, axum::response::Response> {
    match body {
        JsonValue::Object(map) => Ok(map),
        _ => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            "details patch must be a JSON object",
        )),
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn transaction_to_json(record: &TransactionRecord) -> JsonValue {
    json!(TransactionView::from(record))
}

pub fn counterparty_invited_to_json(invited: &CounterpartyInvited) -> JsonValue {
    json!({
        "participant": ParticipantView::from(&invited.participant),
        "invited_email": invited.participant.invited_email,
    })
}
