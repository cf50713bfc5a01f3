//! Request/response DTOs for the charge endpoints.
//!
//! Wire format is camelCase JSON; amounts are decimal strings.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{
    BoletoData, ChargeDetails, ChargeStatus, CreditCardData, Currency, PaymentMethod, PixData,
    UserSummary,
};

fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("amount_positive"))
    }
}

/// PIX sub-payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PixPaymentData {
    pub pix_key: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Credit-card sub-payload. The card token is opaque, produced by the
/// payment gateway; raw card numbers never reach this service.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardPaymentData {
    #[validate(length(min = 1, message = "cardHolderName must not be empty"))]
    pub card_holder_name: String,
    #[validate(length(min = 1, message = "cardToken must not be empty"))]
    pub card_token: String,
    #[validate(length(equal = 4, message = "cardLastDigits must be exactly 4 digits"))]
    pub card_last_digits: String,
    #[validate(length(min = 1, message = "cardBrand must not be empty"))]
    pub card_brand: String,
    /// Stored as an `INTEGER`; values outside `i32` fail deserialization
    /// rather than wrapping.
    #[validate(range(min = 1, message = "installments must be at least 1"))]
    pub installments: Option<i32>,
}

/// Boleto sub-payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BoletoPaymentData {
    pub due_date: NaiveDate,
}

/// Charge creation request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChargeRequest {
    #[validate(custom(
        function = "validate_positive_amount",
        message = "amount must be greater than 0"
    ))]
    pub amount: Decimal,
    pub currency: Option<Currency>,
    pub payment_method: PaymentMethod,
    pub user_id: Uuid,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
    #[validate(nested)]
    pub pix_data: Option<PixPaymentData>,
    #[validate(nested)]
    pub credit_card_data: Option<CreditCardPaymentData>,
    #[validate(nested)]
    pub boleto_data: Option<BoletoPaymentData>,
}

/// Status transition request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChargeStatusRequest {
    pub status: ChargeStatus,
}

/// Exact-match filters for the charge listing; absent fields apply no predicate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeQuery {
    pub user_id: Option<Uuid>,
    pub status: Option<ChargeStatus>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PixDataResponse {
    pub id: Uuid,
    pub pix_key: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub qr_code: String,
    pub emv_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<PixData> for PixDataResponse {
    fn from(data: PixData) -> Self {
        Self {
            id: data.pix_id,
            pix_key: data.pix_key,
            expires_at: data.expires_utc,
            qr_code: data.qr_code,
            emv_code: data.emv_code,
            created_at: data.created_utc,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardDataResponse {
    pub id: Uuid,
    pub card_holder_name: String,
    pub card_last_digits: String,
    pub card_brand: String,
    pub installments: i32,
    pub installment_amount: Decimal,
    pub card_token: String,
    pub created_at: DateTime<Utc>,
}

impl From<CreditCardData> for CreditCardDataResponse {
    fn from(data: CreditCardData) -> Self {
        Self {
            id: data.card_id,
            card_holder_name: data.card_holder_name,
            card_last_digits: data.card_last_digits,
            card_brand: data.card_brand,
            installments: data.installments,
            installment_amount: data.installment_amount,
            card_token: data.card_token,
            created_at: data.created_utc,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoletoDataResponse {
    pub id: Uuid,
    pub due_date: NaiveDate,
    pub barcode: String,
    pub digitable_line: String,
    pub boleto_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<BoletoData> for BoletoDataResponse {
    fn from(data: BoletoData) -> Self {
        Self {
            id: data.boleto_id,
            due_date: data.due_date,
            barcode: data.barcode,
            digitable_line: data.digitable_line,
            boleto_url: data.boleto_url,
            created_at: data.created_utc,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChargeUserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<UserSummary> for ChargeUserResponse {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.user_id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Charge joined with its payment sub-record and owner projection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResponse {
    pub id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    pub status: String,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub pix_data: Option<PixDataResponse>,
    pub credit_card_data: Option<CreditCardDataResponse>,
    pub boleto_data: Option<BoletoDataResponse>,
    pub user: ChargeUserResponse,
}

impl From<ChargeDetails> for ChargeResponse {
    fn from(details: ChargeDetails) -> Self {
        Self {
            id: details.charge.charge_id,
            amount: details.charge.amount,
            currency: details.charge.currency,
            payment_method: details.charge.payment_method,
            status: details.charge.status,
            description: details.charge.description,
            idempotency_key: details.charge.idempotency_key,
            user_id: details.charge.user_id,
            created_at: details.charge.created_utc,
            updated_at: details.charge.updated_utc,
            paid_at: details.charge.paid_utc,
            expires_at: details.charge.expires_utc,
            pix_data: details.pix_data.map(Into::into),
            credit_card_data: details.credit_card_data.map(Into::into),
            boleto_data: details.boleto_data.map(Into::into),
            user: details.user.into(),
        }
    }
}

/// Registration request proxied to the auth collaborator.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

/// Login request proxied to the auth collaborator.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

/// Admin user-creation request (role comes from the query string).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserQuery {
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card_payload(installments: serde_json::Value) -> serde_json::Value {
        json!({
            "cardHolderName": "ANA LIMA",
            "cardToken": "tok_test",
            "cardLastDigits": "4242",
            "cardBrand": "visa",
            "installments": installments
        })
    }

    #[test]
    fn installments_below_one_fail_validation() {
        let data: CreditCardPaymentData =
            serde_json::from_value(card_payload(json!(0))).unwrap();
        let err = data.validate().unwrap_err();
        assert!(err.field_errors().contains_key("installments"));

        let data: CreditCardPaymentData =
            serde_json::from_value(card_payload(json!(-3))).unwrap();
        assert!(data.validate().is_err());
    }

    #[test]
    fn installments_beyond_i32_fail_deserialization() {
        // 4294967295 would wrap to -1 in a narrowing cast.
        let result: Result<CreditCardPaymentData, _> =
            serde_json::from_value(card_payload(json!(4_294_967_295_u64)));
        assert!(result.is_err());
    }

    #[test]
    fn valid_installments_pass() {
        let data: CreditCardPaymentData =
            serde_json::from_value(card_payload(json!(12))).unwrap();
        assert!(data.validate().is_ok());
        assert_eq!(data.installments, Some(12));
    }
}

/// User update request proxied to the auth collaborator.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
}
