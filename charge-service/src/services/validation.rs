//! Payment-method/sub-payload matching (pure, no side effects).

use charge_core::error::AppError;

use crate::dtos::CreateChargeRequest;
use crate::models::PaymentMethod;

/// Confirms the request carries exactly the sub-payload matching the declared
/// payment method. A missing sub-payload and a sub-payload for a different
/// method both fail validation.
pub fn validate_payment_method_data(request: &CreateChargeRequest) -> Result<(), AppError> {
    match request.payment_method {
        PaymentMethod::Pix => {
            if request.pix_data.is_none() {
                return Err(AppError::validation_field(
                    "pixData",
                    "pixData is required when paymentMethod is PIX",
                ));
            }
        }
        PaymentMethod::CreditCard => {
            if request.credit_card_data.is_none() {
                return Err(AppError::validation_field(
                    "creditCardData",
                    "creditCardData is required when paymentMethod is CREDIT_CARD",
                ));
            }
        }
        PaymentMethod::Boleto => {
            if request.boleto_data.is_none() {
                return Err(AppError::validation_field(
                    "boletoData",
                    "boletoData is required when paymentMethod is BOLETO",
                ));
            }
        }
    }

    let mismatched = match request.payment_method {
        PaymentMethod::Pix => {
            require_absent(request.credit_card_data.is_some(), "creditCardData")
                .or(require_absent(request.boleto_data.is_some(), "boletoData"))
        }
        PaymentMethod::CreditCard => require_absent(request.pix_data.is_some(), "pixData")
            .or(require_absent(request.boleto_data.is_some(), "boletoData")),
        PaymentMethod::Boleto => require_absent(request.pix_data.is_some(), "pixData")
            .or(require_absent(request.credit_card_data.is_some(), "creditCardData")),
    };

    if let Some(field) = mismatched {
        return Err(AppError::validation_field(
            field,
            format!(
                "{field} must not be present when paymentMethod is {}",
                request.payment_method
            ),
        ));
    }

    Ok(())
}

fn require_absent(present: bool, field: &'static str) -> Option<&'static str> {
    present.then_some(field)
}
