pub mod charge;
pub mod user;

pub use charge::{
    BoletoData, Charge, ChargeDetails, ChargeFilter, ChargeStatus, CreditCardData, Currency,
    NewCharge, NewPaymentData, PaymentMethod, PixData,
};
pub use user::UserSummary;
