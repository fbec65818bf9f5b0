//! Named signal channels and their payload schemas.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SagaError;

/// Name of the query exposing the current order state.
pub const QUERY_ORDER_STATE: &str = "getOrderState";

/// Signal channels registered by every order saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalChannel {
    /// A customer submitted payment details.
    #[serde(rename = "submitPayment")]
    SubmitPayment,
    /// The payment provider reported the payment outcome.
    #[serde(rename = "paymentResult")]
    PaymentResult,
}

impl SignalChannel {
    pub const ALL: [SignalChannel; 2] = [SignalChannel::SubmitPayment, SignalChannel::PaymentResult];

    /// Returns the channel name used to address signals.
    pub fn name(&self) -> &'static str {
        match self {
            SignalChannel::SubmitPayment => "submitPayment",
            SignalChannel::PaymentResult => "paymentResult",
        }
    }

    /// Resolves a channel from its name.
    pub fn from_name(name: &str) -> Result<Self, SagaError> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| SagaError::UnknownChannel(name.to_string()))
    }
}

impl std::fmt::Display for SignalChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A typed signal payload bound to its channel.
pub trait SignalPayload: Serialize + DeserializeOwned {
    const CHANNEL: SignalChannel;

    /// Decodes a raw payload received on [`Self::CHANNEL`].
    fn decode(raw: serde_json::Value) -> Result<Self, SagaError> {
        serde_json::from_value(raw).map_err(|source| SagaError::Decode {
            channel: Self::CHANNEL,
            source,
        })
    }

    fn encode(&self) -> Result<serde_json::Value, SagaError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Payload of `submitPayment`.
///
/// Accepts either `{"payment_info": ".."}` or the payment info as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SubmitPaymentWire")]
pub struct SubmitPaymentSignal {
    pub payment_info: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SubmitPaymentWire {
    Bare(String),
    Object { payment_info: String },
}

impl From<SubmitPaymentWire> for SubmitPaymentSignal {
    fn from(wire: SubmitPaymentWire) -> Self {
        match wire {
            SubmitPaymentWire::Bare(payment_info) | SubmitPaymentWire::Object { payment_info } => {
                Self { payment_info }
            }
        }
    }
}

impl SignalPayload for SubmitPaymentSignal {
    const CHANNEL: SignalChannel = SignalChannel::SubmitPayment;
}

/// Payload of `paymentResult`.
///
/// Accepts either `{"success": true}` or a bare boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PaymentResultWire")]
pub struct PaymentResultSignal {
    pub success: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PaymentResultWire {
    Bare(bool),
    Object { success: bool },
}

impl From<PaymentResultWire> for PaymentResultSignal {
    fn from(wire: PaymentResultWire) -> Self {
        match wire {
            PaymentResultWire::Bare(success) | PaymentResultWire::Object { success } => {
                Self { success }
            }
        }
    }
}

impl SignalPayload for PaymentResultSignal {
    const CHANNEL: SignalChannel = SignalChannel::PaymentResult;
}
