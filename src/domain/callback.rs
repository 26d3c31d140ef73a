//! Mobile-money provider callback, as posted to `/mpesa-result/`.
//!
//! The checkout simulator builds these by hand to imitate what the provider
//! sends once the buyer has answered the STK push on their phone.

use serde::{Deserialize, Serialize};

pub const SIMULATED_MERCHANT_REQUEST_ID: &str = "mr_id";
pub const SIMULATED_CHECKOUT_REQUEST_ID: &str = "cr_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCallback {
    #[serde(rename = "Body")]
    pub body: CallbackBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i32,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

impl ProviderCallback {
    pub fn simulated(result_code: i32, result_desc: impl Into<String>) -> Self {
        Self {
            body: CallbackBody {
                stk_callback: StkCallback {
                    merchant_request_id: SIMULATED_MERCHANT_REQUEST_ID.to_string(),
                    checkout_request_id: SIMULATED_CHECKOUT_REQUEST_ID.to_string(),
                    result_code,
                    result_desc: result_desc.into(),
                },
            },
        }
    }
}

/// Reply of the webhook endpoint.
///
/// A successful payment yields a verification code; rejected callbacks
/// carry `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct WebhookReply {
    #[serde(default)]
    pub verification_code: Option<String>,
    #[serde(default, rename = "Error")]
    pub error: Option<String>,
}

/// What the simulated provider answers to the payment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedResponse {
    Success,
    WrongPin,
    Canceled,
    WrongData,
    /// Send nothing and wait for the real transaction status instead.
    Await,
}

impl SimulatedResponse {
    /// Result code and description of the callback to post, `None` for `Await`.
    pub fn result(self) -> Option<(i32, &'static str)> {
        match self {
            Self::Success => Some((0, "The service request is processed successfully.")),
            Self::WrongPin => Some((10, "The initiator information is invalid.")),
            Self::Canceled => Some((11, "Request cancelled by user")),
            Self::WrongData => Some((12, "Some error message")),
            Self::Await => None,
        }
    }

    pub fn callback(self) -> Option<ProviderCallback> {
        self.result()
            .map(|(code, desc)| ProviderCallback::simulated(code, desc))
    }
}
