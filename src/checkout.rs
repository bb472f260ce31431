// Checkout orchestration: Idle -> Processing -> Success | Failed. Payment is
// simulated with a fixed delay; bookings are then created sequentially, one
// remote insert per cart item. There is no rollback across items: a failure
// mid-sequence leaves earlier bookings in place and the cart intact.

use crate::backend::{ApiError, DbClient, Table};
use crate::booking::NewBooking;
use crate::cart::CartStore;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    Processing,
    Success,
    Failed,
}

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    // Simulated payment-gateway latency before bookings are submitted
    pub payment_delay_ms: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            payment_delay_ms: 1_500,
        }
    }
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Sign-in required before checkout")]
    NotAuthenticated,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Checkout already in progress")]
    AlreadyProcessing,

    #[error("Booking failed: {0}")]
    Booking(#[from] ApiError),
}

#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub booking_ids: Vec<String>,
    // Total charged, in the base currency
    pub total: f64,
}

pub struct CheckoutOrchestrator {
    backend: Arc<dyn DbClient>,
    cart: Arc<CartStore>,
    config: CheckoutConfig,
    state: Mutex<CheckoutState>,
}

impl CheckoutOrchestrator {
    pub fn new(backend: Arc<dyn DbClient>, cart: Arc<CartStore>, config: CheckoutConfig) -> Self {
        Self {
            backend,
            cart,
            config,
            state: Mutex::new(CheckoutState::Idle),
        }
    }

    pub fn state(&self) -> CheckoutState {
        *self.state.lock()
    }

    // Return to Idle after the UI has navigated away from the result screen
    pub fn reset(&self) {
        *self.state.lock() = CheckoutState::Idle;
    }

    // Run the payment flow for the signed-in user. Unauthenticated or empty-cart
    // calls short-circuit before any network traffic.
    pub async fn pay(&self, user_id: Option<&str>) -> Result<CheckoutReceipt, CheckoutError> {
        let Some(user_id) = user_id else {
            return Err(CheckoutError::NotAuthenticated);
        };
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        {
            let mut state = self.state.lock();
            if *state == CheckoutState::Processing {
                return Err(CheckoutError::AlreadyProcessing);
            }
            *state = CheckoutState::Processing;
        }

        // Simulated payment gateway
        tokio::time::sleep(Duration::from_millis(self.config.payment_delay_ms)).await;

        let items = self.cart.items();
        let total = self.cart.total();
        let mut booking_ids = Vec::with_capacity(items.len());

        for item in &items {
            let row = NewBooking::from_cart_item(user_id, item).to_row();
            match self.backend.insert(Table::Bookings, row).await {
                Ok(created) => {
                    let id = created
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    booking_ids.push(id);
                }
                Err(e) => {
                    // Earlier bookings stay created; only the count is recorded
                    warn!(
                        "Checkout aborted after {} of {} bookings: {}",
                        booking_ids.len(),
                        items.len(),
                        e
                    );
                    *self.state.lock() = CheckoutState::Failed;
                    return Err(e.into());
                }
            }
        }

        self.cart.clear();
        *self.state.lock() = CheckoutState::Success;
        info!("Checkout complete: {} booking(s), total {}", booking_ids.len(), total);

        Ok(CheckoutReceipt { booking_ids, total })
    }
}
