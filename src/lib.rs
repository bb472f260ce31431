// Client-side core of the holiday marketplace: cart state, currency
// conversion, checkout orchestration, the hosted-database client and the
// AI concierge client.

pub mod assistant;
pub mod backend;
pub mod booking;
pub mod cart;
pub mod checkout;
pub mod currency;
pub mod storage;

// Re-export key types for convenience
pub use assistant::{Assistant, AssistantConfig, AssistantError, ChatLog, ChatMessage, ChatRole};
pub use backend::{ApiError, BackendConfig, ClientError, DbClient, RestDbClient, Table};
pub use booking::{BookingKind, BookingStatus, NewBooking};
pub use cart::{CartItem, CartStore, ItemKind};
pub use checkout::{
    CheckoutConfig, CheckoutError, CheckoutOrchestrator, CheckoutReceipt, CheckoutState,
};
pub use currency::{convert, Currency, CurrencySelection};
pub use storage::{FileStore, MemoryStore, StateStore};
