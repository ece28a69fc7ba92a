pub mod ack;
pub mod class;
pub mod payment;
pub mod selection;
pub mod user;

pub use ack::{DeleteAck, InsertAck, UpdateAck};
pub use class::{Class, ClassPatch, ClassStatus, NewClassRequest, StatusUpdateRequest};
pub use payment::{NewPaymentRequest, Payment, PaymentIntentRequest, PaymentIntentResponse};
pub use selection::{NewSelectionRequest, Selection};
pub use user::{RoleFilter, User, UserProfile, UserRole};
