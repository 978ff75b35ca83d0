pub mod gateway;
pub mod session;
pub mod submission;
pub mod validation;
pub mod wizard;

pub use gateway::{BookingGateway, DirectorySource, HttpBookingGateway, HttpDirectory, IDEMPOTENCY_KEY_HEADER};
pub use session::BookingSession;
pub use submission::BookingRequestBuilder;
pub use validation::ValidationGate;
pub use wizard::BookingWizard;
