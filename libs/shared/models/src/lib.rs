pub mod directory;
pub mod error;
pub mod ids;
pub mod time_format;

pub use directory::{HospitalSummary, PetSummary};
pub use error::ApiError;
pub use ids::{BookingId, HospitalId, PetId, VeterinarianId};
