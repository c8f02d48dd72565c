//! Domain models for the dormitory engine

pub mod contract;
pub mod facility;
pub mod installment;
pub mod payment;
pub mod state;
pub mod student;

// Re-exports
pub use contract::{Contract, ContractPaymentStatus, ContractStateError, ContractStatus};
pub use facility::{Bed, BedStateError, BedStatus, BedType, Floor, Room, RoomType};
pub use installment::{Installment, InstallmentError, InstallmentStatus};
pub use payment::{Allocation, Payment, PaymentMethod, PaymentStateError, Refund};
pub use state::EngineState;
pub use student::Student;
