pub mod buyer;
pub mod car;
pub mod movement;
pub mod operation;

pub use car::CarStatus;
pub use operation::OperationKind;
