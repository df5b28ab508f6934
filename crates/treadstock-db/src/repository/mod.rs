//! # Repository Implementations
//!
//! One repository struct per aggregate. Repositories own their SQL, take a
//! cloned pool handle and return core domain types. Business rules (when to
//! recompute, which transitions are legal) live in treadstock-service.

pub mod brand;
pub mod inventory;
pub mod normalized_type;
pub mod order;
pub mod price;
pub mod price_column;
pub mod price_level;
pub mod tire;
