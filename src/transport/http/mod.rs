pub mod router;
pub mod types;
pub mod handlers {
    pub mod common;
    pub mod entities;
    pub mod health;
    pub mod orders;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
