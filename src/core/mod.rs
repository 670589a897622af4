// Validation, authentication and dispatch
pub mod fields {
    pub use crate::fields::*;
}

pub mod model {
    pub use crate::model::*;
}

pub mod schemas {
    pub use crate::schemas::*;
}

pub mod auth {
    pub use crate::auth::*;
}

pub mod dispatcher {
    pub use crate::dispatcher::*;
}
