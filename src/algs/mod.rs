//! Re-export public algorithms.

pub mod assembly;
pub mod communicator;
pub mod search;

pub use assembly::{
    InterfacePoint, OppositeEvaluator, OppositeState, for_each_interface_point,
    integrate_opposite,
};
pub use search::{SearchAttempt, SearchHit, SearchSite, search_opposite_point};
