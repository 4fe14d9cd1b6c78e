pub mod aggregation;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod io;
pub mod ms;
pub mod search;
pub mod task;
pub mod utils;

pub use errors::{
    IonStreamError,
    Result,
};
