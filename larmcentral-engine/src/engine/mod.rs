mod allocation;
mod processing;
mod runtime;
mod state;

pub use self::{
    processing::DispatchProcessor,
    runtime::DispatchRuntime,
    state::{DispatchState, Roster},
};
