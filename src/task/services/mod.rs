//! Application services for task lifecycle orchestration.

mod dispatch;
mod dispatcher;
mod pricing;
mod result;
mod strategy;
mod token;

pub use dispatch::{DispatchRequest, TaskDispatchError, TaskDispatchService};
pub use dispatcher::{TaskDispatcher, TaskDispatcherError};
pub use pricing::CostCalculator;
pub use result::{
    ResultProcessor, ResultProcessorError, ResultSubmission, SubmissionStatus, ValidationErrors,
};
pub use strategy::StrategyResolver;
pub use token::TaskTokenService;
