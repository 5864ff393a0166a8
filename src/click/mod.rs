pub mod dispatcher;

pub use dispatcher::{dispatch, dispatch_replay, ClickTarget, STRATEGY_TIMEOUT};
