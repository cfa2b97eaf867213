mod helpers;
mod persistence;
mod queue_flow;
