pub mod batch;
pub mod pipeline;
pub mod queue_run;
pub mod rewrite;
pub mod validate;
pub mod writer_prompt;
