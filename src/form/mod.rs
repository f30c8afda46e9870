//! form template and answer model consumed by the rule engine

mod data;
mod template;

pub use data::FormData;
pub use template::{Field, FormTemplate, Page, Task};
