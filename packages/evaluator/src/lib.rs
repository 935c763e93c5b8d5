pub mod autofill;
pub mod date_format;
pub mod evaluator;
pub mod template;

#[cfg(test)]
mod tests_expressions;

pub use evaluator::{
    evaluate, split_indexed_identifier, to_strings, EvalError, EvalResult, Evaluator,
    ValueResolver,
};
